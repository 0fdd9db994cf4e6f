//! Game-agnostic [Monte Carlo Tree Search] with the UCT selection policy for
//! two-player zero-sum games with alternating turns.
//!
//! The search consumes any game implementing [`Environment`] and selects a
//! move after a fixed number of rollouts:
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use uct::games::TicTacToe;
//! use uct::{Config, Engine};
//!
//! let mut engine = Engine::new(Config::default(), StdRng::seed_from_u64(42));
//! let state = TicTacToe::try_from("XX. OO. ...").unwrap();
//! assert_eq!(engine.get_move(&state).unwrap(), 2);
//! ```
//!
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search

// TODO: Gradually move most of warnings to deny.
#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
// Rustdoc lints.
#![warn(
    rustdoc::private_doc_tests,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
// Performance is extremely important.
#![deny(clippy::perf)]

pub mod environment;
pub mod games;
pub mod mcts;

pub use environment::{Environment, GameResult, Player};
pub use mcts::{Config, Engine};
