//! namefmt CLI library
//!
//! Exposes the CLI entry point so the binary stays a one-liner and the
//! command surface can be tested in-process.

mod cli;

pub use cli::run;
