//! mixbuild-lib: bridge between a legacy build driver and a Bazel-style evaluator.
//!
//! The driver asks the evaluator about a subset of its modules:
//! - `request`: the deduplicating, ordered ledger of queued cquery requests
//! - `gate`: which modules may be delegated at all
//! - `invoke`: one evaluation round (cquery then aquery) and its frozen results
//! - `cquery` / `aquery`: decoders for the two answers
//! - `statement`: shell commands synthesized from resolved actions

pub mod aquery;
pub mod config;
pub mod consts;
pub mod coverage;
pub mod cquery;
pub mod gate;
pub mod invoke;
pub mod request;
pub mod statement;
#[cfg(test)]
mod util;
