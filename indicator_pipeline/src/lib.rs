//! Camarilla pivot and moving-average indicators over daily, hourly and
//! 5-minute bars, aligned across granularities without lookahead, plus the
//! CMA entry rules evaluated on the merged 5-minute table.
//!
//! The usual flow is [`pipeline::run_symbol`] over three raw tables followed
//! by [`pipeline::persist`]; [`strategy::replay`] reads a finished table back.

pub mod columns;
pub mod config;
pub mod errors;
pub mod indicators;
pub mod io;
pub mod keys;
pub mod merge;
pub mod pipeline;
pub mod prune;
pub mod strategy;

pub use errors::{Error, Result};
