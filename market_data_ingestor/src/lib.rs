//! Market data ingestion: canonical bar models, the provider abstraction and
//! the Alpha Vantage REST provider, plus bar-series ⇄ DataFrame conversion.

pub mod errors;
pub mod io;
pub mod models;
pub mod providers;

pub use errors::Error;
