//! Alpha Vantage REST provider.
//!
//! Daily bars come from `TIME_SERIES_DAILY` in a single full-history call.
//! Intraday bars come from `TIME_SERIES_INTRADAY`, one call per calendar month,
//! paced by a fixed-period rate limiter because the free tier rejects bursts.

pub mod params;
pub mod provider;
pub mod response;

pub use params::{AlphaVantageParams, OutputSize};
pub use provider::{AlphaVantageConfig, AlphaVantageProvider};
