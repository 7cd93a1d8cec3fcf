//! Interpretation of Alpha Vantage response bodies.
//!
//! With `datatype=csv` a successful call returns a CSV table, newest row first.
//! Failures (bad key, unknown symbol, throttling) still answer HTTP 200 but
//! carry a small JSON object instead.

use serde_json::Value;
use snafu::ensure;

use crate::{
    io::dataframe::frame_from_csv_bytes,
    models::{bar::Bar, bar_series::BarSeries, granularity::Granularity},
    providers::{ApiSnafu, MalformedResponseSnafu, ProviderError},
};

const ERROR_KEYS: [&str; 3] = ["Error Message", "Information", "Note"];

/// Extracts the message of a JSON error body, if `body` is one.
pub fn api_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    let value: Value = serde_json::from_str(trimmed).ok()?;
    let object = value.as_object()?;
    ERROR_KEYS.iter().find_map(|key| {
        object
            .get(*key)
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
    })
}

/// Parses one response body into bars, oldest first.
///
/// An empty body (for example a month before the listing date) yields no bars.
pub fn parse_bars(
    symbol: &str,
    granularity: Granularity,
    body: &str,
) -> Result<Vec<Bar>, ProviderError> {
    if let Some(message) = api_error_message(body) {
        return ApiSnafu { message }.fail();
    }
    ensure!(
        !body.trim_start().starts_with('{'),
        MalformedResponseSnafu {
            message: "unexpected JSON body"
        }
    );
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let df = frame_from_csv_bytes(body.as_bytes().to_vec()).map_err(|e| {
        MalformedResponseSnafu {
            message: e.to_string(),
        }
        .build()
    })?;
    let series = BarSeries::from_frame(symbol, granularity, &df).map_err(|e| {
        MalformedResponseSnafu {
            message: e.to_string(),
        }
        .build()
    })?;
    Ok(series.bars)
}
