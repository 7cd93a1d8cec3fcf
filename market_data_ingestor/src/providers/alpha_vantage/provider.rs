use std::{path::Path, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use indexmap::IndexMap;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::env_var_or_file;
use snafu::ResultExt;
use tracing::{debug, info};

use crate::{
    models::{
        bar::Bar,
        bar_series::BarSeries,
        request_params::{BarsRequestParams, ProviderParams},
    },
    providers::{
        alpha_vantage::{
            params::{AlphaVantageParams, construct_params, validate_request},
            response::parse_bars,
        },
        ApiSnafu, ClientBuildSnafu, DataProvider, MissingApiKeySnafu, ProviderError,
        ProviderInitError, ReqwestSnafu,
    },
};

pub const BASE_URL: &str = "https://www.alphavantage.co/query";
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

/// Free-tier keys allow five calls a minute; 13 s keeps a margin.
pub const DEFAULT_REQUEST_SPACING: Duration = Duration::from_secs(13);

/// Everything needed to build an [`AlphaVantageProvider`].
#[derive(Debug)]
pub struct AlphaVantageConfig {
    pub api_key: SecretString,
    pub base_url: String,
    /// Minimum gap between two calls. Zero disables pacing.
    pub request_spacing: Duration,
    pub params: AlphaVantageParams,
}

impl AlphaVantageConfig {
    /// Reads the key from the `name` variable, falling back to `key_file`.
    pub fn from_env_var(name: &str, key_file: Option<&Path>) -> Result<Self, ProviderInitError> {
        let key = env_var_or_file(name, key_file).context(MissingApiKeySnafu)?;
        Ok(Self {
            api_key: SecretString::from(key),
            base_url: BASE_URL.to_string(),
            request_spacing: DEFAULT_REQUEST_SPACING,
            params: AlphaVantageParams::default(),
        })
    }
}

pub struct AlphaVantageProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    pacer: Option<DefaultDirectRateLimiter>,
    params: AlphaVantageParams,
}

impl AlphaVantageProvider {
    pub fn with_config(config: AlphaVantageConfig) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context(ClientBuildSnafu)?;

        let pacer = Quota::with_period(config.request_spacing).map(RateLimiter::direct);

        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
            pacer,
            params: config.params,
        })
    }

    async fn call(&self, query: &[(String, String)]) -> Result<String, ProviderError> {
        if let Some(pacer) = &self.pacer {
            pacer.until_ready().await;
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(query)
            .query(&[("apikey", self.api_key.expose_secret())])
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        let body = response.text().await.context(ReqwestSnafu)?;
        if !status.is_success() {
            let message = if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {}", body.trim())
            };
            return ApiSnafu { message }.fail();
        }
        Ok(body)
    }

    async fn fetch_symbol(
        &self,
        symbol: &str,
        params: &BarsRequestParams,
        extra: &AlphaVantageParams,
    ) -> Result<Vec<Bar>, ProviderError> {
        let granularity = params.granularity;

        if granularity.intraday_interval().is_none() {
            let query = construct_params(symbol, granularity, None, extra);
            let body = self.call(&query).await?;
            return parse_bars(symbol, granularity, &body);
        }

        let mut series = BarSeries::new(symbol, granularity, Vec::new());
        for (year, month) in params.months() {
            let query = construct_params(symbol, granularity, Some((year, month)), extra);
            let body = self.call(&query).await?;
            let bars = parse_bars(symbol, granularity, &body)?;
            debug!(symbol, year, month, bars = bars.len(), "fetched month");
            series.extend_sorted(bars);
        }
        Ok(series.bars)
    }
}

#[async_trait]
impl DataProvider for AlphaVantageProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        validate_request(&params)?;

        let extra = match &params.provider_specific {
            ProviderParams::AlphaVantage(p) => p.clone(),
            ProviderParams::None => self.params.clone(),
        };

        let mut collected: IndexMap<String, Vec<Bar>> = IndexMap::new();
        for symbol in &params.symbols {
            let symbol = symbol.trim().to_uppercase();
            if collected.contains_key(&symbol) {
                continue;
            }
            let bars = self.fetch_symbol(&symbol, &params, &extra).await?;
            info!(
                symbol = %symbol,
                granularity = %params.granularity,
                bars = bars.len(),
                "fetched bars"
            );
            collected.insert(symbol, bars);
        }

        Ok(collected
            .into_iter()
            .map(|(symbol, bars)| BarSeries::new(symbol, params.granularity, bars))
            .collect())
    }
}
