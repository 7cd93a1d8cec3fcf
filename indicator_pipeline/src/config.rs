//! TOML configuration of an extraction run.
//!
//! ```toml
//! symbols = ["SPY"]
//! start_year = 2016
//! end_year = 2018
//! output_dir = "./stock_data"
//!
//! [indicators]
//! ma_windows = [200, 50]
//!
//! [provider]
//! api_key_file = "apikey.txt"
//! request_spacing_secs = 13
//!
//! [strategy]
//! ma_filter = "level"
//! ```
//!
//! Every table is optional; unknown keys are rejected.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use market_data_ingestor::{
    models::{
        granularity::Granularity,
        request_params::{BarsRequestParams, ProviderParams},
    },
    providers::{
        ProviderInitError,
        alpha_vantage::{
            AlphaVantageConfig, AlphaVantageParams, OutputSize,
            provider::{API_KEY_ENV, BASE_URL, DEFAULT_REQUEST_SPACING},
        },
    },
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, Result},
    pipeline::{DEFAULT_MA_WINDOWS, PipelineSettings},
    strategy::MaFilter,
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub symbols: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub indicators: IndicatorsConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./stock_data")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndicatorsConfig {
    pub ma_windows: Vec<usize>,
}

impl Default for IndicatorsConfig {
    fn default() -> Self {
        Self {
            ma_windows: DEFAULT_MA_WINDOWS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderConfig {
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Read when the variable is unset. Relative paths resolve against the config file.
    pub api_key_file: Option<PathBuf>,
    pub base_url: String,
    pub request_spacing_secs: u64,
    pub extended_hours: Option<bool>,
    pub adjusted: Option<bool>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: API_KEY_ENV.to_string(),
            api_key_file: None,
            base_url: BASE_URL.to_string(),
            request_spacing_secs: DEFAULT_REQUEST_SPACING.as_secs(),
            extended_hours: None,
            adjusted: None,
        }
    }
}

impl ProviderConfig {
    pub fn params(&self) -> AlphaVantageParams {
        AlphaVantageParams {
            output_size: OutputSize::Full,
            adjusted: self.adjusted,
            extended_hours: self.extended_hours,
        }
    }

    /// Looks up the API key and assembles the provider configuration.
    pub fn alpha_vantage(&self) -> std::result::Result<AlphaVantageConfig, ProviderInitError> {
        let mut config =
            AlphaVantageConfig::from_env_var(&self.api_key_env, self.api_key_file.as_deref())?;
        config.base_url = self.base_url.clone();
        config.request_spacing = Duration::from_secs(self.request_spacing_secs);
        config.params = self.params();
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    #[serde(default)]
    pub ma_filter: MaFilter,
}

impl StrategyConfig {
    /// `overridden` when given, the configured filter otherwise.
    pub fn filter(&self, overridden: Option<MaFilter>) -> MaFilter {
        overridden.unwrap_or(self.ma_filter)
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(Error::Config("at least one symbol is required".into()));
        }
        if let Some(blank) = self.symbols.iter().position(|s| s.trim().is_empty()) {
            return Err(Error::Config(format!("symbol #{blank} is blank")));
        }
        if self.start_year > self.end_year {
            return Err(Error::Config(format!(
                "start_year {} is after end_year {}",
                self.start_year, self.end_year
            )));
        }
        self.settings().validate()
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            ma_windows: self.indicators.ma_windows.clone(),
        }
    }

    /// `"{start_year}-{end_year}"`, used in file names.
    pub fn period(&self) -> String {
        format!("{}-{}", self.start_year, self.end_year)
    }

    pub fn request(&self, granularity: Granularity) -> BarsRequestParams {
        BarsRequestParams {
            symbols: self.symbols.clone(),
            granularity,
            start_year: self.start_year,
            end_year: self.end_year,
            provider_specific: ProviderParams::AlphaVantage(self.provider.params()),
        }
    }

    /// Makes a relative key file path relative to `base` instead of the working directory.
    fn resolve_paths(&mut self, base: &Path) {
        if let Some(file) = &self.provider.api_key_file {
            if file.is_relative() {
                self.provider.api_key_file = Some(base.join(file));
            }
        }
    }
}

/// Parses and validates a configuration document.
pub fn load_config_str(raw: &str) -> Result<PipelineConfig> {
    let config: PipelineConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Reads, parses and validates a configuration file.
pub fn load_config_path(path: &Path) -> Result<PipelineConfig> {
    let raw = fs::read_to_string(path)?;
    let mut config = load_config_str(&raw)?;
    if let Some(dir) = path.parent() {
        config.resolve_paths(dir);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = load_config_str(
            r#"
            symbols = ["SPY"]
            start_year = 2016
            end_year = 2018
            "#,
        )
        .unwrap();

        assert_eq!(config.indicators.ma_windows, vec![200, 50]);
        assert_eq!(config.provider.request_spacing_secs, 13);
        assert_eq!(config.provider.api_key_env, "ALPHAVANTAGE_API_KEY");
        assert_eq!(config.strategy.ma_filter, MaFilter::Level);
        assert_eq!(config.output_dir, PathBuf::from("./stock_data"));
        assert_eq!(config.period(), "2016-2018");
    }

    #[test]
    fn full_config_parses() {
        let config = load_config_str(
            r#"
            symbols = ["SPY", "QQQ"]
            start_year = 2017
            end_year = 2017
            output_dir = "out"

            [indicators]
            ma_windows = [20]

            [provider]
            api_key_file = "apikey.txt"
            request_spacing_secs = 0
            extended_hours = false

            [strategy]
            ma_filter = "crossover"
            "#,
        )
        .unwrap();

        assert_eq!(config.settings().ma_windows, vec![20]);
        assert_eq!(config.provider.extended_hours, Some(false));
        assert_eq!(config.strategy.ma_filter, MaFilter::Crossover);

        let request = config.request(Granularity::FiveMinute);
        assert_eq!(request.symbols.len(), 2);
        assert!(matches!(
            request.provider_specific,
            ProviderParams::AlphaVantage(AlphaVantageParams {
                extended_hours: Some(false),
                ..
            })
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = load_config_str(
            r#"
            symbols = ["SPY"]
            start_year = 2016
            end_year = 2016
            ticker = "SPY"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::TomlParse(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let inverted = "symbols = [\"SPY\"]\nstart_year = 2019\nend_year = 2018\n";
        assert!(matches!(load_config_str(inverted), Err(Error::Config(_))));

        let empty = "symbols = []\nstart_year = 2016\nend_year = 2016\n";
        assert!(matches!(load_config_str(empty), Err(Error::Config(_))));

        let zero = "symbols = [\"SPY\"]\nstart_year = 2016\nend_year = 2016\n\
                    [indicators]\nma_windows = [0]\n";
        assert!(matches!(load_config_str(zero), Err(Error::InvalidWindow(0))));
    }

    #[test]
    fn configured_filter_applies_unless_overridden() {
        let config = load_config_str(
            r#"
            symbols = ["SPY"]
            start_year = 2016
            end_year = 2016

            [strategy]
            ma_filter = "crossover"
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy.filter(None), MaFilter::Crossover);
        assert_eq!(config.strategy.filter(Some(MaFilter::Level)), MaFilter::Level);
        assert_eq!(StrategyConfig::default().filter(None), MaFilter::Level);
    }

    #[test]
    fn key_file_resolves_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "symbols = [\"SPY\"]\nstart_year = 2016\nend_year = 2016\n\
             [provider]\napi_key_file = \"apikey.txt\""
        )
        .unwrap();
        fs::write(dir.path().join("apikey.txt"), "demo\n").unwrap();

        let config = load_config_path(&path).unwrap();
        assert_eq!(
            config.provider.api_key_file.as_deref(),
            Some(dir.path().join("apikey.txt").as_path())
        );

        let mut provider = config.provider.clone();
        provider.api_key_env = "INDICATOR_PIPELINE_TEST_KEY_THAT_IS_NEVER_SET".into();
        let av = provider.alpha_vantage().unwrap();
        assert_eq!(av.request_spacing, Duration::from_secs(13));
    }
}
