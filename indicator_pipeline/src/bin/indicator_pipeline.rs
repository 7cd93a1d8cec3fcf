use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use indicator_pipeline::{
    config::load_config_path,
    io::{CsvTableSink, read_table},
    pipeline::{PipelineSettings, SymbolTables, group_by_symbol, persist, run_all, run_symbol},
    strategy::{CmaStrategy, MaFilter, ReplaySummary, StrategyBar, StrategyColumns, replay},
};
use market_data_ingestor::{
    models::granularity::Granularity,
    providers::{DataProvider, alpha_vantage::AlphaVantageProvider},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Camarilla / moving-average indicator pipeline")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Download daily, hourly and 5-minute bars, add indicators and save the tables
    Extract {
        /// Path to the TOML run configuration
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Run the pipeline over raw CSV tables already on disk
    Build {
        #[arg(long)]
        symbol: String,
        #[arg(long, value_name = "FILE")]
        daily: PathBuf,
        #[arg(long, value_name = "FILE")]
        hourly: PathBuf,
        #[arg(long, value_name = "FILE")]
        five_minute: PathBuf,
        /// Root directory for the processed tables
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
        /// Period label used in file names, e.g. 2016-2018
        #[arg(long)]
        period: String,
        /// Moving-average windows for the hourly table
        #[arg(long, value_delimiter = ',', default_value = "200,50")]
        ma_windows: Vec<usize>,
    },

    /// Replay the CMA entry rules over a processed 5-minute table
    Signals {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Print at most this many signals
        #[arg(long)]
        limit: Option<usize>,
        /// level or crossover; overrides the configured filter
        #[arg(long)]
        ma_filter: Option<MaFilter>,
        /// Run configuration whose `[strategy]` table supplies the default filter
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 200)]
        slow_ma: usize,
        #[arg(long, default_value_t = 50)]
        fast_ma: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Extract { config } => extract(config).await,
        Cmd::Build {
            symbol,
            daily,
            hourly,
            five_minute,
            out,
            period,
            ma_windows,
        } => {
            let tables = SymbolTables {
                symbol,
                daily: read_table(&daily).with_context(|| format!("reading {}", daily.display()))?,
                hourly: read_table(&hourly)
                    .with_context(|| format!("reading {}", hourly.display()))?,
                five_minute: read_table(&five_minute)
                    .with_context(|| format!("reading {}", five_minute.display()))?,
            };
            let (mut tables, _) = run_symbol(tables, &PipelineSettings { ma_windows })?;
            persist(&CsvTableSink::new(out), &mut tables, &period)?;
            Ok(())
        }
        Cmd::Signals {
            input,
            limit,
            ma_filter,
            config,
            slow_ma,
            fast_ma,
        } => {
            let filter = match config {
                Some(path) => load_config_path(&path)
                    .with_context(|| format!("loading {}", path.display()))?
                    .strategy
                    .filter(ma_filter),
                None => ma_filter.unwrap_or_default(),
            };
            signals(input, limit, filter, slow_ma, fast_ma)
        }
    }
}

async fn extract(config_path: PathBuf) -> Result<()> {
    let config = load_config_path(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let provider = AlphaVantageProvider::with_config(config.provider.alpha_vantage()?)?;

    let mut fetched = IndexMap::new();
    for granularity in Granularity::ALL {
        info!(
            %granularity,
            symbols = config.symbols.len(),
            "requesting {} bars",
            granularity.label()
        );
        fetched.insert(granularity, provider.fetch_bars(config.request(granularity)).await?);
    }
    let tables = group_by_symbol(fetched)?;

    let sink = CsvTableSink::new(&config.output_dir);
    let period = config.period();
    for (mut tables, report) in run_all(tables, &config.settings())? {
        let paths = persist(&sink, &mut tables, &period)?;
        info!(
            symbol = %report.symbol,
            five_minute_rows = report.five_minute.after,
            files = paths.len(),
            "symbol done"
        );
    }
    Ok(())
}

fn signals(
    input: PathBuf,
    limit: Option<usize>,
    filter: MaFilter,
    slow_ma: usize,
    fast_ma: usize,
) -> Result<()> {
    let table = read_table(&input).with_context(|| format!("reading {}", input.display()))?;
    let bars = StrategyBar::from_frame(&table, &StrategyColumns::with_windows(slow_ma, fast_ma))?;

    let mut strategy = CmaStrategy::new(filter);
    let events = replay(&bars, &mut strategy);

    for event in events.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{}\t{:?}\t{:.4}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.signal,
            event.close
        );
    }
    let summary = ReplaySummary::from_events(bars.len(), &events);
    println!(
        "{} bars, {} long, {} short",
        summary.bars, summary.longs, summary.shorts
    );
    Ok(())
}
