use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use super::{Signal, Strategy, StrategyBar};

/// A signal together with the bar that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalEvent {
    pub timestamp: NaiveDateTime,
    pub signal: Signal,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReplaySummary {
    pub bars: usize,
    pub longs: usize,
    pub shorts: usize,
}

impl ReplaySummary {
    pub fn from_events(bars: usize, events: &[SignalEvent]) -> Self {
        let longs = events.iter().filter(|e| e.signal == Signal::Long).count();
        Self {
            bars,
            longs,
            shorts: events.len() - longs,
        }
    }
}

/// Feeds `bars` to `strategy` one at a time, oldest first.
pub fn replay<S: Strategy + ?Sized>(bars: &[StrategyBar], strategy: &mut S) -> Vec<SignalEvent> {
    strategy.reset();

    let events: Vec<SignalEvent> = (1..=bars.len())
        .filter_map(|end| {
            let history = &bars[..end];
            let bar = history[end - 1];
            strategy.on_bar(history).map(|signal| SignalEvent {
                timestamp: bar.timestamp,
                signal,
                close: bar.close,
            })
        })
        .collect();

    let summary = ReplaySummary::from_events(bars.len(), &events);
    info!(
        strategy = strategy.name(),
        bars = summary.bars,
        longs = summary.longs,
        shorts = summary.shorts,
        "replayed strategy"
    );
    events
}
