//! Camarilla + moving-average entry rules.
//!
//! A signal needs three things on the same bar: the narrow flag turning on,
//! the coarse close sitting on one side of both moving averages, and the
//! fine close breaking the matching Camarilla level.
//!
//! | signal | narrow      | coarse close vs MAs | close vs level     |
//! |--------|-------------|---------------------|--------------------|
//! | short  | turned on   | below both          | crossed below `R4` |
//! | long   | turned on   | above both          | crossed above `S4` |

use serde::{Deserialize, Serialize};

use super::{
    Signal, Strategy, StrategyBar,
    crossover::{crossed_above, crossed_below},
};

/// How the coarse close is compared with the moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaFilter {
    /// The coarse close is below (or above) both averages on this bar.
    #[default]
    Level,
    /// The coarse close crosses both averages on this bar.
    Crossover,
}

impl std::str::FromStr for MaFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "level" => Ok(Self::Level),
            "crossover" | "cross" => Ok(Self::Crossover),
            other => Err(format!("unknown MA filter `{other}` (expected level or crossover)")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CmaStrategy {
    filter: MaFilter,
}

impl CmaStrategy {
    pub fn new(filter: MaFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> MaFilter {
        self.filter
    }

    fn below_averages(&self, prev: &StrategyBar, cur: &StrategyBar) -> bool {
        match self.filter {
            MaFilter::Level => cur.coarse_close < cur.ma_slow && cur.coarse_close < cur.ma_fast,
            MaFilter::Crossover => {
                crossed_below(prev.coarse_close, prev.ma_slow, cur.coarse_close, cur.ma_slow)
                    && crossed_below(prev.coarse_close, prev.ma_fast, cur.coarse_close, cur.ma_fast)
            }
        }
    }

    fn above_averages(&self, prev: &StrategyBar, cur: &StrategyBar) -> bool {
        match self.filter {
            MaFilter::Level => cur.coarse_close > cur.ma_slow && cur.coarse_close > cur.ma_fast,
            MaFilter::Crossover => {
                crossed_above(prev.coarse_close, prev.ma_slow, cur.coarse_close, cur.ma_slow)
                    && crossed_above(prev.coarse_close, prev.ma_fast, cur.coarse_close, cur.ma_fast)
            }
        }
    }
}

impl Strategy for CmaStrategy {
    fn on_bar(&mut self, history: &[StrategyBar]) -> Option<Signal> {
        let [.., prev, cur] = history else {
            return None;
        };

        if !crossed_above(prev.narrow, 0.5, cur.narrow, 0.5) {
            return None;
        }

        if self.below_averages(prev, cur) && crossed_below(prev.close, prev.r4, cur.close, cur.r4) {
            Some(Signal::Short)
        } else if self.above_averages(prev, cur)
            && crossed_above(prev.close, prev.s4, cur.close, cur.s4)
        {
            Some(Signal::Long)
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "cma"
    }
}
