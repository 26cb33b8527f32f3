//! Strategy identities used in results and reports.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Long-only close-versus-band crossing.
    Classical,
    /// Model-predicted WMA versus the bands, long and short, ATR stop.
    Enhanced,
    BuyAndHold,
}

impl StrategyKind {
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Classical => "Classical",
            StrategyKind::Enhanced => "Enhanced",
            StrategyKind::BuyAndHold => "Buy & Hold",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
