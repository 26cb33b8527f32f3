//! Open positions and closed trades.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The strategy's regular exit rule (classical upper-band cross).
    Signal,
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
        }
    }
}

/// A single open position. Shares are fractional and always positive; the
/// direction lives in `side`.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub shares: f64,
    /// Fill price after slippage.
    pub entry_price: f64,
    /// Market close on the entry day, before slippage.
    pub entry_close: f64,
    pub entry_date: NaiveDate,
    pub entry_commission: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    pub fn entry_notional(&self) -> f64 {
        self.shares * self.entry_price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => self.shares * (price - self.entry_price),
            Side::Short => self.shares * (self.entry_price - price),
        }
    }

    /// What the position adds to portfolio equity at `price`. A short holds
    /// its entry proceeds in escrow, so it is worth the escrow plus its
    /// unrealized profit.
    pub fn equity_value(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => self.shares * price,
            Side::Short => self.entry_notional() + self.unrealized_pnl(price),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub side: Side,
    pub shares: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    pub fn return_pct(&self) -> f64 {
        let notional = self.shares * self.entry_price;
        if notional > 0.0 {
            self.pnl / notional * 100.0
        } else {
            0.0
        }
    }
}
