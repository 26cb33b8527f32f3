//! Portfolio state and equity tracking for a single instrument.

use chrono::NaiveDate;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn open_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    pub fn take_position(&mut self) -> Option<Position> {
        self.position.take()
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    pub fn total_equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map(|p| p.equity_value(price))
                .unwrap_or(0.0)
    }

    /// Mark to market at `price` and append the result to the equity curve.
    pub fn mark(&mut self, date: NaiveDate, price: f64) -> f64 {
        let equity = self.total_equity(price);
        self.record_equity(date, equity);
        equity
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }
}
