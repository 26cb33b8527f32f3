//! Trade execution and fill simulation.
//!
//! Every entry commits the whole of the available cash. Fills move against
//! the trader by `slippage_pct`; `commission_pct` of the notional is charged
//! on both legs. Shares are fractional.

use chrono::NaiveDate;
use tracing::debug;

use super::portfolio::Portfolio;
use super::position::{ClosedTrade, ExitReason, Position, Side};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExecutionConfig {
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

/// Commission on a trade: trade_value * pct / 100.
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.commission_pct / 100.0
}

/// Buying (long entry, short cover) pays up: price * (1 + slippage_pct / 100).
pub fn apply_slippage_buy(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 + slippage_pct / 100.0)
}

/// Selling (long exit, short entry) receives less: price * (1 - slippage_pct / 100).
pub fn apply_slippage_sell(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 - slippage_pct / 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        side: Side,
        shares: f64,
        execution_price: f64,
        commission: f64,
    },
    AlreadyInvested,
    InsufficientCapital,
}

/// Open a position on `side` using all available cash.
///
/// 1. Apply slippage to the market price
/// 2. Split cash into notional + commission so the sum equals the cash
/// 3. Deduct both from cash (a short's notional goes into escrow)
/// 4. Record the position
pub fn enter(
    portfolio: &mut Portfolio,
    side: Side,
    market_price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> EntryResult {
    if !portfolio.is_flat() {
        return EntryResult::AlreadyInvested;
    }

    let execution_price = match side {
        Side::Long => apply_slippage_buy(market_price, config.slippage_pct),
        Side::Short => apply_slippage_sell(market_price, config.slippage_pct),
    };

    if portfolio.cash <= 0.0 || execution_price <= 0.0 || !execution_price.is_finite() {
        return EntryResult::InsufficientCapital;
    }

    let notional = portfolio.cash / (1.0 + config.commission_pct / 100.0);
    let commission = calculate_commission(notional, config);
    let shares = notional / execution_price;

    portfolio.cash -= notional + commission;
    portfolio.open_position(Position {
        side,
        shares,
        entry_price: execution_price,
        entry_close: market_price,
        entry_date: date,
        entry_commission: commission,
    });

    debug!(%date, %side, shares, price = execution_price, "entered position");

    EntryResult::Entered {
        side,
        shares,
        execution_price,
        commission,
    }
}

pub fn enter_long(
    portfolio: &mut Portfolio,
    market_price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> EntryResult {
    enter(portfolio, Side::Long, market_price, date, config)
}

pub fn enter_short(
    portfolio: &mut Portfolio,
    market_price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> EntryResult {
    enter(portfolio, Side::Short, market_price, date, config)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub side: Side,
    pub shares: f64,
    pub exit_price: f64,
    pub exit_value: f64,
    pub exit_commission: f64,
    pub pnl: f64,
}

/// Close the open position, if any.
///
/// PnL includes both commissions. A long receives the sale proceeds; a
/// short gets its escrowed entry notional back plus the price difference.
pub fn exit_position(
    portfolio: &mut Portfolio,
    market_price: f64,
    exit_date: NaiveDate,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let position = portfolio.take_position()?;

    let exit_price = match position.side {
        Side::Long => apply_slippage_sell(market_price, config.slippage_pct),
        Side::Short => apply_slippage_buy(market_price, config.slippage_pct),
    };

    let exit_value = position.shares * exit_price;
    let exit_commission = calculate_commission(exit_value, config);
    let price_pnl = position.unrealized_pnl(exit_price);
    let pnl = price_pnl - position.entry_commission - exit_commission;

    match position.side {
        Side::Long => portfolio.cash += exit_value - exit_commission,
        Side::Short => portfolio.cash += position.entry_notional() + price_pnl - exit_commission,
    }

    debug!(date = %exit_date, side = %position.side, %reason, pnl, "closed position");

    portfolio.record_trade(ClosedTrade {
        side: position.side,
        shares: position.shares,
        entry_price: position.entry_price,
        exit_price,
        entry_date: position.entry_date,
        exit_date,
        pnl,
        exit_reason: reason,
    });

    Some(ExitResult {
        side: position.side,
        shares: position.shares,
        exit_price,
        exit_value,
        exit_commission,
        pnl,
    })
}
