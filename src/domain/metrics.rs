//! Performance metrics for backtests and error metrics for the trend model.

use super::portfolio::{EquityPoint, Portfolio};
use super::position::ClosedTrade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Largest peak-to-trough fall as a positive fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of days spent below a previous peak.
    pub max_drawdown_duration: i64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration: f64,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, risk_free_rate: f64) -> Self {
        Self::from_curve(
            &portfolio.equity_curve,
            &portfolio.closed_trades,
            portfolio.initial_capital,
            risk_free_rate,
        )
    }

    pub fn from_curve(
        equity_curve: &[EquityPoint],
        trades: &[ClosedTrade],
        initial_capital: f64,
        risk_free_rate: f64,
    ) -> Self {
        let total_return = total_return(equity_curve, initial_capital);

        let years = equity_curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() && total_return > -1.0
        {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, daily_rf);

        let stats = TradeStats::from_trades(trades);

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades: trades.len(),
            trades_won: stats.won,
            trades_lost: stats.lost,
            trades_breakeven: stats.breakeven,
            win_rate: stats.win_rate(),
            profit_factor: stats.profit_factor(),
            avg_win: stats.avg_win(),
            avg_loss: stats.avg_loss(),
            largest_win: stats.largest_win,
            largest_loss: stats.largest_loss,
            avg_trade_duration: stats.avg_duration(),
        }
    }
}

/// (final - initial) / initial, 0 for an empty curve.
pub fn total_return(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    match equity_curve.last() {
        Some(last) if initial_capital > 0.0 => (last.equity - initial_capital) / initial_capital,
        _ => 0.0,
    }
}

#[derive(Debug, Default)]
struct TradeStats {
    won: usize,
    lost: usize,
    breakeven: usize,
    total_wins: f64,
    total_losses: f64,
    largest_win: f64,
    largest_loss: f64,
    total_duration_days: i64,
}

impl TradeStats {
    fn from_trades(trades: &[ClosedTrade]) -> Self {
        let mut stats = TradeStats::default();
        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                stats.won += 1;
                stats.total_wins += pnl;
                stats.largest_win = stats.largest_win.max(pnl);
            } else if pnl < 0.0 {
                stats.lost += 1;
                stats.total_losses += pnl.abs();
                stats.largest_loss = stats.largest_loss.max(pnl.abs());
            } else {
                stats.breakeven += 1;
            }
            stats.total_duration_days += (trade.exit_date - trade.entry_date).num_days();
        }
        stats
    }

    fn total(&self) -> usize {
        self.won + self.lost + self.breakeven
    }

    fn win_rate(&self) -> f64 {
        ratio(self.won as f64, self.total())
    }

    fn profit_factor(&self) -> f64 {
        if self.total_losses > 0.0 {
            self.total_wins / self.total_losses
        } else if self.total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    fn avg_win(&self) -> f64 {
        ratio(self.total_wins, self.won)
    }

    fn avg_loss(&self) -> f64 {
        ratio(self.total_losses, self.lost)
    }

    fn avg_duration(&self) -> f64 {
        ratio(self.total_duration_days as f64, self.total())
    }
}

fn ratio(numerator: f64, count: usize) -> f64 {
    if count > 0 {
        numerator / count as f64
    } else {
        0.0
    }
}

pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

pub fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

/// Annualized Sharpe and Sortino ratios from daily returns, using the
/// sample standard deviation. Both are 0 with fewer than two returns or
/// zero dispersion.
fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;
    let annualize = TRADING_DAYS_PER_YEAR.sqrt();

    let sharpe = if stddev > 0.0 {
        excess_return / stddev * annualize
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / (n - 1.0)).sqrt();

    let sortino = if downside_stddev > 0.0 {
        excess_return / downside_stddev * annualize
    } else {
        0.0
    };

    (sharpe, sortino)
}

/// Out-of-sample error of the trend model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelMetrics {
    pub samples: usize,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    /// Share of samples whose predicted change has the sign of the actual one.
    pub directional_accuracy: f64,
}

impl ModelMetrics {
    /// Regression metrics; all zero when the inputs are empty or differ in length.
    pub fn regression(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len();
        if n == 0 || n != predicted.len() {
            return Self::default();
        }
        let nf = n as f64;
        let pairs = || actual.iter().zip(predicted);

        let ss_res: f64 = pairs().map(|(a, p)| (a - p).powi(2)).sum();
        let mse = ss_res / nf;
        let mae = pairs().map(|(a, p)| (a - p).abs()).sum::<f64>() / nf;

        let mean = actual.iter().sum::<f64>() / nf;
        let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        let same_direction = pairs().filter(|(a, p)| same_sign(**a, **p)).count();

        ModelMetrics {
            samples: n,
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            directional_accuracy: same_direction as f64 / nf,
        }
    }
}

fn same_sign(a: f64, b: f64) -> bool {
    (a > 0.0 && b > 0.0) || (a < 0.0 && b < 0.0) || (a == 0.0 && b == 0.0)
}
