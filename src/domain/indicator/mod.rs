//! Technical indicator implementations.
//!
//! Bollinger Bands, ATR and WMA, all over closing prices except ATR. Every
//! series has exactly one point per input bar; warm-up points carry
//! `valid = false`.

pub mod atr;
pub mod bollinger;
pub mod stddev;
pub mod wma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Bollinger { upper: f64, middle: f64, lower: f64 },
}

/// Upper, middle and lower band of one Bollinger point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl IndicatorPoint {
    /// Scalar value, or `None` during warm-up or for banded indicators.
    pub fn simple(&self) -> Option<f64> {
        match (self.valid, self.value) {
            (true, IndicatorValue::Simple(v)) => Some(v),
            _ => None,
        }
    }

    pub fn bands(&self) -> Option<Bands> {
        match (self.valid, self.value) {
            (
                true,
                IndicatorValue::Bollinger {
                    upper,
                    middle,
                    lower,
                },
            ) => Some(Bands {
                upper,
                middle,
                lower,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Wma(usize),
    Atr(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn simple_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(IndicatorPoint::simple)
    }

    pub fn bands_at(&self, index: usize) -> Option<Bands> {
        self.values.get(index).and_then(IndicatorPoint::bands)
    }
}

/// Encode a band multiplier as the hundredths used in `IndicatorType::Bollinger`.
pub fn multiplier_x100(multiplier: f64) -> u32 {
    (multiplier * 100.0).round().max(0.0) as u32
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Wma(period) => write!(f, "WMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}
