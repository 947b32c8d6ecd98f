//! Cliquet (ratchet) and performance options.
//!
//! Both are strips of forward-starting options struck at a percentage of the
//! underlying level observed at the previous reset:
//!
//! ```text
//! cliquet:     Σ_i D(t_i) · max(±(S_i - m·S_{i-1}), 0)
//! performance: Σ_i D(t_i) · max(±(S_i / S_{i-1} - m), 0)
//! ```
//!
//! Periods run between consecutive reset dates, the first starting at the
//! first reset and the last ending at maturity.

use pricer_core::types::Date;

use super::error::InstrumentError;
use super::payoff::OptionType;

/// Whether each period pays in currency or in return units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CliquetKind {
    /// Pays `max(±(S_i - m·S_{i-1}), 0)`
    Cliquet,
    /// Pays `max(±(S_i / S_{i-1} - m), 0)`
    Performance,
}

/// Strip of forward-starting options on one underlying.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CliquetOption {
    kind: CliquetKind,
    option_type: OptionType,
    moneyness: f64,
    reset_dates: Vec<Date>,
    maturity: Date,
}

impl CliquetOption {
    /// Creates a cliquet.
    ///
    /// `reset_dates` must be non-empty, strictly increasing and precede
    /// `maturity`; `moneyness` must be positive.
    pub fn new(
        kind: CliquetKind,
        option_type: OptionType,
        moneyness: f64,
        reset_dates: Vec<Date>,
        maturity: Date,
    ) -> Result<Self, InstrumentError> {
        if !(moneyness.is_finite() && moneyness > 0.0) {
            return Err(InstrumentError::InvalidParameter {
                name: "moneyness",
                reason: format!("{moneyness} must be positive"),
            });
        }
        if reset_dates.is_empty() {
            return Err(InstrumentError::EmptySchedule("cliquet reset dates"));
        }
        if reset_dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(InstrumentError::UnsortedSchedule("cliquet reset dates"));
        }
        if reset_dates.last().is_some_and(|&d| d >= maturity) {
            return Err(InstrumentError::InvalidParameter {
                name: "maturity",
                reason: "must follow the last reset date".to_string(),
            });
        }
        Ok(Self {
            kind,
            option_type,
            moneyness,
            reset_dates,
            maturity,
        })
    }

    /// Cliquet or performance.
    #[inline]
    pub fn kind(&self) -> CliquetKind {
        self.kind
    }

    /// Call or put.
    #[inline]
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// Percentage strike of each period.
    #[inline]
    pub fn moneyness(&self) -> f64 {
        self.moneyness
    }

    /// Reset dates.
    #[inline]
    pub fn reset_dates(&self) -> &[Date] {
        &self.reset_dates
    }

    /// Maturity, the end of the last period.
    #[inline]
    pub fn maturity(&self) -> Date {
        self.maturity
    }

    /// Payoff of one period given the levels at its start and end.
    ///
    /// ```
    /// use pricer_core::types::Date;
    /// use pricer_models::instruments::{CliquetKind, CliquetOption, OptionType};
    ///
    /// let start = Date::from_ymd(2025, 1, 1).unwrap();
    /// let maturity = Date::from_ymd(2026, 1, 1).unwrap();
    /// let c = CliquetOption::new(CliquetKind::Performance, OptionType::Call, 1.0, vec![start], maturity).unwrap();
    /// assert!((c.period_payoff(100.0, 110.0) - 0.1).abs() < 1e-12);
    /// ```
    pub fn period_payoff(&self, start: f64, end: f64) -> f64 {
        let sign = self.option_type.sign();
        match self.kind {
            CliquetKind::Cliquet => (sign * (end - self.moneyness * start)).max(0.0),
            CliquetKind::Performance => (sign * (end / start - self.moneyness)).max(0.0),
        }
    }
}
