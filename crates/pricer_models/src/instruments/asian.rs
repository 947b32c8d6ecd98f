//! Discretely monitored arithmetic-average-price Asian option.

use pricer_core::types::Date;

use super::error::InstrumentError;
use super::payoff::PlainVanillaPayoff;

/// Average-price Asian option paying `payoff(mean(S(t_i)))` at the payment date.
///
/// Fixings on or before the valuation date are ignored by the engines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AsianOption {
    payoff: PlainVanillaPayoff,
    fixing_dates: Vec<Date>,
    payment_date: Date,
}

impl AsianOption {
    /// Creates an Asian option.
    ///
    /// Fixing dates must be non-empty and strictly increasing, and the
    /// payment date must not precede the last fixing.
    pub fn new(
        payoff: PlainVanillaPayoff,
        fixing_dates: Vec<Date>,
        payment_date: Date,
    ) -> Result<Self, InstrumentError> {
        let Some(&last) = fixing_dates.last() else {
            return Err(InstrumentError::EmptySchedule("asian fixing dates"));
        };
        if fixing_dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(InstrumentError::UnsortedSchedule("asian fixing dates"));
        }
        if payment_date < last {
            return Err(InstrumentError::InvalidParameter {
                name: "payment_date",
                reason: format!("{payment_date} precedes last fixing {last}"),
            });
        }
        Ok(Self {
            payoff,
            fixing_dates,
            payment_date,
        })
    }

    /// The payoff applied to the average.
    #[inline]
    pub fn payoff(&self) -> &PlainVanillaPayoff {
        &self.payoff
    }

    /// Fixing dates.
    #[inline]
    pub fn fixing_dates(&self) -> &[Date] {
        &self.fixing_dates
    }

    /// Payment date.
    #[inline]
    pub fn payment_date(&self) -> Date {
        self.payment_date
    }
}
