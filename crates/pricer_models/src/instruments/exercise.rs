//! Exercise schedules.
//!
//! An exercise enumerates the dates on which the holder may exercise. The
//! pricing context turns them into year fractions that become mandatory
//! times of the simulation grid.

use pricer_core::types::Date;

use super::error::InstrumentError;

/// When an option can be exercised.
///
/// # Examples
/// ```
/// use pricer_core::types::Date;
/// use pricer_models::instruments::Exercise;
///
/// let d1 = Date::from_ymd(2025, 6, 30).unwrap();
/// let d2 = Date::from_ymd(2025, 12, 31).unwrap();
///
/// let bermudan = Exercise::bermudan(vec![d2, d1]).unwrap();
/// assert_eq!(bermudan.dates(), vec![d1, d2]);
/// assert_eq!(bermudan.last_date(), d2);
/// assert!(bermudan.is_early());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Exercise {
    /// Exercise only at expiry.
    European {
        /// Expiry date
        date: Date,
    },

    /// Exercise at any time in `[earliest, latest]`.
    American {
        /// First exercise date
        earliest: Date,
        /// Last exercise date
        latest: Date,
    },

    /// Exercise on a discrete set of dates.
    Bermudan {
        /// Exercise dates, strictly increasing
        dates: Vec<Date>,
    },
}

impl Exercise {
    /// European exercise at `date`.
    pub fn european(date: Date) -> Self {
        Exercise::European { date }
    }

    /// American exercise between two dates.
    pub fn american(earliest: Date, latest: Date) -> Result<Self, InstrumentError> {
        if earliest > latest {
            return Err(InstrumentError::UnsortedSchedule("american exercise window"));
        }
        Ok(Exercise::American { earliest, latest })
    }

    /// Bermudan exercise; dates are sorted and deduplicated.
    pub fn bermudan(mut dates: Vec<Date>) -> Result<Self, InstrumentError> {
        if dates.is_empty() {
            return Err(InstrumentError::EmptySchedule("bermudan exercise dates"));
        }
        dates.sort();
        dates.dedup();
        Ok(Exercise::Bermudan { dates })
    }

    /// Exercise dates. For American exercise, the window bounds.
    pub fn dates(&self) -> Vec<Date> {
        match self {
            Exercise::European { date } => vec![*date],
            Exercise::American { earliest, latest } => vec![*earliest, *latest],
            Exercise::Bermudan { dates } => dates.clone(),
        }
    }

    /// Final exercise date.
    pub fn last_date(&self) -> Date {
        match self {
            Exercise::European { date } => *date,
            Exercise::American { latest, .. } => *latest,
            // Constructor guarantees at least one date.
            Exercise::Bermudan { dates } => dates[dates.len() - 1],
        }
    }

    /// Whether exercise before the last date is allowed.
    pub fn is_early(&self) -> bool {
        !matches!(self, Exercise::European { .. })
    }
}
