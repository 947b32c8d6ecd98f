//! Bermudan swaption on a LIBOR market model rate grid.
//!
//! The swaption is described on the model's own tenor structure
//! `T_0 < T_1 < ... < T_n`: exercising at reset `T_e` enters the coterminal
//! swap paying fixed against the forwards `f_e .. f_{n-1}`, whose value at
//! `T_e` is `annuity_e · max(±(S_e - K), 0)`.

use super::error::InstrumentError;

/// Payer or receiver of the fixed leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SwapType {
    /// Pays fixed, receives floating
    Payer,
    /// Receives fixed, pays floating
    Receiver,
}

impl SwapType {
    /// +1 for payers, -1 for receivers.
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            SwapType::Payer => 1.0,
            SwapType::Receiver => -1.0,
        }
    }
}

/// Bermudan swaption into the coterminal swap.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BermudanSwaption {
    swap_type: SwapType,
    fixed_rate: f64,
    notional: f64,
    exercise_indices: Vec<usize>,
}

impl BermudanSwaption {
    /// Creates a swaption exercisable at the resets `T_e` for each `e` in
    /// `exercise_indices` (strictly increasing rate indices).
    pub fn new(
        swap_type: SwapType,
        fixed_rate: f64,
        notional: f64,
        exercise_indices: Vec<usize>,
    ) -> Result<Self, InstrumentError> {
        if exercise_indices.is_empty() {
            return Err(InstrumentError::EmptySchedule("swaption exercise indices"));
        }
        if exercise_indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err(InstrumentError::UnsortedSchedule("swaption exercise indices"));
        }
        if !fixed_rate.is_finite() {
            return Err(InstrumentError::InvalidStrike { strike: fixed_rate });
        }
        if !(notional.is_finite() && notional > 0.0) {
            return Err(InstrumentError::InvalidParameter {
                name: "notional",
                reason: format!("{notional} must be positive"),
            });
        }
        Ok(Self {
            swap_type,
            fixed_rate,
            notional,
            exercise_indices,
        })
    }

    /// Payer or receiver.
    #[inline]
    pub fn swap_type(&self) -> SwapType {
        self.swap_type
    }

    /// Fixed rate of the underlying swap.
    #[inline]
    pub fn fixed_rate(&self) -> f64 {
        self.fixed_rate
    }

    /// Notional.
    #[inline]
    pub fn notional(&self) -> f64 {
        self.notional
    }

    /// Rate indices whose reset dates are exercise dates.
    #[inline]
    pub fn exercise_indices(&self) -> &[usize] {
        &self.exercise_indices
    }

    /// Exercise value at a reset given the coterminal swap rate and annuity.
    #[inline]
    pub fn exercise_value(&self, swap_rate: f64, annuity: f64) -> f64 {
        self.notional * annuity * (self.swap_type.sign() * (swap_rate - self.fixed_rate)).max(0.0)
    }
}
