//! Instrument definitions consumed by the Monte Carlo engines.
//!
//! Instruments are plain data: payoffs, exercise schedules and contract
//! terms. Pricing logic lives in the engines of `pricer_pricing`.
//!
//! # Instrument Types
//!
//! - [`VanillaOption`]: European, American or Bermudan vanilla option
//! - [`AsianOption`]: discretely monitored arithmetic-average-price option
//! - [`CliquetOption`]: cliquet and performance options
//! - [`BermudanSwaption`]: Bermudan swaption on a LIBOR market model tenor
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::Date;
//! use pricer_models::instruments::{Exercise, OptionType, PlainVanillaPayoff, VanillaOption};
//!
//! let today = Date::from_ymd(2024, 1, 1).unwrap();
//! let expiry = Date::from_ymd(2025, 1, 1).unwrap();
//! let payoff = PlainVanillaPayoff::new(OptionType::Put, 40.0).unwrap();
//! let american = VanillaOption::new(payoff, Exercise::american(today, expiry).unwrap());
//! assert!(american.exercise().is_early());
//! ```

mod asian;
mod cliquet;
mod error;
mod exercise;
mod payoff;
mod swaption;
mod vanilla;

pub use asian::AsianOption;
pub use cliquet::{CliquetKind, CliquetOption};
pub use error::InstrumentError;
pub use exercise::Exercise;
pub use payoff::{OptionType, PlainVanillaPayoff};
pub use swaption::{BermudanSwaption, SwapType};
pub use vanilla::VanillaOption;
