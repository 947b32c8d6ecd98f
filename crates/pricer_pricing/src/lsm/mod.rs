//! Longstaff-Schwartz least-squares Monte Carlo.
//!
//! - [`basis`]: regression function families
//! - [`path_pricer`]: the early-exercise product interface and exercise-date discounting
//! - [`longstaff_schwartz`]: calibration, the frozen-rule pricer and the end-to-end driver

pub mod basis;
pub mod longstaff_schwartz;
pub mod path_pricer;

pub use basis::{BasisKind, BasisSystem};
pub use longstaff_schwartz::{
    price_with_regression, CalibrationReport, DegenerateFitPolicy, LongstaffSchwartzCalibrator,
    LongstaffSchwartzPathPricer, LsmPhase, LsmValuation, PathSnapshot,
};
pub use path_pricer::{EarlyExercisePathPricer, ExerciseDiscounts};
