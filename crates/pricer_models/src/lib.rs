//! # Pricer Models (L2: Business Logic)
//!
//! Instruments, stochastic processes and analytic reference formulas.
//!
//! This crate provides:
//! - Instrument definitions (vanilla, Asian, cliquet, Bermudan swaption)
//! - Exercise schedules and payoffs
//! - Stochastic processes (Black-Scholes, Heston, LIBOR market model)
//! - Euler and predictor-corrector discretisation
//! - LIBOR market model drift calculators and curve state
//! - Analytical formulas used as control variates and test references
//!
//! ## Design Principles
//!
//! - **Enum-based processes** for static dispatch on the simulation hot path
//! - **Composition over overriding**: processes select a discretisation scheme
//! - **Validated constructors**: invalid parameters are rejected up front,
//!   never during a simulation

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod instruments;
pub mod models;
