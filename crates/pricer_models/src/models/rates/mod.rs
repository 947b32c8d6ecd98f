//! Interest rate models.

pub mod lmm;
