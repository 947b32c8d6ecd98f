//! Monte Carlo and Longstaff-Schwartz configuration.
//!
//! [`MonteCarloConfig`] carries everything an engine needs to draw and
//! accumulate paths; [`LsmConfig`] adds the calibration settings of the
//! early-exercise engines. Both are built through validating builders and
//! are immutable afterwards.

use super::error::ConfigError;
use crate::lsm::{BasisKind, DegenerateFitPolicy};
use crate::rng::RngKind;

/// Default cap on the number of samples of a tolerance-driven run.
pub const MAX_SAMPLES: usize = 10_000_000;

/// Default number of paths per parallel batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Offset deriving the calibration seed from the pricing seed.
pub const CALIBRATION_SEED_OFFSET: u64 = 1_768_237_423;

/// Settings of one path-drawing pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceSettings {
    /// Random number source
    pub rng: RngKind,
    /// Run seed
    pub seed: u64,
    /// Pair each draw with its mirror
    pub antithetic: bool,
    /// Build increments with a Brownian bridge
    pub brownian_bridge: bool,
    /// Paths per parallel batch
    pub batch_size: usize,
    /// Sequence number of the pass's first path. Halton passes start at
    /// this point; pseudo-random passes are separated by seed.
    pub first_sequence: u64,
}

/// Monte Carlo simulation configuration.
///
/// Use [`MonteCarloConfigBuilder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::mc::MonteCarloConfig;
///
/// let config = MonteCarloConfig::builder()
///     .time_steps_per_year(50)
///     .antithetic(true)
///     .required_tolerance(0.02)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.required_tolerance(), Some(0.02));
/// assert_eq!(config.steps_for(2.0), 100);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MonteCarloConfig {
    time_steps: Option<usize>,
    time_steps_per_year: Option<usize>,
    brownian_bridge: bool,
    antithetic: bool,
    control_variate: bool,
    required_samples: Option<usize>,
    required_tolerance: Option<f64>,
    max_samples: usize,
    seed: u64,
    rng: RngKind,
    batch_size: usize,
}

impl MonteCarloConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> MonteCarloConfigBuilder {
        MonteCarloConfigBuilder::default()
    }

    /// Total number of steps, if fixed.
    #[inline]
    pub fn time_steps(&self) -> Option<usize> {
        self.time_steps
    }

    /// Steps per year, if given.
    #[inline]
    pub fn time_steps_per_year(&self) -> Option<usize> {
        self.time_steps_per_year
    }

    /// Whether paths are built with a Brownian bridge.
    #[inline]
    pub fn brownian_bridge(&self) -> bool {
        self.brownian_bridge
    }

    /// Whether antithetic pairs are drawn.
    #[inline]
    pub fn antithetic(&self) -> bool {
        self.antithetic
    }

    /// Whether the engine's analytic control variate is used.
    #[inline]
    pub fn control_variate(&self) -> bool {
        self.control_variate
    }

    /// Fixed sample count.
    #[inline]
    pub fn required_samples(&self) -> Option<usize> {
        self.required_samples
    }

    /// Target error estimate.
    #[inline]
    pub fn required_tolerance(&self) -> Option<f64> {
        self.required_tolerance
    }

    /// Sample cap of tolerance-driven runs.
    #[inline]
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Run seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Random number source.
    #[inline]
    pub fn rng(&self) -> RngKind {
        self.rng
    }

    /// Paths per parallel batch.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Step count of a grid ending at `last`: the fixed count, the per-year
    /// count scaled by `last` (at least one), or zero for mandatory times
    /// only.
    pub fn steps_for(&self, last: f64) -> usize {
        match (self.time_steps, self.time_steps_per_year) {
            (Some(steps), _) => steps,
            (None, Some(per_year)) => ((per_year as f64 * last) as usize).max(1),
            (None, None) => 0,
        }
    }

    /// Drawing settings of the pricing pass.
    pub fn sequence_settings(&self) -> SequenceSettings {
        SequenceSettings {
            rng: self.rng,
            seed: self.seed,
            antithetic: self.antithetic,
            brownian_bridge: self.brownian_bridge,
            batch_size: self.batch_size,
            first_sequence: 0,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - neither samples nor tolerance is given
    /// - a tolerance is combined with a low-discrepancy sequence
    /// - both step settings are given, or either is zero
    /// - `max_samples` is below `required_samples`
    /// - a count or tolerance is not positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.required_samples.is_none() && self.required_tolerance.is_none() {
            return Err(ConfigError::MissingSampleTarget);
        }
        if self.required_tolerance.is_some() && self.rng == RngKind::LowDiscrepancy {
            return Err(ConfigError::ToleranceWithLowDiscrepancy);
        }
        if self.time_steps.is_some() && self.time_steps_per_year.is_some() {
            return Err(ConfigError::ConflictingTimeSteps);
        }
        positive("time_steps", self.time_steps)?;
        positive("time_steps_per_year", self.time_steps_per_year)?;
        positive("required_samples", self.required_samples)?;
        positive("max_samples", Some(self.max_samples))?;
        positive("batch_size", Some(self.batch_size))?;
        if let Some(tolerance) = self.required_tolerance {
            if !(tolerance.is_finite() && tolerance > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "required_tolerance",
                    value: format!("{tolerance} must be positive"),
                });
            }
        }
        if let Some(required) = self.required_samples {
            if self.max_samples < required {
                return Err(ConfigError::MaxBelowRequired {
                    max: self.max_samples,
                    required,
                });
            }
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: Option<usize>) -> Result<(), ConfigError> {
    match value {
        Some(0) => Err(ConfigError::InvalidParameter {
            name,
            value: "must be positive".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Builder for [`MonteCarloConfig`].
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::mc::MonteCarloConfig;
/// use pricer_pricing::rng::RngKind;
///
/// let config = MonteCarloConfig::builder()
///     .time_steps(12)
///     .rng(RngKind::LowDiscrepancy)
///     .brownian_bridge(true)
///     .required_samples(8191)
///     .build()
///     .expect("valid config");
/// assert_eq!(config.steps_for(3.0), 12);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MonteCarloConfigBuilder {
    time_steps: Option<usize>,
    time_steps_per_year: Option<usize>,
    brownian_bridge: bool,
    antithetic: bool,
    control_variate: bool,
    required_samples: Option<usize>,
    required_tolerance: Option<f64>,
    max_samples: Option<usize>,
    seed: u64,
    rng: RngKind,
    batch_size: Option<usize>,
}

impl MonteCarloConfigBuilder {
    /// Sets the total number of steps.
    #[inline]
    pub fn time_steps(mut self, steps: usize) -> Self {
        self.time_steps = Some(steps);
        self
    }

    /// Sets the number of steps per year.
    #[inline]
    pub fn time_steps_per_year(mut self, steps: usize) -> Self {
        self.time_steps_per_year = Some(steps);
        self
    }

    /// Enables the Brownian bridge.
    #[inline]
    pub fn brownian_bridge(mut self, enabled: bool) -> Self {
        self.brownian_bridge = enabled;
        self
    }

    /// Enables antithetic sampling.
    #[inline]
    pub fn antithetic(mut self, enabled: bool) -> Self {
        self.antithetic = enabled;
        self
    }

    /// Enables the engine's control variate.
    #[inline]
    pub fn control_variate(mut self, enabled: bool) -> Self {
        self.control_variate = enabled;
        self
    }

    /// Sets a fixed sample count.
    #[inline]
    pub fn required_samples(mut self, samples: usize) -> Self {
        self.required_samples = Some(samples);
        self
    }

    /// Sets a target error estimate.
    #[inline]
    pub fn required_tolerance(mut self, tolerance: f64) -> Self {
        self.required_tolerance = Some(tolerance);
        self
    }

    /// Sets the sample cap.
    #[inline]
    pub fn max_samples(mut self, samples: usize) -> Self {
        self.max_samples = Some(samples);
        self
    }

    /// Sets the seed for reproducibility.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Selects the random number source.
    #[inline]
    pub fn rng(mut self, rng: RngKind) -> Self {
        self.rng = rng;
        self
    }

    /// Sets the paths per parallel batch.
    #[inline]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<MonteCarloConfig, ConfigError> {
        let config = MonteCarloConfig {
            time_steps: self.time_steps,
            time_steps_per_year: self.time_steps_per_year,
            brownian_bridge: self.brownian_bridge,
            antithetic: self.antithetic,
            control_variate: self.control_variate,
            required_samples: self.required_samples,
            required_tolerance: self.required_tolerance,
            max_samples: self.max_samples.unwrap_or(MAX_SAMPLES),
            seed: self.seed,
            rng: self.rng,
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Longstaff-Schwartz calibration settings.
///
/// Unset calibration flags follow the pricing configuration; the
/// calibration seed defaults to the pricing seed plus
/// [`CALIBRATION_SEED_OFFSET`], so calibration and pricing paths differ.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::lsm::BasisKind;
/// use pricer_pricing::mc::{LsmConfig, MonteCarloConfig};
///
/// let mc = MonteCarloConfig::builder().required_samples(10_000).seed(7).build().unwrap();
/// let lsm = LsmConfig::builder()
///     .calibration_samples(4096)
///     .basis(BasisKind::Laguerre)
///     .build()
///     .unwrap();
/// let settings = lsm.calibration_settings(&mc);
/// assert_eq!(settings.seed, 7 + 1_768_237_423);
/// assert_eq!(lsm.polynomial_order(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LsmConfig {
    calibration_samples: usize,
    antithetic_calibration: Option<bool>,
    brownian_bridge_calibration: Option<bool>,
    calibration_seed: Option<u64>,
    polynomial_order: usize,
    basis: BasisKind,
    degenerate_fit: DegenerateFitPolicy,
}

impl Default for LsmConfig {
    fn default() -> Self {
        Self {
            calibration_samples: 2048,
            antithetic_calibration: None,
            brownian_bridge_calibration: None,
            calibration_seed: None,
            polynomial_order: 2,
            basis: BasisKind::Monomial,
            degenerate_fit: DegenerateFitPolicy::AlwaysContinue,
        }
    }
}

impl LsmConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> LsmConfigBuilder {
        LsmConfigBuilder::default()
    }

    /// Number of calibration paths.
    #[inline]
    pub fn calibration_samples(&self) -> usize {
        self.calibration_samples
    }

    /// Polynomial order of the basis.
    #[inline]
    pub fn polynomial_order(&self) -> usize {
        self.polynomial_order
    }

    /// Polynomial family of the basis.
    #[inline]
    pub fn basis(&self) -> BasisKind {
        self.basis
    }

    /// Behaviour at exercise dates without enough in-the-money paths.
    #[inline]
    pub fn degenerate_fit(&self) -> DegenerateFitPolicy {
        self.degenerate_fit
    }

    /// Drawing settings of the calibration pass.
    ///
    /// Calibration sequences start past the last sequence the pricing pass
    /// can draw (`max_samples`). A Halton calibration therefore never reuses
    /// a pricing point; it ignores the seed, as Halton pricing does.
    pub fn calibration_settings(&self, mc: &MonteCarloConfig) -> SequenceSettings {
        SequenceSettings {
            rng: mc.rng(),
            seed: self
                .calibration_seed
                .unwrap_or_else(|| mc.seed().wrapping_add(CALIBRATION_SEED_OFFSET)),
            antithetic: self.antithetic_calibration.unwrap_or(mc.antithetic()),
            brownian_bridge: self
                .brownian_bridge_calibration
                .unwrap_or(mc.brownian_bridge()),
            batch_size: mc.batch_size(),
            first_sequence: mc.max_samples() as u64,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("calibration_samples", Some(self.calibration_samples))
    }
}

/// Builder for [`LsmConfig`].
#[derive(Clone, Debug, Default)]
pub struct LsmConfigBuilder {
    config: LsmConfig,
}

impl LsmConfigBuilder {
    /// Sets the number of calibration paths.
    #[inline]
    pub fn calibration_samples(mut self, samples: usize) -> Self {
        self.config.calibration_samples = samples;
        self
    }

    /// Overrides antithetic sampling for calibration.
    #[inline]
    pub fn antithetic_calibration(mut self, enabled: bool) -> Self {
        self.config.antithetic_calibration = Some(enabled);
        self
    }

    /// Overrides the Brownian bridge for calibration.
    #[inline]
    pub fn brownian_bridge_calibration(mut self, enabled: bool) -> Self {
        self.config.brownian_bridge_calibration = Some(enabled);
        self
    }

    /// Sets the calibration seed explicitly. Has no effect on Halton runs.
    #[inline]
    pub fn calibration_seed(mut self, seed: u64) -> Self {
        self.config.calibration_seed = Some(seed);
        self
    }

    /// Sets the polynomial order.
    #[inline]
    pub fn polynomial_order(mut self, order: usize) -> Self {
        self.config.polynomial_order = order;
        self
    }

    /// Selects the polynomial family.
    #[inline]
    pub fn basis(mut self, basis: BasisKind) -> Self {
        self.config.basis = basis;
        self
    }

    /// Selects the degenerate-fit policy.
    #[inline]
    pub fn degenerate_fit(mut self, policy: DegenerateFitPolicy) -> Self {
        self.config.degenerate_fit = policy;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<LsmConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder_defaults() {
        let config = MonteCarloConfig::builder()
            .required_samples(1000)
            .build()
            .unwrap();
        assert_eq!(config.max_samples(), MAX_SAMPLES);
        assert_eq!(config.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(config.rng(), RngKind::PseudoRandom);
        assert_eq!(config.steps_for(5.0), 0);
        assert!(!config.antithetic());
    }

    #[test]
    fn test_missing_sample_target() {
        assert_eq!(
            MonteCarloConfig::builder().time_steps(10).build(),
            Err(ConfigError::MissingSampleTarget)
        );
    }

    #[test]
    fn test_tolerance_needs_pseudo_random() {
        let result = MonteCarloConfig::builder()
            .required_tolerance(0.01)
            .rng(RngKind::LowDiscrepancy)
            .build();
        assert_eq!(result, Err(ConfigError::ToleranceWithLowDiscrepancy));
    }

    #[test]
    fn test_conflicting_steps() {
        let result = MonteCarloConfig::builder()
            .time_steps(10)
            .time_steps_per_year(10)
            .required_samples(10)
            .build();
        assert_eq!(result, Err(ConfigError::ConflictingTimeSteps));
    }

    #[test]
    fn test_max_below_required() {
        let result = MonteCarloConfig::builder()
            .required_samples(100)
            .max_samples(10)
            .build();
        assert_eq!(
            result,
            Err(ConfigError::MaxBelowRequired {
                max: 10,
                required: 100
            })
        );
    }

    #[test]
    fn test_non_positive_values_rejected() {
        assert!(matches!(
            MonteCarloConfig::builder().required_samples(0).build(),
            Err(ConfigError::InvalidParameter {
                name: "required_samples",
                ..
            })
        ));
        assert!(matches!(
            MonteCarloConfig::builder().required_tolerance(-1.0).build(),
            Err(ConfigError::InvalidParameter {
                name: "required_tolerance",
                ..
            })
        ));
        assert!(matches!(
            MonteCarloConfig::builder()
                .required_samples(10)
                .time_steps(0)
                .build(),
            Err(ConfigError::InvalidParameter {
                name: "time_steps",
                ..
            })
        ));
    }

    #[test]
    fn test_steps_per_year_truncates_with_floor_of_one() {
        let config = MonteCarloConfig::builder()
            .time_steps_per_year(4)
            .required_samples(1)
            .build()
            .unwrap();
        assert_eq!(config.steps_for(1.9), 7);
        assert_eq!(config.steps_for(0.1), 1);
    }

    #[test]
    fn test_calibration_settings_inherit_and_override() {
        let mc = MonteCarloConfig::builder()
            .required_samples(10)
            .antithetic(true)
            .seed(u64::MAX)
            .build()
            .unwrap();
        let inherited = LsmConfig::default().calibration_settings(&mc);
        assert!(inherited.antithetic);
        assert_eq!(inherited.seed, CALIBRATION_SEED_OFFSET - 1);

        let lsm = LsmConfig::builder()
            .antithetic_calibration(false)
            .calibration_seed(5)
            .build()
            .unwrap();
        let settings = lsm.calibration_settings(&mc);
        assert!(!settings.antithetic);
        assert_eq!(settings.seed, 5);
        assert_eq!(settings.first_sequence, mc.max_samples() as u64);
        assert_eq!(mc.sequence_settings().first_sequence, 0);
        assert!(LsmConfig::builder().calibration_samples(0).build().is_err());
    }
}
