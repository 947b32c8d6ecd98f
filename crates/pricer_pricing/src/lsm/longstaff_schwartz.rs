//! Two-phase Longstaff-Schwartz regression.
//!
//! Calibration archives the exercise values and regression states of a set
//! of independent paths, then sweeps backward over the exercise dates:
//!
//! ```text
//! V = h_{m-1}
//! for e = m-2 .. 0:
//!     V ← D_e · V                           (roll back to date e)
//!     β_e = argmin Σ_{ITM} (φ(x_e) · β - V)²
//!     V ← h_e   where h_e > 0 and φ(x_e) · β_e < h_e
//! ```
//!
//! The fitted coefficients are then frozen into a [`LongstaffSchwartzPathPricer`]
//! which replays the same rule on fresh paths. Once that pricer has priced a
//! path it is in [`LsmPhase::Pricing`] and nothing can refit it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, info};

use pricer_core::math::least_squares;
use pricer_models::models::StochasticProcess;

use super::basis::BasisSystem;
use super::path_pricer::{EarlyExercisePathPricer, ExerciseDiscounts};
use crate::mc::{
    ControlVariate, LsmConfig, McError, MonteCarloConfig, MonteCarloModel, MonteCarloSimulation,
    MultiPath, PathGenerator, PathPricer, SampleAccumulator, TimeGrid,
};

/// What to do at an exercise date with fewer in-the-money paths than basis
/// functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DegenerateFitPolicy {
    /// Never exercise at that date.
    #[default]
    AlwaysContinue,
    /// Use zero coefficients: exercise whenever in the money.
    ZeroCoefficients,
}

/// Life cycle of a regression pricer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsmPhase {
    /// No path archived yet.
    Uninitialized,
    /// Archiving calibration paths.
    Calibrating,
    /// Coefficients fitted, no path priced yet.
    Calibrated,
    /// Pricing fresh paths with frozen coefficients.
    Pricing,
}

/// Exercise values and regression states of one archived path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSnapshot {
    states: Vec<f64>,
    values: Vec<f64>,
}

/// Outcome of a calibration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationReport {
    /// Archived paths
    pub paths: usize,
    /// Exercise dates, including the last one which needs no fit
    pub exercise_dates: usize,
    /// Dates with a regression fit
    pub fitted_dates: usize,
    /// Dates skipped for lack of in-the-money paths
    pub skipped_dates: Vec<usize>,
    /// Value of the archived paths under the fitted rule
    pub in_sample_value: f64,
}

/// Archive of calibration paths.
pub struct LongstaffSchwartzCalibrator<'a> {
    product: &'a dyn EarlyExercisePathPricer,
    discounts: ExerciseDiscounts,
    policy: DegenerateFitPolicy,
    states: Vec<f64>,
    values: Vec<f64>,
    paths: usize,
}

impl<'a> LongstaffSchwartzCalibrator<'a> {
    /// Creates an empty archive for `product`.
    ///
    /// # Errors
    ///
    /// [`McError::InvalidInput`] when the product has no exercise dates or
    /// `discounts` covers a different number of them.
    pub fn new(
        product: &'a dyn EarlyExercisePathPricer,
        discounts: ExerciseDiscounts,
        policy: DegenerateFitPolicy,
    ) -> Result<Self, McError> {
        let m = product.number_of_exercises();
        if m == 0 {
            return Err(McError::InvalidInput("no exercise dates".to_string()));
        }
        if discounts.exercises() != m {
            return Err(McError::InvalidInput(format!(
                "{} discount dates for {m} exercise dates",
                discounts.exercises()
            )));
        }
        Ok(Self {
            product,
            discounts,
            policy,
            states: Vec::new(),
            values: Vec::new(),
            paths: 0,
        })
    }

    /// Current phase: uninitialised until the first path is archived.
    pub fn phase(&self) -> LsmPhase {
        if self.paths == 0 {
            LsmPhase::Uninitialized
        } else {
            LsmPhase::Calibrating
        }
    }

    /// Number of archived paths.
    #[inline]
    pub fn paths(&self) -> usize {
        self.paths
    }

    /// Reads what calibration needs from `path` without archiving it.
    pub fn snapshot(&self, path: &MultiPath) -> PathSnapshot {
        let m = self.product.number_of_exercises();
        let dim = self.product.basis_system().dimension();
        let mut states = vec![0.0; m * dim];
        let mut values = vec![0.0; m];
        for e in 0..m {
            self.product
                .state(path, e, &mut states[e * dim..(e + 1) * dim]);
            values[e] = self.product.exercise_value(path, e);
        }
        PathSnapshot { states, values }
    }

    /// Archives a snapshot.
    pub fn push(&mut self, snapshot: PathSnapshot) {
        self.states.extend_from_slice(&snapshot.states);
        self.values.extend_from_slice(&snapshot.values);
        self.paths += 1;
    }

    /// Archives `path`. Calibration paths carry no value of their own, so
    /// this returns zero.
    pub fn archive(&mut self, path: &MultiPath) -> f64 {
        let snapshot = self.snapshot(path);
        self.push(snapshot);
        0.0
    }

    /// Fits the exercise rule and freezes it into a pricer.
    ///
    /// # Errors
    ///
    /// [`McError::InvalidInput`] when nothing was archived;
    /// [`McError::Linalg`] when a regression fails.
    pub fn calibrate(self) -> Result<(LongstaffSchwartzPathPricer<'a>, CalibrationReport), McError> {
        if self.paths == 0 {
            return Err(McError::InvalidInput(
                "calibration needs at least one path".to_string(),
            ));
        }
        let product = self.product;
        let m = product.number_of_exercises();
        let basis = product.basis_system();
        let dim = basis.dimension();
        let k = basis.len();
        let n = self.paths;

        let value = |p: usize, e: usize| self.values[p * m + e];
        let state = |p: usize, e: usize| {
            let start = (p * m + e) * dim;
            &self.states[start..start + dim]
        };

        let mut prices: Vec<f64> = (0..n).map(|p| value(p, m - 1)).collect();
        let mut coefficients: Vec<Option<DVector<f64>>> = vec![None; m.saturating_sub(1)];
        let mut skipped_dates = Vec::new();
        let mut row = vec![0.0; k];

        for e in (0..m.saturating_sub(1)).rev() {
            let df = self.discounts.between(e);
            prices.iter_mut().for_each(|v| *v *= df);

            let itm: Vec<usize> = (0..n).filter(|&p| value(p, e) > 0.0).collect();
            if itm.len() < k {
                debug!(exercise = e, itm = itm.len(), basis = k, "Skipping regression");
                skipped_dates.push(e);
            } else {
                let mut design = DMatrix::zeros(itm.len(), k);
                let mut rhs = DVector::zeros(itm.len());
                for (r, &p) in itm.iter().enumerate() {
                    basis.evaluate(state(p, e), &mut row);
                    for (c, v) in row.iter().enumerate() {
                        design[(r, c)] = *v;
                    }
                    rhs[r] = prices[p];
                }
                coefficients[e] = Some(least_squares(&design, &rhs)?);
            }

            for &p in &itm {
                let exercise = value(p, e);
                let continuation =
                    continuation_value(basis, coefficients[e].as_ref(), self.policy, state(p, e), &mut row);
                if continuation < exercise {
                    prices[p] = exercise;
                }
            }
        }

        let in_sample_value =
            prices.iter().sum::<f64>() / n as f64 * self.discounts.to_valuation();
        skipped_dates.reverse();
        let report = CalibrationReport {
            paths: n,
            exercise_dates: m,
            fitted_dates: coefficients.iter().filter(|c| c.is_some()).count(),
            skipped_dates,
            in_sample_value,
        };
        info!(
            paths = report.paths,
            fitted = report.fitted_dates,
            skipped = report.skipped_dates.len(),
            in_sample = report.in_sample_value,
            "Longstaff-Schwartz calibration finished"
        );

        Ok((
            LongstaffSchwartzPathPricer {
                product,
                discounts: self.discounts,
                policy: self.policy,
                coefficients,
                pricing: AtomicBool::new(false),
                priced: AtomicU64::new(0),
                exercised: AtomicU64::new(0),
            },
            report,
        ))
    }
}

fn continuation_value(
    basis: &BasisSystem,
    coefficients: Option<&DVector<f64>>,
    policy: DegenerateFitPolicy,
    state: &[f64],
    scratch: &mut [f64],
) -> f64 {
    match (coefficients, policy) {
        (Some(beta), _) => {
            basis.evaluate(state, scratch);
            scratch.iter().zip(beta.iter()).map(|(a, b)| a * b).sum()
        }
        (None, DegenerateFitPolicy::AlwaysContinue) => f64::INFINITY,
        (None, DegenerateFitPolicy::ZeroCoefficients) => 0.0,
    }
}

/// Path pricer replaying a calibrated exercise rule.
pub struct LongstaffSchwartzPathPricer<'a> {
    product: &'a dyn EarlyExercisePathPricer,
    discounts: ExerciseDiscounts,
    policy: DegenerateFitPolicy,
    coefficients: Vec<Option<DVector<f64>>>,
    pricing: AtomicBool,
    priced: AtomicU64,
    exercised: AtomicU64,
}

impl LongstaffSchwartzPathPricer<'_> {
    /// [`LsmPhase::Calibrated`] until the first path is priced.
    pub fn phase(&self) -> LsmPhase {
        if self.pricing.load(Ordering::Relaxed) {
            LsmPhase::Pricing
        } else {
            LsmPhase::Calibrated
        }
    }

    /// Regression coefficients at exercise `exercise`; `None` at the last
    /// date and at skipped dates.
    pub fn coefficients(&self, exercise: usize) -> Option<&DVector<f64>> {
        self.coefficients.get(exercise).and_then(Option::as_ref)
    }

    /// Estimated continuation value at `exercise` for regression state
    /// `state`, in units of that date.
    pub fn continuation_value(&self, exercise: usize, state: &[f64]) -> f64 {
        let basis = self.product.basis_system();
        let mut scratch = vec![0.0; basis.len()];
        if exercise + 1 >= self.product.number_of_exercises() {
            return 0.0;
        }
        continuation_value(
            basis,
            self.coefficients(exercise),
            self.policy,
            state,
            &mut scratch,
        )
    }

    /// Fraction of priced paths that were exercised at some date.
    pub fn exercise_probability(&self) -> f64 {
        let priced = self.priced.load(Ordering::Relaxed);
        if priced == 0 {
            return 0.0;
        }
        self.exercised.load(Ordering::Relaxed) as f64 / priced as f64
    }
}

impl PathPricer for LongstaffSchwartzPathPricer<'_> {
    fn price(&self, path: &MultiPath) -> f64 {
        self.pricing.store(true, Ordering::Relaxed);
        let m = self.product.number_of_exercises();
        let basis = self.product.basis_system();
        let mut state = vec![0.0; basis.dimension()];
        let mut scratch = vec![0.0; basis.len()];

        let mut price = self.product.exercise_value(path, m - 1);
        let mut exercised = price > 0.0;
        for e in (0..m - 1).rev() {
            price *= self.discounts.between(e);
            let exercise = self.product.exercise_value(path, e);
            if exercise <= 0.0 {
                continue;
            }
            self.product.state(path, e, &mut state);
            let continuation = continuation_value(
                basis,
                self.coefficients[e].as_ref(),
                self.policy,
                &state,
                &mut scratch,
            );
            if continuation < exercise {
                price = exercise;
                exercised = true;
            }
        }

        self.priced.fetch_add(1, Ordering::Relaxed);
        if exercised {
            self.exercised.fetch_add(1, Ordering::Relaxed);
        }
        price * self.discounts.to_valuation()
    }
}

/// Result of a full calibrate-then-price run.
#[derive(Debug, Clone, PartialEq)]
pub struct LsmValuation {
    /// Value
    pub value: f64,
    /// Standard error of the value
    pub error_estimate: f64,
    /// Pricing samples
    pub samples: usize,
    /// Fraction of pricing paths exercised at some date
    pub exercise_probability: f64,
    /// Calibration outcome
    pub report: CalibrationReport,
}

/// Calibrates on an independent set of paths, then prices with the frozen
/// rule under the stopping rule of `mc`.
///
/// Calibration paths are drawn in parallel batches with
/// [`LsmConfig::calibration_settings`]; each batch's snapshots are archived
/// in batch order, so the fitted rule does not depend on the thread count.
///
/// # Errors
///
/// Propagates calibration, generator and convergence failures.
pub fn price_with_regression<P: StochasticProcess + ?Sized>(
    process: &P,
    grid: Arc<TimeGrid>,
    product: &dyn EarlyExercisePathPricer,
    discounts: ExerciseDiscounts,
    mc: &MonteCarloConfig,
    lsm: &LsmConfig,
    control_variate: Option<ControlVariate<'_>>,
) -> Result<LsmValuation, McError> {
    let mut calibrator = LongstaffSchwartzCalibrator::new(product, discounts, lsm.degenerate_fit())?;

    let settings = lsm.calibration_settings(mc);
    let samples = lsm.calibration_samples();
    let batch_size = settings.batch_size.max(1);
    let batches: Vec<(u64, usize, usize)> = (0..samples)
        .step_by(batch_size)
        .enumerate()
        .map(|(b, start)| (b as u64, start, batch_size.min(samples - start)))
        .collect();

    let archive = &calibrator;
    let snapshots: Vec<Result<Vec<PathSnapshot>, McError>> = batches
        .par_iter()
        .map(|&(batch, start, count)| {
            let mut generator =
                PathGenerator::for_batch(process, Arc::clone(&grid), &settings, batch, start as u64)?;
            let mut out = Vec::with_capacity(if settings.antithetic { 2 * count } else { count });
            for _ in 0..count {
                out.push(archive.snapshot(generator.next()?.value));
                if settings.antithetic {
                    out.push(archive.snapshot(generator.antithetic()?.value));
                }
            }
            Ok(out)
        })
        .collect();
    for batch in snapshots {
        for snapshot in batch? {
            calibrator.push(snapshot);
        }
    }

    let (pricer, report) = calibrator.calibrate()?;

    let mut model = MonteCarloModel::new(process, grid, &pricer, mc.sequence_settings());
    if let Some(cv) = control_variate {
        model = model.with_control_variate(cv);
    }
    let mut simulation = MonteCarloSimulation::new(model);
    let value = simulation.run(mc)?;
    let stats = simulation.accumulator();

    Ok(LsmValuation {
        value,
        error_estimate: stats.error_estimate(),
        samples: stats.samples(),
        exercise_probability: pricer.exercise_probability(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsm::BasisKind;
    use crate::rng::RngKind;
    use pricer_models::models::BlackScholesProcess;

    /// Deterministic product on a one-factor path: state is the spot, values
    /// are read straight from the path.
    struct Put {
        strike: f64,
        basis: BasisSystem,
        exercises: usize,
    }

    impl EarlyExercisePathPricer for Put {
        fn number_of_exercises(&self) -> usize {
            self.exercises
        }
        fn state(&self, path: &MultiPath, exercise: usize, out: &mut [f64]) {
            out[0] = path.value(exercise + 1, 0) / self.strike;
        }
        fn exercise_value(&self, path: &MultiPath, exercise: usize) -> f64 {
            (self.strike - path.value(exercise + 1, 0)).max(0.0)
        }
        fn basis_system(&self) -> &BasisSystem {
            &self.basis
        }
    }

    fn put(exercises: usize) -> Put {
        Put {
            strike: 1.0,
            basis: BasisSystem::univariate(BasisKind::Monomial, 2),
            exercises,
        }
    }

    fn path(values: &[f64]) -> MultiPath {
        let grid = Arc::new(TimeGrid::regular(1.0, values.len() - 1).unwrap());
        let mut path = MultiPath::new(grid, 1);
        for (i, v) in values.iter().enumerate() {
            path.state_mut(i)[0] = *v;
        }
        path
    }

    #[test]
    fn test_phases() {
        let product = put(2);
        let discounts = ExerciseDiscounts::deflated(2, 1.0).unwrap();
        let mut calibrator =
            LongstaffSchwartzCalibrator::new(&product, discounts, DegenerateFitPolicy::default())
                .unwrap();
        assert_eq!(calibrator.phase(), LsmPhase::Uninitialized);
        assert_eq!(calibrator.archive(&path(&[1.0, 0.9, 0.8])), 0.0);
        assert_eq!(calibrator.phase(), LsmPhase::Calibrating);

        let (pricer, _) = calibrator.calibrate().unwrap();
        assert_eq!(pricer.phase(), LsmPhase::Calibrated);
        pricer.price(&path(&[1.0, 0.9, 0.8]));
        assert_eq!(pricer.phase(), LsmPhase::Pricing);
    }

    #[test]
    fn test_empty_archive_rejected() {
        let product = put(2);
        let discounts = ExerciseDiscounts::deflated(2, 1.0).unwrap();
        let calibrator =
            LongstaffSchwartzCalibrator::new(&product, discounts, DegenerateFitPolicy::default())
                .unwrap();
        assert!(calibrator.calibrate().is_err());
    }

    #[test]
    fn test_discount_schedule_must_match() {
        let product = put(3);
        let discounts = ExerciseDiscounts::deflated(2, 1.0).unwrap();
        assert!(
            LongstaffSchwartzCalibrator::new(&product, discounts, DegenerateFitPolicy::default())
                .is_err()
        );
    }

    #[test]
    fn test_degenerate_policies() {
        // Two ITM paths at the first date, fewer than three basis functions
        let archive = |policy| {
            let product = put(2);
            let discounts = ExerciseDiscounts::deflated(2, 1.0).unwrap();
            let mut c = LongstaffSchwartzCalibrator::new(&product, discounts, policy).unwrap();
            c.archive(&path(&[1.0, 0.5, 0.9]));
            c.archive(&path(&[1.0, 0.7, 1.2]));
            c.archive(&path(&[1.0, 1.3, 0.6]));
            let (pricer, report) = c.calibrate().unwrap();
            assert_eq!(report.skipped_dates, vec![0]);
            assert_eq!(report.fitted_dates, 0);
            (pricer.price(&path(&[1.0, 0.5, 0.9])), report.in_sample_value)
        };

        let (continue_price, continue_in_sample) = archive(DegenerateFitPolicy::AlwaysContinue);
        assert!((continue_price - 0.1).abs() < 1e-12);
        assert!((continue_in_sample - 0.5 / 3.0).abs() < 1e-12);

        let (exercise_price, exercise_in_sample) = archive(DegenerateFitPolicy::ZeroCoefficients);
        assert!((exercise_price - 0.5).abs() < 1e-12);
        assert!((exercise_in_sample - (0.5 + 0.3 + 0.4) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_discounting_applies_between_dates() {
        let product = put(2);
        let discounts = ExerciseDiscounts::new(vec![0.9], 0.8).unwrap();
        let mut c =
            LongstaffSchwartzCalibrator::new(&product, discounts, DegenerateFitPolicy::AlwaysContinue)
                .unwrap();
        c.archive(&path(&[1.0, 1.1, 0.5]));
        let (pricer, _) = c.calibrate().unwrap();
        // Out of the money at the first date: terminal payoff, discounted twice
        assert!((pricer.price(&path(&[1.0, 1.1, 0.5])) - 0.5 * 0.9 * 0.8).abs() < 1e-12);
        assert_eq!(pricer.exercise_probability(), 1.0);
        pricer.price(&path(&[1.0, 1.1, 1.5]));
        assert_eq!(pricer.exercise_probability(), 0.5);
    }

    #[test]
    fn test_halton_pricing_paths_are_out_of_sample() {
        let process = BlackScholesProcess::new(1.0, 0.05, 0.0, 0.2).unwrap();
        let grid = Arc::new(TimeGrid::regular(1.0, 4).unwrap());
        let product = put(4);
        let discounts = ExerciseDiscounts::deflated(4, 1.0).unwrap();
        let mc = MonteCarloConfig::builder()
            .rng(RngKind::LowDiscrepancy)
            .antithetic(false)
            .required_samples(1024)
            .build()
            .unwrap();
        let lsm = LsmConfig::builder().calibration_samples(1024).build().unwrap();

        let valuation =
            price_with_regression(&process, grid, &product, discounts, &mc, &lsm, None).unwrap();
        assert_eq!(valuation.samples, 1024);
        assert_eq!(valuation.report.paths, 1024);
        // Same point set on both passes would reproduce the in-sample value
        assert!(
            (valuation.value - valuation.report.in_sample_value).abs() > 1e-9,
            "pricing {} in-sample {}",
            valuation.value,
            valuation.report.in_sample_value
        );
    }
}
