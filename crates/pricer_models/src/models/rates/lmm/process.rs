//! LIBOR market model as a stochastic process.
//!
//! The state is the vector of forwards. Each simulation step `k` owns the
//! pseudo-root `A_k`, a drift calculator and the Itô correction
//! `-½ C_ii`; increments are applied to displaced log forwards:
//!
//! ```text
//! f_i(t_k) = (f_i(t_{k-1}) + δ_i) exp(μ_i + (A_k Z)_i) - δ_i
//! ```
//!
//! The process must be evolved on the same time grid it was built on:
//! step data is looked up by start time, and the standard deviation over a
//! step is `A_k` regardless of the `dt` passed in.

use nalgebra::DMatrix;

use super::super::super::error::ModelError;
use super::super::super::evolver::Discretization;
use super::super::super::stochastic::StochasticProcess;
use super::drift::{DriftAlgorithm, LmmDriftCalculator};
use super::market_model::{FlatVolMarketModel, LmmParameters};

#[derive(Debug, Clone)]
struct StepData {
    start: f64,
    dt: f64,
    pseudo_root: DMatrix<f64>,
    calculator: LmmDriftCalculator,
    fixed_drift: Vec<f64>,
}

/// LIBOR market model process on a fixed simulation grid.
#[derive(Debug, Clone)]
pub struct LiborMarketModelProcess {
    model: FlatVolMarketModel,
    steps: Vec<StepData>,
    algorithm: DriftAlgorithm,
}

impl LiborMarketModelProcess {
    /// Builds the process on a simulation grid `0 = t_0 < t_1 < ... < t_m`.
    ///
    /// # Errors
    ///
    /// Fails when the parameters are invalid or a grid time lies after the
    /// last reset `T_{n-1}`.
    pub fn new(
        parameters: LmmParameters,
        grid_times: &[f64],
        algorithm: DriftAlgorithm,
    ) -> Result<Self, ModelError> {
        let evolution_times: Vec<f64> = grid_times.iter().copied().filter(|&t| t > 0.0).collect();
        let model = FlatVolMarketModel::new(parameters, &evolution_times)?;
        let params = model.parameters();
        let taus = params.taus();

        let steps = model
            .steps()
            .iter()
            .map(|step| {
                let calculator = LmmDriftCalculator::new(
                    step.pseudo_root.clone(),
                    params.displacements.clone(),
                    taus.clone(),
                    step.numeraire,
                    step.alive,
                )?
                .with_algorithm(algorithm);
                let fixed_drift = (0..params.number_of_rates())
                    .map(|i| {
                        -0.5 * step.pseudo_root.row(i).iter().map(|a| a * a).sum::<f64>()
                    })
                    .collect();
                Ok(StepData {
                    start: step.start,
                    dt: step.end - step.start,
                    pseudo_root: step.pseudo_root.clone(),
                    calculator,
                    fixed_drift,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(Self {
            model,
            steps,
            algorithm,
        })
    }

    /// The same model rebuilt on another simulation grid.
    pub fn on_grid(&self, grid_times: &[f64]) -> Result<Self, ModelError> {
        Self::new(self.parameters().clone(), grid_times, self.algorithm)
    }

    /// Drift algorithm of every step.
    #[inline]
    pub fn drift_algorithm(&self) -> DriftAlgorithm {
        self.algorithm
    }

    /// Whether the process steps exactly along `grid_times`.
    pub fn is_built_on(&self, grid_times: &[f64]) -> bool {
        let ends: Vec<f64> = self.model.steps().iter().map(|s| s.end).collect();
        let wanted: Vec<f64> = grid_times.iter().copied().filter(|&t| t > 0.0).collect();
        ends.len() == wanted.len()
            && ends
                .iter()
                .zip(&wanted)
                .all(|(a, b)| (a - b).abs() <= 1e-12 * (1.0 + b.abs()))
    }

    /// Underlying discretised market model.
    #[inline]
    pub fn market_model(&self) -> &FlatVolMarketModel {
        &self.model
    }

    /// Model inputs.
    #[inline]
    pub fn parameters(&self) -> &LmmParameters {
        self.model.parameters()
    }

    /// Drift calculator of the step starting at or before `t`.
    pub fn drift_calculator(&self, t: f64) -> &LmmDriftCalculator {
        &self.step(t).calculator
    }

    fn step(&self, t: f64) -> &StepData {
        let idx = self
            .steps
            .partition_point(|s| s.start <= t + 1e-12)
            .saturating_sub(1);
        &self.steps[idx.min(self.steps.len() - 1)]
    }
}

impl StochasticProcess for LiborMarketModelProcess {
    fn size(&self) -> usize {
        self.parameters().number_of_rates()
    }

    fn factors(&self) -> usize {
        self.parameters().factors
    }

    fn initial_values(&self) -> Vec<f64> {
        self.parameters().initial_forwards.clone()
    }

    fn drift(&self, t: f64, x: &[f64]) -> Vec<f64> {
        let step = self.step(t);
        let mut drifts = vec![0.0; x.len()];
        step.calculator.compute(x, &mut drifts);
        for (d, c) in drifts.iter_mut().zip(&step.fixed_drift) {
            *d = (*d + c) / step.dt;
        }
        drifts
    }

    fn diffusion(&self, t: f64, _x: &[f64]) -> DMatrix<f64> {
        let step = self.step(t);
        &step.pseudo_root / step.dt.sqrt()
    }

    fn std_deviation(&self, t0: f64, _x0: &[f64], _dt: f64) -> DMatrix<f64> {
        self.step(t0).pseudo_root.clone()
    }

    fn apply(&self, x0: &[f64], dx: &[f64]) -> Vec<f64> {
        x0.iter()
            .zip(dx)
            .zip(&self.parameters().displacements)
            .map(|((x, d), delta)| (x + delta) * d.exp() - delta)
            .collect()
    }

    fn discretization(&self) -> Discretization {
        Discretization::PredictorCorrector
    }
}
