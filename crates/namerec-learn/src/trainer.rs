//! Projected subgradient descent on the structured hinge loss.
//!
//! Each iteration runs loss-augmented inference on every program, averages
//! the per-example subgradients, and takes one projected step. Per-example
//! work only reads the model, so it runs on rayon when enabled. Results are
//! gathered in corpus order and summed on the calling thread, which keeps
//! parallel and sequential runs bit-identical.

use rayon::prelude::*;

use namerec_core::{FeatureIndex, ProgramGraph};

use crate::error::LearnError;
use crate::inference::{InferenceConfig, InferenceEngine};
use crate::loss::Loss;
use crate::model::{Bounds, Model};
use crate::scoring::{indicator, score, SparseVector};

/// Hyperparameters of a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    pub iterations: usize,
    pub bounds: Bounds,
    /// Every weight starts here.
    pub initial_weight: f64,
    /// Coefficient of the `‖w‖₂ / 2` term in the reported loss. The term
    /// never enters the gradient.
    pub lambda: f64,
    pub inference: InferenceConfig,
    pub parallel: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            iterations: 30,
            bounds: Bounds::default(),
            initial_weight: 0.15,
            lambda: 0.5,
            inference: InferenceConfig::default(),
            parallel: true,
        }
    }
}

/// One example's contribution: `φ(y*) - φ(y)` and the hinge value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subgradient {
    pub gradient: SparseVector,
    pub loss: f64,
}

/// Result of [`Trainer::train`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    /// Weights with the lowest reported loss.
    pub weights: Vec<f64>,
    pub loss: f64,
    /// Number of updates applied before `weights` were evaluated.
    pub iteration: usize,
    /// Reported loss per evaluation: one before each update, plus one for
    /// the final weights.
    pub losses: Vec<f64>,
}

/// Owns the model being trained and applies one projected step per
/// iteration.
pub struct Trainer {
    model: Model,
    config: TrainerConfig,
}

impl Trainer {
    /// A trainer over `features` with every weight at `config.initial_weight`.
    pub fn new(features: FeatureIndex, config: TrainerConfig) -> Self {
        Trainer {
            model: Model::uniform(features, config.initial_weight),
            config,
        }
    }

    /// Continues from an existing model, e.g. weights loaded from a store.
    /// `config.initial_weight` is not applied.
    pub fn from_model(model: Model, config: TrainerConfig) -> Self {
        Trainer { model, config }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// The per-example oracle under the current weights.
    pub fn subgradient<L: Loss + ?Sized>(
        &self,
        program: &ProgramGraph,
        loss: &L,
    ) -> Result<Subgradient, LearnError> {
        let engine = InferenceEngine::new(&self.model, self.config.inference);
        let predicted = engine.infer(program, loss);
        let truth = program.truth();

        let hinge = score(&self.model, program, predicted.labels())?
            + loss.loss(truth, predicted.labels())
            - score(&self.model, program, truth)?;
        let gradient = indicator(&self.model, program, predicted.labels())?
            .difference(&indicator(&self.model, program, truth)?);
        Ok(Subgradient {
            gradient,
            loss: hinge,
        })
    }

    /// Averaged subgradient over `programs` and the reported (regularized)
    /// loss.
    fn evaluate<L: Loss + ?Sized>(
        &self,
        programs: &[ProgramGraph],
        loss: &L,
    ) -> Result<(SparseVector, f64), LearnError> {
        let per_example: Vec<Subgradient> = if self.config.parallel {
            programs
                .par_iter()
                .map(|program| self.subgradient(program, loss))
                .collect::<Result<_, _>>()?
        } else {
            programs
                .iter()
                .map(|program| self.subgradient(program, loss))
                .collect::<Result<_, _>>()?
        };

        let mut gradient = SparseVector::new();
        let mut total = 0.0;
        for example in &per_example {
            gradient += &example.gradient;
            total += example.loss;
        }
        let n = programs.len() as f64;
        gradient.scale(1.0 / n);
        gradient.prune();
        let reported = total / n + self.config.lambda * self.model.l2_norm() / 2.0;
        Ok((gradient, reported))
    }

    /// Runs `config.iterations` updates with step sizes drawn from `steps`.
    ///
    /// On return the model holds the best weights seen, which are also in
    /// the outcome.
    pub fn train<L: Loss + ?Sized>(
        &mut self,
        programs: &[ProgramGraph],
        steps: impl IntoIterator<Item = f64>,
        loss: &L,
    ) -> Result<TrainOutcome, LearnError> {
        if programs.is_empty() {
            return Err(LearnError::EmptyCorpus);
        }
        let mut steps = steps.into_iter();
        let mut losses = Vec::with_capacity(self.config.iterations + 1);
        let mut best: Option<(Vec<f64>, f64, usize)> = None;

        tracing::info!(
            programs = programs.len(),
            features = self.model.features().len(),
            iterations = self.config.iterations,
            parallel = self.config.parallel,
            lower = self.config.bounds.lower(),
            upper = self.config.bounds.upper(),
            "training started"
        );

        for iteration in 0..self.config.iterations {
            let (gradient, reported) = self.evaluate(programs, loss)?;
            losses.push(reported);
            keep_best(&mut best, &self.model, reported, iteration);

            let step = steps
                .next()
                .ok_or(LearnError::ScheduleExhausted { iteration })?;
            self.model.apply_step(&gradient, step, self.config.bounds)?;
            tracing::info!(iteration, loss = reported, step, "iteration complete");
        }

        let (_, reported) = self.evaluate(programs, loss)?;
        losses.push(reported);
        keep_best(&mut best, &self.model, reported, self.config.iterations);

        let (weights, best_loss, iteration) = match best {
            Some(best) => best,
            None => (self.model.weights().to_vec(), reported, self.config.iterations),
        };
        self.model.set_weights(weights.clone())?;
        tracing::info!(loss = best_loss, iteration, "training finished");

        Ok(TrainOutcome {
            weights,
            loss: best_loss,
            iteration,
            losses,
        })
    }
}

/// Ties keep the earlier entry.
fn keep_best(
    best: &mut Option<(Vec<f64>, f64, usize)>,
    model: &Model,
    loss: f64,
    iteration: usize,
) {
    let improves = match best {
        Some((_, current, _)) => loss < *current,
        None => !loss.is_nan(),
    };
    if improves {
        *best = Some((model.weights().to_vec(), loss, iteration));
    }
}
