//! Generic RANSAC model fitting
//!
//! The engine is parameterised by an [`Estimator`] supplying the minimal
//! sample size, a fitting function and a per-datum error. Randomness is always
//! injected by the caller so runs are reproducible for a fixed seed.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use wirecrate_core::{Error, Result};

/// A model family that RANSAC can fit.
///
/// Implementations must be pure: `fit` and `error` may be called from any
/// iteration, in any order, on any thread.
pub trait Estimator {
    /// One element of the dataset
    type Datum: Clone;
    /// The fitted model
    type Model;
    /// Number of samples drawn per iteration
    const SAMPLE_SIZE: usize;

    /// Fit a model to every one of `samples`; `None` for degenerate samples
    fn fit(&self, samples: &[Self::Datum]) -> Option<Self::Model>;

    /// Error of one datum against a model
    fn error(&self, datum: &Self::Datum, model: &Self::Model) -> f64;
}

/// RANSAC loop parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RansacParams {
    /// Number of iterations to run when no early exit triggers
    pub max_iterations: usize,
    /// A datum is an inlier when its error is strictly below this threshold
    pub inlier_threshold: f64,
    /// Return as soon as the best model has more inliers than this
    pub good_inlier_count: Option<usize>,
    /// Refit a new best model on its full inlier set
    pub refit: bool,
}

impl RansacParams {
    pub fn new(max_iterations: usize, inlier_threshold: f64) -> Self {
        Self {
            max_iterations,
            inlier_threshold,
            good_inlier_count: None,
            refit: true,
        }
    }

    pub fn with_good_inlier_count(mut self, count: usize) -> Self {
        self.good_inlier_count = Some(count);
        self
    }

    pub fn without_refit(mut self) -> Self {
        self.refit = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max_iterations must be positive".to_string()));
        }
        if !(self.inlier_threshold > 0.0) {
            return Err(Error::InvalidConfig("inlier_threshold must be positive".to_string()));
        }
        Ok(())
    }
}

/// Outcome of a RANSAC run.
///
/// `model` is `None` when the dataset was smaller than the sample size or no
/// candidate had a single inlier; that is a normal empty result, not an error.
#[derive(Debug, Clone)]
pub struct RansacResult<M> {
    pub model: Option<M>,
    /// Indices of the inliers of the winning candidate
    pub inliers: Vec<usize>,
    /// Number of iterations actually performed
    pub iterations: usize,
}

impl<M> RansacResult<M> {
    fn empty(iterations: usize) -> Self {
        Self {
            model: None,
            inliers: Vec::new(),
            iterations,
        }
    }

    pub fn inlier_count(&self) -> usize {
        self.inliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_none()
    }
}

/// RANSAC driver for one estimator
#[derive(Debug, Clone)]
pub struct Ransac<E> {
    estimator: E,
    params: RansacParams,
}

impl<E: Estimator> Ransac<E> {
    pub fn new(estimator: E, params: RansacParams) -> Self {
        Self { estimator, params }
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn params(&self) -> &RansacParams {
        &self.params
    }

    /// Error of every datum against `model`
    pub fn errors(&self, data: &[E::Datum], model: &E::Model) -> Vec<f64> {
        data.iter().map(|d| self.estimator.error(d, model)).collect()
    }

    /// Indices of the data whose error against `model` is below the threshold
    pub fn inliers(&self, data: &[E::Datum], model: &E::Model) -> Vec<usize> {
        data.iter()
            .enumerate()
            .filter(|(_, d)| self.estimator.error(d, model) < self.params.inlier_threshold)
            .map(|(i, _)| i)
            .collect()
    }

    fn sample_fit<R: Rng + ?Sized>(&self, data: &[E::Datum], rng: &mut R) -> Option<E::Model> {
        let samples: Vec<E::Datum> = index::sample(rng, data.len(), E::SAMPLE_SIZE)
            .into_iter()
            .map(|i| data[i].clone())
            .collect();
        self.estimator.fit(&samples)
    }

    /// Replace a candidate by the fit to its full inlier set, when enabled and possible
    fn refine(&self, data: &[E::Datum], candidate: E::Model, inliers: &[usize]) -> E::Model {
        if !self.params.refit || inliers.len() < E::SAMPLE_SIZE {
            return candidate;
        }
        let inlier_data: Vec<E::Datum> = inliers.iter().map(|&i| data[i].clone()).collect();
        self.estimator.fit(&inlier_data).unwrap_or(candidate)
    }

    /// Run the sequential RANSAC loop.
    ///
    /// A candidate replaces the running best only with strictly more inliers,
    /// so ties keep the first model found.
    pub fn run<R: Rng + ?Sized>(&self, data: &[E::Datum], rng: &mut R) -> RansacResult<E::Model> {
        if E::SAMPLE_SIZE == 0 || data.len() < E::SAMPLE_SIZE {
            return RansacResult::empty(0);
        }

        let mut best_model: Option<E::Model> = None;
        let mut best_inliers: Vec<usize> = Vec::new();

        for iteration in 1..=self.params.max_iterations {
            let Some(candidate) = self.sample_fit(data, rng) else {
                continue;
            };
            let inliers = self.inliers(data, &candidate);

            if inliers.len() > best_inliers.len() {
                best_model = Some(self.refine(data, candidate, &inliers));
                best_inliers = inliers;
            }

            if let Some(good) = self.params.good_inlier_count {
                if best_inliers.len() > good {
                    return RansacResult {
                        model: best_model,
                        inliers: best_inliers,
                        iterations: iteration,
                    };
                }
            }
        }

        RansacResult {
            model: best_model,
            inliers: best_inliers,
            iterations: self.params.max_iterations,
        }
    }

    /// Run all iterations in parallel.
    ///
    /// Iteration `i` draws from its own generator seeded with `seed + i`, and the
    /// reduction keeps the lowest iteration index among equal inlier counts, so
    /// the result depends only on `seed`. Every iteration runs; the early-exit
    /// count is not consulted.
    pub fn run_parallel(&self, data: &[E::Datum], seed: u64) -> RansacResult<E::Model>
    where
        E: Sync,
        E::Datum: Sync,
        E::Model: Send,
    {
        if E::SAMPLE_SIZE == 0 || data.len() < E::SAMPLE_SIZE {
            return RansacResult::empty(0);
        }

        let candidates: Vec<(E::Model, Vec<usize>)> = (0..self.params.max_iterations)
            .into_par_iter()
            .filter_map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                let candidate = self.sample_fit(data, &mut rng)?;
                let inliers = self.inliers(data, &candidate);
                (!inliers.is_empty()).then_some((candidate, inliers))
            })
            .collect();

        // `collect` keeps iteration order, so the first of equal counts wins
        let best = candidates.into_iter().fold(None, |best: Option<(E::Model, Vec<usize>)>, c| match best {
            Some(b) if b.1.len() >= c.1.len() => Some(b),
            _ => Some(c),
        });

        match best {
            Some((candidate, inliers)) => RansacResult {
                model: Some(self.refine(data, candidate, &inliers)),
                inliers,
                iterations: self.params.max_iterations,
            },
            None => RansacResult::empty(self.params.max_iterations),
        }
    }
}
