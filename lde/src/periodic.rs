//! A public column whose values repeat with a short period along the trace.
//! Stored compactly as the interpolant `q` of one period, so that
//! `f(x) = q(x^n_copies)` and the evaluation on any coset is again periodic.

use quarry_fft::{MultiplicativeFftBases, MultiplicativeGroupOrdering};
use quarry_field::{FftField, Field};
use quarry_util::math::{is_power_of_two, safe_div, safe_log2};
use quarry_util::{Error, Result};

use crate::lde::LdeManager;

#[derive(Clone)]
pub struct PeriodicColumn<F: FftField> {
    group_generator: F,
    column_step: u64,
    /// `column_step * values.len()`: the period with respect to the trace.
    period_in_trace: u64,
    /// `coset_size / period_in_trace`.
    n_copies: u64,
    /// The interpolant of one period, behind an Arc so columns clone
    /// cheaply into per-worker evaluations.
    lde: std::sync::Arc<LdeManager<F>>,
}

impl<F: FftField> PeriodicColumn<F> {
    /// A column whose evaluation on `offset * <group_generator>` (a coset of
    /// size `coset_size`) satisfies
    /// `f(offset * g^(i * column_step)) = values[i % values.len()]`.
    pub fn new(
        values: &[F],
        group_generator: F,
        offset: F,
        coset_size: u64,
        column_step: u64,
    ) -> Result<Self> {
        if !is_power_of_two(values.len() as u64) || !is_power_of_two(column_step) {
            return Err(Error::InvalidParameter(
                "periodic column length and step must be powers of two".to_string(),
            ));
        }
        let period_in_trace = column_step * values.len() as u64;
        if period_in_trace > coset_size || coset_size % period_in_trace != 0 {
            return Err(Error::InvalidParameter(
                "period must divide the coset size".to_string(),
            ));
        }
        let n_copies = safe_div(coset_size, period_in_trace);
        let log_period = safe_log2(values.len() as u64);

        // q interpolates the period on the size-|values| subgroup coset at
        // offset^n_copies; then f(x) = q(x^n_copies).
        let q_generator = group_generator.pow_u64(safe_div(coset_size, values.len() as u64));
        let q_offset = offset.pow_u64(n_copies);
        let bases = MultiplicativeFftBases::from_generator(
            q_generator,
            log_period as usize,
            q_offset,
            MultiplicativeGroupOrdering::Natural,
        )?;
        let mut manager = LdeManager::new(bases);
        manager.add_evaluation(values);
        Ok(Self {
            group_generator,
            column_step,
            period_in_trace,
            n_copies,
            lde: std::sync::Arc::new(manager),
        })
    }

    pub fn eval_at_point(&self, x: F) -> F {
        let mut out = [F::zero()];
        self.lde
            .eval_at_points(0, &[x.pow_u64(self.n_copies)], &mut out);
        out[0]
    }

    /// The degree of the interpolant; at most `period - 1`.
    pub fn actual_degree(&self) -> i64 {
        self.lde.get_evaluation_degree(0)
    }

    pub fn period_in_trace(&self) -> u64 {
        self.period_in_trace
    }

    /// The periodic evaluation on the coset `start_point * <g>`, supporting
    /// O(1)-amortized iteration from any starting row.
    pub fn get_coset(&self, start_point: F, coset_size: u64) -> Result<CosetEvaluation<F>> {
        if coset_size % self.period_in_trace != 0 {
            return Err(Error::InvalidParameter(
                "period must divide the coset size".to_string(),
            ));
        }
        let mut points = Vec::with_capacity(self.period_in_trace as usize);
        let mut x = start_point;
        for _ in 0..self.period_in_trace {
            points.push(x.pow_u64(self.n_copies));
            x *= self.group_generator;
        }
        let mut values = vec![F::zero(); points.len()];
        self.lde.eval_at_points(0, &points, &mut values);
        Ok(CosetEvaluation::new(values))
    }
}

/// One period of evaluations with wrap-around indexing; iterators are thin
/// and safe to spawn per worker.
pub struct CosetEvaluation<F: FftField> {
    values: Vec<F>,
    index_mask: u64,
}

impl<F: FftField> CosetEvaluation<F> {
    pub fn new(values: Vec<F>) -> Self {
        assert!(
            is_power_of_two(values.len() as u64),
            "periodic evaluation length must be a power of two"
        );
        let index_mask = values.len() as u64 - 1;
        Self { values, index_mask }
    }

    pub fn at(&self, index: u64) -> F {
        self.values[(index & self.index_mask) as usize]
    }

    pub fn iter_from(&self, start: u64) -> CosetEvaluationIter<'_, F> {
        CosetEvaluationIter { parent: self, index: start & self.index_mask }
    }
}

pub struct CosetEvaluationIter<'a, F: FftField> {
    parent: &'a CosetEvaluation<F>,
    index: u64,
}

impl<'a, F: FftField> Iterator for CosetEvaluationIter<'a, F> {
    type Item = F;

    fn next(&mut self) -> Option<F> {
        let value = self.parent.values[self.index as usize];
        self.index = (self.index + 1) & self.parent.index_mask;
        Some(value)
    }
}
