//! Memoizes LDE evaluations on a fixed list of coset offsets. Call order is
//! a hard contract: all additions, then `finalize_adding`, then coset/point
//! evaluations, with `finalize_evaluations` gating the non-cached point
//! path. Violations are logic errors and panic.

use std::sync::Arc;

use quarry_field::{FftField, Field};

use crate::lde::LdeManager;

pub struct CachedLdeManager<F: FftField> {
    inner: LdeManager<F>,
    coset_offsets: Vec<F>,
    store_full_lde: bool,
    use_fft_for_eval: bool,
    cache: Vec<Option<Arc<Vec<Vec<F>>>>>,
    finalized_adding: bool,
    finalized_evaluations: bool,
}

impl<F: FftField> CachedLdeManager<F> {
    pub fn new(
        inner: LdeManager<F>,
        coset_offsets: Vec<F>,
        store_full_lde: bool,
        use_fft_for_eval: bool,
    ) -> Self {
        let n_cosets = coset_offsets.len();
        Self {
            inner,
            coset_offsets,
            store_full_lde,
            use_fft_for_eval,
            cache: vec![None; n_cosets],
            finalized_adding: false,
            finalized_evaluations: false,
        }
    }

    pub fn num_cosets(&self) -> usize {
        self.coset_offsets.len()
    }

    pub fn coset_offsets(&self) -> &[F] {
        &self.coset_offsets
    }

    pub fn num_columns(&self) -> usize {
        self.inner.len()
    }

    pub fn coset_size(&self) -> usize {
        self.inner.lde_size()
    }

    pub fn inner(&self) -> &LdeManager<F> {
        &self.inner
    }

    pub fn add_evaluation(&mut self, evaluation: &[F]) {
        assert!(!self.finalized_adding, "AddEvaluation after FinalizeAdding");
        self.inner.add_evaluation(evaluation);
    }

    pub fn add_from_coefficients(&mut self, coefficients: &[F]) {
        assert!(!self.finalized_adding, "AddFromCoefficients after FinalizeAdding");
        self.inner.add_from_coefficients(coefficients);
    }

    pub fn finalize_adding(&mut self) {
        assert!(!self.finalized_adding, "FinalizeAdding called twice");
        self.finalized_adding = true;
    }

    fn compute_coset(&self, coset_index: usize) -> Vec<Vec<F>> {
        let mut outputs =
            vec![vec![F::zero(); self.inner.lde_size()]; self.inner.len()];
        self.inner
            .eval_on_coset(self.coset_offsets[coset_index], &mut outputs);
        outputs
    }

    /// All columns evaluated on coset `coset_index`; cached when
    /// `store_full_lde` is set, recomputed otherwise.
    pub fn eval_on_coset(&mut self, coset_index: usize) -> Arc<Vec<Vec<F>>> {
        assert!(self.finalized_adding, "EvalOnCoset before FinalizeAdding");
        if self.store_full_lde {
            if self.cache[coset_index].is_none() {
                self.cache[coset_index] = Some(Arc::new(self.compute_coset(coset_index)));
            }
            return self.cache[coset_index].as_ref().unwrap().clone();
        }
        Arc::new(self.compute_coset(coset_index))
    }

    /// Evaluates column `evaluation_idx` at points addressed as
    /// `(coset_index, index_within_coset)`.
    pub fn eval_at_points(
        &mut self,
        evaluation_idx: usize,
        points: &[(usize, usize)],
        outputs: &mut [F],
    ) {
        assert!(self.finalized_adding, "EvalAtPoints before FinalizeAdding");
        assert_eq!(points.len(), outputs.len());
        if self.store_full_lde || self.use_fft_for_eval {
            // Full-coset path; with store_full_lde the cosets stay cached.
            for (out, &(coset_index, row)) in outputs.iter_mut().zip(points.iter()) {
                let coset = self.eval_on_coset(coset_index);
                *out = coset[evaluation_idx][row];
            }
            return;
        }
        // Direct Horner per point.
        let point_values: Vec<F> = points
            .iter()
            .map(|&(coset_index, row)| {
                self.inner
                    .get_domain(self.coset_offsets[coset_index])
                    .at(row as u64)
            })
            .collect();
        self.inner.eval_at_points(evaluation_idx, &point_values, outputs);
    }

    /// Must be called before any `eval_at_points_not_cached`. With a full
    /// LDE store this also materializes every coset.
    pub fn finalize_evaluations(&mut self) {
        assert!(self.finalized_adding, "FinalizeEvaluations before FinalizeAdding");
        if self.store_full_lde {
            for coset_index in 0..self.num_cosets() {
                if self.cache[coset_index].is_none() {
                    self.cache[coset_index] =
                        Some(Arc::new(self.compute_coset(coset_index)));
                }
            }
        }
        self.finalized_evaluations = true;
    }

    /// Point evaluation off the cached cosets (e.g. the out-of-domain
    /// sample).
    pub fn eval_at_points_not_cached(
        &self,
        evaluation_idx: usize,
        points: &[F],
        outputs: &mut [F],
    ) {
        assert!(
            self.finalized_evaluations,
            "EvalAtPointsNotCached before FinalizeEvaluations"
        );
        self.inner.eval_at_points(evaluation_idx, points, outputs);
    }
}
