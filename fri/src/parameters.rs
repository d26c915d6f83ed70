//! FRI protocol parameters and their validation.

use quarry_fft::{MultiplicativeFftBases, MultiplicativeGroupOrdering};
use quarry_field::FftField;
use quarry_util::math::is_power_of_two;
use quarry_util::{Error, Result};

pub struct FriParameters<F: FftField> {
    /// Halving folds per round; each entry in `1..=4`.
    pub fri_step_list: Vec<usize>,
    /// Strict degree bound on the final layer's polynomial. A power of two.
    pub last_layer_degree_bound: usize,
    pub n_queries: usize,
    pub proof_of_work_bits: usize,
    /// The first-layer domain and its squaring chain, bit-reversed order.
    pub fft_bases: MultiplicativeFftBases<F>,
}

impl<F: FftField> FriParameters<F> {
    pub fn new(
        fri_step_list: Vec<usize>,
        last_layer_degree_bound: usize,
        n_queries: usize,
        proof_of_work_bits: usize,
        fft_bases: MultiplicativeFftBases<F>,
    ) -> Result<Self> {
        let params = Self {
            fri_step_list,
            last_layer_degree_bound,
            n_queries,
            proof_of_work_bits,
            fft_bases,
        };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        if self.fft_bases.order() != MultiplicativeGroupOrdering::BitReversed {
            return Err(Error::InvalidParameter(
                "FRI runs over bit-reversed bases".to_string(),
            ));
        }
        if self.fri_step_list.is_empty() {
            return Err(Error::InvalidParameter("empty fri_step_list".to_string()));
        }
        if self.fri_step_list.iter().any(|&step| !(1..=4).contains(&step)) {
            return Err(Error::InvalidParameter(
                "every fri_step must be between 1 and 4".to_string(),
            ));
        }
        if !is_power_of_two(self.last_layer_degree_bound as u64) {
            return Err(Error::InvalidParameter(
                "last_layer_degree_bound must be a power of two".to_string(),
            ));
        }
        let total = self.total_fri_steps();
        if total > self.fft_bases.num_layers() {
            return Err(Error::InvalidParameter(
                "fri_step_list folds deeper than the domain".to_string(),
            ));
        }
        if (self.first_layer_size() >> total) < self.last_layer_degree_bound as u64 {
            return Err(Error::InvalidParameter(
                "last layer domain is smaller than its degree bound".to_string(),
            ));
        }
        if self.n_queries == 0 {
            return Err(Error::InvalidParameter("n_queries must be positive".to_string()));
        }
        Ok(())
    }

    pub fn n_rounds(&self) -> usize {
        self.fri_step_list.len()
    }

    pub fn total_fri_steps(&self) -> usize {
        self.fri_step_list.iter().sum()
    }

    pub fn first_layer_size(&self) -> u64 {
        self.fft_bases.size()
    }

    /// Basis layers consumed before round `round` starts.
    pub fn cumulative_fri_step(&self, round: usize) -> usize {
        self.fri_step_list[..round].iter().sum()
    }

    /// Index shift from a second-layer query to its position in the domain
    /// entering round `round`.
    pub fn query_index_shift(&self, round: usize) -> usize {
        self.fri_step_list[1..round].iter().sum()
    }

    /// Size of the domain entering round `round`.
    pub fn layer_domain_size(&self, round: usize) -> u64 {
        self.first_layer_size() >> self.cumulative_fri_step(round)
    }
}
