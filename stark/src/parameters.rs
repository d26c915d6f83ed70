//! Derived STARK parameters: the evaluation domain, its split into
//! trace-sized cosets, the composition break depth, and the FRI parameters
//! the DEEP polynomial runs under.

use quarry_fft::{MultiplicativeFftBases, MultiplicativeGroupOrdering};
use quarry_field::{FftField, Field};
use quarry_fri::FriParameters;
use quarry_util::math::{is_power_of_two, safe_log2};
use quarry_util::{Error, Result};

use crate::config::FriConfig;

pub struct StarkParameters<F: FftField> {
    pub log_trace_length: usize,
    pub log_n_cosets: usize,
    /// `log2(composition_degree_bound / trace_length)`.
    pub log_breaks: usize,
    /// Generator of the trace-domain subgroup.
    pub trace_generator: F,
    /// The whole evaluation domain, offset by the field generator.
    pub big_bases: MultiplicativeFftBases<F>,
    /// Natural-order bases for the trace-sized subgroup at offset one.
    pub trace_bases: MultiplicativeFftBases<F>,
    /// Offsets of the `2^log_n_cosets` trace-sized evaluation cosets, in
    /// big-domain block order.
    pub evaluation_offsets: Vec<F>,
    /// Offsets of the `2^log_breaks` broken-domain-sized cosets.
    pub break_coset_offsets: Vec<F>,
    pub fri: FriParameters<F>,
}

impl<F: FftField> StarkParameters<F> {
    pub fn new(
        trace_length: usize,
        composition_degree_bound: usize,
        log_n_cosets: usize,
        fri_config: &FriConfig,
    ) -> Result<Self> {
        if !is_power_of_two(trace_length as u64) {
            return Err(Error::InvalidParameter(
                "trace length must be a power of two".to_string(),
            ));
        }
        let log_trace_length = safe_log2(trace_length as u64) as usize;
        if composition_degree_bound % trace_length != 0
            || !is_power_of_two((composition_degree_bound / trace_length) as u64)
        {
            return Err(Error::InvalidParameter(
                "composition degree bound must be a power-of-two multiple of the trace length"
                    .to_string(),
            ));
        }
        let log_breaks = safe_log2((composition_degree_bound / trace_length) as u64) as usize;
        if log_breaks > log_n_cosets {
            return Err(Error::InvalidParameter(
                "blowup is too small for the composition degree bound".to_string(),
            ));
        }

        let big_bases = MultiplicativeFftBases::new(
            log_trace_length + log_n_cosets,
            F::generator(),
            MultiplicativeGroupOrdering::BitReversed,
        )?;
        let (_, evaluation_offsets) = big_bases.split_to_cosets(log_n_cosets)?;
        let (_, break_coset_offsets) = big_bases.split_to_cosets(log_breaks)?;
        let trace_bases = MultiplicativeFftBases::new(
            log_trace_length,
            F::one(),
            MultiplicativeGroupOrdering::Natural,
        )?;
        let trace_generator = F::subgroup_generator(log_trace_length as u32)?;

        // The DEEP polynomial has degree below the trace length; FRI must
        // fold exactly down to the last-layer bound.
        let total_steps: usize = fri_config.fri_step_list.iter().sum();
        if total_steps + safe_log2(fri_config.last_layer_degree_bound as u64) as usize
            != log_trace_length
        {
            return Err(Error::InvalidParameter(
                "fri_step_list and last_layer_degree_bound do not match the trace length"
                    .to_string(),
            ));
        }
        let fri = FriParameters::new(
            fri_config.fri_step_list.clone(),
            fri_config.last_layer_degree_bound,
            fri_config.n_queries,
            fri_config.proof_of_work_bits,
            big_bases.clone(),
        )?;

        Ok(Self {
            log_trace_length,
            log_n_cosets,
            log_breaks,
            trace_generator,
            big_bases,
            trace_bases,
            evaluation_offsets,
            break_coset_offsets,
            fri,
        })
    }

    pub fn trace_length(&self) -> usize {
        1 << self.log_trace_length
    }

    pub fn n_breaks(&self) -> usize {
        1 << self.log_breaks
    }

    pub fn evaluation_domain_size(&self) -> usize {
        1 << (self.log_trace_length + self.log_n_cosets)
    }
}
