//! Coset FFT machinery: subset-product domains, layered bases in natural
//! and bit-reversed orderings, radix-2 transforms with shiftable twiddle
//! tables, and a four-step variant for large sizes.

mod bases;
mod domain;
mod fft;
mod four_step;

pub use bases::{MultiplicativeFftBases, MultiplicativeGroupOrdering};
pub use domain::{DomainIterator, FftDomain};
pub use fft::{fft, ifft, ifft_layers, normalize, FftPrecompute};
pub use four_step::{fft_four_step, FOUR_STEP_MIN_LOG_SIZE};
