//! A chain of FFT layer domains `D_0 ⊇ D_1 ⊇ ... ⊇ D_N`, where layer `i`
//! maps `D_i` onto `D_{i+1}` by squaring. `|D_i| = 2^(N-i)` and the final
//! domain is the empty-basis singleton.

use quarry_field::{ops, FftField, Field};
use quarry_util::{Error, Result};

use crate::domain::FftDomain;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MultiplicativeGroupOrdering {
    /// Elements enumerated as `offset * g^i`. The basis is
    /// `[g, g^2, g^4, ...]`; each layer drops the front element. The last
    /// basis element of every layer is `-1`.
    Natural,
    /// The reversed basis, so enumeration is `offset * g^bitrev(i)`; each
    /// layer drops the back element.
    BitReversed,
}

#[derive(Clone, Debug)]
pub struct MultiplicativeFftBases<F: FftField> {
    layers: Vec<FftDomain<F>>,
    order: MultiplicativeGroupOrdering,
}

impl<F: FftField> MultiplicativeFftBases<F> {
    /// Builds bases for the size-`2^log_n` subgroup coset at `offset`.
    pub fn new(log_n: usize, offset: F, order: MultiplicativeGroupOrdering) -> Result<Self> {
        let generator = F::subgroup_generator(log_n as u32)?;
        Self::from_generator(generator, log_n, offset, order)
    }

    /// Builds bases from an explicit `2^log_n`-order generator.
    pub fn from_generator(
        generator: F,
        log_n: usize,
        offset: F,
        order: MultiplicativeGroupOrdering,
    ) -> Result<Self> {
        let mut basis = ops::squares(generator, log_n);
        if log_n > 0 && *basis.last().unwrap() != -F::one() {
            return Err(Error::InvalidParameter(
                "generator order is not 2^log_n".to_string(),
            ));
        }
        if order == MultiplicativeGroupOrdering::BitReversed {
            basis.reverse();
        }
        Ok(Self::from_first_layer(basis, offset, order))
    }

    /// Derives the full layer chain from the first layer's basis.
    fn from_first_layer(basis: Vec<F>, offset: F, order: MultiplicativeGroupOrdering) -> Self {
        let mut layers = Vec::with_capacity(basis.len() + 1);
        let mut current = FftDomain::new(basis, offset);
        for _ in 0..current.basis_size() {
            let next_offset = current.offset().square();
            let next = match order {
                MultiplicativeGroupOrdering::Natural => {
                    current.remove_first_basis_elements(1).shifted(next_offset)
                }
                MultiplicativeGroupOrdering::BitReversed => {
                    current.remove_last_basis_elements(1).shifted(next_offset)
                }
            };
            layers.push(current);
            current = next;
        }
        layers.push(current);
        Self { layers, order }
    }

    pub fn order(&self) -> MultiplicativeGroupOrdering {
        self.order
    }

    pub fn is_natural_order(&self) -> bool {
        self.order == MultiplicativeGroupOrdering::Natural
    }

    /// The number of layers, not counting the trailing empty domain.
    pub fn num_layers(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn at(&self, idx: usize) -> &FftDomain<F> {
        &self.layers[idx]
    }

    pub fn first_layer(&self) -> &FftDomain<F> {
        &self.layers[0]
    }

    pub fn size(&self) -> u64 {
        self.layers[0].size()
    }

    pub fn log_size(&self) -> usize {
        self.layers[0].basis_size()
    }

    /// A copy with `idx` layers removed from the beginning.
    pub fn from_layer(&self, idx: usize) -> Self {
        assert!(idx < self.layers.len(), "index out of range");
        Self { layers: self.layers[idx..].to_vec(), order: self.order }
    }

    /// The same layer chain rebuilt over a new offset; layer `i` gets
    /// `offset^(2^i)`. Independent of the current offset.
    pub fn shifted(&self, offset: F) -> Self {
        Self::from_first_layer(self.layers[0].basis().to_vec(), offset, self.order)
    }

    /// The squaring map from layer `layer_index` to the next.
    pub fn apply_basis_transform(&self, point: F, layer_index: usize) -> F {
        assert!(layer_index < self.num_layers(), "layer index out of range");
        point.square()
    }

    /// Expresses `D_0` as `2^log_cosets` translates of a smaller subgroup:
    /// returns offset-free bases for the subgroup together with the coset
    /// offsets. In bit-reversed order coset `s` occupies the `s`-th
    /// contiguous block of `D_0`'s enumeration; in natural order the cosets
    /// interleave with stride `2^log_cosets`.
    pub fn split_to_cosets(&self, log_cosets: usize) -> Result<(Self, Vec<F>)> {
        if log_cosets > self.num_layers() {
            return Err(Error::InvalidParameter(
                "cannot split into more cosets than the domain size".to_string(),
            ));
        }
        let (subgroup, offsets) = match self.order {
            // The enumeration-major bits select the back (bit-reversed) or
            // front (natural) basis elements; those become the offsets.
            MultiplicativeGroupOrdering::BitReversed => self.layers[0].split(log_cosets),
            MultiplicativeGroupOrdering::Natural => {
                let basis = self.layers[0].basis();
                (
                    FftDomain::without_offset(basis[log_cosets..].to_vec()),
                    FftDomain::new(basis[..log_cosets].to_vec(), self.layers[0].offset()),
                )
            }
        };
        Ok((
            Self::from_first_layer(subgroup.basis().to_vec(), F::one(), self.order),
            offsets.elements(),
        ))
    }
}
