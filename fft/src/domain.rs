//! A succinct FFT domain: every element is `offset * prod(subset of basis)`,
//! where the subset is selected by the bits of the element's index. A basis
//! of `b` elements spans a domain of `2^b` points.

use quarry_field::{FftField, Field};
use quarry_util::math::pow2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FftDomain<F: FftField> {
    basis: Vec<F>,
    offset: F,
}

impl<F: FftField> FftDomain<F> {
    pub fn new(basis: Vec<F>, offset: F) -> Self {
        Self { basis, offset }
    }

    pub fn without_offset(basis: Vec<F>) -> Self {
        Self { basis, offset: F::one() }
    }

    pub fn basis(&self) -> &[F] {
        &self.basis
    }

    pub fn offset(&self) -> F {
        self.offset
    }

    pub fn basis_size(&self) -> usize {
        self.basis.len()
    }

    pub fn size(&self) -> u64 {
        pow2(self.basis.len() as u32)
    }

    /// The element at `index`: bit `i` of the index selects `basis[i]`.
    pub fn at(&self, index: u64) -> F {
        assert!(index < self.size(), "index out of range");
        let mut result = self.offset;
        let mut index = index;
        for &b in &self.basis {
            if index & 1 == 1 {
                result *= b;
            }
            index >>= 1;
        }
        result
    }

    /// All elements in index order. One multiplication per element.
    pub fn elements(&self) -> Vec<F> {
        let mut out = Vec::with_capacity(self.size() as usize);
        out.push(self.offset);
        for &b in &self.basis {
            for i in 0..out.len() {
                out.push(out[i] * b);
            }
        }
        out
    }

    /// The domain of elementwise inverses, in the same order.
    pub fn inverse(&self) -> Self {
        Self {
            basis: self.basis.iter().map(|b| b.inverse()).collect(),
            offset: self.offset.inverse(),
        }
    }

    /// Same basis, different offset.
    pub fn shifted(&self, offset: F) -> Self {
        Self { basis: self.basis.clone(), offset }
    }

    /// Drops the first `n` basis elements; iterating the result yields every
    /// `2^n`-th element of the original.
    pub fn remove_first_basis_elements(&self, n: usize) -> Self {
        assert!(n <= self.basis.len(), "index out of range");
        Self { basis: self.basis[n..].to_vec(), offset: self.offset }
    }

    /// Drops the last `n` basis elements, keeping the leading `size / 2^n`
    /// elements of the original enumeration.
    pub fn remove_last_basis_elements(&self, n: usize) -> Self {
        assert!(n <= self.basis.len(), "index out of range");
        Self { basis: self.basis[..self.basis.len() - n].to_vec(), offset: self.offset }
    }

    /// Splits into an offset-free subgroup part (the first `size - n` basis
    /// elements) and the offsets part spanned by the last `n` together with
    /// this domain's offset.
    pub fn split(&self, n: usize) -> (Self, Self) {
        assert!(n <= self.basis.len(), "index out of range");
        let cut = self.basis.len() - n;
        (
            Self::without_offset(self.basis[..cut].to_vec()),
            Self { basis: self.basis[cut..].to_vec(), offset: self.offset },
        )
    }

    pub fn iter(&self) -> DomainIterator<'_, F> {
        DomainIterator::new(&self.basis, self.offset)
    }
}

/// Lazy subset-product enumeration: one group operation per step, with an
/// explicit stack in place of recursion.
pub struct DomainIterator<'a, F: FftField> {
    basis: &'a [F],
    stack: Vec<(usize, F)>,
    current: Option<F>,
}

impl<'a, F: FftField> DomainIterator<'a, F> {
    fn new(basis: &'a [F], offset: F) -> Self {
        let mut it = Self { basis, stack: Vec::with_capacity(basis.len()), current: Some(offset) };
        it.refill(basis.len(), offset);
        it
    }

    fn refill(&mut self, mut depth: usize, value: F) {
        while depth > 0 {
            depth -= 1;
            self.stack.push((depth, value));
        }
    }
}

impl<'a, F: FftField> Iterator for DomainIterator<'a, F> {
    type Item = F;

    fn next(&mut self) -> Option<F> {
        let current = self.current?;
        self.current = match self.stack.pop() {
            Some((depth, value)) => {
                let next = value * self.basis[depth];
                self.refill(depth, next);
                Some(next)
            }
            None => None,
        };
        Some(current)
    }
}
