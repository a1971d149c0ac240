// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Primitive vector specializations.
//!
//! [`FloatVector`] and [`IntVector`] reuse the generic trie and tail
//! algebra with unboxed `f64`/`i64` leaves. They add a lossless numeric
//! conversion boundary and a contiguous read-only export buffer that is
//! materialized once and retained for the vector's lifetime.

use std::hash::{Hash, Hasher};

use once_cell::sync::OnceCell;
use pcoll_shared::{canonical_f64_bits, combine_ordered, hash_one};

use crate::transient::TransientVector;
use crate::vector::Vector;
use crate::Error;

mod private {
    pub trait Sealed {}
    impl Sealed for f64 {}
    impl Sealed for i64 {}
}

/// Element type of a primitive vector.
pub trait PrimElem: Copy + PartialEq + std::fmt::Debug + private::Sealed + 'static {
    /// Name used in conversion errors.
    const NAME: &'static str;

    /// Lossless conversion from `i64`.
    fn try_from_i64(value: i64) -> Result<Self, Error>;

    /// Lossless conversion from `f64`.
    fn try_from_f64(value: f64) -> Result<Self, Error>;

    /// Canonical element hash; equal values must hash equal.
    fn elem_hash(self) -> u64;
}

impl PrimElem for i64 {
    const NAME: &'static str = "i64";

    fn try_from_i64(value: i64) -> Result<Self, Error> {
        Ok(value)
    }

    fn try_from_f64(value: f64) -> Result<Self, Error> {
        // Fractional, infinite, NaN and out-of-range inputs all fail the
        // round-trip below; comparison is done in i128 because casts out of
        // f64 saturate.
        if value.is_finite()
            && value.fract() == 0.0
            && (value as i128) >= i64::MIN as i128
            && (value as i128) <= i64::MAX as i128
        {
            Ok(value as i64)
        } else {
            Err(Error::TypeMismatch {
                value: value.to_string(),
                target: Self::NAME,
            })
        }
    }

    fn elem_hash(self) -> u64 {
        hash_one(&self)
    }
}

impl PrimElem for f64 {
    const NAME: &'static str = "f64";

    fn try_from_i64(value: i64) -> Result<Self, Error> {
        let converted = value as f64;
        if converted as i128 == value as i128 {
            Ok(converted)
        } else {
            Err(Error::TypeMismatch {
                value: value.to_string(),
                target: Self::NAME,
            })
        }
    }

    fn try_from_f64(value: f64) -> Result<Self, Error> {
        Ok(value)
    }

    fn elem_hash(self) -> u64 {
        hash_one(&canonical_f64_bits(self))
    }
}

/// Persistent vector of unboxed primitives.
#[derive(Debug)]
pub struct PrimVector<P: PrimElem> {
    inner: Vector<P>,
    /// Contiguous copy of the elements, filled on first request and kept
    /// for the vector's lifetime.
    buffer: OnceCell<Box<[P]>>,
    hash: OnceCell<u64>,
}

/// Persistent vector of `f64` elements.
pub type FloatVector = PrimVector<f64>;
/// Persistent vector of `i64` elements.
pub type IntVector = PrimVector<i64>;

impl<P: PrimElem> PrimVector<P> {
    /// The canonical empty vector.
    pub fn new() -> Self {
        PrimVector {
            inner: Vector::new(),
            buffer: OnceCell::new(),
            hash: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<P> {
        self.inner.get(i).copied()
    }

    pub fn first(&self) -> Option<P> {
        self.inner.first().copied()
    }

    pub fn last(&self) -> Option<P> {
        self.inner.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = P> + '_ {
        self.inner.iter().copied()
    }

    /// Append one element of the exact storage type.
    pub fn push(&self, value: P) -> Self {
        Self::wrap(self.inner.push(value))
    }

    /// Append an `i64`, converting losslessly.
    pub fn push_i64(&self, value: i64) -> Result<Self, Error> {
        Ok(self.push(P::try_from_i64(value)?))
    }

    /// Append an `f64`, converting losslessly.
    pub fn push_f64(&self, value: f64) -> Result<Self, Error> {
        Ok(self.push(P::try_from_f64(value)?))
    }

    /// Replace the element at `i`; `i == len()` appends.
    pub fn set(&self, i: usize, value: P) -> Result<Self, Error> {
        Ok(Self::wrap(self.inner.set(i, value)?))
    }

    /// Remove the last element.
    pub fn pop(&self) -> Result<Self, Error> {
        Ok(Self::wrap(self.inner.pop()?))
    }

    /// Contiguous read-only view of all elements.
    ///
    /// The backing buffer is allocated and filled on the first call, then
    /// reused for every later call on this vector.
    pub fn as_slice(&self) -> &[P] {
        self.buffer
            .get_or_init(|| self.inner.iter().copied().collect())
    }

    /// Mutable builder sharing this vector's nodes.
    pub fn to_transient(&self) -> TransientPrimVector<P> {
        TransientPrimVector {
            inner: self.inner.to_transient(),
        }
    }

    fn wrap(inner: Vector<P>) -> Self {
        PrimVector {
            inner,
            buffer: OnceCell::new(),
            hash: OnceCell::new(),
        }
    }
}

impl<P: PrimElem> Default for PrimVector<P> {
    fn default() -> Self {
        PrimVector::new()
    }
}

impl<P: PrimElem> Clone for PrimVector<P> {
    fn clone(&self) -> Self {
        // The export buffer is not carried over; clones refill on demand.
        PrimVector {
            inner: self.inner.clone(),
            buffer: OnceCell::new(),
            hash: self.hash.clone(),
        }
    }
}

impl<P: PrimElem> FromIterator<P> for PrimVector<P> {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::wrap(Vector::from_iter(iter))
    }
}

impl<P: PrimElem> PartialEq for PrimVector<P> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<P: PrimElem> Hash for PrimVector<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let h = *self.hash.get_or_init(|| {
            self.iter()
                .fold(0u64, |acc, e| combine_ordered(acc, e.elem_hash()))
        });
        state.write_u64(h);
    }
}

/// Mutable builder for [`PrimVector`].
#[derive(Debug)]
pub struct TransientPrimVector<P: PrimElem> {
    inner: TransientVector<P>,
}

impl<P: PrimElem> TransientPrimVector<P> {
    pub fn new() -> Self {
        TransientPrimVector {
            inner: TransientVector::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<P> {
        self.inner.get(i).copied()
    }

    pub fn push(&mut self, value: P) -> Result<(), Error> {
        self.inner.push(value)
    }

    pub fn push_i64(&mut self, value: i64) -> Result<(), Error> {
        self.inner.push(P::try_from_i64(value)?)
    }

    pub fn push_f64(&mut self, value: f64) -> Result<(), Error> {
        self.inner.push(P::try_from_f64(value)?)
    }

    pub fn set(&mut self, i: usize, value: P) -> Result<(), Error> {
        self.inner.set(i, value)
    }

    pub fn pop(&mut self) -> Result<(), Error> {
        self.inner.pop()
    }

    /// Freeze into a persistent vector; the transient is dead afterwards.
    pub fn persistent(&mut self) -> Result<PrimVector<P>, Error> {
        Ok(PrimVector {
            inner: self.inner.persistent()?,
            buffer: OnceCell::new(),
            hash: OnceCell::new(),
        })
    }
}

impl<P: PrimElem> Default for TransientPrimVector<P> {
    fn default() -> Self {
        TransientPrimVector::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_from_f64_requires_integral_values() {
        assert_eq!(i64::try_from_i64(7).unwrap(), 7);
        assert_eq!(i64::try_from_f64(7.0).unwrap(), 7);
        assert_eq!(i64::try_from_f64(-0.0).unwrap(), 0);
        assert!(matches!(
            i64::try_from_f64(7.5),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            i64::try_from_f64(f64::NAN),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            i64::try_from_f64(1e300),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn float_from_i64_requires_exact_representation() {
        assert_eq!(f64::try_from_i64(1 << 53).unwrap(), 9007199254740992.0);
        assert!(matches!(
            f64::try_from_i64((1 << 53) + 1),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            f64::try_from_i64(i64::MAX),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn zero_hashes_ignore_sign() {
        assert_eq!(0.0f64.elem_hash(), (-0.0f64).elem_hash());
        assert_ne!(0.0f64.elem_hash(), 1.0f64.elem_hash());
    }

    #[test]
    fn export_buffer_matches_contents() {
        let v: FloatVector = (0..100).map(|i| i as f64).collect();
        let slice = v.as_slice();
        assert_eq!(slice.len(), 100);
        assert_eq!(slice[99], 99.0);
        // Second call returns the same allocation.
        assert!(std::ptr::eq(slice.as_ptr(), v.as_slice().as_ptr()));
    }

    #[test]
    fn equal_prim_vectors_hash_equal() {
        let a: FloatVector = [0.0, 1.5].into_iter().collect();
        let b = FloatVector::new().push(-0.0).push(1.5);
        assert_eq!(a, b);
        assert_eq!(pcoll_shared::hash_one(&a), pcoll_shared::hash_one(&b));
    }
}
