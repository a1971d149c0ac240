// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Persistent ordered sequence.
//!
//! Elements are kept sorted by an extracted key in a left-leaning red-black
//! tree whose nodes carry subtree sizes, so positional queries (`nth`,
//! `rank`, `index_of`) run in O(log n) alongside the usual ordered
//! insertion and removal. Equal keys are allowed; new duplicates are
//! inserted after existing ones.
//!
//! Updates return new values sharing all untouched nodes with the input;
//! [`TransientSortedVector`] is the mutate-in-place builder.

mod error;
mod iter;
mod node;
mod ser;
mod sorted;
mod transient;

pub use error::Error;
pub use iter::Iter;
pub use sorted::{ByKey, Natural, SortKey, SortedVector};
pub use transient::TransientSortedVector;

/// Build a [`SortedVector`] under the natural order of its elements:
///
/// ```
/// use pcoll_sorted::psortedvec;
///
/// let v = psortedvec![3, 1, 2];
/// assert_eq!(v.nth(0), Some(&1));
/// assert_eq!(v.nth(2), Some(&3));
/// ```
#[macro_export]
macro_rules! psortedvec {
    () => { $crate::SortedVector::new() };
    ($($x:expr),+ $(,)?) => {
        <$crate::SortedVector<_> as ::core::iter::FromIterator<_>>::from_iter([$($x),+])
    };
}
