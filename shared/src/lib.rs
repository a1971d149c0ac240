// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Primitives shared by the pcoll collection crates.
//!
//! The collections in this workspace are persistent: every update returns a
//! new value that shares unmodified nodes with its input. Two things are
//! common to all of them and live here: the [`EditToken`] that marks nodes a
//! transient may mutate in place, and the hash folding helpers that keep the
//! memoized hashes of equal values equal across crates.

mod edit;
mod hash;

pub use edit::{token_matches, EditToken};
pub use hash::{canonical_f64_bits, combine_ordered, hash_one, DefaultHashBuilder};
