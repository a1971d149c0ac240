// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// HAMT error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Checked lookup on a key the map does not contain.
    #[error("key not found")]
    KeyMissing,
    /// A flattened key-value argument list had an odd number of items.
    #[error("expected an even number of items, got {0}")]
    OddArity(usize),
    /// Mutation attempted on a transient after `persistent()`.
    #[error("transient used after persistent()")]
    UseAfterFreeze,
}
