// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Sorted vector error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Index outside the addressable range.
    #[error("index {0} out of range")]
    OutOfRange(usize),
    /// Mutation attempted on a transient after `persistent()`.
    #[error("transient used after persistent()")]
    UseAfterFreeze,
}
