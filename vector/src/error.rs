// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Vector error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Index outside the addressable range.
    #[error("index {0} out of range")]
    OutOfRange(usize),
    /// Pop on an empty vector.
    #[error("pop on an empty vector")]
    Empty,
    /// A numeric input cannot be represented losslessly by the element type.
    #[error("cannot losslessly convert {value} to {target}")]
    TypeMismatch {
        value: String,
        target: &'static str,
    },
    /// Mutation attempted on a transient after `persistent()`.
    #[error("transient used after persistent()")]
    UseAfterFreeze,
}
