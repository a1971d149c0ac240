// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

/// Identity handle owned by a live transient.
///
/// Every transient allocates one fresh token and stamps it on the nodes it
/// creates or first writes to. A node may be mutated in place only while the
/// token stored in it is the same allocation as the token the transient
/// holds; freezing the transient drops its token, after which no node can
/// match it again.
#[derive(Clone, Debug, Default)]
pub struct EditToken(Arc<()>);

impl EditToken {
    pub fn new() -> Self {
        EditToken(Arc::new(()))
    }

    /// Reference identity, not structural equality.
    #[inline]
    pub fn same(&self, other: &EditToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// True when a node's stored token is the live token `edit`.
#[inline]
pub fn token_matches(node_edit: Option<&EditToken>, edit: Option<&EditToken>) -> bool {
    matches!((node_edit, edit), (Some(a), Some(b)) if a.same(b))
}
