// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::{transport, DroppedSnafu, Result};
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use facet::{FacetTxEnvelope, FACET_INBOX_ADDRESS};
use snafu::OptionExt;
use std::sync::Arc;

/// Posts envelopes to the Facet inbox on L1.
///
/// `M` must be able to sign, e.g. a [`SignerMiddleware`]. Submission is not retried: a failure to
/// send or confirm is returned to the caller as is.
#[derive(Clone, Debug)]
pub struct Submitter<M> {
    l1: Arc<M>,
    inbox: Address,
}

impl<M> Submitter<M>
where
    M: Middleware + 'static,
    M::Error: 'static,
{
    pub fn new(l1: Arc<M>) -> Self {
        Self::with_inbox(l1, FACET_INBOX_ADDRESS)
    }

    pub fn with_inbox(l1: Arc<M>, inbox: Address) -> Self {
        Self { l1, inbox }
    }

    pub fn inbox(&self) -> Address {
        self.inbox
    }

    /// The L1 transaction carrying `envelope`.
    pub fn transaction(&self, envelope: &FacetTxEnvelope) -> TypedTransaction {
        Eip1559TransactionRequest::new()
            .to(self.inbox)
            .value(0)
            .data(envelope.bytes().clone())
            .into()
    }

    /// Send `envelope` to the inbox and wait for one confirmation.
    pub async fn submit(&self, envelope: &FacetTxEnvelope) -> Result<TransactionReceipt> {
        tracing::info!(
            "submitting facet envelope from {:?}",
            self.l1.default_sender()
        );
        let pending = self
            .l1
            .send_transaction(self.transaction(envelope), None)
            .await
            .map_err(transport)?;
        let hash = pending.tx_hash();
        tracing::info!("L1 transaction sent: {hash:?}");

        let receipt = pending
            .confirmations(1)
            .await
            .map_err(transport)?
            .context(DroppedSnafu { hash })?;
        tracing::info!(
            "L1 transaction {hash:?} included in block {:?}",
            receipt.block_number
        );
        Ok(receipt)
    }
}
