// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::{
    backoff::{AsyncStdSleeper, Backoff, Sleeper},
    indexer::{IndexerClient, Lookup},
    Error, NotFoundSnafu, Result,
};
use ethers::types::H256;
use facet::FacetTransaction;
use snafu::OptionExt;

/// Waits for the indexer to pick up an L1 inbox transaction.
///
/// The indexer lags behind L1, so a lookup right after the L1 receipt arrives usually misses.
/// Misses are retried on a [`Backoff`] schedule; any other indexer failure ends the poll at once.
#[derive(Clone, Debug)]
pub struct Poller<I, S = AsyncStdSleeper> {
    indexer: I,
    backoff: Backoff,
    sleeper: S,
}

impl<I: IndexerClient> Poller<I> {
    pub fn new(indexer: I, backoff: Backoff) -> Self {
        Self::with_sleeper(indexer, backoff, AsyncStdSleeper)
    }
}

impl<I: IndexerClient, S: Sleeper> Poller<I, S> {
    pub fn with_sleeper(indexer: I, backoff: Backoff, sleeper: S) -> Self {
        Self {
            indexer,
            backoff,
            sleeper,
        }
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub async fn poll(&self, l1_tx_hash: H256) -> Result<FacetTransaction> {
        let found = self
            .backoff
            .retry(
                |attempt| async move {
                    tracing::debug!("looking up {l1_tx_hash:?}, attempt {attempt}");
                    let found = match self.indexer.lookup(l1_tx_hash).await? {
                        Lookup::Found(tx) => Some(*tx),
                        Lookup::NotFound => None,
                    };
                    Ok::<_, Error>(found)
                },
                &self.sleeper,
            )
            .await?;
        let tx = found.context(NotFoundSnafu {
            attempts: self.backoff.attempts(),
        })?;
        tracing::info!(
            "facet transaction {:?} derived from {l1_tx_hash:?}",
            tx.tx_hash
        );
        Ok(tx)
    }
}
