// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Client side of the Facet inbox flow.
//!
//! Sending a Facet transaction takes three steps: encode the transaction into an envelope, submit
//! the envelope to the L1 inbox and wait for one confirmation, then poll the Facet indexer until
//! the derived L2 transaction shows up. [`FacetClient`] drives all three; the pieces are also
//! usable on their own.

use ethers::signers::WalletError;
use ethers::types::H256;
use facet::L1Network;
use snafu::Snafu;

pub mod backoff;
pub mod client;
pub mod indexer;
pub mod json_rpc;
pub mod options;
pub mod poller;
pub mod submit;

pub use backoff::{AsyncStdSleeper, Backoff, Sleeper};
pub use client::{connect_l1, FacetClient, L1Client};
pub use indexer::{HttpIndexer, IndexerClient, Lookup};
pub use json_rpc::FacetRpc;
pub use options::{Config, Options};
pub use poller::Poller;
pub use submit::Submitter;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(context(false), display("{source}"))]
    Facet { source: facet::Error },

    #[snafu(display("no {what} configured for {network} and no public default exists"))]
    MissingUrl {
        what: &'static str,
        network: L1Network,
    },

    #[snafu(display("invalid URL: {source}"))]
    InvalidUrl { source: url::ParseError },

    #[snafu(display("invalid private key: {source}"))]
    Wallet { source: WalletError },

    #[snafu(display("transport error: {source}"))]
    Transport {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("L1 transaction {hash:?} was dropped from the mempool"))]
    Dropped { hash: H256 },

    #[snafu(display("facet transaction not found after {attempts} attempts"))]
    NotFound { attempts: usize },

    #[snafu(display("indexer error: {message}"))]
    Indexer { message: String },

    #[snafu(display("could not decode response: {message}"))]
    Decode { message: String },

    #[snafu(display("JSON-RPC error {code}: {message}"))]
    Rpc { code: i64, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Wrap any error from a lower layer (HTTP client, provider, middleware) as a transport error.
pub(crate) fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::Transport {
        source: Box::new(err),
    }
}
