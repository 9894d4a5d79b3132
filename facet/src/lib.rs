// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Types shared by the Facet tools.
//!
//! Facet transactions are not sent to an L2 node directly. Instead they are wrapped in a typed
//! envelope and posted as the calldata of an ordinary L1 transaction to the Facet inbox address.
//! The Facet node derives the L2 transaction from that L1 transaction and an indexer makes the
//! result available over HTTP. This crate holds the pure parts of that flow: the table of
//! supported L1 networks, the envelope codec and the records returned by the indexer.

use ethers::utils::rlp::DecoderError;
use snafu::Snafu;

pub mod chain;
pub mod envelope;
pub mod transaction;

pub use chain::L1Network;
pub use envelope::{
    encode_envelope, parse_recipient, DecodedEnvelope, FacetTxEnvelope, FacetTxRequest,
    FacetTxRequestBuilder, MaxFeePerGas, FACET_INBOX_ADDRESS, FACET_TX_TYPE,
};
pub use transaction::{FacetTransaction, FacetTransactionReceipt};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("unsupported chain id {chain_id}"))]
    UnsupportedChain { chain_id: u64 },

    #[snafu(display("a facet transaction requires a gas limit"))]
    MissingGasLimit,

    #[snafu(display("the gas limit of a facet transaction must be positive"))]
    ZeroGasLimit,

    #[snafu(display("invalid recipient {input:?}: expected an address or an empty string"))]
    InvalidRecipient { input: String },

    #[snafu(display("malformed facet envelope: {source}"))]
    Rlp { source: DecoderError },

    #[snafu(display("malformed facet envelope: {reason}"))]
    MalformedEnvelope { reason: String },
}
