// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Contracts the Facet tools talk to: user contracts compiled with hardhat, and the OP-stack
//! bridge contracts used to move funds from Facet back to L1.

use ethers::types::{H256, U256};
use snafu::Snafu;
use std::path::PathBuf;

pub mod artifact;
pub mod bindings;
pub mod withdrawal;

pub use artifact::HardhatArtifact;
pub use withdrawal::{Withdrawal, WithdrawalProver};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadArtifact {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("{} is not a hardhat artifact: {source}", path.display()))]
    ParseArtifact {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("ABI error: {source}"))]
    Abi { source: ethers::abi::Error },

    #[snafu(display("transport error: {source}"))]
    Transport {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("no receipt for L2 transaction {hash:?}"))]
    MissingReceipt { hash: H256 },

    #[snafu(display("L2 transaction {hash:?} did not initiate a withdrawal"))]
    NoWithdrawal { hash: H256 },

    #[snafu(display("withdrawal hash mismatch: event says {expected:?}, computed {actual:?}"))]
    WithdrawalHashMismatch { expected: H256, actual: H256 },

    #[snafu(display("output root mismatch: oracle has {expected:?}, proof gives {actual:?}"))]
    OutputRootMismatch { expected: H256, actual: H256 },

    #[snafu(display("L2 output {index} claims L2 block {number}, which is out of range"))]
    OutputBlockOutOfRange { index: U256, number: u128 },

    #[snafu(display("L2 block {number} is not available"))]
    MissingBlock { number: u64 },

    #[snafu(display("no storage proof returned for slot {slot:?}"))]
    MissingProof { slot: H256 },

    #[snafu(display("L1 transaction {hash:?} was dropped from the mempool"))]
    Dropped { hash: H256 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::Transport {
        source: Box::new(err),
    }
}
