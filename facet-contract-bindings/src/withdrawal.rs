// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Proving and finalizing withdrawals from Facet to L1.
//!
//! A withdrawal starts on L2 as a call to the `L2ToL1MessagePasser` predeploy, which records the
//! hash of the withdrawal in its storage and emits `MessagePassed`. Once the L2 output oracle on
//! L1 has an output root covering that block, the withdrawal is proven against the output root
//! with a storage proof of the message passer, and after the challenge period it can be finalized.

use crate::{
    bindings::{
        L2OutputOracle, MessagePassedFilter, OptimismPortal, OutputRootProof,
        WithdrawalTransaction, L2_TO_L1_MESSAGE_PASSER,
    },
    transport, AbiSnafu, DroppedSnafu, MissingBlockSnafu, MissingProofSnafu, MissingReceiptSnafu,
    NoWithdrawalSnafu, OutputBlockOutOfRangeSnafu, OutputRootMismatchSnafu, Result,
    WithdrawalHashMismatchSnafu,
};
use ethers::{
    abi::{encode, RawLog, Token},
    contract::{ContractCall, EthEvent},
    providers::Middleware,
    types::{Address, BlockId, Bytes, TransactionReceipt, H256, U256},
    utils::keccak256,
};
use snafu::{ensure, OptionExt, ResultExt};
use std::sync::Arc;

/// A withdrawal initiated on L2.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Withdrawal {
    pub tx: WithdrawalTransaction,
    pub hash: H256,
}

/// Arguments of `OptimismPortal.proveWithdrawalTransaction`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProveArgs {
    pub l2_output_index: U256,
    pub output_root_proof: OutputRootProof,
    pub withdrawal_proof: Vec<Bytes>,
}

/// The withdrawals initiated by the L2 transaction with `receipt`.
pub fn withdrawals(receipt: &TransactionReceipt) -> Result<Vec<Withdrawal>> {
    receipt
        .logs
        .iter()
        .filter(|log| {
            log.address == L2_TO_L1_MESSAGE_PASSER
                && log.topics.first() == Some(&MessagePassedFilter::signature())
        })
        .map(|log| {
            let event = <MessagePassedFilter as EthEvent>::decode_log(&RawLog {
                topics: log.topics.clone(),
                data: log.data.to_vec(),
            })
            .context(AbiSnafu)?;
            let tx = WithdrawalTransaction {
                nonce: event.nonce,
                sender: event.sender,
                target: event.target,
                value: event.value,
                gas_limit: event.gas_limit,
                data: event.data,
            };
            let hash = withdrawal_hash(&tx);
            let expected = H256(event.withdrawal_hash);
            ensure!(
                hash == expected,
                WithdrawalHashMismatchSnafu {
                    expected,
                    actual: hash,
                }
            );
            Ok(Withdrawal { tx, hash })
        })
        .collect()
}

/// `keccak256(abi.encode(nonce, sender, target, value, gasLimit, data))`
pub fn withdrawal_hash(tx: &WithdrawalTransaction) -> H256 {
    keccak256(encode(&[
        Token::Uint(tx.nonce),
        Token::Address(tx.sender),
        Token::Address(tx.target),
        Token::Uint(tx.value),
        Token::Uint(tx.gas_limit),
        Token::Bytes(tx.data.to_vec()),
    ]))
    .into()
}

/// The slot of the message passer's `sentMessages` mapping which records `withdrawal_hash`.
pub fn storage_slot(withdrawal_hash: H256) -> H256 {
    keccak256(encode(&[
        Token::FixedBytes(withdrawal_hash.as_bytes().to_vec()),
        Token::Uint(U256::zero()),
    ]))
    .into()
}

/// The output root committed to by `proof`.
pub fn output_root(proof: &OutputRootProof) -> H256 {
    keccak256(encode(&[
        Token::FixedBytes(proof.version.to_vec()),
        Token::FixedBytes(proof.state_root.to_vec()),
        Token::FixedBytes(proof.message_passer_storage_root.to_vec()),
        Token::FixedBytes(proof.latest_blockhash.to_vec()),
    ]))
    .into()
}

/// Drives withdrawals through the L1 bridge contracts.
///
/// `L1` must be able to sign. `L2` only needs to read from a Facet node.
#[derive(Debug)]
pub struct WithdrawalProver<L1, L2> {
    l1: Arc<L1>,
    l2: Arc<L2>,
    oracle: L2OutputOracle<L1>,
    portal: OptimismPortal<L1>,
}

impl<L1, L2> WithdrawalProver<L1, L2>
where
    L1: Middleware + 'static,
    L2: Middleware + 'static,
{
    pub fn new(
        l1: Arc<L1>,
        l2: Arc<L2>,
        l2_output_oracle: Address,
        optimism_portal: Address,
    ) -> Self {
        Self {
            oracle: L2OutputOracle::new(l2_output_oracle, l1.clone()),
            portal: OptimismPortal::new(optimism_portal, l1.clone()),
            l1,
            l2,
        }
    }

    /// Find the withdrawal initiated by `l2_tx_hash` and the L2 block it was included in.
    pub async fn withdrawal(&self, l2_tx_hash: H256) -> Result<(Withdrawal, u64)> {
        let receipt = self
            .l2
            .get_transaction_receipt(l2_tx_hash)
            .await
            .map_err(transport)?
            .context(MissingReceiptSnafu { hash: l2_tx_hash })?;
        let block = receipt
            .block_number
            .context(MissingReceiptSnafu { hash: l2_tx_hash })?
            .as_u64();
        let withdrawal = withdrawals(&receipt)?
            .into_iter()
            .next()
            .context(NoWithdrawalSnafu { hash: l2_tx_hash })?;
        tracing::info!(
            "L2 transaction {l2_tx_hash:?} in block {block} initiated withdrawal {:?}",
            withdrawal.hash
        );
        Ok((withdrawal, block))
    }

    /// Collect everything needed to prove `withdrawal`, which was initiated in `l2_block`.
    pub async fn build_prove_args(
        &self,
        withdrawal: &Withdrawal,
        l2_block: u64,
    ) -> Result<ProveArgs> {
        let l2_output_index = self
            .oracle
            .get_l2_output_index_after(l2_block.into())
            .call()
            .await
            .map_err(transport)?;
        let (root, _timestamp, output_block) = self
            .oracle
            .get_l2_output(l2_output_index)
            .call()
            .await
            .map_err(transport)?;
        let output_block = u64::try_from(output_block)
            .ok()
            .context(OutputBlockOutOfRangeSnafu {
                index: l2_output_index,
                number: output_block,
            })?;
        tracing::info!(
            "withdrawal is covered by output {l2_output_index} at L2 block {output_block}"
        );

        let block = self
            .l2
            .get_block(output_block)
            .await
            .map_err(transport)?
            .context(MissingBlockSnafu {
                number: output_block,
            })?;
        let block_hash = block.hash.context(MissingBlockSnafu {
            number: output_block,
        })?;

        let slot = storage_slot(withdrawal.hash);
        let proof = self
            .l2
            .get_proof(
                L2_TO_L1_MESSAGE_PASSER,
                vec![slot],
                Some(BlockId::from(output_block)),
            )
            .await
            .map_err(transport)?;
        // Only one slot was requested.
        let withdrawal_proof = proof
            .storage_proof
            .into_iter()
            .next()
            .context(MissingProofSnafu { slot })?
            .proof;

        let output_root_proof = OutputRootProof {
            version: [0; 32],
            state_root: block.state_root.0,
            message_passer_storage_root: proof.storage_hash.0,
            latest_blockhash: block_hash.0,
        };
        let expected = H256(root);
        let actual = output_root(&output_root_proof);
        ensure!(
            expected == actual,
            OutputRootMismatchSnafu { expected, actual }
        );

        Ok(ProveArgs {
            l2_output_index,
            output_root_proof,
            withdrawal_proof,
        })
    }

    pub async fn prove(
        &self,
        withdrawal: &Withdrawal,
        args: ProveArgs,
    ) -> Result<TransactionReceipt> {
        tracing::info!("proving withdrawal {:?}", withdrawal.hash);
        let call = self.portal.prove_withdrawal_transaction(
            withdrawal.tx.clone(),
            args.l2_output_index,
            args.output_root_proof,
            args.withdrawal_proof,
        );
        send(call).await
    }

    pub async fn finalize(&self, withdrawal: &Withdrawal) -> Result<TransactionReceipt> {
        tracing::info!("finalizing withdrawal {:?}", withdrawal.hash);
        send(self.portal.finalize_withdrawal_transaction(withdrawal.tx.clone())).await
    }

    pub async fn is_finalized(&self, withdrawal: &Withdrawal) -> Result<bool> {
        self.portal
            .finalized_withdrawals(withdrawal.hash.0)
            .call()
            .await
            .map_err(transport)
    }

    pub fn l1(&self) -> &Arc<L1> {
        &self.l1
    }
}

async fn send<M: Middleware + 'static>(call: ContractCall<M, ()>) -> Result<TransactionReceipt> {
    let pending = call.send().await.map_err(transport)?;
    let hash = pending.tx_hash();
    tracing::info!("L1 transaction sent: {hash:?}");
    pending
        .await
        .map_err(transport)?
        .context(DroppedSnafu { hash })
}
