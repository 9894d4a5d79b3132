// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use async_compatibility_layer::logging::{setup_backtrace, setup_logging};
use clap::Parser;
use ethers::{abi::Token, types::U256, utils::format_ether};
use facet::FacetTxRequest;
use facet_client::{FacetClient, Options};
use facet_contract_bindings::HardhatArtifact;
use std::path::PathBuf;

/// Deploy a storage contract to Facet through the L1 inbox, set its value and read it back.
///
/// The contract must expose `setValue(uint256)` and `getValue() returns (uint256)`.
#[derive(Parser, Debug, Clone)]
pub struct Args {
    #[clap(flatten)]
    pub options: Options,

    /// Path of the hardhat artifact of the contract.
    #[clap(
        long,
        env = "FACET_DEPLOY_ARTIFACT",
        default_value = "artifacts/contracts/SimpleStorage.sol/SimpleStorage.json"
    )]
    pub artifact: PathBuf,

    /// Value to store after deployment.
    #[clap(long, default_value = "42")]
    pub value: u64,

    /// Fee cap per unit of gas for both transactions, in wei.
    #[clap(long, default_value = "10")]
    pub max_fee_per_gas: u64,

    /// Gas limit for both transactions.
    #[clap(long, default_value = "500000")]
    pub gas_limit: u64,
}

async fn deploy(args: Args) -> Result<()> {
    let artifact = HardhatArtifact::load(&args.artifact)?;
    let client = FacetClient::connect(&args.options).await?;

    tracing::info!("deploying {}", artifact.contract_name);
    let request = FacetTxRequest::builder()
        .max_fee_per_gas(args.max_fee_per_gas)
        .gas_limit(args.gas_limit)
        .data(artifact.bytecode.clone())
        .build()?;
    let deployment = client.send_facet_transaction(&request).await?;
    tracing::info!("deployment: {deployment:?}");
    let contract = deployment
        .facet_transaction_receipt
        .contract_address
        .context("deployment did not create a contract")?;
    tracing::info!("contract address: {contract:?}");

    let request = FacetTxRequest::builder()
        .to(contract)
        .max_fee_per_gas(args.max_fee_per_gas)
        .gas_limit(args.gas_limit)
        .data(artifact.encode_call("setValue", &[Token::Uint(args.value.into())])?)
        .build()?;
    let set_value = client.send_facet_transaction(&request).await?;
    tracing::info!("setValue({}): {:?}", args.value, set_value.tx_hash);

    let ret = client
        .rpc()
        .eth_call(contract, artifact.encode_call("getValue", &[])?)
        .await?;
    let value = artifact.decode_output("getValue", &ret)?;
    tracing::info!("getValue() = {value:?}");
    if value != [Token::Uint(U256::from(args.value))] {
        tracing::warn!("stored value does not match {}", args.value);
    }

    let balance = client.rpc().get_balance(set_value.from_address).await?;
    tracing::info!(
        "deployer {:?} balance: {} ETH",
        set_value.from_address,
        format_ether(balance)
    );
    Ok(())
}

#[async_std::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();
    setup_backtrace();

    let args = Args::parse();
    deploy(args).await
}
