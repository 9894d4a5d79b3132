// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use async_compatibility_layer::logging::{setup_backtrace, setup_logging};
use async_std::task::sleep;
use clap::Parser;
use ethers::{
    providers::{Http, Provider},
    types::{Address, H256},
};
use facet::{chain::BridgeContracts, L1Network};
use facet_client::{connect_l1, Options};
use facet_contract_bindings::WithdrawalProver;
use std::{sync::Arc, time::Duration};

/// Prove a withdrawal from Facet on L1 and, after the challenge period, finalize it.
#[derive(Parser, Debug, Clone)]
pub struct Args {
    #[clap(flatten)]
    pub options: Options,

    /// Hash of the L2 transaction which initiated the withdrawal.
    #[clap(long, env = "FACET_WITHDRAWAL_TX_HASH")]
    pub l2_tx_hash: H256,

    /// Address of the L2OutputOracle contract on L1.
    ///
    /// Defaults to the known deployment for the L1 network.
    #[clap(long, env = "FACET_L2_OUTPUT_ORACLE")]
    pub l2_output_oracle: Option<Address>,

    /// Address of the OptimismPortal contract on L1.
    ///
    /// Defaults to the known deployment for the L1 network.
    #[clap(long, env = "FACET_OPTIMISM_PORTAL")]
    pub optimism_portal: Option<Address>,

    /// How long to wait between proving and finalizing, in seconds.
    #[clap(long, default_value = "60")]
    pub challenge_period_secs: u64,

    /// Only prove the withdrawal.
    #[clap(long)]
    pub skip_finalize: bool,
}

fn bridge_address(
    configured: Option<Address>,
    network: L1Network,
    pick: impl FnOnce(BridgeContracts) -> Address,
    what: &str,
) -> Result<Address> {
    if let Some(address) = configured {
        return Ok(address);
    }
    let contracts = network
        .bridge_contracts()
        .with_context(|| format!("no known {what} on {network}, pass one explicitly"))?;
    Ok(pick(contracts))
}

async fn prove(args: Args) -> Result<()> {
    let (network, l1) = connect_l1(&args.options).await?;
    let l2 = Arc::new(Provider::new(Http::new(
        args.options.facet_rpc_url(network)?,
    )));
    let oracle = bridge_address(
        args.l2_output_oracle,
        network,
        |c| c.l2_output_oracle,
        "L2OutputOracle",
    )?;
    let portal = bridge_address(
        args.optimism_portal,
        network,
        |c| c.optimism_portal,
        "OptimismPortal",
    )?;

    let prover = WithdrawalProver::new(l1, l2, oracle, portal);
    let (withdrawal, l2_block) = prover.withdrawal(args.l2_tx_hash).await?;
    let prove_args = prover.build_prove_args(&withdrawal, l2_block).await?;
    tracing::info!("prove arguments: {prove_args:?}");
    let receipt = prover.prove(&withdrawal, prove_args).await?;
    tracing::info!("prove receipt: {receipt:?}");

    if args.skip_finalize {
        return Ok(());
    }
    tracing::info!(
        "waiting {}s for the challenge period to end",
        args.challenge_period_secs
    );
    sleep(Duration::from_secs(args.challenge_period_secs)).await;
    let receipt = prover.finalize(&withdrawal).await?;
    tracing::info!("finalize receipt: {receipt:?}");
    if !prover.is_finalized(&withdrawal).await? {
        anyhow::bail!("withdrawal {:?} is not finalized", withdrawal.hash);
    }
    Ok(())
}

#[async_std::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();
    setup_backtrace();

    let args = Args::parse();
    prove(args).await
}
