// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::Result;
use async_compatibility_layer::logging::{setup_backtrace, setup_logging};
use clap::Parser;
use ethers::types::{Bytes, U256};
use facet::{parse_recipient, FacetTxRequest};
use facet_client::{FacetClient, Options};

/// Send a single Facet transaction through the L1 inbox and print the derived transaction.
#[derive(Parser, Debug)]
struct Args {
    #[clap(flatten)]
    options: Options,

    /// Recipient of the transaction. Leave empty to create a contract from `--data`.
    #[clap(long, default_value = "")]
    to: String,

    /// Value to transfer, in wei.
    #[clap(long, default_value = "0", value_parser = parse_wei)]
    value: U256,

    /// Fee cap per unit of gas, in wei. Pays the L2 base fee if omitted.
    #[clap(long, value_parser = parse_wei)]
    max_fee_per_gas: Option<U256>,

    #[clap(long)]
    gas_limit: u64,

    /// Calldata or init code, hex encoded.
    #[clap(long, default_value = "0x")]
    data: Bytes,
}

fn parse_wei(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|err| format!("invalid amount {s:?}: {err}"))
}

#[async_std::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();
    setup_backtrace();

    let args = Args::parse();
    let request = FacetTxRequest::builder()
        .recipient(parse_recipient(&args.to)?)
        .value(args.value)
        .max_fee_per_gas(args.max_fee_per_gas)
        .gas_limit(args.gas_limit)
        .data(args.data)
        .build()?;

    let client = FacetClient::connect(&args.options).await?;
    let tx = client.send_facet_transaction(&request).await?;
    println!("{}", serde_json::to_string_pretty(&tx)?);
    Ok(())
}
