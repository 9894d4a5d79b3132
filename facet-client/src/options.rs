// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::{backoff::Backoff, InvalidUrlSnafu, MissingUrlSnafu, Result, WalletSnafu};
use clap::Parser;
use ethers::{signers::LocalWallet, types::Address};
use facet::{L1Network, FACET_INBOX_ADDRESS};
use snafu::{OptionExt, ResultExt};
use std::time::Duration;
use url::Url;

/// Connection settings shared by all the Facet tools.
#[derive(Clone, Debug, Parser)]
pub struct Options {
    /// URL of an L1 Ethereum JSON-RPC provider.
    #[clap(long, env = "FACET_L1_RPC_URL")]
    pub l1_rpc_url: Url,

    /// Private key of the L1 account which pays for inbox transactions.
    #[clap(long, env = "FACET_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Base URL of the Facet indexer.
    ///
    /// Defaults to the public indexer of the L1 network, if there is one.
    #[clap(long, env = "FACET_INDEXER_URL")]
    pub indexer_url: Option<Url>,

    /// URL of a Facet JSON-RPC endpoint.
    ///
    /// Defaults to the public endpoint of the L1 network, if there is one.
    #[clap(long, env = "FACET_RPC_URL")]
    pub facet_rpc_url: Option<Url>,

    /// Number of indexer lookups before giving up on a transaction.
    #[clap(
        long,
        env = "FACET_POLL_MAX_ATTEMPTS",
        default_value = "6",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub poll_max_attempts: u32,

    /// Delay after the first missed lookup, in milliseconds. Doubles after every miss.
    #[clap(long, env = "FACET_POLL_BASE_DELAY_MS", default_value = "1000")]
    pub poll_base_delay_ms: u64,
}

/// [`Options`] resolved against the L1 network they turned out to point at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub network: L1Network,
    pub l1_rpc_url: Url,
    pub indexer_url: Url,
    pub facet_rpc_url: Url,
    pub inbox: Address,
    pub backoff: Backoff,
}

impl Options {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            self.poll_max_attempts as usize,
            Duration::from_millis(self.poll_base_delay_ms),
        )
    }

    pub fn indexer_url(&self, network: L1Network) -> Result<Url> {
        resolve(
            self.indexer_url.as_ref(),
            network.indexer_url(),
            "indexer URL",
            network,
        )
    }

    pub fn facet_rpc_url(&self, network: L1Network) -> Result<Url> {
        resolve(
            self.facet_rpc_url.as_ref(),
            network.facet_rpc_url(),
            "Facet RPC URL",
            network,
        )
    }

    pub fn wallet(&self) -> Result<LocalWallet> {
        self.private_key.trim().parse().context(WalletSnafu)
    }

    pub fn config(&self, network: L1Network) -> Result<Config> {
        Ok(Config {
            network,
            l1_rpc_url: self.l1_rpc_url.clone(),
            indexer_url: self.indexer_url(network)?,
            facet_rpc_url: self.facet_rpc_url(network)?,
            inbox: FACET_INBOX_ADDRESS,
            backoff: self.backoff(),
        })
    }
}

fn resolve(
    configured: Option<&Url>,
    default: Option<&'static str>,
    what: &'static str,
    network: L1Network,
) -> Result<Url> {
    if let Some(url) = configured {
        return Ok(url.clone());
    }
    let default = default.context(MissingUrlSnafu { what, network })?;
    default.parse().context(InvalidUrlSnafu)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;
    use ethers::signers::Signer;

    // The first anvil development account.
    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn parse(extra: &[&str]) -> Result<Options, clap::Error> {
        let args = ["send-facet-tx", "--l1-rpc-url", "http://localhost:8545", "--private-key", KEY];
        Options::try_parse_from(args.iter().chain(extra))
    }

    #[test]
    fn test_defaults() {
        let opt = parse(&[]).unwrap();
        assert_eq!(opt.backoff(), Backoff::default());

        let config = opt.config(L1Network::Sepolia).unwrap();
        assert_eq!(config.indexer_url.as_str(), "https://testnet-alpha.facet.org/");
        assert_eq!(
            config.facet_rpc_url.as_str(),
            "https://facet-node-sepolia-current-b39bd7a0ad86.herokuapp.com/rpc"
        );
        assert_eq!(config.inbox, FACET_INBOX_ADDRESS);
    }

    #[test]
    fn test_mainnet_requires_urls() {
        let opt = parse(&[]).unwrap();
        let err = opt.config(L1Network::Mainnet).unwrap_err();
        assert!(
            matches!(err, Error::MissingUrl { what: "indexer URL", network: L1Network::Mainnet }),
            "{err}"
        );

        let opt = parse(&[
            "--indexer-url",
            "http://indexer.test",
            "--facet-rpc-url",
            "http://rpc.test",
        ])
        .unwrap();
        let config = opt.config(L1Network::Mainnet).unwrap();
        assert_eq!(config.indexer_url.as_str(), "http://indexer.test/");
        assert_eq!(config.facet_rpc_url.as_str(), "http://rpc.test/");
    }

    #[test]
    fn test_backoff_options() {
        let opt = parse(&["--poll-max-attempts", "3", "--poll-base-delay-ms", "250"]).unwrap();
        assert_eq!(opt.backoff(), Backoff::new(3, Duration::from_millis(250)));
        assert!(parse(&["--poll-max-attempts", "0"]).is_err());
    }

    #[test]
    fn test_wallet() {
        let opt = parse(&[]).unwrap();
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            .parse()
            .unwrap();
        assert_eq!(opt.wallet().unwrap().address(), expected);

        let mut opt = opt;
        opt.private_key = "not a key".into();
        assert!(matches!(opt.wallet(), Err(Error::Wallet { .. })));
    }
}
