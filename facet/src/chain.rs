// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::{Error, UnsupportedChainSnafu};
use ethers::types::{Address, H160};
use std::fmt::{self, Display, Formatter};

/// An L1 network that Facet derives an L2 from.
///
/// Adding a network means adding a variant here; every per-network lookup below is an exhaustive
/// match, so the compiler points at each table that needs a new entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum L1Network {
    Mainnet,
    Sepolia,
}

/// Addresses of the L1 bridge contracts of a Facet deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeContracts {
    pub l2_output_oracle: Address,
    pub optimism_portal: Address,
    pub l1_standard_bridge: Address,
    pub dispute_game_factory: Address,
}

const SEPOLIA_BRIDGE: BridgeContracts = BridgeContracts {
    // 0xDf9aF3B2e9617D53FD2E0096859ec7f4db6c96c9
    l2_output_oracle: H160([
        0xdf, 0x9a, 0xf3, 0xb2, 0xe9, 0x61, 0x7d, 0x53, 0xfd, 0x2e, 0x00, 0x96, 0x85, 0x9e, 0xc7,
        0xf4, 0xdb, 0x6c, 0x96, 0xc9,
    ]),
    // 0x34936f885d551C5f887Ed50bDc02eEB89F015930
    optimism_portal: H160([
        0x34, 0x93, 0x6f, 0x88, 0x5d, 0x55, 0x1c, 0x5f, 0x88, 0x7e, 0xd5, 0x0b, 0xdc, 0x02, 0xee,
        0xb8, 0x9f, 0x01, 0x59, 0x30,
    ]),
    // 0x46787ffeC1be4dc1c9D8eaD9dE3B83E41063C772
    l1_standard_bridge: H160([
        0x46, 0x78, 0x7f, 0xfe, 0xc1, 0xbe, 0x4d, 0xc1, 0xc9, 0xd8, 0xea, 0xd9, 0xde, 0x3b, 0x83,
        0xe4, 0x10, 0x63, 0xc7, 0x72,
    ]),
    // 0xe5965Ab5962eDc7477C8520243A95517CD252fA9
    dispute_game_factory: H160([
        0xe5, 0x96, 0x5a, 0xb5, 0x96, 0x2e, 0xdc, 0x74, 0x77, 0xc8, 0x52, 0x02, 0x43, 0xa9, 0x55,
        0x17, 0xcd, 0x25, 0x2f, 0xa9,
    ]),
};

impl L1Network {
    pub const ALL: [Self; 2] = [Self::Mainnet, Self::Sepolia];

    pub fn from_chain_id(chain_id: u64) -> Result<Self, Error> {
        match chain_id {
            1 => Ok(Self::Mainnet),
            11_155_111 => Ok(Self::Sepolia),
            _ => UnsupportedChainSnafu { chain_id }.fail(),
        }
    }

    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Sepolia => 11_155_111,
        }
    }

    /// The chain ID of the Facet L2 derived from this network.
    pub const fn facet_chain_id(self) -> u64 {
        match self {
            Self::Mainnet => 0xface7,
            Self::Sepolia => 0xface7a,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Sepolia => "sepolia",
        }
    }

    /// Base URL of the public Facet indexer, if there is a well-known one.
    pub const fn indexer_url(self) -> Option<&'static str> {
        match self {
            Self::Mainnet => None,
            Self::Sepolia => Some("https://testnet-alpha.facet.org"),
        }
    }

    /// URL of the public Facet JSON-RPC endpoint, if there is a well-known one.
    pub const fn facet_rpc_url(self) -> Option<&'static str> {
        match self {
            Self::Mainnet => None,
            Self::Sepolia => {
                Some("https://facet-node-sepolia-current-b39bd7a0ad86.herokuapp.com/rpc")
            }
        }
    }

    pub const fn bridge_contracts(self) -> Option<BridgeContracts> {
        match self {
            Self::Mainnet => None,
            Self::Sepolia => Some(SEPOLIA_BRIDGE),
        }
    }
}

impl Display for L1Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_chain_table() {
        for network in L1Network::ALL {
            assert_eq!(L1Network::from_chain_id(network.chain_id()).unwrap(), network);
        }
        assert_eq!(L1Network::Mainnet.facet_chain_id(), 1027303);
        assert_eq!(L1Network::Sepolia.facet_chain_id(), 16436858);
    }

    #[test]
    fn test_unsupported_chain() {
        for chain_id in [0, 5, 10, 31337, 11_155_112, 0xface7a] {
            let err = L1Network::from_chain_id(chain_id).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedChain { chain_id: id } if id == chain_id),
                "{err}"
            );
        }
    }

    #[test]
    fn test_bridge_addresses() {
        let contracts = L1Network::Sepolia.bridge_contracts().unwrap();
        for (address, expected) in [
            (
                contracts.l2_output_oracle,
                "0xDf9aF3B2e9617D53FD2E0096859ec7f4db6c96c9",
            ),
            (
                contracts.optimism_portal,
                "0x34936f885d551C5f887Ed50bDc02eEB89F015930",
            ),
            (
                contracts.l1_standard_bridge,
                "0x46787ffeC1be4dc1c9D8eaD9dE3B83E41063C772",
            ),
            (
                contracts.dispute_game_factory,
                "0xe5965Ab5962eDc7477C8520243A95517CD252fA9",
            ),
        ] {
            assert_eq!(address, expected.parse::<Address>().unwrap());
        }
        assert!(L1Network::Mainnet.bridge_contracts().is_none());
    }
}
