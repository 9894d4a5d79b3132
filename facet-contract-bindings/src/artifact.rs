// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::{AbiSnafu, ParseArtifactSnafu, ReadArtifactSnafu, Result};
use ethers::abi::{Abi, Token};
use ethers::types::Bytes;
use serde::Deserialize;
use snafu::ResultExt;
use std::path::Path;

/// The parts of a hardhat build artifact needed to deploy and call a contract.
///
/// Facet contracts are deployed through the inbox rather than as ordinary L1 contract creations,
/// so the artifact is used directly instead of going through generated bindings.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardhatArtifact {
    #[serde(default)]
    pub contract_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl HardhatArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).context(ReadArtifactSnafu { path })?;
        serde_json::from_str(&json).context(ParseArtifactSnafu { path })
    }

    /// ABI encode a call to `function`.
    pub fn encode_call(&self, function: &str, args: &[Token]) -> Result<Bytes> {
        let function = self.abi.function(function).context(AbiSnafu)?;
        Ok(function.encode_input(args).context(AbiSnafu)?.into())
    }

    /// ABI decode the return data of a call to `function`.
    pub fn decode_output(&self, function: &str, data: &[u8]) -> Result<Vec<Token>> {
        let function = self.abi.function(function).context(AbiSnafu)?;
        function.decode_output(data).context(AbiSnafu)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;
    use ethers::types::U256;
    use ethers::utils::id;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SIMPLE_STORAGE: &str = r#"{
        "_format": "hh-sol-artifact-1",
        "contractName": "SimpleStorage",
        "sourceName": "contracts/SimpleStorage.sol",
        "abi": [
            {
                "inputs": [],
                "name": "getValue",
                "outputs": [{ "internalType": "uint256", "name": "", "type": "uint256" }],
                "stateMutability": "view",
                "type": "function"
            },
            {
                "inputs": [{ "internalType": "uint256", "name": "_value", "type": "uint256" }],
                "name": "setValue",
                "outputs": [],
                "stateMutability": "nonpayable",
                "type": "function"
            }
        ],
        "bytecode": "0x6080604052348015600f57600080fd5b50",
        "deployedBytecode": "0x6080604052",
        "linkReferences": {},
        "deployedLinkReferences": {}
    }"#;

    fn write(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_and_call() {
        let file = write(SIMPLE_STORAGE);
        let artifact = HardhatArtifact::load(file.path()).unwrap();
        assert_eq!(artifact.contract_name, "SimpleStorage");
        assert_eq!(
            artifact.bytecode.as_ref(),
            [0x60, 0x80, 0x60, 0x40, 0x52, 0x34, 0x80, 0x15, 0x60, 0x0f, 0x57, 0x60, 0x00, 0x80, 0xfd, 0x5b, 0x50]
        );

        let data = artifact
            .encode_call("setValue", &[Token::Uint(42.into())])
            .unwrap();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[..4], id("setValue(uint256)"));
        assert_eq!(U256::from_big_endian(&data[4..]), 42.into());

        assert_eq!(
            artifact.encode_call("getValue", &[]).unwrap().as_ref(),
            id("getValue()")
        );

        let mut ret = [0u8; 32];
        ret[31] = 42;
        assert_eq!(
            artifact.decode_output("getValue", &ret).unwrap(),
            vec![Token::Uint(42.into())]
        );
    }

    #[test]
    fn test_bad_artifacts() {
        let artifact = HardhatArtifact::load(write(SIMPLE_STORAGE).path()).unwrap();
        assert!(matches!(
            artifact.encode_call("transfer", &[]),
            Err(Error::Abi { .. })
        ));
        assert!(matches!(
            artifact.encode_call("setValue", &[]),
            Err(Error::Abi { .. })
        ));

        assert!(matches!(
            HardhatArtifact::load("/nonexistent/SimpleStorage.json"),
            Err(Error::ReadArtifact { .. })
        ));
        assert!(matches!(
            HardhatArtifact::load(write(r#"{"abi": []}"#).path()),
            Err(Error::ParseArtifact { .. })
        ));
    }
}
