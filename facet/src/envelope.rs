// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Encoding of Facet transactions for the L1 inbox.
//!
//! A Facet transaction travels as the calldata of an L1 transaction sent to
//! [`FACET_INBOX_ADDRESS`]. The calldata is the type byte [`FACET_TX_TYPE`] followed by the RLP
//! list
//!
//! ```text
//! [facet_chain_id, to, value, max_fee_per_gas, gas_limit, data]
//! ```
//!
//! where `to` is the empty string for contract creation. Scalars are written as their minimal
//! big-endian bytes, and zero is written as the single byte `0x00` rather than the empty string.
//! This matches the encoding produced by the reference Facet tooling, so envelopes built here are
//! byte-identical to envelopes built there.

use crate::{
    chain::L1Network, Error, InvalidRecipientSnafu, MalformedEnvelopeSnafu, MissingGasLimitSnafu,
    RlpSnafu, ZeroGasLimitSnafu,
};
use ethers::{
    types::{Address, Bytes, H160, U256},
    utils::rlp::{Rlp, RlpStream},
};
use snafu::{ensure, OptionExt, ResultExt};

/// Transaction type byte which distinguishes Facet envelopes from other calldata.
pub const FACET_TX_TYPE: u8 = 0x46;

/// `0x00000000000000000000000000000000000FacE7`
pub const FACET_INBOX_ADDRESS: Address = H160([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0f, 0xac, 0xe7,
]);

const NUM_FIELDS: usize = 6;

/// Fee cap of a Facet transaction.
///
/// On the wire both "use the base fee" and an explicit cap of zero are the scalar zero, so
/// decoding a zero always yields [`MaxFeePerGas::BaseFee`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaxFeePerGas {
    /// Let the L2 charge its current base fee.
    #[default]
    BaseFee,
    Wei(U256),
}

impl MaxFeePerGas {
    pub fn to_wire(self) -> U256 {
        match self {
            Self::BaseFee => U256::zero(),
            Self::Wei(fee) => fee,
        }
    }

    fn from_wire(fee: U256) -> Self {
        if fee.is_zero() {
            Self::BaseFee
        } else {
            Self::Wei(fee)
        }
    }
}

impl From<Option<U256>> for MaxFeePerGas {
    fn from(fee: Option<U256>) -> Self {
        fee.map_or(Self::BaseFee, Self::Wei)
    }
}

/// An L2 transaction to relay through the inbox.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetTxRequest {
    /// Recipient, or `None` to create a contract from `data`.
    pub to: Option<Address>,
    pub value: U256,
    pub max_fee_per_gas: MaxFeePerGas,
    pub gas_limit: u64,
    /// Calldata, or init code when creating a contract.
    pub data: Bytes,
}

impl FacetTxRequest {
    pub fn builder() -> FacetTxRequestBuilder {
        FacetTxRequestBuilder::default()
    }

    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }
}

/// Builder for [`FacetTxRequest`].
///
/// Every field except the gas limit has a default: no recipient (contract creation), zero value,
/// base fee pricing and empty data.
#[derive(Clone, Debug, Default)]
pub struct FacetTxRequestBuilder {
    to: Option<Address>,
    value: U256,
    max_fee_per_gas: MaxFeePerGas,
    gas_limit: Option<u64>,
    data: Bytes,
}

impl FacetTxRequestBuilder {
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn recipient(mut self, to: Option<Address>) -> Self {
        self.to = to;
        self
    }

    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }

    pub fn max_fee_per_gas(mut self, fee: impl Into<MaxFeePerGas>) -> Self {
        self.max_fee_per_gas = fee.into();
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub fn build(self) -> Result<FacetTxRequest, Error> {
        let gas_limit = self.gas_limit.context(MissingGasLimitSnafu)?;
        ensure!(gas_limit > 0, ZeroGasLimitSnafu);
        Ok(FacetTxRequest {
            to: self.to,
            value: self.value,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit,
            data: self.data,
        })
    }
}

impl From<U256> for MaxFeePerGas {
    fn from(fee: U256) -> Self {
        Self::Wei(fee)
    }
}

impl From<u64> for MaxFeePerGas {
    fn from(fee: u64) -> Self {
        Self::Wei(fee.into())
    }
}

/// Parse a recipient as accepted on the command line: an address, or the empty string for
/// contract creation.
pub fn parse_recipient(input: &str) -> Result<Option<Address>, Error> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse()
        .map(Some)
        .ok()
        .context(InvalidRecipientSnafu { input })
}

/// The inbox calldata for a Facet transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetTxEnvelope(Bytes);

/// The fields recovered from an envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedEnvelope {
    pub facet_chain_id: u64,
    pub request: FacetTxRequest,
}

impl FacetTxEnvelope {
    pub fn encode(network: L1Network, request: &FacetTxRequest) -> Self {
        let mut stream = RlpStream::new_list(NUM_FIELDS);
        stream.append(&scalar_bytes(network.facet_chain_id().into()));
        match request.to {
            Some(to) => stream.append(&to.as_bytes()),
            None => stream.append_empty_data(),
        };
        stream.append(&scalar_bytes(request.value));
        stream.append(&scalar_bytes(request.max_fee_per_gas.to_wire()));
        stream.append(&scalar_bytes(request.gas_limit.into()));
        stream.append(&request.data.to_vec());

        let rlp = stream.out();
        let mut bytes = Vec::with_capacity(rlp.len() + 1);
        bytes.push(FACET_TX_TYPE);
        bytes.extend_from_slice(&rlp);
        Self(bytes.into())
    }

    pub fn decode(bytes: &[u8]) -> Result<DecodedEnvelope, Error> {
        let (tx_type, body) = bytes.split_first().context(MalformedEnvelopeSnafu {
            reason: "empty envelope",
        })?;
        ensure!(
            *tx_type == FACET_TX_TYPE,
            MalformedEnvelopeSnafu {
                reason: format!("unexpected transaction type {tx_type:#04x}"),
            }
        );

        let rlp = Rlp::new(body);
        ensure!(
            rlp.is_list(),
            MalformedEnvelopeSnafu {
                reason: "payload is not an RLP list",
            }
        );
        let info = rlp.payload_info().context(RlpSnafu)?;
        ensure!(
            info.header_len + info.value_len == body.len(),
            MalformedEnvelopeSnafu {
                reason: "trailing bytes after RLP list",
            }
        );
        let count = rlp.item_count().context(RlpSnafu)?;
        ensure!(
            count == NUM_FIELDS,
            MalformedEnvelopeSnafu {
                reason: format!("expected {NUM_FIELDS} fields, found {count}"),
            }
        );

        let facet_chain_id = scalar_u64(field(&rlp, 0)?, "chain id")?;
        let to = match field(&rlp, 1)? {
            [] => None,
            to if to.len() == Address::len_bytes() => Some(Address::from_slice(to)),
            to => {
                return MalformedEnvelopeSnafu {
                    reason: format!("recipient has {} bytes", to.len()),
                }
                .fail()
            }
        };
        let value = scalar_u256(field(&rlp, 2)?, "value")?;
        let max_fee_per_gas =
            MaxFeePerGas::from_wire(scalar_u256(field(&rlp, 3)?, "max fee per gas")?);
        let gas_limit = scalar_u64(field(&rlp, 4)?, "gas limit")?;
        let data = Bytes::from(field(&rlp, 5)?.to_vec());

        Ok(DecodedEnvelope {
            facet_chain_id,
            request: FacetTxRequest {
                to,
                value,
                max_fee_per_gas,
                gas_limit,
                data,
            },
        })
    }

    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for FacetTxEnvelope {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// Encode `request` for the Facet L2 derived from the L1 chain `source_chain_id`.
pub fn encode_envelope(
    source_chain_id: u64,
    request: &FacetTxRequest,
) -> Result<FacetTxEnvelope, Error> {
    let network = L1Network::from_chain_id(source_chain_id)?;
    Ok(FacetTxEnvelope::encode(network, request))
}

fn field<'a>(rlp: &Rlp<'a>, index: usize) -> Result<&'a [u8], Error> {
    rlp.at(index).and_then(|item| item.data()).context(RlpSnafu)
}

fn scalar_bytes(value: U256) -> Vec<u8> {
    if value.is_zero() {
        return vec![0];
    }
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    let start = (value.leading_zeros() / 8) as usize;
    buf[start..].to_vec()
}

fn scalar_u256(bytes: &[u8], field: &str) -> Result<U256, Error> {
    ensure!(
        bytes.len() <= 32,
        MalformedEnvelopeSnafu {
            reason: format!("{field} does not fit in 256 bits"),
        }
    );
    Ok(U256::from_big_endian(bytes))
}

fn scalar_u64(bytes: &[u8], field: &str) -> Result<u64, Error> {
    ensure!(
        bytes.len() <= 8,
        MalformedEnvelopeSnafu {
            reason: format!("{field} does not fit in 64 bits"),
        }
    );
    Ok(bytes.iter().fold(0, |acc, byte| (acc << 8) | u64::from(*byte)))
}

#[cfg(test)]
mod test {
    use super::*;
    use ethers::utils::hex;

    const BYTECODE: &[u8] = &[0x60, 0x80, 0x60, 0x40];

    fn deploy_request() -> FacetTxRequest {
        FacetTxRequest::builder()
            .gas_limit(500_000)
            .data(BYTECODE.to_vec())
            .build()
            .unwrap()
    }

    #[test]
    fn test_inbox_address() {
        let expected: Address = "0x00000000000000000000000000000000000FacE7"
            .parse()
            .unwrap();
        assert_eq!(FACET_INBOX_ADDRESS, expected);
    }

    #[test]
    fn test_encode_contract_creation() {
        let envelope = encode_envelope(11_155_111, &deploy_request()).unwrap();

        // 0x46 || [0xface7a, "", 0x00, 0x00, 0x07a120, bytecode]
        let expected = hex::decode("46d083face7a8000008307a1208460806040").unwrap();
        assert_eq!(envelope.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_encode_call() {
        let to: Address = "0x1111111111111111111111111111111111111111"
            .parse()
            .unwrap();
        let request = FacetTxRequest::builder()
            .to(to)
            .value(1_000_000_000u64)
            .max_fee_per_gas(10u64)
            .gas_limit(21_000)
            .data(vec![0x12, 0x34])
            .build()
            .unwrap();
        let envelope = encode_envelope(1, &request).unwrap();

        let mut expected = vec![FACET_TX_TYPE, 0xe5];
        expected.extend([0x83, 0x0f, 0xac, 0xe7]);
        expected.push(0x94);
        expected.extend([0x11; 20]);
        expected.extend([0x84, 0x3b, 0x9a, 0xca, 0x00]);
        expected.push(0x0a);
        expected.extend([0x82, 0x52, 0x08]);
        expected.extend([0x82, 0x12, 0x34]);
        assert_eq!(envelope.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let request = deploy_request();
        for network in L1Network::ALL {
            let first = FacetTxEnvelope::encode(network, &request);
            for _ in 0..10 {
                assert_eq!(FacetTxEnvelope::encode(network, &request), first);
            }
        }
    }

    #[test]
    fn test_encode_unsupported_chain() {
        let request = deploy_request();
        for chain_id in [0, 5, 17000, 31337] {
            assert!(matches!(
                encode_envelope(chain_id, &request),
                Err(Error::UnsupportedChain { .. })
            ));
        }
    }

    #[test]
    fn test_decode_recovers_fields() {
        let to: Address = "0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef"
            .parse()
            .unwrap();
        let requests = [
            deploy_request(),
            FacetTxRequest::builder()
                .to(to)
                .value(U256::MAX)
                .max_fee_per_gas(U256::from_dec_str("123456789012345678901234567890").unwrap())
                .gas_limit(u64::MAX)
                .build()
                .unwrap(),
        ];
        for network in L1Network::ALL {
            for request in &requests {
                let envelope = FacetTxEnvelope::encode(network, request);
                let decoded = FacetTxEnvelope::decode(envelope.as_ref()).unwrap();
                assert_eq!(decoded.facet_chain_id, network.facet_chain_id());
                assert_eq!(&decoded.request, request);
            }
        }
    }

    #[test]
    fn test_empty_recipient_is_creation() {
        assert_eq!(parse_recipient("").unwrap(), None);
        assert_eq!(parse_recipient("  ").unwrap(), None);

        let request = FacetTxRequest::builder()
            .recipient(parse_recipient("").unwrap())
            .gas_limit(1)
            .build()
            .unwrap();
        assert!(request.is_create());

        // The recipient slot is the RLP empty string, not the bytes of a literal "".
        let envelope = FacetTxEnvelope::encode(L1Network::Sepolia, &request);
        assert_eq!(envelope.as_ref()[6], 0x80);

        assert!(matches!(
            parse_recipient("0x1234"),
            Err(Error::InvalidRecipient { .. })
        ));
    }

    #[test]
    fn test_gas_limit_required() {
        assert!(matches!(
            FacetTxRequest::builder().build(),
            Err(Error::MissingGasLimit)
        ));
        assert!(matches!(
            FacetTxRequest::builder().gas_limit(0).build(),
            Err(Error::ZeroGasLimit)
        ));
    }

    #[test]
    fn test_max_fee_default_is_base_fee() {
        let request = deploy_request();
        assert_eq!(request.max_fee_per_gas, MaxFeePerGas::BaseFee);
        assert_eq!(MaxFeePerGas::from(None), MaxFeePerGas::BaseFee);
        assert_eq!(
            MaxFeePerGas::from(Some(U256::from(3u64))),
            MaxFeePerGas::Wei(3u64.into())
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let envelope = FacetTxEnvelope::encode(L1Network::Sepolia, &deploy_request());
        let bytes = envelope.as_ref();

        assert!(FacetTxEnvelope::decode(&[]).is_err());

        let mut wrong_type = bytes.to_vec();
        wrong_type[0] = 0x02;
        assert!(matches!(
            FacetTxEnvelope::decode(&wrong_type),
            Err(Error::MalformedEnvelope { .. })
        ));

        let mut trailing = bytes.to_vec();
        trailing.push(0);
        assert!(FacetTxEnvelope::decode(&trailing).is_err());

        // A list with five fields.
        let mut stream = RlpStream::new_list(5);
        for _ in 0..5 {
            stream.append_empty_data();
        }
        let mut short = vec![FACET_TX_TYPE];
        short.extend_from_slice(&stream.out());
        assert!(matches!(
            FacetTxEnvelope::decode(&short),
            Err(Error::MalformedEnvelope { .. })
        ));
    }
}
