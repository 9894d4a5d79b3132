// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Records served by the Facet indexer.
//!
//! These are only ever read. The indexer is not consistent about how it renders numbers, so
//! numeric fields accept JSON numbers, decimal strings and `0x` hex strings alike.

use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

/// The L2 transaction derived from an L1 inbox transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetTransaction {
    #[serde(default)]
    pub id: u64,
    /// Hash of the L1 transaction that carried this transaction.
    #[serde(default)]
    pub eth_transaction_hash: H256,
    #[serde(default, deserialize_with = "quantity::int")]
    pub eth_call_index: u64,
    #[serde(default)]
    pub block_hash: H256,
    #[serde(default, deserialize_with = "quantity::int")]
    pub block_number: u64,
    #[serde(default)]
    pub deposit_receipt_version: Option<String>,
    pub from_address: Address,
    #[serde(default, deserialize_with = "quantity::int")]
    pub gas: u64,
    #[serde(default, deserialize_with = "quantity::int")]
    pub gas_limit: u64,
    #[serde(default, deserialize_with = "quantity::option_u256")]
    pub gas_price: Option<U256>,
    /// Hash of the L2 transaction.
    pub tx_hash: H256,
    #[serde(default)]
    pub input: Bytes,
    #[serde(default)]
    pub source_hash: H256,
    #[serde(default)]
    pub to_address: Option<Address>,
    #[serde(default, deserialize_with = "quantity::int")]
    pub transaction_index: u64,
    #[serde(default)]
    pub tx_type: String,
    #[serde(default, deserialize_with = "quantity::u256")]
    pub mint: U256,
    #[serde(default, deserialize_with = "quantity::u256")]
    pub value: U256,
    #[serde(default, deserialize_with = "quantity::u256")]
    pub max_fee_per_gas: U256,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    pub facet_transaction_receipt: FacetTransactionReceipt,
}

/// Execution outcome of a [`FacetTransaction`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetTransactionReceipt {
    #[serde(default)]
    pub id: u64,
    pub transaction_hash: H256,
    #[serde(default)]
    pub block_hash: H256,
    #[serde(default, deserialize_with = "quantity::int")]
    pub block_number: u64,
    /// Set when the transaction created a contract.
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub legacy_contract_address_map: serde_json::Value,
    #[serde(default, deserialize_with = "quantity::int")]
    pub cumulative_gas_used: u64,
    #[serde(default, deserialize_with = "quantity::int")]
    pub deposit_nonce: u64,
    #[serde(default)]
    pub deposit_receipt_version: Option<String>,
    #[serde(default, deserialize_with = "quantity::u256")]
    pub effective_gas_price: U256,
    #[serde(default)]
    pub from_address: Address,
    #[serde(default, deserialize_with = "quantity::int")]
    pub gas_used: u64,
    #[serde(default)]
    pub logs: Vec<serde_json::Value>,
    #[serde(default)]
    pub logs_bloom: String,
    #[serde(deserialize_with = "quantity::int")]
    pub status: u64,
    #[serde(default)]
    pub to_address: Option<Address>,
    #[serde(default, deserialize_with = "quantity::int")]
    pub transaction_index: u64,
    #[serde(default)]
    pub tx_type: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl FacetTransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

mod quantity {
    use ethers::types::U256;
    use serde::de::{Deserialize, Deserializer, Error, Unexpected, Visitor};
    use std::fmt::{self, Formatter};

    /// A non-negative integer written as a JSON number, a decimal string or a `0x` hex string.
    struct Quantity(U256);

    struct QuantityVisitor;

    impl<'de> Visitor<'de> for QuantityVisitor {
        type Value = Quantity;

        fn expecting(&self, f: &mut Formatter) -> fmt::Result {
            write!(f, "a non-negative integer or an integer string")
        }

        fn visit_u64<E: Error>(self, n: u64) -> Result<Quantity, E> {
            Ok(Quantity(n.into()))
        }

        fn visit_u128<E: Error>(self, n: u128) -> Result<Quantity, E> {
            Ok(Quantity(n.into()))
        }

        fn visit_i64<E: Error>(self, n: i64) -> Result<Quantity, E> {
            u64::try_from(n)
                .map(|n| Quantity(n.into()))
                .map_err(|_| E::invalid_value(Unexpected::Signed(n), &self))
        }

        // serde_json hands over integers beyond u64 as floats.
        fn visit_f64<E: Error>(self, n: f64) -> Result<Quantity, E> {
            float_to_u256(n)
                .map(Quantity)
                .ok_or_else(|| E::invalid_value(Unexpected::Float(n), &self))
        }

        fn visit_str<E: Error>(self, text: &str) -> Result<Quantity, E> {
            let value = match text.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16)
                    .map_err(|err| E::custom(format!("invalid hex quantity {text:?}: {err}")))?,
                None => U256::from_dec_str(text)
                    .map_err(|err| E::custom(format!("invalid quantity {text:?}: {err}")))?,
            };
            Ok(Quantity(value))
        }
    }

    impl<'de> Deserialize<'de> for Quantity {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(QuantityVisitor)
        }
    }

    /// The exact integer value of `n`, if it is a non-negative integer below 2^256.
    fn float_to_u256(n: f64) -> Option<U256> {
        if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
            return None;
        }
        if n == 0.0 {
            return Some(U256::zero());
        }
        let bits = n.to_bits();
        // Integral values are never subnormal, so the implicit leading bit is always set.
        let mantissa = (bits & ((1 << 52) - 1)) | (1 << 52);
        let exponent = ((bits >> 52) & 0x7ff) as i64 - 1075;
        if exponent <= 0 {
            // The fraction bits below the point are all zero because `n` is integral.
            return Some(U256::from(mantissa >> exponent.unsigned_abs()));
        }
        if exponent + 53 > 256 {
            return None;
        }
        Some(U256::from(mantissa) << exponent as usize)
    }

    pub(super) fn u256<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        Ok(Quantity::deserialize(deserializer)?.0)
    }

    pub(super) fn option_u256<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        Ok(Option::<Quantity>::deserialize(deserializer)?.map(|q| q.0))
    }

    pub(super) fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = u256(deserializer)?;
        if value > U256::from(u64::MAX) {
            return Err(D::Error::custom(format!("quantity {value} overflows u64")));
        }
        Ok(value.as_u64())
    }
}
