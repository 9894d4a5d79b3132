// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Read-only calls against the Facet L2 node.
//!
//! Writes never go to the L2 directly, they go through the L1 inbox. Reads are plain Ethereum
//! JSON-RPC, and only the two methods the tools need are exposed.

use crate::{indexer::surf_error, DecodeSnafu, Error, Result, RpcSnafu};
use ethers::types::{Address, Bytes, U256};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

#[derive(Debug)]
pub struct FacetRpc {
    url: Url,
    client: surf::Client,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

impl FacetRpc {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            client: surf::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!("{method} request {id} to {}", self.url);

        let mut res = self
            .client
            .post(self.url.clone())
            .body_json(&body)
            .map_err(surf_error)?
            .await
            .map_err(surf_error)?;
        let text = res.body_string().await.map_err(surf_error)?;
        parse_reply(method, &text)
    }

    /// `eth_call` against the latest L2 block.
    pub async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    /// `eth_getBalance` at the latest L2 block.
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        self.request("eth_getBalance", json!([address, "latest"]))
            .await
    }
}

fn parse_reply<T: DeserializeOwned>(method: &str, text: &str) -> Result<T> {
    let reply: Reply = serde_json::from_str(text).map_err(|err| Error::Decode {
        message: format!("malformed {method} reply: {err}"),
    })?;
    if let Some(ErrorObject { code, message }) = reply.error {
        return RpcSnafu { code, message }.fail();
    }
    let Some(result) = reply.result else {
        return DecodeSnafu {
            message: format!("{method} reply has no result"),
        }
        .fail();
    };
    serde_json::from_value(result).map_err(|err| Error::Decode {
        message: format!("unexpected {method} result: {err}"),
    })
}
