// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Lookups against the Facet indexer.
//!
//! The indexer answers `GET /eth_transactions/{hash}` with either
//!
//! ```json
//! { "error": "Transaction not found" }
//! ```
//!
//! while it has not yet processed the L1 transaction, or
//!
//! ```json
//! { "result": { "facet_transactions": [ ... ] } }
//! ```
//!
//! once it has. The HTTP status code carries no extra information and is ignored.

use crate::{DecodeSnafu, Error, IndexerSnafu, InvalidUrlSnafu, Result};
use async_trait::async_trait;
use ethers::types::H256;
use facet::FacetTransaction;
use serde::Deserialize;
use snafu::{OptionExt, ResultExt};
use url::Url;

const NOT_FOUND: &str = "Transaction not found";

/// The outcome of a single indexer lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    NotFound,
    Found(Box<FacetTransaction>),
}

#[async_trait]
pub trait IndexerClient: Send + Sync {
    /// Look up the Facet transaction derived from the L1 transaction `l1_tx_hash`.
    async fn lookup(&self, l1_tx_hash: H256) -> Result<Lookup>;
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    result: Option<Records>,
}

#[derive(Deserialize)]
struct Records {
    facet_transactions: Vec<FacetTransaction>,
}

/// Interpret the body of an indexer response.
pub fn parse_response(body: &str) -> Result<Lookup> {
    let res: Response = serde_json::from_str(body).map_err(|err| Error::Decode {
        message: format!("malformed indexer response: {err}"),
    })?;
    match (res.error, res.result) {
        (Some(message), _) if message == NOT_FOUND => Ok(Lookup::NotFound),
        (Some(message), _) => IndexerSnafu { message }.fail(),
        (None, Some(records)) => {
            let tx = records
                .facet_transactions
                .into_iter()
                .next()
                .context(DecodeSnafu {
                    message: "indexer returned no facet transactions",
                })?;
            Ok(Lookup::Found(Box::new(tx)))
        }
        (None, None) => DecodeSnafu {
            message: "indexer response has neither a result nor an error",
        }
        .fail(),
    }
}

/// An [`IndexerClient`] talking to a Facet indexer over HTTP.
#[derive(Clone, Debug)]
pub struct HttpIndexer {
    base: Url,
    client: surf::Client,
}

impl HttpIndexer {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            client: surf::Client::new(),
        }
    }

    pub fn url(&self, l1_tx_hash: H256) -> Result<Url> {
        format!(
            "{}/eth_transactions/{l1_tx_hash:?}",
            self.base.as_str().trim_end_matches('/')
        )
        .parse()
        .context(InvalidUrlSnafu)
    }
}

#[async_trait]
impl IndexerClient for HttpIndexer {
    async fn lookup(&self, l1_tx_hash: H256) -> Result<Lookup> {
        let url = self.url(l1_tx_hash)?;
        tracing::debug!("querying indexer at {url}");
        let mut res = self.client.get(url).await.map_err(surf_error)?;
        let body = res.body_string().await.map_err(surf_error)?;
        parse_response(&body)
    }
}

/// `surf` errors do not implement [`std::error::Error`]; unwrap them into something that does.
pub(crate) fn surf_error(err: surf::Error) -> Error {
    Error::Transport {
        source: err.into_inner().into(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_std::task::{sleep, spawn};
    use portpicker::pick_unused_port;
    use std::time::Duration;

    const FIXTURE: &str = include_str!("../../facet/src/testdata/facet_transaction.json");

    fn found_body() -> String {
        format!(r#"{{"result":{{"facet_transactions":[{FIXTURE}]}}}}"#)
    }

    #[test]
    fn test_parse_not_found() {
        assert_eq!(
            parse_response(r#"{"error":"Transaction not found"}"#).unwrap(),
            Lookup::NotFound
        );
    }

    #[test]
    fn test_parse_found() {
        let Lookup::Found(tx) = parse_response(&found_body()).unwrap() else {
            panic!("expected a record");
        };
        assert_eq!(tx.facet_transaction_receipt.gas_used, 125_330);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_response(r#"{"error":"rate limited"}"#),
            Err(Error::Indexer { message }) if message == "rate limited"
        ));
        assert!(matches!(
            parse_response(r#"{"result":{"facet_transactions":[]}}"#),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(
            parse_response(r#"{"result":{}}"#),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(parse_response("{}"), Err(Error::Decode { .. })));
        assert!(matches!(
            parse_response("<html>bad gateway</html>"),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_lookup_url() {
        let hash = H256::repeat_byte(0xab);
        for base in ["http://indexer.test", "http://indexer.test/"] {
            let indexer = HttpIndexer::new(base.parse().unwrap());
            assert_eq!(
                indexer.url(hash).unwrap().as_str(),
                format!("http://indexer.test/eth_transactions/0x{}", "ab".repeat(32))
            );
        }
    }

    #[async_std::test]
    async fn test_http_lookup() {
        let known = H256::repeat_byte(1);
        let port = pick_unused_port().unwrap();
        let mut app = tide::new();
        app.at("/eth_transactions/:hash")
            .get(move |req: tide::Request<()>| async move {
                let res = if req.param("hash")? == format!("{known:?}") {
                    tide::Response::builder(200).body(found_body()).build()
                } else {
                    // Misses come back with an error status, which must not matter.
                    tide::Response::builder(404)
                        .body(r#"{"error":"Transaction not found"}"#)
                        .build()
                };
                Ok::<_, tide::Error>(res)
            });
        spawn(app.listen(format!("127.0.0.1:{port}")));
        sleep(Duration::from_millis(100)).await;

        let indexer = HttpIndexer::new(format!("http://127.0.0.1:{port}").parse().unwrap());
        let Lookup::Found(tx) = indexer.lookup(known).await.unwrap() else {
            panic!("expected a record");
        };
        assert_eq!(tx.gas_limit, 500_000);
        assert_eq!(
            indexer.lookup(H256::repeat_byte(2)).await.unwrap(),
            Lookup::NotFound
        );
    }
}
