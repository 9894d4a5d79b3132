// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::{
    indexer::{HttpIndexer, IndexerClient},
    json_rpc::FacetRpc,
    options::{Config, Options},
    poller::Poller,
    submit::Submitter,
    transport, Error, Result,
};
use ethers::prelude::*;
use facet::{encode_envelope, FacetTransaction, FacetTxRequest, L1Network};
use std::sync::Arc;

/// The signing L1 client built from [`Options`].
pub type L1Client = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Everything needed to send Facet transactions and read Facet state.
#[derive(Debug)]
pub struct FacetClient<M, I = HttpIndexer> {
    config: Config,
    l1: Arc<M>,
    submitter: Submitter<M>,
    poller: Poller<I>,
    rpc: FacetRpc,
}

/// Connect to the L1 provider in `opt` with the configured signing key.
pub async fn connect_l1(opt: &Options) -> Result<(L1Network, Arc<L1Client>)> {
    let provider = Provider::new(Http::new(opt.l1_rpc_url.clone()));
    let network = L1Network::from_chain_id(chain_id(&provider).await?)?;
    let wallet = opt.wallet()?.with_chain_id(network.chain_id());
    tracing::info!(
        "connected to {network} L1 at {} as {:?}",
        opt.l1_rpc_url,
        wallet.address()
    );
    Ok((network, Arc::new(SignerMiddleware::new(provider, wallet))))
}

impl FacetClient<L1Client> {
    /// Connect to the L1 provider in `opt` and resolve everything else for the network it serves.
    pub async fn connect(opt: &Options) -> Result<Self> {
        let (network, l1) = connect_l1(opt).await?;
        let config = opt.config(network)?;
        let indexer = HttpIndexer::new(config.indexer_url.clone());
        Ok(Self::with_parts(config, l1, indexer))
    }
}

impl<M, I> FacetClient<M, I>
where
    M: Middleware + 'static,
    M::Error: 'static,
    I: IndexerClient,
{
    pub fn with_parts(config: Config, l1: Arc<M>, indexer: I) -> Self {
        Self {
            submitter: Submitter::with_inbox(l1.clone(), config.inbox),
            poller: Poller::new(indexer, config.backoff),
            rpc: FacetRpc::new(config.facet_rpc_url.clone()),
            l1,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn network(&self) -> L1Network {
        self.config.network
    }

    pub fn l1(&self) -> &Arc<M> {
        &self.l1
    }

    pub fn rpc(&self) -> &FacetRpc {
        &self.rpc
    }

    /// The L1 account paying for inbox transactions.
    pub fn address(&self) -> Option<Address> {
        self.l1.default_sender()
    }

    /// Encode `request`, post it to the L1 inbox and wait for the indexer to report the derived
    /// Facet transaction.
    ///
    /// The envelope is encoded for whatever chain the L1 provider reports at the time of the call.
    pub async fn send_facet_transaction(
        &self,
        request: &FacetTxRequest,
    ) -> Result<FacetTransaction> {
        let envelope = encode_envelope(chain_id(&*self.l1).await?, request)?;
        let receipt = self.submitter.submit(&envelope).await?;
        let tx = self.poller.poll(receipt.transaction_hash).await?;
        if !tx.facet_transaction_receipt.is_success() {
            tracing::warn!(
                "facet transaction {:?} failed with status {}",
                tx.tx_hash,
                tx.facet_transaction_receipt.status
            );
        }
        Ok(tx)
    }
}

async fn chain_id<M>(l1: &M) -> Result<u64>
where
    M: Middleware,
    M::Error: 'static,
{
    let chain_id = l1.get_chainid().await.map_err(transport)?;
    u64::try_from(chain_id).map_err(|_| Error::Decode {
        message: format!("chain id {chain_id} does not fit in 64 bits"),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{backoff::Backoff, indexer::Lookup};
    use async_trait::async_trait;
    use ethers::utils::Anvil;
    use facet::FacetTxEnvelope;
    use std::time::Duration;

    const FIXTURE: &str = include_str!("../../facet/src/testdata/facet_transaction.json");

    fn config(network: L1Network) -> Config {
        Config {
            network,
            l1_rpc_url: "http://127.0.0.1:8545".parse().unwrap(),
            indexer_url: "http://127.0.0.1:3000".parse().unwrap(),
            facet_rpc_url: "http://127.0.0.1:8546".parse().unwrap(),
            inbox: facet::FACET_INBOX_ADDRESS,
            backoff: Backoff::new(3, Duration::from_millis(10)),
        }
    }

    /// An indexer which knows every transaction, and checks that it was asked about the L1
    /// transaction it expects to carry a Facet envelope.
    #[derive(Debug)]
    struct EchoIndexer<M> {
        l1: Arc<M>,
    }

    #[async_trait]
    impl<M> IndexerClient for EchoIndexer<M>
    where
        M: Middleware + 'static,
    {
        async fn lookup(&self, l1_tx_hash: H256) -> Result<Lookup> {
            let tx = self
                .l1
                .get_transaction(l1_tx_hash)
                .await
                .map_err(|err| Error::Indexer {
                    message: err.to_string(),
                })?
                .unwrap();
            let envelope = FacetTxEnvelope::decode(&tx.input).unwrap();
            assert_eq!(envelope.facet_chain_id, L1Network::Sepolia.facet_chain_id());

            let mut record: FacetTransaction = serde_json::from_str(FIXTURE).unwrap();
            record.eth_transaction_hash = l1_tx_hash;
            record.gas_limit = envelope.request.gas_limit;
            Ok(Lookup::Found(Box::new(record)))
        }
    }

    #[async_std::test]
    async fn test_unsupported_l1() {
        let (provider, mock) = Provider::mocked();
        mock.push::<U256, _>(U256::from(31337)).unwrap();
        let client = FacetClient::with_parts(
            config(L1Network::Sepolia),
            Arc::new(provider),
            HttpIndexer::new("http://127.0.0.1:3000".parse().unwrap()),
        );

        let request = FacetTxRequest::builder().gas_limit(21_000).build().unwrap();
        let err = client.send_facet_transaction(&request).await.unwrap_err();
        assert!(
            matches!(
                err,
                Error::Facet {
                    source: facet::Error::UnsupportedChain { chain_id: 31337 }
                }
            ),
            "{err}"
        );
    }

    #[async_std::test]
    #[cfg_attr(not(feature = "slow-tests"), ignore)]
    async fn test_send_facet_transaction() {
        let anvil = Anvil::new()
            .chain_id(L1Network::Sepolia.chain_id())
            .spawn();
        let provider = Provider::<Http>::try_from(anvil.endpoint()).unwrap();
        let wallet = LocalWallet::from(anvil.keys()[0].clone())
            .with_chain_id(L1Network::Sepolia.chain_id());
        let l1 = Arc::new(SignerMiddleware::new(provider, wallet));

        let client = FacetClient::with_parts(
            config(L1Network::Sepolia),
            l1.clone(),
            EchoIndexer { l1: l1.clone() },
        );
        assert_eq!(client.address(), Some(anvil.addresses()[0]));

        let request = FacetTxRequest::builder()
            .gas_limit(123_456)
            .data(vec![0x60, 0x80, 0x60, 0x40])
            .build()
            .unwrap();
        let tx = client.send_facet_transaction(&request).await.unwrap();
        assert_eq!(tx.gas_limit, 123_456);
        assert!(tx.facet_transaction_receipt.is_success());
    }
}
