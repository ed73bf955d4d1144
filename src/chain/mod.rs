pub mod explorer;
pub mod failover;
pub mod rpc;
pub mod types;

pub use explorer::ExplorerClient;
pub use failover::Endpoint;
pub use rpc::RpcClient;
pub use types::{ActivitySnapshot, History, TokenTransfer, Transaction};

use futures::future::BoxFuture;
use tracing::{info_span, warn, Instrument};

use crate::address::Address;
use crate::error::FetchError;

/// Anything that can produce an [`ActivitySnapshot`] for an address.
///
/// The HTTP layer only talks to this trait, so handlers can be exercised
/// against canned snapshots.
pub trait ActivitySource: Send + Sync {
    fn snapshot<'a>(&'a self, address: &'a Address)
        -> BoxFuture<'a, Result<ActivitySnapshot, FetchError>>;
}

/// ERC-20 token whose balance and transfers feed the score.
#[derive(Debug, Clone)]
pub struct Stablecoin {
    pub contract: Address,
    pub decimals: u32,
}

/// Reads snapshots from JSON-RPC nodes and, in history mode, an explorer.
#[derive(Debug, Clone)]
pub struct ChainFetcher {
    rpc: RpcClient,
    /// `Some` switches the fetcher into history mode
    explorer: Option<ExplorerClient>,
    stablecoin: Option<Stablecoin>,
}

impl ChainFetcher {
    pub fn new(
        rpc: RpcClient,
        explorer: Option<ExplorerClient>,
        stablecoin: Option<Stablecoin>,
    ) -> Self {
        Self {
            rpc,
            explorer,
            stablecoin,
        }
    }

    pub fn uses_history(&self) -> bool {
        self.explorer.is_some()
    }

    /// Fetch every fact concurrently.
    ///
    /// Transaction count, balance and (in history mode) the explorer history
    /// are required; the first of them to be exhausted fails the request.
    /// Stablecoin balance and contract code fall back to zero and `false`.
    pub async fn fetch_snapshot(&self, address: &Address) -> Result<ActivitySnapshot, FetchError> {
        let (tx_count, balance, stablecoin_balance, has_code, history) = tokio::join!(
            self.rpc.transaction_count(address),
            self.rpc.balance(address),
            self.stablecoin_balance(address),
            self.rpc.has_code(address),
            self.history(address),
        );

        let tx_count = tx_count?;
        let native_balance = balance? / 1e18;
        let history = history?;

        let has_code = has_code.unwrap_or_else(|e| {
            warn!(error = %e, "contract code unavailable, assuming none");
            false
        });
        let stablecoin_balance = stablecoin_balance.unwrap_or_else(|e| {
            warn!(error = %e, "stablecoin balance unavailable, assuming zero");
            0.0
        });

        Ok(ActivitySnapshot {
            tx_count,
            native_balance,
            stablecoin_balance,
            has_code,
            history,
        })
    }

    async fn stablecoin_balance(&self, address: &Address) -> Result<f64, FetchError> {
        let Some(stablecoin) = &self.stablecoin else {
            return Ok(0.0);
        };
        let raw = self.rpc.token_balance(&stablecoin.contract, address).await?;
        Ok(raw / 10f64.powi(stablecoin.decimals as i32))
    }

    async fn history(&self, address: &Address) -> Result<Option<History>, FetchError> {
        let Some(explorer) = &self.explorer else {
            return Ok(None);
        };

        let transfers = async {
            match &self.stablecoin {
                Some(stablecoin) => explorer.token_transfers(address, &stablecoin.contract).await,
                None => Ok(Vec::new()),
            }
        };
        let (transactions, token_transfers) =
            tokio::try_join!(explorer.transactions(address), transfers)?;

        Ok(Some(History {
            transactions,
            token_transfers,
        }))
    }
}

impl ActivitySource for ChainFetcher {
    fn snapshot<'a>(
        &'a self,
        address: &'a Address,
    ) -> BoxFuture<'a, Result<ActivitySnapshot, FetchError>> {
        let span = info_span!("snapshot", address = %address);
        Box::pin(self.fetch_snapshot(address).instrument(span))
    }
}
