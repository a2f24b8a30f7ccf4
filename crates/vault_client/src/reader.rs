//! Fetches and decodes on-chain account state. Nothing here is cached: every
//! decision starts from a fresh read, because the chain (or another client)
//! may have moved underneath us. Independent reads for one decision are
//! issued concurrently and joined.

use std::sync::Arc;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;
use vault_codec::{dmd_schema, BuyerState, Schema, VaultConfig};

use crate::assembler::AccountSnapshot;
use crate::config::ProgramConfig;
use crate::error::ClientError;

pub struct VaultReader {
    rpc: Arc<RpcClient>,
    cfg: ProgramConfig,
    schema: Schema,
}

impl VaultReader {
    pub fn new(rpc: Arc<RpcClient>, cfg: ProgramConfig) -> Self {
        Self {
            rpc,
            cfg,
            schema: dmd_schema(),
        }
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.cfg
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(|e| ClientError::Rpc(format!("read of {address} failed: {e}")))?;
        Ok(response.value.map(|account| account.data))
    }

    /// The vault configuration, or `NotFound` when the program was never
    /// initialized on this cluster.
    pub async fn vault_config(&self) -> Result<VaultConfig, ClientError> {
        let address = self.cfg.vault();
        match self.account_data(&address).await? {
            Some(data) => Ok(VaultConfig::decode(&self.schema, &data)?),
            None => Err(ClientError::NotFound(address)),
        }
    }

    /// Buyer state, or `NotFound`, which callers must read as "this wallet
    /// has not interacted with the program yet", not as an error.
    pub async fn buyer_state(&self, wallet: &Pubkey) -> Result<BuyerState, ClientError> {
        let address = self.cfg.buyer_state(wallet);
        match self.account_data(&address).await? {
            Some(data) => Ok(BuyerState::decode(&self.schema, &data)?),
            None => Err(ClientError::NotFound(address)),
        }
    }

    pub async fn holding_exists(&self, address: &Pubkey) -> Result<bool, ClientError> {
        Ok(self.account_data(address).await?.is_some())
    }

    pub async fn balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        self.rpc
            .get_balance(address)
            .await
            .map_err(|e| ClientError::Rpc(format!("balance of {address} failed: {e}")))
    }

    pub async fn treasury_lamports(&self) -> Result<u64, ClientError> {
        self.balance(&self.cfg.treasury).await
    }

    /// Everything the assembler needs for one action, fetched in a single
    /// fan-out. Serial round trips here would make every button feel broken.
    pub async fn snapshot_for(&self, wallet: &Pubkey) -> Result<AccountSnapshot, ClientError> {
        let buyer_holding = self.cfg.holding(wallet);
        let vault_holding = self.cfg.vault_holding();

        let (vault, buyer, buyer_holding_exists, vault_holding_exists) = tokio::try_join!(
            self.optional(self.vault_config()),
            self.optional(self.buyer_state(wallet)),
            self.holding_exists(&buyer_holding),
            self.holding_exists(&vault_holding),
        )?;

        debug!(
            vault = vault.is_some(),
            buyer = buyer.is_some(),
            buyer_holding_exists,
            vault_holding_exists,
            "snapshot"
        );
        Ok(AccountSnapshot {
            vault,
            buyer,
            buyer_holding_exists,
            vault_holding_exists,
        })
    }

    /// `NotFound` is an expected answer inside a snapshot; everything else
    /// still propagates.
    async fn optional<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, ClientError>>,
    ) -> Result<Option<T>, ClientError> {
        match fut.await {
            Ok(value) => Ok(Some(value)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
