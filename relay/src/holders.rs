use std::sync::Arc;

use anyhow::{Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use tokio::task::JoinSet;

use crate::http_handler::HolderEntry;

/// Largest holders of the mint. Amounts come back already scaled by the
/// mint's on-chain decimals; nothing here assumes a fixed scale.
pub async fn top_holders(
    rpc: &Arc<RpcClient>,
    mint: &Pubkey,
    limit: usize,
) -> Result<Vec<HolderEntry>> {
    let largest = rpc
        .get_token_largest_accounts(mint)
        .await
        .context("largest token accounts")?;

    let mut set = JoinSet::new();
    for (rank, balance) in largest.into_iter().take(limit).enumerate() {
        let rpc = rpc.clone();
        set.spawn(async move {
            let address = Pubkey::from_str(&balance.address).ok()?;
            let account = rpc.get_account(&address).await.ok()?;
            let token_account = spl_token::state::Account::unpack(&account.data).ok()?;
            Some((
                rank,
                HolderEntry {
                    owner: token_account.owner.to_string(),
                    amount: balance.amount.ui_amount.unwrap_or(0.0),
                },
            ))
        });
    }

    let mut ranked = Vec::new();
    while let Some(joined) = set.join_next().await {
        if let Ok(Some(entry)) = joined {
            ranked.push(entry);
        }
    }
    ranked.sort_by_key(|(rank, _)| *rank);
    Ok(ranked.into_iter().map(|(_, entry)| entry).collect())
}
