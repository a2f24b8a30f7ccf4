use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::events::ChainEvent;

/// Creates the event log schema. Dedup is the primary key on the
/// transaction signature.
pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS chain_event (
            signature     TEXT PRIMARY KEY,
            kind          TEXT NOT NULL,
            wallet        TEXT NOT NULL DEFAULT '',
            amount_token  DOUBLE PRECISION NOT NULL DEFAULT 0,
            amount_native DOUBLE PRECISION NOT NULL DEFAULT 0,
            ts            TIMESTAMPTZ NOT NULL,
            is_founder    BOOLEAN NOT NULL DEFAULT FALSE,
            is_treasury   BOOLEAN NOT NULL DEFAULT FALSE
        )",
    )
    .execute(pool)
    .await
    .context("create chain_event")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS chain_event_ts_idx ON chain_event (ts DESC)")
        .execute(pool)
        .await
        .context("create chain_event_ts_idx")?;

    Ok(())
}

/// Appends one event; a repeated signature is silently a no-op.
pub async fn insert_event(pool: &PgPool, event: &ChainEvent) -> Result<()> {
    sqlx::query(
        "INSERT INTO chain_event
            (signature, kind, wallet, amount_token, amount_native, ts, is_founder, is_treasury)
         VALUES ($1, $2, $3, $4, $5, to_timestamp($6 / 1000.0), $7, $8)
         ON CONFLICT (signature) DO NOTHING",
    )
    .bind(&event.signature)
    .bind(event.kind.as_str())
    .bind(&event.wallet)
    .bind(event.amount_token)
    .bind(event.amount_native)
    .bind(event.timestamp_ms as f64)
    .bind(event.is_founder)
    .bind(event.is_treasury)
    .execute(pool)
    .await
    .context("insert chain_event")?;
    Ok(())
}
