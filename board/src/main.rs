//! Investor board CLI: reads vault and buyer state, reconciles the advisory
//! price, and drives buy / claim / swap / whitelist actions against the
//! program. Every action re-reads chain state immediately before planning;
//! nothing is cached across attempts.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use price_engine::{format_usd, EngineConfig, PriceEngine, PricingInput};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::{read_keypair_file, Keypair};
use solana_sdk::signer::Signer;
use tracing_subscriber::EnvFilter;
use vault_client::{
    fetch_events, parse_sol_amount, parse_ui_amount, sign_and_submit, Assembler, ClientError,
    Intent, ProgramConfig, VaultReader, DEFAULT_FOUNDER, DEFAULT_MINT, DEFAULT_PROGRAM_ID,
    DEFAULT_TREASURY,
};

#[derive(Parser, Debug)]
#[command(name = "board", about = "DMD investor board")]
struct Args {
    #[arg(long, env = "RPC_URL")]
    rpc_url: String,

    #[arg(long, env = "PROGRAM_ID", default_value = DEFAULT_PROGRAM_ID)]
    program_id: String,

    #[arg(long, env = "DMD_MINT", default_value = DEFAULT_MINT)]
    mint: String,

    #[arg(long, env = "TREASURY_PUBKEY", default_value = DEFAULT_TREASURY)]
    treasury: String,

    #[arg(long, env = "FOUNDER_PUBKEY", default_value = DEFAULT_FOUNDER)]
    founder: String,

    /// Path to the acting wallet's keypair file.
    #[arg(long, env = "WALLET_KEYPAIR")]
    wallet: Option<String>,

    /// Relay base URL for the event feed (optional).
    #[arg(long, env = "RELAY_URL")]
    relay_url: Option<String>,

    #[arg(long, env = "PYTH_SOL_USD_ID")]
    pyth_feed_id: Option<String>,

    #[arg(long, env = "DEX_PAIR")]
    dex_pair: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Vault state, buyer state, treasury balance and the advisory price.
    Show,
    /// Buy DMD with SOL, e.g. `buy 1.5`.
    Buy { amount_sol: String },
    /// Claim accrued rewards.
    Claim,
    /// Swap an exact SOL amount into DMD.
    SwapIn {
        amount_sol: String,
        #[arg(long)]
        slippage_pct: Option<f64>,
    },
    /// Swap an exact DMD amount back into SOL.
    SwapOut {
        amount_dmd: String,
        #[arg(long)]
        slippage_pct: Option<f64>,
    },
    /// Put this wallet on the whitelist.
    WhitelistSelf,
    /// Founder: initialize the vault.
    Init { initial_price_lamports: u64 },
    /// Founder: set the manual price anchor (lamports per 10k tokens).
    SetPrice { lamports_per_10k: u64 },
    /// Founder: open or close the public sale.
    ToggleSale { active: bool },
    /// Founder: set another wallet's whitelist status.
    WhitelistAdd { wallet: String, status: bool },
    /// Latest events from the relay feed.
    Feed {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let program = ProgramConfig::new(&args.program_id, &args.mint, &args.treasury, &args.founder)
        .context("program configuration")?;

    let rpc = Arc::new(RpcClient::new_with_commitment(
        args.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    ));
    let reader = VaultReader::new(rpc.clone(), program.clone());
    let assembler = Assembler::new(program.clone());

    match &args.command {
        Command::Show => show(&args, &reader).await?,
        Command::Feed { limit } => feed(&args, *limit).await?,
        command => {
            let keypair = load_wallet(&args)?;
            let intent = build_intent(command, &reader).await?;
            execute(&rpc, &reader, &assembler, &keypair, intent).await?;
        }
    }
    Ok(())
}

fn load_wallet(args: &Args) -> Result<Keypair> {
    let path = args
        .wallet
        .as_ref()
        .ok_or_else(|| anyhow!("--wallet is required for this command"))?;
    read_keypair_file(path).map_err(|e| anyhow!("failed to read wallet file {path}: {e}"))
}

/// Maps a CLI command to an intent. Token amounts are scaled by the
/// on-chain `mint_decimals`, read fresh; there is no fixed constant to get
/// out of sync with the program.
async fn build_intent(command: &Command, reader: &VaultReader) -> Result<Intent> {
    Ok(match command {
        Command::Buy { amount_sol } => Intent::Purchase {
            lamports: parse_sol_amount(amount_sol)?,
        },
        Command::Claim => Intent::Claim,
        Command::SwapIn { amount_sol, slippage_pct } => Intent::SwapIn {
            lamports: parse_sol_amount(amount_sol)?,
            slippage_pct: *slippage_pct,
        },
        Command::SwapOut { amount_dmd, slippage_pct } => {
            let vault = reader.vault_config().await?;
            Intent::SwapOut {
                tokens: parse_ui_amount(amount_dmd, vault.mint_decimals)?,
                slippage_pct: *slippage_pct,
            }
        }
        Command::WhitelistSelf => Intent::SelfWhitelist,
        Command::Init { initial_price_lamports } => Intent::Initialize {
            initial_price_lamports: *initial_price_lamports,
        },
        Command::SetPrice { lamports_per_10k } => Intent::SetManualPrice {
            lamports_per_10k: *lamports_per_10k,
        },
        Command::ToggleSale { active } => Intent::TogglePublicSale { active: *active },
        Command::WhitelistAdd { wallet, status } => Intent::WhitelistAdd {
            wallet: vault_client::parse_address(wallet)?,
            status: *status,
        },
        Command::Show | Command::Feed { .. } => unreachable!("handled above"),
    })
}

/// Read fresh state, plan, sign and submit. Submission failures print the
/// program's own message; it usually names the actionable reason.
async fn execute(
    rpc: &Arc<RpcClient>,
    reader: &VaultReader,
    assembler: &Assembler,
    keypair: &Keypair,
    intent: Intent,
) -> Result<()> {
    let wallet = keypair.pubkey();
    println!("wallet: {wallet}");

    let snapshot = reader.snapshot_for(&wallet).await?;
    let plan = match assembler.plan(&wallet, &intent, &snapshot) {
        Ok(plan) => plan,
        Err(err @ (ClientError::Ineligible(_) | ClientError::MissingCosigner(_))) => {
            println!("refused: {err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    println!("plan: {} instruction(s)", plan.instructions.len());

    match sign_and_submit(rpc, &plan, keypair).await {
        Ok(signature) => println!("submitted: {signature}"),
        Err(ClientError::SubmissionFailed(message)) => {
            // Verbatim program/RPC text plus the category.
            println!("submission failed: {message}");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// One concurrent read of everything the board displays.
async fn show(args: &Args, reader: &VaultReader) -> Result<()> {
    let engine = PriceEngine::new(EngineConfig {
        relay_base: args.relay_url.clone(),
        pyth_feed_id: args.pyth_feed_id.clone(),
        allow_coingecko: false,
        dev_spot_usd: None,
    });

    let wallet = match &args.wallet {
        Some(_) => Some(load_wallet(args)?.pubkey()),
        None => None,
    };
    let buyer_fut = async {
        match wallet {
            Some(pk) => Some(reader.buyer_state(&pk).await),
            None => None,
        }
    };

    let (vault, treasury_lamports, buyer) = tokio::join!(
        reader.vault_config(),
        reader.treasury_lamports(),
        buyer_fut,
    );

    let vault = match vault {
        Ok(v) => Some(v),
        Err(ClientError::NotFound(_)) => None,
        Err(err) => return Err(err.into()),
    };
    let treasury_lamports = treasury_lamports.ok();

    match &vault {
        Some(v) => {
            println!("vault owner:        {}", v.owner);
            println!("total supply:       {}", v.total_supply);
            println!("presale sold:       {}", v.presale_sold);
            println!("manual price:       {} lamports / 10k", v.manual_price_lamports_per_10k);
            println!("public sale:        {}", if v.public_sale_active { "open" } else { "closed" });
            println!("mint decimals:      {}", v.mint_decimals);
        }
        None => println!("vault: not initialized on this cluster"),
    }
    match treasury_lamports {
        Some(lamports) => println!("treasury:           {:.4} SOL", lamports as f64 / 1e9),
        None => println!("treasury:           …"),
    }
    match buyer {
        Some(Ok(state)) => {
            println!("whitelisted:        {}", state.whitelisted);
            println!("tracked tokens:     {}", state.total_tokens);
            println!("holding since:      {}", state.holding_since);
            println!("last reward claim:  {}", state.last_reward_claim_at);
        }
        Some(Err(ClientError::NotFound(_))) => {
            println!("buyer state:        none (wallet has not interacted yet)");
        }
        Some(Err(err)) => return Err(err.into()),
        None => {}
    }

    let input = PricingInput {
        lamports_per_10k: vault.as_ref().map(|v| v.manual_price_lamports_per_10k),
        treasury_lamports,
        presale_pool: vault.as_ref().map(|v| v.presale_sold).unwrap_or(0),
        dex_pair: args.dex_pair.clone(),
        ..PricingInput::default()
    };
    let pricing = engine.compute_pricing(&input).await;
    println!("spot SOL/USD:       {}", format_usd(pricing.spot_usd, 2));
    println!("manual USD/DMD:     {}", format_usd(pricing.manual_usd, 8));
    println!("backing USD/DMD:    {}", format_usd(pricing.backing_usd_weighted, 10));
    println!("advisory USD/DMD:   {}", format_usd(pricing.final_usd, 8));
    for note in &pricing.notes {
        println!("  · {note}");
    }
    Ok(())
}

async fn feed(args: &Args, limit: usize) -> Result<()> {
    let Some(base) = &args.relay_url else {
        println!("no relay configured; feed is empty");
        return Ok(());
    };
    let http = reqwest::Client::new();
    let events = fetch_events(&http, base, limit).await;
    if events.is_empty() {
        println!("no events");
    }
    for event in events {
        println!(
            "{}  {:<8}  {:>12.3} SOL  {:>14.0} DMD  {}",
            event.timestamp_ms, event.kind, event.amount_native, event.amount_token,
            event.signature
        );
    }
    Ok(())
}
