use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cosmos_tx_engine::chain::{
    ChainApi, Coin, EncodeObject, LocalWallet, RestClient, Wallet, WalletProvider,
    WsTracerConnector,
};
use cosmos_tx_engine::config::{ChainConfig, Config};
use cosmos_tx_engine::tx::{ConfirmationTracer, TimeoutHeightResolver, TxFee};
use cosmos_tx_engine::{TxCallbacks, TxOrchestrator, TxRequest};

#[derive(Parser)]
#[command(name = "txengine")]
#[command(about = "Cosmos transaction lifecycle engine", version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "txengine.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "txengine.toml")]
        output: String,
    },

    /// Show account number and sequence
    Account {
        /// Chain id or name
        #[arg(long)]
        chain: String,
        address: String,
    },

    /// Show the timeout height a transaction signed now would carry
    TimeoutHeight {
        /// Chain id or name
        chain: String,
    },

    /// Simulate a bank send and print the fee
    Estimate {
        #[command(flatten)]
        send: SendArgs,
    },

    /// Sign, broadcast and trace a bank send
    Send {
        #[command(flatten)]
        send: SendArgs,

        /// Skip simulation and use this gas limit
        #[arg(long)]
        gas: Option<u64>,

        /// Fee amount in the chain's fee denom, used with --gas
        #[arg(long, requires = "gas")]
        fee: Option<u128>,
    },

    /// Wait for a transaction to be included
    Trace {
        /// Chain id or name
        chain: String,
        /// Transaction hash (hex)
        hash: String,
    },
}

#[derive(clap::Args)]
struct SendArgs {
    /// Chain id or name
    #[arg(long)]
    chain: String,

    /// Recipient address
    #[arg(long)]
    to: String,

    /// Amount in the smallest unit
    #[arg(long)]
    amount: u128,

    /// Denom to send, defaults to the chain's first fee token
    #[arg(long)]
    denom: Option<String>,

    #[arg(long, default_value = "")]
    memo: String,

    /// Mnemonic of the sending account
    #[arg(long, env = "TXENGINE_MNEMONIC", hide_env_values = true)]
    mnemonic: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cosmos_tx_engine=info,txengine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output } => {
            let config = Config::default();
            config.save(&output)?;
            info!("Configuration file created at: {}", output);
        }
        Commands::Account { chain, address } => {
            let config = load_config(&cli.config)?;
            let chain = find_chain(&config, &chain)?;
            let client = RestClient::new(config.client_config())?;
            match client.account(&chain.rest, &address).await? {
                Some(account) => {
                    info!("Account: {}", account.address);
                    info!("Account number: {}", account.account_number);
                    info!("Sequence: {}", account.sequence);
                }
                None => bail!("Account {} does not exist on {}", address, chain.chain_id),
            }
        }
        Commands::TimeoutHeight { chain } => {
            let config = load_config(&cli.config)?;
            let chain = find_chain(&config, &chain)?;
            let resolver = TimeoutHeightResolver::new(Arc::new(RestClient::new(config.client_config())?));
            let height = resolver.resolve(Some(&chain.rpc)).await;
            info!("Timeout height for {}: {}", chain.chain_id, height);
        }
        Commands::Estimate { send } => {
            let config = load_config(&cli.config)?;
            let (orchestrator, wallet, chain) = build_orchestrator(&config, &send)?;
            let messages = vec![bank_send(wallet.as_ref(), &chain, &send)?];
            let fee = orchestrator
                .estimate_fee(&chain.chain_id, &messages, None, &send.memo)
                .await?;
            info!("Gas limit: {}", fee.gas);
            for coin in &fee.amount {
                info!("Fee: {}{}", coin.amount, coin.denom);
            }
        }
        Commands::Send { send, gas, fee } => {
            let config = load_config(&cli.config)?;
            let (orchestrator, wallet, chain) = build_orchestrator(&config, &send)?;
            let messages = vec![bank_send(wallet.as_ref(), &chain, &send)?];

            let mut request = TxRequest::new(&chain.chain_id, "send", messages).with_memo(&send.memo);
            if let Some(gas) = gas {
                let amount = match fee {
                    Some(fee) => vec![Coin::new(fee.to_string(), fee_denom(&chain)?)],
                    None => vec![],
                };
                request = request.with_fee(TxFee::new(gas.to_string(), amount).forced());
            }

            let callbacks = TxCallbacks::new()
                .on_broadcasted(|hash| info!("Broadcast: {}", hex::encode_upper(hash)));
            let tx = orchestrator.sign_and_broadcast(request, callbacks).await?;

            info!("Included at height {}", tx.height);
            info!("Gas used: {} / {}", tx.gas_used, tx.gas_wanted);
            if !tx.is_success() {
                bail!("Transaction {} failed with code {}: {}", tx.transaction_hash, tx.code, tx.raw_log);
            }
            info!("Transaction {} succeeded", tx.transaction_hash);
        }
        Commands::Trace { chain, hash } => {
            let config = load_config(&cli.config)?;
            let chain = find_chain(&config, &chain)?;
            let hash = hex::decode(hash.trim()).context("Transaction hash must be hex")?;

            let tracer = ConfirmationTracer::new(Arc::new(WsTracerConnector));
            let tx = tracer.confirm(Some(&chain.rpc), &hash).await?;
            info!("Transaction {} included at height {}", tx.transaction_hash, tx.height);
            info!("Code: {}", tx.code);
            if !tx.raw_log.is_empty() {
                info!("Log: {}", tx.raw_log);
            }
        }
    }

    Ok(())
}

fn load_config(path: &str) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load config from {} (run `txengine init`)", path))
}

fn find_chain(config: &Config, chain: &str) -> Result<ChainConfig> {
    match config.chain(chain) {
        Some(chain) => Ok(chain.clone()),
        None => bail!("Chain {} is not configured", chain),
    }
}

fn fee_denom(chain: &ChainConfig) -> Result<String> {
    match chain.fee_tokens.first() {
        Some(token) => Ok(token.denom.clone()),
        None => bail!("Chain {} has no fee token configured", chain.chain_id),
    }
}

fn build_orchestrator(
    config: &Config,
    send: &SendArgs,
) -> Result<(TxOrchestrator, Arc<dyn Wallet>, ChainConfig)> {
    let chain = find_chain(config, &send.chain)?;
    let wallet: Arc<dyn Wallet> = Arc::new(LocalWallet::from_mnemonic(send.mnemonic.trim(), &chain)?);
    info!("Using account {}", wallet.address().unwrap_or_default());

    let mut wallets = std::collections::HashMap::new();
    wallets.insert(chain.chain_id.clone(), wallet.clone());
    let wallets: Arc<dyn WalletProvider> = Arc::new(wallets);

    let orchestrator = TxOrchestrator::from_config(config, wallets)?;
    Ok((orchestrator, wallet, chain))
}

fn bank_send(wallet: &dyn Wallet, chain: &ChainConfig, send: &SendArgs) -> Result<EncodeObject> {
    let denom = match &send.denom {
        Some(denom) => denom.clone(),
        None => fee_denom(chain)?,
    };
    let Some(from) = wallet.address() else {
        bail!("Wallet has no address");
    };

    Ok(EncodeObject::new(
        "/cosmos.bank.v1beta1.MsgSend",
        json!({
            "from_address": from,
            "to_address": send.to,
            "amount": [{ "denom": denom, "amount": send.amount.to_string() }],
        }),
    ))
}
