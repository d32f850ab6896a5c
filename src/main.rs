use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Arg, ArgMatches, Command};
use rust_decimal::Decimal;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use near_swap_agent::config::Config;
use near_swap_agent::intents::chat::ChatMessage;
use near_swap_agent::intents::{
    OneClickClient, QuoteOptions, QuoteOutcome, QuoteService, SwapAgent, SwapError, SwapStatusTracker,
    TradeNormalizer, Quoter, TransactionSigner,
};
use near_swap_agent::intents::presentation::{progress_bar, progress_percent};
use near_swap_agent::intents::traits::SignAndSendRequest;
use near_swap_agent::mocks::{self, MockQuoteService, MockSigner};
use near_swap_agent::types::TradeIntent;

/// Stands in for a wallet when none is connected
struct DisconnectedSigner;

#[async_trait]
impl TransactionSigner for DisconnectedSigner {
    async fn sign_and_send_transactions(&self, _request: SignAndSendRequest) -> Result<serde_json::Value, SwapError> {
        Err(SwapError::TransferRejected(
            "no wallet connected; send the funds manually or run with API_MODE=mock".to_string(),
        ))
    }
}

fn trade_args(command: Command) -> Command {
    command
        .arg(Arg::new("amount").long("amount").value_name("AMOUNT").required(true).help("Amount of the origin asset"))
        .arg(Arg::new("from").long("from").value_name("SYMBOL").required(true).help("Origin asset symbol"))
        .arg(Arg::new("to").long("to").value_name("SYMBOL").required(true).help("Destination asset symbol"))
        .arg(Arg::new("chain").long("chain").value_name("CHAIN").help("Preferred chain for asset lookup"))
        .arg(Arg::new("refund-to").long("refund-to").value_name("ACCOUNT").help("Refund address"))
        .arg(Arg::new("recipient").long("recipient").value_name("ACCOUNT").help("Recipient address"))
}

fn cli() -> Command {
    Command::new("swap-agent")
        .version(env!("CARGO_PKG_VERSION"))
        .about("🔄 NEAR swap agent - quote, execute and track cross-chain swaps")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Config file path")
                .default_value("config/default.toml")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .default_value("info")
                .global(true),
        )
        .subcommand(trade_args(
            Command::new("quote")
                .about("Request a quote without executing it")
                .arg(
                    Arg::new("executable")
                        .long("executable")
                        .help("Ask for a real deposit address instead of a dry quote")
                        .action(clap::ArgAction::SetTrue),
                ),
        ))
        .subcommand(
            Command::new("track")
                .about("Track the swap behind a deposit address")
                .arg(Arg::new("deposit-address").required(true).value_name("ADDRESS")),
        )
        .subcommand(trade_args(
            Command::new("swap")
                .about("Quote, confirm and execute a swap, then track it")
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help("Confirm without prompting")
                        .action(clap::ArgAction::SetTrue),
                ),
        ))
}

fn trade_from_args(matches: &ArgMatches) -> Result<(TradeIntent, QuoteOptions)> {
    let amount_text = matches.get_one::<String>("amount").map(String::as_str).unwrap_or_default();
    let amount = Decimal::from_str(amount_text).with_context(|| format!("invalid amount: {}", amount_text))?;
    let from = matches.get_one::<String>("from").map(String::as_str).unwrap_or_default();
    let to = matches.get_one::<String>("to").map(String::as_str).unwrap_or_default();

    let mut intent = TradeIntent::new(amount, from, to);
    if let Some(chain) = matches.get_one::<String>("chain") {
        intent = intent.on_chain(chain);
    }

    let options = QuoteOptions {
        refund_to: matches.get_one::<String>("refund-to").cloned(),
        recipient: matches.get_one::<String>("recipient").cloned(),
        ..Default::default()
    };
    Ok((intent, options))
}

fn print_message(message: &ChatMessage) {
    println!("\n{}", message.content);
}

fn build_services(config: &Config) -> Result<(Arc<dyn QuoteService>, Arc<dyn TransactionSigner>)> {
    if mocks::is_mock_mode() {
        warn!("🎭 API_MODE=mock - using simulated quote service and wallet");
        return Ok((Arc::new(MockQuoteService::from_env()), Arc::new(MockSigner::from_env())));
    }

    if config.api.jwt_token.is_none() {
        warn!("⚠️ ONE_CLICK_JWT is not set; the quote service may reject requests");
    }
    let client = OneClickClient::from_config(&config.api).context("failed to create quote client")?;
    Ok((Arc::new(client), Arc::new(DisconnectedSigner)))
}

async fn load_config(path: &str) -> Result<Config> {
    let mut config = if Path::new(path).exists() {
        info!("📋 Loading config: {}", path);
        Config::load(path).await?
    } else {
        warn!("📋 {} not found, using defaults", path);
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    if mocks::is_mock_mode() {
        config.tracking.poll_interval_ms = config.tracking.poll_interval_ms.min(1_000);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run_quote(config: &Config, service: Arc<dyn QuoteService>, matches: &ArgMatches) -> Result<()> {
    let (intent, mut options) = trade_from_args(matches)?;
    if matches.get_flag("executable") {
        options.dry = Some(false);
    }

    let normalizer = TradeNormalizer::new(Arc::new(config.asset_registry()), config.quote.clone());
    let quoter = Quoter::new(normalizer, service, config.quote.quote_deadline_secs);

    let outcome = quoter.request_quote(Some(&intent), &options).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let QuoteOutcome::Failed { error, .. } = outcome {
        anyhow::bail!("quote failed: {}", error);
    }
    Ok(())
}

async fn run_track(config: &Config, service: Arc<dyn QuoteService>, deposit_address: &str) -> Result<()> {
    let tracker = SwapStatusTracker::new(service);
    let (handle, mut stream) = tracker.start_tracking(deposit_address, config.tracking.options())?;

    let stopper = handle.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupted, stopping tracker");
            stopper.stop();
        }
    });

    while let Some(update) = stream.recv().await {
        let info = update.status_info();
        println!(
            "[{}] {} {} - {}",
            update.attempts,
            progress_bar(progress_percent(update.status()), 20),
            info.title,
            info.message
        );
    }

    info!("🏁 Tracking finished after {} attempts", handle.attempts());
    Ok(())
}

fn ask_confirmation() -> Result<bool> {
    print!("\nConfirm this swap? [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn run_swap(
    config: &Config,
    service: Arc<dyn QuoteService>,
    signer: Arc<dyn TransactionSigner>,
    matches: &ArgMatches,
) -> Result<()> {
    let (intent, options) = trade_from_args(matches)?;
    let mut agent = SwapAgent::new(config, service, signer);

    let mut printed = 0;
    let outcome = agent.propose_trade(intent, options).await?;
    for message in &agent.transcript().messages()[printed..] {
        print_message(message);
    }
    printed = agent.transcript().len();

    if !outcome.is_success() {
        anyhow::bail!("no quote available");
    }

    let confirmed = matches.get_flag("yes") || ask_confirmation()?;
    if confirmed {
        agent.confirm().await?;
    } else {
        agent.cancel()?;
    }
    for message in &agent.transcript().messages()[printed..] {
        print_message(message);
    }
    printed = agent.transcript().len();

    if let Some(handle) = agent.tracking_handle().cloned() {
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("🛑 Interrupted, stopping tracker");
                handle.stop();
            }
        });

        agent.follow_tracking().await;
        for message in &agent.transcript().messages()[printed..] {
            print_message(message);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let log_filter = match matches.get_one::<String>("log-level").map(String::as_str) {
        Some(level @ ("trace" | "debug" | "info" | "warn" | "error")) => level.to_string(),
        _ => "info".to_string(),
    };

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config/default.toml");
    let config = load_config(config_path).await?;
    let (service, signer) = build_services(&config)?;

    let result = match matches.subcommand() {
        Some(("quote", sub)) => run_quote(&config, service, sub).await,
        Some(("track", sub)) => {
            let address = sub.get_one::<String>("deposit-address").map(String::as_str).unwrap_or_default();
            run_track(&config, service, address).await
        }
        Some(("swap", sub)) => run_swap(&config, service, signer, sub).await,
        _ => Ok(()),
    };

    if let Err(e) = &result {
        error!("❌ {:#}", e);
    }
    result
}
