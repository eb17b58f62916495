use std::{io::Write, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use launchpad_common::{
    models::{parse_address, Chain, ContractAddresses, PoolCreationRequest, RunContext},
    traits::{ChainStateReader, Signer},
    Address, U256,
};
use launchpad_ethereum::{EthereumRpcClient, JsonRpcSigner, RPCRetryConfig, RpcChainStateReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_appender::rolling;

use crate::{
    config::OrchestratorConfig,
    executor::TransactionExecutor,
    orchestrator::{Orchestrator, RunState},
};

/// Launchpad CLI - Launches a constant-product liquidity pool for a freshly deployed token
///
/// Approves the router, creates the pair and seeds it with the first liquidity. Every run reads
/// the ledger first, so an interrupted launch is resumed by running the same command again.
#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct CliArgs {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// Execute every outstanding step and print each state transition as a JSON line.
    Launch(LaunchArgs),
    /// Read the ledger once and print the step a launch would execute next.
    Plan(LaunchArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
struct LaunchArgs {
    /// JSON-RPC endpoint. It signs on behalf of `--from`, e.g. a node with an unlocked account.
    #[clap(long, env = "RPC_URL")]
    rpc_url: String,

    /// Account that owns the tokens and signs every step.
    #[clap(long, env = "LAUNCHPAD_FROM", value_parser = parse_address)]
    from: Address,

    /// The token to launch.
    #[clap(long, value_parser = parse_address)]
    token: Address,

    /// Token amount to deposit, in the token's smallest unit.
    #[clap(long, value_parser = parse_amount)]
    token_amount: U256,

    /// Native amount to deposit, in wei.
    #[clap(long, value_parser = parse_amount)]
    native_amount: U256,

    /// Receiver of the LP tokens. Defaults to `--from`.
    #[clap(long, value_parser = parse_address)]
    recipient: Option<Address>,

    /// Tolerated price movement in basis points.
    #[clap(long, default_value = "500")]
    slippage_bps: u16,

    /// Seconds after the latest block until the liquidity deposit expires.
    #[clap(long, default_value = "1200")]
    deadline_secs: u64,

    /// Pool fee tier. Informational for constant-product factories.
    #[clap(long, default_value = "3000")]
    fee_tier: u32,

    /// The chain to launch on. Detected through `eth_chainId` if omitted.
    #[clap(short = 'c', long)]
    chain: Option<String>,

    /// Overrides the pair factory address.
    #[clap(long, value_parser = parse_address)]
    factory: Option<Address>,

    /// Overrides the router address.
    #[clap(long, value_parser = parse_address)]
    router: Option<Address>,

    /// Overrides the wrapped native asset address.
    #[clap(long, value_parser = parse_address)]
    wrapped_native: Option<Address>,

    /// Seconds to wait for a submitted transaction to be included.
    #[clap(long, default_value = "180")]
    confirmation_timeout_secs: u64,

    /// Milliseconds between two inclusion polls.
    #[clap(long, default_value = "2000")]
    poll_interval_ms: u64,

    /// Retries of a failed read request before giving up.
    #[clap(long, default_value = "3")]
    max_rpc_retries: usize,

    /// Logging folder path.
    #[clap(long, default_value = "logs")]
    log_folder: String,

    /// Enable verbose logging.
    #[clap(long)]
    verbose: bool,
}

fn parse_amount(value: &str) -> Result<U256, String> {
    U256::from_str(value.trim()).map_err(|e| format!("Invalid amount {value}: {e}"))
}

impl LaunchArgs {
    fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be positive".to_string());
        }
        if self.confirmation_timeout_secs == 0 {
            return Err("confirmation_timeout_secs must be positive".to_string());
        }
        if let Some(chain) = &self.chain {
            Chain::from_str(chain).map_err(|_| format!("Unsupported chain: {chain}"))?;
        }
        Ok(())
    }

    /// Contract addresses of `chain`, with the overrides applied. Without a known chain all three
    /// overrides are required.
    fn addresses(&self, chain: Option<Chain>) -> Result<ContractAddresses, String> {
        let base = match (chain, self.factory, self.router, self.wrapped_native) {
            (Some(chain), ..) => ContractAddresses::for_chain(chain),
            (None, Some(factory), Some(router), Some(wrapped_native)) => {
                return Ok(ContractAddresses::new(factory, router, wrapped_native));
            }
            (None, ..) => {
                return Err("Unknown chain: pass --chain or all of --factory, --router and \
                            --wrapped-native"
                    .to_string());
            }
        };

        let mut addresses = base;
        if let Some(factory) = self.factory {
            addresses = addresses.with_factory(factory);
        }
        if let Some(router) = self.router {
            addresses = addresses.with_router(router);
        }
        if let Some(wrapped_native) = self.wrapped_native {
            addresses = addresses.with_wrapped_native(wrapped_native);
        }
        Ok(addresses)
    }

    fn request(&self, addresses: &ContractAddresses) -> PoolCreationRequest {
        PoolCreationRequest::new(
            self.token,
            addresses.wrapped_native,
            self.token_amount,
            self.native_amount,
        )
        .with_slippage_bps(self.slippage_bps)
        .with_deadline_offset_secs(self.deadline_secs)
        .with_fee_tier(self.fee_tier)
    }

    fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::default()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_confirmation_timeout(Duration::from_secs(self.confirmation_timeout_secs))
    }
}

impl Command {
    fn args(&self) -> &LaunchArgs {
        match self {
            Command::Launch(args) | Command::Plan(args) => args,
        }
    }
}

pub async fn run_cli() -> anyhow::Result<()> {
    // Parse CLI Args
    let cli: CliArgs = CliArgs::parse();
    let args = cli.command.args();
    args.validate()
        .map_err(|e| anyhow!(e))?;

    // Setup Logging. Stdout carries the JSON output, logs go to a file.
    let log_level = if args.verbose { "debug" } else { "info" };
    let (non_blocking, _guard) =
        tracing_appender::non_blocking(rolling::never(&args.log_folder, "launchpad.log"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(non_blocking)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set up logging subscriber")?;

    let client = EthereumRpcClient::new(&args.rpc_url)?.with_retry(RPCRetryConfig {
        max_retries: args.max_rpc_retries,
        ..Default::default()
    });

    let chain = match &args.chain {
        Some(chain) => Some(Chain::from_str(chain)?),
        None => {
            let chain_id = client
                .chain_id()
                .await
                .context("Failed to detect chain")?;
            let chain = Chain::from_chain_id(chain_id);
            if chain.is_none() {
                warn!(chain_id, "No known deployment for chain");
            }
            chain
        }
    };
    let addresses = args
        .addresses(chain)
        .map_err(|e| anyhow!(e))?;
    info!(?chain, ?addresses, "Resolved contract addresses");

    let mut ctx = RunContext::new(args.from, addresses);
    if let Some(recipient) = args.recipient {
        ctx = ctx.with_recipient(recipient);
    }
    let request = args.request(&addresses);
    let config = args.orchestrator_config();

    let reader = RpcChainStateReader::new(client.clone());
    let signer = JsonRpcSigner::new(client, args.from);
    let executor = TransactionExecutor::from_config(signer, &config);
    let mut orchestrator = Orchestrator::new(reader, executor, ctx, config);

    match &cli.command {
        Command::Plan(_) => {
            let next_step = orchestrator.preview(&request).await?;
            println!("{}", serde_json::json!({ "next_step": next_step }));
            Ok(())
        }
        Command::Launch(_) => launch(&mut orchestrator, &request).await,
    }
}

async fn launch<R, S>(
    orchestrator: &mut Orchestrator<R, S>,
    request: &PoolCreationRequest,
) -> anyhow::Result<()>
where
    R: ChainStateReader,
    S: Signer,
{
    let printer = tokio::spawn(print_states(orchestrator.subscribe(), std::io::stdout()));

    let result = orchestrator.run(request).await;
    if let Err(e) = printer.await {
        warn!(error = %e, "State printer stopped unexpectedly");
    }

    match result {
        Ok(report) => {
            for record in &report.records {
                info!(
                    step = %record.step,
                    handle = %record.handle,
                    outcome = ?record.outcome,
                    "Launch step"
                );
            }
            Ok(())
        }
        Err(e) => bail!("Launch failed ({}): {e}", e.kind()),
    }
}

/// Writes every state published on `states` to `out` as a JSON line, until a final state.
///
/// A state equal to the previous line is skipped; `run` re-publishes `Idle` on start.
async fn print_states<W>(mut states: watch::Receiver<RunState>, mut out: W) -> W
where
    W: Write + Send,
{
    let mut last: Option<RunState> = None;
    loop {
        let state = states.borrow_and_update().clone();
        if last.as_ref() != Some(&state) {
            match serde_json::to_string(&state) {
                Ok(line) => {
                    if let Err(e) = writeln!(out, "{line}") {
                        warn!(error = %e, "Failed to write run state");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to serialize run state"),
            }
        }
        let done = state.is_final();
        last = Some(state);
        if done || states.changed().await.is_err() {
            return out;
        }
    }
}
