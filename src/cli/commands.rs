use crate::api::rest::RestApi;
use crate::cli::interactive::InteractiveConsole;
use crate::config::Config;
use crate::core::{Block, Transaction};
use crate::crypto::hash::Hashable;
use crate::network::BroadcastReport;
use crate::node::{Node, NodeOptions};
use crate::storage::Database;
use crate::LedgerError;
use clap::{Parser, Subcommand};
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

static PICKAXE: Emoji<'_, '_> = Emoji("⛏️ ", "");
static WALLET: Emoji<'_, '_> = Emoji("👛 ", "");
static CHAIN: Emoji<'_, '_> = Emoji("⛓️ ", "");
static CHECK: Emoji<'_, '_> = Emoji("✅ ", "");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "");

#[derive(Parser)]
#[command(name = "blocklinkd")]
#[command(about = "blocklink node - a single-node hash-linked ledger with proof-of-work mining")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Data directory")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "HTTP port; also selects this node's files")]
    pub port: Option<u16>,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub debug: bool,

    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Start,

    /// Wallet management commands
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Send coins from this node's wallet
    Send {
        recipient: String,
        amount: f64,
    },

    /// Mine the pending transactions into a new block
    Mine,

    /// Show a balance (this node's wallet by default)
    Balance {
        participant: Option<String>,
    },

    /// Blockchain information commands
    #[command(subcommand)]
    Chain(ChainCommands),

    /// Peer management commands
    #[command(subcommand)]
    Peers(PeerCommands),

    /// Menu-driven console
    Interactive,
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create and save a new key pair
    Create,

    /// Show the saved public key and its balance
    Show,
}

#[derive(Subcommand)]
pub enum ChainCommands {
    /// Print every block
    Show,

    /// Verify links and proofs of the whole chain
    Validate,

    /// Print the pending transactions
    Pending,

    /// Verify signatures of the pending transactions
    VerifyPending,
}

#[derive(Subcommand)]
pub enum PeerCommands {
    List,
    Add { node: String },
    Remove { node: String },
}

pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging once
    let _ = if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).try_init()
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init()
    };

    let mut config = Config::load(cli.config.as_deref())?;

    // Override config with CLI arguments
    if let Some(port) = cli.port {
        config.node.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.node.data_dir = data_dir;
    }

    let node = Arc::new(open_node(&config)?);

    match cli.command {
        Commands::Start => start_node(config, node).await,
        Commands::Wallet(cmd) => handle_wallet_command(&node, cmd).await,
        Commands::Send { recipient, amount } => send(&node, &recipient, amount).await,
        Commands::Mine => mine(&node).await,
        Commands::Balance { participant } => show_balance(&node, participant.as_deref()).await,
        Commands::Chain(cmd) => handle_chain_command(&node, cmd).await,
        Commands::Peers(cmd) => handle_peer_command(&node, cmd).await,
        Commands::Interactive => InteractiveConsole::new(node).run().await,
    }
}

pub fn open_node(config: &Config) -> crate::Result<Node> {
    let db = Database::new(&config.node.data_dir)?;

    let mut options = NodeOptions::new(config.node_id());
    options.mining_reward = config.mining.reward;
    options.peer_timeout = config.peer_timeout();
    options.bootstrap_peers = config.network.bootstrap_peers.clone();

    Node::open(db, options)
}

async fn start_node(config: Config, node: Arc<Node>) -> anyhow::Result<()> {
    let info = node.chain_info().await;

    println!("🚀 Starting blocklink node {}", style(&info.node_id).bold());
    println!("{}Height: {}", CHAIN, info.height);
    match &info.hosting_node {
        Some(key) => println!("{}Wallet: {}", WALLET, style(key).cyan()),
        None => println!("{}No wallet yet; POST /wallet to create one", WALLET),
    }
    println!("🔗 REST API: http://{}", config.bind_address());

    let api = RestApi::new(node, config.api.clone());

    tokio::select! {
        result = api.start(config.node.port) => {
            result?;
        }
        _ = signal::ctrl_c() => {
            println!("\n🛑 Shutting down blocklink node...");
        }
    }

    println!("✅ Node stopped gracefully.");
    Ok(())
}

async fn handle_wallet_command(node: &Node, cmd: WalletCommands) -> anyhow::Result<()> {
    match cmd {
        WalletCommands::Create => {
            let public_key = node.create_wallet().await?;
            println!("{}Created wallet for node {}", CHECK, node.chain_info().await.node_id);
            println!("Public key: {}", style(public_key).bold().green());
        }

        WalletCommands::Show => match node.balance(None).await {
            Ok((public_key, balance)) => {
                println!("{}Public key: {}", WALLET, style(public_key).bold().green());
                println!("Balance: {:.2}", balance);
            }
            Err(LedgerError::NoWallet) => {
                println!("{}No wallet saved for this node; run 'blocklinkd wallet create'", CROSS);
            }
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}

async fn send(node: &Node, recipient: &str, amount: f64) -> anyhow::Result<()> {
    match node.add_transaction(recipient, amount).await {
        Ok((tx, report)) => {
            println!("{}Queued {} to {}", CHECK, tx.amount, style(&tx.recipient).cyan());
            print_report(&report);
        }
        Err(e) if e.is_rejection() => {
            println!("{}Transaction rejected: {}", CROSS, e);
        }
        Err(e) => return Err(e.into()),
    }

    show_balance(node, None).await
}

async fn mine(node: &Node) -> anyhow::Result<()> {
    let pb = mining_spinner();
    let result = node.mine_block().await;
    pb.finish_and_clear();

    match result {
        Ok((block, report)) => {
            println!("{}Block {} mined! 🎉", PICKAXE, block.index);
            println!("Hash: {}", block.hash());
            println!("Proof: {}", block.proof);
            println!("Transactions: {}", block.transactions.len());
            print_report(&report);
        }
        Err(e @ (LedgerError::NoWallet | LedgerError::MiningCancelled | LedgerError::StaleWork)) => {
            println!("{}Mining failed: {}", CROSS, e);
        }
        Err(e) if e.is_rejection() => {
            println!("{}Mining failed: {}", CROSS, e);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

async fn show_balance(node: &Node, participant: Option<&str>) -> anyhow::Result<()> {
    match node.balance(participant).await {
        Ok((participant, balance)) => {
            println!("Balance of {}: {}", style(participant).cyan(), style(format!("{:6.2}", balance)).bold());
        }
        Err(LedgerError::NoWallet) => println!("{}No wallet loaded", CROSS),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn handle_chain_command(node: &Node, cmd: ChainCommands) -> anyhow::Result<()> {
    match cmd {
        ChainCommands::Show => {
            let chain = node.chain().await;
            println!("{}Blockchain ({} blocks):", CHAIN, chain.len());
            for block in &chain {
                print_block(block);
            }
        }

        ChainCommands::Validate => {
            if node.verify_chain().await {
                println!("{}Chain is valid", CHECK);
            } else {
                println!("{}Chain is invalid", CROSS);
            }
        }

        ChainCommands::Pending => {
            let pending = node.open_transactions().await;
            println!("🗂️  Pending pool: {} transaction(s)", pending.len());
            for tx in &pending {
                print_transaction(tx);
            }
        }

        ChainCommands::VerifyPending => {
            if node.verify_open_transactions().await {
                println!("{}All pending transactions are valid", CHECK);
            } else {
                println!("{}There are invalid pending transactions", CROSS);
            }
        }
    }

    Ok(())
}

async fn handle_peer_command(node: &Node, cmd: PeerCommands) -> anyhow::Result<()> {
    match cmd {
        PeerCommands::List => {
            let peers = node.peer_nodes().await;
            println!("👥 Peers ({}):", peers.len());
            for peer in peers {
                println!("  {}", peer);
            }
        }

        PeerCommands::Add { node: peer } => {
            if node.add_peer(&peer).await? {
                println!("{}Added peer {}", CHECK, peer);
            } else {
                println!("Peer {} already known", peer);
            }
        }

        PeerCommands::Remove { node: peer } => {
            if node.remove_peer(&peer).await {
                println!("{}Removed peer {}", CHECK, peer);
            } else {
                println!("{}Unknown peer {}", CROSS, peer);
            }
        }
    }

    Ok(())
}

pub(crate) fn mining_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] Mining block... {msg}")
    {
        pb.set_style(template);
    }
    pb.set_message("searching for proof");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub(crate) fn print_block(block: &Block) {
    println!("{}", style(format!("Block {}", block.index)).bold());
    println!("  Hash: {}", block.hash());
    println!("  Previous hash: {}", block.previous_hash);
    println!("  Proof: {}", block.proof);
    println!("  Timestamp: {}", block.timestamp);
    for tx in &block.transactions {
        print_transaction(tx);
    }
}

pub(crate) fn print_transaction(tx: &Transaction) {
    println!("  {} -> {}: {}", short(&tx.sender), short(&tx.recipient), tx.amount);
}

pub(crate) fn print_report(report: &BroadcastReport) {
    if report.attempted() == 0 {
        return;
    }
    println!(
        "📡 Broadcast: {} accepted, {} declined, {} unreachable",
        report.accepted.len(),
        report.declined.len(),
        report.unreachable.len()
    );
}

fn short(key: &str) -> &str {
    match key.char_indices().nth(16) {
        Some((end, _)) => &key[..end],
        None => key,
    }
}
