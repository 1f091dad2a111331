use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "tinychain-cli")]
#[command(about = "CLI client for a tinychain node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction
    Submit {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        amount: u64,
    },
    /// Ask the node to mine the next block
    Mine,
    /// Print the node's chain
    Chain,
    /// Register peer addresses with the node
    Register { addresses: Vec<String> },
    /// Run longest-valid-chain consensus against registered peers
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let node = cli.node;

    let response = match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
        } => {
            let tx = Tx {
                sender,
                recipient,
                amount,
            };
            client
                .post(format!("{node}/transactions"))
                .json(&tx)
                .send()
                .await?
        }
        Command::Mine => client.post(format!("{node}/mine")).send().await?,
        Command::Chain => client.get(format!("{node}/chain")).send().await?,
        Command::Register { addresses } => {
            client
                .post(format!("{node}/nodes/register"))
                .json(&serde_json::json!({ "nodes": addresses }))
                .send()
                .await?
        }
        Command::Resolve => client.post(format!("{node}/nodes/resolve")).send().await?,
    };

    let status = response.status();
    let body = response.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}
