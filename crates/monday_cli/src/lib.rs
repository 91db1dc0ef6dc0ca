//! Demo driver for the monday.com SDK.
//!
//! Exercises the SDK the way the platform quickstart's local tester does:
//! run the whole suite or individual operations and inspect the normalized
//! responses, including the debug envelopes on failure.
//!
//! # Usage
//!
//! ```bash
//! # Run the full four-operation test suite
//! monday-demo all
//!
//! # Individual operations
//! monday-demo boards
//! monday-demo users
//! monday-demo query 'query GetMyInfo { me { id name email } }'
//! monday-demo playground 'query { me { id } }' --side server
//!
//! # Storage (in-memory backend)
//! monday-demo storage set "hello" --scope instance
//! monday-demo storage self-test
//! ```
//!
//! Outside a real platform session API calls fail; the point of this driver
//! is to show the normalized error envelopes they produce.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use monday_sdk::{
    ApiResponse, ClientConfig, FailurePolicy, MondayClient, PlaygroundSide, SdkResult,
    StaticTokenProvider, StorageData,
};
use std::sync::Arc;

const DEFAULT_CUSTOM_QUERY: &str = "query GetMyInfo { me { id name email } }";
const DEFAULT_PLAYGROUND_QUERY: &str =
    "query GetMyInfoWithAccount { me { id name email account { id name } } }";

#[derive(Parser, Debug)]
#[command(name = "monday-demo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API endpoint. The canonical endpoint is HTTPS; point this at a local
    /// HTTP proxy or mock server for live calls.
    #[arg(long, global = true, default_value = monday_sdk::API_ENDPOINT)]
    pub endpoint: String,

    /// Personal API token (falls back to $MONDAY_TOKEN).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Substitute demo payloads when calls fail.
    #[arg(long, global = true)]
    pub graceful: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full API test suite (boards, users, custom, playground)
    All,

    /// Fetch the current user and the first few boards
    Boards,

    /// Fetch the account's users
    Users,

    /// Execute a custom GraphQL query
    Query {
        /// GraphQL query string (defaults to a `me` query)
        query: Option<String>,
    },

    /// Execute a playground query
    Playground {
        /// GraphQL query string
        query: Option<String>,

        /// Which side nominally executes the query
        #[arg(long, value_enum, default_value_t = SideArg::Client)]
        side: SideArg,
    },

    /// Key-value storage operations (in-memory backend)
    Storage {
        #[command(subcommand)]
        command: StorageCommands,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SideArg {
    Client,
    Server,
}

impl From<SideArg> for PlaygroundSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Client => Self::Client,
            SideArg::Server => Self::Server,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ScopeArg {
    Instance,
    Global,
    User,
}

#[derive(Subcommand, Debug)]
pub enum StorageCommands {
    /// Read a value (example keys by default)
    Get {
        #[arg(long)]
        key: Option<String>,

        #[arg(long, value_enum, default_value_t = ScopeArg::Instance)]
        scope: ScopeArg,
    },

    /// Store a value
    Set {
        value: String,

        #[arg(long)]
        key: Option<String>,

        #[arg(long, value_enum, default_value_t = ScopeArg::Instance)]
        scope: ScopeArg,
    },

    /// Round-trip a test value through the storage channel
    SelfTest,
}

/// Runs the parsed command against a freshly composed client.
pub async fn run(cli: Cli) -> SdkResult<()> {
    let client = build_client(&cli);

    match cli.command {
        Commands::All => run_all(&client).await,
        Commands::Boards => {
            let response = client.api().fetch_board_data().await;
            print_response("Board Data", &response);
        }
        Commands::Users => {
            let response = client.api().get_users().await;
            print_response("Users", &response);
        }
        Commands::Query { query } => {
            let query = query.as_deref().unwrap_or(DEFAULT_CUSTOM_QUERY);
            let response = client.api().execute_custom_query(query).await;
            print_response("Custom Query", &response);
        }
        Commands::Playground { query, side } => {
            let query = query.as_deref().unwrap_or(DEFAULT_PLAYGROUND_QUERY);
            let response = client.api().execute_playground_query(query, side.into()).await;
            print_response("API Playground", &response);
        }
        Commands::Storage { command } => run_storage(&client, command).await,
    }

    Ok(())
}

fn build_client(cli: &Cli) -> MondayClient {
    let policy = if cli.graceful {
        FailurePolicy::GracefulDegrade
    } else {
        FailurePolicy::Strict
    };
    let config = ClientConfig::new(cli.endpoint.clone()).policy(policy);
    tracing::debug!(endpoint = %cli.endpoint, graceful = cli.graceful, "composing client");

    let mut builder = MondayClient::builder().config(config);
    if let Some(token) = &cli.token {
        builder = builder.token_provider(Arc::new(StaticTokenProvider::new(token.clone())));
    }
    builder.build()
}

async fn run_all(client: &MondayClient) {
    println!("{}", "Running all API function tests".bold());
    println!();

    let boards = client.api().fetch_board_data().await;
    print_response("Board Data", &boards);

    let users = client.api().get_users().await;
    print_response("Users", &users);

    let custom = client.api().execute_custom_query(DEFAULT_CUSTOM_QUERY).await;
    print_response("Custom Query", &custom);

    let playground = client
        .api()
        .execute_playground_query(DEFAULT_PLAYGROUND_QUERY, PlaygroundSide::Client)
        .await;
    print_response("API Playground", &playground);

    let failed = [&boards, &users, &custom, &playground]
        .iter()
        .filter(|r| r.error)
        .count();
    if failed == 0 {
        println!("{}", "Completed all API function tests".green().bold());
    } else {
        println!("{}", format!("Completed with {failed}/4 failures").yellow().bold());
    }
}

async fn run_storage(client: &MondayClient, command: StorageCommands) {
    match command {
        StorageCommands::Get { key, scope } => {
            let key = key.as_deref();
            let result = match scope {
                ScopeArg::Instance => client.storage().get_instance(key).await,
                ScopeArg::Global => client.storage().get_global(key).await,
                ScopeArg::User => client.storage().get_user(key).await,
            };
            print_storage("Storage Get", &result);
        }
        StorageCommands::Set { value, key, scope } => {
            let key = key.as_deref();
            let result = match scope {
                ScopeArg::Instance => client.storage().set_instance(&value, key).await,
                ScopeArg::Global => client.storage().set_global(&value, key).await,
                ScopeArg::User => client.storage().set_user(&value, key).await,
            };
            print_storage("Storage Set", &result);
        }
        StorageCommands::SelfTest => {
            let outcome = client.storage().self_test().await;
            if outcome.success {
                println!("{} storage self-test", "OK".green().bold());
            } else {
                println!(
                    "{} storage self-test: {}",
                    "FAILED".red().bold(),
                    outcome.error.as_deref().unwrap_or("unknown")
                );
            }
        }
    }
}

fn print_response(title: &str, response: &ApiResponse) {
    let status = if response.error {
        "FAILED".red().bold()
    } else {
        "OK".green().bold()
    };
    println!("{status} {}", title.bold());
    if let Some(message) = &response.message {
        println!("  {}", message.yellow());
    }
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("  (unprintable response: {err})"),
    }
    println!();
}

fn print_storage(title: &str, result: &StorageData) {
    let status = if result.error {
        "FAILED".red().bold()
    } else {
        "OK".green().bold()
    };
    println!("{status} {}", title.bold());
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("  (unprintable result: {err})"),
    }
}
