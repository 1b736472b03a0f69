//! CarbonTwin CLI: HTTP API server and database setup.
//!
//! Usage:
//!   carbontwin serve [--host 0.0.0.0] [--port 5000] [--db path]
//!   carbontwin init-db [--db path]
//!
//! Every option can also come from the environment (or a `.env` file).

use carbontwin::config::{default_database_path, AiSettings, ServiceConfig, DEFAULT_AI_TIMEOUT_SECS};
use carbontwin::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use carbontwin::{OpenStore, SqliteStore};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "carbontwin",
    version,
    about = "AI-assisted carbon management backend"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[command(flatten)]
        db: DbArgs,
        #[command(flatten)]
        ai: AiArgs,
        /// Interface to bind
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
    },
    /// Create the database schema and exit
    InitDb {
        #[command(flatten)]
        db: DbArgs,
    },
}

#[derive(Args)]
struct DbArgs {
    /// Path to SQLite database file
    #[arg(long = "db", env = "DATABASE_PATH")]
    path: Option<PathBuf>,
}

impl DbArgs {
    fn resolve(self) -> PathBuf {
        self.path.unwrap_or_else(default_database_path)
    }
}

#[derive(Args)]
struct AiArgs {
    /// API key for the chat-completion endpoint (falls back to CHATGPT5_API_KEY)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, env = "AI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Model name
    #[arg(long, env = "AI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
    /// Model request timeout in seconds
    #[arg(long, env = "OPENAI_REQUEST_TIMEOUT", default_value_t = DEFAULT_AI_TIMEOUT_SECS)]
    timeout: u64,
}

impl AiArgs {
    fn resolve(self) -> AiSettings {
        AiSettings {
            api_key: self
                .api_key
                .or_else(|| std::env::var("CHATGPT5_API_KEY").ok()),
            base_url: self.base_url,
            model: self.model,
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn cmd_init_db(path: PathBuf) -> i32 {
    match SqliteStore::open(&path) {
        Ok(_) => {
            println!("Database ready at {}", path.display());
            0
        }
        Err(e) => {
            eprintln!("Error: failed to open database: {}", e);
            1
        }
    }
}

fn cmd_serve(config: ServiceConfig) -> i32 {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return 1;
        }
    };
    match runtime.block_on(carbontwin::server::run(config)) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    let code = match cli.command {
        Commands::Serve { db, ai, host, port } => cmd_serve(ServiceConfig {
            ai: ai.resolve(),
            database_path: db.resolve(),
            host,
            port,
        }),
        Commands::InitDb { db } => cmd_init_db(db.resolve()),
    };
    std::process::exit(code);
}
