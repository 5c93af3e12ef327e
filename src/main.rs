//! keygate - operator CLI for the credential broker
//!
//! ```bash
//! # Generate a key pair, AES-encrypting the returned private key
//! KEYGATE_ENCRYPTION__AES_SECRET=... keygate create --aes
//!
//! # Resolve a user's key through the configured key services
//! KEYGATE_KEY_SERVICE__ENDPOINTS=10.0.0.1:5001,10.0.0.2:5001 keygate get user-1001
//! ```

use clap::{Parser, Subcommand};
use keygate::config::{Config, LoggingConfig};
use keygate::errors::{KeyGateError, Result};
use keygate::{broker_from_config, CredentialBroker};
use serde_json::json;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "keygate", version, about = "Credential broker for transaction signing")]
struct Cli {
    /// Path to a config file (defaults: ./keygate.toml, /etc/keygate/keygate.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new key pair
    Create {
        /// Return the private key AES-encrypted
        #[arg(long)]
        aes: bool,
    },
    /// Import a base64-encoded hex private key
    Import {
        key: String,
        #[arg(long)]
        aes: bool,
    },
    /// Print the plaintext private key for a user or address
    Get {
        user: String,
        /// The key service returns AES-encrypted keys
        #[arg(long)]
        aes: bool,
    },
    /// Print the address of the signing credential for a user
    Credential {
        user: String,
        #[arg(long)]
        aes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()).and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", e.code(), e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging);
    info!("Starting keygate v{}", VERSION);

    match run(cli.command, &config).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if e.is_caller_error() {
                warn!("Command rejected: {}", e);
            } else {
                error!("Command failed: {}", e);
            }
            eprintln!("{} {}", e.code(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<String> {
    let broker = broker_from_config(config)?;

    let output = match command {
        Command::Create { aes } => to_json(&broker.create_private_key(aes)?)?,
        Command::Import { key, aes } => to_json(&broker.import_private_key(&key, aes)?)?,
        Command::Get { user, aes } => get(&broker, &user, aes).await?,
        Command::Credential { user, aes } => {
            let credential = broker.get_credential(&user, aes).await?;
            json!({
                "address": credential.address(),
                "publicKey": credential.public_key_hex(),
            })
            .to_string()
        }
    };

    Ok(output)
}

async fn get(broker: &CredentialBroker, user: &str, aes: bool) -> Result<String> {
    let private_key = broker.get_private_key(user, aes).await?;
    if private_key.is_blank() {
        return Err(KeyGateError::PrivateKeyIsNull);
    }
    Ok(private_key.expose().to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Logs go to stderr so stdout stays machine-readable
    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
