use clap::{Parser, Subcommand};
use futures::StreamExt;
use personal_vault::common::config::DEFAULT_CONFIG_FILE;
use personal_vault::common::ConfigError;
use personal_vault::prelude::*;
use personal_vault::storage::{StoreError, backend_from_endpoint};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Personal vault - store and read back sealed personal secrets.
#[derive(Parser, Debug)]
#[command(name = "personal-vault", about = "Personal secret vault", version)]
struct Args {
    /// Configuration file holding the storage endpoint and master key.
    #[arg(long, env = "PERSONAL_VAULT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seal and store a new secret
    Save {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Secret to store; prompted for when omitted
        #[arg(long, env = "VAULT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// List stored records as JSON (`id` and `name` only)
    List,
    /// Print the plaintext of one record
    Get { id: String },
    /// Check that the storage backend answers
    Health,
    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Command::Version = args.command {
        println!("personal-vault {}", personal_vault::VERSION);
        return ExitCode::SUCCESS;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // The key is obtained before the runtime starts; this may prompt.
    let store = ConfigStore::new(&args.config);
    let key = match ConfigKeyProvider::new(store.clone(), StdinPassphrase::default()).obtain() {
        Ok(key) => key,
        Err(e) => return fail(&VaultError::from(e)),
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args.command, store, key)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

async fn run(command: Command, store: ConfigStore, key: MasterKey) -> personal_vault::Result<()> {
    let config = store.load()?;
    let vault = VaultService::with_backend(backend_from_endpoint(&config.endpoint_url)?, key);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted; cancelling");
                cancel.cancel();
            }
        }
    });

    match command {
        Command::Save {
            name,
            description,
            password,
        } => {
            let secret = match password {
                Some(password) => SecretString::from(password),
                None => StdinPassphrase::with_prompt("Secret to store: ")
                    .read_passphrase()
                    .map_err(|e| match e {
                        ConfigError::EmptyPassphrase => {
                            VaultError::Validation("secret must not be empty".to_owned())
                        }
                        other => VaultError::from(other),
                    })?,
            };
            let id = vault
                .save(NewSecret::new(name, description, secret), &cancel)
                .await?;
            println!("{}", SaveResponse { id });
        }
        Command::List => {
            let mut rows = vault.retrieve_all(&cancel).await?;
            let mut listed = Vec::new();
            while let Some(row) = rows.next().await {
                match row {
                    Ok(meta) => listed.push(meta),
                    Err(VaultError::Store(e @ StoreError::CorruptRecord { .. })) => {
                        eprintln!("skipped: {e}");
                    }
                    Err(e) => return Err(e),
                }
            }
            let json = serde_json::to_string_pretty(&listed)
                .map_err(StoreError::from)?;
            println!("{json}");
        }
        Command::Get { id } => {
            let secret = vault.retrieve_by_id(&id, &cancel).await?;
            println!("{}", secret.expose_secret());
        }
        Command::Health => {
            vault.health(&cancel).await?;
            println!("ok");
        }
        Command::Version => {}
    }
    Ok(())
}

fn fail(error: &VaultError) -> ExitCode {
    tracing::debug!(kind = ?error.kind(), status = error.status_code(), "command failed");
    eprintln!("error: {error}");
    match error.kind() {
        VaultErrorKind::Validation | VaultErrorKind::NotFound => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
