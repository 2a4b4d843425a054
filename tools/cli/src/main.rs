//! Lain's Vault CLI - command line client for per-profile markdown vaults.
//!
//! Logs go to stderr so that `invoke` output on stdout stays machine-readable.

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lainvault_app::{CommandInterface, Settings, TransformSummary, ROOT_ENV};
use lainvault_common::SecretString;
use lainvault_crypto::Direction;
use lainvault_vault::TransformRequest;

#[derive(Parser)]
#[command(name = "lainvault")]
#[command(about = "Lain's Vault - per-profile markdown vaults with bulk encryption")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data root holding the profile registry and all vaults.
    #[arg(long, global = true, env = ROOT_ENV)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a profile.
    Register {
        /// Profile name.
        name: String,
    },

    /// List registered profiles.
    Profiles,

    /// List the documents in a profile's vault.
    List {
        /// Profile name.
        profile: String,
    },

    /// Save a document, replacing any previous content.
    Save {
        /// Profile name.
        profile: String,

        /// Document name; `.md` is appended if missing.
        filename: String,

        /// Content to store. Read from stdin when neither this nor --file is given.
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,

        /// Read content from a file.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print a document.
    Load {
        /// Profile name.
        profile: String,

        /// Document name.
        filename: String,
    },

    /// Encrypt every file in a vault in place.
    Encrypt(TransformArgs),

    /// Decrypt every file in a vault in place.
    Decrypt(TransformArgs),

    /// Run one JSON command and print the JSON reply.
    Invoke {
        /// Command JSON. Read from stdin when omitted.
        json: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_name = "SHELL")]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct TransformArgs {
    /// Profile name.
    profile: String,

    /// Key text. Prompted for when omitted.
    #[arg(long)]
    key: Option<String>,

    /// IV text. Prompted for when omitted.
    #[arg(long)]
    iv: Option<String>,

    /// File name to leave untouched. May be repeated.
    #[arg(short, long = "exclude", value_name = "FILENAME")]
    exclusions: Vec<String>,

    /// Use this directory as the vault root instead of the profile's.
    #[arg(long)]
    vault_dir: Option<PathBuf>,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "lainvault", &mut std::io::stdout());
        return Ok(());
    }

    let settings = Settings::resolve(cli.root).context("Failed to resolve data root")?;
    info!(root = %settings.data_root.display(), "Using data root");
    let interface = CommandInterface::new(settings).context("Failed to open data root")?;

    match cli.command {
        Commands::Register { name } => cmd_register(&interface, &name).await,
        Commands::Profiles => cmd_profiles(&interface).await,
        Commands::List { profile } => cmd_list(&interface, &profile).await,
        Commands::Save {
            profile,
            filename,
            content,
            file,
        } => cmd_save(&interface, &profile, &filename, content, file.as_deref()).await,
        Commands::Load { profile, filename } => cmd_load(&interface, &profile, &filename).await,
        Commands::Encrypt(args) => cmd_transform(&interface, args, Direction::Encrypt).await,
        Commands::Decrypt(args) => cmd_transform(&interface, args, Direction::Decrypt).await,
        Commands::Invoke { json } => cmd_invoke(&interface, json).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Read a secret without echo, or take it from a flag.
fn secret(flag: Option<String>, prompt: &str) -> Result<SecretString> {
    match flag {
        Some(value) => Ok(SecretString::new(value)),
        None => {
            let value = rpassword::prompt_password(prompt).context("Failed to read secret")?;
            Ok(SecretString::new(value))
        }
    }
}

/// Only a typed encryption key is asked for twice. A key given by flag is
/// taken as is, so scripted runs never block on a prompt.
fn needs_confirmation(direction: Direction, prompted: bool, key: &SecretString) -> bool {
    direction == Direction::Encrypt && prompted && !key.is_empty()
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    Ok(input)
}

async fn cmd_register(interface: &CommandInterface, name: &str) -> Result<()> {
    interface
        .register_profile(name)
        .await
        .context("Failed to register profile")?;
    println!("Profile registered: {}", name);
    Ok(())
}

async fn cmd_profiles(interface: &CommandInterface) -> Result<()> {
    let profiles = interface
        .list_profiles()
        .await
        .context("Failed to list profiles")?;

    if profiles.is_empty() {
        println!("No profiles registered.");
    }
    for profile in profiles {
        println!("{}", profile);
    }
    Ok(())
}

async fn cmd_list(interface: &CommandInterface, profile: &str) -> Result<()> {
    let documents = interface
        .list_documents(profile)
        .await
        .context("Failed to list documents")?;

    if documents.is_empty() {
        println!("Vault is empty.");
    }
    for name in documents {
        println!("{}", name);
    }
    Ok(())
}

async fn cmd_save(
    interface: &CommandInterface,
    profile: &str,
    filename: &str,
    content: Option<String>,
    file: Option<&Path>,
) -> Result<()> {
    let content = match (content, file) {
        (Some(content), _) => content,
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => read_stdin()?,
    };

    let stored = interface
        .save_document(profile, filename, &content)
        .await
        .context("Failed to save document")?;
    println!("Saved {} ({} bytes)", stored, content.len());
    Ok(())
}

async fn cmd_load(interface: &CommandInterface, profile: &str, filename: &str) -> Result<()> {
    let content = interface
        .load_document(profile, filename)
        .await
        .context("Failed to load document")?;
    print!("{}", content);
    Ok(())
}

async fn cmd_transform(
    interface: &CommandInterface,
    args: TransformArgs,
    direction: Direction,
) -> Result<()> {
    let prompted = args.key.is_none();
    let key = secret(args.key, "Key: ")?;
    if needs_confirmation(direction, prompted, &key) {
        let confirm = secret(None, "Confirm key: ")?;
        if key != confirm {
            anyhow::bail!("Keys do not match");
        }
    }
    let iv = secret(args.iv, "IV: ")?;

    let request = TransformRequest {
        exclusions: args.exclusions,
        key,
        iv,
        direction,
    };

    let cancel = interface.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current file");
            cancel.cancel();
        }
    });

    let summary = interface
        .transform_vault(&args.profile, request, args.vault_dir)
        .await
        .with_context(|| format!("Failed to {} vault", direction))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if !summary.failed.is_empty() || !summary.not_attempted.is_empty() {
        std::process::exit(2);
    }
    Ok(())
}

fn print_summary(summary: &TransformSummary) {
    println!("{} finished: {:?}", summary.direction, summary.outcome);
    println!("  Transformed: {}", summary.succeeded);
    if !summary.failed.is_empty() {
        println!("  Failed:");
        for failure in &summary.failed {
            println!("    {}: {}", failure.filename, failure.reason);
        }
    }
    if !summary.not_attempted.is_empty() {
        println!("  Not attempted: {}", summary.not_attempted.join(", "));
    }
}

async fn cmd_invoke(interface: &CommandInterface, json: Option<String>) -> Result<()> {
    let input = match json {
        Some(json) => json,
        None => read_stdin()?,
    };

    let (ok, output) = interface.dispatch_json(&input).await;
    println!("{}", output);
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
