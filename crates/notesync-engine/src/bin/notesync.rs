//! notesync: command-line access to a knowledge server.
//!
//! Logs in with `NOTESYNC_USER_ID` / `NOTESYNC_PASSWORD` when set, otherwise
//! with the credentials remembered in the local store.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use notesync_client::WizClient;
use notesync_core::{Credentials, TagNode};
use notesync_engine::telemetry::init_tracing;
use notesync_engine::{Collaborators, DirectorySink, LoginOptions, NoteSync, SyncConfig};
use notesync_store::JsonFileStore;
use tracing::info;

#[derive(Parser)]
#[command(name = "notesync")]
#[command(author, version, about = "Sync and export notes from a knowledge server")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export one note as Markdown
    ExportNote {
        /// Document GUID of the note
        doc_guid: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Export every note of a category, one file per note
    ExportCategory {
        /// Category path such as /My Notes/
        category: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print the tag tree
    Tags,

    /// Print the category paths
    Categories,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _guard = init_tracing("notesync=info,notesync_engine=info,notesync_client=warn");
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SyncConfig::from_env()?;
    let store = Arc::new(
        JsonFileStore::open(&config.store_path)
            .with_context(|| format!("opening store {}", config.store_path))?,
    );
    let client = Arc::new(WizClient::from_env()?);
    let output = match &cli.command {
        Commands::ExportNote { output, .. } | Commands::ExportCategory { output, .. } => {
            output.clone()
        }
        Commands::Tags | Commands::Categories => PathBuf::from("."),
    };

    let sync = NoteSync::new(
        Collaborators {
            api: client.clone(),
            account: client.clone(),
            cache: store.clone(),
            settings: store,
            sink: Arc::new(DirectorySink::new(output)),
            uploader: Some(client),
        },
        config,
    )?;
    login(&sync).await?;

    match cli.command {
        Commands::ExportNote { doc_guid, .. } => {
            let kb = sync.kb_guid().context("no knowledge base after login")?;
            sync.export_note(&kb, &doc_guid).await?;
        }
        Commands::ExportCategory { category, .. } => {
            let count = sync.export_category(&category).await?;
            println!("Exported {} notes", count);
        }
        Commands::Tags => print_tags(&sync.tag_forest(), 0),
        Commands::Categories => {
            for category in sync.categories() {
                println!("{}", category);
            }
        }
    }

    let stats = sync.fetcher().stats();
    info!(
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        "Done"
    );
    Ok(())
}

async fn login(sync: &NoteSync) -> anyhow::Result<()> {
    match (
        std::env::var("NOTESYNC_USER_ID"),
        std::env::var("NOTESYNC_PASSWORD"),
    ) {
        (Ok(user_id), Ok(password)) => {
            let credentials = Credentials {
                user_id,
                password,
                url: std::env::var("NOTESYNC_ACCOUNT_URL").ok(),
            };
            let opts = LoginOptions {
                remember_password: false,
                self_hosted: credentials.url.is_some(),
            };
            sync.login(&credentials, opts).await?;
        }
        _ => {
            if sync.init_from_store().await?.is_none() {
                sync.re_login()
                    .await
                    .context("no credentials in the environment or the store")?;
            }
        }
    }
    Ok(())
}

fn print_tags(nodes: &[TagNode], depth: usize) {
    for node in nodes {
        println!("{}{} ({})", "  ".repeat(depth), node.tag.name, node.tag.tag_guid);
        print_tags(&node.children, depth + 1);
    }
}
