//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use slideforge_core::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "slideforge")]
#[command(version)]
#[command(about = "Turn documents into slide decks with the SlideForge service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Service address (overrides SLIDEFORGE_BASE_URL and config)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

/// Files and conversation shared by `chat` and `ask`.
#[derive(clap::Args, Debug, Clone, Default)]
struct SessionArgs {
    /// Document to upload with the first message
    #[arg(long, value_name = "PATH")]
    doc: Option<PathBuf>,

    /// Brand guidelines to upload with the first message
    #[arg(long, value_name = "PATH")]
    brand: Option<PathBuf>,

    /// Continue an existing conversation by ID
    #[arg(long, value_name = "ID")]
    conversation: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Interactive session (default)
    Chat {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Send one message (and/or files) and print the reply
    Ask {
        /// Message to send; may be omitted when uploading files
        #[arg(value_name = "MESSAGE")]
        message: Option<String>,

        #[command(flatten)]
        session: SessionArgs,

        /// Generate the deck after the reply
        #[arg(long)]
        generate: bool,

        /// Download the generated deck to this path
        #[arg(short, long, value_name = "PATH", requires = "generate")]
        output: Option<PathBuf>,
    },

    /// Generate a deck for an existing conversation
    Generate {
        #[arg(value_name = "CONVERSATION_ID")]
        conversation_id: String,

        /// Download the deck to this path
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Download a generated deck
    Download {
        /// Download URL or service path (e.g. /api/download/deck.pptx)
        #[arg(value_name = "URL")]
        url: String,

        /// Destination file (default: file name from the URL)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Inspect conversations stored by the service
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Check that the service is reachable
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum SessionCommands {
    /// Lists conversations known to the service
    List,
    /// Shows a specific conversation
    Show {
        #[arg(value_name = "CONVERSATION_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Print a fresh config from Rust defaults
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config.log).context("init logging")?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, config).await })
}

async fn dispatch(cli: Cli, config: config::Config) -> Result<()> {
    let Cli {
        command,
        base_url,
        json,
    } = cli;
    let ctx = commands::RunContext {
        config,
        base_url,
        json,
    };

    // default to chat mode
    let Some(command) = command else {
        return commands::chat::run(&ctx, &commands::SessionOptions::default()).await;
    };

    match command {
        Commands::Chat { session } => {
            commands::chat::run(&ctx, &commands::SessionOptions::from(session)).await
        }
        Commands::Ask {
            message,
            session,
            generate,
            output,
        } => {
            let session = commands::SessionOptions::from(session);
            commands::ask::run(
                &ctx,
                commands::ask::AskOptions {
                    message: message.as_deref().unwrap_or_default(),
                    session: &session,
                    generate,
                    output: output.as_deref(),
                },
            )
            .await
        }
        Commands::Generate {
            conversation_id,
            output,
        } => commands::generate::run(&ctx, &conversation_id, output.as_deref()).await,
        Commands::Download { url, output } => {
            commands::download::run(&ctx, &url, output.as_deref()).await
        }
        Commands::Session { command } => match command {
            SessionCommands::List => commands::session::list(&ctx).await,
            SessionCommands::Show { id } => commands::session::show(&ctx, &id).await,
        },
        Commands::Status => commands::status::run(&ctx).await,
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}

impl From<SessionArgs> for commands::SessionOptions {
    fn from(args: SessionArgs) -> Self {
        commands::SessionOptions {
            doc: args.doc,
            brand: args.brand,
            conversation: args.conversation,
        }
    }
}
