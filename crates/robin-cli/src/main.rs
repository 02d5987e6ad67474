use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use robin_agent::ollama::OllamaProvider;
use robin_agent::CompletionClient;
use robin_core::config::RobinConfig;
use robin_core::{Message, SessionId, Turn};

mod app;
mod chat;

#[derive(Parser, Debug)]
#[command(name = "robin")]
#[command(version)]
#[command(about = "Conversational message router on a local language model.", long_about = None)]
struct Cli {
    /// Config file (default: $ROBIN_CONFIG, then ~/.robin/robin.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one prompt straight to the model and print the completion
    Complete {
        prompt: String,
        /// Model identifier (overrides completion.model)
        #[arg(short, long)]
        model: Option<String>,
        /// Request timeout in seconds (overrides completion.timeout_secs)
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Route one message and print the reply
    Reply {
        text: String,
        #[arg(short, long)]
        session: Option<String>,
        /// Earlier user turns to seed the session with (repeatable)
        #[arg(long = "prior")]
        prior: Vec<String>,
        /// Print the routing decision before the reply
        #[arg(long)]
        explain: bool,
    },
    /// Interactive conversation over stdin; /quit to exit
    Chat {
        #[arg(short, long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logs go to stderr; stdout carries replies only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "robin_cli=info,robin_agent=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.or_else(|| std::env::var("ROBIN_CONFIG").ok());
    let config = RobinConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        RobinConfig::default()
    });

    match cli.command {
        Command::Complete {
            prompt,
            model,
            timeout,
        } => {
            let model = model.unwrap_or_else(|| config.completion.model.clone());
            let timeout = Duration::from_secs(timeout.unwrap_or(config.completion.timeout_secs));
            let provider = OllamaProvider::new(
                Some(config.providers.ollama.base_url.clone()),
                timeout,
            )?;
            let client = CompletionClient::new(
                std::sync::Arc::new(provider),
                model,
                config.completion.max_tokens,
            );
            let resp = client.complete(&prompt).await?;
            info!(
                model = %resp.model,
                tokens_in = resp.tokens_in,
                tokens_out = resp.tokens_out,
                "completion finished"
            );
            println!("{}", resp.content);
        }
        Command::Reply {
            text,
            session,
            prior,
            explain,
        } => {
            let app = app::App::build(&config)?;
            let session = session.map(SessionId::from).unwrap_or_default();
            for earlier in prior {
                app.history.record(&session, Turn::user(earlier));
            }

            // unstamped: seeded turns must stay visible as earlier history
            let message = Message::new(text).with_session(session);
            if explain {
                println!("decision: {}", app.robin.decide(&message)?);
            }
            let reply = app.robin.generate_reply(&message).await?;
            println!("{}", reply.render());
        }
        Command::Chat { session } => {
            let app = app::App::build(&config)?;
            let session = session.map(SessionId::from).unwrap_or_default();
            info!(session = %session, "starting chat");
            chat::run(&app, session).await?;
        }
    }

    Ok(())
}
