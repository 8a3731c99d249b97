//! hermod: command-line front end for the gateway
//!
//! Lists the catalog and runs completions through a locally built router.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hermod::{
    Config, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, HermodBuilder, Message, ModelCatalog, Secrets,
};

/// Hermod CLI
#[derive(Parser)]
#[command(name = "hermod")]
#[command(version = hermod::PKG_VERSION)]
#[command(about = "Cost-aware completion gateway for Bedrock models")]
struct Args {
    /// Config file (default: ~/.hermod/config.toml, then /etc/hermod/config.toml)
    #[arg(short, long, env = "HERMOD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available models
    Models,

    /// Generate a completion
    Generate {
        /// User prompt (or omit to read from stdin)
        prompt: Option<String>,
        /// Model name from the catalog
        #[arg(short, long, default_value = "nova-lite")]
        model: String,
        /// Optional system instruction
        #[arg(short, long)]
        system: Option<String>,
        #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f64,
        #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
        max_tokens: u32,
        /// Send the same request this many times (repeats hit the cache)
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },

    /// Show gateway statistics for a fresh router
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    // Initialise tracing (default: configured level; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(io::stderr)
        .init();

    match args.command {
        Command::Models => {
            let catalog = match &config.catalog_path {
                Some(path) => ModelCatalog::from_path(path)?,
                None => ModelCatalog::embedded()?,
            };
            for model in catalog.list() {
                println!(
                    "{:<20} {:<45} in ${:.5}/1k  out ${:.5}/1k  ctx {}",
                    model.name,
                    model.model_id,
                    model.input_cost_per_1k,
                    model.output_cost_per_1k,
                    model.context_window
                );
            }
        }

        Command::Generate {
            prompt,
            model,
            system,
            temperature,
            max_tokens,
            repeat,
        } => {
            let prompt = resolve_text(prompt)?;
            let router = HermodBuilder::from_config(&config, &Secrets::load()?)
                .await?
                .build()?;

            let mut messages = Vec::with_capacity(2);
            if let Some(system) = system {
                messages.push(Message::system(system));
            }
            messages.push(Message::user(prompt));

            for _ in 0..repeat.max(1) {
                let response = router
                    .route(&model, &messages, temperature, max_tokens)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            println!("{}", serde_json::to_string_pretty(&router.stats())?);
        }

        Command::Stats => {
            let router = HermodBuilder::from_config(&config, &Secrets::load()?)
                .await?
                .build()?;
            println!("{}", serde_json::to_string_pretty(&router.stats())?);
        }
    }

    Ok(())
}

/// Prompt from the argument, else from piped stdin.
fn resolve_text(arg: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(text) = arg {
        return Ok(text);
    }
    if io::stdin().is_terminal() {
        return Err("generate: no prompt provided (pass it as an argument or via stdin)".into());
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    let trimmed = buf.trim();
    if trimmed.is_empty() {
        return Err("generate: empty prompt on stdin".into());
    }
    Ok(trimmed.to_string())
}
