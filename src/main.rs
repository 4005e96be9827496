use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use servicegpt_lib::chat_manager::intent::DEFAULT_COUNT;
use servicegpt_lib::chat_manager::RequestContext;
use servicegpt_lib::config::{AppConfig, ConfigArgs};
use servicegpt_lib::logger::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "servicegpt",
    version,
    about = "Finds local service providers by asking a language model"
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace) when RUST_LOG is unset.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Resolve one lookup and print the result as JSON.
    Lookup {
        #[arg(long)]
        service: String,
        #[arg(long)]
        location: String,
        #[arg(long, default_value_t = DEFAULT_COUNT)]
        count: usize,
        /// Provider names to leave out; repeat or separate with commas.
        #[arg(long, value_delimiter = ',')]
        existing: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::from_args(cli.config).context("invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => servicegpt_lib::serve(config).await.context("server failed")?,
        Command::Lookup {
            service,
            location,
            count,
            existing,
        } => {
            let ctx = RequestContext::new(service, location, count.clamp(1, config.max_count))
                .with_existing(existing);
            let resolution = servicegpt_lib::lookup(&config, &ctx)
                .await
                .context("lookup failed")?;
            let output = serde_json::json!({
                "providers": resolution.providers,
                "usage_report": resolution.usage_report,
                "top_up_attempts": resolution.top_up_attempts,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
