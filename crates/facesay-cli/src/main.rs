use anyhow::Result;
use clap::{Parser, Subcommand};

mod config;
mod pipeline;

use config::Config;

#[derive(Parser)]
#[command(name = "facesay", about = "Face analysis with a spoken report")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image and print (and speak) the face report
    Analyze {
        /// Object key (cloud provider) or file path (local provider)
        image: String,
        /// Print the report without speaking it
        #[arg(long)]
        quiet: bool,
    },
    /// Speak arbitrary text through the configured speech backend
    Speak {
        /// Text to speak
        text: String,
    },
    /// Check provider configuration, models, and audio output
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Analyze { image, quiet } => pipeline::run_analysis(&config, &image, quiet).await,
        Commands::Speak { text } => pipeline::run_speak(&config, &text).await,
        Commands::Doctor => {
            pipeline::run_doctor(&config);
            Ok(())
        }
    }
}
