//! Rectify CLI
//!

#![deny(missing_docs)]

mod check;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};

use rectify_core::{
    config::RectifyConfig,
    logging::{self, LevelFilter},
    Rectifier,
};
use rectify_mongodb::{MongoProvider, MongoProviderConfig};
use rectify_server::AppState;

/// Rectify: compare the permissions a workload needs with the ones it holds
#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Args {
    #[clap(subcommand)]
    command: RectifyCommand,
    #[clap(short, long)]
    log_level: Option<LevelFilter>,
    /// Path to a config file. Defaults to rectify_config.yaml, if present.
    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum RectifyCommand {
    /// Serve the rectification HTTP API.
    Serve {
        /// Select the ip and port to bind the server to (e.g. 127.0.0.1:3001)
        #[clap(short, long, value_parser)]
        bind: Option<String>,
    },
    /// Run a single rectification and print the report.
    Check(check::CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup(args.log_level);
    let config = RectifyConfig::resolve(args.config.as_deref())?;

    match args.command {
        RectifyCommand::Serve { bind } => serve(config, bind).await?,
        RectifyCommand::Check(check_args) => check::check(check_args, &config).await?,
    }

    Ok(())
}

async fn serve(config: RectifyConfig, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.bind.clone());
    let provider = MongoProvider::new(MongoProviderConfig::from(&config));
    let rectifier = Rectifier::new(Arc::new(provider), config.default_required());
    rectify_server::serve(Arc::new(AppState::new(rectifier, config)), &bind).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_takes_an_optional_bind() {
        let args = Args::try_parse_from(["rectify", "serve", "--bind", "127.0.0.1:4000"]).unwrap();
        assert!(matches!(
            args.command,
            RectifyCommand::Serve { bind: Some(ref b) } if b == "127.0.0.1:4000"
        ));
    }

    #[test]
    fn global_flags_come_before_the_command() {
        let args =
            Args::try_parse_from(["rectify", "-l", "debug", "-c", "alt.yaml", "serve"]).unwrap();
        assert_eq!(args.log_level, Some(LevelFilter::DEBUG));
        assert_eq!(args.config, Some(PathBuf::from("alt.yaml")));
    }

    #[test]
    fn a_command_is_required() {
        assert!(Args::try_parse_from(["rectify"]).is_err());
    }
}
