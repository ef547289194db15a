mod cli;
mod config;
mod document;
mod error;
mod format;
mod logging;
mod model;
mod notice;
mod toggle;
mod tracked;
mod tracker;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Command};
use config::SettingsStore;
use error::ConfigError;
use notice::{Notice, Notifier, StderrNotifier};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let notifier = StderrNotifier;

    match run(cli, &notifier).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast::<ConfigError>() {
                Ok(config_err) => notifier.notify(Notice::Config(config_err)),
                Err(err) => eprintln!("youtasks: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, notifier: &dyn Notifier) -> anyhow::Result<()> {
    let mut store = SettingsStore::load(cli::config_path(&cli))?;
    let settings = store.get();
    logging::init(&settings.logging);

    match &cli.command {
        Command::Insert(args) => cli::handle_insert(&settings, args, notifier).await,
        Command::Toggle(args) => cli::handle_toggle_command(&settings, args, notifier).await,
        Command::Whoami => cli::handle_whoami(&settings, notifier).await,
        Command::Config(command) => cli::handle_config(&mut store, command),
    }
}
