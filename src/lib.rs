pub mod api;
pub mod cli;
pub mod config;
pub mod control;
pub mod discovery;
pub mod error;
pub mod focus;
pub mod logging;
pub mod models;
pub mod resolve;
pub mod router;
pub mod selection;
pub mod settings;
pub mod tui;

use cli::output::report;
use config::RuntimeConfig;
use error::AppError;

pub async fn run(cli_args: cli::Cli) -> i32 {
    let cli_args = cli_args.with_trailing_flags();
    let config = RuntimeConfig::from_cli(&cli_args);

    let result = match cli_args.command {
        None => tui::run(&config).await,
        Some(command) => {
            logging::init_stderr(config.verbose);
            dispatch(command, &config).await
        }
    };

    match result {
        Ok(()) => 0,
        Err(err) => report(&err),
    }
}

async fn dispatch(command: cli::Commands, config: &RuntimeConfig) -> Result<(), AppError> {
    match command {
        cli::Commands::List => cli::devices::handle_list(config).await,
        cli::Commands::Detect => cli::devices::handle_detect(config).await,
        other => match other.router_args() {
            Some(args) => cli::light::handle(&args, config).await,
            None => Ok(()),
        },
    }
}
