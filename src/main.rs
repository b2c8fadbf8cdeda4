use clap::Parser;
use cli_transform::app::{handle_fatal_error, init_logging, AppConfig};
use cli_transform::cli::{execute_command, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = AppConfig::new(cli.verbose);
    init_logging(&config);

    if let Err(e) = execute_command(cli).await {
        handle_fatal_error(e, config.verbose);
    }
}
