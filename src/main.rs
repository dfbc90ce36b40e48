use std::process::ExitCode;

use gitstate::cli::{self, Cli};
use gitstate::ui::output;
use tracing::Level;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let level = if cli.debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(cli.debug)
        .init();

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
