use brrtresolver::cli::{run, Cli};
use brrtresolver::logging::{init_logging_with_config, LogConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        log_level: cli.log_level.clone(),
        ..LogConfig::from_env()
    };
    let _guard = init_logging_with_config(&log_config)?;

    run(&cli, &mut std::io::stdout().lock())
}
