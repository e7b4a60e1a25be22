use clipgraph::cli::Args;
use clipgraph::config;
use clipgraph::runner;

use clap::Parser;
use log::{debug, info};

fn main() {
    let args = Args::parse();

    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());

    if let Err(e) = init_logging(&args, &path_config) {
        eprintln!("Warning: {:#}", e);
    }

    info!("clipgraph v{} starting", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    if let Err(e) = runner::run(&args, &path_config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args, path_config: &config::PathConfig) -> anyhow::Result<()> {
    use anyhow::Context;

    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = match log_path_opt {
            Some(path) => path.clone(),
            None => path_config.prepare_log_file()?,
        };

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging on stderr (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }

    Ok(())
}
