//! Shared process entry for the binaries: argument parsing, logging setup,
//! configuration loading and exit status.

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::error::PipelineError;
use log::{error, info};
use std::path::PathBuf;

/// Extract the settings file path from the command line.
///
/// Only `--config <path>` / `--config=<path>` is recognised; without it the
/// default `dwh.cfg` in the working directory is used.
pub fn config_path_from_args<I, S>(args: I) -> Result<PathBuf, String>
where
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut config: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--config") => {
                if config.is_some() {
                    return Err("`--config` provided more than once".to_string());
                }
                let value = args
                    .next()
                    .ok_or_else(|| "`--config` requires a path argument".to_string())?;
                config = Some(PathBuf::from(value));
            }
            Some(s) if s.starts_with("--config=") => {
                if config.is_some() {
                    return Err("`--config` provided more than once".to_string());
                }
                let path_str = &s["--config=".len()..];
                if path_str.is_empty() {
                    return Err("`--config` requires a path argument".to_string());
                }
                config = Some(PathBuf::from(path_str));
            }
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        }
    }

    Ok(config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)))
}

fn init_logging() {
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .target(env_logger::Target::Stdout)
        .init();
}

/// Run `task` as the body of binary `program`, exiting non-zero on failure.
pub fn launch(program: &str, task: fn(&Config) -> Result<(), PipelineError>) {
    init_logging();
    info!(
        "{} {} (git {}) starting",
        program,
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );

    let path = match config_path_from_args(std::env::args_os().skip(1)) {
        Ok(path) => path,
        Err(e) => {
            error!("fatal: {}", e);
            std::process::exit(2);
        }
    };

    let result = Config::from_file(&path).and_then(|cfg| {
        info!(
            "Config loaded from {} (host={}, db={}, dialect={}, region={})",
            path.display(),
            cfg.cluster.host,
            cfg.cluster.db_name,
            cfg.cluster.dialect,
            cfg.s3.region
        );
        task(&cfg)
    });

    if let Err(e) = result {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
    info!("{} finished", program);
}
