//! `band-hub` — shared practice recordings, favorites, comments and the band calendar.

mod cli;
mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use band_hub::RemoteError;
use band_hub::config::HubConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::commands::Session;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("warn,band_hub=info,band_hub_cli=info")
        }))
        .with_writer(std::io::stderr)
        .init();

    let config_path = resolve_config_path(args.config.clone());
    let cfg = match args.config.as_ref() {
        Some(path) => HubConfig::load(path)?,
        None => HubConfig::load_or_default(&config_path)?,
    };
    tracing::debug!(config = %config_path.display(), "config resolved");

    let session = Session::new(&args, config_path, cfg);
    let result = commands::run(&session, args.cmd);
    if let Err(err) = &result {
        if let Some(hint) = hint_for(err) {
            eprintln!("hint: {hint}");
        }
    }
    result
}

/// Explicit `--config`, else `config.toml` next to the executable, else `./config.toml`.
fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|path| path.parent().map(|dir| dir.join("config.toml")))
        })
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    let remote = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<RemoteError>())?;
    status_hint(remote.status()?)
}

fn status_hint(status: u16) -> Option<&'static str> {
    match status {
        401 => Some("The access token is missing or expired. Sign in again and pass a fresh --token."),
        403 => Some("Permission denied. Make sure the folder is shared with Editor access."),
        404 => Some("Folder or file not found. Check the id or link."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn hints_follow_remote_status_through_context() {
        let err: Result<()> = Err(RemoteError::Status {
            operation: "verify folder",
            status: 403,
            body: None,
        })
        .context("resolve recordings folder");
        let err = err.unwrap_err();
        assert_eq!(
            hint_for(&err),
            Some("Permission denied. Make sure the folder is shared with Editor access.")
        );

        let plain = anyhow::anyhow!("config missing");
        assert_eq!(hint_for(&plain), None);
        assert_eq!(status_hint(500), None);
    }

    #[test]
    fn explicit_config_path_wins() {
        assert_eq!(
            resolve_config_path(Some(PathBuf::from("/etc/band.toml"))),
            PathBuf::from("/etc/band.toml")
        );
    }
}
