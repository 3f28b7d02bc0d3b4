//! Headless dashboard shell.
//!
//! ```text
//! dashboard-shell              subdued startup check, then scheduled checks
//! dashboard-shell check        one explicit check, then exit
//! dashboard-shell init-config  write the effective config to the default path
//! ```
//!
//! With scheduled checks enabled the visible-state loop runs until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use env_logger::{Builder, Env};

use dashboard_shell::plugins::registry::PluginRegistry;
use dashboard_shell::protocols::manifest::ManifestUpdateSource;
use dashboard_shell::protocols::LogPresenter;
use dashboard_shell::runtime::ui_queue::UiTask;
use dashboard_shell::{Shell, ShellConfig, ShellError};

fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("dashboard_shell=info")).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logger();

    let result = match std::env::args().nth(1).as_deref() {
        Some("init-config") => init_config(),
        Some("check") => run(true).await,
        Some(other) => Err(ShellError::InvalidInput {
            message: format!("Unknown command: {other}"),
        }),
        None => run(false).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Dashboard shell failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_config() -> Result<(), ShellError> {
    let path = ShellConfig::default_path()?;
    ShellConfig::load_from(&path)?.save_to(&path)?;
    log::info!("Config written: path={}", path.display());
    Ok(())
}

async fn run(explicit: bool) -> Result<(), ShellError> {
    let config = ShellConfig::load()?;

    let mut shell = Shell::new(PluginRegistry::new(), Box::new(LogPresenter::default()))
        .with_tab_titles(config.tab_titles.clone());
    shell.new_layout();

    let Some(manifest_path) = config.update.manifest_path.as_ref() else {
        log::info!("No update manifest configured, nothing to do");
        return Ok(());
    };
    let source = ManifestUpdateSource::new(
        manifest_path,
        &config.current_version,
        &config.update.download_dir,
    )?;
    shell = shell.with_update_source(Arc::new(source));

    let startup = if explicit {
        Some(shell.check_for_updates().await?)
    } else if config.update.check_on_startup {
        Some(shell.check_for_updates_subdued().await?)
    } else {
        None
    };

    let interval = config.check_interval().filter(|_| !explicit);
    let scheduled = match (interval, shell.updater()) {
        (Some(interval), Some(updater)) => {
            log::info!(
                "Scheduled update checks enabled: interval_secs={}",
                interval.as_secs()
            );
            Some(updater.spawn_periodic_checks(interval))
        }
        _ => None,
    };

    let ui = shell.ui_handle();
    if scheduled.is_some() {
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("Failed to listen for Ctrl-C: {e}");
                return;
            }
            log::info!("Shutdown requested");
            ui.post(UiTask::Shutdown);
        });
    } else if let Some(operation) = startup {
        tokio::spawn(async move {
            let outcome = operation.wait().await;
            log::info!("Update check finished: outcome={outcome:?}");
            ui.post(UiTask::Shutdown);
        });
    } else {
        log::info!("No update check requested");
        return Ok(());
    }

    shell.run().await;
    if let Some(handle) = scheduled {
        handle.abort();
    }
    Ok(())
}
