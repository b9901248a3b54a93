//! Configuration file watcher for hot reload.
//!
//! Only the `trusted_proxies` section is applied live. Listener, timeout and
//! observability changes are validated with the rest of the file but take
//! effect on restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{ServiceConfig, TrustedProxiesConfig};

/// Watches the configuration file and forwards reloaded trust settings.
pub struct ConfigWatcher {
    path: PathBuf,
    startup: ServiceConfig,
    update_tx: mpsc::UnboundedSender<TrustedProxiesConfig>,
}

impl ConfigWatcher {
    /// `startup` is the configuration the process is running with.
    pub fn new(path: &Path, startup: &ServiceConfig) -> (Self, mpsc::UnboundedReceiver<TrustedProxiesConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                startup: startup.clone(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            startup,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!(path = ?path, "Config file change detected, reloading");
                    match load_config(&path) {
                        Ok(reloaded) => {
                            let _ = update_tx.send(reloadable_section(&startup, reloaded));
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current trust settings");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}

/// Sections of `reloaded` that differ from `startup` and need a restart.
pub fn restart_required(startup: &ServiceConfig, reloaded: &ServiceConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if startup.listener != reloaded.listener {
        changed.push("listener");
    }
    if startup.timeouts != reloaded.timeouts {
        changed.push("timeouts");
    }
    if startup.observability != reloaded.observability {
        changed.push("observability");
    }
    changed
}

/// The part of a reloaded configuration that can be applied live.
fn reloadable_section(startup: &ServiceConfig, reloaded: ServiceConfig) -> TrustedProxiesConfig {
    let changed = restart_required(startup, &reloaded);
    if !changed.is_empty() {
        tracing::warn!(sections = ?changed, "Config sections changed that only apply on restart");
    }
    reloaded.trusted_proxies
}
