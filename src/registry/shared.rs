use super::build::Registry;
use super::load::load_manifest;
use arc_swap::ArcSwap;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Registry slot that can be replaced while requests are being resolved.
///
/// Readers take an `Arc` snapshot and resolve against it without locking;
/// a swap only affects snapshots taken afterwards.
#[derive(Debug)]
pub struct SharedRegistry {
    current: ArcSwap<Registry>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
        }
    }

    /// Current registry.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Registry> {
        self.current.load_full()
    }

    /// Publish a new registry.
    pub fn replace(&self, registry: Registry) {
        self.current.store(Arc::new(registry));
    }
}

/// Watch a manifest file and publish a rebuilt registry whenever it changes.
///
/// A manifest that fails to load, or an empty file caught mid-write, is
/// ignored, leaving the last good registry in place. `on_reload` runs after every successful swap.
/// Keep the returned watcher alive for as long as reloading should happen.
///
/// # Errors
///
/// Fails if the watcher cannot be created or the path cannot be watched.
pub fn watch_manifest<P, F>(
    manifest_path: P,
    shared: Arc<SharedRegistry>,
    mut on_reload: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: FnMut(&Registry) + Send + 'static,
{
    let path: PathBuf = manifest_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                // truncated by a writer that has not written yet
                if std::fs::metadata(&watch_path).is_ok_and(|m| m.len() == 0) {
                    debug!(manifest = %watch_path.display(), "hot-reload: manifest empty, waiting");
                    return;
                }
                match load_manifest(&watch_path) {
                    Ok(registry) => {
                        info!(
                            manifest = %watch_path.display(),
                            resources_count = registry.len(),
                            operations_count = registry.operation_count(),
                            "hot-reload: registry replaced"
                        );
                        on_reload(&registry);
                        shared.replace(registry);
                    }
                    Err(e) => warn!(
                        manifest = %watch_path.display(),
                        error = %format!("{e:#}"),
                        "hot-reload: manifest rejected, keeping previous registry"
                    ),
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
