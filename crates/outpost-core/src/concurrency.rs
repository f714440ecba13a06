use crate::CoreError;
use fs2::FileExt;
use outpost_store::StoreLayout;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Exclusive advisory lock on a store root.
///
/// Workflows assume a single writer per configuration record; callers hold
/// this for the duration of a workflow invocation. Released on drop.
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Block until the lock is held.
    pub fn acquire(layout: &StoreLayout) -> Result<Self, CoreError> {
        let (file, path) = open_lock_file(layout)?;
        debug!("waiting for store lock {}", path.display());
        file.lock_exclusive()?;
        Ok(Self { file, path })
    }

    /// Take the lock if no other writer holds it.
    pub fn try_acquire(layout: &StoreLayout) -> Result<Option<Self>, CoreError> {
        let (file, path) = open_lock_file(layout)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(layout: &StoreLayout) -> Result<(File, PathBuf), CoreError> {
    std::fs::create_dir_all(layout.root())?;
    let path = layout.lock_file();
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&path)?;
    Ok((file, path))
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Defer Ctrl-C until the running workflow returns.
///
/// The first Ctrl-C only sets a flag checked between workflows; a second one
/// exits immediately.
pub fn install_signal_handler() {
    let _ = ctrlc::set_handler(move || {
        if SHUTDOWN_REQUESTED.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("\ninterrupt received, finishing the current operation (Ctrl-C again to abort)");
    });
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}
