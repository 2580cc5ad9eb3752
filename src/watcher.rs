//! Filesystem watcher: streams newly added images into a running session.
//!
//! A background thread owns a `notify` watcher on the input directory.
//! Create/modify events are filtered down to image files and forwarded
//! over a channel; the session drains it between commands and appends the
//! new paths to the queue.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::debug::dbg_log;
use crate::scanner;

/// Handle to the running watcher. Drop to stop.
pub struct DirWatcher {
    quit: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl DirWatcher {
    /// Watch `root` recursively; new image paths arrive on the receiver.
    pub fn start(root: &Path) -> (Self, mpsc::Receiver<PathBuf>) {
        let (tx, rx) = mpsc::channel();
        let quit = Arc::new(AtomicBool::new(false));
        let quit2 = quit.clone();
        let root = root.to_path_buf();

        let thread = std::thread::Builder::new()
            .name("dir-watcher".into())
            .spawn(move || run_watcher(root, tx, quit2))
            .expect("failed to spawn dir-watcher thread");

        (
            DirWatcher {
                quit,
                thread: Some(thread),
            },
            rx,
        )
    }

    pub fn stop(&mut self) {
        self.quit.store(true, Ordering::Release);
        if let Some(t) = self.thread.take() {
            t.join().ok();
        }
    }
}

impl Drop for DirWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_watcher(root: PathBuf, tx: mpsc::Sender<PathBuf>, quit: Arc<AtomicBool>) {
    // Channel for notify events
    let (ntx, nrx) = mpsc::channel();

    let mut watcher: RecommendedWatcher = match notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            ntx.send(event).ok();
        }
    }) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("watcher: failed to create: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&root, RecursiveMode::Recursive) {
        eprintln!("watcher: cannot watch {}: {}", root.display(), e);
        return;
    }
    dbg_log!("watch: {}", root.display());

    while !quit.load(Ordering::Acquire) {
        match nrx.recv_timeout(Duration::from_millis(200)) {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    continue;
                }
                for path in event.paths {
                    if scanner::is_image(&path) && path.is_file() {
                        dbg_log!("watch: new {}", path.display());
                        if tx.send(path).is_err() {
                            return; // session is gone
                        }
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}
