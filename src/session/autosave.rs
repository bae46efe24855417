//! Debounced autosave.
//!
//! Keystroke-level edits arrive far faster than they are worth persisting.
//! The [`Debouncer`] holds the most recent state and flushes it only after a
//! quiet window with no further edits; re-arming within the window replaces
//! the pending state and restarts the window. Cancelling (on switching the
//! active entity) disarms without flushing - the superseded state is
//! intentionally dropped.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::models::Document;

/// Default quiet window before a pending edit is persisted.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

enum Msg {
    Arm(Document),
    Cancel,
    Shutdown,
}

/// A cancellable scheduled persist task running on a worker thread.
pub struct Debouncer {
    tx: Sender<Msg>,
    worker: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Spawn the worker. `flush` runs on the worker thread with the last
    /// armed state once a quiet window elapses.
    pub fn new<F>(window: Duration, flush: F) -> Self
    where
        F: Fn(Document) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            let mut pending: Option<Document> = None;
            loop {
                let msg = if pending.is_some() {
                    match rx.recv_timeout(window) {
                        Ok(msg) => msg,
                        Err(RecvTimeoutError::Timeout) => {
                            if let Some(doc) = pending.take() {
                                flush(doc);
                            }
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                } else {
                    match rx.recv() {
                        Ok(msg) => msg,
                        Err(_) => break,
                    }
                };
                match msg {
                    Msg::Arm(doc) => pending = Some(doc),
                    Msg::Cancel => pending = None,
                    Msg::Shutdown => break,
                }
            }
        });
        Self {
            tx,
            worker: Some(worker),
        }
    }

    /// Schedule (or reschedule) a persist of the given state.
    pub fn arm(&self, doc: Document) {
        let _ = self.tx.send(Msg::Arm(doc));
    }

    /// Disarm any pending persist without flushing it.
    pub fn cancel(&self) {
        let _ = self.tx.send(Msg::Cancel);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, Kind};
    use std::sync::{Arc, Mutex};

    fn sink() -> (Arc<Mutex<Vec<String>>>, impl Fn(Document) + Send + 'static) {
        let flushed = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::clone(&flushed);
        (flushed, move |doc: Document| {
            writer.lock().unwrap().push(doc.title);
        })
    }

    #[test]
    fn test_flushes_last_state_after_quiet_window() {
        let (flushed, flush) = sink();
        let debouncer = Debouncer::new(Duration::from_millis(30), flush);

        let mut doc = Document::blank(Kind::Task);
        doc.title = "first".to_string();
        debouncer.arm(doc.clone());
        doc.title = "second".to_string();
        debouncer.arm(doc);

        thread::sleep(Duration::from_millis(150));
        assert_eq!(*flushed.lock().unwrap(), vec!["second".to_string()]);
    }

    #[test]
    fn test_cancel_disarms_without_flushing() {
        let (flushed, flush) = sink();
        let debouncer = Debouncer::new(Duration::from_millis(30), flush);

        let mut doc = Document::blank(Kind::Task);
        doc.title = "unsaved".to_string();
        debouncer.arm(doc);
        debouncer.cancel();

        thread::sleep(Duration::from_millis(150));
        assert!(flushed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rearming_restarts_the_window() {
        let (flushed, flush) = sink();
        let debouncer = Debouncer::new(Duration::from_millis(60), flush);

        let mut doc = Document::blank(Kind::Task);
        for i in 0..3 {
            doc.title = format!("edit {}", i);
            debouncer.arm(doc.clone());
            thread::sleep(Duration::from_millis(20));
        }
        // Only one flush, carrying the final edit.
        thread::sleep(Duration::from_millis(200));
        assert_eq!(*flushed.lock().unwrap(), vec!["edit 2".to_string()]);
    }

    #[test]
    fn test_drop_does_not_flush_pending() {
        let (flushed, flush) = sink();
        {
            let debouncer = Debouncer::new(Duration::from_millis(500), flush);
            let doc = Document::blank(Kind::Task);
            debouncer.arm(doc);
        }
        assert!(flushed.lock().unwrap().is_empty());
    }
}
