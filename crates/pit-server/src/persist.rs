//! Background snapshot writer.
//!
//! Saves and deletes run in submission order on one task, with the file
//! I/O itself on the blocking pool, so a slow disk never holds up a tick or
//! a client command.

use pit_session::{SessionSnapshot, SessionStore};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

#[derive(Debug)]
pub enum PersistJob {
    Save(Box<SessionSnapshot>),
    Delete,
    /// Reply once every earlier job has finished.
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Cloneable sender of persistence jobs.
#[derive(Debug, Clone)]
pub struct PersistHandle {
    tx: mpsc::UnboundedSender<PersistJob>,
}

impl PersistHandle {
    pub fn save(&self, snapshot: SessionSnapshot) {
        self.send(PersistJob::Save(Box::new(snapshot)));
    }

    pub fn delete(&self) {
        self.send(PersistJob::Delete);
    }

    /// Wait until every job submitted so far has been applied.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(PersistJob::Flush(tx));
        let _ = rx.await;
    }

    pub fn shutdown(&self) {
        self.send(PersistJob::Shutdown);
    }

    fn send(&self, job: PersistJob) {
        if self.tx.send(job).is_err() {
            tracing::warn!("persister stopped, dropping job");
        }
    }
}

pub struct Persister {
    store: SessionStore,
}

impl Persister {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Start the writer task.
    pub fn spawn(self) -> (PersistHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (PersistHandle { tx }, task)
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<PersistJob>) {
        while let Some(job) = rx.recv().await {
            match job {
                PersistJob::Save(snapshot) => {
                    let store = self.store.clone();
                    let result = tokio::task::spawn_blocking(move || store.save(&snapshot)).await;
                    if let Err(e) = result {
                        tracing::error!(error = %e, "session save task failed");
                    }
                }
                PersistJob::Delete => {
                    let store = self.store.clone();
                    if let Err(e) = tokio::task::spawn_blocking(move || store.delete()).await {
                        tracing::error!(error = %e, "session delete task failed");
                    }
                }
                PersistJob::Flush(done) => {
                    let _ = done.send(());
                }
                PersistJob::Shutdown => break,
            }
        }
        tracing::debug!("persister stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pit_session::Reading;

    fn snapshot(readings: usize) -> SessionSnapshot {
        SessionSnapshot {
            readings: vec![Reading::default(); readings],
            ..SessionSnapshot::default()
        }
    }

    #[tokio::test]
    async fn jobs_apply_in_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let (handle, task) = Persister::new(store.clone()).spawn();

        handle.save(snapshot(3));
        handle.delete();
        handle.flush().await;
        assert!(!store.path().exists());

        handle.delete();
        handle.save(snapshot(5));
        handle.flush().await;
        assert_eq!(store.try_load().unwrap().unwrap().readings.len(), 5);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn jobs_after_shutdown_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let (handle, task) = Persister::new(store.clone()).spawn();
        handle.shutdown();
        task.await.unwrap();

        handle.save(snapshot(1));
        assert!(!store.path().exists());
    }
}
