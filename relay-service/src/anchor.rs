use relay_types::{Hash, Id};

use std::{
    sync::{
        mpsc::{self, RecvTimeoutError, Sender},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::Duration,
};

/// Error reported by an external root sink.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// External destination of anchored roots, e.g. a root-commits contract.
pub trait RootSink: Send + Sync + 'static {
    fn set_root(&self, id: &Id, root: &Hash) -> Result<(), SinkError>;
}

struct Shared {
    id: Id,
    sink: Box<dyn RootSink>,
    /// Single-slot cell holding the latest root the service reported.
    last_root: Mutex<Hash>,
}

/// Coalescing root publisher.
///
/// The service drops every new relay root into the anchor's latest-root cell;
/// a background pump wakes once per second and forwards the root to the sink
/// when it changed since the last successful publish. A failed publish clears
/// the pump's observed root so the next tick retries.
pub struct RootAnchor {
    shared: Arc<Shared>,
    stop: Mutex<Option<Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RootAnchor {
    pub fn new<K: RootSink>(id: Id, sink: K) -> Self {
        Self {
            shared: Arc::new(Shared {
                id,
                sink: Box::new(sink),
                last_root: Mutex::new(Hash::zeroed()),
            }),
            stop: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Record the latest relay root. Cheap; called on every mutation.
    pub fn set_root(&self, root: Hash) {
        *lock(&self.shared.last_root) = root;
    }

    /// The latest root the service reported.
    pub fn last_root(&self) -> Hash {
        *lock(&self.shared.last_root)
    }

    /// Launch the background pump. A second call while running is a no-op.
    pub fn start(&self) {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            return;
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        *lock(&self.stop) = Some(stop_tx);

        let shared = Arc::clone(&self.shared);
        // Roots reported before the pump starts are considered already
        // anchored; capture them before the spawn so a report racing the
        // thread startup is not missed.
        let mut published = *lock(&shared.last_root);
        let handle = std::thread::spawn(move || {
            tracing::info!("starting root publisher");
            loop {
                match stop_rx.recv_timeout(Duration::from_secs(1)) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        tracing::info!("root publisher finalized");
                        return;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        let latest = *lock(&shared.last_root);
                        if latest == published {
                            continue;
                        }
                        published = latest;
                        tracing::debug!(root = %latest, "updating anchored root");
                        if let Err(err) = shared.sink.set_root(&shared.id, &latest) {
                            tracing::error!(error = %err, "failed to anchor root");
                            // Forget the publish so the next tick retries.
                            published = Hash::zeroed();
                        }
                    }
                }
            }
        });
        *worker = Some(handle);
    }

    /// Signal the pump to stop and wait for its acknowledgment.
    pub fn stop_and_join(&self) {
        let stop = lock(&self.stop).take();
        if let Some(stop) = stop {
            let _ = stop.send(());
        }
        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            let _ = worker.join();
        }
    }
}

impl Drop for RootAnchor {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
