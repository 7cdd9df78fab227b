//! Non-blocking hand-off between the engine and the presentation layer.
//!
//! Each stream is a `watch` channel: the producer overwrites, the consumer
//! sees the latest value. Nothing queues up when the consumer is slow and
//! nothing blocks when it polls an empty channel.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use super::metrics::{ProcessTable, SystemInfo, SystemSnapshot};

/// One published item, as returned by `SnapshotSubscriber::drain`
#[derive(Debug, Clone)]
pub enum EngineUpdate {
    Metrics(Arc<SystemSnapshot>),
    Processes(Arc<ProcessTable>),
    SystemInfo(Arc<SystemInfo>),
}

/// Shared open/closed flag for every producer of one channel set.
///
/// Publishers hold the read lock across the send and `close` takes the
/// write lock, so once `close` returns no send is in flight.
#[derive(Debug, Clone)]
struct PublishGate {
    open: Arc<RwLock<bool>>,
}

impl PublishGate {
    fn new() -> Self {
        Self {
            open: Arc::new(RwLock::new(true)),
        }
    }

    /// Run `send` only while the gate is open
    fn send_if_open(&self, send: impl FnOnce()) -> bool {
        let open = self.open.read().unwrap_or_else(PoisonError::into_inner);
        if *open {
            send();
        }
        *open
    }

    fn close(&self) {
        *self.open.write().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

/// Producer side for per-tick snapshots (owned by the sampling loop)
pub struct SnapshotPublisher {
    tx: watch::Sender<Option<Arc<SystemSnapshot>>>,
    gate: PublishGate,
}

impl SnapshotPublisher {
    /// Returns false once the channel set is closed
    pub fn publish(&self, snapshot: SystemSnapshot) -> bool {
        // send_replace stores the value even while no receiver is alive
        self.gate.send_if_open(|| {
            self.tx.send_replace(Some(Arc::new(snapshot)));
        })
    }
}

/// Producer side for process tables and host info (owned by the job worker)
pub struct TablePublisher {
    processes_tx: watch::Sender<Option<Arc<ProcessTable>>>,
    info_tx: watch::Sender<Option<Arc<SystemInfo>>>,
    gate: PublishGate,
}

impl TablePublisher {
    pub fn publish_processes(&self, table: ProcessTable) -> bool {
        self.gate.send_if_open(|| {
            self.processes_tx.send_replace(Some(Arc::new(table)));
        })
    }

    pub fn publish_system_info(&self, info: SystemInfo) -> bool {
        self.gate.send_if_open(|| {
            self.info_tx.send_replace(Some(Arc::new(info)));
        })
    }
}

/// Consumer side
#[derive(Clone)]
pub struct SnapshotSubscriber {
    snapshot_rx: watch::Receiver<Option<Arc<SystemSnapshot>>>,
    processes_rx: watch::Receiver<Option<Arc<ProcessTable>>>,
    info_rx: watch::Receiver<Option<Arc<SystemInfo>>>,
    gate: PublishGate,
}

pub fn snapshot_channel() -> (SnapshotPublisher, TablePublisher, SnapshotSubscriber) {
    let (tx, snapshot_rx) = watch::channel(None);
    let (processes_tx, processes_rx) = watch::channel(None);
    let (info_tx, info_rx) = watch::channel(None);
    let gate = PublishGate::new();

    (
        SnapshotPublisher {
            tx,
            gate: gate.clone(),
        },
        TablePublisher {
            processes_tx,
            info_tx,
            gate: gate.clone(),
        },
        SnapshotSubscriber {
            snapshot_rx,
            processes_rx,
            info_rx,
            gate,
        },
    )
}

/// Take the value if it changed since the last call; never blocks
fn take_changed<T: Clone>(rx: &mut watch::Receiver<Option<T>>) -> Option<T> {
    // An error means the producer is gone; its last value stays readable via borrow()
    if !rx.has_changed().unwrap_or(false) {
        return None;
    }
    rx.borrow_and_update().clone()
}

impl SnapshotSubscriber {
    /// Every stream that published since the previous drain.
    /// Returns an empty vector when nothing new is available.
    pub fn drain(&mut self) -> Vec<EngineUpdate> {
        let mut updates = Vec::new();

        if let Some(snapshot) = take_changed(&mut self.snapshot_rx) {
            updates.push(EngineUpdate::Metrics(snapshot));
        }
        if let Some(table) = take_changed(&mut self.processes_rx) {
            updates.push(EngineUpdate::Processes(table));
        }
        if let Some(info) = take_changed(&mut self.info_rx) {
            updates.push(EngineUpdate::SystemInfo(info));
        }

        updates
    }

    pub fn latest_snapshot(&self) -> Option<Arc<SystemSnapshot>> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn latest_processes(&self) -> Option<Arc<ProcessTable>> {
        self.processes_rx.borrow().clone()
    }

    pub fn latest_system_info(&self) -> Option<Arc<SystemInfo>> {
        self.info_rx.borrow().clone()
    }

    /// Refuse every later publish on all streams. Values already published
    /// stay readable.
    pub fn close(&self) {
        self.gate.close();
    }

    /// Raw receiver for consumers that want to await changes
    pub fn snapshots(&self) -> watch::Receiver<Option<Arc<SystemSnapshot>>> {
        self.snapshot_rx.clone()
    }
}
