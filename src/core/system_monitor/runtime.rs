//! Tokio runtime hosting the sampling loop and the background job worker.
//!
//! The presentation layer only talks to `MetricsRuntime`: it drains published
//! updates, sends commands, and asks for one-shot work (details, termination).

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinError;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::config::Config;
use crate::error::{MonitorError, Result};

use super::channel::{
    snapshot_channel, EngineUpdate, SnapshotPublisher, SnapshotSubscriber, TablePublisher,
};
use super::collector::{SysinfoCollector, SysinfoProcessCollector};
use super::metrics::{ProcessDetails, ProcessTable, SystemInfo, SystemSnapshot};
use super::process_control::{terminate_all, TerminationReport};
use super::process_table;
use super::sampler::{Job, Sampler};
use super::source::{CounterSource, HostSource};

const WORKER_THREADS: usize = 2;
const PANIC_BACKOFF: Duration = Duration::from_secs(1);
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Commands from the consumer to the sampling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    /// Resample now and treat every slow schedule as due
    ForceUpdate,
}

enum WorkerRequest {
    Job(Job),
    Details {
        pid: u32,
        reply: oneshot::Sender<Result<ProcessDetails>>,
    },
    Terminate {
        pids: Vec<u32>,
        reply: oneshot::Sender<TerminationReport>,
    },
}

/// One queued-flag per job kind, shared by the loop and the worker.
/// A kind is queued at most once, so the job channel never fills up.
#[derive(Debug, Default)]
struct PendingJobs {
    process_scan: AtomicBool,
    system_info: AtomicBool,
}

impl PendingJobs {
    fn flag(&self, job: Job) -> &AtomicBool {
        match job {
            Job::ProcessScan => &self.process_scan,
            Job::SystemInfo => &self.system_info,
        }
    }

    /// True when no job of this kind was already waiting
    fn claim(&self, job: Job) -> bool {
        !self.flag(job).swap(true, Ordering::SeqCst)
    }

    fn release(&self, job: Job) {
        self.flag(job).store(false, Ordering::SeqCst);
    }
}

/// What the job worker hands back for publishing
enum Served {
    Nothing,
    Processes(ProcessTable),
    SystemInfo(SystemInfo),
}

/// Wrapper around the Tokio runtime running the metrics engine.
pub struct MetricsRuntime {
    updates: SnapshotSubscriber,
    command_tx: mpsc::Sender<EngineCommand>,
    request_tx: mpsc::Sender<WorkerRequest>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    kill_timeout: Duration,
    handle: tokio::runtime::Handle,
    runtime: Option<tokio::runtime::Runtime>,
}

impl MetricsRuntime {
    /// Start the engine against the local host.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_sources(
            config,
            Box::new(SysinfoCollector::new()),
            Box::new(SysinfoProcessCollector::new()),
        )
    }

    /// Start the engine against the given sources.
    pub fn with_sources(
        config: &Config,
        counters: Box<dyn CounterSource>,
        host: Box<dyn HostSource>,
    ) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .enable_time()
            .thread_name("metrics-worker")
            .build()?;
        let handle = runtime.handle().clone();

        let (snapshot_pub, table_pub, updates) = snapshot_channel();
        let (command_tx, command_rx) = mpsc::channel(1);
        // One slot per job kind; PendingJobs coalesces the rest
        let (job_tx, job_rx) = mpsc::channel(2);
        let pending = Arc::new(PendingJobs::default());
        let (request_tx, request_rx) = mpsc::channel(8);
        let (count_tx, count_rx) = watch::channel(0usize);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let running = Arc::new(AtomicBool::new(true));

        let sampler = Sampler::new(counters, config, Instant::now());

        runtime.spawn(sampling_loop(SamplingLoop {
            sampler,
            period: config.sample_interval(),
            publisher: snapshot_pub,
            jobs: job_tx,
            pending: Arc::clone(&pending),
            commands: command_rx,
            process_count: count_rx,
            running: Arc::clone(&running),
            shutdown: shutdown_tx.subscribe(),
        }));

        runtime.spawn(job_worker(JobWorker {
            host,
            process_limit: config.process_limit,
            disk_mount: config.disk_mount.clone(),
            publisher: table_pub,
            process_count: count_tx,
            jobs: job_rx,
            pending,
            requests: request_rx,
            running: Arc::clone(&running),
            shutdown: shutdown_tx.subscribe(),
        }));

        Ok(Self {
            updates,
            command_tx,
            request_tx,
            running,
            shutdown_tx,
            kill_timeout: config.kill_timeout(),
            handle,
            runtime: Some(runtime),
        })
    }

    /// Everything published since the previous call; never blocks.
    pub fn drain(&mut self) -> Vec<EngineUpdate> {
        self.updates.drain()
    }

    pub fn latest_snapshot(&self) -> Option<Arc<SystemSnapshot>> {
        self.updates.latest_snapshot()
    }

    pub fn latest_processes(&self) -> Option<Arc<ProcessTable>> {
        self.updates.latest_processes()
    }

    pub fn latest_system_info(&self) -> Option<Arc<SystemInfo>> {
        self.updates.latest_system_info()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Option<Arc<SystemSnapshot>>> {
        self.updates.snapshots()
    }

    /// Ask for an immediate resample. Coalesces with a pending request.
    pub fn force_update(&self) {
        if let Err(e) = self.command_tx.try_send(EngineCommand::ForceUpdate) {
            log::debug!("Force update not queued: {}", e);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal both tasks to stop. Nothing is published once this returns.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::info!("Stopping metrics engine");
        }
        self.updates.close();
        // No receivers left just means the tasks already exited
        let _ = self.shutdown_tx.send(());
    }

    /// Stop the engine and tear the runtime down.
    pub fn shutdown(self) {
        self.stop();
        // Drop does the rest
    }

    /// Send a termination request to every pid, bounded by `kill_timeout`.
    /// A process rescan follows every request.
    pub fn terminate(&self, pids: &[u32]) -> TerminationReport {
        if pids.is_empty() {
            return TerminationReport::default();
        }

        let (reply, rx) = oneshot::channel();
        let request = WorkerRequest::Terminate {
            pids: pids.to_vec(),
            reply,
        };

        match self.request(request, rx) {
            Ok(Some(report)) => report,
            Ok(None) => TerminationReport::all_failed(pids, "metrics engine stopped"),
            Err(_) => TerminationReport::all_failed(pids, "timed out"),
        }
    }

    /// One-shot detail lookup for a single process.
    pub fn process_details(&self, pid: u32) -> Result<ProcessDetails> {
        let (reply, rx) = oneshot::channel();

        match self.request(WorkerRequest::Details { pid, reply }, rx) {
            Ok(Some(details)) => details,
            Ok(None) => Err(MonitorError::runtime("metrics engine stopped")),
            Err(_) => Err(MonitorError::runtime(format!(
                "timed out reading details for pid {}",
                pid
            ))),
        }
    }

    /// Queue a request for the job worker and wait for its reply.
    /// `Ok(None)` when the worker is gone, `Err` on timeout.
    fn request<T>(
        &self,
        request: WorkerRequest,
        rx: oneshot::Receiver<T>,
    ) -> std::result::Result<Option<T>, tokio::time::error::Elapsed> {
        if !self.is_running() {
            return Ok(None);
        }

        let requests = self.request_tx.clone();
        self.handle.block_on(tokio::time::timeout(self.kill_timeout, async move {
            if requests.send(request).await.is_err() {
                return None;
            }
            rx.await.ok()
        }))
    }
}

impl Drop for MetricsRuntime {
    fn drop(&mut self) {
        self.stop();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
        }
        log::info!("Metrics engine stopped");
    }
}

/// Run `f` against owned state on the blocking pool and hand the state back.
///
/// A panic inside `f` is caught so the state survives it; the outer error is
/// only returned when the blocking task itself was cancelled.
async fn with_blocking<S, T, F>(
    state: S,
    f: F,
) -> std::result::Result<(S, thread::Result<T>), JoinError>
where
    S: Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut S) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut state = state;
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(&mut state)));
        (state, result)
    })
    .await
}

struct SamplingLoop {
    sampler: Sampler,
    period: Duration,
    publisher: SnapshotPublisher,
    jobs: mpsc::Sender<Job>,
    pending: Arc<PendingJobs>,
    commands: mpsc::Receiver<EngineCommand>,
    process_count: watch::Receiver<usize>,
    running: Arc<AtomicBool>,
    shutdown: broadcast::Receiver<()>,
}

async fn sampling_loop(task: SamplingLoop) {
    let SamplingLoop {
        mut sampler,
        period,
        publisher,
        jobs,
        pending,
        mut commands,
        process_count,
        running,
        mut shutdown,
    } = task;

    log::info!("Sampling loop started ({} ms period)", period.as_millis());

    sampler = match with_blocking(sampler, |s| s.prime(Instant::now())).await {
        Ok((s, Ok(()))) => s,
        Ok((s, Err(_))) => {
            log::error!("Initial sampling pass panicked");
            s
        }
        Err(e) => {
            log::error!("Initial sampling pass was cancelled: {}", e);
            return;
        }
    };

    // CPU usage needs two readings at least this far apart
    tokio::select! {
        _ = tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL) => {}
        _ = shutdown.recv() => return,
    }

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Some(command) = commands.recv() => match command {
                EngineCommand::ForceUpdate => {
                    sampler.force_due(Instant::now());
                    ticker.reset();
                }
            },
            _ = shutdown.recv() => break,
        }

        if !running.load(Ordering::SeqCst) {
            break;
        }

        sampler.set_process_count(*process_count.borrow());

        let (returned, outcome) = match with_blocking(sampler, |s| s.tick(Instant::now())).await {
            Ok(pair) => pair,
            Err(e) => {
                log::error!("Sampling task was cancelled: {}", e);
                return;
            }
        };
        sampler = returned;

        if !running.load(Ordering::SeqCst) {
            break;
        }

        match outcome {
            Ok(outcome) => {
                if outcome.failed_reads > 0 {
                    log::debug!(
                        "Tick {}: {} reads fell back to cached values",
                        outcome.snapshot.tick,
                        outcome.failed_reads
                    );
                }
                for job in outcome.jobs {
                    if !pending.claim(job) {
                        log::debug!("{:?} already queued, coalesced", job);
                        continue;
                    }
                    if let Err(e) = jobs.try_send(job) {
                        pending.release(job);
                        log::warn!("Could not queue {:?}: {}", job, e);
                    }
                }
                if !publisher.publish(outcome.snapshot) {
                    break;
                }
            }
            Err(_) => {
                log::error!("Sampling iteration panicked, retrying shortly");
                tokio::select! {
                    _ = tokio::time::sleep(PANIC_BACKOFF) => {}
                    _ = shutdown.recv() => break,
                }
            }
        }
    }

    log::info!("Sampling loop stopped after {} ticks", sampler.ticks());
}

struct JobWorker {
    host: Box<dyn HostSource>,
    process_limit: usize,
    disk_mount: String,
    publisher: TablePublisher,
    process_count: watch::Sender<usize>,
    jobs: mpsc::Receiver<Job>,
    pending: Arc<PendingJobs>,
    requests: mpsc::Receiver<WorkerRequest>,
    running: Arc<AtomicBool>,
    shutdown: broadcast::Receiver<()>,
}

async fn job_worker(task: JobWorker) {
    let JobWorker {
        mut host,
        process_limit,
        disk_mount,
        publisher,
        process_count,
        mut jobs,
        pending,
        mut requests,
        running,
        mut shutdown,
    } = task;

    log::info!("Job worker started");

    loop {
        // Consumer requests first so a kill never waits behind a queued scan
        let request = tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            Some(request) = requests.recv() => request,
            Some(job) = jobs.recv() => {
                // Off the queue now; the next one of this kind may be queued
                pending.release(job);
                WorkerRequest::Job(job)
            }
            else => break,
        };

        if !running.load(Ordering::SeqCst) {
            break;
        }

        let mount = disk_mount.clone();
        let served = with_blocking(host, move |h| {
            serve(h.as_mut(), request, process_limit, &mount)
        })
        .await;

        let served = match served {
            Ok((returned, result)) => {
                host = returned;
                result
            }
            Err(e) => {
                log::error!("Job worker task was cancelled: {}", e);
                return;
            }
        };

        if !running.load(Ordering::SeqCst) {
            break;
        }

        let published = match served {
            Ok(Served::Processes(table)) => {
                let total_seen = table.total_seen;
                let published = publisher.publish_processes(table);
                if published {
                    process_count.send_replace(total_seen);
                }
                published
            }
            Ok(Served::SystemInfo(info)) => publisher.publish_system_info(info),
            Ok(Served::Nothing) => true,
            Err(_) => {
                log::error!("Background job panicked");
                true
            }
        };

        if !published {
            break;
        }
    }

    log::info!("Job worker stopped");
}

fn serve(
    host: &mut dyn HostSource,
    request: WorkerRequest,
    process_limit: usize,
    disk_mount: &str,
) -> Served {
    match request {
        WorkerRequest::Job(Job::ProcessScan) => rescan(host, process_limit),
        WorkerRequest::Job(Job::SystemInfo) => match host.system_info(disk_mount) {
            Ok(info) => Served::SystemInfo(info),
            Err(e) => {
                log::warn!("System info read failed: {}", e);
                Served::Nothing
            }
        },
        WorkerRequest::Details { pid, reply } => {
            // The caller may have timed out and dropped the receiver
            let _ = reply.send(host.process_details(pid));
            Served::Nothing
        }
        WorkerRequest::Terminate { pids, reply } => {
            let report = terminate_all(&mut *host, &pids);
            let _ = reply.send(report);
            rescan(host, process_limit)
        }
    }
}

fn rescan(host: &mut dyn HostSource, process_limit: usize) -> Served {
    match process_table::scan(host, process_limit) {
        Ok(table) => Served::Processes(table),
        Err(e) => {
            log::warn!("Process scan failed: {}", e);
            Served::Nothing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_jobs_queue_each_kind_once() {
        let pending = PendingJobs::default();

        assert!(pending.claim(Job::ProcessScan));
        assert!(!pending.claim(Job::ProcessScan));
        // A queued scan never blocks the host info refresh
        assert!(pending.claim(Job::SystemInfo));
        assert!(!pending.claim(Job::SystemInfo));

        pending.release(Job::ProcessScan);
        assert!(pending.claim(Job::ProcessScan));
    }

    #[test]
    fn test_job_channel_accepts_one_of_each_kind() {
        let (tx, mut rx) = mpsc::channel(2);
        let pending = PendingJobs::default();

        // Two scan ticks and then an info tick while the worker is busy
        let mut queued = Vec::new();
        for job in [Job::ProcessScan, Job::ProcessScan, Job::SystemInfo] {
            if pending.claim(job) {
                tx.try_send(job).unwrap();
                queued.push(job);
            }
        }

        assert_eq!(queued, vec![Job::ProcessScan, Job::SystemInfo]);
        assert_eq!(rx.try_recv(), Ok(Job::ProcessScan));
        assert_eq!(rx.try_recv(), Ok(Job::SystemInfo));
    }
}
