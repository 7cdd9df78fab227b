use std::collections::VecDeque;

use super::metrics::HistorySnapshot;

pub const DEFAULT_HISTORY_SIZE: usize = 60;

/// Fixed-length FIFO window over the last `capacity` samples of one metric.
///
/// The buffer is pre-filled at construction so consumers never observe a
/// shorter-than-capacity series. Oldest sample first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    capacity: usize,
    values: VecDeque<T>,
}

impl<T: Clone> HistoryBuffer<T> {
    pub fn new(capacity: usize, fill_value: T) -> Self {
        let capacity = capacity.max(1);
        let mut values = VecDeque::with_capacity(capacity + 1);
        values.extend(std::iter::repeat_n(fill_value, capacity));
        Self { capacity, values }
    }

    pub fn push(&mut self, value: T) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Chronological copy of the buffer contents
    pub fn snapshot(&self) -> Vec<T> {
        self.values.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&T> {
        self.values.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// The named set of history buffers owned by the sampler.
#[derive(Debug, Clone)]
pub struct MetricsHistory {
    capacity: usize,
    pub cpu_usage: HistoryBuffer<f64>,
    pub memory_usage: HistoryBuffer<f64>,
    pub disk_usage: HistoryBuffer<f64>,
    /// Sent plus received, bytes per second
    pub network_total: HistoryBuffer<f64>,
    pub network_sent: HistoryBuffer<f64>,
    pub network_received: HistoryBuffer<f64>,
    pub disk_read: HistoryBuffer<f64>,
    pub disk_write: HistoryBuffer<f64>,
    pub per_core: Vec<HistoryBuffer<f64>>,
    pub cpu_frequency: HistoryBuffer<f64>,
    pub temperature: HistoryBuffer<f64>,
    pub process_count: HistoryBuffer<f64>,
}

impl MetricsHistory {
    pub fn new(core_count: usize) -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE, core_count)
    }

    pub fn with_capacity(capacity: usize, core_count: usize) -> Self {
        let buffer = || HistoryBuffer::new(capacity, 0.0);
        Self {
            capacity,
            cpu_usage: buffer(),
            memory_usage: buffer(),
            disk_usage: buffer(),
            network_total: buffer(),
            network_sent: buffer(),
            network_received: buffer(),
            disk_read: buffer(),
            disk_write: buffer(),
            per_core: (0..core_count).map(|_| buffer()).collect(),
            cpu_frequency: buffer(),
            temperature: buffer(),
            process_count: buffer(),
        }
    }

    pub fn push_network(&mut self, sent: f64, received: f64) {
        self.network_sent.push(sent);
        self.network_received.push(received);
        self.network_total.push(sent + received);
    }

    pub fn push_disk_io(&mut self, read: f64, write: f64) {
        self.disk_read.push(read);
        self.disk_write.push(write);
    }

    /// Push one value per core. Cores that appear after construction get a
    /// fresh buffer; a missing value repeats that core's last sample.
    pub fn push_cores(&mut self, values: &[f64]) {
        while self.per_core.len() < values.len() {
            self.per_core.push(HistoryBuffer::new(self.capacity, 0.0));
        }
        for (i, core) in self.per_core.iter_mut().enumerate() {
            let value = values
                .get(i)
                .copied()
                .or_else(|| core.latest().copied())
                .unwrap_or(0.0);
            core.push(value);
        }
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            cpu_usage: self.cpu_usage.snapshot(),
            memory_usage: self.memory_usage.snapshot(),
            disk_usage: self.disk_usage.snapshot(),
            network_total: self.network_total.snapshot(),
            network_sent: self.network_sent.snapshot(),
            network_received: self.network_received.snapshot(),
            disk_read: self.disk_read.snapshot(),
            disk_write: self.disk_write.snapshot(),
            per_core: self.per_core.iter().map(HistoryBuffer::snapshot).collect(),
            cpu_frequency: self.cpu_frequency.snapshot(),
            temperature: self.temperature.snapshot(),
            process_count: self.process_count.snapshot(),
        }
    }
}

impl Default for MetricsHistory {
    fn default() -> Self {
        Self::new(0)
    }
}
