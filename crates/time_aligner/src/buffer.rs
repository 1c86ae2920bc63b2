//! Sliding correlation window
//!
//! Fixed-capacity FIFO of paired vision / IMU samples backed by a heap ring
//! buffer. When full, pushing evicts the oldest slot.

use contracts::Timestamp;
use ringbuf::{traits::*, HeapRb};

/// One slot of the correlation window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationSample {
    /// IMU tick time (IMU-rate) or frame time (frame-rate), ns
    pub timestamp: Timestamp,
    /// Vision rotation angle attributed to this slot (rad)
    pub vision_angle: f64,
    /// IMU rotation angle over the same interval (rad)
    pub imu_angle: f64,
    /// IMU intervals integrated into this slot
    pub imu_ticks: usize,
}

/// Fixed-size sliding window of [`CorrelationSample`]s
pub struct CorrelationWindow {
    slots: HeapRb<CorrelationSample>,
    capacity: usize,
    evicted_count: u64,
}

impl std::fmt::Debug for CorrelationWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationWindow")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("evicted_count", &self.evicted_count)
            .finish()
    }
}

impl CorrelationWindow {
    /// Create an empty window. A zero capacity is raised to one slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: HeapRb::new(capacity),
            capacity,
            evicted_count: 0,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, sample: CorrelationSample) {
        if self.slots.is_full() {
            let _ = self.slots.try_pop();
            self.evicted_count += 1;
        }
        let _ = self.slots.try_push(sample);
    }

    pub fn len(&self) -> usize {
        self.slots.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupied fraction in `[0, 1]`
    pub fn fill_ratio(&self) -> f64 {
        self.len() as f64 / self.capacity as f64
    }

    /// Samples dropped from the front since creation
    pub fn evicted_count(&self) -> u64 {
        self.evicted_count
    }

    /// Timestamp of the newest sample
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.slots.iter().last().map(|s| s.timestamp)
    }

    /// Samples from oldest to newest
    pub fn samples(&self) -> Vec<CorrelationSample> {
        self.slots.iter().copied().collect()
    }

    pub fn vision_angles(&self) -> Vec<f64> {
        self.slots.iter().map(|s| s.vision_angle).collect()
    }

    pub fn imu_angles(&self) -> Vec<f64> {
        self.slots.iter().map(|s| s.imu_angle).collect()
    }

    /// Mean IMU intervals per slot, 0 when empty
    pub fn mean_imu_ticks(&self) -> f64 {
        let len = self.len();
        if len == 0 {
            return 0.0;
        }
        let total: usize = self.slots.iter().map(|s| s.imu_ticks).sum();
        total as f64 / len as f64
    }

    /// Drop all samples, keeping the capacity.
    pub fn clear(&mut self) {
        self.slots = HeapRb::new(self.capacity);
        self.evicted_count = 0;
    }
}
