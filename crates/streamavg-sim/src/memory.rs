//! Simulated device memory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use streamavg_core::backend::DeviceBuffer;
use streamavg_core::residency::BufferPlacement;

/// Backing storage shared between a buffer handle and queued commands.
pub(crate) type Storage = Arc<RwLock<Vec<f32>>>;

/// Bytes currently allocated, split by placement.
#[derive(Debug, Default)]
pub(crate) struct MemoryCounters {
    device: AtomicUsize,
    host_visible: AtomicUsize,
}

impl MemoryCounters {
    fn counter(&self, placement: BufferPlacement) -> &AtomicUsize {
        if placement.is_host_visible() {
            &self.host_visible
        } else {
            &self.device
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.device.load(Ordering::Relaxed) + self.host_visible.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self) -> MemoryUsage {
        MemoryUsage {
            device_bytes: self.device.load(Ordering::Relaxed),
            host_visible_bytes: self.host_visible.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of simulated memory usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Bytes in device-exclusive buffers.
    pub device_bytes: usize,
    /// Bytes in host-visible buffers.
    pub host_visible_bytes: usize,
}

/// Shared view of a backend's allocation counters.
///
/// Outlives the backend, so release of every buffer can be observed after
/// the backend (or an engine owning it) is dropped.
#[derive(Debug, Clone)]
pub struct MemoryTracker {
    counters: Arc<MemoryCounters>,
}

impl MemoryTracker {
    pub(crate) fn new(counters: Arc<MemoryCounters>) -> Self {
        Self { counters }
    }

    /// Bytes currently allocated, by placement.
    pub fn current_usage(&self) -> MemoryUsage {
        self.counters.snapshot()
    }

    /// Whether every buffer has been released.
    pub fn is_released(&self) -> bool {
        self.counters.total() == 0
    }
}

/// Buffer allocated by the simulated backend. Releases its accounting on drop.
pub struct SimBuffer {
    id: u64,
    len: usize,
    storage: Storage,
    placement: BufferPlacement,
    counters: Arc<MemoryCounters>,
}

impl SimBuffer {
    pub(crate) fn new(
        id: u64,
        len: usize,
        placement: BufferPlacement,
        counters: Arc<MemoryCounters>,
    ) -> Self {
        counters
            .counter(placement)
            .fetch_add(len * std::mem::size_of::<f32>(), Ordering::Relaxed);

        // Device memory is uninitialized on real hardware; NaN makes reads
        // before the zero-fill visible.
        Self {
            id,
            len,
            storage: Arc::new(RwLock::new(vec![f32::NAN; len])),
            placement,
            counters,
        }
    }

    /// Buffer id, unique within its backend.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl DeviceBuffer for SimBuffer {
    fn len(&self) -> usize {
        self.len
    }

    fn placement(&self) -> BufferPlacement {
        self.placement
    }
}

impl Drop for SimBuffer {
    fn drop(&mut self) {
        self.counters
            .counter(self.placement)
            .fetch_sub(self.size_bytes(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounting_follows_buffer_lifetime() {
        let counters = Arc::new(MemoryCounters::default());
        let a = SimBuffer::new(1, 8, BufferPlacement::DeviceWriteOnly, counters.clone());
        let b = SimBuffer::new(2, 4, BufferPlacement::HostVisibleReadOnly, counters.clone());

        assert_eq!(
            counters.snapshot(),
            MemoryUsage {
                device_bytes: 32,
                host_visible_bytes: 16
            }
        );
        assert_eq!(counters.total(), 48);

        drop(a);
        assert_eq!(counters.snapshot().device_bytes, 0);
        drop(b);
        assert_eq!(counters.total(), 0);
    }

    #[test]
    fn test_tracker_outlives_buffers() {
        let counters = Arc::new(MemoryCounters::default());
        let tracker = MemoryTracker::new(counters.clone());
        let buf = SimBuffer::new(7, 2, BufferPlacement::HostVisibleReadWrite, counters);

        assert_eq!(buf.id(), 7);
        assert_eq!(tracker.current_usage().host_visible_bytes, 8);
        assert!(!tracker.is_released());

        drop(buf);
        assert!(tracker.is_released());
    }

    #[test]
    fn test_fresh_buffer_is_uninitialized() {
        let counters = Arc::new(MemoryCounters::default());
        let buf = SimBuffer::new(1, 3, BufferPlacement::DeviceReadOnly, counters);
        assert_eq!(buf.len(), 3);
        assert!(buf.storage().read().iter().all(|v| v.is_nan()));
    }
}
