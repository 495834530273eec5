//! In-order command queue for the simulated device.
//!
//! Enqueued commands are held until the queue is drained by a blocking
//! operation, then executed in submission order. Each kernel runs one
//! work-item per element on the rayon pool.

use std::collections::VecDeque;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::trace;

use streamavg_core::kernels::running_average;

use crate::memory::Storage;

/// A queued device command.
pub(crate) enum Command {
    /// Copy host data into a buffer.
    Write { dst: Storage, data: Vec<f32> },
    /// `fillZero(w)`.
    FillZero { weights: Storage },
    /// `UpdateWeights(w, x, t)`.
    Update {
        weights: Storage,
        input: Storage,
        t: u32,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Write { .. } => "write",
            Command::FillZero { .. } => "fillZero",
            Command::Update { .. } => "UpdateWeights",
        }
    }

    fn execute(self) {
        match self {
            Command::Write { dst, data } => {
                dst.write().copy_from_slice(&data);
            }
            Command::FillZero { weights } => {
                weights.write().par_iter_mut().for_each(|w| *w = 0.0);
            }
            Command::Update { weights, input, t } => {
                let x = input.read();
                let mut w = weights.write();
                w.par_iter_mut()
                    .zip(x.par_iter())
                    .for_each(|(w, x)| *w = running_average(*w, *x, t));
            }
        }
    }
}

/// Counters describing queue activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Commands accepted by the queue.
    pub enqueued: u64,
    /// Commands executed.
    pub completed: u64,
}

impl QueueStats {
    /// Commands waiting to execute.
    pub fn pending(&self) -> u64 {
        self.enqueued - self.completed
    }
}

/// Strictly in-order queue of deferred commands.
#[derive(Default)]
pub(crate) struct CommandQueue {
    pending: VecDeque<Command>,
    stats: QueueStats,
}

impl CommandQueue {
    pub(crate) fn enqueue(&mut self, command: Command) {
        trace!("enqueue {}", command.name());
        self.pending.push_back(command);
        self.stats.enqueued += 1;
    }

    /// Execute every pending command in submission order.
    pub(crate) fn finish(&mut self) {
        while let Some(command) = self.pending.pop_front() {
            command.execute();
            self.stats.completed += 1;
        }
    }

    pub(crate) fn stats(&self) -> QueueStats {
        self.stats
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        self.finish();
    }
}

/// True if both handles refer to the same storage.
pub(crate) fn aliases(a: &Storage, b: &Storage) -> bool {
    Arc::ptr_eq(a, b)
}
