//! In-flight turn guard
//!
//! Checked synchronously at entry so a second turn can never start while a
//! planner call is outstanding. A holder that never releases (a planner call
//! that hangs) is taken over once the timeout elapses; the stale guard's
//! later drop is ignored.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Holder {
    generation: u64,
    acquired_at: Option<Instant>,
}

#[derive(Debug)]
pub struct TurnLock {
    holder: Mutex<Holder>,
    timeout: Duration,
}

impl TurnLock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            holder: Mutex::new(Holder::default()),
            timeout,
        }
    }

    /// Take the lock, or `None` if a live turn holds it
    pub fn try_acquire(&self) -> Option<TurnGuard<'_>> {
        let mut holder = self.holder.lock();
        if let Some(since) = holder.acquired_at {
            let held = since.elapsed();
            if held < self.timeout {
                return None;
            }
            tracing::warn!(held_ms = held.as_millis() as u64, "Self-healing stuck turn lock");
        }
        holder.generation = holder.generation.wrapping_add(1);
        holder.acquired_at = Some(Instant::now());
        Some(TurnGuard {
            lock: self,
            generation: holder.generation,
        })
    }

    pub fn is_held(&self) -> bool {
        self.holder
            .lock()
            .acquired_at
            .map(|since| since.elapsed() < self.timeout)
            .unwrap_or(false)
    }

    fn release(&self, generation: u64) {
        let mut holder = self.holder.lock();
        if holder.generation == generation {
            holder.acquired_at = None;
        }
    }
}

/// Releases the turn lock on drop
#[derive(Debug)]
pub struct TurnGuard<'a> {
    lock: &'a TurnLock,
    generation: u64,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.generation);
    }
}
