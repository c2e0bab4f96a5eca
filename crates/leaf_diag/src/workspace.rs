//! Per-invocation working buffers.
//!
//! Every intermediate image, mask or contour list produced during one
//! analysis is wrapped in a [`Scoped`] guard registered with a
//! [`BufferLedger`]. The guard releases its ledger entry when dropped, so the
//! live count returns to zero on every exit path, errors included.

use std::{
    ops::{Deref, DerefMut},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

#[derive(Debug, Default)]
struct Counters {
    live: AtomicUsize,
    acquired: AtomicUsize,
}

/// Shared bookkeeping of working buffers.
#[derive(Debug, Clone, Default)]
pub struct BufferLedger {
    counters: Arc<Counters>,
}

impl BufferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` as a working buffer.
    pub fn scoped<T>(&self, value: T) -> Scoped<T> {
        self.counters.live.fetch_add(1, Ordering::AcqRel);
        self.counters.acquired.fetch_add(1, Ordering::AcqRel);
        Scoped {
            value: Some(value),
            counters: Arc::clone(&self.counters),
        }
    }

    /// Buffers currently held.
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::Acquire)
    }

    /// Buffers ever acquired through this ledger.
    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::Acquire)
    }
}

/// A working buffer whose ledger entry is released on drop.
#[derive(Debug)]
pub struct Scoped<T> {
    value: Option<T>,
    counters: Arc<Counters>,
}

impl<T> Scoped<T> {
    /// Release the ledger entry and hand the value to the caller.
    pub fn into_inner(mut self) -> T {
        match self.value.take() {
            Some(value) => value,
            // `value` is only taken here or in `drop`
            None => unreachable!("scoped buffer already released"),
        }
    }
}

impl<T> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("scoped buffer already released")
    }
}

impl<T> DerefMut for Scoped<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("scoped buffer already released")
    }
}

impl<T> Drop for Scoped<T> {
    fn drop(&mut self) {
        self.value = None;
        self.counters.live.fetch_sub(1, Ordering::AcqRel);
    }
}
