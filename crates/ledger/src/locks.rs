//! Per-key serialization for stock level mutations.
//!
//! The only shared mutable resource in the ledger is a stock level row, and
//! the only sequence that needs mutual exclusion is its read-check-write. The
//! lock table hands out exclusive holds on sets of [`LevelKey`]s: a request
//! acquires every key it touches in one shot, so a transfer holds both its
//! legs and two transfers moving opposite directions between the same
//! warehouses can never deadlock (keys are deduped into a fixed total order
//! and granted atomically under one table mutex, never one-by-one).

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use stockpile_core::{LedgerError, LedgerResult};

use crate::level::LevelKey;

/// Table of currently-held level keys.
#[derive(Debug, Default)]
pub struct LockTable {
    held: Mutex<HashSet<LevelKey>>,
    released: Condvar,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every key in `keys` is free, then hold them all.
    ///
    /// Fails with `ConcurrencyTimeout` if the full set cannot be acquired
    /// within `timeout`. The returned guard releases the keys on drop.
    pub fn acquire(&self, keys: &[LevelKey], timeout: Duration) -> LedgerResult<KeyGuard<'_>> {
        let mut keys: Vec<LevelKey> = keys.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let deadline = Instant::now() + timeout;
        let mut held = self
            .held
            .lock()
            .map_err(|_| LedgerError::storage("lock table poisoned"))?;

        while keys.iter().any(|k| held.contains(k)) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(LedgerError::ConcurrencyTimeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }

            let (guard, wait) = self
                .released
                .wait_timeout(held, remaining)
                .map_err(|_| LedgerError::storage("lock table poisoned"))?;
            held = guard;

            if wait.timed_out() && keys.iter().any(|k| held.contains(k)) {
                return Err(LedgerError::ConcurrencyTimeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }
        }

        for key in &keys {
            held.insert(*key);
        }

        Ok(KeyGuard { table: self, keys })
    }
}

/// Exclusive hold on a set of level keys; releases and wakes waiters on drop.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    table: &'a LockTable,
    keys: Vec<LevelKey>,
}

impl KeyGuard<'_> {
    pub fn keys(&self) -> &[LevelKey] {
        &self.keys
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut held) = self.table.held.lock() {
            for key in &self.keys {
                held.remove(key);
            }
        }
        self.table.released.notify_all();
    }
}
