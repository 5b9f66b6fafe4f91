//! Poison-tolerant guards for the cache's shared state.
//!
//! A panic while holding one of these locks poisons it, but the guarded data
//! (a snapshot payload, a queue of rebuild events) stays valid: the next
//! rebuild overwrites it wholesale. Recover and keep serving.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn recover<G>(op: &'static str, err: PoisonError<G>) -> G {
    warn!(op, "cache lock was poisoned, continuing with its contents");
    err.into_inner()
}

pub(crate) fn read_guard<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|err| recover(op, err))
}

pub(crate) fn write_guard<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|err| recover(op, err))
}

pub(crate) fn queue_guard<'a, T>(lock: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|err| recover(op, err))
}
