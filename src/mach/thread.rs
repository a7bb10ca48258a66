use crate::error;
use crate::lang::Error;
use log::{info, warn};
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

type Result<T> = std::result::Result<T, Error>;

pub type ThreadId = String;

#[derive(Debug, Clone, PartialEq)]
pub enum ThreadStatus {
    Running,
    Finished,
    Failed(String),
    Killed,
}

struct Entry {
    abort: Arc<AtomicBool>,
    status: Arc<Mutex<ThreadStatus>>,
    handle: Option<JoinHandle<()>>,
}

/// ## Thread table
///
/// Every `AS THREAD` invocation gets an entry with an abort flag the
/// thread's executor polls. Killing a thread only sets the flag.

#[derive(Default)]
pub struct ThreadTable {
    next: AtomicUsize,
    threads: Mutex<BTreeMap<ThreadId, Entry>>,
}

impl std::fmt::Debug for ThreadTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ThreadTable {:?}", self.ids())
    }
}

impl ThreadTable {
    pub fn new() -> ThreadTable {
        ThreadTable::default()
    }

    /// Start `body` on a new OS thread. The identifier is returned
    /// without waiting for the thread to run.
    pub fn spawn<F>(&self, body: F) -> Result<ThreadId>
    where
        F: FnOnce(ThreadId, Arc<AtomicBool>) -> Result<()> + Send + 'static,
    {
        let id = format!("THREAD_{}", self.next.fetch_add(1, Ordering::SeqCst) + 1);
        let abort = Arc::new(AtomicBool::new(false));
        let status = Arc::new(Mutex::new(ThreadStatus::Running));
        let thread_id = id.clone();
        let thread_abort = Arc::clone(&abort);
        let thread_status = Arc::clone(&status);
        // Registered before the thread starts so it can always find itself.
        let mut threads = self.threads.lock();
        ThreadTable::prune(&mut threads);
        let handle = std::thread::Builder::new()
            .name(id.clone())
            .spawn(move || {
                info!("{} started", thread_id);
                let result = body(thread_id.clone(), Arc::clone(&thread_abort));
                let mut status = thread_status.lock();
                *status = match result {
                    Ok(()) => ThreadStatus::Finished,
                    Err(_) if thread_abort.load(Ordering::SeqCst) => ThreadStatus::Killed,
                    Err(e) => {
                        warn!("{} ended with {}", thread_id, e);
                        ThreadStatus::Failed(e.to_string())
                    }
                };
                info!("{} {:?}", thread_id, *status);
            })
            .map_err(|e| error!(InternalError; e.to_string()))?;
        threads.insert(
            id.clone(),
            Entry {
                abort,
                status,
                handle: Some(handle),
            },
        );
        Ok(id)
    }

    /// Forget threads that have ended and exited.
    fn prune(threads: &mut BTreeMap<ThreadId, Entry>) {
        threads.retain(|_, e| {
            *e.status.lock() == ThreadStatus::Running
                || e.handle.as_ref().map_or(false, |h| !h.is_finished())
        });
    }

    pub fn status(&self, id: &str) -> Option<ThreadStatus> {
        self.threads.lock().get(id).map(|e| e.status.lock().clone())
    }

    pub fn ids(&self) -> Vec<ThreadId> {
        self.threads.lock().keys().cloned().collect()
    }

    /// Ask a thread to stop at its next check.
    pub fn kill(&self, id: &str) -> Result<()> {
        match self.threads.lock().get(id) {
            Some(entry) => {
                entry.abort.store(true, Ordering::SeqCst);
                Ok(())
            }
            None => Err(error!(UnknownThread; id)),
        }
    }

    pub fn abort_all(&self) {
        for entry in self.threads.lock().values() {
            entry.abort.store(true, Ordering::SeqCst);
        }
    }

    /// Wait for every thread except `caller` and forget them.
    pub fn join_all(&self, caller: &str) {
        let handles: Vec<(ThreadId, JoinHandle<()>)> = {
            let mut threads = self.threads.lock();
            let ids: Vec<ThreadId> = threads.keys().filter(|k| *k != caller).cloned().collect();
            ids.into_iter()
                .filter_map(|id| {
                    threads
                        .remove(&id)
                        .and_then(|mut e| e.handle.take())
                        .map(|h| (id, h))
                })
                .collect()
        };
        for (id, handle) in handles {
            if handle.join().is_err() {
                warn!("{} panicked", id);
            }
        }
    }
}

#[derive(Debug, Default)]
struct LockState {
    owner: Option<ThreadId>,
    count: usize,
}

/// ## Named locks
///
/// Created on first reference. Re-entrant for the owning thread; a
/// waiting thread wakes every `poll` to check its abort flag.

#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, LockState>>,
    released: Condvar,
}

impl LockRegistry {
    pub fn new() -> LockRegistry {
        LockRegistry::default()
    }

    pub fn lock(&self, name: &str, owner: &str, abort: &AtomicBool, poll: Duration) -> Result<()> {
        let mut locks = self.locks.lock();
        loop {
            let state = locks.entry(name.to_string()).or_default();
            match &state.owner {
                None => {
                    state.owner = Some(owner.to_string());
                    state.count = 1;
                    return Ok(());
                }
                Some(o) if o == owner => {
                    state.count += 1;
                    return Ok(());
                }
                Some(_) => {
                    if abort.load(Ordering::SeqCst) {
                        return Err(error!(Aborted));
                    }
                    self.released.wait_for(&mut locks, poll);
                }
            }
        }
    }

    pub fn unlock(&self, name: &str, owner: &str) -> Result<()> {
        let mut locks = self.locks.lock();
        match locks.get_mut(name) {
            Some(state) if state.owner.as_deref() == Some(owner) => {
                state.count -= 1;
                if state.count == 0 {
                    state.owner = None;
                    self.released.notify_all();
                }
                Ok(())
            }
            _ => Err(error!(LockNotHeld; name)),
        }
    }

    pub fn owner(&self, name: &str) -> Option<ThreadId> {
        self.locks.lock().get(name).and_then(|s| s.owner.clone())
    }

    /// Drop every lock `owner` holds, as when its thread ends.
    pub fn release_all(&self, owner: &str) {
        let mut locks = self.locks.lock();
        let mut released = false;
        for state in locks.values_mut() {
            if state.owner.as_deref() == Some(owner) {
                state.owner = None;
                state.count = 0;
                released = true;
            }
        }
        if released {
            self.released.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_ended_threads_are_pruned() {
        let table = ThreadTable::new();
        let first = table.spawn(|_, _| Ok(())).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while table.ids().contains(&first) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            table.spawn(|_, _| Ok(())).unwrap();
        }
        assert!(!table.ids().contains(&first));
        table.join_all("");
        assert!(table.ids().is_empty());
    }

    #[test]
    fn test_running_threads_are_kept() {
        let table = ThreadTable::new();
        let slow = table
            .spawn(|_, abort| {
                while !abort.load(Ordering::SeqCst) {
                    std::thread::sleep(Duration::from_millis(1));
                }
                Ok(())
            })
            .unwrap();
        for _ in 0..3 {
            table.spawn(|_, _| Ok(())).unwrap();
        }
        assert_eq!(table.status(&slow), Some(ThreadStatus::Running));
        table.kill(&slow).unwrap();
        table.join_all("");
    }

    #[test]
    fn test_reentrant_lock() {
        let locks = LockRegistry::new();
        let abort = AtomicBool::new(false);
        let poll = Duration::from_millis(1);
        locks.lock("A", "T1", &abort, poll).unwrap();
        locks.lock("A", "T1", &abort, poll).unwrap();
        locks.unlock("A", "T1").unwrap();
        assert_eq!(locks.owner("A"), Some("T1".to_string()));
        locks.unlock("A", "T1").unwrap();
        assert_eq!(locks.owner("A"), None);
        abort.store(true, Ordering::SeqCst);
        locks.lock("B", "T1", &abort, poll).unwrap();
        assert_eq!(
            locks.lock("B", "T2", &abort, poll).unwrap_err().code(),
            crate::lang::ErrorCode::Aborted
        );
    }
}
