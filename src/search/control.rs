//! Threads around the search: a countdown that raises the abort flag and a
//! worker that waits for start signals and runs one search at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

use crate::board::PositionState;
use crate::search::alphabeta::{SearchParams, SearchResult, Searcher};

/// Sets the abort flag once `budget` has elapsed, unless cancelled first.
pub struct Countdown {
    shared: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn start(budget: Duration, abort: Arc<AtomicBool>) -> Self {
        let shared = Arc::new((Mutex::new(false), Condvar::new()));
        let remote = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            let (lock, cvar) = &*remote;
            let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let (_guard, wait) =
                cvar.wait_timeout_while(guard, budget, |cancelled| !*cancelled).unwrap_or_else(PoisonError::into_inner);
            if wait.timed_out() {
                abort.store(true, Ordering::Relaxed);
                debug!("countdown expired after {:?}", budget);
            }
        });
        Countdown { shared, handle: Some(handle) }
    }

    pub fn cancel(mut self) { self.shutdown(); }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else { return };
        let (lock, cvar) = &*self.shared;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
        let _ = handle.join();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) { self.shutdown(); }
}

pub struct SearchJob {
    pub pos: PositionState,
    pub params: SearchParams,
}

#[derive(Default)]
struct Mailbox {
    job: Option<(SearchJob, Arc<AtomicBool>)>,
    /// Stop flag of the most recently started job.
    current: Arc<AtomicBool>,
    clear_hash: bool,
    quit: bool,
}

impl Mailbox {
    fn is_empty(&self) -> bool { self.job.is_none() && !self.clear_hash && !self.quit }
}

/// Owns a [`Searcher`] on its own thread and runs each submitted job to completion.
///
/// Every job gets its own stop flag, so `stop` reaches the job last started
/// whether or not the worker has picked it up yet.
pub struct EngineThread {
    shared: Arc<(Mutex<Mailbox>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl EngineThread {
    /// `on_result` runs on the worker thread after every finished search.
    pub fn spawn<F>(params: SearchParams, mut on_result: F) -> Self
    where
        F: FnMut(SearchResult) + Send + 'static,
    {
        let shared = Arc::new((Mutex::new(Mailbox::default()), Condvar::new()));
        let mut searcher = Searcher::new(params);
        let remote = Arc::clone(&shared);
        let handle = thread::spawn(move || loop {
            let (job, clear_hash) = {
                let (lock, cvar) = &*remote;
                let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                let mut mailbox = cvar.wait_while(guard, |m| m.is_empty()).unwrap_or_else(PoisonError::into_inner);
                if mailbox.quit { break; }
                (mailbox.job.take(), std::mem::take(&mut mailbox.clear_hash))
            };
            if clear_hash { searcher.clear_tt(); }
            if let Some((mut job, abort)) = job {
                searcher.set_abort_flag(abort);
                let result = searcher.run(&mut job.pos, job.params);
                on_result(result);
            }
        });
        EngineThread { shared, handle: Some(handle) }
    }

    fn post(&self, f: impl FnOnce(&mut Mailbox)) {
        let (lock, cvar) = &*self.shared;
        f(&mut lock.lock().unwrap_or_else(PoisonError::into_inner));
        cvar.notify_one();
    }

    pub fn start(&self, job: SearchJob) {
        self.post(|m| {
            m.current = Arc::new(AtomicBool::new(false));
            m.job = Some((job, Arc::clone(&m.current)));
        });
    }

    pub fn clear_hash(&self) { self.post(|m| m.clear_hash = true); }

    pub fn stop(&self) {
        let (lock, _) = &*self.shared;
        lock.lock().unwrap_or_else(PoisonError::into_inner).current.store(true, Ordering::Relaxed);
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else { return };
        self.stop();
        self.post(|m| m.quit = true);
        let _ = handle.join();
    }

    pub fn quit(mut self) { self.shutdown(); }
}

impl Drop for EngineThread {
    fn drop(&mut self) { self.shutdown(); }
}
