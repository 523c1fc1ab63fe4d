//! Task dispatcher: runs remote work on worker threads while the UI loop
//! keeps drawing and reading keys.
//!
//! At most `max_workers` tasks run at once. A queued task starts only when
//! neither a running task nor an earlier queued task has an overlapping
//! [`Scope`], so two operations on the same files never interleave.
//! Completion is detected by polling, never by blocking on a join.

use std::collections::VecDeque;
use std::thread::{self, JoinHandle};

use rp_base::{CancelToken, LogSink, paths};

use super::messages::UiPoster;

pub type TaskId = u64;

/// Region of the remote account a task reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Login, repository list, repository creation
    Account,
    /// Whole-repository operations (delete repository, archive download)
    Repository(String),
    /// File and directory operations
    Path { repository: String, path: String },
}

impl Scope {
    pub fn path(repository: &str, path: &str) -> Self {
        Scope::Path { repository: repository.to_string(), path: path.to_string() }
    }

    fn repository(&self) -> Option<&str> {
        match self {
            Scope::Account => None,
            Scope::Repository(r) | Scope::Path { repository: r, .. } => Some(r),
        }
    }

    pub fn overlaps(&self, other: &Scope) -> bool {
        match (self, other) {
            (Scope::Account, Scope::Path { .. }) | (Scope::Path { .. }, Scope::Account) => false,
            (Scope::Account, _) | (_, Scope::Account) => true,
            (Scope::Repository(r), other) | (other, Scope::Repository(r)) => other.repository() == Some(r.as_str()),
            (Scope::Path { repository: r1, path: p1 }, Scope::Path { repository: r2, path: p2 }) => {
                r1 == r2 && (paths::is_within(p1, p2) || paths::is_within(p2, p1))
            }
        }
    }
}

/// Handed to the work closure on its worker thread.
pub struct TaskContext {
    pub id: TaskId,
    pub cancel: CancelToken,
    pub ui: UiPoster,
}

type Work = Box<dyn FnOnce(&TaskContext) + Send + 'static>;

struct Queued {
    id: TaskId,
    label: String,
    scope: Scope,
    cancel: CancelToken,
    work: Work,
}

struct Running {
    id: TaskId,
    label: String,
    scope: Scope,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

/// One finished task, reported exactly once by [`Dispatcher::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: TaskId,
    pub label: String,
    pub panicked: bool,
}

pub struct Dispatcher {
    max_workers: usize,
    ui: UiPoster,
    next_id: TaskId,
    queue: VecDeque<Queued>,
    running: Vec<Running>,
    /// Completions produced outside a worker (thread spawn failures)
    reaped: Vec<Completion>,
    dispatched: u64,
    completed: u64,
}

impl Dispatcher {
    pub fn new(max_workers: usize, ui: UiPoster) -> Self {
        Self {
            max_workers: max_workers.max(1),
            ui,
            next_id: 1,
            queue: VecDeque::new(),
            running: Vec::new(),
            reaped: Vec::new(),
            dispatched: 0,
            completed: 0,
        }
    }

    /// Queue `work` and start it as soon as its scope is free.
    pub fn run<F>(&mut self, label: impl Into<String>, scope: Scope, work: F) -> TaskId
    where
        F: FnOnce(&TaskContext) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.dispatched += 1;
        let label = label.into();
        tracing::debug!(id, %label, ?scope, "task queued");
        self.queue.push_back(Queued { id, label, scope, cancel: CancelToken::new(), work: Box::new(work) });
        self.start_ready();
        id
    }

    /// Reap finished workers without blocking, then start whatever they unblocked.
    pub fn poll(&mut self) -> Vec<Completion> {
        let mut done = std::mem::take(&mut self.reaped);
        let mut i = 0;
        while i < self.running.len() {
            if !self.running[i].handle.is_finished() {
                i += 1;
                continue;
            }
            let task = self.running.swap_remove(i);
            let panicked = task.handle.join().is_err();
            if panicked {
                tracing::error!(id = task.id, label = %task.label, "task panicked");
            } else {
                tracing::debug!(id = task.id, label = %task.label, "task finished");
            }
            done.push(Completion { id: task.id, label: task.label, panicked });
        }
        self.completed += done.len() as u64;
        if !done.is_empty() {
            self.start_ready();
        }
        done
    }

    /// Any task queued or running.
    pub fn is_busy(&self) -> bool {
        !self.queue.is_empty() || !self.running.is_empty() || !self.reaped.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.queue.len() + self.running.len()
    }

    /// Running task labels, oldest first.
    pub fn running_labels(&self) -> Vec<&str> {
        let mut running: Vec<&Running> = self.running.iter().collect();
        running.sort_by_key(|r| r.id);
        running.into_iter().map(|r| r.label.as_str()).collect()
    }

    /// Flag every queued and running task. Returns how many were flagged.
    pub fn cancel_all(&mut self) -> usize {
        for task in &self.queue {
            task.cancel.cancel();
        }
        for task in &self.running {
            task.cancel.cancel();
        }
        self.in_flight()
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    fn start_ready(&mut self) {
        let mut blocked: Vec<Scope> = Vec::new();
        let mut i = 0;
        while i < self.queue.len() && self.running.len() < self.max_workers {
            let scope = &self.queue[i].scope;
            let free = !self.running.iter().any(|r| r.scope.overlaps(scope)) && !blocked.iter().any(|b| b.overlaps(scope));
            if !free {
                blocked.push(scope.clone());
                i += 1;
                continue;
            }
            if let Some(task) = self.queue.remove(i) {
                self.spawn(task);
            }
        }
    }

    fn spawn(&mut self, task: Queued) {
        let Queued { id, label, scope, cancel, work } = task;
        let ctx = TaskContext { id, cancel: cancel.clone(), ui: self.ui.clone() };
        let spawned = thread::Builder::new().name(format!("task-{}", id)).spawn(move || work(&ctx));
        match spawned {
            Ok(handle) => {
                tracing::debug!(id, %label, "task started");
                self.running.push(Running { id, label, scope, cancel, handle });
            }
            Err(e) => {
                self.ui.error(format!("{}: could not start worker: {}", label, e));
                self.reaped.push(Completion { id, label, panicked: false });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::time::{Duration, Instant};

    fn dispatcher(max_workers: usize) -> Dispatcher {
        let (ui, rx) = UiPoster::channel();
        // Receiver dropped: posts are discarded
        drop(rx);
        Dispatcher::new(max_workers, ui)
    }

    fn drain(d: &mut Dispatcher) -> Vec<Completion> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut all = Vec::new();
        while d.is_busy() {
            assert!(Instant::now() < deadline, "dispatcher did not drain");
            all.extend(d.poll());
            thread::sleep(Duration::from_millis(5));
        }
        all
    }

    #[test]
    fn scope_overlap_rules() {
        let account = Scope::Account;
        let repo = Scope::Repository("u/a".into());
        assert!(account.overlaps(&account));
        assert!(account.overlaps(&repo));
        assert!(!account.overlaps(&Scope::path("u/a", "x")));
        assert!(repo.overlaps(&Scope::path("u/a", "deep/file")));
        assert!(!repo.overlaps(&Scope::path("u/b", "deep/file")));
        assert!(!repo.overlaps(&Scope::Repository("u/b".into())));
        assert!(Scope::path("u/a", "a").overlaps(&Scope::path("u/a", "a/b.txt")));
        assert!(Scope::path("u/a", "").overlaps(&Scope::path("u/a", "a/b.txt")));
        assert!(!Scope::path("u/a", "a").overlaps(&Scope::path("u/a", "ab")));
        assert!(!Scope::path("u/a", "a").overlaps(&Scope::path("u/b", "a")));
    }

    #[test]
    fn busy_strictly_between_dispatch_and_completion() {
        let mut d = dispatcher(2);
        assert!(!d.is_busy());
        let gate = Arc::new(Barrier::new(2));
        let worker_gate = Arc::clone(&gate);
        d.run("wait", Scope::Account, move |_| {
            worker_gate.wait();
        });
        assert!(d.is_busy());
        assert!(d.poll().is_empty());
        assert!(d.is_busy());
        gate.wait();
        let done = drain(&mut d);
        assert_eq!(done.len(), 1);
        assert!(!d.is_busy());
    }

    #[test]
    fn exactly_one_completion_even_for_panics() {
        let mut d = dispatcher(4);
        let ok = d.run("ok", Scope::path("u/a", "x"), |_| {});
        let boom = d.run("boom", Scope::path("u/a", "y"), |_| panic!("worker failure"));
        let mut done = drain(&mut d);
        done.sort_by_key(|c| c.id);
        assert_eq!(done.len(), 2);
        assert_eq!((done[0].id, done[0].panicked), (ok, false));
        assert_eq!((done[1].id, done[1].panicked), (boom, true));
        assert_eq!(d.dispatched(), 2);
        assert_eq!(d.completed(), 2);
    }

    #[test]
    fn overlapping_scopes_never_run_concurrently() {
        let mut d = dispatcher(4);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        for i in 0..4 {
            let (active, peak) = (Arc::clone(&active), Arc::clone(&peak));
            d.run(format!("t{}", i), Scope::path("u/a", "dir"), move |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                active.fetch_sub(1, Ordering::SeqCst);
            });
        }
        assert_eq!(drain(&mut d).len(), 4);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn worker_bound_is_respected() {
        let mut d = dispatcher(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        for i in 0..6 {
            let (active, peak) = (Arc::clone(&active), Arc::clone(&peak));
            d.run(format!("t{}", i), Scope::path("u/a", &format!("f{}", i)), move |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                active.fetch_sub(1, Ordering::SeqCst);
            });
        }
        assert_eq!(drain(&mut d).len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn cancellation_reaches_running_and_queued_tasks() {
        let mut d = dispatcher(1);
        let started = Arc::new(Barrier::new(2));
        let worker_started = Arc::clone(&started);
        let observed = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&observed);
        d.run("long", Scope::Account, move |ctx| {
            worker_started.wait();
            while !ctx.cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let seen = Arc::clone(&observed);
        d.run("queued", Scope::Account, move |ctx| {
            if ctx.cancel.is_cancelled() {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        started.wait();
        assert_eq!(d.cancel_all(), 2);
        assert_eq!(drain(&mut d).len(), 2);
        assert_eq!(observed.load(Ordering::SeqCst), 2);
    }
}
