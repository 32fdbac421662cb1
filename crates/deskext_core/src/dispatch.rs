//! Thread-affine task dispatch across named execution contexts.
//!
//! # Responsibility
//! - Back each logical context (UI, file I/O, network I/O) with one worker.
//! - Run a task inline when the caller already is on the target context,
//!   otherwise enqueue it for that context and return immediately.
//!
//! # Invariants
//! - Tasks posted to one context from one origin context run in FIFO order.
//! - No task is dropped: queues are drained on shutdown, and tasks posted to a
//!   closed context run inline on the caller, tagged with the target context.
//! - A panicking task is logged and does not stop its worker.
//! - Context identity is scoped to one dispatcher instance.

use log::{error, info, warn};
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Named logical execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextId {
    /// Browser UI context. Engine calls and manifest continuations run here.
    Ui,
    /// Disk I/O context. Manifest and resource reads run here.
    File,
    /// Network/IO context. Resource provider registration runs here.
    Io,
}

impl ContextId {
    /// Every context, in worker start order.
    pub const ALL: [ContextId; 3] = [ContextId::Ui, ContextId::File, ContextId::Io];

    /// Stable label used in logs and thread names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ui => "ui",
            Self::File => "file",
            Self::Io => "io",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Ui => 0,
            Self::File => 1,
            Self::Io => 2,
        }
    }
}

impl Display for ContextId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of work executed on a context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Dispatcher startup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    WorkerSpawn { context: ContextId, message: String },
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WorkerSpawn { context, message } => {
                write!(f, "failed to spawn `{context}` context worker: {message}")
            }
        }
    }
}

impl Error for DispatchError {}

static NEXT_DISPATCHER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_CONTEXT: Cell<Option<(u64, ContextId)>> = const { Cell::new(None) };
}

struct Lane {
    context: ContextId,
    sender: Mutex<Option<Sender<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Fixed pool of named single-threaded execution contexts.
pub struct Dispatcher {
    id: u64,
    lanes: Vec<Lane>,
}

impl Dispatcher {
    /// Starts one worker thread per context.
    ///
    /// # Errors
    /// - Returns `WorkerSpawn` when the OS refuses to create a worker thread.
    ///   Workers started before the failure are shut down again.
    pub fn start() -> Result<Arc<Self>, DispatchError> {
        let id = NEXT_DISPATCHER_ID.fetch_add(1, Ordering::Relaxed);
        let mut dispatcher = Self {
            id,
            lanes: Vec::with_capacity(ContextId::ALL.len()),
        };

        for context in ContextId::ALL {
            let (sender, receiver) = channel::<Task>();
            let spawned = thread::Builder::new()
                .name(format!("deskext-{}", context.as_str()))
                .spawn(move || run_worker(id, context, receiver));
            let worker = match spawned {
                Ok(worker) => worker,
                Err(err) => {
                    error!(
                        "event=dispatcher_start module=dispatch status=error context={} error={}",
                        context, err
                    );
                    dispatcher.shutdown();
                    return Err(DispatchError::WorkerSpawn {
                        context,
                        message: err.to_string(),
                    });
                }
            };
            dispatcher.lanes.push(Lane {
                context,
                sender: Mutex::new(Some(sender)),
                worker: Mutex::new(Some(worker)),
            });
        }

        info!(
            "event=dispatcher_start module=dispatch status=ok dispatcher_id={}",
            id
        );
        Ok(Arc::new(dispatcher))
    }

    /// Returns whether the calling thread is this dispatcher's `context` worker.
    pub fn currently_on(&self, context: ContextId) -> bool {
        CURRENT_CONTEXT.with(|current| current.get() == Some((self.id, context)))
    }

    /// Panics unless the caller runs on `context`.
    pub fn assert_on(&self, context: ContextId) {
        assert!(
            self.currently_on(context),
            "expected to run on the `{context}` context"
        );
    }

    /// Runs `task` on `context`.
    ///
    /// Executes inline when the caller already is on `context`; otherwise
    /// enqueues and returns without waiting.
    pub fn run_on(&self, context: ContextId, task: impl FnOnce() + Send + 'static) {
        if self.currently_on(context) {
            task();
            return;
        }
        self.post(context, Box::new(task));
    }

    /// Enqueues `task` on `context` even when the caller already is there.
    pub fn post(&self, context: ContextId, task: Task) {
        let rejected = match self.lane(context) {
            Some(lane) => {
                let sender = lock(&lane.sender);
                match sender.as_ref() {
                    Some(sender) => sender.send(task).err().map(|err| err.0),
                    None => Some(task),
                }
            }
            None => Some(task),
        };

        if let Some(task) = rejected {
            warn!(
                "event=task_post module=dispatch status=fallback context={} reason=context_closed",
                context
            );
            let previous = CURRENT_CONTEXT.with(|current| current.replace(Some((self.id, context))));
            run_isolated(context, task);
            CURRENT_CONTEXT.with(|current| current.set(previous));
        }
    }

    /// Closes every context after draining its queued tasks.
    ///
    /// Idempotent. When invoked from one of this dispatcher's own workers,
    /// that worker is detached instead of joined.
    pub fn shutdown(&self) {
        for lane in &self.lanes {
            drop(lock(&lane.sender).take());
            let Some(worker) = lock(&lane.worker).take() else {
                continue;
            };
            if worker.thread().id() == thread::current().id() {
                continue;
            }
            if worker.join().is_err() {
                error!(
                    "event=dispatcher_shutdown module=dispatch status=error context={} error=worker_panicked",
                    lane.context
                );
            }
        }
        info!(
            "event=dispatcher_shutdown module=dispatch status=ok dispatcher_id={}",
            self.id
        );
    }

    fn lane(&self, context: ContextId) -> Option<&Lane> {
        self.lanes.get(context.index())
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Continuation that can only be invoked on the UI context.
pub struct UiContinuation<T> {
    callback: Box<dyn FnOnce(T) + Send + 'static>,
}

impl<T: Send + 'static> UiContinuation<T> {
    pub fn new(callback: impl FnOnce(T) + Send + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Hands `value` to the continuation on the UI context.
    pub fn deliver(self, dispatcher: &Dispatcher, value: T) {
        let callback = self.callback;
        dispatcher.run_on(ContextId::Ui, move || callback(value));
    }
}

fn run_worker(dispatcher_id: u64, context: ContextId, receiver: Receiver<Task>) {
    CURRENT_CONTEXT.with(|current| current.set(Some((dispatcher_id, context))));
    while let Ok(task) = receiver.recv() {
        run_isolated(context, task);
    }
}

fn run_isolated(context: ContextId, task: Task) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        error!(
            "event=task_run module=dispatch status=error context={} error=task_panicked payload={}",
            context, message
        );
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::{ContextId, Dispatcher, UiContinuation};
    use std::sync::mpsc::channel;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_thread_is_on_no_context() {
        let dispatcher = Dispatcher::start().expect("dispatcher start");
        for context in ContextId::ALL {
            assert!(!dispatcher.currently_on(context));
        }
    }

    #[test]
    fn run_on_executes_on_target_context() {
        let dispatcher = Dispatcher::start().expect("dispatcher start");
        let (tx, rx) = channel();
        for context in ContextId::ALL {
            let observer = Arc::clone(&dispatcher);
            let tx = tx.clone();
            dispatcher.run_on(context, move || {
                tx.send((context, observer.currently_on(context)))
                    .expect("send observer");
            });
        }
        for _ in ContextId::ALL {
            let (context, on_target) = rx.recv_timeout(WAIT).expect("task should run");
            assert!(on_target, "task for {context} ran elsewhere");
        }
    }

    #[test]
    fn run_on_is_inline_when_already_on_context() {
        let dispatcher = Dispatcher::start().expect("dispatcher start");
        let order = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = channel();

        let inner = Arc::clone(&dispatcher);
        let recorded = Arc::clone(&order);
        dispatcher.run_on(ContextId::File, move || {
            recorded.lock().expect("order lock").push("before");
            let nested = Arc::clone(&recorded);
            inner.run_on(ContextId::File, move || {
                nested.lock().expect("order lock").push("nested");
            });
            recorded.lock().expect("order lock").push("after");
            tx.send(()).expect("send done");
        });

        rx.recv_timeout(WAIT).expect("task should run");
        assert_eq!(
            *order.lock().expect("order lock"),
            vec!["before", "nested", "after"]
        );
    }

    #[test]
    fn tasks_from_one_origin_run_in_submission_order() {
        let dispatcher = Dispatcher::start().expect("dispatcher start");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = channel();

        for index in 0..200 {
            let seen = Arc::clone(&seen);
            let tx = tx.clone();
            dispatcher.run_on(ContextId::Io, move || {
                seen.lock().expect("seen lock").push(index);
                if index == 199 {
                    tx.send(()).expect("send done");
                }
            });
        }

        rx.recv_timeout(WAIT).expect("last task should run");
        let seen = seen.lock().expect("seen lock");
        assert_eq!(*seen, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn panicking_task_does_not_stop_worker() {
        let dispatcher = Dispatcher::start().expect("dispatcher start");
        let (tx, rx) = channel();

        dispatcher.run_on(ContextId::File, || panic!("task failure"));
        dispatcher.run_on(ContextId::File, move || tx.send(7).expect("send value"));

        assert_eq!(rx.recv_timeout(WAIT).expect("second task should run"), 7);
    }

    #[test]
    fn shutdown_drains_queued_tasks() {
        let dispatcher = Dispatcher::start().expect("dispatcher start");
        let count = Arc::new(Mutex::new(0usize));
        for _ in 0..25 {
            let count = Arc::clone(&count);
            dispatcher.run_on(ContextId::File, move || {
                std::thread::sleep(Duration::from_millis(1));
                *count.lock().expect("count lock") += 1;
            });
        }

        dispatcher.shutdown();
        assert_eq!(*count.lock().expect("count lock"), 25);
    }

    #[test]
    fn tasks_posted_after_shutdown_run_inline() {
        let dispatcher = Dispatcher::start().expect("dispatcher start");
        dispatcher.shutdown();

        let ran = Arc::new(Mutex::new(None));
        let flag = Arc::clone(&ran);
        let inner = Arc::clone(&dispatcher);
        dispatcher.run_on(ContextId::Ui, move || {
            *flag.lock().expect("flag lock") = Some(inner.currently_on(ContextId::Ui));
        });
        assert_eq!(*ran.lock().expect("flag lock"), Some(true));
        assert!(!dispatcher.currently_on(ContextId::Ui));
    }

    #[test]
    fn ui_continuation_delivers_on_ui_context() {
        let dispatcher = Dispatcher::start().expect("dispatcher start");
        let (tx, rx) = channel();

        let observer = Arc::clone(&dispatcher);
        let continuation = UiContinuation::new(move |value: u32| {
            tx.send((value, observer.currently_on(ContextId::Ui)))
                .expect("send delivery");
        });
        let producer = Arc::clone(&dispatcher);
        dispatcher.run_on(ContextId::File, move || continuation.deliver(&producer, 42));

        let (value, on_ui) = rx.recv_timeout(WAIT).expect("continuation should run");
        assert_eq!(value, 42);
        assert!(on_ui);
    }

    #[test]
    fn context_identity_is_scoped_per_dispatcher() {
        let first = Dispatcher::start().expect("first dispatcher");
        let second = Dispatcher::start().expect("second dispatcher");
        let (tx, rx) = channel();

        let own = Arc::clone(&first);
        let other = Arc::clone(&second);
        first.run_on(ContextId::File, move || {
            tx.send((own.currently_on(ContextId::File), other.currently_on(ContextId::File)))
                .expect("send observer");
        });

        let (on_own, on_other) = rx.recv_timeout(WAIT).expect("task should run");
        assert!(on_own);
        assert!(!on_other);
    }
}
