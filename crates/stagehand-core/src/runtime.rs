use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use crate::frame_clock::FrameClock;
use crate::platform::RuntimeScheduler;

pub type FrameCallbackId = u64;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_frame: Cell<bool>,
    frame_callbacks: RefCell<VecDeque<FrameCallbackEntry>>,
    next_frame_callback_id: Cell<u64>,
    local_tasks: RefCell<VecDeque<Box<dyn FnOnce() + 'static>>>,
    tasks: RefCell<Vec<TaskEntry>>,
    next_task_id: Cell<u64>,
    // Id of the task whose future is currently being polled, if any.
    polling: Cell<Option<u64>>,
    cancel_polling: Cell<bool>,
    // Tasks taken out of `tasks` for the current polling pass.
    in_pass: Cell<bool>,
    cancelled_in_pass: RefCell<Vec<u64>>,
    task_wake: Arc<RuntimeTaskWaker>,
    task_waker: Waker,
}

struct TaskEntry {
    id: u64,
    future: Pin<Box<dyn Future<Output = ()> + 'static>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        let task_wake = Arc::new(RuntimeTaskWaker::new(scheduler.clone()));
        let task_waker = futures_task::waker(Arc::clone(&task_wake));
        Self {
            scheduler,
            needs_frame: Cell::new(false),
            frame_callbacks: RefCell::new(VecDeque::new()),
            next_frame_callback_id: Cell::new(1),
            local_tasks: RefCell::new(VecDeque::new()),
            tasks: RefCell::new(Vec::new()),
            next_task_id: Cell::new(1),
            polling: Cell::new(None),
            cancel_polling: Cell::new(false),
            in_pass: Cell::new(false),
            cancelled_in_pass: RefCell::new(Vec::new()),
            task_wake,
            task_waker,
        }
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn has_frame_callbacks(&self) -> bool {
        !self.frame_callbacks.borrow().is_empty()
    }

    /// Queues a closure on the runtime thread's local queue.
    ///
    /// The closure may capture `Rc`/`RefCell` values because it never leaves
    /// the runtime thread.
    fn enqueue_ui_task(&self, task: Box<dyn FnOnce() + 'static>) {
        self.local_tasks.borrow_mut().push_back(task);
        self.schedule();
    }

    fn spawn_ui_task(&self, future: Pin<Box<dyn Future<Output = ()> + 'static>>) -> u64 {
        let id = self.next_task_id.get();
        self.next_task_id.set(id + 1);
        self.tasks.borrow_mut().push(TaskEntry { id, future });
        self.task_wake.mark_woken();
        self.schedule();
        id
    }

    fn cancel_task(&self, id: u64) {
        if self.polling.get() == Some(id) {
            self.cancel_polling.set(true);
            return;
        }
        let removed = {
            let mut tasks = self.tasks.borrow_mut();
            tasks
                .iter()
                .position(|entry| entry.id == id)
                .map(|index| tasks.remove(index))
        };
        if removed.is_none() && self.in_pass.get() {
            self.cancelled_in_pass.borrow_mut().push(id);
        }
        // Dropping a future may run destructors that call back into the runtime.
        drop(removed);
    }

    fn is_cancelled_in_pass(&self, id: u64) -> bool {
        self.cancelled_in_pass.borrow().contains(&id)
    }

    /// Polls every task once if any waker fired since the previous pass.
    ///
    /// Returns `true` when tasks were polled so the caller keeps draining
    /// until no waker fires during a full pass.
    fn poll_async_tasks(&self) -> bool {
        if !self.task_wake.take_woken() {
            return false;
        }
        let mut cx = Context::from_waker(&self.task_waker);
        let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        let mut pending = Vec::with_capacity(tasks.len());
        self.in_pass.set(true);
        for mut entry in tasks {
            if self.is_cancelled_in_pass(entry.id) {
                drop(entry);
                continue;
            }
            self.polling.set(Some(entry.id));
            let poll = entry.future.as_mut().poll(&mut cx);
            self.polling.set(None);
            if self.cancel_polling.replace(false) {
                drop(entry);
                continue;
            }
            if poll.is_pending() {
                pending.push(entry);
            }
        }
        self.in_pass.set(false);
        let cancelled = std::mem::take(&mut *self.cancelled_in_pass.borrow_mut());
        let (dropped, pending): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|entry| cancelled.contains(&entry.id));
        drop(dropped);
        let spawned = std::mem::take(&mut *self.tasks.borrow_mut());
        let mut tasks = self.tasks.borrow_mut();
        *tasks = pending;
        tasks.extend(spawned);
        true
    }

    fn drain_ui(&self) {
        loop {
            let mut executed = false;

            loop {
                let task = self.local_tasks.borrow_mut().pop_front();
                match task {
                    Some(task) => {
                        executed = true;
                        task();
                    }
                    None => break,
                }
            }

            if self.poll_async_tasks() {
                executed = true;
            }

            if !executed {
                break;
            }
        }
        self.refresh_needs_frame();
    }

    fn has_pending_ui(&self) -> bool {
        let local_pending = self
            .local_tasks
            .try_borrow()
            .map(|tasks| !tasks.is_empty())
            .unwrap_or(true);
        local_pending || self.task_wake.is_woken()
    }

    fn register_frame_callback(&self, callback: Box<dyn FnOnce(u64) + 'static>) -> FrameCallbackId {
        let id = self.next_frame_callback_id.get();
        self.next_frame_callback_id.set(id + 1);
        self.frame_callbacks
            .borrow_mut()
            .push_back(FrameCallbackEntry {
                id,
                callback: Some(callback),
            });
        self.schedule();
        id
    }

    fn cancel_frame_callback(&self, id: FrameCallbackId) {
        let removed = {
            let mut callbacks = self.frame_callbacks.borrow_mut();
            callbacks
                .iter()
                .position(|entry| entry.id == id)
                .and_then(|index| callbacks.remove(index))
        };
        drop(removed);
        self.refresh_needs_frame();
    }

    /// Runs every callback registered before this call.
    ///
    /// Callbacks registered while draining are deferred to the next frame.
    fn drain_frame_callbacks(&self, frame_time_nanos: u64) {
        let pending: Vec<Box<dyn FnOnce(u64) + 'static>> = {
            let mut callbacks = self.frame_callbacks.borrow_mut();
            callbacks
                .drain(..)
                .filter_map(|mut entry| entry.callback.take())
                .collect()
        };
        log::trace!(
            "frame at {frame_time_nanos}ns: running {} callback(s)",
            pending.len()
        );
        for callback in pending {
            callback(frame_time_nanos);
        }
        self.refresh_needs_frame();
    }

    fn refresh_needs_frame(&self) {
        let idle = self
            .frame_callbacks
            .try_borrow()
            .map(|callbacks| callbacks.is_empty())
            .unwrap_or(false)
            && !self.has_pending_ui();
        if idle {
            self.needs_frame.set(false);
        }
    }
}

/// Single-threaded cooperative runtime.
///
/// Owns the UI task queue, spawned futures and the frame-callback queue. The
/// host drives it by calling [`RuntimeHandle::drain_frame_callbacks`] once per
/// rendered frame and [`RuntimeHandle::drain_ui`] whenever the scheduler asks
/// for attention.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.handle())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("needs_frame", &self.inner.needs_frame.get())
            .field("tasks", &self.inner.tasks.borrow().len())
            .finish()
    }
}

/// Scheduler that ignores frame requests; the owner pumps the runtime itself.
#[derive(Default, Debug)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
}

pub struct TaskHandle {
    id: u64,
    runtime: RuntimeHandle,
}

impl RuntimeHandle {
    pub fn schedule(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.schedule();
        }
    }

    /// Schedules work that must run on the runtime thread.
    ///
    /// Runs the closure immediately when the runtime is already gone.
    pub fn enqueue_ui_task(&self, task: Box<dyn FnOnce() + 'static>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.enqueue_ui_task(task);
        } else {
            task();
        }
    }

    pub fn spawn_ui<F>(&self, fut: F) -> Option<TaskHandle>
    where
        F: Future<Output = ()> + 'static,
    {
        self.inner.upgrade().map(|inner| {
            let id = inner.spawn_ui_task(Box::pin(fut));
            TaskHandle {
                id,
                runtime: self.clone(),
            }
        })
    }

    pub fn cancel_task(&self, id: u64) {
        if let Some(inner) = self.inner.upgrade() {
            inner.cancel_task(id);
        }
    }

    pub fn drain_ui(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.drain_ui();
        }
    }

    pub fn has_pending_ui(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.has_pending_ui())
            .unwrap_or(false)
    }

    pub fn task_count(&self) -> usize {
        self.inner
            .upgrade()
            .map(|inner| inner.tasks.borrow().len())
            .unwrap_or(0)
    }

    pub fn register_frame_callback(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> Option<FrameCallbackId> {
        self.inner
            .upgrade()
            .map(|inner| inner.register_frame_callback(Box::new(callback)))
    }

    pub fn cancel_frame_callback(&self, id: FrameCallbackId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.cancel_frame_callback(id);
        }
    }

    pub fn drain_frame_callbacks(&self, frame_time_nanos: u64) {
        if let Some(inner) = self.inner.upgrade() {
            inner.drain_frame_callbacks(frame_time_nanos);
        }
    }

    pub fn has_frame_callbacks(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.has_frame_callbacks())
            .unwrap_or(false)
    }

    pub fn needs_frame(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.needs_frame.get())
            .unwrap_or(false)
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.clone())
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(self) {
        self.runtime.cancel_task(self.id);
    }
}

struct FrameCallbackEntry {
    id: FrameCallbackId,
    callback: Option<Box<dyn FnOnce(u64) + 'static>>,
}

/// Waker shared by every spawned task.
///
/// Holds only the `Send + Sync` scheduler so the waker itself may cross
/// threads; the woken flag tells `drain_ui` that another polling pass is due.
struct RuntimeTaskWaker {
    scheduler: Arc<dyn RuntimeScheduler>,
    woken: AtomicBool,
}

impl RuntimeTaskWaker {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            woken: AtomicBool::new(false),
        }
    }

    fn mark_woken(&self) {
        self.woken.store(true, Ordering::SeqCst);
    }

    fn take_woken(&self) -> bool {
        self.woken.swap(false, Ordering::SeqCst)
    }

    fn is_woken(&self) -> bool {
        self.woken.load(Ordering::SeqCst)
    }
}

impl futures_task::ArcWake for RuntimeTaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.mark_woken();
        arc_self.scheduler.schedule_frame();
    }
}

/// Future that returns `Pending` exactly once, yielding one scheduling step.
#[derive(Debug, Default)]
pub struct YieldNow {
    yielded: bool,
}

pub fn yield_now() -> YieldNow {
    YieldNow::default()
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
