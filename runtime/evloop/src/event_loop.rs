//! The dispatch loop itself.

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;

use evloop_core::clock;
use evloop_core::{Args, Clock, Directive, HpTable, LoopError, Payload, QueueKind, Step, Task, TaskId, TimedQueue, Value};
use evloop_core::value::no_args;
use evloop_core::id::IoHandle;

use crate::config::LoopConfig;
use crate::reactor::{Reactor, ReadyList};
use crate::{error, warn};

fn truncate_ms(secs: f64) -> u32 {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "truncation toward zero and saturation on negatives match the source's int(secs*1000)"
    )]
    {
        (secs * 1000.0) as u32
    }
}

/// A task paired with the instruction to stop the loop once it completes,
/// the source's `run_until_complete` wrapper.
struct RunUntilComplete<T> {
    inner: T,
}

impl<T: Task> Task for RunUntilComplete<T> {
    fn resume(&mut self, input: &Args) -> Step {
        match self.inner.resume(input) {
            Step::Done => Step::Yield(Directive::StopLoop(Value::Int(0))),
            Step::Yield(directive) => Step::Yield(directive),
        }
    }
}

/// Owns the three priority queues, the task table, the clock, and the
/// reactor, and drives them forward via [`EventLoop::run_forever`].
///
/// Deliberately `!Sync`: the boxed task/callback trait objects it holds
/// aren't `Sync`, which is exactly right for a scheduler meant to run on
/// one thread at a time — see the process-wide singleton accessor in
/// `lib.rs` for how that invariant is enforced structurally rather than
/// with a lock.
pub struct EventLoop<C: Clock, R: Reactor> {
    clock: C,
    reactor: R,
    nq: TimedQueue,
    lpq: TimedQueue,
    hpq: HpTable,
    max_overdue_ms: u32,
    tasks: Vec<Option<Box<dyn Task>>>,
    free_ids: Vec<TaskId>,
    ready_scratch: ReadyList,
}

impl<C: Clock, R: Reactor> EventLoop<C, R> {
    /// Creates a loop with the given configuration, clock, and reactor.
    #[must_use]
    pub fn new(config: LoopConfig, clock: C, reactor: R) -> Self {
        Self {
            clock,
            reactor,
            nq: TimedQueue::new(config.qlen as usize, QueueKind::Normal),
            lpq: TimedQueue::new(config.lpqlen as usize, QueueKind::LowPriority),
            hpq: HpTable::new(config.hpq_hint),
            max_overdue_ms: config.max_overdue_ms,
            tasks: Vec::new(),
            free_ids: Vec::new(),
            ready_scratch: ReadyList::new(),
        }
    }

    /// Decodes the packed `qlen | (lpqlen << 16)` constructor form, for
    /// binary compatibility with the source API (§6).
    #[must_use]
    pub fn from_packed(word: u32, clock: C, reactor: R) -> Self {
        Self::new(LoopConfig::from_packed(word), clock, reactor)
    }

    /// Current loop time.
    #[must_use]
    pub fn time(&self) -> u32 {
        self.clock.now()
    }

    /// Read-only count of entries pending in NQ + LPQ.
    #[must_use]
    pub fn pending_task_count(&self) -> usize {
        self.nq.len() + self.lpq.len()
    }

    /// Read-only HPQ slot count, for sizing `allocate_hpq` correctly.
    #[must_use]
    pub fn hpq_slot_count(&self) -> usize {
        self.hpq.capacity()
    }

    /// Current LPQ overdue-fairness threshold.
    #[must_use]
    pub fn max_overdue_ms(&self) -> u32 {
        self.max_overdue_ms
    }

    /// Sets the LPQ overdue-fairness threshold. `0` disables the override.
    pub fn set_max_overdue_ms(&mut self, ms: u32) {
        self.max_overdue_ms = ms;
    }

    /// Pre-sizes the HPQ with `n` additional empty slots.
    pub fn allocate_hpq(&mut self, n: usize) {
        self.hpq.allocate(n);
    }

    /// No-op by default; present so embedders have a place to release
    /// reactor resources.
    pub fn close(&mut self) {}

    /// Registers `task` and enqueues it on NQ with zero delay. No handle
    /// is returned, matching the source.
    ///
    /// # Errors
    /// Returns [`LoopError::QueueFull`] if NQ is at capacity.
    pub fn create_task(&mut self, task: Box<dyn Task>) -> Result<(), LoopError> {
        let now = self.clock.now();
        let id = self.register_task(task);
        self.nq.push(now, Payload::Task(id), no_args())
    }

    /// Enqueues `cb` on NQ at the current time.
    ///
    /// # Errors
    /// Returns [`LoopError::QueueFull`] if NQ is at capacity.
    pub fn call_soon(
        &mut self,
        cb: Box<dyn FnMut(&Args) + Send>,
        args: Args,
    ) -> Result<(), LoopError> {
        let now = self.clock.now();
        self.nq.push(now, Payload::Callback(cb), args)
    }

    /// Enqueues `cb` on NQ at `now + truncate_ms(secs)`.
    ///
    /// # Errors
    /// Returns [`LoopError::QueueFull`] if NQ is at capacity.
    pub fn call_later(
        &mut self,
        secs: f64,
        cb: Box<dyn FnMut(&Args) + Send>,
        args: Args,
    ) -> Result<(), LoopError> {
        let due = clock::add(self.clock.now(), truncate_ms(secs));
        self.nq.push(due, Payload::Callback(cb), args)
    }

    /// Enqueues `cb` on NQ at the absolute tick `at_ms`.
    ///
    /// # Errors
    /// Returns [`LoopError::QueueFull`] if NQ is at capacity.
    pub fn call_at(
        &mut self,
        at_ms: u32,
        cb: Box<dyn FnMut(&Args) + Send>,
        args: Args,
    ) -> Result<(), LoopError> {
        self.nq.push(at_ms, Payload::Callback(cb), args)
    }

    /// Enqueues `cb` on LPQ at `now + truncate_ms(secs)`.
    ///
    /// # Errors
    /// Returns [`LoopError::QueueFull`] if LPQ is at capacity.
    pub fn call_after(
        &mut self,
        secs: f64,
        cb: Box<dyn FnMut(&Args) + Send>,
        args: Args,
    ) -> Result<(), LoopError> {
        let due = clock::add(self.clock.now(), truncate_ms(secs));
        self.lpq.push(due, Payload::Callback(cb), args)
    }

    /// Runs `task` to completion, then `run_forever` until something else
    /// also stops the loop (the source's `StopLoop(0)` convention).
    ///
    /// # Errors
    /// Propagates any [`LoopError`] raised while dispatching.
    pub fn run_until_complete(&mut self, task: Box<dyn Task>) -> Result<Value, LoopError> {
        self.create_task(Box::new(RunUntilComplete { inner: BoxedTask(task) }))?;
        self.run_forever()
    }

    /// Runs the dispatch loop until a task yields `StopLoop(v)`, returning
    /// `v`.
    ///
    /// # Errors
    /// Propagates any [`LoopError`] raised while dispatching — queue
    /// overflow on re-enqueue, a failed I/O registration, or a task that
    /// could not be found in the task table.
    pub fn run_forever(&mut self) -> Result<Value, LoopError> {
        loop {
            if let Some(v) = self.tick()? {
                return Ok(v);
            }
        }
    }

    fn register_task(&mut self, task: Box<dyn Task>) -> TaskId {
        if let Some(id) = self.free_ids.pop() {
            self.tasks[id.as_u64() as usize] = Some(task);
            id
        } else {
            let id = TaskId::new(self.tasks.len() as u64);
            self.tasks.push(Some(task));
            id
        }
    }

    /// One selection + dispatch pass, implementing the precedence rule:
    /// HPQ fired predicate > LPQ-overdue override > NQ due > LPQ due,
    /// blocking through the reactor when nothing is ready.
    fn tick(&mut self) -> Result<Option<Value>, LoopError> {
        loop {
            let now = self.clock.now();

            if !self.nq.is_empty() {
                if let Some((payload, args)) = self.hpq.fire_first() {
                    return self.dispatch(now, payload, args);
                }

                if self.max_overdue_ms > 0 && !self.lpq.is_empty() {
                    let t = self.lpq.peek_time().expect("checked non-empty above");
                    let overdue = -clock::diff(t, now);
                    #[allow(
                        clippy::cast_possible_wrap,
                        reason = "max_overdue_ms is a configured threshold, never near i32::MAX"
                    )]
                    if overdue > self.max_overdue_ms as i32 {
                        let (payload, args) = self
                            .lpq
                            .pop()
                            .expect("peeked Some above")
                            .into_parts();
                        return self.dispatch(now, payload, args);
                    }
                }

                let nq_time = self.nq.peek_time().expect("checked non-empty above");
                let delay = clock::diff(nq_time, now);
                if delay <= 0 {
                    let (payload, args) = self.nq.pop().expect("peeked Some above").into_parts();
                    return self.dispatch(now, payload, args);
                }

                #[allow(clippy::cast_sign_loss, reason = "delay > 0 was just checked")]
                let mut sleep_ms = delay as u32;
                if let Some(lp_time) = self.lpq.peek_time() {
                    let lpdelay = clock::diff(lp_time, now);
                    if lpdelay <= 0 {
                        let (payload, args) =
                            self.lpq.pop().expect("peeked Some above").into_parts();
                        return self.dispatch(now, payload, args);
                    }
                    #[allow(clippy::cast_sign_loss, reason = "lpdelay > 0 was just checked")]
                    let lp_ms = lpdelay as u32;
                    sleep_ms = sleep_ms.min(lp_ms);
                }

                self.block_and_collect(Some(sleep_ms))?;
            } else {
                if !self.lpq.is_empty() {
                    let lp_time = self.lpq.peek_time().expect("checked non-empty above");
                    if clock::diff(lp_time, now) <= 0 {
                        let (payload, args) =
                            self.lpq.pop().expect("peeked Some above").into_parts();
                        return self.dispatch(now, payload, args);
                    }
                }
                self.block_and_collect(None)?;
            }
        }
    }

    /// Blocks on the reactor and reschedules everything it reported
    /// ready, via `call_soon`-equivalent NQ insertion at `now`.
    fn block_and_collect(&mut self, delay_ms: Option<u32>) -> Result<(), LoopError> {
        self.ready_scratch.clear();
        if self.reactor.wait(delay_ms, &mut self.ready_scratch).is_err() {
            warn!("reactor wait failed, retrying selection");
            return Ok(());
        }
        let now = self.clock.now();
        for i in 0..self.ready_scratch.len() {
            let id = self.ready_scratch.as_slice()[i];
            self.nq.push(now, Payload::Task(id), no_args())?;
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        now: u32,
        payload: Payload,
        args: Args,
    ) -> Result<Option<Value>, LoopError> {
        match payload {
            Payload::Callback(mut cb) => {
                cb(&args);
                Ok(None)
            }
            Payload::Task(id) => {
                let Some(mut task) = self.tasks[id.as_u64() as usize].take() else {
                    return Err(LoopError::TaskFailed(id));
                };
                match Self::resume_task(id, &mut task, &args) {
                    Some(Step::Done) | None => {
                        // `None` means the resume panicked (std only); the
                        // source's permissive policy applies either way: the
                        // task simply stops being re-enqueued.
                        self.free_ids.push(id);
                        Ok(None)
                    }
                    Some(Step::Yield(directive)) => {
                        self.tasks[id.as_u64() as usize] = Some(task);
                        self.interpret(now, id, directive)
                    }
                }
            }
        }
    }

    /// Resumes `task`, isolating a panic mid-resume when the `std` feature
    /// is available (`TaskError` policy, §7): the task is logged at `Error`
    /// level and treated as done — dropped, not re-enqueued, loop left
    /// running. Without `std` there is no unwinder to catch the panic, so
    /// it propagates and aborts the process; this is documented as a
    /// `no_std` limitation in the crate root.
    #[cfg(feature = "std")]
    fn resume_task(id: TaskId, task: &mut Box<dyn Task>, args: &Args) -> Option<Step> {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| task.resume(args))) {
            Ok(step) => Some(step),
            Err(_) => {
                error!("{id} panicked during resume; dropping");
                None
            }
        }
    }

    #[cfg(not(feature = "std"))]
    fn resume_task(_id: TaskId, task: &mut Box<dyn Task>, args: &Args) -> Option<Step> {
        Some(task.resume(args))
    }

    fn interpret(
        &mut self,
        now: u32,
        id: TaskId,
        directive: Directive,
    ) -> Result<Option<Value>, LoopError> {
        match directive {
            Directive::Sleep(secs) => {
                let due = clock::add(now, truncate_ms(secs));
                self.nq.push(due, Payload::Task(id), no_args())?;
                Ok(None)
            }
            Directive::SleepMs(ms) => {
                #[allow(clippy::cast_possible_truncation, reason = "callers stay within u32 range")]
                let due = clock::add(now, ms as u32);
                self.nq.push(due, Payload::Task(id), no_args())?;
                Ok(None)
            }
            Directive::After(secs) => {
                let due = clock::add(now, truncate_ms(secs));
                self.lpq.push(due, Payload::Task(id), no_args())?;
                Ok(None)
            }
            Directive::AfterMs(ms) => {
                #[allow(clippy::cast_possible_truncation, reason = "callers stay within u32 range")]
                let due = clock::add(now, ms as u32);
                self.lpq.push(due, Payload::Task(id), no_args())?;
                Ok(None)
            }
            Directive::When(pred) => {
                self.hpq.schedule(pred, Payload::Task(id), no_args());
                Ok(None)
            }
            Directive::IoRead(handle) => {
                self.register_io(handle, id, true)?;
                Ok(None)
            }
            Directive::IoWrite(handle) => {
                self.register_io(handle, id, false)?;
                Ok(None)
            }
            Directive::IoReadDone(handle) => {
                self.reactor.remove_reader(handle);
                self.nq.push(now, Payload::Task(id), no_args())?;
                Ok(None)
            }
            Directive::IoWriteDone(handle) => {
                self.reactor.remove_writer(handle);
                self.nq.push(now, Payload::Task(id), no_args())?;
                Ok(None)
            }
            Directive::StopLoop(value) => Ok(Some(value)),
            Directive::Requeue => {
                self.nq.push(now, Payload::Task(id), no_args())?;
                Ok(None)
            }
            Directive::Spawn(spawned) => {
                let spawned_id = self.register_task(spawned);
                self.nq.push(now, Payload::Task(spawned_id), no_args())?;
                self.nq.push(now, Payload::Task(id), no_args())?;
                Ok(None)
            }
        }
    }

    fn register_io(&mut self, handle: IoHandle, id: TaskId, read: bool) -> Result<(), LoopError> {
        let result = if read {
            self.reactor.add_reader(handle, id)
        } else {
            self.reactor.add_writer(handle, id)
        };
        result.map_err(|e| {
            error!("reactor registration failed: {e}");
            LoopError::ReactorError
        })
    }
}

/// Adapts a boxed `dyn Task` so it can be nested inside another `Task`
/// impl (`RunUntilComplete`) without requiring `Sized`.
struct BoxedTask(Box<dyn Task>);

impl Task for BoxedTask {
    fn resume(&mut self, input: &Args) -> Step {
        self.0.resume(input)
    }
}
