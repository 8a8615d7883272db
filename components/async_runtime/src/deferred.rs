//! Deferred values following the Promise/A+ contract.
//!
//! A [`Deferred`] is a settle-once container for the eventual result of an
//! asynchronous operation. Settlement is never synchronous: the settlement
//! handles schedule the transition on the deferred's [`Scheduler`], and the
//! continuations queued while pending run inside that scheduled task.

use crate::error::{ChainCycleError, RuntimeResult};
use crate::event_loop::EventLoop;
use crate::scheduler::Scheduler;
use crate::task_queue::Task;
use core_types::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

/// The state of a Deferred.
///
/// Once settled (Fulfilled or Rejected), a Deferred cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    /// The initial state; neither fulfilled nor rejected.
    Pending,
    /// Settled with a value.
    Fulfilled,
    /// Settled with a reason.
    Rejected,
}

/// What a deferred is settled with, or what a handler produced.
///
/// A `Deferred` payload is adopted rather than stored: the receiving deferred
/// waits for it and takes over its outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A plain value
    Value(Value),
    /// Another deferred whose outcome is adopted
    Deferred(Deferred),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Value(value)
    }
}

impl From<Deferred> for Payload {
    fn from(deferred: Deferred) -> Self {
        Payload::Deferred(deferred)
    }
}

impl From<&Deferred> for Payload {
    fn from(deferred: &Deferred) -> Self {
        Payload::Deferred(deferred.clone())
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Value(s.into())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Value(s.into())
    }
}

impl From<i32> for Payload {
    fn from(n: i32) -> Self {
        Payload::Value(n.into())
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Value(b.into())
    }
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Payload::Value(n.into())
    }
}

/// The outcome of a handler: `Ok` is what it returned, `Err` what it threw.
pub type Completion = Result<Payload, Payload>;

/// A continuation passed to [`Deferred::then`].
pub struct Handler {
    callback: Box<dyn FnOnce(Value) -> Completion>,
}

impl Handler {
    /// Creates a new Handler from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Value) -> Completion + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Calls the handler with the settled value or reason.
    pub fn call(self, arg: Value) -> Completion {
        (self.callback)(arg)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler {{ ... }}")
    }
}

type Reaction = Box<dyn FnOnce(Value)>;

#[derive(Default)]
struct Reactions {
    on_fulfilled: Vec<Reaction>,
    on_rejected: Vec<Reaction>,
}

enum Status {
    Pending(Reactions),
    Fulfilled(Value),
    Rejected(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Fulfill,
    Reject,
}

struct DeferredInner {
    id: u64,
    status: Status,
    claimed: bool,
    scheduler: Rc<dyn Scheduler>,
}

/// A settle-once value with chainable continuations.
///
/// `Deferred` is a shared handle: clones refer to the same underlying value,
/// and equality is identity.
///
/// # Examples
///
/// ```
/// use async_runtime::{Deferred, DeferredState, EventLoop, Handler};
/// use core_types::Value;
///
/// let deferred = Deferred::new(|resolve, _reject| {
///     resolve.call("ok");
///     Ok(())
/// });
/// // Settlement is deferred to a later turn.
/// assert_eq!(deferred.state(), DeferredState::Pending);
///
/// let chained = deferred.then(Some(Handler::new(|v| Ok(format!("{}!", v).into()))), None);
/// EventLoop::current().run_until_done().unwrap();
///
/// assert_eq!(deferred.value(), Some(Value::from("ok")));
/// assert_eq!(chained.value(), Some(Value::from("ok!")));
/// ```
#[derive(Clone)]
pub struct Deferred {
    inner: Rc<RefCell<DeferredInner>>,
}

impl Deferred {
    /// Creates a Deferred settled through the current thread's event loop.
    ///
    /// `producer` runs before this returns. It receives the two settlement
    /// handles; returning `Err` rejects the deferred with that payload unless
    /// it was already settled.
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce(Resolver, Rejecter) -> Result<(), Payload>,
    {
        Self::with_scheduler(Rc::new(EventLoop::current()), producer)
    }

    /// Creates a Deferred settled through `scheduler`.
    pub fn with_scheduler<F>(scheduler: Rc<dyn Scheduler>, producer: F) -> Self
    where
        F: FnOnce(Resolver, Rejecter) -> Result<(), Payload>,
    {
        let deferred = Self::pending(scheduler);
        let resolve = Resolver {
            target: deferred.clone(),
        };
        let reject = Rejecter {
            target: deferred.clone(),
        };
        if let Err(thrown) = producer(resolve, reject.clone()) {
            tracing::debug!(deferred = deferred.id(), "producer failed");
            reject.call(thrown);
        }
        deferred
    }

    /// Creates a Deferred resolved with `payload`.
    pub fn resolved(payload: impl Into<Payload>) -> Self {
        let payload = payload.into();
        Self::new(move |resolve, _| {
            resolve.call(payload);
            Ok(())
        })
    }

    /// Creates a Deferred rejected with `payload`.
    pub fn rejected(payload: impl Into<Payload>) -> Self {
        let payload = payload.into();
        Self::new(move |_, reject| {
            reject.call(payload);
            Ok(())
        })
    }

    fn pending(scheduler: Rc<dyn Scheduler>) -> Self {
        let id = NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Self {
            inner: Rc::new(RefCell::new(DeferredInner {
                id,
                status: Status::Pending(Reactions::default()),
                claimed: false,
                scheduler,
            })),
        }
    }

    /// Registers continuations and returns the Deferred they settle.
    ///
    /// A missing `on_fulfilled` passes the value through; a missing
    /// `on_rejected` passes the reason through. If this deferred is already
    /// settled the matching handler runs before `then` returns, otherwise it
    /// runs when this deferred settles. The handler's return value resolves
    /// the returned deferred and a thrown payload rejects it.
    pub fn then(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Deferred {
        let promise2 = Deferred::pending(self.scheduler());
        let on_fulfilled =
            on_fulfilled.unwrap_or_else(|| Handler::new(|value| Ok(Payload::Value(value))));
        let on_rejected =
            on_rejected.unwrap_or_else(|| Handler::new(|reason| Err(Payload::Value(reason))));

        let (fulfilled_target, rejected_target) = (promise2.clone(), promise2.clone());
        self.register(
            Box::new(move |value| fulfilled_target.complete_with(on_fulfilled.call(value))),
            Box::new(move |reason| rejected_target.complete_with(on_rejected.call(reason))),
        );
        promise2
    }

    /// Returns the current state.
    pub fn state(&self) -> DeferredState {
        match self.inner.borrow().status {
            Status::Pending(_) => DeferredState::Pending,
            Status::Fulfilled(_) => DeferredState::Fulfilled,
            Status::Rejected(_) => DeferredState::Rejected,
        }
    }

    /// Returns the fulfillment value, if fulfilled.
    pub fn value(&self) -> Option<Value> {
        match &self.inner.borrow().status {
            Status::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the rejection reason, if rejected.
    pub fn reason(&self) -> Option<Value> {
        match &self.inner.borrow().status {
            Status::Rejected(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Returns true once fulfilled or rejected.
    pub fn is_settled(&self) -> bool {
        self.state() != DeferredState::Pending
    }

    /// Returns true once either settlement handle has been called.
    pub fn is_claimed(&self) -> bool {
        self.inner.borrow().claimed
    }

    /// Per-thread identifier, used in logs and errors.
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Number of `then` registrations waiting for settlement.
    pub fn pending_reactions(&self) -> usize {
        match &self.inner.borrow().status {
            Status::Pending(reactions) => reactions.on_fulfilled.len(),
            _ => 0,
        }
    }

    fn scheduler(&self) -> Rc<dyn Scheduler> {
        Rc::clone(&self.inner.borrow().scheduler)
    }

    fn complete_with(&self, completion: Completion) {
        match completion {
            Ok(result) => self.settle(Outcome::Fulfill, result),
            Err(thrown) => self.settle(Outcome::Reject, thrown),
        }
    }

    /// Claims the deferred and schedules its settlement. Only the first
    /// claim has any effect.
    fn settle(&self, outcome: Outcome, payload: Payload) {
        let scheduler = {
            let mut inner = self.inner.borrow_mut();
            if inner.claimed {
                tracing::trace!(deferred = inner.id, ?outcome, "settlement ignored");
                return;
            }
            inner.claimed = true;
            Rc::clone(&inner.scheduler)
        };
        let target = self.clone();
        scheduler.defer(Task::new(move || target.run_settlement(outcome, payload)));
    }

    fn run_settlement(&self, outcome: Outcome, payload: Payload) -> RuntimeResult<()> {
        match payload {
            Payload::Value(value) => {
                self.transition(outcome, value);
                Ok(())
            }
            // Rejection reasons are unwrapped the same way as values.
            Payload::Deferred(source) => self.adopt(&source),
        }
    }

    fn adopt(&self, source: &Deferred) -> RuntimeResult<()> {
        if self == source {
            tracing::error!(deferred = self.id(), "chaining cycle detected");
            return Err(ChainCycleError {
                deferred_id: self.id(),
            }
            .into());
        }
        tracing::debug!(deferred = self.id(), source = source.id(), "adopting outcome");
        let (on_fulfilled, on_rejected) = (self.clone(), self.clone());
        source.register(
            Box::new(move |value| on_fulfilled.transition(Outcome::Fulfill, value)),
            Box::new(move |reason| on_rejected.transition(Outcome::Reject, reason)),
        );
        Ok(())
    }

    /// Dispatches immediately when settled, queues otherwise.
    fn register(&self, on_fulfilled: Reaction, on_rejected: Reaction) {
        let (reaction, arg) = {
            let mut inner = self.inner.borrow_mut();
            let dispatch = match &mut inner.status {
                Status::Pending(reactions) => {
                    reactions.on_fulfilled.push(on_fulfilled);
                    reactions.on_rejected.push(on_rejected);
                    return;
                }
                Status::Fulfilled(value) => (on_fulfilled, value.clone()),
                Status::Rejected(reason) => (on_rejected, reason.clone()),
            };
            dispatch
        };
        reaction(arg);
    }

    fn transition(&self, outcome: Outcome, payload: Value) {
        let (id, queued) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.id;
            let reactions = match &mut inner.status {
                Status::Pending(reactions) => std::mem::take(reactions),
                _ => {
                    tracing::trace!(deferred = id, ?outcome, "already settled");
                    return;
                }
            };
            let (status, queued) = match outcome {
                Outcome::Fulfill => (Status::Fulfilled(payload.clone()), reactions.on_fulfilled),
                Outcome::Reject => (Status::Rejected(payload.clone()), reactions.on_rejected),
            };
            inner.status = status;
            (id, queued)
        };
        tracing::debug!(deferred = id, ?outcome, value = ?payload, reactions = queued.len(), "deferred settled");
        for reaction in queued {
            reaction(payload.clone());
        }
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

/// Handle that fulfills its Deferred. Clones share the same target.
#[derive(Debug, Clone)]
pub struct Resolver {
    target: Deferred,
}

impl Resolver {
    /// Fulfills the deferred with `payload`, adopting it if it is a Deferred.
    ///
    /// Ignored if either handle was already called.
    pub fn call(&self, payload: impl Into<Payload>) {
        self.target.settle(Outcome::Fulfill, payload.into());
    }
}

/// Handle that rejects its Deferred. Clones share the same target.
#[derive(Debug, Clone)]
pub struct Rejecter {
    target: Deferred,
}

impl Rejecter {
    /// Rejects the deferred with `payload`. A Deferred reason is adopted, so
    /// the deferred may still end up fulfilled.
    ///
    /// Ignored if either handle was already called.
    pub fn call(&self, payload: impl Into<Payload>) {
        self.target.settle(Outcome::Reject, payload.into());
    }
}
