//! Async runtime for deferred computations.
//!
//! This crate provides:
//! - [`Deferred`] - a settle-once value with chainable continuations,
//!   following the Promise/A+ contract
//! - [`EventLoop`] - the single-threaded, virtual-time host deferreds settle on
//! - [`Scheduler`] - the seam between the two
//!
//! # Examples
//!
//! ## Chaining
//!
//! ```
//! use async_runtime::{Deferred, EventLoop, Handler};
//! use core_types::Value;
//!
//! let recovered = Deferred::resolved("ok")
//!     .then(Some(Handler::new(|_| Err("err".into()))), None)
//!     .then(None, Some(Handler::new(|e| Ok(format!("{}2", e).into()))));
//!
//! EventLoop::current().run_until_done().unwrap();
//! assert_eq!(recovered.value(), Some(Value::from("err2")));
//! ```
//!
//! ## Timers
//!
//! ```
//! use async_runtime::{Deferred, DeferredState, EventLoop, Task};
//! use std::time::Duration;
//!
//! let event_loop = EventLoop::current();
//! let deferred = Deferred::new(|resolve, _| {
//!     event_loop.set_timeout(Duration::from_millis(1000), Task::new(move || {
//!         resolve.call("ok");
//!         Ok(())
//!     }));
//!     Ok(())
//! });
//!
//! event_loop.run_for(Duration::from_millis(999)).unwrap();
//! assert_eq!(deferred.state(), DeferredState::Pending);
//! event_loop.run_until_done().unwrap();
//! assert_eq!(deferred.state(), DeferredState::Fulfilled);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod deferred;
pub mod error;
pub mod event_loop;
pub mod scheduler;
pub mod task_queue;

// Re-export main types at crate root
pub use config::EventLoopConfig;
pub use deferred::{Completion, Deferred, DeferredState, Handler, Payload, Rejecter, Resolver};
pub use error::{ChainCycleError, RuntimeError, RuntimeResult};
pub use event_loop::EventLoop;
pub use scheduler::Scheduler;
pub use task_queue::{Task, TaskQueue, TimerId};
