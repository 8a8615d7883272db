//! Unit tests for EventLoop

use async_runtime::{EventLoop, EventLoopConfig, RuntimeError, Task};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn push(log: &Rc<RefCell<Vec<&'static str>>>, entry: &'static str) -> Task {
    let log = Rc::clone(log);
    Task::new(move || {
        log.borrow_mut().push(entry);
        Ok(())
    })
}

#[test]
fn new_event_loop_is_idle() {
    let event_loop = EventLoop::new();
    assert!(event_loop.is_idle());
    assert_eq!(event_loop.pending_tasks(), 0);
}

#[test]
fn enqueue_task_adds_to_queue() {
    let event_loop = EventLoop::new();
    event_loop.enqueue_task(Task::new(|| Ok(())));
    assert!(!event_loop.is_idle());
}

#[test]
fn zero_delay_tasks_run_in_fifo_order() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(vec![]));

    event_loop.enqueue_task(push(&log, "first"));
    event_loop.enqueue_task(push(&log, "second"));
    event_loop.run_until_done().unwrap();

    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn timers_run_in_due_order_and_advance_clock() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(vec![]));

    event_loop.set_timeout(Duration::from_millis(1000), push(&log, "slow"));
    event_loop.set_timeout(Duration::from_millis(10), push(&log, "fast"));
    event_loop.enqueue_task(push(&log, "now"));

    event_loop.run_until_done().unwrap();

    assert_eq!(*log.borrow(), vec!["now", "fast", "slow"]);
    assert_eq!(event_loop.now(), Duration::from_millis(1000));
}

#[test]
fn run_one_runs_a_single_task() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(vec![]));
    event_loop.enqueue_task(push(&log, "a"));
    event_loop.enqueue_task(push(&log, "b"));

    assert!(event_loop.run_one().unwrap());
    assert_eq!(*log.borrow(), vec!["a"]);
    assert!(event_loop.run_one().unwrap());
    assert!(!event_loop.run_one().unwrap());
}

#[test]
fn run_for_stops_at_deadline() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(vec![]));
    event_loop.set_timeout(Duration::from_millis(500), push(&log, "early"));
    event_loop.set_timeout(Duration::from_millis(1500), push(&log, "late"));

    event_loop.run_for(Duration::from_millis(1000)).unwrap();

    assert_eq!(*log.borrow(), vec!["early"]);
    assert_eq!(event_loop.now(), Duration::from_millis(1000));
    assert_eq!(event_loop.pending_tasks(), 1);
}

#[test]
fn delays_are_relative_to_current_time() {
    let event_loop = EventLoop::new();
    event_loop.run_for(Duration::from_millis(100)).unwrap();
    event_loop.set_timeout(Duration::from_millis(50), Task::new(|| Ok(())));

    event_loop.run_until_done().unwrap();
    assert_eq!(event_loop.now(), Duration::from_millis(150));
}

#[test]
fn cleared_timer_never_runs() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(vec![]));
    let id = event_loop.set_timeout(Duration::from_millis(10), push(&log, "cleared"));

    assert!(event_loop.clear_timeout(id));
    event_loop.run_until_done().unwrap();

    assert!(log.borrow().is_empty());
    assert!(!event_loop.clear_timeout(id));
}

#[test]
fn self_rescheduling_task_hits_turn_limit() {
    fn reschedule(event_loop: EventLoop) -> Task {
        Task::new(move || {
            event_loop.enqueue_task(reschedule(event_loop.clone()));
            Ok(())
        })
    }

    let event_loop = EventLoop::with_config(EventLoopConfig::default().with_max_turns(Some(50)));
    event_loop.enqueue_task(reschedule(event_loop.clone()));

    assert_eq!(
        event_loop.run_until_done(),
        Err(RuntimeError::TurnLimitExceeded { limit: 50 })
    );
}

#[test]
fn unlimited_config_drains_everything() {
    let event_loop = EventLoop::with_config(EventLoopConfig::default().with_max_turns(None));
    for _ in 0..10 {
        event_loop.enqueue_task(Task::new(|| Ok(())));
    }
    event_loop.run_until_done().unwrap();
    assert!(event_loop.is_idle());
    assert_eq!(event_loop.config().max_turns, None);
}

#[test]
fn run_for_at_turn_limit_ignores_timers_past_the_deadline() {
    let event_loop = EventLoop::with_config(EventLoopConfig::default().with_max_turns(Some(2)));
    let log = Rc::new(RefCell::new(vec![]));
    event_loop.enqueue_task(push(&log, "a"));
    event_loop.enqueue_task(push(&log, "b"));
    event_loop.set_timeout(Duration::from_secs(10), push(&log, "far"));

    assert_eq!(event_loop.run_for(Duration::from_millis(1)), Ok(()));
    assert_eq!(*log.borrow(), vec!["a", "b"]);
    assert_eq!(event_loop.now(), Duration::from_millis(1));
    assert_eq!(event_loop.pending_tasks(), 1);
}

#[test]
fn run_for_at_turn_limit_fails_when_more_work_is_due() {
    let event_loop = EventLoop::with_config(EventLoopConfig::default().with_max_turns(Some(2)));
    for _ in 0..3 {
        event_loop.enqueue_task(Task::new(|| Ok(())));
    }

    assert_eq!(
        event_loop.run_for(Duration::from_millis(1)),
        Err(RuntimeError::TurnLimitExceeded { limit: 2 })
    );
}
