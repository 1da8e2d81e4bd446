use crate::job_engine::closure_job::ClosureJob;
use crate::job_engine::event_loop::{EventLoop, LoopState, StopMode};
use crate::job_engine::future_job::FutureJob;
use crate::job_engine::job::Job;
use crate::job_engine::queue::TimeOrderedQueue;
use crate::job_engine::target::Handler;
use crate::job_engine::task::Task;
use crate::{LoopConfig, LoopError, SubmitError};

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Simple shared integer counter
fn shared_counter() -> Arc<Mutex<i32>> {
    Arc::new(Mutex::new(0))
}

fn shared_log() -> Arc<Mutex<Vec<&'static str>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Box<dyn Job> {
    let log = log.clone();
    Box::new(ClosureJob::new(label, move || {
        log.lock().unwrap().push(label);
    }))
}

fn run_next(queue: &TimeOrderedQueue) -> bool {
    match queue.take_next() {
        Some(task) => {
            task.invoke().unwrap();
            true
        }
        None => false,
    }
}

//
// 1. Queue ordering
//
#[test]
fn test_distinct_due_times_come_out_ascending() {
    let queue = TimeOrderedQueue::new();
    let log = shared_log();
    let base = Instant::now();

    queue.enqueue(Task::at(record(&log, "30ms"), base + Duration::from_millis(30)));
    queue.enqueue(Task::at(record(&log, "10ms"), base + Duration::from_millis(10)));
    queue.enqueue(Task::at(record(&log, "20ms"), base + Duration::from_millis(20)));
    queue.enqueue(Task::at(record(&log, "now"), base));

    for _ in 0..4 {
        assert!(run_next(&queue));
    }
    assert_eq!(*log.lock().unwrap(), vec!["now", "10ms", "20ms", "30ms"]);
    assert!(queue.is_empty());
}

#[test]
fn test_equal_due_times_are_fifo() {
    let queue = TimeOrderedQueue::new();
    let log = shared_log();
    let due = Instant::now();

    for label in ["a", "b", "c", "d", "e"] {
        queue.enqueue(Task::at(record(&log, label), due));
    }
    for _ in 0..5 {
        assert!(run_next(&queue));
    }
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn test_task_is_never_returned_early() {
    let queue = TimeOrderedQueue::new();
    let log = shared_log();
    let task = Task::with_delay(record(&log, "late"), Duration::from_millis(40)).unwrap();
    let due = task.due_time();
    queue.enqueue(task);
    assert_eq!(queue.next_due(), Some(due));

    let task = queue.take_next().unwrap();
    assert!(Instant::now() >= due);
    assert_eq!(task.desc(), "late");
}

//
// 2. Wakeups
//
#[test]
fn test_earlier_insertion_interrupts_wait() {
    let queue = Arc::new(TimeOrderedQueue::new());
    let log = shared_log();
    queue.enqueue(Task::with_delay(record(&log, "far"), Duration::from_secs(5)).unwrap());

    let consumer_queue = queue.clone();
    let consumer = thread::spawn(move || {
        let started = Instant::now();
        let task = consumer_queue.take_next().unwrap();
        (task.desc().to_string(), started.elapsed())
    });

    thread::sleep(Duration::from_millis(20));
    queue.enqueue(Task::new(record(&log, "near")));

    let (desc, waited) = consumer.join().unwrap();
    assert_eq!(desc, "near");
    assert!(waited < Duration::from_secs(2));
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_shutdown_wakes_blocked_consumer() {
    let queue = Arc::new(TimeOrderedQueue::new());

    let consumer_queue = queue.clone();
    let consumer = thread::spawn(move || consumer_queue.take_next().is_none());

    thread::sleep(Duration::from_millis(20));
    queue.request_shutdown();

    assert!(consumer.join().unwrap());
}

//
// 3. Shutdown modes on the queue
//
#[test]
fn test_hard_shutdown_rejects_and_discards() {
    let queue = TimeOrderedQueue::new();
    let log = shared_log();
    queue.enqueue(Task::new(record(&log, "a")));
    queue.enqueue(Task::new(record(&log, "b")));
    queue.enqueue(Task::with_delay(record(&log, "c"), Duration::from_secs(1)).unwrap());

    queue.request_shutdown();
    queue.request_shutdown();

    assert!(!queue.enqueue(Task::new(record(&log, "d"))));
    assert_eq!(
        queue.try_enqueue(Task::new(record(&log, "e"))),
        Err(SubmitError::Rejected)
    );
    assert!(queue.take_next().is_none());
    assert!(log.lock().unwrap().is_empty());

    let stats = queue.stats();
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.discarded, 3);
}

#[test]
fn test_graceful_shutdown_runs_due_and_discards_future() {
    let queue = TimeOrderedQueue::new();
    let log = shared_log();
    queue.enqueue(Task::with_delay(record(&log, "future"), Duration::from_millis(200)).unwrap());
    queue.enqueue(Task::new(record(&log, "a")));
    queue.enqueue(Task::new(record(&log, "b")));

    queue.request_shutdown_with(StopMode::Graceful);
    assert!(!queue.enqueue(Task::new(record(&log, "too late"))));

    assert!(run_next(&queue));
    assert!(run_next(&queue));
    assert!(!run_next(&queue));
    assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    assert_eq!(queue.stats().discarded, 1);
}

#[test]
fn test_drain_waits_for_pending_timers() {
    let queue = TimeOrderedQueue::new();
    let log = shared_log();
    let task = Task::with_delay(record(&log, "timer"), Duration::from_millis(30)).unwrap();
    let due = task.due_time();
    queue.enqueue(task);

    queue.request_shutdown_with(StopMode::Drain);

    assert!(run_next(&queue));
    assert!(Instant::now() >= due);
    assert!(!run_next(&queue));
    assert_eq!(*log.lock().unwrap(), vec!["timer"]);
    assert_eq!(queue.stats().discarded, 0);
}

#[test]
fn test_shutdown_only_escalates() {
    let queue = TimeOrderedQueue::new();
    let log = shared_log();
    queue.enqueue(Task::with_delay(record(&log, "future"), Duration::from_millis(100)).unwrap());

    queue.request_shutdown_with(StopMode::Graceful);
    // asking for a softer mode afterwards must not bring the timer back
    queue.request_shutdown_with(StopMode::Drain);

    assert!(!run_next(&queue));
    assert!(log.lock().unwrap().is_empty());

    queue.request_shutdown_with(StopMode::Hard);
    assert!(queue.is_shutdown());
    assert!(!run_next(&queue));
}

//
// 4. Loop lifecycle
//
#[test]
fn test_job_ordering_on_loop() {
    init_logger();
    let mut event_loop = EventLoop::new(LoopConfig::default().with_name("ordering"));
    let dispatcher = event_loop.dispatcher();
    let c = shared_counter();

    let c1 = c.clone();
    assert!(dispatcher.submit(move || {
        *c1.lock().unwrap() = 5;
    }));
    let c2 = c.clone();
    assert!(dispatcher.submit(move || {
        *c2.lock().unwrap() += 1;
    }));

    event_loop.start().unwrap();
    event_loop.stop_drain();
    event_loop.join().unwrap();

    assert_eq!(*c.lock().unwrap(), 6);
    assert_eq!(event_loop.state(), LoopState::Stopped);
}

#[test]
fn test_job_failure_does_not_crash_loop() {
    init_logger();
    let mut event_loop = EventLoop::with_defaults();
    let dispatcher = event_loop.dispatcher();
    let c = shared_counter();

    dispatcher.submit(|| panic!("intentional test panic"));
    dispatcher
        .dispatch(Box::new(ClosureJob::fallible("failing", || {
            Err(anyhow::anyhow!("intentional test error"))
        })))
        .unwrap();
    let c1 = c.clone();
    dispatcher.submit(move || {
        *c1.lock().unwrap() += 1;
    });

    event_loop.start().unwrap();
    event_loop.stop_drain();
    event_loop.join().unwrap();

    assert_eq!(*c.lock().unwrap(), 1);
    let stats = event_loop.stats();
    assert_eq!(stats.panicked, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.executed, 1);
}

#[test]
fn test_state_transitions_and_restart() {
    let mut event_loop = EventLoop::with_defaults();
    assert_eq!(event_loop.state(), LoopState::Created);

    event_loop.start().unwrap();
    assert_eq!(event_loop.state(), LoopState::Running);
    assert!(matches!(event_loop.start(), Err(LoopError::AlreadyStarted)));

    event_loop.stop_hard();
    event_loop.stop_hard();
    event_loop.join().unwrap();
    event_loop.join().unwrap();
    assert_eq!(event_loop.state(), LoopState::Stopped);
    assert!(matches!(event_loop.start(), Err(LoopError::Stopped)));
}

#[test]
fn test_stop_before_start() {
    let mut event_loop = EventLoop::with_defaults();
    event_loop.stop_graceful();
    assert_eq!(event_loop.state(), LoopState::Stopped);
    assert!(matches!(event_loop.start(), Err(LoopError::Stopped)));
    event_loop.join().unwrap();
}

#[test]
fn test_dispatcher_outlives_loop() {
    let event_loop = EventLoop::with_defaults();
    let dispatcher = event_loop.dispatcher();
    assert!(dispatcher.is_accepting());

    drop(event_loop);

    assert!(!dispatcher.is_accepting());
    assert!(!dispatcher.submit(|| {}));
}

#[test]
fn test_drop_stops_running_loop() {
    let c = shared_counter();
    let dispatcher;
    {
        let mut event_loop =
            EventLoop::new(LoopConfig::default().with_stop_on_drop(StopMode::Drain));
        dispatcher = event_loop.dispatcher();
        event_loop.start().unwrap();
        let c1 = c.clone();
        dispatcher.submit_after(
            move || {
                *c1.lock().unwrap() += 1;
            },
            Duration::from_millis(10),
        );
    }
    assert_eq!(*c.lock().unwrap(), 1);
    assert!(!dispatcher.submit(|| {}));
}

//
// 5. Dispatcher edge cases
//
#[test]
fn test_negative_delay_is_rejected() {
    let event_loop = EventLoop::with_defaults();
    let dispatcher = event_loop.dispatcher();

    assert_eq!(
        dispatcher.submit_after_millis(|| {}, -1),
        Err(SubmitError::InvalidDelay(-1))
    );
    assert_eq!(dispatcher.submit_after_millis(|| {}, 5), Ok(()));
    assert_eq!(
        dispatcher.try_submit_after(|| {}, Duration::MAX),
        Err(SubmitError::DelayOverflow)
    );
    assert_eq!(event_loop.stats().submitted, 1);
}

#[test]
fn test_future_job_runs_on_loop() {
    let mut event_loop = EventLoop::with_defaults();
    let dispatcher = event_loop.dispatcher();
    let c = shared_counter();

    let c1 = c.clone();
    assert!(dispatcher.submit_future(async move {
        let value = futures::future::ready(41).await;
        *c1.lock().unwrap() = value + 1;
    }));
    let c2 = c.clone();
    dispatcher
        .dispatch(Box::new(FutureJob::new("double", async move {
            *c2.lock().unwrap() *= 2;
        })))
        .unwrap();

    event_loop.start().unwrap();
    event_loop.stop_drain();
    event_loop.join().unwrap();

    assert_eq!(*c.lock().unwrap(), 84);
}

//
// 6. Target dispatch
//
struct Accumulator {
    total: Mutex<i32>,
}

impl Handler for Accumulator {
    type Message = i32;

    fn handle(&self, msg: i32) {
        *self.total.lock().unwrap() += msg;
    }
}

#[test]
fn test_handler_receives_messages() {
    let mut event_loop = EventLoop::with_defaults();
    let handler = Arc::new(Accumulator {
        total: Mutex::new(0),
    });
    let handler_ref = event_loop.dispatcher().bind(&handler);

    assert!(handler_ref.send(1));
    assert!(handler_ref.clone().send_after(10, Duration::from_millis(5)));

    event_loop.start().unwrap();
    event_loop.stop_drain();
    event_loop.join().unwrap();

    assert_eq!(*handler.total.lock().unwrap(), 11);
    assert!(!handler_ref.send(100));
}

#[test]
fn test_messages_for_vanished_handler_are_dropped() {
    let mut event_loop = EventLoop::with_defaults();
    let handler = Arc::new(Accumulator {
        total: Mutex::new(0),
    });
    let handler_ref = event_loop.dispatcher().bind(&handler);

    assert!(handler_ref.send_after(1, Duration::from_millis(20)));
    assert!(handler_ref.is_alive());
    drop(handler);
    assert!(!handler_ref.is_alive());

    event_loop.start().unwrap();
    event_loop.stop_drain();
    event_loop.join().unwrap();

    assert_eq!(event_loop.stats().target_gone, 1);
}
