//! End-to-end scenarios against the public `QueueManager` API only,
//! scaled to millisecond budgets so the suite stays fast while
//! preserving the original timing relationships.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use taskq::config::QueueConfig;
use taskq::status::Status;
use taskq::{CommandFuture, QueueManager};

fn ok_immediate() -> Arc<dyn Fn(u32) -> CommandFuture<bool> + Send + Sync> {
    Arc::new(|_: u32| -> CommandFuture<bool> { Box::pin(async move { Ok(true) }) })
}

fn fail_return() -> Arc<dyn Fn(u32) -> CommandFuture<bool> + Send + Sync> {
    Arc::new(|_: u32| -> CommandFuture<bool> { Box::pin(async move { Ok(false) }) })
}

fn fail_raise() -> Arc<dyn Fn(u32) -> CommandFuture<bool> + Send + Sync> {
    Arc::new(|id: u32| -> CommandFuture<bool> {
        Box::pin(async move { Err(anyhow::anyhow!("iteration {id} value error")) })
    })
}

fn no_end() -> Arc<dyn Fn(u32) -> CommandFuture<bool> + Send + Sync> {
    Arc::new(|_: u32| -> CommandFuture<bool> {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(9999)).await;
            Ok(true)
        })
    })
}

/// Collects one status/return_value pair per callback invocation.
#[derive(Default)]
struct Recorder {
    statuses: Mutex<Vec<Status>>,
    returns: Mutex<Vec<Option<bool>>>,
}

impl Recorder {
    fn callback(recorder: &Arc<Self>) -> taskq::CallbackFn<u32, bool> {
        let recorder = Arc::clone(recorder);
        Arc::new(move |value, status, _args| {
            recorder.statuses.lock().unwrap().push(status);
            recorder.returns.lock().unwrap().push(value);
        })
    }

    fn count(&self, status: Status) -> usize {
        self.statuses.lock().unwrap().iter().filter(|s| **s == status).count()
    }

    fn all_returns_equal(&self, expected: Option<bool>) -> bool {
        self.returns.lock().unwrap().iter().all(|v| *v == expected)
    }
}

async fn wait_until_drained(queue: &QueueManager<u32, bool>, patience: Duration) {
    let start = Instant::now();
    while queue.length() > 0 && start.elapsed() < patience {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn all_ok_small_batch_completes_with_status_ok() {
    let recorder = Arc::new(Recorder::default());
    let config = QueueConfig::new("all-ok", 10).with_timeout(Duration::from_millis(200));
    let queue = QueueManager::with_callback(config, ok_immediate(), Recorder::callback(&recorder)).unwrap();

    for i in 0..10u32 {
        assert!(queue.add(i, None));
    }

    wait_until_drained(&queue, Duration::from_secs(2)).await;
    queue.shutdown();
    queue.join().await;

    assert_eq!(recorder.count(Status::Ok), 10);
}

#[tokio::test]
async fn overflow_rejects_surplus_with_queue_full() {
    let recorder = Arc::new(Recorder::default());
    let config = QueueConfig::new("overflow", 10)
        .with_timeout(Duration::from_millis(100))
        .with_delay(Duration::from_millis(20));
    let queue = QueueManager::with_callback(config, ok_immediate(), Recorder::callback(&recorder)).unwrap();

    for i in 0..1000u32 {
        queue.add(i, None);
    }

    wait_until_drained(&queue, Duration::from_secs(2)).await;
    queue.shutdown();
    queue.join().await;

    assert!(recorder.count(Status::QueueFull) >= 10);
    // Only the few tasks that squeezed through before the burst filled
    // the queue should ever have completed.
    assert!(recorder.count(Status::Ok) <= 20);
}

#[tokio::test]
async fn hung_commands_time_out() {
    let recorder = Arc::new(Recorder::default());
    let config = QueueConfig::new("timeout", 10)
        .with_timeout(Duration::from_millis(50))
        .with_max_age(Duration::from_secs(30))
        .with_delay(Duration::from_millis(5));
    let queue = QueueManager::with_callback(config, no_end(), Recorder::callback(&recorder)).unwrap();

    for i in 0..10u32 {
        assert!(queue.add(i, None));
    }

    wait_until_drained(&queue, Duration::from_secs(5)).await;
    queue.shutdown();
    queue.join().await;

    assert_eq!(recorder.count(Status::Timeout), 10);
}

#[tokio::test]
async fn raised_errors_become_exception_status() {
    let recorder = Arc::new(Recorder::default());
    let config = QueueConfig::new("exception", 10).with_timeout(Duration::from_millis(100));
    let queue = QueueManager::with_callback(config, fail_raise(), Recorder::callback(&recorder)).unwrap();

    for i in 0..10u32 {
        assert!(queue.add(i, None));
    }

    wait_until_drained(&queue, Duration::from_secs(2)).await;
    queue.shutdown();
    queue.join().await;

    assert_eq!(recorder.count(Status::Exception), 10);
}

#[tokio::test]
async fn falsy_return_is_ok_status_with_false_value() {
    let recorder = Arc::new(Recorder::default());
    let config = QueueConfig::new("false-return", 10).with_timeout(Duration::from_millis(100));
    let queue = QueueManager::with_callback(config, fail_return(), Recorder::callback(&recorder)).unwrap();

    for i in 0..10u32 {
        assert!(queue.add(i, None));
    }

    wait_until_drained(&queue, Duration::from_secs(2)).await;
    queue.shutdown();
    queue.join().await;

    assert_eq!(recorder.count(Status::Ok), 10);
    assert!(recorder.all_returns_equal(Some(false)));
}

#[tokio::test]
async fn clear_leaves_at_most_the_in_flight_task_running() {
    let completed = Arc::new(AtomicUsize::new(0));
    let completed_clone = Arc::clone(&completed);
    let command: Arc<dyn Fn(u32) -> CommandFuture<bool> + Send + Sync> =
        Arc::new(move |_: u32| -> CommandFuture<bool> {
            let completed = Arc::clone(&completed_clone);
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            })
        });

    let config = QueueConfig::new("clear", 1000)
        .with_timeout(Duration::from_millis(500))
        .with_max_age(Duration::from_secs(5));
    let queue = QueueManager::new(config, command).unwrap();

    for i in 0..10u32 {
        queue.add(i, None);
    }
    queue.clear();

    assert!(queue.length() <= 1);

    wait_until_drained(&queue, Duration::from_secs(2)).await;
    queue.shutdown();
    queue.join().await;

    assert!(completed.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn run_after_delays_dispatch_but_all_eventually_complete() {
    let recorder = Arc::new(Recorder::default());
    let config = QueueConfig::new("delayed", 1000)
        .with_timeout(Duration::from_millis(200))
        .with_max_age(Duration::from_secs(10))
        .with_delay(Duration::from_millis(5));
    let queue = QueueManager::with_callback(config, ok_immediate(), Recorder::callback(&recorder)).unwrap();

    let offsets_ms = [0u64, 100, 0, 200, 0, 300];
    let now = Instant::now();
    let count = 60u32;
    for i in 0..count {
        let offset = offsets_ms[(i as usize) % offsets_ms.len()];
        let run_after = if offset == 0 {
            None
        } else {
            Some(now + Duration::from_millis(offset))
        };
        assert!(queue.add(i, run_after));
    }

    wait_until_drained(&queue, Duration::from_secs(5)).await;
    let elapsed = now.elapsed();
    queue.shutdown();
    queue.join().await;

    assert_eq!(recorder.count(Status::Ok), count as usize);
    assert!(elapsed > Duration::from_millis(300));
}

#[tokio::test]
async fn add_after_shutdown_is_rejected() {
    let recorder = Arc::new(Recorder::default());
    let config = QueueConfig::new("post-shutdown", 10).with_timeout(Duration::from_millis(100));
    let queue = QueueManager::with_callback(config, ok_immediate(), Recorder::callback(&recorder)).unwrap();

    queue.shutdown();
    queue.join().await;

    assert!(!queue.add(1, None));
    assert_eq!(recorder.count(Status::QueueFull), 1);
}

#[tokio::test]
async fn construction_rejects_zero_depth() {
    let config = QueueConfig::new("zero-depth", 0);
    let result = QueueManager::new(config, ok_immediate());
    assert!(result.is_err());
}

#[tokio::test]
async fn construction_rejects_empty_name() {
    let config = QueueConfig::new("", 10);
    let result = QueueManager::new(config, ok_immediate());
    assert!(result.is_err());
}
