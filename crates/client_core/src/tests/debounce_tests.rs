use super::*;
use tokio::time::{sleep, Instant};

const DELAY: Duration = Duration::from_millis(300);

#[tokio::test(start_paused = true)]
async fn rapid_pushes_deliver_only_the_last_value() {
    let (debouncer, mut rx) = Debouncer::new(DELAY);

    for text in ["r", "ro", "ros", "rose"] {
        debouncer.push(text.to_string());
        sleep(Duration::from_millis(100)).await;
    }

    assert_eq!(rx.recv().await.as_deref(), Some("rose"));
    sleep(DELAY * 2).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn flush_waits_for_full_quiet_period() {
    let (debouncer, mut rx) = Debouncer::new(DELAY);
    let started = Instant::now();

    debouncer.push(1_u32);
    sleep(Duration::from_millis(250)).await;
    debouncer.push(2);

    assert_eq!(rx.recv().await, Some(2));
    assert!(started.elapsed() >= Duration::from_millis(550));
}

#[tokio::test(start_paused = true)]
async fn spaced_pushes_each_flush() {
    let (debouncer, mut rx) = Debouncer::new(DELAY);

    debouncer.push("tulip");
    assert_eq!(rx.recv().await, Some("tulip"));
    debouncer.push("lily");
    assert_eq!(rx.recv().await, Some("lily"));
}

#[tokio::test(start_paused = true)]
async fn cancel_drops_pending_value() {
    let (debouncer, mut rx) = Debouncer::new(DELAY);

    debouncer.push(5_u64);
    assert!(debouncer.is_pending());
    debouncer.cancel();
    assert!(!debouncer.is_pending());

    sleep(DELAY * 2).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn dropping_debouncer_closes_channel_without_flushing() {
    let (debouncer, mut rx) = Debouncer::new(DELAY);
    debouncer.push(7_i32);
    drop(debouncer);

    assert_eq!(rx.recv().await, None);
}
