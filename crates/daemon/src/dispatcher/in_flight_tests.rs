use std::time::Duration;

use super::*;

#[tokio::test]
async fn wait_for_zero_returns_immediately_when_empty() {
    let inflight = InFlight::new();
    tokio::time::timeout(Duration::from_millis(50), inflight.wait_for_zero()).await.expect("should not block");
}

#[tokio::test]
async fn wait_for_zero_blocks_until_guards_drop() {
    let inflight = InFlight::new();
    let guard_a = inflight.enter();
    let guard_b = inflight.enter();
    assert_eq!(inflight.current(), 2);

    let waiter = {
        let inflight = Arc::clone(&inflight);
        tokio::spawn(async move {
            inflight.wait_for_zero().await;
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(guard_a);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(guard_b);
    tokio::time::timeout(Duration::from_millis(200), waiter).await.expect("waiter should finish").expect("no panic");
}
