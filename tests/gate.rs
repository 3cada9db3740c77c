//! Concurrency gate behavior: FIFO fairness, overflow and busy
//! signalling, waiter timeouts, and the Retry-After estimator.

mod common;

use std::sync::Arc;
use std::time::Duration;

use nmt_server::common::error::NmtError;
use nmt_server::pipelines::TranslateGate;

use common::test_config;

fn gate(max_inflight: usize, max_queue: usize, queue_enabled: bool) -> Arc<TranslateGate> {
    let mut config = test_config();
    config.enable_queue = queue_enabled;
    config.max_queue_size = max_queue;
    Arc::new(TranslateGate::new(&config, max_inflight))
}

#[tokio::test]
async fn waiters_are_released_in_fifo_order() -> anyhow::Result<()> {
    let gate = gate(1, 100, true);
    let first = gate.acquire(None).await?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut handles = Vec::new();
    for index in 0..3 {
        let gate = Arc::clone(&gate);
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            let slot = gate.acquire(None).await.unwrap();
            tx.send(index).unwrap();
            drop(slot);
        }));
        // Give each waiter time to enqueue before the next arrives
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    drop(first);
    for handle in handles {
        handle.await?;
    }
    let mut order = Vec::new();
    while let Ok(index) = rx.try_recv() {
        order.push(index);
    }
    assert_eq!(order, vec![0, 1, 2]);
    Ok(())
}

#[tokio::test]
async fn queue_disabled_rejects_busy() -> anyhow::Result<()> {
    let gate = gate(1, 100, false);
    let held = gate.acquire(None).await?;

    match gate.acquire(None).await {
        Err(NmtError::ServiceBusy) => {}
        other => panic!("expected ServiceBusy, got {other:?}"),
    }

    drop(held);
    // A freed slot is immediately acquirable again
    let _slot = gate.acquire(None).await?;
    Ok(())
}

#[tokio::test]
async fn zero_queue_overflows_every_extra_request() -> anyhow::Result<()> {
    let gate = gate(1, 0, true);
    let _held = gate.acquire(None).await?;

    for _ in 0..3 {
        match gate.acquire(None).await {
            Err(NmtError::QueueOverflow { waiters }) => assert!(waiters >= 1),
            other => panic!("expected QueueOverflow, got {other:?}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn expired_waiter_leaves_no_residue() -> anyhow::Result<()> {
    let gate = gate(1, 100, true);
    let held = gate.acquire(None).await?;

    match gate.acquire(Some(Duration::from_millis(30))).await {
        Err(NmtError::TranslationTimeout) => {}
        other => panic!("expected TranslationTimeout, got {other:?}"),
    }
    let metrics = gate.metrics();
    assert_eq!(metrics.waiting, 0);
    assert_eq!(metrics.inflight, 1);

    // The slot was not leaked by the expired waiter
    drop(held);
    let _slot = gate.acquire(Some(Duration::from_millis(100))).await?;
    Ok(())
}

#[tokio::test]
async fn every_acquire_pairs_with_one_release() -> anyhow::Result<()> {
    let gate = gate(2, 100, true);
    let a = gate.acquire(None).await?;
    let b = gate.acquire(None).await?;
    assert_eq!(gate.metrics().inflight, 2);
    drop(a);
    assert_eq!(gate.metrics().inflight, 1);
    drop(b);
    assert_eq!(gate.metrics().inflight, 0);
    Ok(())
}

#[tokio::test]
async fn retry_after_estimate_is_clamped() -> anyhow::Result<()> {
    let mut config = test_config();
    config.retry_after_min_sec = 1.0;
    config.retry_after_max_sec = 120.0;
    let gate = Arc::new(TranslateGate::new(&config, 2));

    // With no samples the estimate is the minimum
    assert_eq!(gate.estimate_retry_after(None), 1);
    assert_eq!(gate.estimate_retry_after(Some(0)), 1);

    // Feed the EMA a slow translation through the slot guard
    let slot = gate.acquire(None).await?;
    tokio::time::sleep(Duration::from_millis(80)).await;
    drop(slot);

    let estimate = gate.estimate_retry_after(Some(1000));
    assert!(estimate >= 1);
    assert!(estimate <= 120);
    Ok(())
}
