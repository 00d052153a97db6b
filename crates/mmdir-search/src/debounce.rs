//! Coalescing of rapid "view settled" events.

use std::time::Duration;

use tokio::sync::mpsc;

/// Waits for an event, then keeps absorbing newer ones until `quiet` passes
/// with none. Returns the latest event, or `None` once the channel is closed
/// and drained.
pub async fn next_settled<T>(rx: &mut mpsc::Receiver<T>, quiet: Duration) -> Option<T> {
    let mut latest = rx.recv().await?;
    let mut coalesced = 0u32;
    loop {
        match tokio::time::timeout(quiet, rx.recv()).await {
            Ok(Some(event)) => {
                latest = event;
                coalesced += 1;
            }
            Ok(None) | Err(_) => break,
        }
    }
    if coalesced > 0 {
        tracing::debug!(coalesced, "debounced view-settled events");
    }
    Some(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    const QUIET: Duration = Duration::from_millis(1_600);

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_event() {
        let (tx, mut rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for i in 0..5 {
                tx.send(i).await.unwrap();
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let started = Instant::now();
        assert_eq!(next_settled(&mut rx, QUIET).await, Some(4));
        // Last event at 800 ms, then one full quiet period.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2_400), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2_500), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn events_separated_by_quiet_period_fire_separately() {
        let (tx, mut rx) = mpsc::channel(16);
        tokio::spawn(async move {
            tx.send("a").await.unwrap();
            tokio::time::sleep(Duration::from_millis(2_000)).await;
            tx.send("b").await.unwrap();
            tokio::time::sleep(Duration::from_millis(5_000)).await;
        });

        assert_eq!(next_settled(&mut rx, QUIET).await, Some("a"));
        assert_eq!(next_settled(&mut rx, QUIET).await, Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_channel_flushes_pending_then_ends() {
        let (tx, mut rx) = mpsc::channel(16);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        drop(tx);

        assert_eq!(next_settled(&mut rx, QUIET).await, Some(2));
        assert_eq!(next_settled(&mut rx, QUIET).await, None);
    }
}
