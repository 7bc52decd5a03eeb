//! Wait gate for detached writes.
//!
//! Detached logging calls return before their write has happened. The
//! gate counts those in-flight writes so a caller can later await them.

use std::sync::Arc;

use tokio::sync::watch;

/// Counts outstanding detached writes.
#[derive(Debug, Clone)]
pub struct WaitGate {
    outstanding: Arc<watch::Sender<usize>>,
}

impl WaitGate {
    pub fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            outstanding: Arc::new(outstanding),
        }
    }

    /// Mark one write as outstanding. Never blocks.
    ///
    /// The write counts as finished once the returned guard is dropped.
    pub fn hold(&self) -> GateGuard {
        self.outstanding.send_modify(|n| *n += 1);
        GateGuard { gate: self.clone() }
    }

    /// Mark one write as finished. Releasing an idle gate is a no-op.
    pub fn release(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Number of writes still outstanding.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Wait until no write is outstanding. Returns at once on an idle gate.
    pub async fn wait(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for WaitGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases its hold on the gate when dropped.
#[derive(Debug)]
#[must_use = "the write is considered finished as soon as the guard is dropped"]
pub struct GateGuard {
    gate: WaitGate,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_on_idle_gate_returns() {
        let gate = WaitGate::new();
        tokio::time::timeout(Duration::from_secs(1), gate.wait())
            .await
            .expect("idle gate should not block");
    }

    #[tokio::test]
    async fn test_redundant_release_is_harmless() {
        let gate = WaitGate::new();
        gate.release();
        gate.release();
        assert_eq!(gate.outstanding(), 0);

        let guard = gate.hold();
        assert_eq!(gate.outstanding(), 1);
        drop(guard);
        assert_eq!(gate.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_wait_blocks_until_guards_drop() {
        let gate = WaitGate::new();
        let first = gate.hold();
        let second = gate.hold();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(second);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait should finish once all guards drop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_guard_released_when_task_panics() {
        let gate = WaitGate::new();
        let guard = gate.hold();

        let task = tokio::spawn(async move {
            let _guard = guard;
            panic!("write blew up");
        });
        assert!(task.await.is_err());

        assert_eq!(gate.outstanding(), 0);
    }
}
