use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-key async gate. While one task holds the guard for a key, other tasks
/// asking for the same key wait; unrelated keys are never blocked.
#[derive(Debug, Default)]
pub struct InFlight {
    gates: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one fetch. Dropping it wakes the next waiter and
/// drops the gate once nobody else is using it.
pub struct FlightGuard<'a> {
    owner: &'a InFlight,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enter(&self, key: &str) -> FlightGuard<'_> {
        let gate = {
            let mut gates = self.gates.lock();
            Arc::clone(
                gates
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };

        let guard = gate.lock_owned().await;
        FlightGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys that currently have a holder or waiters.
    pub fn active(&self) -> usize {
        self.gates.lock().len()
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut gates = self.owner.gates.lock();
        // The map holds one reference; anything above that is a waiter.
        if let Some(gate) = gates.get(&self.key) {
            if Arc::strong_count(gate) == 1 {
                gates.remove(&self.key);
            }
        }
    }
}
