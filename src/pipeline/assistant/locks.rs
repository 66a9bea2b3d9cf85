//! Per-patient turn serialization.
//!
//! A chat turn reads the last assistant turn as its change cutoff. Two turns for the
//! same patient running at once would read the same cutoff and narrate the same changes
//! twice, so turns for one patient queue behind each other while different patients
//! proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use super::AssistantError;

/// Exclusive access token for one patient. Released on drop.
pub type TurnGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct PatientTurnLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PatientTurnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn holds `patient_id`, then hold it.
    pub async fn acquire(&self, patient_id: &str) -> Result<TurnGuard, AssistantError> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| AssistantError::RecordSource("turn lock table poisoned".into()))?;
            // Entries nobody holds or waits on can go.
            locks.retain(|id, l| id == patient_id || Arc::strong_count(l) > 1);
            locks
                .entry(patient_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        Ok(lock.lock_owned().await)
    }

    /// Number of patients with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}
