//! Test doubles for the store and biometric collaborators.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::biometrics::{BiometricGate, BiometricOutcome};
use crate::error::{BiometricError, StoreError};
use crate::secret_store::{MemorySecretStore, SecretStore};

/// In-memory store with switchable failures, counters and read latency.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemorySecretStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    read_delay: Option<Duration>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Successful sets and deletes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FaultyStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".into()));
        }
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.set_item(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_item(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.delete_item(key).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Biometric gate with a fixed answer that counts prompts.
pub struct ScriptedGate {
    outcome: BiometricOutcome,
    hardware: bool,
    enrolled: bool,
    error: bool,
    prompts: AtomicUsize,
    last_message: Mutex<Option<String>>,
}

impl Default for ScriptedGate {
    fn default() -> Self {
        Self::new(BiometricOutcome::Success)
    }
}

impl ScriptedGate {
    pub fn new(outcome: BiometricOutcome) -> Self {
        Self {
            outcome,
            hardware: true,
            enrolled: true,
            error: false,
            prompts: AtomicUsize::new(0),
            last_message: Mutex::new(None),
        }
    }

    pub fn with_enrolled(mut self, enrolled: bool) -> Self {
        self.enrolled = enrolled;
        self
    }

    /// Prompt returns a platform error.
    pub fn failing(mut self) -> Self {
        self.error = true;
        self
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn last_message(&self) -> Option<String> {
        self.last_message.lock().unwrap().clone()
    }
}

#[async_trait]
impl BiometricGate for ScriptedGate {
    async fn hardware_present(&self) -> bool {
        self.hardware
    }

    async fn enrolled(&self) -> bool {
        self.enrolled
    }

    async fn prompt(&self, message: &str) -> Result<BiometricOutcome, BiometricError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        *self.last_message.lock().unwrap() = Some(message.to_owned());
        if self.error {
            return Err(BiometricError::Platform("sensor error".into()));
        }
        Ok(self.outcome)
    }
}
