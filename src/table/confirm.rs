//! Delete confirmation: a prompt with confirm / cancel and a fixed expiry.

use super::row::RowKey;
use async_trait::async_trait;
use std::time::Duration;

/// Default lifetime of a confirmation prompt.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

/// Question shown to the user before a row is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub row: usize,
    pub key: RowKey,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Confirm,
    Cancel,
    Expired,
}

/// Something that can answer a [`ConfirmPrompt`].
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> ConfirmDecision;
}

/// Answers every prompt with the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmer(pub ConfirmDecision);

#[async_trait]
impl Confirmer for FixedConfirmer {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> ConfirmDecision {
        self.0
    }
}

/// Wraps a confirmer so an unanswered prompt expires.
pub struct TimedConfirmer<C> {
    inner: C,
    timeout: Duration,
}

impl<C: Confirmer> TimedConfirmer<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn with_default_timeout(inner: C) -> Self {
        Self::new(inner, DEFAULT_CONFIRM_TIMEOUT)
    }
}

#[async_trait]
impl<C: Confirmer> Confirmer for TimedConfirmer<C> {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> ConfirmDecision {
        match tokio::time::timeout(self.timeout, self.inner.confirm(prompt)).await {
            Ok(decision) => decision,
            Err(_) => ConfirmDecision::Expired,
        }
    }
}
