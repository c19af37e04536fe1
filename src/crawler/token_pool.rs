//! Credential pool shared by every query driver
//!
//! The pool hands out the first available token. A token that served more
//! than the usage ceiling is taken out of rotation before its next use, and a
//! token that reported a rate limit is taken out of rotation by the search
//! client. Either way it comes back, with a fresh usage budget, after the
//! backoff controller's current delay.

use crate::config::PoolConfig;
use crate::crawler::backoff::BackoffController;
use crate::state::Credential;
use crate::{MadeInError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Pool of API tokens with rate-limit bookkeeping
#[derive(Debug)]
pub struct TokenPool {
    credentials: Mutex<Vec<Credential>>,
    backoff: BackoffController,
    usage_ceiling: u32,
    cancel: CancellationToken,
}

impl TokenPool {
    /// Creates a pool over the given tokens
    ///
    /// Duplicate tokens are collapsed. The pool closes when `cancel` fires.
    pub fn new(
        tokens: impl IntoIterator<Item = String>,
        config: &PoolConfig,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        let mut credentials: Vec<Credential> = Vec::new();
        for token in tokens {
            if !credentials.iter().any(|c| c.token == token) {
                credentials.push(Credential::new(token));
            }
        }

        Arc::new(Self {
            credentials: Mutex::new(credentials),
            backoff: BackoffController::new(config.cooldown()),
            usage_ceiling: config.usage_ceiling,
            cancel,
        })
    }

    /// Returns an available token, waiting for one if necessary
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Token to use for one request
    /// * `Err(MadeInError::Cancelled)` - The pool was closed before or while waiting
    pub async fn acquire(self: &Arc<Self>) -> Result<String> {
        loop {
            if self.is_closed() {
                return Err(MadeInError::Cancelled);
            }

            let exhausted = {
                let mut credentials = self.credentials.lock().await;
                match credentials.iter_mut().find(|c| c.available) {
                    Some(credential) if credential.is_exhausted(self.usage_ceiling) => {
                        Some(credential.token.clone())
                    }
                    Some(credential) => {
                        credential.record_use();
                        return Ok(credential.token.clone());
                    }
                    None => None,
                }
            };

            match exhausted {
                Some(token) => {
                    self.backoff.escalate();
                    self.disable(&token).await;
                }
                None => {
                    let delay = self.backoff.current_delay();
                    tracing::warn!("No token available, waiting {:?}", delay);
                    self.delay().await?;
                }
            }
        }
    }

    /// Takes a token out of rotation and schedules its re-enable
    ///
    /// Disabling a token that is already out of rotation does nothing, so
    /// concurrent rate-limit reports for one token schedule a single re-enable.
    pub async fn disable(self: &Arc<Self>, token: &str) {
        let delay = self.backoff.current_delay();

        {
            let mut credentials = self.credentials.lock().await;
            let Some(credential) = credentials.iter_mut().find(|c| c.token == token) else {
                return;
            };
            if !credential.available {
                return;
            }
            credential.disable();
            tracing::warn!("Disabled token {} for {:?}", credential.masked(), delay);
        }

        let pool = Arc::clone(self);
        let token = token.to_string();
        drop(tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => pool.enable(&token).await,
                _ = pool.cancel.cancelled() => {}
            }
        }));
    }

    async fn enable(&self, token: &str) {
        let mut credentials = self.credentials.lock().await;
        if let Some(credential) = credentials.iter_mut().find(|c| c.token == token) {
            credential.enable();
            tracing::info!("Re-enabled token {}", credential.masked());
        }
    }

    /// Sleeps for the current backoff delay unless the pool closes first
    pub async fn delay(&self) -> Result<()> {
        tokio::select! {
            _ = tokio::time::sleep(self.backoff.current_delay()) => Ok(()),
            _ = self.cancel.cancelled() => Err(MadeInError::Cancelled),
        }
    }

    /// Closes the pool; pending and future acquires fail with `Cancelled`
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancellation token the pool observes
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn backoff(&self) -> &BackoffController {
        &self.backoff
    }

    /// Number of tokens in the pool
    pub async fn len(&self) -> usize {
        self.credentials.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of tokens currently in rotation
    pub async fn available_count(&self) -> usize {
        self.credentials
            .lock()
            .await
            .iter()
            .filter(|c| c.available)
            .count()
    }
}
