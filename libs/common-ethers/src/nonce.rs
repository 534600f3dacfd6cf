use std::future::Future;

use ethers::types::U256;
use tokio::sync::Mutex;

/// Locally counted nonce.
///
/// Seeded once from the chain on first use, then every call hands out the
/// previous value plus one. Callers racing for a nonce are serialized, the
/// seed is fetched at most once.
#[derive(Debug, Default)]
pub struct NonceCounter {
    next: Mutex<Option<U256>>,
}

impl NonceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn next<F, Fut>(&self, seed: F) -> eyre::Result<U256>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = eyre::Result<U256>>,
    {
        let mut guard = self.next.lock().await;
        let nonce = match *guard {
            Some(nonce) => nonce,
            None => seed().await?,
        };
        guard.replace(nonce + 1);
        Ok(nonce)
    }

    /// Nonce the next call would return, if seeded.
    pub async fn peek(&self) -> Option<U256> {
        *self.next.lock().await
    }
}
