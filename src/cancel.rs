use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// shared cancellation flag, threaded through every external call
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// create a token that fires on SIGINT/SIGTERM
    pub fn install() -> anyhow::Result<Self> {
        let token = Self::new();
        let handler_token = token.clone();
        ctrlc::set_handler(move || handler_token.cancel())
            .map_err(|e| anyhow::anyhow!("failed to install signal handler: {e}"))?;
        Ok(token)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// check-and-abort for the top of loops
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
