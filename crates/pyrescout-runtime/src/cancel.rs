//! [`CancelToken`] – the fleet-wide advisory interrupt flag.
//!
//! The operator (Ctrl-C handler, reset command) arms the token; every agent
//! search loop checks it at iteration boundaries only.  It never preempts an
//! in-flight motion, capture, or record step, so a capture that is underway
//! when the token is armed still completes its evidence record.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle to a shared cancellation flag.  All clones observe the
/// same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the token.  Irreversible for the lifetime of the fleet run.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unarmed() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
