//! Authentication signal consumed by the task store.
//!
//! The store never inspects credentials; it only asks whether the caller is
//! currently signed in before each list fetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Answers "is the caller currently authenticated", synchronously.
pub trait AuthOracle: Send + Sync {
    /// Returns the current authentication status.
    fn is_authenticated(&self) -> bool;
}

impl<F> AuthOracle for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_authenticated(&self) -> bool {
        self()
    }
}

/// A shared, switchable authentication flag.
///
/// Clones observe the same flag, so a session layer can hold one clone and
/// flip it on sign-in/sign-out while the store holds another.
#[derive(Debug, Clone, Default)]
pub struct AuthFlag(Arc<AtomicBool>);

impl AuthFlag {
    /// Creates a flag with the given initial state.
    #[must_use]
    pub fn new(authenticated: bool) -> Self {
        Self(Arc::new(AtomicBool::new(authenticated)))
    }

    /// Updates the flag.
    pub fn set(&self, authenticated: bool) {
        self.0.store(authenticated, Ordering::SeqCst);
    }
}

impl AuthOracle for AuthFlag {
    fn is_authenticated(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
