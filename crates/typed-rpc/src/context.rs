//! Context threaded through middleware into handlers

use std::sync::Arc;

/// Shared, read-only view of the current context value.
///
/// The seed context handed to a router or direct caller is wrapped once per
/// step; each middleware step produces the next context value.
pub struct Context<T: Send + Sync + 'static> {
    inner: Arc<T>,
}

impl<T: Send + Sync + 'static> Context<T> {
    /// Create a new context wrapping the given value
    pub fn new(ctx: T) -> Self {
        Self {
            inner: Arc::new(ctx),
        }
    }

    /// Get a reference to the inner context
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Get the Arc for sharing
    pub fn arc(&self) -> Arc<T> {
        self.inner.clone()
    }
}

impl<T: Send + Sync + 'static> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> std::ops::Deref for Context<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: Send + Sync + 'static + Default> Default for Context<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Send + Sync + 'static + std::fmt::Debug> std::fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Context").field(&self.inner).finish()
    }
}

/// Empty context for routers that don't need state
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct EmptyContext;
