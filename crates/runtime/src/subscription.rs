use tracing::trace;

/// Owned registration of an event listener.
///
/// Disposing (or dropping) the subscription runs its deregistration exactly
/// once.
pub struct Subscription {
    label: &'static str,
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new<F>(label: &'static str, dispose: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            label,
            dispose: Some(Box::new(dispose)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_active(&self) -> bool {
        self.dispose.is_some()
    }

    pub fn dispose(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            trace!(label = self.label, "subscription disposed");
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}
