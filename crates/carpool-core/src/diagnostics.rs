//! Injected diagnostics sink for the geocoding and search paths.
//!
//! Components log through a [`Diagnostics`] handle instead of calling the
//! `tracing` macros directly, so tests can assert on the events they emit.

/// Receives human-readable diagnostic events.
pub trait Diagnostics: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards every event to `tracing` under the given target component.
#[derive(Debug, Clone, Copy)]
pub struct TracingDiagnostics {
    component: &'static str,
}

impl TracingDiagnostics {
    #[must_use]
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl Default for TracingDiagnostics {
    fn default() -> Self {
        Self::new("carpool")
    }
}

impl Diagnostics for TracingDiagnostics {
    fn info(&self, message: &str) {
        tracing::info!(component = self.component, "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(component = self.component, "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(component = self.component, "{message}");
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for std::sync::Arc<D> {
    fn info(&self, message: &str) {
        (**self).info(message);
    }

    fn warn(&self, message: &str) {
        (**self).warn(message);
    }

    fn error(&self, message: &str) {
        (**self).error(message);
    }
}
