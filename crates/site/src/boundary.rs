//! Error boundary for page rendering.
//!
//! An [`ErrorBoundary`] wraps the rendering of a piece of content. When the
//! content fails, either by returning an error or by panicking, the boundary
//! records the failure and renders a fallback instead. It keeps rendering
//! the fallback until [`ErrorBoundary::reset`] is called.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

/// A failure caught by an [`ErrorBoundary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaughtError {
    pub message: String,
    /// The failure was a panic rather than a returned error
    pub panicked: bool,
}

impl CaughtError {
    /// Build from a panic payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self {
            message,
            panicked: true,
        }
    }
}

impl Display for CaughtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where a boundary currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BoundaryState {
    /// Content renders normally.
    #[default]
    Normal,
    /// Content failed; the fallback renders until reset.
    Failed(CaughtError),
}

/// Catches failures from the content it wraps.
#[derive(Debug, Clone)]
pub struct ErrorBoundary {
    name: &'static str,
    state: BoundaryState,
}

impl ErrorBoundary {
    /// A boundary in the normal state. `name` identifies it in logs.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: BoundaryState::Normal,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &BoundaryState {
        &self.state
    }

    #[must_use]
    pub const fn error(&self) -> Option<&CaughtError> {
        match &self.state {
            BoundaryState::Normal => None,
            BoundaryState::Failed(err) => Some(err),
        }
    }

    #[must_use]
    pub const fn has_failed(&self) -> bool {
        matches!(self.state, BoundaryState::Failed(_))
    }

    /// Render `content`, or `fallback` if it fails.
    ///
    /// While the boundary is failed, `content` is not called at all.
    pub fn render<T, E, C, F>(&mut self, content: C, fallback: F) -> T
    where
        E: Display,
        C: FnOnce() -> Result<T, E>,
        F: FnOnce(&CaughtError) -> T,
    {
        if let BoundaryState::Failed(err) = &self.state {
            return fallback(err);
        }

        let caught = match panic::catch_unwind(AssertUnwindSafe(content)) {
            Ok(Ok(output)) => return output,
            Ok(Err(err)) => CaughtError {
                message: err.to_string(),
                panicked: false,
            },
            Err(payload) => CaughtError::from_panic(payload.as_ref()),
        };

        self.report(&caught);
        let output = fallback(&caught);
        self.state = BoundaryState::Failed(caught);
        output
    }

    /// Return to the normal state so the next render tries the content
    /// again.
    pub fn reset(&mut self) {
        self.state = BoundaryState::Normal;
    }

    fn report(&self, caught: &CaughtError) {
        let event_id = sentry::capture_message(&caught.message, sentry::Level::Error);
        error!(
            boundary = self.name,
            error = %caught.message,
            panicked = caught.panicked,
            sentry_event_id = %event_id,
            "Error caught by error boundary"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_normal_render_passes_through() {
        let mut boundary = ErrorBoundary::new("test");
        let out = boundary.render(|| Ok::<_, String>("content"), |_| "fallback");
        assert_eq!(out, "content");
        assert_eq!(boundary.state(), &BoundaryState::Normal);
    }

    #[test]
    fn test_error_switches_to_fallback_until_reset() {
        let mut boundary = ErrorBoundary::new("test");
        let calls = Cell::new(0);

        let out = boundary.render(
            || {
                calls.set(calls.get() + 1);
                Err::<String, _>("broken")
            },
            |err| format!("fallback: {err}"),
        );
        assert_eq!(out, "fallback: broken");
        assert!(boundary.has_failed());

        // Failed boundaries do not retry the content.
        let out = boundary.render(
            || {
                calls.set(calls.get() + 1);
                Ok::<_, String>("content".to_string())
            },
            |_| "still failed".to_string(),
        );
        assert_eq!(out, "still failed");
        assert_eq!(calls.get(), 1);

        boundary.reset();
        let out = boundary.render(|| Ok::<_, String>("content".to_string()), |_| String::new());
        assert_eq!(out, "content");
        assert!(boundary.error().is_none());
    }

    #[test]
    fn test_panic_is_caught() {
        let mut boundary = ErrorBoundary::new("test");
        let out = boundary.render(
            || -> Result<&str, String> { panic!("render exploded") },
            |err| if err.panicked { "caught" } else { "wrong" },
        );
        assert_eq!(out, "caught");
        assert_eq!(boundary.error().unwrap().message, "render exploded");
    }

    #[test]
    fn test_formatted_panic_message_is_kept() {
        let mut boundary = ErrorBoundary::new("test");
        let id = 7;
        boundary.render(
            || -> Result<(), String> { panic!("item {id} missing") },
            |_| (),
        );
        assert_eq!(boundary.error().unwrap().message, "item 7 missing");
    }
}
