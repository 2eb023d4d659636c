//! Per-call context and observability hooks
//!
//! A [`Context`] travels through every Source, selector and mutator call. It
//! carries a cancellation token that every component checks and propagates
//! as [`Error::Cancelled`]; the core imposes no timeouts of its own.
//!
//! Telemetry is explicit: the engine holds an [`Observer`] and calls it once
//! per render and once per Source execution. [`NoopObserver`] is the default.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};

/// Cancellation handle shared by all clones of a context
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// Create a fresh, uncancelled context
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; visible to every clone of this context
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Error::Cancelled` once cancellation has been requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Receives render and per-Source telemetry.
///
/// Implementations must be thread-safe: `on_source` is called from
/// concurrent Source executions.
pub trait Observer: Send + Sync {
    /// Called once per render with its total duration and output size
    fn on_render(&self, duration: Duration, object_count: usize);

    /// Called once per Source execution
    fn on_source(
        &self,
        name: &str,
        duration: Duration,
        object_count: usize,
        error: Option<&Error>,
    );
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_render(&self, _duration: Duration, _object_count: usize) {}

    fn on_source(
        &self,
        _name: &str,
        _duration: Duration,
        _object_count: usize,
        _error: Option<&Error>,
    ) {
    }
}

/// One recorded observer callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Render {
        object_count: usize,
    },
    Source {
        name: String,
        object_count: usize,
        error: Option<String>,
    },
}

/// Observer that records events in call order, without durations
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, event: Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl Observer for RecordingObserver {
    fn on_render(&self, _duration: Duration, object_count: usize) {
        self.record(Event::Render { object_count });
    }

    fn on_source(
        &self,
        name: &str,
        _duration: Duration,
        object_count: usize,
        error: Option<&Error>,
    ) {
        self.record(Event::Source {
            name: name.to_string(),
            object_count,
            error: error.map(|e| e.to_string()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_cancel_is_shared_by_clones() {
        let ctx = Context::new();
        let clone = ctx.clone();
        assert!(ctx.check().is_ok());

        clone.cancel();

        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_source("a", Duration::ZERO, 2, None);
        observer.on_source("b", Duration::ZERO, 0, Some(&Error::Cancelled));
        observer.on_render(Duration::from_millis(3), 2);

        assert_eq!(
            observer.events(),
            vec![
                Event::Source {
                    name: "a".to_string(),
                    object_count: 2,
                    error: None
                },
                Event::Source {
                    name: "b".to_string(),
                    object_count: 0,
                    error: Some("Operation cancelled".to_string())
                },
                Event::Render { object_count: 2 },
            ]
        );
    }
}
