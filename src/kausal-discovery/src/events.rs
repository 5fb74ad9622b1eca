//! Decision events emitted while the skeleton is pruned.

use std::fmt;
use std::sync::Mutex;

use kausal_core::ConditioningSet;
use log::info;
use serde::Serialize;

/// A single decision or progress marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiscoveryEvent {
    /// A depth pass is about to start over a graph with `edges` edges.
    DepthStarted { depth: usize, edges: usize },
    /// `x` and `y` were judged independent given `cond`.
    Independent {
        x: usize,
        y: usize,
        cond: ConditioningSet,
        p_value: f64,
    },
    /// `x` and `y` were judged dependent given `cond`.
    Dependent {
        x: usize,
        y: usize,
        cond: ConditioningSet,
        p_value: f64,
    },
    /// Background knowledge forbids both directions of `x - y`.
    ForbiddenByKnowledge {
        x: usize,
        y: usize,
        cond: ConditioningSet,
    },
    /// The test failed and the failure policy substituted `assumed_p_value`.
    TestFailed {
        x: usize,
        y: usize,
        cond: ConditioningSet,
        error: String,
        assumed_p_value: f64,
    },
    /// A depth pass finished.
    DepthCompleted {
        depth: usize,
        edges_removed: usize,
        tests_run: usize,
    },
}

impl fmt::Display for DiscoveryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthStarted { depth, edges } => {
                write!(f, "depth {depth}: {edges} edges")
            }
            Self::Independent {
                x,
                y,
                cond,
                p_value,
            } => write!(f, "{x} ind {y} | {cond} with p-value {p_value:.6}"),
            Self::Dependent {
                x,
                y,
                cond,
                p_value,
            } => write!(f, "{x} dep {y} | {cond} with p-value {p_value:.6}"),
            Self::ForbiddenByKnowledge { x, y, cond } => {
                write!(f, "{x} ind {y} | {cond} with background knowledge")
            }
            Self::TestFailed {
                x,
                y,
                cond,
                error,
                assumed_p_value,
            } => write!(
                f,
                "{x} ? {y} | {cond} failed ({error}), assuming p-value {assumed_p_value}"
            ),
            Self::DepthCompleted {
                depth,
                edges_removed,
                tests_run,
            } => write!(
                f,
                "depth {depth} done: {edges_removed} edges removed after {tests_run} tests"
            ),
        }
    }
}

/// Receiver for discovery events.
///
/// Sinks are shared with worker threads in parallel runs, but events are
/// always delivered from the driver thread in vertex order.
pub trait EventSink: Send + Sync {
    /// Handle one event.
    fn emit(&self, event: &DiscoveryEvent);
}

impl<F> EventSink for F
where
    F: Fn(&DiscoveryEvent) + Send + Sync,
{
    fn emit(&self, event: &DiscoveryEvent) {
        self(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &DiscoveryEvent) {}
}

/// Writes decisions through the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &DiscoveryEvent) {
        info!("{event}");
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<DiscoveryEvent>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events received so far.
    pub fn events(&self) -> Vec<DiscoveryEvent> {
        self.events.lock().expect("event lock poisoned").clone()
    }

    /// Number of events received so far.
    pub fn len(&self) -> usize {
        self.events.lock().expect("event lock poisoned").len()
    }

    /// Check if no event was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all collected events.
    pub fn clear(&self) {
        self.events.lock().expect("event lock poisoned").clear();
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &DiscoveryEvent) {
        self.events
            .lock()
            .expect("event lock poisoned")
            .push(event.clone());
    }
}
