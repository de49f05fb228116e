use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::transform::Stage;

/// Events emitted while a transformer runs.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformEvent {
    /// The input had no rows or no columns; no stage ran.
    EmptyInput { columns: usize },
    RunStarted { rows: usize, columns: usize },
    StageStarted { stage: Stage },
    StageFinished {
        stage: Stage,
        rows: usize,
        columns: usize,
        elapsed: Duration,
    },
    RunFinished {
        elapsed: Duration,
        output_rows: usize,
        output_columns: usize,
        is_valid: bool,
    },
}

/// Observer hook for transform events.
///
/// Implementors can record metrics, write logs, or trigger alerts.
pub trait TransformObserver: Send + Sync {
    fn on_event(&self, event: &TransformEvent);
}

/// A simple stderr logger for transform events.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl TransformObserver for StdErrObserver {
    fn on_event(&self, event: &TransformEvent) {
        match event {
            TransformEvent::StageFinished {
                stage,
                rows,
                columns,
                elapsed,
            } => eprintln!("[transform][{stage}] rows={rows} columns={columns} elapsed={elapsed:?}"),
            other => eprintln!("[transform] {other:?}"),
        }
    }
}

/// An observer that fans out events to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn TransformObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn TransformObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl TransformObserver for CompositeObserver {
    fn on_event(&self, event: &TransformEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}
