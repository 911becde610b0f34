//! Event dispatcher - turns change events into backend calls.
//!
//! Each event is classified, decoded and given an identity (its *plan*), then
//! the resulting operation is sent to every configured backend in order.
//! Failures are confined to the event (and backend) that caused them: they
//! are logged, recorded in the [`BatchReport`], and processing moves on.

use crate::error::{DispatchError, DispatchResult};
use crate::identity::build_identity;
use crate::source::extract_source;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use streamdex_codec::decode_record;
use streamdex_sink::{IndexSettings, SearchBackend, SinkResult};
use streamdex_types::{ChangeEvent, Document, EventKind, SchemaMapping};
use tracing::{debug, error, info};

/// What a change event asks the backends to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Write the whole document, replacing any previous version.
    Upsert {
        index: String,
        id: String,
        document: Document,
    },
    /// Remove the document.
    Delete { index: String, id: String },
}

impl Operation {
    #[must_use]
    pub fn index(&self) -> &str {
        match self {
            Self::Upsert { index, .. } | Self::Delete { index, .. } => index,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Upsert { id, .. } | Self::Delete { id, .. } => id,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upsert { index, id, .. } => write!(f, "upsert {index}/{id}"),
            Self::Delete { index, id } => write!(f, "delete {index}/{id}"),
        }
    }
}

/// Result of sending one planned event to every backend.
#[derive(Debug)]
pub struct EventOutcome {
    pub operation: Operation,
    /// Names of the backends that applied the operation.
    pub acknowledged: Vec<String>,
    /// One [`DispatchError::Backend`] per backend that failed.
    pub failures: Vec<DispatchError>,
}

impl EventOutcome {
    /// True if every backend applied the operation.
    #[must_use]
    pub fn is_acknowledged(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One failed event, or one failed (event, backend) pair.
#[derive(Debug)]
pub struct EventFailure {
    /// Zero-based position of the event in its batch.
    pub position: usize,
    pub event_id: Option<String>,
    /// The backend that failed. `None` when the event could not be planned.
    pub backend: Option<String>,
    pub error: DispatchError,
}

/// Summary of a processed batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Events seen.
    pub total: usize,
    /// Events applied by every backend.
    pub acknowledged: usize,
    pub failures: Vec<EventFailure>,
}

impl BatchReport {
    /// True if nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Positions of events with at least one failure, without duplicates.
    #[must_use]
    pub fn failed_positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self.failures.iter().map(|f| f.position).collect();
        positions.dedup();
        positions
    }
}

/// Routes change events to search backends.
pub struct Dispatcher {
    backends: Vec<Arc<dyn SearchBackend>>,
    mapping: Option<Arc<SchemaMapping>>,
    index_settings: IndexSettings,
}

impl Dispatcher {
    /// Creates a dispatcher with no backends.
    ///
    /// Without a mapping, identities fall back to positional keys.
    #[must_use]
    pub fn new(mapping: Option<Arc<SchemaMapping>>) -> Self {
        Self {
            backends: Vec::new(),
            mapping,
            index_settings: IndexSettings::default(),
        }
    }

    /// Adds a backend. Backends receive operations in the order they were added.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    #[must_use]
    pub fn with_backends(mut self, backends: impl IntoIterator<Item = Arc<dyn SearchBackend>>) -> Self {
        self.backends.extend(backends);
        self
    }

    /// Settings used when an index is created on demand.
    #[must_use]
    pub fn with_index_settings(mut self, settings: IndexSettings) -> Self {
        self.index_settings = settings;
        self
    }

    pub fn backends(&self) -> &[Arc<dyn SearchBackend>] {
        &self.backends
    }

    pub fn mapping(&self) -> Option<&SchemaMapping> {
        self.mapping.as_deref()
    }

    /// Classifies, decodes and identifies an event without touching any backend.
    pub fn plan(&self, event: &ChangeEvent) -> DispatchResult<Operation> {
        let index = extract_source(&event.source_locator)?;
        let keys = decode_record(&event.key_attributes)?;
        let id = build_identity(&keys, &index, self.mapping())?;

        match event.kind {
            EventKind::Created | EventKind::Updated => {
                let image = event
                    .new_image
                    .as_ref()
                    .ok_or(DispatchError::MissingNewImage(event.kind))?;
                let document = decode_record(image)?;
                Ok(Operation::Upsert { index, id, document })
            }
            EventKind::Deleted => Ok(Operation::Delete { index, id }),
        }
    }

    /// Plans one event and sends it to every backend.
    ///
    /// Planning errors are returned; backend errors are collected in the
    /// outcome so that every backend gets its turn.
    pub async fn dispatch_event(&self, event: &ChangeEvent) -> DispatchResult<EventOutcome> {
        let operation = self.plan(event)?;
        debug!("Planned {} for {} event", operation, event.kind);

        let mut acknowledged = Vec::new();
        let mut failures = Vec::new();
        for backend in &self.backends {
            match self.apply(backend.as_ref(), &operation).await {
                Ok(()) => {
                    info!("[{}] applied {}", backend.name(), operation);
                    acknowledged.push(backend.name().to_string());
                }
                Err(e) => failures.push(DispatchError::backend(backend.name(), e)),
            }
        }

        Ok(EventOutcome {
            operation,
            acknowledged,
            failures,
        })
    }

    /// Processes events in order. Never fails as a whole.
    pub async fn dispatch_batch(&self, events: &[ChangeEvent]) -> BatchReport {
        let mut report = BatchReport::default();
        for (position, event) in events.iter().enumerate() {
            self.dispatch_into(&mut report, position, event).await;
        }
        report
    }

    /// Parses and processes raw stream records in order.
    ///
    /// A record that cannot be parsed counts as a failed event.
    pub async fn dispatch_records(&self, records: &[Value]) -> BatchReport {
        let mut report = BatchReport::default();
        for (position, record) in records.iter().enumerate() {
            match ChangeEvent::from_record(record) {
                Ok(event) => self.dispatch_into(&mut report, position, &event).await,
                Err(e) => {
                    error!(record = %record, error = %e, "Failed to process record");
                    report.total += 1;
                    report.failures.push(EventFailure {
                        position,
                        event_id: record
                            .get("eventID")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        backend: None,
                        error: e.into(),
                    });
                }
            }
        }
        report
    }

    async fn dispatch_into(&self, report: &mut BatchReport, position: usize, event: &ChangeEvent) {
        report.total += 1;
        match self.dispatch_event(event).await {
            Ok(outcome) => {
                if outcome.is_acknowledged() {
                    report.acknowledged += 1;
                }
                for failure in outcome.failures {
                    error!(event = %event.to_record(), error = %failure, "Failed to apply event");
                    let backend = match &failure {
                        DispatchError::Backend { backend, .. } => Some(backend.clone()),
                        _ => None,
                    };
                    report.failures.push(EventFailure {
                        position,
                        event_id: event.event_id.clone(),
                        backend,
                        error: failure,
                    });
                }
            }
            Err(e) => {
                error!(event = %event.to_record(), error = %e, "Failed to process event");
                report.failures.push(EventFailure {
                    position,
                    event_id: event.event_id.clone(),
                    backend: None,
                    error: e,
                });
            }
        }
    }

    async fn apply(&self, backend: &dyn SearchBackend, operation: &Operation) -> SinkResult<()> {
        match operation {
            Operation::Upsert { index, id, document } => {
                if backend.requires_index_creation() {
                    self.ensure_index(backend, index).await?;
                }
                backend.write_document(index, id, document).await
            }
            Operation::Delete { index, id } => backend.delete_document(index, id).await,
        }
    }

    async fn ensure_index(&self, backend: &dyn SearchBackend, index: &str) -> SinkResult<()> {
        if backend.index_exists(index).await? {
            return Ok(());
        }
        info!("[{}] creating missing index {}", backend.name(), index);
        backend.create_index(index, &self.index_settings).await
    }
}
