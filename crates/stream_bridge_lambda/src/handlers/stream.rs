use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use stream_bridge_core::batching::{
    compute_batch_plan, partition, BatchAssignment, PlanError, MAX_ENTRIES_PER_BATCH,
};
use stream_bridge_core::entry::{build_entry, PublishTarget, TransformError, TransportEntry};
use stream_bridge_core::record::{ChangeRecord, StreamEvent};
use tokio::task::JoinSet;

use crate::adapters::event_sink::{EventSink, SinkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub records: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Position of the record in the invocation payload.
    pub record_index: usize,
    pub event_id: Option<String>,
    pub error: TransformError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The batch was not submitted because some of its records failed to transform.
    Transform(Vec<RecordFailure>),
    Submission(SinkError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub batch: BatchAssignment,
    pub cause: FailureCause,
}

impl std::fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "batch {} (records {}..{}): ",
            self.batch.batch_index, self.batch.start_index, self.batch.end_index_exclusive
        )?;
        match &self.cause {
            FailureCause::Transform(records) => {
                for (position, record) in records.iter().enumerate() {
                    if position > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "record {}: {}", record.record_index, record.error)?;
                }
                Ok(())
            }
            FailureCause::Submission(error) => write!(f, "submission failed: {error}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid batch plan: {0}")]
    Plan(#[from] PlanError),
    #[error("{}", describe_failures(.failures, .total_batches))]
    Batches {
        failures: Vec<BatchFailure>,
        total_batches: usize,
    },
}

impl DispatchError {
    pub fn failed_batches(&self) -> Vec<usize> {
        match self {
            Self::Plan(_) => Vec::new(),
            Self::Batches { failures, .. } => failures
                .iter()
                .map(|failure| failure.batch.batch_index)
                .collect(),
        }
    }
}

fn describe_failures(failures: &[BatchFailure], total_batches: &usize) -> String {
    let details = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{} of {total_batches} batches failed: {details}", failures.len())
}

/// Parses an invocation payload and publishes its records.
pub async fn handle_stream_event<S: EventSink>(
    event: Value,
    target: &PublishTarget,
    sink: Arc<S>,
) -> Result<DispatchSummary, lambda_runtime::Error> {
    let stream_event: StreamEvent = serde_json::from_value(event)
        .map_err(|error| lambda_runtime::Error::from(format!("invalid stream event: {error}")))?;

    tracing::info!(
        component = "stream_handler",
        record_count = stream_event.records.len(),
        "stream_processing_started"
    );

    let summary = dispatch_records(&stream_event.records, target, sink).await?;

    tracing::info!(
        component = "stream_handler",
        record_count = summary.records,
        batch_count = summary.batches,
        "stream_processing_completed"
    );
    Ok(summary)
}

/// Publishes `records` in batches of at most ten.
///
/// Every batch is transformed before any submission starts. Batches whose
/// records all transform are then submitted concurrently and all submissions
/// are awaited; a batch with a failing record is never submitted. Batches that
/// were published stay published when others fail.
pub async fn dispatch_records<S: EventSink>(
    records: &[ChangeRecord],
    target: &PublishTarget,
    sink: Arc<S>,
) -> Result<DispatchSummary, DispatchError> {
    let plan = compute_batch_plan(records.len(), MAX_ENTRIES_PER_BATCH)?;
    let mut failures = Vec::new();
    let mut ready = Vec::with_capacity(plan.len());

    for (batch, batch_records) in partition(records, &plan) {
        match transform_batch(batch, batch_records, target) {
            Ok(entries) => ready.push((batch, entries)),
            Err(cause) => failures.push(BatchFailure { batch, cause }),
        }
    }

    let mut submissions = JoinSet::new();
    let mut task_batches = HashMap::with_capacity(ready.len());
    let mut unreported = BTreeMap::new();
    for (batch, entries) in ready {
        let sink = Arc::clone(&sink);
        let handle = submissions.spawn(async move { (batch, sink.put_events(entries).await) });
        task_batches.insert(handle.id(), batch);
        unreported.insert(batch.batch_index, batch);
    }

    while let Some(joined) = submissions.join_next().await {
        match joined {
            Ok((batch, outcome)) => {
                unreported.remove(&batch.batch_index);
                if let Err(error) = outcome {
                    failures.push(BatchFailure {
                        batch,
                        cause: FailureCause::Submission(error),
                    });
                }
            }
            Err(join_error) => match task_batches.get(&join_error.id()).copied() {
                Some(batch) => {
                    unreported.remove(&batch.batch_index);
                    failures.push(BatchFailure {
                        batch,
                        cause: FailureCause::Submission(SinkError::new(format!(
                            "submission task did not complete: {join_error}"
                        ))),
                    });
                }
                None => tracing::error!(
                    component = "stream_dispatcher",
                    error = %join_error,
                    "unknown_submission_task_failed"
                ),
            },
        }
    }

    // Every spawned batch must end up either published or failed.
    for batch in unreported.into_values() {
        failures.push(BatchFailure {
            batch,
            cause: FailureCause::Submission(SinkError::new(
                "submission task ended without reporting an outcome",
            )),
        });
    }

    if failures.is_empty() {
        return Ok(DispatchSummary {
            records: records.len(),
            batches: plan.len(),
        });
    }

    failures.sort_by_key(|failure| failure.batch.batch_index);
    for failure in &failures {
        tracing::error!(
            component = "stream_dispatcher",
            batch_index = failure.batch.batch_index,
            start_index = failure.batch.start_index,
            end_index_exclusive = failure.batch.end_index_exclusive,
            error = %failure,
            "batch_failed"
        );
    }

    Err(DispatchError::Batches {
        failures,
        total_batches: plan.len(),
    })
}

fn transform_batch(
    batch: BatchAssignment,
    records: &[ChangeRecord],
    target: &PublishTarget,
) -> Result<Vec<TransportEntry>, FailureCause> {
    let mut entries = Vec::with_capacity(records.len());
    let mut record_failures = Vec::new();

    for (offset, record) in records.iter().enumerate() {
        match build_entry(record, target) {
            Ok(entry) => entries.push(entry),
            Err(error) => record_failures.push(RecordFailure {
                record_index: batch.start_index + offset,
                event_id: record.event_id.clone(),
                error,
            }),
        }
    }

    if record_failures.is_empty() {
        Ok(entries)
    } else {
        Err(FailureCause::Transform(record_failures))
    }
}
