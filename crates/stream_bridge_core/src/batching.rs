use std::ops::Range;

/// PutEvents accepts at most ten entries per request.
pub const MAX_ENTRIES_PER_BATCH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchAssignment {
    pub batch_index: usize,
    pub start_index: usize,
    pub end_index_exclusive: usize,
}

impl BatchAssignment {
    pub fn len(&self) -> usize {
        self.end_index_exclusive - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start_index..self.end_index_exclusive
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,
    #[error("{0}")]
    Coverage(&'static str),
}

/// Splits `total_records` into consecutive batches of at most `batch_size`.
/// Only the last batch may be short.
pub fn compute_batch_plan(
    total_records: usize,
    batch_size: usize,
) -> Result<Vec<BatchAssignment>, PlanError> {
    if batch_size == 0 {
        return Err(PlanError::ZeroBatchSize);
    }

    let batch_count = total_records.div_ceil(batch_size);
    let mut assignments = Vec::with_capacity(batch_count);

    for batch_index in 0..batch_count {
        let start_index = batch_index * batch_size;
        let end_index_exclusive = (start_index + batch_size).min(total_records);
        assignments.push(BatchAssignment {
            batch_index,
            start_index,
            end_index_exclusive,
        });
    }

    validate_assignments(total_records, batch_size, &assignments)?;
    Ok(assignments)
}

fn validate_assignments(
    total_records: usize,
    batch_size: usize,
    assignments: &[BatchAssignment],
) -> Result<(), PlanError> {
    let Some((first, last)) = assignments.first().zip(assignments.last()) else {
        return if total_records == 0 {
            Ok(())
        } else {
            Err(PlanError::Coverage("No batches planned for non-empty input"))
        };
    };

    if first.start_index != 0 || last.end_index_exclusive != total_records {
        return Err(PlanError::Coverage(
            "Batch boundaries do not cover every record",
        ));
    }

    for idx in 1..assignments.len() {
        if assignments[idx - 1].end_index_exclusive != assignments[idx].start_index {
            return Err(PlanError::Coverage("Batch boundaries overlap or leave gaps"));
        }
    }

    if assignments
        .iter()
        .any(|assignment| assignment.is_empty() || assignment.len() > batch_size)
    {
        return Err(PlanError::Coverage("Batch size out of bounds"));
    }

    Ok(())
}

/// Borrows the records of each planned batch, in plan order.
pub fn partition<'a, T>(
    items: &'a [T],
    plan: &'a [BatchAssignment],
) -> impl Iterator<Item = (BatchAssignment, &'a [T])> + 'a {
    plan.iter()
        .map(move |assignment| (*assignment, &items[assignment.range()]))
}
