use aws_sdk_eventbridge::error::DisplayErrorContext;
use aws_sdk_eventbridge::operation::put_events::PutEventsOutput;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use stream_bridge_core::entry::TransportEntry;

use crate::adapters::event_sink::{EventSink, SinkError};

#[derive(Clone)]
pub struct EventBridgeSink {
    client: aws_sdk_eventbridge::Client,
}

impl EventBridgeSink {
    pub fn new(client: aws_sdk_eventbridge::Client) -> Self {
        Self { client }
    }
}

impl EventSink for EventBridgeSink {
    async fn put_events(&self, entries: Vec<TransportEntry>) -> Result<(), SinkError> {
        let request_entries = entries.into_iter().map(to_request_entry).collect();

        let output = self
            .client
            .put_events()
            .set_entries(Some(request_entries))
            .send()
            .await
            .map_err(|error| {
                SinkError::new(format!(
                    "failed to put events: {}",
                    DisplayErrorContext(&error)
                ))
            })?;

        check_put_events_output(&output)
    }
}

fn to_request_entry(entry: TransportEntry) -> PutEventsRequestEntry {
    PutEventsRequestEntry::builder()
        .event_bus_name(entry.bus_name)
        .detail_type(entry.detail_type)
        .detail(entry.detail)
        .source(entry.source)
        .build()
}

/// PutEvents reports rejected entries in a successful response; any rejection
/// fails the batch as a whole.
pub fn check_put_events_output(output: &PutEventsOutput) -> Result<(), SinkError> {
    let rejected: Vec<_> = output
        .entries()
        .iter()
        .filter(|entry| entry.error_code().is_some())
        .collect();

    let Some(first) = rejected.first() else {
        return Ok(());
    };

    Err(SinkError::new(format!(
        "{} of {} entries rejected by EventBridge (first: {}: {})",
        rejected.len(),
        output.entries().len(),
        first.error_code().unwrap_or_default(),
        first.error_message().unwrap_or_default(),
    )))
}

#[cfg(test)]
mod tests {
    use aws_sdk_eventbridge::types::PutEventsResultEntry;

    use super::*;

    #[test]
    fn accepts_response_without_rejections() {
        let output = PutEventsOutput::builder()
            .entries(PutEventsResultEntry::builder().event_id("e-1").build())
            .entries(PutEventsResultEntry::builder().event_id("e-2").build())
            .build();

        assert_eq!(check_put_events_output(&output), Ok(()));
    }

    #[test]
    fn rejected_entry_fails_the_batch() {
        let output = PutEventsOutput::builder()
            .entries(PutEventsResultEntry::builder().event_id("e-1").build())
            .entries(
                PutEventsResultEntry::builder()
                    .error_code("ThrottlingException")
                    .error_message("Rate exceeded")
                    .build(),
            )
            .build();

        let error = check_put_events_output(&output).expect_err("rejection should fail");
        assert_eq!(
            error.message,
            "1 of 2 entries rejected by EventBridge (first: ThrottlingException: Rate exceeded)"
        );
    }

    #[test]
    fn maps_transport_entry_fields() {
        let entry = to_request_entry(TransportEntry {
            bus_name: "orders-bus".to_string(),
            detail_type: "Orders-INSERT".to_string(),
            detail: "{}".to_string(),
            source: "com.example.orders".to_string(),
        });

        assert_eq!(entry.event_bus_name(), Some("orders-bus"));
        assert_eq!(entry.detail_type(), Some("Orders-INSERT"));
        assert_eq!(entry.detail(), Some("{}"));
        assert_eq!(entry.source(), Some("com.example.orders"));
    }
}
