use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::{ChangeRecord, Snapshot};
use crate::value::{decode, DecodeError, GenericValue, PathSegment};

/// Bus and source stamped on every published entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub event_bus_name: String,
    pub event_source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportEntry {
    pub bus_name: String,
    pub detail_type: String,
    pub detail: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to serialize event detail: {0}")]
    Serialize(String),
}

/// `<table>-<change kind>`, where the table is the second `/` segment of the
/// event source ARN (`arn:...:table/<table>/stream/<label>`).
pub fn detail_type(record: &ChangeRecord) -> String {
    let table = record.source_identifier.split('/').nth(1).unwrap_or_default();
    format!("{table}-{}", record.change_kind)
}

/// Decodes every field of a snapshot. A missing snapshot yields no fields.
pub fn decode_snapshot(
    snapshot: Option<&Snapshot>,
) -> Result<BTreeMap<String, GenericValue>, DecodeError> {
    let Some(snapshot) = snapshot else {
        return Ok(BTreeMap::new());
    };

    let mut fields = BTreeMap::new();
    for (name, attribute) in snapshot {
        let value =
            decode(attribute).map_err(|error| error.within(PathSegment::Key(name.clone())))?;
        fields.insert(name.clone(), value);
    }
    Ok(fields)
}

pub fn build_entry(
    record: &ChangeRecord,
    target: &PublishTarget,
) -> Result<TransportEntry, TransformError> {
    let fields = decode_snapshot(record.snapshot())?;
    let detail = serde_json::to_string(&fields)
        .map_err(|error| TransformError::Serialize(error.to_string()))?;

    Ok(TransportEntry {
        bus_name: target.event_bus_name.clone(),
        detail_type: detail_type(record),
        detail,
        source: target.event_source.clone(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::record::{ChangeKind, EncodedAttribute};

    const ORDERS_ARN: &str = "arn:aws:dynamodb:region:acct:table/Orders/stream/2024";

    fn target() -> PublishTarget {
        PublishTarget {
            event_bus_name: "orders-bus".to_string(),
            event_source: "com.example.orders".to_string(),
        }
    }

    #[test]
    fn detail_type_uses_table_segment_and_change_kind() {
        let record = ChangeRecord::new(ORDERS_ARN, ChangeKind::Insert);
        assert_eq!(detail_type(&record), "Orders-INSERT");

        let record = ChangeRecord::new(ORDERS_ARN, ChangeKind::Remove);
        assert_eq!(detail_type(&record), "Orders-REMOVE");
    }

    #[test]
    fn detail_type_without_table_segment_is_kind_only() {
        let record = ChangeRecord::new("not-an-arn", ChangeKind::Modify);
        assert_eq!(detail_type(&record), "-MODIFY");
    }

    #[test]
    fn builds_entry_from_new_image() {
        let record = ChangeRecord::new(ORDERS_ARN, ChangeKind::Modify).with_new_image(
            Snapshot::from([
                ("id".to_string(), EncodedAttribute::string("o-1")),
                ("total".to_string(), EncodedAttribute::number("19.99")),
                ("items".to_string(), EncodedAttribute::number("3")),
            ]),
        );

        let entry = build_entry(&record, &target()).expect("entry should build");
        assert_eq!(
            entry,
            TransportEntry {
                bus_name: "orders-bus".to_string(),
                detail_type: "Orders-MODIFY".to_string(),
                detail: r#"{"id":"o-1","items":3,"total":19.99}"#.to_string(),
                source: "com.example.orders".to_string(),
            }
        );
    }

    #[test]
    fn remove_without_old_image_builds_empty_detail() {
        let record = ChangeRecord::new(ORDERS_ARN, ChangeKind::Remove)
            .with_new_image(Snapshot::from([(
                "ignored".to_string(),
                EncodedAttribute::string("x"),
            )]));

        let entry = build_entry(&record, &target()).expect("entry should build");
        assert_eq!(entry.detail, "{}");
        assert_eq!(entry.detail_type, "Orders-REMOVE");
    }

    #[test]
    fn decode_failure_names_the_field() {
        let record = ChangeRecord::new(ORDERS_ARN, ChangeKind::Insert).with_new_image(
            Snapshot::from([
                ("id".to_string(), EncodedAttribute::string("o-1")),
                ("broken".to_string(), EncodedAttribute::default()),
            ]),
        );

        let error = build_entry(&record, &target()).expect_err("decode should fail");
        assert_eq!(
            error.to_string(),
            "unrecognized attribute encoding at `broken`"
        );
    }

    #[test]
    fn detail_is_json_of_decoded_fields() {
        let record: ChangeRecord = serde_json::from_value(json!({
            "eventName": "INSERT",
            "eventSourceARN": ORDERS_ARN,
            "dynamodb": {
                "NewImage": {
                    "tags": {"SS": ["new", "priority"]},
                    "flags": {"M": {"gift": {"BOOL": true}, "note": {"NULL": true}}}
                }
            }
        }))
        .expect("record should parse");

        let entry = build_entry(&record, &target()).expect("entry should build");
        let detail: serde_json::Value =
            serde_json::from_str(&entry.detail).expect("detail should be json");
        assert_eq!(
            detail,
            json!({
                "flags": {"gift": true, "note": null},
                "tags": ["new", "priority"]
            })
        );
    }
}
