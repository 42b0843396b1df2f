use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

/// Field name to encoded attribute, as carried by `NewImage` / `OldImage`.
pub type Snapshot = BTreeMap<String, EncodedAttribute>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Modify,
    Remove,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Modify => "MODIFY",
            Self::Remove => "REMOVE",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invocation payload delivered by the DynamoDB Streams event source mapping.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<ChangeRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "eventID", default)]
    pub event_id: Option<String>,
    #[serde(rename = "eventName")]
    pub change_kind: ChangeKind,
    #[serde(rename = "eventSourceARN")]
    pub source_identifier: String,
    #[serde(rename = "eventSource", default)]
    pub event_source: Option<String>,
    #[serde(rename = "awsRegion", default)]
    pub aws_region: Option<String>,
    #[serde(default)]
    pub dynamodb: StreamImages,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamImages {
    #[serde(default)]
    pub keys: Option<Snapshot>,
    #[serde(default)]
    pub new_image: Option<Snapshot>,
    #[serde(default)]
    pub old_image: Option<Snapshot>,
    #[serde(default)]
    pub sequence_number: Option<String>,
}

impl ChangeRecord {
    pub fn new(source_identifier: impl Into<String>, change_kind: ChangeKind) -> Self {
        Self {
            event_id: None,
            change_kind,
            source_identifier: source_identifier.into(),
            event_source: None,
            aws_region: None,
            dynamodb: StreamImages::default(),
        }
    }

    pub fn with_new_image(mut self, image: Snapshot) -> Self {
        self.dynamodb.new_image = Some(image);
        self
    }

    pub fn with_old_image(mut self, image: Snapshot) -> Self {
        self.dynamodb.old_image = Some(image);
        self
    }

    /// The image that describes this change: the new image for INSERT and
    /// MODIFY, the old image for REMOVE.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self.change_kind {
            ChangeKind::Insert | ChangeKind::Modify => self.dynamodb.new_image.as_ref(),
            ChangeKind::Remove => self.dynamodb.old_image.as_ref(),
        }
    }
}

/// One DynamoDB attribute value in its JSON wire form.
///
/// Every variant has its own slot so that an attribute without any populated
/// slot can be represented and rejected during decoding. Binary slots keep the
/// base64 text of the wire form; it is validated when the attribute is decoded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EncodedAttribute {
    #[serde(rename = "N", default)]
    pub number: Option<String>,
    #[serde(rename = "S", default)]
    pub string: Option<String>,
    #[serde(rename = "M", default)]
    pub map: Option<BTreeMap<String, EncodedAttribute>>,
    #[serde(rename = "L", default)]
    pub list: Option<Vec<EncodedAttribute>>,
    #[serde(rename = "BOOL", default)]
    pub boolean: Option<bool>,
    #[serde(rename = "NULL", default)]
    pub null: Option<bool>,
    #[serde(rename = "B", default)]
    pub binary: Option<String>,
    #[serde(rename = "SS", default)]
    pub string_set: Vec<String>,
    #[serde(rename = "NS", default)]
    pub number_set: Vec<String>,
    #[serde(rename = "BS", default)]
    pub binary_set: Vec<String>,
}

impl EncodedAttribute {
    pub fn number(text: impl Into<String>) -> Self {
        Self {
            number: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self {
            string: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn map(entries: impl IntoIterator<Item = (String, EncodedAttribute)>) -> Self {
        Self {
            map: Some(entries.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn list(items: Vec<EncodedAttribute>) -> Self {
        Self {
            list: Some(items),
            ..Self::default()
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            boolean: Some(value),
            ..Self::default()
        }
    }

    pub fn null() -> Self {
        Self {
            null: Some(true),
            ..Self::default()
        }
    }

    pub fn binary(bytes: impl AsRef<[u8]>) -> Self {
        Self {
            binary: Some(STANDARD.encode(bytes)),
            ..Self::default()
        }
    }
}
