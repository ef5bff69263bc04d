//! Document representation and the JSON shapes exchanged with the store.
//!
//! Documents travel as opaque JSON objects ([`RawDocument`]). Types that want a
//! typed view implement [`Document`] and get conversions through [`DocumentExt`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, from_value, to_value};
use std::fmt;

use crate::error::{SyncError, SyncResult};

/// Field holding the document identifier.
pub const ID_FIELD: &str = "_id";
/// Field holding the revision token assigned by the store.
pub const REV_FIELD: &str = "_rev";

/// Trait for typed documents stored in the document store.
///
/// # Example
///
/// ```ignore
/// use kernelsync_core::document::Document;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Project {
///     #[serde(rename = "_id")]
///     pub id: String,
///     pub name: String,
/// }
///
/// impl Document for Project {
///     fn id(&self) -> &str {
///         &self.id
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns this document's `_id`.
    fn id(&self) -> &str;
}

/// Extension trait converting typed documents to and from their raw form.
///
/// This trait is automatically implemented for all types that implement [`Document`].
pub trait DocumentExt: Document {
    /// Converts this document into a raw JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or does not produce an object.
    fn to_raw(&self) -> SyncResult<RawDocument>;

    /// Creates a document from its raw form.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    fn from_raw(raw: RawDocument) -> SyncResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_raw(&self) -> SyncResult<RawDocument> {
        RawDocument::from_value(to_value(self)?)
    }

    fn from_raw(raw: RawDocument) -> SyncResult<Self> {
        Ok(from_value(raw.into_value())?)
    }
}

/// An opaque JSON document as stored by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(Map<String, Value>);

impl RawDocument {
    /// Creates an empty document carrying only an `_id`.
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(ID_FIELD.to_string(), Value::String(id.into()));

        Self(fields)
    }

    /// Wraps a JSON value, which must be an object.
    pub fn from_value(value: Value) -> SyncResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(SyncError::InvalidDocument(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn rev(&self) -> Option<&str> {
        self.0.get(REV_FIELD).and_then(Value::as_str)
    }

    /// Returns the `_id`, failing when the document has none.
    pub fn require_id(&self) -> SyncResult<&str> {
        self.id()
            .ok_or_else(|| SyncError::InvalidDocument("document has no _id".into()))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn set_rev(&mut self, rev: impl Into<String>) {
        self.0.insert(REV_FIELD.to_string(), Value::String(rev.into()));
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Multi-line JSON rendering used when echoing a document back to the operator.
    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.to_string())
    }
}

impl fmt::Display for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Response of `GET /{db}/_all_docs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllDocs {
    pub total_rows: u64,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub rows: Vec<AllDocsRow>,
}

impl AllDocs {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.id.as_str())
    }

    pub fn first_id(&self) -> Option<&str> {
        self.rows.first().map(|row| row.id.as_str())
    }
}

/// A single `_all_docs` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<RowValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowValue {
    pub rev: String,
}

/// Response of a document PUT or DELETE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResult {
    #[serde(default)]
    pub ok: bool,
    pub id: String,
    pub rev: String,
}

/// Response of `GET /_membership`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(default)]
    pub all_nodes: Vec<String>,
    #[serde(default)]
    pub cluster_nodes: Vec<String>,
}

impl Membership {
    pub fn first_node(&self) -> Option<&str> {
        self.all_nodes.first().map(String::as_str)
    }
}

/// Response of `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub couchdb: String,
    pub version: String,
    #[serde(default)]
    pub uuid: Option<String>,
}

/// One per-node configuration value, addressed by section and key.
///
/// `value` is the plain string value; transports encode it as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub section: String,
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(section: &str, key: &str, value: impl Into<String>) -> Self {
        Self {
            section: section.to_string(),
            key: key.to_string(),
            value: value.into(),
        }
    }

    /// `section/key`, as it appears in the configuration path.
    pub fn path(&self) -> String {
        format!("{}/{}", self.section, self.key)
    }
}

/// Body of `PUT /{db}/_security`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityObject {
    pub admins: SecurityGroup,
    pub members: SecurityGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroup {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}
