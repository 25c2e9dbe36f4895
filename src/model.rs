use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata of one document in the application data folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
}

/// New contents for `update`. A structured value is serialized to JSON text,
/// raw text is uploaded as is.
#[derive(Debug, Clone, PartialEq)]
pub enum Contents {
    Json(Value),
    Raw(String),
}

impl Contents {
    pub fn into_body(self) -> serde_json::Result<String> {
        match self {
            Contents::Json(value) => serde_json::to_string(&value),
            Contents::Raw(text) => Ok(text),
        }
    }
}

impl From<Value> for Contents {
    fn from(value: Value) -> Self {
        Contents::Json(value)
    }
}

impl From<String> for Contents {
    fn from(text: String) -> Self {
        Contents::Raw(text)
    }
}

impl From<&str> for Contents {
    fn from(text: &str) -> Self {
        Contents::Raw(text.to_owned())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FileList {
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedFile {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateFile<'a> {
    pub name: &'a str,
    pub parents: [&'a str; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct RenameFile<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: Option<String>,
}
