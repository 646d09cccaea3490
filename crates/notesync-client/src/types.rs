//! Knowledge-server wire types.

use notesync_core::{NoteInfo, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Envelope around every knowledge-server response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope {
    pub return_code: i64,
    #[serde(default)]
    pub return_message: String,
    #[serde(default, deserialize_with = "extern_code_string")]
    pub extern_code: Option<String>,
    #[serde(default)]
    pub result: Option<JsonValue>,
}

/// `externCode` arrives as a string or a number depending on the endpoint.
fn extern_code_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(de)? {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) if s.is_empty() => None,
        Some(JsonValue::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Note download response; fields sit beside the envelope, not in `result`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadBody {
    #[serde(default)]
    pub info: NoteInfo,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody<'a> {
    pub user_id: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTagBody<'a> {
    pub tag_guid: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTagBody<'a> {
    pub tag_guid: &'a str,
    pub parent_tag_guid: Option<&'a str>,
}

/// Result of a resource upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadBody {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}
