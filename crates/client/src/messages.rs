//! Typed request and response bodies for the annotation backend.
//!
//! The backend answers every endpoint with a JSON object; only the fields
//! named here are read and anything else is ignored. Identifiers and
//! timestamps may arrive as JSON numbers or strings and are normalised to
//! strings.

use serde::{Deserialize, Deserializer, Serialize};

/// Query parameters of `submit_annotation_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitUpdate {
    pub annotation_id: String,
    /// Proposed replacement text.
    pub update: String,
    pub comment: String,
    /// The update being answered, when this submission is a rejection reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_id: Option<String>,
}

/// Fields returned by a successful `submit_annotation_update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedUpdate {
    pub update_id: String,
    pub access_code: String,
    pub submission_time: String,
}

/// Fields returned by a successful `accept_update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpdate {
    pub updated_str: String,
    pub old_annotation_nl: Option<String>,
}

/// One element of `get_relevant_updates`' `update_list`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelevantUpdate {
    #[serde(deserialize_with = "lenient_string")]
    pub update_id: String,
    /// Access code of the annotation's author.
    pub annotation_access_code: String,
    /// Access code of the update's proposer.
    pub access_code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub submission_time: String,
    pub update_str: String,
    pub comment_str: String,
}

// ---- raw wire shapes ----

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub update_id: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub submission_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AcceptBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub updated_str: Option<String>,
    #[serde(default)]
    pub old_annotation_nl: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateStatusBody {
    #[serde(default)]
    pub update_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RelevantUpdatesBody {
    #[serde(default)]
    pub update_list: Vec<RelevantUpdate>,
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    value_to_string(value).ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(serde_json::Value::deserialize(deserializer)?))
}
