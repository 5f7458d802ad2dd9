use serde::Deserialize;
use serde_json::Value;

use crate::error::MalformedRecord;

/// One JSONL line of the chat-style annotation export.
#[derive(Debug, Deserialize)]
pub struct AnnotationRecord {
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(default)]
    pub content: Value,
}

/// Image url and class label pulled out of a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub url: String,
    pub label: String,
}

/// Parse a JSONL line and pull out the user's image url and the assistant's label.
///
/// The user message is the first one with role `user` whose content is a list;
/// its first element must carry `image_url.url`. The label is the first
/// `assistant` message's text, trimmed.
pub fn extract_entry(line: &str) -> Result<Entry, MalformedRecord> {
    let record: AnnotationRecord = serde_json::from_str(line)?;

    let parts = record
        .messages
        .iter()
        .filter(|m| m.role == "user")
        .find_map(|m| m.content.as_array())
        .ok_or(MalformedRecord::MissingUserImage)?;

    let url = parts
        .first()
        .and_then(|part| part.get("image_url"))
        .and_then(|image_url| image_url.get("url"))
        .and_then(Value::as_str)
        .ok_or(MalformedRecord::MissingImageUrl)?;

    let assistant = record
        .messages
        .iter()
        .find(|m| m.role == "assistant")
        .ok_or(MalformedRecord::MissingAssistant)?;
    let label = assistant
        .content
        .as_str()
        .ok_or(MalformedRecord::LabelNotText)?;

    Ok(Entry {
        url: url.to_string(),
        label: label.trim().to_string(),
    })
}
