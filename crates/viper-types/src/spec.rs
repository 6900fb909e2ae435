//! Generated bot specification types.
//!
//! `GeneratedSpecification` is the wire shape the completion service is asked
//! to return. It is untrusted: every field is optional on decode and
//! [`GeneratedSpecification::validate`] turns it into a usable
//! [`BotSpecification`] or a [`ValidationError`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fields the completion service must always return.
pub const REQUIRED_FIELDS: [&str; 3] = ["botName", "description", "commands"];

/// Raw structured output from the completion service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSpecification {
    /// A professional bot name.
    #[serde(default)]
    pub bot_name: Option<String>,
    /// A technical and concise description.
    #[serde(default)]
    pub description: Option<String>,
    /// Essential slash commands. Five are requested; any count validates.
    #[serde(default)]
    pub commands: Option<Vec<String>>,
    /// Suggested high-tier features.
    #[serde(default)]
    pub features: Option<Vec<String>>,
}

impl GeneratedSpecification {
    /// Check required fields and normalize the lists.
    ///
    /// Blank `botName`/`description` count as missing. Command and feature
    /// entries are trimmed and blank ones dropped; an empty command list is
    /// still a valid specification.
    pub fn validate(self) -> Result<BotSpecification, ValidationError> {
        let name = non_blank(self.bot_name).ok_or(ValidationError::MissingRequiredField("botName"))?;
        let description = non_blank(self.description)
            .ok_or(ValidationError::MissingRequiredField("description"))?;
        let commands = self
            .commands
            .ok_or(ValidationError::MissingRequiredField("commands"))?;

        Ok(BotSpecification {
            name,
            description,
            commands: clean_list(commands),
            features: clean_list(self.features.unwrap_or_default()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A validated bot specification, owned by one builder session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSpecification {
    pub name: String,
    pub description: String,
    pub commands: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// JSON schema sent to the completion service for structured output.
///
/// Generated from [`GeneratedSpecification`] and tightened for the wire:
/// the meta keys are removed, nullable property types collapse to their
/// non-null type, the required list is forced to [`REQUIRED_FIELDS`], and
/// additional properties are rejected.
pub fn specification_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(GeneratedSpecification);
    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({}));

    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.insert("type".to_string(), serde_json::json!("object"));
        obj.insert("required".to_string(), serde_json::json!(REQUIRED_FIELDS));
        obj.insert("additionalProperties".to_string(), serde_json::json!(false));

        if let Some(props) = obj.get_mut("properties").and_then(|p| p.as_object_mut()) {
            for prop in props.values_mut() {
                strip_null_type(prop);
            }
        }
    }

    value
}

/// Collapse `"type": ["string", "null"]` into `"type": "string"`.
fn strip_null_type(prop: &mut serde_json::Value) {
    let Some(obj) = prop.as_object_mut() else {
        return;
    };
    if let Some(serde_json::Value::Array(types)) = obj.get("type") {
        let non_null: Vec<serde_json::Value> = types
            .iter()
            .filter(|t| t.as_str() != Some("null"))
            .cloned()
            .collect();
        if non_null.len() == 1 {
            obj.insert("type".to_string(), non_null[0].clone());
        }
    }
    obj.remove("default");
}
