use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// Unique identifier for a bot record.
///
/// Freshly created ids are UUID v7 text (time-sortable), but any string is
/// accepted when loading a fleet so hand-edited or older slots still decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotId(pub String);

impl BotId {
    /// Create a new BotId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short node label used in listings (last 4 characters, like `VP-3f9a`).
    ///
    /// UUID v7 text starts with the timestamp, so the tail is the random part.
    pub fn node_label(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("VP-{tail}")
    }
}

impl Default for BotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Bot lifecycle states.
///
/// Records are always created `Online` and never transition afterward; the
/// other variants exist so stored fleets carrying them still decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    #[default]
    Online,
    Offline,
    Deploying,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotStatus::Online => write!(f, "online"),
            BotStatus::Offline => write!(f, "offline"),
            BotStatus::Deploying => write!(f, "deploying"),
        }
    }
}

/// Discord credentials collected by the builder.
///
/// Stored verbatim (plaintext) alongside the record. Nothing validates or
/// transmits them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotCredentials {
    pub token: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

impl BotCredentials {
    /// Mask a secret for display: keep the first 4 characters, hide the rest.
    pub fn mask(value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }
        let visible: String = value.chars().take(4).collect();
        format!("{visible}****")
    }
}

/// A completed "deployment" held in the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotRecord {
    pub id: BotId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub status: BotStatus,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<BotCredentials>,
    /// Creation time, stored as Unix epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}
