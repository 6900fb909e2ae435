//! Top-level views of the front-end.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Screen currently shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    #[default]
    Landing,
    Dashboard,
    Builder,
}

impl fmt::Display for AppView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppView::Landing => write!(f, "landing"),
            AppView::Dashboard => write!(f, "dashboard"),
            AppView::Builder => write!(f, "builder"),
        }
    }
}
