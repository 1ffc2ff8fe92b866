//! Restart loading options.
//!
//! Options can be built in code, deserialized from JSON, or read from the
//! environment:
//!
//! | Field | Variable | Format |
//! |-------|----------|--------|
//! | `label` | `FV3RESTART_LABEL` | prefix of every restart file name |
//! | `only_names` | `FV3RESTART_ONLY_NAMES` | comma-separated standard names |
//!
//! Unset or empty variables leave the field at its default.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable holding the restart file label.
pub const LABEL_VAR: &str = "FV3RESTART_LABEL";

/// Environment variable holding the comma-separated names to load.
pub const ONLY_NAMES_VAR: &str = "FV3RESTART_ONLY_NAMES";

/// Options for [`open_restart`](crate::restart::open_restart).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestartOptions {
    /// Prefix of the restart file names, e.g. `20160801.001500` for
    /// `20160801.001500.fv_core.res.tile1.nc`. `None` or empty means no prefix.
    pub label: Option<String>,
    /// Standard names to load. `None` loads every field that has restart
    /// metadata.
    pub only_names: Option<Vec<String>>,
}

impl RestartOptions {
    /// Set the file label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Restrict loading to the given standard names.
    pub fn with_only_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.only_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Parse options from a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read options from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Read options through a variable lookup function.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let label = lookup(LABEL_VAR).filter(|s| !s.is_empty());
        let only_names = lookup(ONLY_NAMES_VAR)
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|names| !names.is_empty());
        RestartOptions { label, only_names }
    }

    /// Label to prepend, with the empty label treated as none.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref().filter(|s| !s.is_empty())
    }

    /// Names to load, if restricted.
    pub fn only_names(&self) -> Option<&[String]> {
        self.only_names.as_deref()
    }
}
