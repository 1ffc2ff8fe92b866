//! Static variable property tables.
//!
//! Four JSON tables ship with the crate:
//!
//! | Table | Keyed by | Describes |
//! |-------|----------|-----------|
//! | `restart_properties.json` | standard name | Fortran restart name, file, units, dims |
//! | `dynamics_properties.json` | standard name | dynamical core fields |
//! | `physics_properties.json` | standard name | physics/surface fields |
//! | `tracer_properties.json` | standard name | tracer units and 1-based index |
//!
//! Tables from other model configurations can be loaded with
//! [`PropertyTable::from_json_str`].

use crate::error::Result;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const RESTART_PROPERTIES_JSON: &str = include_str!("../data/restart_properties.json");
const DYNAMICS_PROPERTIES_JSON: &str = include_str!("../data/dynamics_properties.json");
const PHYSICS_PROPERTIES_JSON: &str = include_str!("../data/physics_properties.json");
const TRACER_PROPERTIES_JSON: &str = include_str!("../data/tracer_properties.json");

/// Entries that can be indexed by standard name.
pub trait Named {
    /// Standard name of the entry.
    fn name(&self) -> &str;
}

/// How a variable appears in restart files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartProperties {
    /// Standard name
    pub name: String,
    /// Variable name inside the restart file
    pub restart_name: String,
    /// Restart component the variable is stored in, e.g. `fv_core.res`
    pub restart_file: String,
    /// Units string
    pub units: String,
    /// Standard names of the trailing dimensions
    pub dims: Vec<String>,
}

/// A model field as exposed by the running model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProperties {
    /// Standard name
    pub name: String,
    /// Fortran variable name
    pub fortran_name: String,
    /// Units string
    pub units: String,
    /// Standard names of the dimensions
    pub dims: Vec<String>,
}

/// Tracer metadata as reported by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerMetadata {
    /// Standard name
    pub name: String,
    /// Fortran tracer name
    pub fortran_name: String,
    /// Units string
    pub units: String,
    /// 1-based index in the model's tracer array
    pub i_tracer: usize,
}

impl Named for RestartProperties {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for FieldProperties {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for TracerMetadata {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A property table keyed by standard name, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTable<T> {
    entries: IndexMap<String, T>,
}

impl<T: Named + DeserializeOwned> PropertyTable<T> {
    /// Parse a JSON array of entries.
    ///
    /// A later entry with the same name replaces an earlier one.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let list: Vec<T> = serde_json::from_str(json)?;
        Ok(list.into_iter().collect())
    }
}

impl<T: Named> FromIterator<T> for PropertyTable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|entry| (entry.name().to_string(), entry))
            .collect();
        PropertyTable { entries }
    }
}

impl<T> PropertyTable<T> {
    /// Look up an entry by standard name.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    /// Whether the table has an entry for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Standard names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PropertyTable<RestartProperties> {
    /// Mapping from restart (Fortran) name to standard name.
    pub fn restart_standard_names(&self) -> IndexMap<String, String> {
        self.entries
            .values()
            .map(|p| (p.restart_name.clone(), p.name.clone()))
            .collect()
    }
}

fn bundled<T: Named + DeserializeOwned>(
    cell: &'static OnceLock<PropertyTable<T>>,
    json: &'static str,
) -> &'static PropertyTable<T> {
    cell.get_or_init(|| {
        PropertyTable::from_json_str(json).expect("bundled property table is valid JSON")
    })
}

/// Bundled restart property table.
pub fn restart_properties() -> &'static PropertyTable<RestartProperties> {
    static TABLE: OnceLock<PropertyTable<RestartProperties>> = OnceLock::new();
    bundled(&TABLE, RESTART_PROPERTIES_JSON)
}

/// Bundled dynamics property table.
pub fn dynamics_properties() -> &'static PropertyTable<FieldProperties> {
    static TABLE: OnceLock<PropertyTable<FieldProperties>> = OnceLock::new();
    bundled(&TABLE, DYNAMICS_PROPERTIES_JSON)
}

/// Bundled physics property table.
pub fn physics_properties() -> &'static PropertyTable<FieldProperties> {
    static TABLE: OnceLock<PropertyTable<FieldProperties>> = OnceLock::new();
    bundled(&TABLE, PHYSICS_PROPERTIES_JSON)
}

/// Bundled tracer table.
pub fn tracer_properties() -> &'static PropertyTable<TracerMetadata> {
    static TABLE: OnceLock<PropertyTable<TracerMetadata>> = OnceLock::new();
    bundled(&TABLE, TRACER_PROPERTIES_JSON)
}

/// Mapping from restart (Fortran) name to standard name, from the bundled table.
pub fn restart_standard_names() -> IndexMap<String, String> {
    restart_properties().restart_standard_names()
}
