//! The model state mapping.

use crate::error::Result;
use crate::quantity::Quantity;
use chrono::NaiveDateTime;
use indexmap::IndexMap;

/// Model state: quantities keyed by standard name, plus the model time.
///
/// Insertion order is preserved, so every rank that receives a distributed
/// state sees its fields in the same order as the tile master.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    fields: IndexMap<String, Quantity>,
    time: Option<NaiveDateTime>,
}

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the previous value under that name.
    pub fn insert(&mut self, name: impl Into<String>, quantity: Quantity) -> Option<Quantity> {
        self.fields.insert(name.into(), quantity)
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&Quantity> {
        self.fields.get(name)
    }

    /// Remove a field, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Quantity> {
        self.fields.shift_remove(name)
    }

    /// Whether a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate over `(name, quantity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quantity)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields, not counting the time.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Model time, if known.
    pub fn time(&self) -> Option<NaiveDateTime> {
        self.time
    }

    /// Set the model time.
    pub fn set_time(&mut self, time: Option<NaiveDateTime>) {
        self.time = time;
    }

    /// Merge another state into this one. Fields in `other` win, and its time
    /// replaces ours only when set.
    pub fn extend(&mut self, other: State) {
        self.fields.extend(other.fields);
        if other.time.is_some() {
            self.time = other.time;
        }
    }

    /// Keep only the named fields.
    pub fn retain_names<S: AsRef<str>>(&mut self, names: &[S]) {
        self.fields
            .retain(|name, _| names.iter().any(|n| n.as_ref() == name.as_str()));
    }

    /// Copy of this state with `n_halo` ghost points stripped from every
    /// horizontal dimension.
    pub fn without_ghost_cells(&self, n_halo: usize) -> Result<State> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (name, quantity) in &self.fields {
            fields.insert(name.clone(), quantity.without_halo(n_halo)?);
        }
        Ok(State {
            fields,
            time: self.time,
        })
    }

    /// Consume the state, yielding its fields.
    pub fn into_fields(self) -> IndexMap<String, Quantity> {
        self.fields
    }
}

impl FromIterator<(String, Quantity)> for State {
    fn from_iter<T: IntoIterator<Item = (String, Quantity)>>(iter: T) -> Self {
        State {
            fields: iter.into_iter().collect(),
            time: None,
        }
    }
}
