//! Model-facing query interface and the checks run against it.
//!
//! [`ModelInterface`] is what getter tests drive: initialize the model, ask
//! for named fields, ask for tracer metadata. [`RestartModel`] answers those
//! queries from restart files, so the same checks can run without a Fortran
//! model in the process.
//!
//! The `check_*` functions return [`Error::Check`] describing the first
//! violation, so tests can `?` or `unwrap` them.

use crate::comm::Communicator;
use crate::config::RestartOptions;
use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use crate::partitioner::Partitioner;
use crate::properties::{tracer_properties, TracerMetadata};
use crate::restart::open_restart;
use crate::state::State;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Queries a running model answers.
pub trait ModelInterface {
    /// Prepare the model. Collective when the model is distributed.
    fn initialize(&mut self) -> Result<()>;

    /// Fields with the given standard names, plus the model time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownName`] for a name the model does not carry.
    fn get_state(&self, names: &[&str]) -> Result<State>;

    /// Metadata of every tracer the model carries, keyed by standard name.
    fn get_tracer_metadata(&self) -> Result<IndexMap<String, TracerMetadata>>;
}

/// A [`ModelInterface`] backed by restart files.
///
/// [`initialize`](ModelInterface::initialize) runs
/// [`open_restart`](crate::restart::open_restart) over the held communicator;
/// queries afterwards are local.
pub struct RestartModel<'fs, C, P, F: ?Sized> {
    dirname: PathBuf,
    comm: C,
    partitioner: P,
    fs: &'fs F,
    options: RestartOptions,
    state: Option<State>,
}

impl<'fs, C, P, F> RestartModel<'fs, C, P, F>
where
    C: Communicator,
    P: Partitioner,
    F: FileSystem + ?Sized,
{
    /// Model reading restart files from `dirname` on `fs`.
    pub fn new(dirname: impl Into<PathBuf>, comm: C, partitioner: P, fs: &'fs F) -> Self {
        RestartModel {
            dirname: dirname.into(),
            comm,
            partitioner,
            fs,
            options: RestartOptions::default(),
            state: None,
        }
    }

    /// Use `options` when loading.
    pub fn with_options(mut self, options: RestartOptions) -> Self {
        self.options = options;
        self
    }

    /// The communicator the model was built with.
    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Full loaded state, if initialized.
    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    fn loaded(&self) -> Result<&State> {
        self.state.as_ref().ok_or(Error::NotInitialized)
    }
}

impl<'fs, C, P, F> ModelInterface for RestartModel<'fs, C, P, F>
where
    C: Communicator,
    P: Partitioner,
    F: FileSystem + ?Sized,
{
    fn initialize(&mut self) -> Result<()> {
        let state = open_restart(
            &self.dirname,
            &self.partitioner,
            &self.comm,
            self.fs,
            &self.options,
        )?;
        info!(
            rank = self.comm.rank(),
            fields = state.len(),
            "restart model initialized"
        );
        self.state = Some(state);
        Ok(())
    }

    fn get_state(&self, names: &[&str]) -> Result<State> {
        let loaded = self.loaded()?;
        let mut state = State::new();
        for &name in names {
            let quantity = loaded
                .get(name)
                .ok_or_else(|| Error::UnknownName(name.to_string()))?;
            state.insert(name, quantity.clone());
        }
        state.set_time(loaded.time());
        Ok(state)
    }

    fn get_tracer_metadata(&self) -> Result<IndexMap<String, TracerMetadata>> {
        self.loaded()?;
        Ok(tracer_properties()
            .iter()
            .map(|(name, entry)| (name.to_string(), entry.clone()))
            .collect())
    }
}

/// Check that `name` is present with exactly `units`.
pub fn check_units(state: &State, name: &str, units: &str) -> Result<()> {
    let quantity = state
        .get(name)
        .ok_or_else(|| Error::Check(format!("{name} is missing")))?;
    if quantity.units() != units {
        return Err(Error::Check(format!(
            "{name} has units {:?}, expected {units:?}",
            quantity.units()
        )));
    }
    Ok(())
}

/// Check that `state` holds every name in `names` and nothing else.
pub fn check_exact_names<S: AsRef<str>>(state: &State, names: &[S]) -> Result<()> {
    let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
    if let Some(missing) = wanted.iter().find(|n| !state.contains(n)) {
        return Err(Error::Check(format!("{missing} is missing")));
    }
    if let Some(extra) = state.names().find(|n| !wanted.contains(n)) {
        return Err(Error::Check(format!("{extra} was not requested")));
    }
    if state.len() != names.len() {
        return Err(Error::Check(format!(
            "requested {} names, got {} fields",
            names.len(),
            state.len()
        )));
    }
    Ok(())
}

/// Check that every value of `name` lies strictly between `min` and `max`.
pub fn check_value_range(state: &State, name: &str, min: f64, max: f64) -> Result<()> {
    let quantity = state
        .get(name)
        .ok_or_else(|| Error::Check(format!("{name} is missing")))?;
    if let Some(bad) = quantity.data().iter().find(|&&v| !(v > min && v < max)) {
        return Err(Error::Check(format!(
            "{name} has value {bad} outside ({min}, {max})"
        )));
    }
    Ok(())
}

/// Check that tracer indices are `1..=n` with no duplicates and `n > 0`.
pub fn check_tracer_indices(tracers: &IndexMap<String, TracerMetadata>) -> Result<()> {
    if tracers.is_empty() {
        return Err(Error::Check("no tracers reported".to_string()));
    }
    let mut indices: Vec<usize> = tracers.values().map(|t| t.i_tracer).collect();
    indices.sort_unstable();
    for (expected, &index) in (1..).zip(&indices) {
        if index != expected {
            return Err(Error::Check(format!(
                "tracer indices {indices:?} are not 1..={}",
                indices.len()
            )));
        }
    }
    Ok(())
}

/// Check that every tracer entry is keyed by its own name and names its
/// Fortran counterpart.
pub fn check_tracer_metadata_keys(tracers: &IndexMap<String, TracerMetadata>) -> Result<()> {
    for (key, entry) in tracers {
        if entry.name != *key {
            return Err(Error::Check(format!(
                "tracer keyed {key} is named {}",
                entry.name
            )));
        }
        if entry.fortran_name.is_empty() {
            return Err(Error::Check(format!("tracer {key} has no fortran_name")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use ndarray::{ArrayD, IxDyn};

    fn tracer(name: &str, i_tracer: usize) -> (String, TracerMetadata) {
        (
            name.to_string(),
            TracerMetadata {
                name: name.to_string(),
                fortran_name: name.to_uppercase(),
                units: "kg/kg".to_string(),
                i_tracer,
            },
        )
    }

    fn temperature_state(values: Vec<f64>) -> State {
        let n = values.len();
        let mut state = State::new();
        let data = ArrayD::from_shape_vec(IxDyn(&[n]), values).unwrap();
        state.insert(
            "air_temperature",
            Quantity::new(data, ["x"], "degK").unwrap(),
        );
        state
    }

    #[test]
    fn bundled_tracers_pass_checks() {
        let tracers: IndexMap<String, TracerMetadata> = tracer_properties()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        check_tracer_indices(&tracers).unwrap();
        check_tracer_metadata_keys(&tracers).unwrap();
    }

    #[test]
    fn tracer_index_gaps_and_duplicates_fail() {
        assert!(matches!(
            check_tracer_indices(&IndexMap::new()),
            Err(Error::Check(_))
        ));
        let zero_based: IndexMap<_, _> = [tracer("a", 0), tracer("b", 1)].into_iter().collect();
        assert!(check_tracer_indices(&zero_based).is_err());
        let duplicate: IndexMap<_, _> = [tracer("a", 1), tracer("b", 1)].into_iter().collect();
        assert!(check_tracer_indices(&duplicate).is_err());
        let gap: IndexMap<_, _> = [tracer("a", 1), tracer("b", 3)].into_iter().collect();
        assert!(check_tracer_indices(&gap).is_err());
        let shuffled: IndexMap<_, _> = [tracer("a", 2), tracer("b", 1)].into_iter().collect();
        check_tracer_indices(&shuffled).unwrap();
    }

    #[test]
    fn mismatched_tracer_key_fails() {
        let mut tracers: IndexMap<_, _> = [tracer("a", 1)].into_iter().collect();
        tracers.insert("b".to_string(), tracer("c", 2).1);
        assert!(matches!(check_tracer_metadata_keys(&tracers), Err(Error::Check(_))));
    }

    #[test]
    fn value_range_is_exclusive() {
        let state = temperature_state(vec![200.0, 300.0]);
        check_value_range(&state, "air_temperature", 150.0, 400.0).unwrap();
        assert!(check_value_range(&state, "air_temperature", 200.0, 400.0).is_err());
        assert!(check_value_range(&state, "surface_temperature", 150.0, 400.0).is_err());
        let state = temperature_state(vec![f64::NAN]);
        assert!(check_value_range(&state, "air_temperature", 150.0, 400.0).is_err());
    }

    #[test]
    fn units_and_names() {
        let state = temperature_state(vec![280.0]);
        check_units(&state, "air_temperature", "degK").unwrap();
        assert!(check_units(&state, "air_temperature", "K").is_err());
        check_exact_names(&state, &["air_temperature"]).unwrap();
        assert!(check_exact_names(&state, &["air_temperature", "x_wind"]).is_err());
        assert!(check_exact_names::<&str>(&state, &[]).is_err());
    }
}
