//! Loading of Fortran restart files.
//!
//! Each tile is stored as one file per restart component, named
//! `[<label>.]<component>.tile<N>.nc` with `N` counting from 1. The model
//! time lives in a separate `[<label>.]coupler.res` text file.

use crate::comm::Communicator;
use crate::config::RestartOptions;
use crate::constants::{TILE_COUNT, TIME_DIM};
use crate::coupler::current_date_from_coupler_res;
use crate::dataset::Dataset;
use crate::distribute::broadcast_state;
use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use crate::metadata::{apply_restart_metadata, map_keys};
use crate::partitioner::{get_tile_index, ranks_per_tile, Partitioner};
use crate::properties::{restart_properties, restart_standard_names};
use crate::quantity::Quantity;
use crate::state::State;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Restart components every tile must have.
pub const RESTART_NAMES: [&str; 3] = ["fv_core.res", "fv_srf_wnd.res", "fv_tracer.res"];

/// Restart components loaded only when present.
pub const RESTART_OPTIONAL_NAMES: [&str; 2] = ["sfc_data", "phy_data"];

/// Name of the file holding the model time.
pub const COUPLER_RES_NAME: &str = "coupler.res";

/// Prefix `filename` with `label` and a dot.
///
/// An absent or empty label leaves the name unchanged.
///
/// ```
/// use fv3restart::restart::prepend_label;
///
/// assert_eq!(prepend_label("coupler.res", Some("20160801.001500")), "20160801.001500.coupler.res");
/// assert_eq!(prepend_label("coupler.res", Some("")), "coupler.res");
/// assert_eq!(prepend_label("coupler.res", None), "coupler.res");
/// ```
pub fn prepend_label(filename: &str, label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => format!("{label}.{filename}"),
        _ => filename.to_string(),
    }
}

/// Restart files to load for a zero-based `tile_index`.
///
/// The required components are always listed; optional components only when
/// `fs` reports them as existing files.
pub fn restart_filenames<F: FileSystem + ?Sized>(
    fs: &F,
    dirname: &Path,
    tile_index: usize,
    label: Option<&str>,
) -> Vec<PathBuf> {
    let suffix = format!(".tile{}.nc", tile_index + 1);
    let required = RESTART_NAMES.iter().map(|name| (name, true));
    let optional = RESTART_OPTIONAL_NAMES.iter().map(|name| (name, false));
    required
        .chain(optional)
        .map(|(name, required)| {
            let path = dirname.join(prepend_label(name, label) + &suffix);
            (path, required)
        })
        .filter(|(path, required)| *required || fs.is_file(path))
        .map(|(path, _)| path)
        .collect()
}

/// Path of the `coupler.res` file in `dirname`.
pub fn coupler_res_filename(dirname: &Path, label: Option<&str>) -> PathBuf {
    dirname.join(prepend_label(COUPLER_RES_NAME, label))
}

/// File suffix used for the restart files written by `rank`.
///
/// With one rank per tile the files are `.tile<N>.nc`; with more, each rank
/// writes `.tile<N>.nc.<count>` with a four-digit, zero-based count within
/// the tile.
///
/// # Errors
///
/// Returns [`Error::InvalidRankCount`] unless `total_ranks` is a multiple of 6.
pub fn get_rank_suffix(rank: usize, total_ranks: usize) -> Result<String> {
    let per_tile = ranks_per_tile(total_ranks)?;
    let tile = get_tile_index(rank, total_ranks)? + 1;
    if total_ranks > TILE_COUNT {
        Ok(format!(".tile{tile}.nc.{:04}", rank % per_tile))
    } else {
        Ok(format!(".tile{tile}.nc"))
    }
}

/// Convert the contents of one restart file into a partial state.
///
/// The first `Time` record is selected, Fortran names are mapped to standard
/// names and restart dims and units are applied. Variables without units
/// afterwards are dropped, as are names outside `only_names` when given.
pub fn load_partial_state_from_restart_file(
    dataset: Dataset,
    only_names: Option<&[String]>,
) -> Result<State> {
    let variables = dataset.select_first(TIME_DIM)?.into_variables();
    let variables = map_keys(variables, &restart_standard_names());
    let variables = apply_restart_metadata(variables, restart_properties())?;

    let mut state = State::new();
    for (name, array) in variables {
        if array.units().is_none() {
            continue;
        }
        if let Some(only) = only_names {
            if !only.iter().any(|n| *n == name) {
                continue;
            }
        }
        let quantity = Quantity::from_data_array(&name, array)?;
        state.insert(name, quantity);
    }
    Ok(state)
}

/// Read the full state of one tile, as the tile master does.
///
/// The time is taken from `coupler.res` when that file exists.
///
/// # Errors
///
/// A missing required restart file yields [`Error::Io`] with kind
/// `NotFound`.
pub fn load_tile_state<F: FileSystem + ?Sized>(
    fs: &F,
    dirname: &Path,
    tile_index: usize,
    options: &RestartOptions,
) -> Result<State> {
    let label = options.label();
    let mut state = State::new();
    for path in restart_filenames(fs, dirname, tile_index, label) {
        let dataset = fs.open_dataset(&path)?;
        let partial = load_partial_state_from_restart_file(dataset, options.only_names())?;
        debug!(file = %path.display(), fields = partial.len(), "loaded restart file");
        state.extend(partial);
    }

    let coupler_res = coupler_res_filename(dirname, label);
    if fs.is_file(&coupler_res) {
        let text = fs.read_to_string(&coupler_res)?;
        state.set_time(Some(current_date_from_coupler_res(&text)?));
    }
    Ok(state)
}

/// Load restart files and distribute them to every rank.
///
/// Collective over `comm`. The master rank of each tile reads that tile's
/// files through `fs`; every rank returns its tile's state, carrying the
/// time from `coupler.res` when present.
///
/// # Errors
///
/// A tile master that fails to load returns its error without taking part
/// in the distribution; its tile peers then fail in the first collective.
pub fn open_restart<C, P, F>(
    dirname: impl AsRef<Path>,
    partitioner: &P,
    comm: &C,
    fs: &F,
    options: &RestartOptions,
) -> Result<State>
where
    C: Communicator,
    P: Partitioner,
    F: FileSystem + ?Sized,
{
    let dirname = dirname.as_ref();
    let rank = comm.rank();
    if comm.size() != partitioner.total_ranks() {
        return Err(Error::Comm(format!(
            "partitioner expects {} ranks, communicator has {}",
            partitioner.total_ranks(),
            comm.size()
        )));
    }
    let tile_index = partitioner.tile_index(rank);
    let state = if rank == partitioner.tile_master_rank(rank) {
        let state = load_tile_state(fs, dirname, tile_index, options)?;
        info!(
            rank,
            tile = tile_index,
            fields = state.len(),
            dir = %dirname.display(),
            "loaded restart tile"
        );
        state
    } else {
        State::new()
    };
    broadcast_state(state, partitioner, comm)
}
