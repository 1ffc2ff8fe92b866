//! Constants shared across loading, distribution and the model harness.

/// Rank that loads and broadcasts within each tile communicator.
pub const MASTER_RANK: usize = 0;

/// Number of faces on the cubed sphere.
pub const TILE_COUNT: usize = 6;

/// Name of the record dimension in restart files.
pub const TIME_DIM: &str = "Time";

/// Cell-centered x dimension
pub const X_DIM: &str = "x";
/// Cell-edge x dimension
pub const X_INTERFACE_DIM: &str = "x_interface";
/// Cell-centered y dimension
pub const Y_DIM: &str = "y";
/// Cell-edge y dimension
pub const Y_INTERFACE_DIM: &str = "y_interface";
/// Model level dimension
pub const Z_DIM: &str = "z";
/// Model level interface dimension
pub const Z_INTERFACE_DIM: &str = "z_interface";
/// Soil level dimension
pub const Z_SOIL_DIM: &str = "z_soil";

/// Dimensions that carry halo (ghost) points in model arrays.
pub const HORIZONTAL_DIMS: [&str; 4] = [X_DIM, X_INTERFACE_DIM, Y_DIM, Y_INTERFACE_DIM];
