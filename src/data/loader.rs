use std::path::Path;

use super::model::ArrayBundle;
use super::npy::{self, NpyArray, NpyError};
use crate::config::ChannelMap;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a source archive could not be turned into an [`ArrayBundle`].
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("{0}")]
    Read(#[from] NpyError),

    #[error("'{name}' array not found (archive holds: {})", .available.join(", "))]
    MissingArray { name: String, available: Vec<String> },

    #[error("unexpected data shape {shape:?} for '{name}': expected a 2-D array")]
    NotTwoDimensional { name: String, shape: Vec<usize> },

    #[error("unexpected data shape {shape:?} for '{name}': channel row {row} out of range")]
    MissingRow {
        name: String,
        shape: Vec<usize>,
        row: usize,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the time / voltage / current channels from an `.npz` archive.
///
/// Expected layout (as written by `numpy.savez(path, data=arr)`):
///
/// ```text
///   a.npz
///   └── data.npy      2-D, shape (>= 3, n)
///         row 0  time
///         row 1  voltage
///         row 2  current
/// ```
///
/// The member name and the row mapping come from the configuration.
pub fn load_bundle(
    path: &Path,
    array_name: &str,
    channels: &ChannelMap,
) -> Result<ArrayBundle, BundleError> {
    let mut archive = npy::open_npz(path)?;
    let array = match npy::read_npz_member(&mut archive, array_name)? {
        Some(array) => array,
        None => {
            return Err(BundleError::MissingArray {
                name: array_name.to_string(),
                available: npy::npz_member_names(&archive),
            })
        }
    };
    bundle_from_array(&array, array_name, channels)
}

/// Split a decoded 2-D array into its three channels.
pub fn bundle_from_array(
    array: &NpyArray,
    name: &str,
    channels: &ChannelMap,
) -> Result<ArrayBundle, BundleError> {
    if array.ndim() != 2 {
        return Err(BundleError::NotTwoDimensional {
            name: name.to_string(),
            shape: array.shape.clone(),
        });
    }
    let row = |r: usize| {
        array.row(r).ok_or_else(|| BundleError::MissingRow {
            name: name.to_string(),
            shape: array.shape.clone(),
            row: r,
        })
    };
    Ok(ArrayBundle {
        time: row(channels.time)?,
        voltage: row(channels.voltage)?,
        current: row(channels.current)?,
    })
}
