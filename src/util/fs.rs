//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::builder::errors::StepError;

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Remove every directory in `paths` concurrently and wait for all of them.
///
/// When more than one removal fails, the first failure in `paths` order is
/// reported and the others are dropped.
pub fn remove_dirs_concurrently(paths: &[PathBuf]) -> Result<(), StepError> {
    let results: Vec<(&PathBuf, io::Result<()>)> = paths
        .par_iter()
        .map(|path| (path, remove_dir_all_if_exists(path)))
        .collect();

    for (path, result) in results {
        result.map_err(|source| StepError::Filesystem {
            path: path.clone(),
            source,
        })?;
    }

    Ok(())
}
