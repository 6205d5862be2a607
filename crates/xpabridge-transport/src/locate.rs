//! Executable lookup.

use std::path::{Path, PathBuf};

/// Looks for `program` in `dir`, then on `PATH` if `search_path` is set.
///
/// Returns the first existing file. On Windows `.exe` is appended.
pub fn find_program(
    dir: Option<&Path>,
    search_path: bool,
    program: &str,
) -> Option<PathBuf> {
    let file = if cfg!(windows) {
        format!("{program}.exe")
    } else {
        program.to_string()
    };
    let mut dirs: Vec<PathBuf> = dir.map(Path::to_path_buf).into_iter().collect();
    if search_path {
        if let Some(path) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path));
        }
    }
    dirs.into_iter()
        .map(|d| d.join(&file))
        .find(|candidate| candidate.is_file())
}
