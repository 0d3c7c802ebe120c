pub mod extract;
pub mod pack;

use std::path::{Path, PathBuf};

use miette::{miette, Result};

/// Dispatch on the input path: an existing file is treated as an archive to extract, an existing
/// directory as a tree to pack.
pub fn run(path: &Path) -> Result<()> {
    let path = strip_trailing_separators(path);

    if path.is_file() {
        extract::handle(&path)
    } else if path.is_dir() {
        pack::handle(&path)
    } else {
        Err(miette!("{} is neither a file nor a directory", path.display()))
    }
}

/// Drop trailing path separators so `folder/` and `folder` name the same outputs.
fn strip_trailing_separators(path: &Path) -> PathBuf {
    let mut s = path.to_string_lossy().into_owned();
    while s.len() > 1 && (s.ends_with('/') || s.ends_with('\\')) {
        s.pop();
    }
    PathBuf::from(s)
}
