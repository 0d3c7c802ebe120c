use std::fs::File;
use std::path::Path;

use miette::{Context, IntoDiagnostic, Result};
use tracing::info;
use ygg_bin::{pack_directory, PackOptions};

/// Pack the directory at `path` into `<path>_new.bin`.
pub fn handle(path: &Path) -> Result<()> {
    let mut target = path.as_os_str().to_owned();
    target.push("_new.bin");

    info!("packing {} into {}", path.display(), Path::new(&target).display());

    let out = File::create(&target)
        .into_diagnostic()
        .context(format!("creating {}", Path::new(&target).display()))?;

    pack_directory(path, out, &PackOptions::default())?;
    Ok(())
}
