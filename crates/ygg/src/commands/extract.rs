use std::fs::File;
use std::path::Path;

use miette::{Context, IntoDiagnostic, Result};
use tracing::info;
use ygg_bin::BinArchive;

/// Extract `path` into `<path>.ex/`.
pub fn handle(path: &Path) -> Result<()> {
    let mut target = path.as_os_str().to_owned();
    target.push(".ex");

    let file = File::open(path)
        .into_diagnostic()
        .context(format!("opening {}", path.display()))?;

    let mut archive = BinArchive::new(file)?;
    info!(
        "extracting {} entries into {}",
        archive.len(),
        Path::new(&target).display()
    );

    archive.extract_to(Path::new(&target))?;
    Ok(())
}
