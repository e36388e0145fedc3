use std::path::Path;

use anyhow::{Context, Result};
use retreat_core::sync::WriteOrigin;
use retreat_core::workspace::Workspace;

/// Restore records from a backup. The whole file is validated before any
/// record is written; imported records are mirrored like ordinary saves.
pub fn run(workspace: &Workspace, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Could not read {}", file.display()))?;

    let imported = workspace.store.import(&content)?;

    if imported.is_empty() {
        println!("Nothing to import: no recognized records in the file.");
        return Ok(());
    }

    for key in &imported {
        if let (Some(mirror), Some(value)) = (&workspace.mirror, workspace.store.load_raw(*key)) {
            mirror.after_local_save(*key, &value, WriteOrigin::Local);
        }
        println!("   {}", key.name());
    }
    println!("Imported {} record(s).", imported.len());

    Ok(())
}
