use crate::bail_error;
use crate::transaction::TransactionId;
use anyhow::Result;
use std::path::Path;

/// Create the directory and all parents, if missing.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if dir.is_dir() {
            return Ok(());
        }
        anyhow::bail!("Path '{}' exists and is not a directory", dir.display());
    }
    match std::fs::create_dir_all(dir) {
        Ok(_) => Ok(()),
        Err(e) => anyhow::bail!("Failed to create directory '{}' because '{}'", dir.display(), e),
    }
}

/// Read the whole file into memory.
pub fn read_file_bytes<P: AsRef<Path>>(path: P, tid: &TransactionId) -> Result<Vec<u8>> {
    let pth = path.as_ref();
    match std::fs::read(pth) {
        Ok(b) => Ok(b),
        Err(e) => bail_error!(tid=tid, path=%pth.display(), error=%e, "Unable to read file"),
    }
}
