//! Atomic file publication: write to `<target>.tmp.<pid>`, fsync, rename over the target.
//!
//! Readers of `target` see either the previous complete file or the new complete
//! file, never a partial write. Multi-file publication is not atomic as a whole;
//! callers order their renames instead.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::CoreResult;

/// Staging path used for `target` by this process.
pub fn tmp_path_for(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".tmp.{}", std::process::id()));
    target.with_file_name(name)
}

/// Stage `bytes` next to `target` and rename it into place.
pub fn atomic_write_bytes(target: &Path, bytes: &[u8]) -> CoreResult<()> {
    atomic_write_with(target, |file| {
        file.write_all(bytes)?;
        Ok(())
    })
}

/// Stage a file produced by `fill` next to `target` and rename it into place.
///
/// On any failure the staging file is removed and `target` is left untouched.
pub fn atomic_write_with<F>(target: &Path, fill: F) -> CoreResult<()>
where
    F: FnOnce(&mut File) -> CoreResult<()>,
{
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path_for(target);
    let staged = (|| -> CoreResult<()> {
        let mut file = File::create(&tmp)?;
        fill(&mut file)?;
        file.sync_all()?;
        Ok(())
    })();
    if let Err(e) = staged {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_target_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("a.json");
        atomic_write_bytes(&target, b"one").unwrap();
        atomic_write_bytes(&target, b"two").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "two");
        assert!(!tmp_path_for(&target).exists());
    }

    #[test]
    fn failed_fill_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.csv");
        atomic_write_bytes(&target, b"old").unwrap();
        let res = atomic_write_with(&target, |f| {
            f.write_all(b"partial")?;
            Err(crate::error::CoreError::Contract("boom".into()))
        });
        assert!(res.is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert!(!tmp_path_for(&target).exists());
    }
}
