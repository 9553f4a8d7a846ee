//! Intermediate files that live only for the duration of one conversion.
//!
//! A [`TempArtifact`] owns its path: the file is removed when the artifact is
//! dropped, whichever way the owning scope is left. Names embed the request id
//! plus a random component, so concurrent conversions sharing a directory never
//! collide.

use std::fs;
use std::io;
use std::path::Path;

use tempfile::{Builder, TempPath};
use uuid::Uuid;

pub struct TempArtifact {
    // None once persisted
    path: Option<TempPath>,
    stage: &'static str,
}

impl TempArtifact {
    /// Create an empty intermediate file in `dir` for pipeline stage `stage`.
    pub fn create(dir: &Path, request_id: Uuid, stage: &'static str, extension: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let prefix = format!("{stage}-{}-", request_id.simple());
        let suffix = format!(".{extension}");
        let path = Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(dir)?
            .into_temp_path();

        log::debug!("created temp artifact {} ({stage})", path.display());
        Ok(Self { path: Some(path), stage })
    }

    /// Create a staging file beside `target`, to be renamed onto it once the
    /// content is complete.
    pub fn staging(target: &Path, request_id: Uuid) -> io::Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        fs::create_dir_all(dir)?;
        let path = Builder::new()
            .prefix(&format!(".{name}.{}-", request_id.simple()))
            .suffix(".partial")
            .tempfile_in(dir)?
            .into_temp_path();

        log::debug!("staging {} via {}", target.display(), path.display());
        Ok(Self {
            path: Some(path),
            stage: "staging",
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Move the artifact onto `target`, which then outlives the request.
    pub fn persist(mut self, target: &Path) -> io::Result<()> {
        let path = self
            .path
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "temp artifact already persisted"))?;
        // on error the returned TempPath is dropped, removing the staged file
        path.persist(target).map_err(|e| e.error)
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        // TempPath removes the file right after this runs
        if let Some(path) = &self.path {
            log::debug!("removing temp artifact {} ({})", path.display(), self.stage);
        }
    }
}

/// Write `data` to `target` through a staging artifact, so `target` only
/// appears once it is complete.
pub fn write_atomic(target: &Path, request_id: Uuid, data: &[u8]) -> io::Result<()> {
    let staged = TempArtifact::staging(target, request_id)?;
    fs::write(staged.path(), data)?;
    staged.persist(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let path = {
            let artifact = TempArtifact::create(dir.path(), id, "enhanced", "png").unwrap();
            fs::write(artifact.path(), b"data").unwrap();
            assert!(artifact.path().exists());
            assert_eq!(artifact.stage(), "enhanced");
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn artifact_is_removed_when_scope_fails() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();

        let failing = || -> io::Result<()> {
            let artifact = TempArtifact::create(dir.path(), id, "enhanced", "png")?;
            fs::write(artifact.path(), b"partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "stage failed"))
        };
        assert!(failing().is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn names_are_unique_within_one_request() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let a = TempArtifact::create(dir.path(), id, "render", "png").unwrap();
        let b = TempArtifact::create(dir.path(), id, "render", "png").unwrap();
        assert_ne!(a.path(), b.path());

        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(&format!("render-{}-", id.simple())));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn write_atomic_leaves_only_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out.bin");
        write_atomic(&target, Uuid::new_v4(), b"payload").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"payload");
        let entries: Vec<_> = fs::read_dir(target.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn persisted_artifact_survives_drop() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("kept.txt");
        let staged = TempArtifact::staging(&target, Uuid::new_v4()).unwrap();
        fs::write(staged.path(), b"kept").unwrap();
        staged.persist(&target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"kept");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_persist_removes_the_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inner"), b"x").unwrap();

        let staged = TempArtifact::staging(&target, Uuid::new_v4()).unwrap();
        fs::write(staged.path(), b"data").unwrap();
        assert!(staged.persist(&target).is_err());

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("occupied")]);
    }
}
