//! Persistence media for the flat-text record files.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::record::Kind;

/// Where the encoded collections live.
pub trait Medium: fmt::Debug {
    /// Read the text for one collection. `None` means nothing stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium exists but cannot be read.
    fn read(&self, kind: Kind) -> Result<Option<String>>;

    /// Replace the text for one collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn write(&mut self, kind: Kind, contents: &str) -> Result<()>;

    /// Human-readable location, for status output.
    fn location(&self) -> String;
}

/// One text file per collection inside a data directory.
#[derive(Debug, Clone)]
pub struct DirMedium {
    dir: PathBuf,
    backup: bool,
}

impl DirMedium {
    /// Use `dir`, creating it on first write. With `backup`, the previous file
    /// is copied to `<name>.txt.bak` before being replaced.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, backup: bool) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            backup,
        }
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding one collection.
    #[must_use]
    pub fn path_for(&self, kind: Kind) -> PathBuf {
        self.dir.join(format!("{}.txt", kind.file_stem()))
    }
}

impl Medium for DirMedium {
    fn read(&self, kind: Kind) -> Result<Option<String>> {
        let path = self.path_for(kind);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!("Read {}", path.display());
                Ok(Some(text))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, kind: Kind, contents: &str) -> Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|source| Error::DirectoryCreate {
                path: self.dir.clone(),
                source,
            })?;
        }

        let path = self.path_for(kind);
        if self.backup && path.exists() {
            std::fs::copy(&path, path.with_extension("txt.bak"))?;
        }
        std::fs::write(&path, contents)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// In-process medium.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    files: BTreeMap<Kind, String>,
}

impl MemoryMedium {
    /// An empty medium.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one collection's text.
    #[must_use]
    pub fn with(mut self, kind: Kind, contents: impl Into<String>) -> Self {
        self.files.insert(kind, contents.into());
        self
    }
}

impl Medium for MemoryMedium {
    fn read(&self, kind: Kind) -> Result<Option<String>> {
        Ok(self.files.get(&kind).cloned())
    }

    fn write(&mut self, kind: Kind, contents: &str) -> Result<()> {
        self.files.insert(kind, contents.to_string());
        Ok(())
    }

    fn location(&self) -> String {
        ":memory:".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_medium_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let medium = DirMedium::new(dir.path(), false);
        assert!(medium.read(Kind::Kerbal).unwrap().is_none());
    }

    #[test]
    fn test_dir_medium_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = DirMedium::new(dir.path().join("nested"), false);
        medium.write(Kind::Mission, "line\n").unwrap();
        assert_eq!(medium.read(Kind::Mission).unwrap().as_deref(), Some("line\n"));
        assert!(medium.path_for(Kind::Mission).ends_with("missions.txt"));
    }

    #[test]
    fn test_dir_medium_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = DirMedium::new(dir.path(), true);
        medium.write(Kind::Vessel, "old\n").unwrap();
        medium.write(Kind::Vessel, "new\n").unwrap();

        let backup = std::fs::read_to_string(dir.path().join("vessels.txt.bak")).unwrap();
        assert_eq!(backup, "old\n");
        assert_eq!(medium.read(Kind::Vessel).unwrap().as_deref(), Some("new\n"));
    }

    #[test]
    fn test_dir_medium_write_fails_under_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut medium = DirMedium::new(blocker.join("data"), false);
        let err = medium.write(Kind::Kerbal, "x").unwrap_err();
        assert!(matches!(err, Error::DirectoryCreate { .. }));
    }

    #[test]
    fn test_memory_medium() {
        let mut medium = MemoryMedium::new().with(Kind::Design, "seed");
        assert_eq!(medium.read(Kind::Design).unwrap().as_deref(), Some("seed"));
        assert!(medium.read(Kind::Kerbal).unwrap().is_none());
        medium.write(Kind::Kerbal, "k").unwrap();
        assert_eq!(medium.read(Kind::Kerbal).unwrap().as_deref(), Some("k"));
        assert_eq!(medium.location(), ":memory:");
    }
}
