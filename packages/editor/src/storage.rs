//! Where document text comes from and goes to.
//!
//! Sessions only see the [`DocumentSource`] and [`DocumentSink`] traits, so
//! hosts can back a document with files, buffers or anything else.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Text a document is opened from
pub trait DocumentSource {
    /// Name shown to the user (usually the file name)
    fn name(&self) -> &str;

    fn read(&mut self) -> io::Result<String>;
}

/// Destination a document is saved to
pub trait DocumentSink {
    /// Replace the stored text with `contents`
    fn write(&mut self, contents: &str) -> io::Result<()>;
}

/// A document stored in a file
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    name: String,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".saving");
        PathBuf::from(staging)
    }
}

impl DocumentSource for FileStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> io::Result<String> {
        let mut file = File::open(&self.path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(contents)
    }
}

impl DocumentSink for FileStorage {
    /// Writes next to the target and renames over it, so a failed write
    /// never leaves a truncated file behind
    fn write(&mut self, contents: &str) -> io::Result<()> {
        let staging = self.staging_path();

        let result = (|| {
            let mut file = File::create(&staging)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        })();

        match result.and_then(|_| fs::rename(&staging, &self.path)) {
            Ok(()) => Ok(()),
            Err(err) => {
                let _ = fs::remove_file(&staging);
                Err(err)
            }
        }
    }
}

/// A document held in memory, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    name: String,
    contents: String,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStorage {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
            fail_writes: false,
            writes: 0,
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Make every following write fail with a permission error
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl DocumentSource for MemoryStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> io::Result<String> {
        Ok(self.contents.clone())
    }
}

impl DocumentSink for MemoryStorage {
    fn write(&mut self, contents: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", self.name),
            ));
        }
        self.contents = contents.to_string();
        self.writes += 1;
        Ok(())
    }
}
