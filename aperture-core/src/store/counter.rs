//! Persistent sequential id allocation for ingested annotations.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{ApertureError, Result};

/// Allocates the sequential ids behind `annotation<N>` keys.
///
/// The counter file holds the next unallocated id as a plain JSON
/// integer. The in-memory counter and the file rewrite happen under
/// one lock, and the file is replaced via write-to-temp-then-rename,
/// so concurrent ingestion requests can neither observe the same id
/// nor tear the file.
#[derive(Debug)]
pub struct IdAllocator {
    next: Mutex<u64>,
    path: PathBuf,
}

impl IdAllocator {
    /// Load the allocator from its counter file. A missing file means
    /// a fresh database and starts at id 1; an unparsable file fails
    /// closed so ids are never guessed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let next = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<u64>(content.trim()).map_err(|e| {
                ApertureError::CounterCorrupt(format!(
                    "{}: {e}",
                    path.display()
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 1,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            next: Mutex::new(next),
            path,
        })
    }

    /// Allocate the next id, durably advancing the counter file
    /// before the id is handed out.
    pub fn allocate(&self) -> Result<u64> {
        let mut next = self.next.lock().expect("id allocator lock poisoned");
        let id = *next;
        self.persist(id + 1)?;
        *next = id + 1;
        Ok(id)
    }

    /// Peek at the next id without allocating (diagnostics only).
    pub fn peek(&self) -> u64 {
        *self.next.lock().expect("id allocator lock poisoned")
    }

    fn persist(&self, value: u64) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| std::path::Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string(&value).expect("u64 serializes").as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| ApertureError::Storage(format!("counter rename failed: {e}")))?;
        Ok(())
    }
}
