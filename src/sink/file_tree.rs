//! File-tree sink: one payload file per record.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::{Sink, SinkError, SinkItem};

/// Extension given to every payload file.
pub const PAYLOAD_EXTENSION: &str = "pdf";

/// Writes each verified payload to `{dir}/{filename}.pdf`, overwriting.
///
/// Records sharing a filename land on the same file and the last write
/// wins. The written count is the number of distinct files, so it always
/// matches what is on disk.
#[derive(Debug)]
pub struct FileTreeSink {
    dir: PathBuf,
    written: HashSet<PathBuf>,
}

impl FileTreeSink {
    /// Creates `dir` (and parents) if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the directory cannot be created.
    #[instrument(skip(dir), fields(dir = %dir.display()))]
    pub async fn open(dir: &Path) -> Result<Self, SinkError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| SinkError::open(dir, e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: HashSet::new(),
        })
    }

    /// Returns the path a record named `filename` is written to.
    #[must_use]
    pub fn path_for(&self, filename: &str) -> PathBuf {
        let mut name = sanitize_filename(filename);
        let has_extension = Path::new(&name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PAYLOAD_EXTENSION));
        if !has_extension {
            name.push('.');
            name.push_str(PAYLOAD_EXTENSION);
        }
        self.dir.join(name)
    }
}

#[async_trait]
impl Sink for FileTreeSink {
    fn name(&self) -> &'static str {
        "pdf"
    }

    async fn write(&mut self, item: SinkItem) -> Result<(), SinkError> {
        let kind = item.kind();
        let SinkItem::Payload(unit) = item else {
            return Err(SinkError::UnsupportedInput {
                sink: self.name(),
                item: kind,
            });
        };
        let path = self.path_for(&unit.record.catalog.filename);
        tokio::fs::write(&path, &unit.payload)
            .await
            .map_err(|e| SinkError::io(&path, e))?;
        debug!(path = %path.display(), bytes = unit.payload.len(), "payload written");
        let sequence_id = unit.record.sequence_id();
        if !self.written.insert(path) {
            warn!(
                sequence_id,
                filename = %unit.record.catalog.filename,
                "filename already written in this run, previous payload replaced"
            );
        }
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<usize, SinkError> {
        Ok(self.written.len())
    }
}

/// Replaces path separators, reserved and control characters with `_`.
///
/// Names that would still resolve outside the directory (`.`, `..`) have
/// their dots replaced too.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    let escapes = Path::new(&sanitized).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        sanitized.replace('.', "_")
    } else {
        sanitized
    }
}
