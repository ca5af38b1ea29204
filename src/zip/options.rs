//! Options controlling how an archive is opened.

use super::locator::DEFAULT_TAIL_WINDOW;

/// Options for [`ZipReader`](super::ZipReader).
///
/// # Example
///
/// ```no_run
/// use zipview::{ReaderOptions, ZipReader};
///
/// let options = ReaderOptions::new().sanitize_paths(true).limit(100);
/// let zip = ZipReader::open_with_options("archive.zip", &options)?;
/// # Ok::<(), zipview::ZipError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Read at most this many central directory records.
    pub limit: Option<usize>,
    /// Normalize member paths, see [`sanitize`](super::sanitize).
    pub sanitize_paths: bool,
    /// Number of bytes at the end of the file searched for the trailer.
    pub tail_window: u64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            limit: None,
            sanitize_paths: false,
            tail_window: DEFAULT_TAIL_WINDOW,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sanitize_paths(mut self, enabled: bool) -> Self {
        self.sanitize_paths = enabled;
        self
    }

    pub fn tail_window(mut self, bytes: u64) -> Self {
        self.tail_window = bytes;
        self
    }
}
