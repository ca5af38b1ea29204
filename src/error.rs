//! Error types for ZIP archive reading.
//!
//! Every structural problem found while opening an archive or plugging a
//! member is a [`ZipError`]. Failures of the operating system (open, stat,
//! positional reads) are kept apart in [`ZipError::Io`] and carry a
//! [`ReadFault`] naming the file that failed, so the system error code is
//! never downgraded to an archive error.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::zip::CompressionMethod;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ZipError>;

/// An OS-level I/O failure together with the file it happened on.
///
/// Stored as the payload of an [`io::Error`]; the original error is kept as
/// the source so [`io::Error::raw_os_error`] stays reachable.
#[derive(Debug)]
pub struct ReadFault {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for ReadFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to read from {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for ReadFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl ReadFault {
    /// Wraps `source` into an [`io::Error`] of the same kind that names `path`.
    pub fn wrap(path: &Path, source: io::Error) -> io::Error {
        // already attributed by an inner layer
        if source
            .get_ref()
            .is_some_and(|inner| inner.is::<ReadFault>())
        {
            return source;
        }
        io::Error::new(
            source.kind(),
            ReadFault {
                path: path.to_path_buf(),
                source,
            },
        )
    }

    /// The OS error code of the underlying failure, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.raw_os_error()
    }
}

/// Errors produced while reading a ZIP archive.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ZipError {
    /// A 4-byte magic did not match at an expected structural boundary.
    #[error(
        "error reading {what} in {}: invalid signature; expected {expected:#010x} got {found:#010x}",
        archive.display()
    )]
    BadSignature {
        archive: PathBuf,
        what: &'static str,
        expected: u32,
        found: u32,
    },

    /// No end of central directory record was found in the scanned tail.
    #[error(
        "cannot find end of central directory signature in zip file {}",
        archive.display()
    )]
    MissingTrailer { archive: PathBuf },

    /// The archive spans several disks.
    #[error(
        "unsupported format in zip file {}: multiple disks encountered",
        archive.display()
    )]
    MultiDisk { archive: PathBuf },

    #[error(
        "invalid file index {index} in zip file {} ({count} files)",
        archive.display()
    )]
    InvalidIndex {
        archive: PathBuf,
        index: usize,
        count: usize,
    },

    #[error("file {member} not found in zip file {}", archive.display())]
    NotFound { archive: PathBuf, member: String },

    /// The member uses a compression method without a decoder.
    #[error(
        "unsupported compression method <{method}> for file {member} in the zip file {}",
        archive.display()
    )]
    UnsupportedMethod {
        archive: PathBuf,
        member: String,
        method: CompressionMethod,
    },

    /// Any other structural inconsistency.
    #[error("cannot process the zip file {}: {reason}", archive.display())]
    Corrupt { archive: PathBuf, reason: String },

    /// An operating system failure; the payload is usually a [`ReadFault`].
    #[error(transparent)]
    Io(io::Error),
}

impl ZipError {
    pub fn corrupt(archive: &Path, reason: impl Into<String>) -> Self {
        ZipError::Corrupt {
            archive: archive.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn is_bad_signature(&self) -> bool {
        matches!(self, ZipError::BadSignature { .. })
    }

    /// True for every archive-format error, false for OS faults.
    pub fn is_structural(&self) -> bool {
        !matches!(self, ZipError::Io(_))
    }

    /// The [`ReadFault`] behind an OS error, if one was attached.
    pub fn read_fault(&self) -> Option<&ReadFault> {
        match self {
            ZipError::Io(e) => e.get_ref().and_then(|inner| inner.downcast_ref()),
            _ => None,
        }
    }
}

/// Attaches archive context to I/O results produced while parsing.
pub(crate) trait ParseContext<T> {
    /// Maps a short read to [`ZipError::Corrupt`] naming `what`; any other
    /// error stays an OS fault.
    fn parsing(self, archive: &Path, what: &str) -> Result<T>;
}

impl<T> ParseContext<T> for io::Result<T> {
    fn parsing(self, archive: &Path, what: &str) -> Result<T> {
        self.map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                ZipError::corrupt(archive, format!("truncated {what}"))
            } else {
                ZipError::Io(ReadFault::wrap(archive, e))
            }
        })
    }
}
