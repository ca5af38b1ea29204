use super::ReadAt;
use crate::error::{ReadFault, Result, ZipError};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Local file reader with random access support.
///
/// The file is opened read-only and only ever accessed with positional
/// reads, so one instance can be shared between threads behind an `Arc`.
#[derive(Debug)]
pub struct LocalFileReader {
    file: File,
    path: PathBuf,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            log::error!("Cannot open zip file {}: {}", path.display(), e);
            ZipError::Io(ReadFault::wrap(path, e))
        })?;
        let size = file
            .metadata()
            .map_err(|e| {
                log::error!("Cannot stat zip file {}: {}", path.display(), e);
                ZipError::Io(ReadFault::wrap(path, e))
            })?
            .len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            size,
        })
    }
}

impl ReadAt for LocalFileReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            // seek_read moves the handle's pointer, but every read here
            // names its own offset so nothing relies on it
            use std::os::windows::fs::FileExt;
            self.file.seek_read(buf, offset)
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = (offset, buf);
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "positional reads are not available on this platform",
            ))
        }
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
