use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use super::directory::read_directory;
use super::locator::locate;
use super::member::{self, PluggedFile};
use super::options::ReaderOptions;
use super::structures::MemberRecord;
use crate::error::{ReadFault, Result, ZipError};
use crate::io::{LocalFileReader, ReadAt};

/// An open ZIP archive.
///
/// Construction locates the trailer and reads the whole central directory;
/// any structural problem fails the construction, so a `ZipReader` that
/// exists always has a complete member table. After that the reader is
/// immutable: [`plug`](Self::plug) may be called from many threads at once,
/// and every returned stream reads the shared source positionally through
/// its own window.
///
/// ## Example
///
/// ```no_run
/// use std::io::Read;
/// use zipview::ZipReader;
///
/// let zip = ZipReader::open("archive.zip")?;
/// for file in zip.files() {
///     println!("{}", file.name());
/// }
///
/// let mut content = Vec::new();
/// zip.plug(0)?.read_to_end(&mut content)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct ZipReader<R: ReadAt = LocalFileReader> {
    /// The underlying data source
    source: Arc<R>,
    /// Members in central directory order
    records: Vec<MemberRecord>,
}

impl ZipReader<LocalFileReader> {
    /// Opens the archive at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &ReaderOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: &ReaderOptions) -> Result<Self> {
        let source = LocalFileReader::new(path.as_ref())?;
        Self::new(Arc::new(source), options)
    }

    /// Whether `path` opens as a ZIP archive, without keeping it open.
    pub fn check(path: impl AsRef<Path>) -> bool {
        LocalFileReader::new(path.as_ref())
            .and_then(|source| {
                locate(
                    &Arc::new(source),
                    ReaderOptions::default().tail_window,
                )
            })
            .is_ok()
    }
}

impl<R: ReadAt> ZipReader<R> {
    /// Reads the archive structure from `source`.
    pub fn new(source: Arc<R>, options: &ReaderOptions) -> Result<Self> {
        let trailer = locate(&source, options.tail_window)?;
        let records = read_directory(&source, &trailer.eocd, options)?;
        Ok(Self { source, records })
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    /// Total length of the archive in bytes.
    pub fn size(&self) -> u64 {
        self.source.size()
    }

    /// Members in central directory order.
    pub fn files(&self) -> &[MemberRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the first member whose path equals `path`.
    pub fn find(&self, path: impl AsRef<[u8]>) -> Result<usize> {
        let path = path.as_ref();
        self.records
            .iter()
            .position(|r| r.path == path)
            .ok_or_else(|| {
                log::error!(
                    "File {} not found in zip file {}.",
                    String::from_utf8_lossy(path),
                    self.path().display()
                );
                ZipError::NotFound {
                    archive: self.path().to_path_buf(),
                    member: String::from_utf8_lossy(path).into_owned(),
                }
            })
    }

    pub fn record(&self, index: usize) -> Result<&MemberRecord> {
        self.records.get(index).ok_or_else(|| {
            log::error!(
                "Invalid file index {} in zip file {}.",
                index,
                self.path().display()
            );
            ZipError::InvalidIndex {
                archive: self.path().to_path_buf(),
                index,
                count: self.records.len(),
            }
        })
    }

    /// Builds the decoding pipeline of the member at `index`.
    ///
    /// The returned stream yields the member's content. Failures only
    /// concern this call; the reader and other streams stay usable.
    pub fn plug(&self, index: usize) -> Result<PluggedFile<R>> {
        let record = self.record(index)?;
        member::plug(&self.source, record)
    }

    /// Drains the member at `index` into `sink`, returning the number of
    /// decoded bytes.
    pub fn extract_to<W: Write + ?Sized>(&self, index: usize, sink: &mut W) -> Result<u64> {
        let mut plugged = self.plug(index)?;
        let mut buf = vec![0u8; 64 * 1024];
        let mut total = 0u64;
        loop {
            let n = match plugged.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.stream_error(&plugged, e)),
            };
            sink.write_all(&buf[..n]).map_err(ZipError::Io)?;
            total += n as u64;
        }
        Ok(total)
    }

    /// Classifies a failed member read: OS faults stay I/O errors, anything
    /// else means the compressed data could not be decoded.
    fn stream_error(&self, plugged: &PluggedFile<R>, e: io::Error) -> ZipError {
        if e.get_ref().is_some_and(|inner| inner.is::<ReadFault>()) {
            return ZipError::Io(e);
        }
        ZipError::corrupt(
            self.path(),
            format!("cannot decode {}: {}", plugged.name(), e),
        )
    }
}
