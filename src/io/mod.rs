//! Random-access byte sources.
//!
//! Everything the archive reader touches goes through [`ReadAt`], whose
//! reads are positional: they name an absolute offset and never move a
//! cursor shared with other readers. That is what lets many
//! [`BoundedView`]s decode members of one open file at the same time.

mod local;
mod memory;
mod view;

pub use local::LocalFileReader;
pub use memory::MemoryReader;
pub use view::BoundedView;

use std::io;
use std::path::Path;
use std::sync::Arc;

/// Trait for random access reading from a data source
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer.
    ///
    /// Returns the number of bytes read, which may be short near the end
    /// of the source. Must not disturb any position shared with other
    /// callers.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Path used to attribute errors to this source.
    fn path(&self) -> &Path;
}

impl<R: ReadAt + ?Sized> ReadAt for Arc<R> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn path(&self) -> &Path {
        (**self).path()
    }
}

/// Fills `buf` completely from `offset`, failing with `UnexpectedEof` when
/// the source ends first.
pub fn read_exact_at<R: ReadAt + ?Sized>(
    reader: &R,
    mut offset: u64,
    mut buf: &mut [u8],
) -> io::Result<()> {
    while !buf.is_empty() {
        match reader.read_at(offset, buf) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                offset += n as u64;
                buf = &mut buf[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
