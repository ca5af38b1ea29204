use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use super::ReadAt;
use crate::error::ReadFault;

/// A read-only window `[start, end)` over a shared source.
///
/// Each view owns its cursor; the source itself is only read positionally,
/// so any number of views over the same source can be driven at once, from
/// any thread, without a lock.
///
/// Positions reported by [`Seek`] are relative to `start`.
#[derive(Debug)]
pub struct BoundedView<R: ReadAt> {
    source: Arc<R>,
    start: u64,
    end: u64,
    /// Absolute offset, always within `[start, end]`.
    pos: u64,
}

impl<R: ReadAt> Clone for BoundedView<R> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            start: self.start,
            end: self.end,
            pos: self.pos,
        }
    }
}

impl<R: ReadAt> BoundedView<R> {
    /// Creates a view over `[start, end)`, clamped to the source size.
    pub fn new(source: Arc<R>, start: u64, end: u64) -> Self {
        let end = end.min(source.size());
        let start = start.min(end);
        Self {
            source,
            start,
            end,
            pos: start,
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Cursor position relative to `start`.
    pub fn position(&self) -> u64 {
        self.pos - self.start
    }

    pub fn remaining(&self) -> u64 {
        self.end - self.pos
    }

    /// Reads from `pos` (relative to `start`) and leaves the cursor just
    /// past the bytes read. The underlying read is positional either way.
    pub fn read_from(&mut self, buf: &mut [u8], pos: u64) -> io::Result<usize> {
        let at = self.start.saturating_add(pos).min(self.end);
        let n = self.read_impl(buf, at)?;
        self.pos = at + n as u64;
        Ok(n)
    }

    fn read_impl(&self, buf: &mut [u8], at: u64) -> io::Result<usize> {
        // trim if out of range
        let size = (buf.len() as u64).min(self.end - at) as usize;
        if size == 0 {
            return Ok(0);
        }
        self.source
            .read_at(at, &mut buf[..size])
            .map_err(|e| ReadFault::wrap(self.source.path(), e))
    }
}

impl<R: ReadAt> Read for BoundedView<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.read_impl(buf, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: ReadAt> Seek for BoundedView<R> {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        let wanted: i128 = match target {
            SeekFrom::Start(off) => self.start as i128 + off as i128,
            SeekFrom::Current(off) => self.pos as i128 + off as i128,
            SeekFrom::End(off) => self.end as i128 + off as i128,
        };
        self.pos = wanted.clamp(self.start as i128, self.end as i128) as u64;
        Ok(self.pos - self.start)
    }
}
