use super::ReadAt;
use std::io;
use std::path::{Path, PathBuf};

/// An archive held in memory.
///
/// Useful for archives received over the network or embedded in another
/// file; `name` is only used to label errors.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    data: Vec<u8>,
    name: PathBuf,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>, name: impl Into<PathBuf>) -> Self {
        Self {
            data,
            name: name.into(),
        }
    }
}

impl ReadAt for MemoryReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.data.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn path(&self) -> &Path {
        &self.name
    }
}
