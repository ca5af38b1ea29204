//! Little-endian primitive decoding on top of [`byteorder`].

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read};
use std::path::Path;

use crate::error::{ParseContext, Result, ZipError};

/// Extra reading helpers for ZIP structures.
pub trait ZipRead: Read {
    /// Reads a 4-byte signature and fails with [`ZipError::BadSignature`]
    /// when it is not `expected`.
    fn expect_signature(
        &mut self,
        archive: &Path,
        what: &'static str,
        expected: u32,
    ) -> Result<()> {
        let found = self.read_u32::<LittleEndian>().parsing(archive, what)?;
        if found != expected {
            log::error!(
                "Error reading {} in {}: invalid signature; expected {:#010x} got {:#010x}.",
                what,
                archive.display(),
                expected,
                found
            );
            return Err(ZipError::BadSignature {
                archive: archive.to_path_buf(),
                what,
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Reads exactly `len` raw bytes.
    fn read_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Consumes exactly `len` bytes.
    fn skip(&mut self, len: u64) -> io::Result<()> {
        let skipped = io::copy(&mut (&mut *self).take(len), &mut io::sink())?;
        if skipped != len {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(())
    }
}

impl<R: Read + ?Sized> ZipRead for R {}
