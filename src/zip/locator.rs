//! Locating the end of central directory.
//!
//! ZIP files are designed to be read from the end:
//! 1. Scan the file's tail backwards for the EOCD signature
//! 2. If the classic record is saturated, follow the ZIP64 locator that
//!    sits right before it to the ZIP64 EOCD record
//!
//! A signature match alone is not trusted: an archive comment may contain
//! the same four bytes. Each candidate is checked for internal consistency
//! and the scan moves on to earlier candidates when the check fails.

use byteorder::{ByteOrder, LittleEndian};
use std::sync::Arc;

use super::records::{ClassicEndRecord, Zip64Locator, read_eocd64};
use super::structures::*;
use crate::error::{ParseContext, Result, ZipError};
use crate::io::{BoundedView, ReadAt, read_exact_at};

/// Default size of the tail window scanned for the EOCD signature.
pub const DEFAULT_TAIL_WINDOW: u64 = 1024;

/// The located trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    /// Authoritative values, from the ZIP64 record when there is one.
    pub eocd: EndOfCentralDirectory,
    /// Absolute offset of the classic EOCD record.
    pub offset: u64,
    pub zip64: bool,
}

/// Finds and parses the end of central directory of `source`.
///
/// # Errors
///
/// [`ZipError::MissingTrailer`] when no consistent record is found in the
/// last `tail_window` bytes, [`ZipError::BadSignature`] when a saturated
/// record has no ZIP64 locator and nothing else was found, or when the ZIP64
/// records are not where the locator says, [`ZipError::MultiDisk`] for
/// spanned archives.
pub fn locate<R: ReadAt>(source: &Arc<R>, tail_window: u64) -> Result<Trailer> {
    let archive = source.path();
    let (offset, classic) = find_classic(source.as_ref(), tail_window)?;

    log::debug!("Reading end of central directory record.");
    let (eocd, zip64) = if classic.needs_zip64() {
        (read_zip64(source, offset)?, true)
    } else {
        (classic.widen(), false)
    };

    if eocd.this_disk != eocd.directory_start_disk
        || eocd.records_on_this_disk != eocd.total_records
    {
        log::error!(
            "Unsupported format in zip file {}: multiple disks encountered.",
            archive.display()
        );
        return Err(ZipError::MultiDisk {
            archive: archive.to_path_buf(),
        });
    }

    let directory_end = eocd.directory_offset.checked_add(eocd.directory_size);
    if directory_end.is_none_or(|end| end > source.size()) {
        return Err(ZipError::corrupt(
            archive,
            format!(
                "central directory [{}, +{}) lies beyond the end of the file ({} bytes)",
                eocd.directory_offset,
                eocd.directory_size,
                source.size()
            ),
        ));
    }

    Ok(Trailer {
        eocd,
        offset,
        zip64,
    })
}

/// Outcome of checking one signature match.
enum Verdict {
    Accept,
    Reject(String),
    /// Saturated record whose ZIP64 locator signature is wrong.
    BadLocator { found: u32 },
}

/// Returns the offset and content of the last consistent classic record.
fn find_classic<R: ReadAt + ?Sized>(
    source: &R,
    tail_window: u64,
) -> Result<(u64, ClassicEndRecord)> {
    let archive = source.path();
    let size = source.size();

    // read at most one window from the end of file
    let window = size.min(tail_window.max(EOCD_SIZE));
    let window_start = size - window;
    let mut block = vec![0u8; window as usize];
    read_exact_at(source, window_start, &mut block).parsing(archive, "archive tail")?;

    let mut bad_locator = None;
    if let Some(last) = block.len().checked_sub(EOCD_SIZE as usize) {
        for i in (0..=last).rev() {
            if LittleEndian::read_u32(&block[i..]) != EOCD_SIGNATURE {
                continue;
            }
            let offset = window_start + i as u64;
            let record = ClassicEndRecord::from_bytes(&block[i..], archive)?;
            let reason = match check_candidate(source, offset, &record)? {
                Verdict::Accept => return Ok((offset, record)),
                Verdict::Reject(reason) => reason,
                Verdict::BadLocator { found } => {
                    bad_locator.get_or_insert(found);
                    format!("zip64 locator signature is {found:#010x}")
                }
            };
            log::warn!(
                "Ignoring end of central directory candidate at offset {} in {}: {}.",
                offset,
                archive.display(),
                reason
            );
        }
    }

    if let Some(found) = bad_locator {
        log::error!(
            "Error reading {} in {}: invalid signature; expected {:#010x} got {:#010x}.",
            Zip64Locator::WHAT,
            archive.display(),
            EOCD64_LOCATOR_SIGNATURE,
            found
        );
        return Err(ZipError::BadSignature {
            archive: archive.to_path_buf(),
            what: Zip64Locator::WHAT,
            expected: EOCD64_LOCATOR_SIGNATURE,
            found,
        });
    }

    log::error!(
        "Cannot find end of central directory signature in zip file {}.",
        archive.display()
    );
    Err(ZipError::MissingTrailer {
        archive: archive.to_path_buf(),
    })
}

/// Checks a candidate record for internal consistency. Only OS faults are
/// errors; an inconsistent candidate is a [`Verdict`].
fn check_candidate<R: ReadAt + ?Sized>(
    source: &R,
    offset: u64,
    record: &ClassicEndRecord,
) -> Result<Verdict> {
    let comment_end = offset + EOCD_SIZE + record.comment_len as u64;
    if comment_end > source.size() {
        return Ok(Verdict::Reject(format!(
            "comment of {} bytes runs past the end of the file",
            record.comment_len
        )));
    }

    if record.needs_zip64() {
        let Some(locator) = offset.checked_sub(EOCD64_LOCATOR_SIZE) else {
            return Ok(Verdict::Reject("no room for a zip64 locator".into()));
        };
        let mut sig = [0u8; 4];
        read_exact_at(source, locator, &mut sig).parsing(source.path(), Zip64Locator::WHAT)?;
        let found = LittleEndian::read_u32(&sig);
        if found != EOCD64_LOCATOR_SIGNATURE {
            return Ok(Verdict::BadLocator { found });
        }
        return Ok(Verdict::Accept);
    }

    let directory_end = record.directory_offset as u64 + record.directory_size as u64;
    if directory_end > offset {
        return Ok(Verdict::Reject(format!(
            "central directory ends at {directory_end}, after the record"
        )));
    }
    if record.records_on_this_disk > record.total_records {
        return Ok(Verdict::Reject(
            "more records on this disk than in total".into(),
        ));
    }
    // every directory entry takes at least a fixed header
    if (record.records_on_this_disk as u64) * CENTRAL_HEADER_MIN_SIZE
        > record.directory_size as u64
    {
        return Ok(Verdict::Reject(
            "central directory too small for its record count".into(),
        ));
    }
    Ok(Verdict::Accept)
}

fn read_zip64<R: ReadAt>(source: &Arc<R>, eocd_offset: u64) -> Result<EndOfCentralDirectory> {
    let archive = source.path();
    let locator_offset = eocd_offset - EOCD64_LOCATOR_SIZE;

    log::debug!("Reading end of central directory locator.");
    let mut view = BoundedView::new(Arc::clone(source), locator_offset, eocd_offset);
    let locator = Zip64Locator::read(&mut view, archive)?;

    if locator.total_disks > 1 {
        log::error!(
            "Unsupported format in zip file {}: {} disks.",
            archive.display(),
            locator.total_disks
        );
        return Err(ZipError::MultiDisk {
            archive: archive.to_path_buf(),
        });
    }
    if locator.eocd64_offset.saturating_add(EOCD64_MIN_SIZE) > locator_offset {
        return Err(ZipError::corrupt(
            archive,
            format!(
                "zip64 end of central directory offset {} overlaps its locator",
                locator.eocd64_offset
            ),
        ));
    }

    let mut view = BoundedView::new(Arc::clone(source), locator.eocd64_offset, locator_offset);
    read_eocd64(&mut view, archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;

    fn eocd(records: u16, size: u32, offset: u32, comment: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&[0, 0, 0, 0]);
        out.extend_from_slice(&records.to_le_bytes());
        out.extend_from_slice(&records.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        out.extend_from_slice(comment);
        out
    }

    fn source(data: Vec<u8>) -> Arc<MemoryReader> {
        Arc::new(MemoryReader::new(data, "mem.zip"))
    }

    #[test]
    fn empty_archive_trailer() {
        let trailer = locate(&source(eocd(0, 0, 0, b"")), DEFAULT_TAIL_WINDOW).unwrap();
        assert_eq!(trailer.offset, 0);
        assert!(!trailer.zip64);
        assert_eq!(trailer.eocd, EndOfCentralDirectory::default());
    }

    #[test]
    fn not_a_zip() {
        let err = locate(&source(vec![0x42; 4000]), DEFAULT_TAIL_WINDOW).unwrap_err();
        assert!(matches!(err, ZipError::MissingTrailer { .. }));

        let err = locate(&source(b"PK\x05\x06".to_vec()), DEFAULT_TAIL_WINDOW).unwrap_err();
        assert!(matches!(err, ZipError::MissingTrailer { .. }));
    }

    #[test]
    fn fake_signature_in_comment_is_skipped() {
        // a comment that embeds a plausible looking record pointing nowhere
        let fake = eocd(1, 46, 5000, b"");
        let mut data = vec![0u8; 100];
        data.extend(eocd(0, 0, 100, &fake));
        let trailer = locate(&source(data), DEFAULT_TAIL_WINDOW).unwrap();
        assert_eq!(trailer.offset, 100);
        assert_eq!(trailer.eocd.directory_offset, 100);
    }

    #[test]
    fn record_outside_window_is_missed() {
        let data = eocd(0, 0, 0, &[b'x'; 2000]);
        let err = locate(&source(data.clone()), DEFAULT_TAIL_WINDOW).unwrap_err();
        assert!(matches!(err, ZipError::MissingTrailer { .. }));
        // a larger window finds it
        assert!(locate(&source(data), 4096).is_ok());
    }

    /// ZIP64 records plus a saturated classic record, nothing before them.
    fn zip64_tail(directory_offset: u64) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&EOCD64_SIGNATURE.to_le_bytes());
        data.extend_from_slice(&44u64.to_le_bytes());
        data.extend_from_slice(&[45, 0, 45, 0]);
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&1u64.to_le_bytes());
        data.extend_from_slice(&1u64.to_le_bytes());
        data.extend_from_slice(&46u64.to_le_bytes());
        data.extend_from_slice(&directory_offset.to_le_bytes());
        data.extend_from_slice(&EOCD64_LOCATOR_SIGNATURE.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend(eocd(u16::MAX, u32::MAX, u32::MAX, b""));
        data
    }

    /// Fails every read that starts at `fail_at` with EIO.
    #[derive(Debug)]
    struct FailingReader {
        inner: MemoryReader,
        fail_at: u64,
    }

    impl ReadAt for FailingReader {
        fn read_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
            if offset == self.fail_at {
                return Err(std::io::Error::from_raw_os_error(5));
            }
            self.inner.read_at(offset, buf)
        }

        fn size(&self) -> u64 {
            self.inner.size()
        }

        fn path(&self) -> &std::path::Path {
            self.inner.path()
        }
    }

    #[test]
    fn directory_beyond_eof_is_rejected() {
        // passes the candidate check only through the zip64 path, so use a
        // saturated record whose zip64 values are broken
        let err = locate(&source(zip64_tail(1 << 40)), DEFAULT_TAIL_WINDOW).unwrap_err();
        assert!(matches!(err, ZipError::Corrupt { .. }), "{err}");
    }

    #[test]
    fn damaged_locator_is_a_bad_signature() {
        let mut data = zip64_tail(0);
        let locator = data.len() - EOCD_SIZE as usize - EOCD64_LOCATOR_SIZE as usize;
        data[locator] = b'X';

        let err = locate(&source(data), DEFAULT_TAIL_WINDOW).unwrap_err();
        match err {
            ZipError::BadSignature {
                what,
                expected,
                found,
                ..
            } => {
                assert_eq!(what, Zip64Locator::WHAT);
                assert_eq!(expected, EOCD64_LOCATOR_SIGNATURE);
                assert_eq!(found, (EOCD64_LOCATOR_SIGNATURE & !0xff) | b'X' as u32);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn os_fault_while_checking_locator_is_kept() {
        let data = zip64_tail(0);
        let locator = (data.len() - EOCD_SIZE as usize - EOCD64_LOCATOR_SIZE as usize) as u64;
        let reader = FailingReader {
            inner: MemoryReader::new(data, "flaky.zip"),
            fail_at: locator,
        };

        let err = locate(&Arc::new(reader), DEFAULT_TAIL_WINDOW).unwrap_err();
        assert!(!err.is_structural(), "{err}");
        let fault = err.read_fault().expect("read fault attached");
        assert_eq!(fault.raw_os_error(), Some(5));
        assert_eq!(fault.path, std::path::Path::new("flaky.zip"));
    }

    #[test]
    fn file_shorter_than_a_record() {
        let err = locate(&source(b"PK\x05\x06\0\0".to_vec()), DEFAULT_TAIL_WINDOW).unwrap_err();
        assert!(matches!(err, ZipError::MissingTrailer { .. }));
    }
}
