//! Binary layouts of the ZIP records the reader consumes.
//!
//! Each record is read from a [`Read`] positioned at its signature. Sizes,
//! offsets and disk numbers whose classic slot holds the all-ones sentinel
//! are resolved from the ZIP64 extra field; a sentinel without a matching
//! extra value is a structural error.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::path::Path;

use super::binary::ZipRead;
use super::structures::*;
use crate::error::{ParseContext, Result, ZipError};

/// The classic end of central directory record, fields as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassicEndRecord {
    pub this_disk: u16,
    pub directory_start_disk: u16,
    pub records_on_this_disk: u16,
    pub total_records: u16,
    pub directory_size: u32,
    pub directory_offset: u32,
    pub comment_len: u16,
}

impl ClassicEndRecord {
    pub fn read<Rd: Read>(input: &mut Rd, archive: &Path) -> Result<Self> {
        const WHAT: &str = "end of central directory";
        input.expect_signature(archive, WHAT, EOCD_SIGNATURE)?;
        let mut field = || input.read_u16::<LittleEndian>().parsing(archive, WHAT);
        let this_disk = field()?;
        let directory_start_disk = field()?;
        let records_on_this_disk = field()?;
        let total_records = field()?;
        let directory_size = input.read_u32::<LittleEndian>().parsing(archive, WHAT)?;
        let directory_offset = input.read_u32::<LittleEndian>().parsing(archive, WHAT)?;
        let comment_len = input.read_u16::<LittleEndian>().parsing(archive, WHAT)?;
        Ok(Self {
            this_disk,
            directory_start_disk,
            records_on_this_disk,
            total_records,
            directory_size,
            directory_offset,
            comment_len,
        })
    }

    /// Parses a record from the start of `data` without reading the comment.
    pub fn from_bytes(data: &[u8], archive: &Path) -> Result<Self> {
        Self::read(&mut Cursor::new(data), archive)
    }

    /// Whether any field is saturated, meaning the authoritative values live
    /// in the ZIP64 end of central directory record.
    pub fn needs_zip64(&self) -> bool {
        self.this_disk == u16::MAX
            || self.directory_start_disk == u16::MAX
            || self.records_on_this_disk == u16::MAX
            || self.total_records == u16::MAX
            || self.directory_size == u32::MAX
            || self.directory_offset == u32::MAX
    }

    pub fn widen(&self) -> EndOfCentralDirectory {
        EndOfCentralDirectory {
            this_disk: self.this_disk as u32,
            directory_start_disk: self.directory_start_disk as u32,
            records_on_this_disk: self.records_on_this_disk as u64,
            total_records: self.total_records as u64,
            directory_size: self.directory_size as u64,
            directory_offset: self.directory_offset as u64,
        }
    }
}

/// ZIP64 End of Central Directory Locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64Locator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64Locator {
    pub const WHAT: &'static str = "end of central directory 64 locator";

    pub fn read<Rd: Read>(input: &mut Rd, archive: &Path) -> Result<Self> {
        const WHAT: &str = Zip64Locator::WHAT;
        input.expect_signature(archive, WHAT, EOCD64_LOCATOR_SIGNATURE)?;
        Ok(Self {
            disk_with_eocd64: input.read_u32::<LittleEndian>().parsing(archive, WHAT)?,
            eocd64_offset: input.read_u64::<LittleEndian>().parsing(archive, WHAT)?,
            total_disks: input.read_u32::<LittleEndian>().parsing(archive, WHAT)?,
        })
    }
}

/// Reads the ZIP64 end of central directory record.
pub fn read_eocd64<Rd: Read>(input: &mut Rd, archive: &Path) -> Result<EndOfCentralDirectory> {
    const WHAT: &str = "end of central directory (64)";
    input.expect_signature(archive, WHAT, EOCD64_SIGNATURE)?;

    // record size, version made by, version needed: not used
    input.skip(8 + 2 + 2).parsing(archive, WHAT)?;

    let mut u32_field = || input.read_u32::<LittleEndian>().parsing(archive, WHAT);
    let this_disk = u32_field()?;
    let directory_start_disk = u32_field()?;
    let mut u64_field = || input.read_u64::<LittleEndian>().parsing(archive, WHAT);
    Ok(EndOfCentralDirectory {
        this_disk,
        directory_start_disk,
        records_on_this_disk: u64_field()?,
        total_records: u64_field()?,
        directory_size: u64_field()?,
        directory_offset: u64_field()?,
    })
}

/// Which values a header expects to find in its ZIP64 extra record.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zip64Wanted {
    pub uncompressed_size: bool,
    pub compressed_size: bool,
    pub header_offset: bool,
    pub disk_start: bool,
}

/// Values found in a ZIP64 extra record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64Extra {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub header_offset: Option<u64>,
    pub disk_start: Option<u32>,
}

/// Scans an extra field area for the ZIP64 record.
///
/// Only the wanted values are present, in the fixed order uncompressed
/// size, compressed size, header offset, disk start. Values the payload is
/// too short to hold are left out; other extra records are skipped.
pub fn parse_zip64_extra(extra: &[u8], wanted: Zip64Wanted) -> Zip64Extra {
    let mut found = Zip64Extra::default();
    let mut pos = 0usize;

    while pos + 4 <= extra.len() {
        let tag = u16::from_le_bytes([extra[pos], extra[pos + 1]]);
        let size = u16::from_le_bytes([extra[pos + 2], extra[pos + 3]]) as usize;
        let body_start = pos + 4;
        let body_end = (body_start + size).min(extra.len());
        pos = body_start + size;

        if tag != ZIP64_EXTRA_TAG {
            continue;
        }

        let mut body = Cursor::new(&extra[body_start..body_end]);
        let mut next_u64 = |want: bool| {
            if want {
                body.read_u64::<LittleEndian>().ok()
            } else {
                None
            }
        };
        found.uncompressed_size = next_u64(wanted.uncompressed_size);
        found.compressed_size = next_u64(wanted.compressed_size);
        found.header_offset = next_u64(wanted.header_offset);
        if wanted.disk_start {
            found.disk_start = body.read_u32::<LittleEndian>().ok();
        }
        break;
    }

    found
}

fn missing_zip64(archive: &Path, field: &str, name: &[u8]) -> ZipError {
    ZipError::corrupt(
        archive,
        format!(
            "missing zip64 extended information for the {} of {}",
            field,
            String::from_utf8_lossy(name)
        ),
    )
}

/// One central directory file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryFileHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: Field64,
    pub uncompressed_size: Field64,
    pub filename: Vec<u8>,
    pub disk_number_start: DiskNumber,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    pub file_offset: Field64,
}

impl CentralDirectoryFileHeader {
    pub fn read<Rd: Read>(input: &mut Rd, archive: &Path) -> Result<Self> {
        const WHAT: &str = "central directory file header";
        input.expect_signature(archive, WHAT, CENTRAL_HEADER_SIGNATURE)?;

        let mut fixed = [0u8; (CENTRAL_HEADER_MIN_SIZE - 4) as usize];
        input.read_exact(&mut fixed).parsing(archive, WHAT)?;
        let mut c = Cursor::new(&fixed[..]);
        // reads from an in-memory buffer of the right size cannot fail
        let mut u16_at = || c.read_u16::<LittleEndian>().unwrap_or_default();
        let version_made_by = u16_at();
        let version_needed = u16_at();
        let flags = u16_at();
        let method = u16_at();
        let last_mod_time = u16_at();
        let last_mod_date = u16_at();
        let crc32 = c.read_u32::<LittleEndian>().unwrap_or_default();
        let raw_compressed = c.read_u32::<LittleEndian>().unwrap_or_default();
        let raw_uncompressed = c.read_u32::<LittleEndian>().unwrap_or_default();
        let mut u16_at = || c.read_u16::<LittleEndian>().unwrap_or_default();
        let name_len = u16_at();
        let extra_len = u16_at();
        let comment_len = u16_at();
        let raw_disk = u16_at();
        let internal_attributes = u16_at();
        let external_attributes = c.read_u32::<LittleEndian>().unwrap_or_default();
        let raw_offset = c.read_u32::<LittleEndian>().unwrap_or_default();

        let filename = input.read_vec(name_len as usize).parsing(archive, WHAT)?;
        let extra = input.read_vec(extra_len as usize).parsing(archive, WHAT)?;
        input.skip(comment_len as u64).parsing(archive, WHAT)?;

        let wide = parse_zip64_extra(
            &extra,
            Zip64Wanted {
                uncompressed_size: raw_uncompressed == u32::MAX,
                compressed_size: raw_compressed == u32::MAX,
                header_offset: raw_offset == u32::MAX,
                disk_start: raw_disk == u16::MAX,
            },
        );

        let compressed_size = Field64::resolve(raw_compressed, wide.compressed_size)
            .ok_or_else(|| missing_zip64(archive, "compressed size", &filename))?;
        let uncompressed_size = Field64::resolve(raw_uncompressed, wide.uncompressed_size)
            .ok_or_else(|| missing_zip64(archive, "uncompressed size", &filename))?;
        let file_offset = Field64::resolve(raw_offset, wide.header_offset)
            .ok_or_else(|| missing_zip64(archive, "local header offset", &filename))?;
        let disk_number_start = DiskNumber::resolve(raw_disk, wide.disk_start)
            .ok_or_else(|| missing_zip64(archive, "disk number", &filename))?;

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            compression_method: CompressionMethod::from_u16(method),
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            filename,
            disk_number_start,
            internal_attributes,
            external_attributes,
            file_offset,
        })
    }

    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            compression_method: self.compression_method,
            flags: self.flags,
            crc32: self.crc32,
            compressed_size: self.compressed_size.get(),
            uncompressed_size: self.uncompressed_size.get(),
            last_mod_time: self.last_mod_time,
            last_mod_date: self.last_mod_date,
            version_made_by: self.version_made_by,
            external_attributes: self.external_attributes,
        }
    }
}

/// The parts of a local file header needed to locate the member's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub compressed_size: Field64,
    pub uncompressed_size: Field64,
    pub filename_size: u16,
    pub extra_size: u16,
}

impl LocalFileHeader {
    pub fn read<Rd: Read>(input: &mut Rd, archive: &Path) -> Result<Self> {
        const WHAT: &str = "local file header";
        input.expect_signature(archive, WHAT, LOCAL_HEADER_SIGNATURE)?;

        let mut fixed = [0u8; (LOCAL_HEADER_SIZE - 4) as usize];
        input.read_exact(&mut fixed).parsing(archive, WHAT)?;
        let mut c = Cursor::new(&fixed[..]);
        let _version_needed = c.read_u16::<LittleEndian>().unwrap_or_default();
        let flags = c.read_u16::<LittleEndian>().unwrap_or_default();
        let method = c.read_u16::<LittleEndian>().unwrap_or_default();
        // time, date, crc-32
        c.set_position(c.position() + 2 + 2 + 4);
        let raw_compressed = c.read_u32::<LittleEndian>().unwrap_or_default();
        let raw_uncompressed = c.read_u32::<LittleEndian>().unwrap_or_default();
        let filename_size = c.read_u16::<LittleEndian>().unwrap_or_default();
        let extra_size = c.read_u16::<LittleEndian>().unwrap_or_default();

        input.skip(filename_size as u64).parsing(archive, WHAT)?;
        let extra = input.read_vec(extra_size as usize).parsing(archive, WHAT)?;

        let wide = parse_zip64_extra(
            &extra,
            Zip64Wanted {
                uncompressed_size: raw_uncompressed == u32::MAX,
                compressed_size: raw_compressed == u32::MAX,
                ..Zip64Wanted::default()
            },
        );

        // with a data descriptor the sizes here are placeholders that get
        // replaced by the central directory values
        let deferred = flags & FLAG_DATA_DESCRIPTOR != 0;
        let resolve = |raw: u32, ext: Option<u64>, field: &str| {
            match Field64::resolve(raw, ext) {
                Some(v) => Ok(v),
                None if deferred => Ok(Field64::Classic(raw)),
                None => Err(ZipError::corrupt(
                    archive,
                    format!("missing zip64 extended information for the {field} in a {WHAT}"),
                )),
            }
        };

        Ok(Self {
            flags,
            compression_method: CompressionMethod::from_u16(method),
            compressed_size: resolve(raw_compressed, wide.compressed_size, "compressed size")?,
            uncompressed_size: resolve(
                raw_uncompressed,
                wide.uncompressed_size,
                "uncompressed size",
            )?,
            filename_size,
            extra_size,
        })
    }

    /// Size of the header including name and extra field.
    pub fn size(&self) -> u64 {
        LOCAL_HEADER_SIZE + self.filename_size as u64 + self.extra_size as u64
    }

    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }
}
