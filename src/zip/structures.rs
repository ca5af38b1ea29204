use std::borrow::Cow;
use std::fmt;

/// Local File Header (LFH) - 30 bytes without name and extra field
pub const LOCAL_HEADER_SIGNATURE: u32 = 0x04034b50;
pub const LOCAL_HEADER_SIZE: u64 = 30;

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x02014b50;
pub const CENTRAL_HEADER_MIN_SIZE: u64 = 46;

/// End of Central Directory (EOCD) - 22 bytes minimum
pub const EOCD_SIGNATURE: u32 = 0x06054b50;
pub const EOCD_SIZE: u64 = 22;

/// ZIP64 End of Central Directory - 56 bytes minimum
pub const EOCD64_SIGNATURE: u32 = 0x06064b50;
pub const EOCD64_MIN_SIZE: u64 = 56;

/// ZIP64 End of Central Directory Locator - 20 bytes
pub const EOCD64_LOCATOR_SIGNATURE: u32 = 0x07064b50;
pub const EOCD64_LOCATOR_SIZE: u64 = 20;

/// Extra field tag of the ZIP64 extended information record.
pub const ZIP64_EXTRA_TAG: u16 = 0x0001;

/// General purpose flag: sizes and CRC follow the data in a descriptor.
pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// Upper bounds of the variable parts of a local header.
pub const MAX_NAME_SIZE: u64 = u16::MAX as u64;
pub const MAX_EXTRA_SIZE: u64 = u16::MAX as u64;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    Stored,
    Shrink,
    Reduce1,
    Reduce2,
    Reduce3,
    Reduce4,
    Implode,
    Deflate,
    Deflate64,
    PkwareImplode,
    Bzip2,
    Lzma,
    Terse,
    Lz77,
    Wavpack,
    Ppmd,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            1 => CompressionMethod::Shrink,
            2 => CompressionMethod::Reduce1,
            3 => CompressionMethod::Reduce2,
            4 => CompressionMethod::Reduce3,
            5 => CompressionMethod::Reduce4,
            6 => CompressionMethod::Implode,
            8 => CompressionMethod::Deflate,
            9 => CompressionMethod::Deflate64,
            10 => CompressionMethod::PkwareImplode,
            12 => CompressionMethod::Bzip2,
            14 => CompressionMethod::Lzma,
            18 => CompressionMethod::Terse,
            19 => CompressionMethod::Lz77,
            97 => CompressionMethod::Wavpack,
            98 => CompressionMethod::Ppmd,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Shrink => 1,
            CompressionMethod::Reduce1 => 2,
            CompressionMethod::Reduce2 => 3,
            CompressionMethod::Reduce3 => 4,
            CompressionMethod::Reduce4 => 5,
            CompressionMethod::Implode => 6,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Deflate64 => 9,
            CompressionMethod::PkwareImplode => 10,
            CompressionMethod::Bzip2 => 12,
            CompressionMethod::Lzma => 14,
            CompressionMethod::Terse => 18,
            CompressionMethod::Lz77 => 19,
            CompressionMethod::Wavpack => 97,
            CompressionMethod::Ppmd => 98,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionMethod::Stored => "store",
            CompressionMethod::Shrink => "shrink",
            CompressionMethod::Reduce1 => "reduce1",
            CompressionMethod::Reduce2 => "reduce2",
            CompressionMethod::Reduce3 => "reduce3",
            CompressionMethod::Reduce4 => "reduce4",
            CompressionMethod::Implode => "implode",
            CompressionMethod::Deflate => "deflate",
            CompressionMethod::Deflate64 => "deflate64",
            CompressionMethod::PkwareImplode => "pkwareImplode",
            CompressionMethod::Bzip2 => "bzip2",
            CompressionMethod::Lzma => "lzma",
            CompressionMethod::Terse => "terse",
            CompressionMethod::Lz77 => "lz77",
            CompressionMethod::Wavpack => "wavpack",
            CompressionMethod::Ppmd => "ppmd",
            CompressionMethod::Unknown(v) => return write!(f, "{}", v),
        };
        f.write_str(name)
    }
}

/// A size or offset that is either stored in its classic 32-bit slot or,
/// when that slot holds the all-ones sentinel, in the ZIP64 extra field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field64 {
    Classic(u32),
    Extended(u64),
}

impl Field64 {
    /// Resolves a classic slot; `None` when the slot is sentineled and no
    /// extended value was supplied.
    pub fn resolve(raw: u32, extended: Option<u64>) -> Option<Self> {
        if raw == u32::MAX {
            extended.map(Field64::Extended)
        } else {
            Some(Field64::Classic(raw))
        }
    }

    pub fn get(self) -> u64 {
        match self {
            Field64::Classic(v) => v as u64,
            Field64::Extended(v) => v,
        }
    }

    pub fn is_extended(self) -> bool {
        matches!(self, Field64::Extended(_))
    }
}

/// Disk number with the same sentinel rule as [`Field64`], on 16/32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskNumber {
    Classic(u16),
    Extended(u32),
}

impl DiskNumber {
    pub fn resolve(raw: u16, extended: Option<u32>) -> Option<Self> {
        if raw == u16::MAX {
            extended.map(DiskNumber::Extended)
        } else {
            Some(DiskNumber::Classic(raw))
        }
    }

    pub fn get(self) -> u32 {
        match self {
            DiskNumber::Classic(v) => v as u32,
            DiskNumber::Extended(v) => v,
        }
    }
}

/// End of central directory, widened to 64 bits regardless of the record
/// it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndOfCentralDirectory {
    pub this_disk: u32,
    pub directory_start_disk: u32,
    pub records_on_this_disk: u64,
    pub total_records: u64,
    pub directory_size: u64,
    pub directory_offset: u64,
}

/// Central directory metadata kept for listing.
///
/// Byte ranges are never computed from these values; the local header is
/// authoritative for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub compression_method: CompressionMethod,
    pub flags: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub version_made_by: u16,
    pub external_attributes: u32,
}

impl EntryInfo {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }
}

/// One member of the archive, in central directory order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    /// Ordinal position in the central directory.
    pub index: usize,
    /// Member name as stored (or sanitized), not necessarily UTF-8.
    pub path: Vec<u8>,
    /// Absolute offset of the member's local file header.
    pub header_start: u64,
    pub info: EntryInfo,
}

impl MemberRecord {
    /// The path decoded lossily for display and matching.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }

    /// Directory entries end with '/'
    pub fn is_directory(&self) -> bool {
        self.path.last() == Some(&b'/')
    }
}
