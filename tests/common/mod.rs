//! Shared test utilities for integration tests.
//!
//! Archives are assembled byte by byte so tests control every field,
//! including the ZIP64 sentinels and deliberately inconsistent records.
//! Compressed payloads come from the `flate2` and `bzip2` encoders.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::sync::Arc;

use tempfile::NamedTempFile;
use zipview::{MemoryReader, ReaderOptions, ZipReader};

pub const LOCAL_SIG: u32 = 0x04034b50;
pub const CENTRAL_SIG: u32 = 0x02014b50;
pub const EOCD_SIG: u32 = 0x06054b50;
pub const EOCD64_SIG: u32 = 0x06064b50;
pub const LOCATOR_SIG: u32 = 0x07064b50;
pub const DESCRIPTOR_SIG: u32 = 0x08074b50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Store,
    Deflate,
    Bzip2,
    /// Deflate-compressed bytes under the deflate64 tag.
    Deflate64,
    /// Stores the data as-is under an arbitrary method tag.
    Tag(u16),
}

impl Method {
    fn tag(self) -> u16 {
        match self {
            Method::Store => 0,
            Method::Deflate => 8,
            Method::Bzip2 => 12,
            Method::Deflate64 => 9,
            Method::Tag(t) => t,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub name: Vec<u8>,
    pub data: Vec<u8>,
    pub method: Method,
    /// Extra bytes present only in the local header.
    pub local_extra: Vec<u8>,
    pub comment: Vec<u8>,
    pub data_descriptor: bool,
    pub disk: u16,
    /// Disk number carried in the ZIP64 extra field behind a 0xFFFF sentinel.
    pub wide_disk: Option<u32>,
}

impl Entry {
    pub fn new(name: impl AsRef<[u8]>, data: impl AsRef<[u8]>, method: Method) -> Self {
        Self {
            name: name.as_ref().to_vec(),
            data: data.as_ref().to_vec(),
            method,
            local_extra: Vec::new(),
            comment: Vec::new(),
            data_descriptor: false,
            disk: 0,
            wide_disk: None,
        }
    }

    pub fn local_extra(mut self, extra: &[u8]) -> Self {
        self.local_extra = extra.to_vec();
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn data_descriptor(mut self) -> Self {
        self.data_descriptor = true;
        self
    }

    pub fn disk(mut self, disk: u16) -> Self {
        self.disk = disk;
        self
    }

    pub fn wide_disk(mut self, disk: u32) -> Self {
        self.wide_disk = Some(disk);
        self
    }
}

/// Where a member landed in the built archive.
#[derive(Clone, Debug)]
pub struct BuiltMember {
    pub header_start: u64,
    pub data_start: u64,
    pub compressed: Vec<u8>,
}

pub struct Built {
    pub bytes: Vec<u8>,
    pub members: Vec<BuiltMember>,
    pub directory_offset: u64,
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Entry>,
    zip64: bool,
    drop_zip64_extra: bool,
    comment: Vec<u8>,
    lie_in_directory: bool,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Sentinel every classic size/offset field and carry the real values
    /// in ZIP64 records.
    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    /// With [`zip64`](Self::zip64): keep the sentinels but omit the ZIP64
    /// extra field from central directory entries.
    pub fn drop_zip64_extra(mut self) -> Self {
        self.drop_zip64_extra = true;
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Make the central directory declare wrong sizes.
    pub fn lie_in_directory(mut self) -> Self {
        self.lie_in_directory = true;
        self
    }

    pub fn build(&self) -> Built {
        let mut out = Vec::new();
        let mut members = Vec::new();

        for e in &self.entries {
            let header_start = out.len() as u64;
            let compressed = compress(e.method, &e.data);
            let crc = crc32(&e.data);
            let c_len = compressed.len() as u64;
            let u_len = e.data.len() as u64;

            let (local_c, local_u, local_crc) = if e.data_descriptor {
                (0u32, 0u32, 0u32)
            } else if self.zip64 {
                (u32::MAX, u32::MAX, crc)
            } else {
                (c_len as u32, u_len as u32, crc)
            };
            let mut extra = Vec::new();
            if self.zip64 && !e.data_descriptor {
                extra.extend(zip64_extra(&[u_len, c_len]));
            }
            extra.extend_from_slice(&e.local_extra);

            put_u32(&mut out, LOCAL_SIG);
            put_u16(&mut out, 45);
            put_u16(&mut out, if e.data_descriptor { 1 << 3 } else { 0 });
            put_u16(&mut out, e.method.tag());
            put_u16(&mut out, 0x6000); // 12:00
            put_u16(&mut out, 0x4b21); // 2017-09-01
            put_u32(&mut out, local_crc);
            put_u32(&mut out, local_c);
            put_u32(&mut out, local_u);
            put_u16(&mut out, e.name.len() as u16);
            put_u16(&mut out, extra.len() as u16);
            out.extend_from_slice(&e.name);
            out.extend_from_slice(&extra);

            let data_start = out.len() as u64;
            out.extend_from_slice(&compressed);

            if e.data_descriptor {
                put_u32(&mut out, DESCRIPTOR_SIG);
                put_u32(&mut out, crc);
                put_u32(&mut out, c_len as u32);
                put_u32(&mut out, u_len as u32);
            }

            members.push(BuiltMember {
                header_start,
                data_start,
                compressed,
            });
        }

        let directory_offset = out.len() as u64;
        for (e, m) in self.entries.iter().zip(&members) {
            let mut c_len = m.compressed.len() as u64;
            let u_len = e.data.len() as u64;
            if self.lie_in_directory && !e.data_descriptor {
                c_len += 1000;
            }

            let mut wide_values: Vec<u64> = Vec::new();
            if self.zip64 && !self.drop_zip64_extra {
                wide_values.extend([u_len, c_len, m.header_start]);
            }
            let mut extra = Vec::new();
            if !wide_values.is_empty() || e.wide_disk.is_some() {
                extra.extend(zip64_extra_with_disk(&wide_values, e.wide_disk));
            }
            let wide = |v: u64| if self.zip64 { u32::MAX } else { v as u32 };

            put_u32(&mut out, CENTRAL_SIG);
            put_u16(&mut out, 0x031e);
            put_u16(&mut out, 45);
            put_u16(&mut out, if e.data_descriptor { 1 << 3 } else { 0 });
            put_u16(&mut out, e.method.tag());
            put_u16(&mut out, 0x6000);
            put_u16(&mut out, 0x4b21);
            put_u32(&mut out, crc32(&e.data));
            put_u32(&mut out, wide(c_len));
            put_u32(&mut out, wide(u_len));
            put_u16(&mut out, e.name.len() as u16);
            put_u16(&mut out, extra.len() as u16);
            put_u16(&mut out, e.comment.len() as u16);
            put_u16(&mut out, if e.wide_disk.is_some() { u16::MAX } else { e.disk });
            put_u16(&mut out, 0);
            put_u32(&mut out, 0o100644 << 16);
            put_u32(&mut out, wide(m.header_start));
            out.extend_from_slice(&e.name);
            out.extend_from_slice(&extra);
            out.extend_from_slice(&e.comment);
        }
        let directory_size = out.len() as u64 - directory_offset;
        let count = self.entries.len() as u64;

        if self.zip64 {
            let eocd64_offset = out.len() as u64;
            put_u32(&mut out, EOCD64_SIG);
            put_u64(&mut out, 44);
            put_u16(&mut out, 45);
            put_u16(&mut out, 45);
            put_u32(&mut out, 0);
            put_u32(&mut out, 0);
            put_u64(&mut out, count);
            put_u64(&mut out, count);
            put_u64(&mut out, directory_size);
            put_u64(&mut out, directory_offset);

            put_u32(&mut out, LOCATOR_SIG);
            put_u32(&mut out, 0);
            put_u64(&mut out, eocd64_offset);
            put_u32(&mut out, 1);

            put_u32(&mut out, EOCD_SIG);
            put_u16(&mut out, 0);
            put_u16(&mut out, 0);
            put_u16(&mut out, u16::MAX);
            put_u16(&mut out, u16::MAX);
            put_u32(&mut out, u32::MAX);
            put_u32(&mut out, u32::MAX);
        } else {
            put_u32(&mut out, EOCD_SIG);
            put_u16(&mut out, 0);
            put_u16(&mut out, 0);
            put_u16(&mut out, count as u16);
            put_u16(&mut out, count as u16);
            put_u32(&mut out, directory_size as u32);
            put_u32(&mut out, directory_offset as u32);
        }
        put_u16(&mut out, self.comment.len() as u16);
        out.extend_from_slice(&self.comment);

        Built {
            bytes: out,
            members,
            directory_offset,
        }
    }
}

pub fn compress(method: Method, data: &[u8]) -> Vec<u8> {
    match method {
        Method::Store | Method::Tag(_) => data.to_vec(),
        Method::Deflate | Method::Deflate64 => {
            let mut enc =
                flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
        Method::Bzip2 => {
            let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
    }
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

pub fn zip64_extra(values: &[u64]) -> Vec<u8> {
    zip64_extra_with_disk(values, None)
}

pub fn zip64_extra_with_disk(values: &[u64], disk: Option<u32>) -> Vec<u8> {
    let mut out = Vec::new();
    put_u16(&mut out, 0x0001);
    put_u16(&mut out, (values.len() * 8 + disk.map_or(0, |_| 4)) as u16);
    for v in values {
        put_u64(&mut out, *v);
    }
    if let Some(disk) = disk {
        put_u32(&mut out, disk);
    }
    out
}

pub fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn put_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Deterministic, poorly compressible test payload.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// Compressible text payload.
pub fn text(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog\n"
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Writes `bytes` to a temporary file and opens it.
pub fn open(bytes: &[u8]) -> (NamedTempFile, ZipReader) {
    let file = write_temp(bytes);
    let zip = ZipReader::open(file.path()).unwrap();
    (file, zip)
}

pub fn open_memory(bytes: Vec<u8>, options: &ReaderOptions) -> zipview::Result<ZipReader<MemoryReader>> {
    ZipReader::new(Arc::new(MemoryReader::new(bytes, "memory.zip")), options)
}

pub fn read_member<R: zipview::ReadAt>(zip: &ZipReader<R>, index: usize) -> Vec<u8> {
    let mut out = Vec::new();
    zip.plug(index).unwrap().read_to_end(&mut out).unwrap();
    out
}
