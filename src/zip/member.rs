//! Member decompression pipelines.
//!
//! Plugging a member re-reads its local file header, which is authoritative
//! for where the compressed bytes start and how many there are, and then
//! stacks the decoder chosen by the compression method on top of a
//! [`BoundedView`] over exactly those bytes.

use bzip2::read::BzDecoder;
use flate2::bufread::DeflateDecoder;
use std::borrow::Cow;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::sync::Arc;

use super::records::LocalFileHeader;
use super::structures::*;
use crate::error::{Result, ZipError};
use crate::io::{BoundedView, ReadAt};

/// The decoding step placed in front of a member's raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Identity,
    /// Raw deflate, no zlib wrapper.
    Inflate,
    Bzip2,
}

impl DecodeStage {
    /// The stage able to decode `method`, if any.
    pub fn for_method(method: CompressionMethod) -> Option<Self> {
        match method {
            CompressionMethod::Stored => Some(DecodeStage::Identity),
            // deflate64 goes through plain inflate, which handles streams
            // that stay within a 32 KiB window
            CompressionMethod::Deflate | CompressionMethod::Deflate64 => {
                Some(DecodeStage::Inflate)
            }
            CompressionMethod::Bzip2 => Some(DecodeStage::Bzip2),
            _ => None,
        }
    }
}

/// A member's content stream.
pub enum MemberStream<R: ReadAt> {
    Stored(BoundedView<R>),
    Deflate(DeflateDecoder<BufReader<BoundedView<R>>>),
    Bzip2(BzDecoder<BoundedView<R>>),
}

impl<R: ReadAt> MemberStream<R> {
    fn new(stage: DecodeStage, view: BoundedView<R>) -> Self {
        match stage {
            DecodeStage::Identity => MemberStream::Stored(view),
            DecodeStage::Inflate => MemberStream::Deflate(DeflateDecoder::new(BufReader::new(view))),
            DecodeStage::Bzip2 => MemberStream::Bzip2(BzDecoder::new(view)),
        }
    }

    pub fn stage(&self) -> DecodeStage {
        match self {
            MemberStream::Stored(_) => DecodeStage::Identity,
            MemberStream::Deflate(_) => DecodeStage::Inflate,
            MemberStream::Bzip2(_) => DecodeStage::Bzip2,
        }
    }
}

impl<R: ReadAt> std::fmt::Debug for MemberStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberStream")
            .field("stage", &self.stage())
            .finish_non_exhaustive()
    }
}

impl<R: ReadAt> Read for MemberStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            MemberStream::Stored(view) => view.read(buf),
            MemberStream::Deflate(decoder) => decoder.read(buf),
            MemberStream::Bzip2(decoder) => decoder.read(buf),
        }
    }
}

/// Stored members seek within their own bytes; compressed ones cannot seek.
impl<R: ReadAt> Seek for MemberStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            MemberStream::Stored(view) => view.seek(pos),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "compressed member streams are not seekable",
            )),
        }
    }
}

/// A member plugged into its decoding pipeline.
#[derive(Debug)]
pub struct PluggedFile<R: ReadAt> {
    pub path: Vec<u8>,
    /// Size declared by the archive; not checked against the decoded bytes.
    pub uncompressed_size: u64,
    /// Whether [`stream`](Self::stream) supports [`Seek`].
    pub seekable: bool,
    pub stream: MemberStream<R>,
}

impl<R: ReadAt> PluggedFile<R> {
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }

    pub fn into_stream(self) -> MemberStream<R> {
        self.stream
    }
}

impl<R: ReadAt> Read for PluggedFile<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

/// Byte range of a member's compressed data plus the header it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRange {
    pub header: LocalFileHeader,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub start: u64,
    pub end: u64,
}

/// Reads the local header of `record` and computes its data range.
pub fn data_range<R: ReadAt>(source: &Arc<R>, record: &MemberRecord) -> Result<DataRange> {
    let archive = source.path();
    let size = source.size();

    let header_start = record.header_start;
    let header_end = header_start
        .saturating_add(LOCAL_HEADER_SIZE + MAX_NAME_SIZE + MAX_EXTRA_SIZE)
        .min(size);
    let probe = BoundedView::new(Arc::clone(source), header_start, header_end);
    let header = LocalFileHeader::read(&mut BufReader::new(probe), archive)?;

    let (compressed_size, uncompressed_size) = if header.has_data_descriptor() {
        log::debug!(
            "Member {} in {} uses a data descriptor, taking sizes from the central directory.",
            record.name(),
            archive.display()
        );
        (record.info.compressed_size, record.info.uncompressed_size)
    } else {
        (header.compressed_size.get(), header.uncompressed_size.get())
    };

    let start = header_start + header.size();
    let end = start
        .checked_add(compressed_size)
        .filter(|&end| end <= size)
        .ok_or_else(|| {
            ZipError::corrupt(
                archive,
                format!(
                    "data of {} ({} bytes at offset {}) runs past the end of the file",
                    record.name(),
                    compressed_size,
                    start
                ),
            )
        })?;

    Ok(DataRange {
        header,
        compressed_size,
        uncompressed_size,
        start,
        end,
    })
}

/// Builds the decoding pipeline for `record`.
pub fn plug<R: ReadAt>(source: &Arc<R>, record: &MemberRecord) -> Result<PluggedFile<R>> {
    let archive = source.path();
    let range = data_range(source, record)?;

    let method = range.header.compression_method;
    let stage = DecodeStage::for_method(method).ok_or_else(|| {
        log::error!(
            "Unsupported compression method <{}> for file {} in the zip file {}.",
            method,
            record.name(),
            archive.display()
        );
        ZipError::UnsupportedMethod {
            archive: archive.to_path_buf(),
            member: record.name().into_owned(),
            method,
        }
    })?;

    let view = BoundedView::new(Arc::clone(source), range.start, range.end);
    Ok(PluggedFile {
        path: record.path.clone(),
        uncompressed_size: range.uncompressed_size,
        seekable: stage == DecodeStage::Identity,
        stream: MemberStream::new(stage, view),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_table() {
        use CompressionMethod::*;
        assert_eq!(DecodeStage::for_method(Stored), Some(DecodeStage::Identity));
        assert_eq!(DecodeStage::for_method(Deflate), Some(DecodeStage::Inflate));
        assert_eq!(DecodeStage::for_method(Deflate64), Some(DecodeStage::Inflate));
        assert_eq!(DecodeStage::for_method(Bzip2), Some(DecodeStage::Bzip2));
        for method in [Shrink, Implode, Lzma, Ppmd, Unknown(200)] {
            assert_eq!(DecodeStage::for_method(method), None);
        }
    }
}
