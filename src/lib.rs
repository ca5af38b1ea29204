//! # zipview
//!
//! A ZIP central-directory reader whose member streams read the archive
//! through independent positional windows.
//!
//! Opening an archive locates the end of central directory record (and its
//! ZIP64 counterpart when present), then builds an ordered table of members.
//! Each member can then be plugged into a decoding pipeline, any number of
//! times, in any order and from any number of threads: all reads of the
//! underlying file are positional, so streams never disturb each other.
//!
//! ## Features
//!
//! - Local files and in-memory archives through the [`ReadAt`] trait
//! - ZIP64 archives (more than 65535 members, members or offsets beyond 4GB)
//! - STORED, DEFLATE, DEFLATE64 and BZIP2 members
//! - Typed errors separating format problems from operating system faults
//!
//! ## Example
//!
//! ```no_run
//! use std::io::Read;
//! use zipview::ZipReader;
//!
//! let zip = ZipReader::open("archive.zip")?;
//! let index = zip.find("docs/readme.txt")?;
//!
//! let mut file = zip.plug(index)?;
//! let mut text = String::new();
//! file.read_to_string(&mut text)?;
//! println!("{} ({} bytes)", file.name(), file.uncompressed_size);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::{ReadFault, Result, ZipError};
pub use io::{BoundedView, LocalFileReader, MemoryReader, ReadAt};
pub use zip::{
    CompressionMethod, EntryInfo, MemberRecord, MemberStream, PluggedFile, ReaderOptions,
    ZipReader,
};
