//! ZIP archive reading.
//!
//! This module reads ZIP archives, including the ZIP64 extensions for large
//! archives, without ever moving a shared file cursor.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements
//! - [`records`]: Binary layouts of the records, ZIP64 extra field handling
//! - [`locator`]: Finding the End of Central Directory (EOCD) from the end
//! - [`directory`]: Walking the Central Directory into the member table
//! - [`member`]: Per-member decoding pipelines
//! - [`reader`]: The [`ZipReader`] facade
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The central directory is read once, when the archive is opened. The
//! local file header of a member is read again whenever the member is
//! plugged, because it decides where the member's bytes really start.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED, DEFLATE (and DEFLATE64 through the same decoder) and BZIP2
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support, such archives are rejected
//! - No archive writing

pub mod binary;
pub mod directory;
pub mod locator;
pub mod member;
pub mod options;
mod path;
pub mod reader;
pub mod records;
pub mod structures;

pub use locator::{DEFAULT_TAIL_WINDOW, Trailer, locate};
pub use member::{DecodeStage, MemberStream, PluggedFile};
pub use options::ReaderOptions;
pub use path::sanitize;
pub use reader::ZipReader;
pub use structures::*;
