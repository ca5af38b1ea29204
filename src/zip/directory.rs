//! Central directory index.
//!
//! Walks the central directory once, at open time, and keeps for every
//! member only what is needed to find it again: its position, its path and
//! the offset of its local header. Sizes are re-read from the local header
//! when the member is plugged.

use std::io::BufReader;
use std::sync::Arc;

use super::options::ReaderOptions;
use super::path::sanitize;
use super::records::CentralDirectoryFileHeader;
use super::structures::{CENTRAL_HEADER_MIN_SIZE, EndOfCentralDirectory, MemberRecord};
use crate::error::{Result, ZipError};
use crate::io::{BoundedView, ReadAt};

/// Parses the central directory described by `eocd`, in file order.
pub fn read_directory<R: ReadAt>(
    source: &Arc<R>,
    eocd: &EndOfCentralDirectory,
    options: &ReaderOptions,
) -> Result<Vec<MemberRecord>> {
    let archive = source.path();
    let size = source.size();

    let record_count = match options.limit {
        Some(limit) => eocd.records_on_this_disk.min(limit as u64),
        None => eocd.records_on_this_disk,
    };

    log::debug!(
        "Reading {} records out of {} from ZIP archive {}.",
        record_count,
        eocd.records_on_this_disk,
        archive.display()
    );

    let view = BoundedView::new(
        Arc::clone(source),
        eocd.directory_offset,
        eocd.directory_offset + eocd.directory_size,
    );
    let mut input = BufReader::new(view);

    // the declared count is untrusted; each entry needs at least a header
    let capacity = record_count.min(eocd.directory_size / CENTRAL_HEADER_MIN_SIZE);
    let mut records = Vec::with_capacity(capacity as usize);

    for index in 0..record_count as usize {
        let header = CentralDirectoryFileHeader::read(&mut input, archive)?;

        if header.disk_number_start.get() != eocd.this_disk {
            log::error!(
                "Unsupported format in zip file {}: multiple disks encountered.",
                archive.display()
            );
            return Err(ZipError::MultiDisk {
                archive: archive.to_path_buf(),
            });
        }

        let header_start = header.file_offset.get();
        if header_start >= size {
            return Err(ZipError::corrupt(
                archive,
                format!(
                    "local header of {} at offset {} lies beyond the end of the file",
                    String::from_utf8_lossy(&header.filename),
                    header_start
                ),
            ));
        }

        let info = header.info();
        let path = if options.sanitize_paths {
            sanitize(&header.filename)
        } else {
            header.filename
        };

        records.push(MemberRecord {
            index,
            path,
            header_start,
            info,
        });
    }

    Ok(records)
}
