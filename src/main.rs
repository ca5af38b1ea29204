//! Main entry point for the zipview CLI application.
//!
//! This binary lists and extracts ZIP archives through [`ZipReader`].

use anyhow::{Result, bail};
use clap::Parser;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use zipview::{Cli, MemberRecord, ZipReader};

/// Application entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let zip = ZipReader::open_with_options(&cli.file, &cli.reader_options())?;
    process_zip(&zip, &cli)
}

/// Process a ZIP archive based on CLI options.
///
/// This function handles both listing and extraction modes:
/// - List mode (`-l` or `-v`): Display archive contents
/// - Extract mode: Extract files matching the specified filters
///
/// A member that cannot be extracted is reported and skipped; the run
/// fails at the end if any member failed.
fn process_zip(zip: &ZipReader, cli: &Cli) -> Result<()> {
    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        list_files(zip, cli.verbose);
        return Ok(());
    }

    // Apply filters to determine which files to extract:
    // 1. Skip directories (they are created automatically during extraction)
    // 2. If specific files are requested, only include matching entries
    // 3. Exclude files matching the exclusion patterns
    let files_to_extract: Vec<_> = zip
        .files()
        .iter()
        .filter(|e| !e.is_directory() && is_selected(&e.name(), cli))
        .collect();

    let multiple_files = cli.pipe && files_to_extract.len() > 1;
    let mut failed = 0usize;
    for entry in files_to_extract {
        if let Err(e) = extract_file(zip, entry, cli, multiple_files) {
            eprintln!("error: {:#}", e);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} file(s) could not be extracted from {}", failed, cli.file);
    }
    Ok(())
}

/// Whether `name` passes the positional selection and the `-x` exclusions.
fn is_selected(name: &str, cli: &Cli) -> bool {
    // If specific files are requested via positional arguments,
    // only include entries that match
    if !cli.files.is_empty() {
        let matches = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                glob_match(f, name)
            } else {
                // No wildcards: exact match on filename or full path
                let basename = Path::new(name)
                    .file_name()
                    .map(|s| s.to_string_lossy())
                    .unwrap_or_default();
                name == f || basename == *f
            }
        });
        if !matches {
            return false;
        }
    }

    !cli
        .exclude
        .iter()
        .any(|x| name.contains(x.as_str()) || glob_match(x, name))
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Method, sizes, compression ratio and timestamp
fn list_files(zip: &ZipReader, verbose: bool) {
    if verbose {
        println!(
            "{:>10}  {:<9}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Method", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(80));
    }

    // Track totals for summary line
    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in zip.files() {
        if !verbose {
            println!("{}", entry.name());
            continue;
        }

        let info = &entry.info;
        let (year, month, day) = info.mod_date();
        let (hour, minute, _second) = info.mod_time();
        println!(
            "{:>10}  {:<9}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            info.uncompressed_size,
            info.compression_method.to_string(),
            info.compressed_size,
            ratio(info.compressed_size, info.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.name()
        );

        // Accumulate totals (excluding directories)
        if !entry.is_directory() {
            total_uncompressed += info.uncompressed_size;
            total_compressed += info.compressed_size;
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(80));
        println!(
            "{:>10}  {:<9}  {:>10}  {}  {:>18}  {} files",
            total_uncompressed,
            "",
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }
}

/// Compression ratio as percentage saved.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    let saved = if uncompressed == 0 || compressed >= uncompressed {
        0
    } else {
        (uncompressed - compressed) as u128 * 100 / uncompressed as u128
    };
    format!("{:>4}%", saved)
}

/// Extract a single file from the archive.
///
/// Handles various extraction options:
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
fn extract_file(
    zip: &ZipReader,
    entry: &MemberRecord,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    let name = entry.name();

    // Pipe mode: write file contents directly to stdout
    if cli.pipe {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if show_filename {
            writeln!(out, "--- {} ---", name)?;
        }
        zip.extract_to(entry.index, &mut out)?;
        out.flush()?;
        return Ok(());
    }

    let relative = match output_name(&name, cli.junk_paths) {
        Some(relative) => relative,
        None => {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (unsafe path)", name);
            }
            return Ok(());
        }
    };
    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(relative),
        None => relative,
    };

    // Handle existing files based on overwrite options
    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (file exists)", name);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", name);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", name);
    }

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(fs::File::create(&output_path)?);
    zip.extract_to(entry.index, &mut out)?;
    out.flush()?;

    Ok(())
}

/// Relative output path for a member, or `None` when the member path
/// would escape the extraction directory.
fn output_name(name: &str, junk_paths: bool) -> Option<PathBuf> {
    let mut parts = Vec::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return None,
            s => parts.push(s),
        }
    }

    if junk_paths {
        return parts.last().map(PathBuf::from);
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.iter().collect())
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            // Both exhausted: match successful
            (None, None) => true,
            // Star matches zero or more characters
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            // Question mark matches exactly one character
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}
