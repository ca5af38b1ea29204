use clap::Parser;

use crate::zip::{DEFAULT_TAIL_WINDOW, ReaderOptions};

#[derive(Parser, Debug)]
#[command(name = "zipview")]
#[command(version)]
#[command(about = "List and extract ZIP archives, including ZIP64", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipview data1.zip -x joe        extract all files except joe from data1.zip\n  \
  zipview -p foo.zip | more       send contents of foo.zip via pipe into more\n  \
  zipview -v archive.zip          list files with methods and sizes")]
pub struct Cli {
    /// ZIP file path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely: method, sizes, ratio and date
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Normalize member paths (slashes, dot segments, leading root)
    #[arg(long)]
    pub sanitize: bool,

    /// Read at most this many central directory records
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Bytes at the end of the file searched for the end of central directory
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_TAIL_WINDOW)]
    pub tail_window: u64,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn reader_options(&self) -> ReaderOptions {
        let options = ReaderOptions::new()
            .sanitize_paths(self.sanitize)
            .tail_window(self.tail_window);
        match self.limit {
            Some(limit) => options.limit(limit),
            None => options,
        }
    }
}
