//! Command-line front end: argument parsing and validation into a `Config`.
//!
//! The grammar is `<page_size> <va_bits> <phys_mem_bytes> <tlb_size>
//! <mem_size>... <instruction_file>` — a fixed prefix of four values
//! followed by one-or-more memory sizes and exactly one trailing file path.
//! `clap` has no way to declare two independently-variadic positionals, so
//! the last positional here swallows everything after the fixed prefix and
//! `Cli::into_config` performs the final mem-sizes/file split itself. A
//! consequence of `trailing_var_arg`: once that positional starts consuming
//! arguments, anything after it is taken verbatim, flags included.
//! `--json-stats` and `-v`/`--verbose` must therefore be given before the
//! fixed prefix, not interleaved after it.

use std::path::PathBuf;

use clap::Parser;

use crate::error::ConfigError;
use crate::geometry::AddressGeometry;

#[derive(Debug, Parser)]
#[command(
    name = "vmsim",
    version,
    about = "Simulates a paging virtual-memory subsystem: two-level page tables, CLOCK replacement, and a TLB"
)]
pub struct Cli {
    /// Page size in bytes (must be a power of two).
    pub page_size: u32,

    /// Virtual address width in bits.
    pub virtual_address_bits: u32,

    /// Total physical memory in bytes.
    pub physical_memory_bytes: u64,

    /// Number of entries the TLB can hold.
    pub tlb_size: usize,

    /// One or more process memory sizes (bytes), followed by the
    /// instruction file path as the final token.
    #[arg(trailing_var_arg = true, num_args = 1.., required = true)]
    pub trailing: Vec<String>,

    /// Print the final statistics block as JSON instead of plain text.
    #[arg(long)]
    pub json_stats: bool,

    /// Increase diagnostic log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub geometry: AddressGeometry,
    pub physical_memory_bytes: u64,
    pub num_frames: u32,
    pub tlb_size: usize,
    pub process_mem_sizes: Vec<u32>,
    pub instruction_file: PathBuf,
}

impl Cli {
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let geometry = AddressGeometry::new(self.page_size, self.virtual_address_bits).ok_or(
            ConfigError::PageSizeNotPowerOfTwo(self.page_size),
        )?;

        let num_frames = self.physical_memory_bytes / self.page_size as u64;
        if num_frames == 0 {
            return Err(ConfigError::NoPhysicalFrames {
                bytes: self.physical_memory_bytes,
                page_size: self.page_size,
            });
        }
        let num_frames = u32::try_from(num_frames).unwrap_or(u32::MAX);

        let Some((instruction_file, mem_size_tokens)) = self.trailing.split_last() else {
            return Err(ConfigError::NoProcesses);
        };
        if mem_size_tokens.is_empty() {
            return Err(ConfigError::NoProcesses);
        }

        let mut process_mem_sizes = Vec::with_capacity(mem_size_tokens.len());
        for (pid, token) in mem_size_tokens.iter().enumerate() {
            let mem_size: u32 = token
                .parse()
                .map_err(|_| ConfigError::NoProcesses)?;
            let needed_pages = (mem_size as u64).div_ceil(self.page_size as u64);
            if needed_pages > num_frames as u64 {
                return Err(ConfigError::TooManyFramesRequested {
                    pid: pid as u32,
                    needed: needed_pages,
                    available: num_frames as u64,
                });
            }
            process_mem_sizes.push(mem_size);
        }

        Ok(Config {
            geometry,
            physical_memory_bytes: self.physical_memory_bytes,
            num_frames,
            tlb_size: self.tlb_size,
            process_mem_sizes,
            instruction_file: PathBuf::from(instruction_file),
        })
    }
}
