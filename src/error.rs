//! Error taxonomy. Only fatal configuration/IO-level failures are `Result`
//! types; per-operation recoverable outcomes use `Option`/`bool`/sentinels
//! as plain `Option`/`bool`/sentinel return values instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("page size {0} is not a power of two")]
    PageSizeNotPowerOfTwo(u32),

    #[error("virtual address width {address_bits} does not leave room for a page offset of {offset_bits} bits")]
    AddressWidthTooNarrow { address_bits: u32, offset_bits: u32 },

    #[error("physical memory of {bytes} bytes holds zero frames at page size {page_size}")]
    NoPhysicalFrames { bytes: u64, page_size: u32 },

    #[error("at least one process memory size must be given")]
    NoProcesses,

    #[error("process {pid} requires {needed} frames but physical memory has only {available}")]
    TooManyFramesRequested {
        pid: u32,
        needed: u64,
        available: u64,
    },

    #[error("process {pid} could not be given its initial {wanted} frames from the free pool (only {available} free)")]
    InsufficientFrames {
        pid: u32,
        wanted: u32,
        available: u32,
    },
}

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("unknown process id {0}")]
    UnknownProcess(u32),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame {frame} is out of range for a pool of {total} frames")]
    InvalidFrame { frame: u32, total: u32 },
}

#[derive(Debug, Error)]
pub enum InstructionError {
    #[error("line {line}: empty instruction")]
    Empty { line: usize },

    #[error("line {line}: unrecognized command {command:?}")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: malformed field {field:?} in {raw:?}")]
    MalformedField {
        line: usize,
        field: &'static str,
        raw: String,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error("failed to read instruction file {path}: {source}")]
    InstructionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
