//! Instruction-file grammar and scanner: a thin, intentionally
//! unambitious text format: whitespace-separated tokens, one directive per
//! line, comments and blank lines ignored.

use std::io::BufRead;

use crate::error::InstructionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Switch { pid: u32 },
    Alloc { pid: u32, bytes: u32 },
    Access { pid: u32, va: u32 },
}

fn parse_hex(raw: &str, line: usize, field: &'static str) -> Result<u32, InstructionError> {
    let trimmed = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u32::from_str_radix(trimmed, 16).map_err(|_| InstructionError::MalformedField {
        line,
        field,
        raw: raw.to_string(),
    })
}

fn parse_pid(raw: &str, line: usize) -> Result<u32, InstructionError> {
    raw.parse::<u32>()
        .map_err(|_| InstructionError::MalformedField {
            line,
            field: "pid",
            raw: raw.to_string(),
        })
}

/// Parses a single line (1-based `line` for diagnostics). Returns `Ok(None)`
/// for blank lines and `#`-comments, which are silently skipped.
pub fn parse_line(raw: &str, line: usize) -> Result<Option<Instruction>, InstructionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = trimmed.split_whitespace();
    let pid_tok = tokens.next().ok_or(InstructionError::Empty { line })?;
    let command = tokens
        .next()
        .ok_or(InstructionError::Empty { line })?
        .to_ascii_lowercase();
    let pid = parse_pid(pid_tok, line)?;

    let instruction = match command.as_str() {
        "switch" => Instruction::Switch { pid },
        "alloc" => {
            let hex = tokens
                .next()
                .ok_or(InstructionError::MalformedField {
                    line,
                    field: "hex_bytes",
                    raw: trimmed.to_string(),
                })?;
            Instruction::Alloc {
                pid,
                bytes: parse_hex(hex, line, "hex_bytes")?,
            }
        }
        "access" => {
            let hex = tokens
                .next()
                .ok_or(InstructionError::MalformedField {
                    line,
                    field: "hex_virtual_address",
                    raw: trimmed.to_string(),
                })?;
            Instruction::Access {
                pid,
                va: parse_hex(hex, line, "hex_virtual_address")?,
            }
        }
        other => {
            return Err(InstructionError::UnknownCommand {
                line,
                command: other.to_string(),
            })
        }
    };
    Ok(Some(instruction))
}

/// Scans every line of `reader`, yielding `(line_number, result)` pairs so
/// the driver can log a warning and keep going on a malformed line without
/// aborting the whole run.
pub fn scan(reader: impl BufRead) -> impl Iterator<Item = (usize, Result<Instruction, InstructionError>)> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line_no = idx + 1;
            let raw = match line {
                Ok(raw) => raw,
                Err(_) => return None,
            };
            match parse_line(&raw, line_no) {
                Ok(Some(instr)) => Some((line_no, Ok(instr))),
                Ok(None) => None,
                Err(e) => Some((line_no, Err(e))),
            }
        })
}
