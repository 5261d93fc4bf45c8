use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use clap::Parser;

use vmsim::cli::Cli;
use vmsim::error::AppError;
use vmsim::instructions::{self, Instruction};
use vmsim::logging;
use vmsim::simulator::Simulator;

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let json_stats = cli.json_stats;
    let config = cli.into_config()?;
    let num_processes = config.process_mem_sizes.len() as u32;
    let instruction_file = config.instruction_file.clone();

    let mut sim = Simulator::new(&config)?;

    let file = File::open(&instruction_file).map_err(|source| AppError::InstructionFile {
        path: instruction_file.clone(),
        source,
    })?;
    let reader = BufReader::new(file);

    for (line_no, result) in instructions::scan(reader) {
        let instruction = match result {
            Ok(instruction) => instruction,
            Err(e) => {
                log::warn!("skipping line {line_no}: {e}");
                continue;
            }
        };

        let pid = match instruction {
            Instruction::Switch { pid } => pid,
            Instruction::Alloc { pid, .. } => pid,
            Instruction::Access { pid, .. } => pid,
        };
        if pid >= num_processes {
            log::warn!("line {line_no}: instruction names unknown process {pid}, skipping");
            continue;
        }

        match instruction {
            Instruction::Switch { pid } => sim.switch_process(pid)?,
            Instruction::Alloc { pid, bytes } => {
                if pid != sim.current_pid() {
                    log::warn!(
                        "line {line_no}: alloc for process {pid} while process {} is current, skipping",
                        sim.current_pid()
                    );
                    continue;
                }
                sim.allocate_memory(bytes);
            }
            Instruction::Access { pid, va } => {
                if pid != sim.current_pid() {
                    log::warn!(
                        "line {line_no}: access for process {pid} while process {} is current, skipping",
                        sim.current_pid()
                    );
                    continue;
                }
                sim.access_memory(va);
            }
        }
    }

    print_reports(&sim, json_stats);
    Ok(())
}

fn print_reports(sim: &Simulator, json_stats: bool) {
    let reports = sim.reports();
    if json_stats {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("failed to serialize statistics: {e}"),
        }
        return;
    }

    for report in reports {
        println!("Process {}:", report.pid);
        println!("  accesses:     {}", report.accesses);
        println!("  tlb hits:     {}", report.tlb_hits);
        println!("  tlb misses:   {}", report.tlb_misses);
        println!("  pt hits:      {}", report.pt_hits);
        println!("  pt misses:    {}", report.pt_misses);
        println!("  tlb hit rate: {:.4}", report.tlb_hit_rate);
        println!("  pt hit rate:  {:.4}", report.pt_hit_rate);
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
