//! Diagnostic logging backend. Kept deliberately separate from the
//! mandated report lines (those go straight to stdout via `println!` so
//! log-scraping tests don't depend on verbosity configuration).

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

/// Maps `-v` occurrence count to a `log` level, topping out at `Debug`.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

pub fn init(verbose: u8) {
    let level = level_for_verbosity(verbose);
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}
