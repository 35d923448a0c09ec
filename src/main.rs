use std::io;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use ls8::memory::parse::LoadError;
use ls8::memory::Memory;
use ls8::processor::Processor;

/// Runs an LS-8 program image
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "ls8")]
struct Options {
    /// Program image, one binary byte per line
    program: PathBuf,
    /// Log every executed instruction
    #[arg(long, conflicts_with = "trace")]
    verbose: bool,
    /// Log the machine state before every instruction
    #[arg(long)]
    trace: bool,
    /// Stop with a fault after this many instructions
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,
}

impl Options {
    fn level(&self) -> LevelFilter {
        if self.trace {
            LevelFilter::Trace
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling

    let options = Options::parse();
    SimpleLogger::new().with_level(options.level()).init()?; // logging

    let mut mem = match Memory::from_file(&options.program) {
        Ok(mem) => mem,
        Err(LoadError::NotFound(path)) => {
            eprintln!("We did not find file {}", path.display());
            return Ok(());
        }
        Err(err) => {
            return Err(err)
                .wrap_err_with(|| format!("failed to load `{}`", options.program.display()))
        }
    };
    let mut cpu = Processor::new();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match options.max_steps {
        Some(max_steps) => cpu.execute_with_budget(&mut mem, &mut out, max_steps),
        None => cpu.execute_until_hlt(&mut mem, &mut out),
    };

    result.wrap_err_with(|| {
        format!(
            "`{}` stopped at 0x{:02X} after {} instructions",
            options.program.display(),
            cpu.pc,
            cpu.steps
        )
    })
}
