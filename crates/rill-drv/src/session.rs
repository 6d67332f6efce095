//! One end-to-end run of the front-end: read the file, lex, parse, and (for
//! `RunMode::Run`) execute, printing whatever the config's flags ask for
//! along the way.

use std::time::Instant;

use rill_bc::Instruction;
use rill_lex::Token;
use tracing::info;

use crate::config::{Config, RunMode, TimingDisplay};
use crate::error::{DrvError, Result};

pub struct Session {
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session { config }
    }

    pub fn run(&self) -> Result<()> {
        let source = std::fs::read_to_string(&self.config.input)?;
        let module = module_name(&self.config.input);

        let lex_start = Instant::now();
        let (tokens, lex_errors) = rill_lex::lex(&source, &module);
        let lex_elapsed = lex_start.elapsed();

        if self.config.show_tokens {
            print_tokens(&tokens);
        }
        if !lex_errors.is_empty() {
            return Err(DrvError::Lex(lex_errors));
        }
        self.report_timing("lex", lex_elapsed);

        if self.config.run_mode == RunMode::LexOnly {
            return Ok(());
        }

        let parse_start = Instant::now();
        let (program, parse_errors) = rill_par::emit_program(&tokens);
        let parse_elapsed = parse_start.elapsed();

        if self.config.show_parsed {
            print_program(&program, self.config.show_parsed_queue);
        }
        if !parse_errors.is_empty() {
            return Err(DrvError::Parse(parse_errors));
        }
        self.report_timing("parse", parse_elapsed);

        if self.config.run_mode == RunMode::LexAndParseOnly {
            return Ok(());
        }

        let run_start = Instant::now();
        let mut vm = rill_vm::Vm::new(&program);
        if self.config.vm_trace {
            vm.run_with_hooks(&mut TracingHook)?;
        } else {
            vm.run()?;
        }
        self.report_timing("run", run_start.elapsed());
        Ok(())
    }

    fn report_timing(&self, phase: &str, elapsed: std::time::Duration) {
        match self.config.timing {
            TimingDisplay::Off => {}
            TimingDisplay::Seconds => info!(phase, seconds = elapsed.as_secs_f64(), "phase complete"),
            TimingDisplay::Millis => info!(phase, millis = elapsed.as_millis(), "phase complete"),
        }
    }
}

/// The `-t1` VM trace hook: every tick logs at `trace` level via the same
/// `tracing` subscriber the rest of the driver uses, so `RUST_LOG=trace`
/// turns it on without a bespoke flag-to-println wire-up.
struct TracingHook;

impl rill_vm::EventHook for TracingHook {
    fn on_tick(&mut self, instructions_run: u64) -> rill_vm::HookDecision {
        tracing::trace!(instructions_run, "vm tick");
        rill_vm::HookDecision::Continue
    }
}

fn module_name(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}

fn print_tokens(tokens: &[Token]) {
    for (i, tok) in tokens.iter().enumerate() {
        println!("{i:>4}  {:?}", tok.kind);
    }
}

fn print_program(program: &[Instruction], show_queue: bool) {
    for (i, ins) in program.iter().enumerate() {
        println!("{i:>4}  {}", ins.opcode);
    }
    if show_queue {
        println!("({} instructions total)", program.len());
    }
}
