//! Driver tying the pipeline together: compile a source file, load the
//! data image into a fresh machine, marshal the guest's `argc`/`argv`,
//! and run `main` to an exit code.

use std::io::Write;

use thiserror::Error;

use minic_core::{SourceFile, WORD_BYTES, Word};
use minic_lang::{CompileError, Compiler, Program};
use minic_vm::{HALT, HostIo, Machine, RuntimeError, execute};

pub use minic_vm::MachineConfig;

/// Anything that can end a session: a compile-time diagnostic or a
/// guest runtime error. Both render as the one-line message the CLI
/// prints before exiting with -1.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// One compile-and-run configuration.
#[derive(Default)]
pub struct Session {
    config: MachineConfig,
    trace: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the guest arena sizes.
    pub fn with_config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Trace each instruction before executing it.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Source-listing mode: compile only, replaying each line and the
    /// code emitted for it to `out`. Nothing is executed.
    pub fn list(&self, source: &SourceFile, out: &mut dyn Write) -> Result<(), Error> {
        Compiler::new(source).with_listing(out).compile()?;
        Ok(())
    }

    /// Compile and run. Guest output (and the `-d` trace) goes to
    /// `out`; `args` become the guest's argv tail after the source
    /// name. Returns the guest exit code.
    pub fn run(
        &self,
        source: &SourceFile,
        args: &[&str],
        out: &mut dyn Write,
    ) -> Result<Word, Error> {
        let program = Compiler::new(source).compile()?;
        let mut machine = Machine::with_config(&program.data, self.config);

        let (argc, argv) = load_args(&mut machine, source.name(), args)?;
        machine.push(argc)?;
        machine.push(argv)?;
        machine.push(HALT)?;

        let mut io = HostIo::new(out);
        let code = execute::run(
            &mut machine,
            &program.code,
            program.entry,
            &mut io,
            self.trace,
        )?;
        Ok(code)
    }

    /// Compile without running; exposed for tools that only want the
    /// program image.
    pub fn compile(&self, source: &SourceFile) -> Result<Program, Error> {
        Ok(Compiler::new(source).compile()?)
    }
}

/// Copy the program name and arguments into guest memory and build the
/// `argv` array. The guest sees `argv[0]` as the source path, matching
/// what a host shell would pass.
fn load_args(
    machine: &mut Machine,
    name: &str,
    args: &[&str],
) -> Result<(Word, Word), RuntimeError> {
    let mut ptrs = Vec::with_capacity(args.len() + 1);
    ptrs.push(copy_in(machine, name.as_bytes())?);
    for arg in args {
        ptrs.push(copy_in(machine, arg.as_bytes())?);
    }

    let argv = machine.alloc(ptrs.len() as Word * WORD_BYTES);
    if argv == 0 {
        return Err(RuntimeError::OutOfMemory { cycle: 0 });
    }
    for (i, &ptr) in ptrs.iter().enumerate() {
        machine.store_word(argv + i as Word * WORD_BYTES, ptr)?;
    }
    Ok((ptrs.len() as Word, argv))
}

/// Allocate and fill one zero-terminated guest string.
fn copy_in(machine: &mut Machine, bytes: &[u8]) -> Result<Word, RuntimeError> {
    let addr = machine.alloc(bytes.len() as Word + 1);
    if addr == 0 {
        return Err(RuntimeError::OutOfMemory { cycle: 0 });
    }
    machine.bytes_mut(addr, bytes.len() as Word)?.copy_from_slice(bytes);
    // The arena is zeroed, so the terminator is already in place.
    Ok(addr)
}
