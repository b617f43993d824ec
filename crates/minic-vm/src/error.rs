use thiserror::Error;

use minic_core::Word;

/// Terminal runtime errors. The interpreter has no recovery: the first
/// error ends the run, and the driver maps it to exit code -1.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum RuntimeError {
    #[error("unknown instruction = {op}! cycle = {cycle}")]
    UnknownInstruction { op: Word, cycle: u64 },
    #[error("program counter out of range! cycle = {cycle}")]
    PcOutOfRange { cycle: u64 },
    #[error("bad address = {addr}! cycle = {cycle}")]
    BadAddress { addr: Word, cycle: u64 },
    #[error("stack overflow! cycle = {cycle}")]
    StackOverflow { cycle: u64 },
    #[error("stack underflow! cycle = {cycle}")]
    StackUnderflow { cycle: u64 },
    #[error("out of memory! cycle = {cycle}")]
    OutOfMemory { cycle: u64 },
    #[error("division by zero! cycle = {cycle}")]
    DivisionByZero { cycle: u64 },
}
