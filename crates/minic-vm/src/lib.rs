//! Back half of the minic pipeline: the virtual machine.
//!
//! The machine is a word interpreter over the compiled code pool with a
//! flat byte-addressable guest memory (data image, heap, stack) and a
//! closed syscall surface for I/O, allocation, and process exit:
//! - [`machine`] - guest memory, registers, frames, allocation
//! - [`execute`] - the dispatch loop and optional instruction trace
//! - [`syscall`] - host-side file descriptors and formatted print

pub mod error;
pub mod execute;
pub mod machine;
pub mod syscall;

pub use error::RuntimeError;
pub use execute::{HALT, run};
pub use machine::{Machine, MachineConfig};
pub use syscall::HostIo;
