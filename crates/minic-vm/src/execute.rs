//! The interpreter loop.
//!
//! One flat dispatch over the code pool. Jump operands are absolute
//! code-pool indices; a return address equal to [`HALT`] ends the run
//! with the accumulator as the exit code, which is how the driver's
//! sentinel frame makes `main` returning equivalent to calling `exit`.

use minic_core::{Op, WORD_BYTES, Word};

use crate::error::RuntimeError;
use crate::machine::Machine;
use crate::syscall::{HostIo, PRINTF_WINDOW};

/// Sentinel return address pushed beneath `main`'s frame.
pub const HALT: Word = -1;

fn fetch(code: &[Word], pc: usize, cycle: u64) -> Result<Word, RuntimeError> {
    code.get(pc)
        .copied()
        .ok_or(RuntimeError::PcOutOfRange { cycle })
}

fn target(addr: Word) -> usize {
    // A bogus (negative) target turns into an out-of-range pc, which
    // the next fetch reports.
    usize::try_from(addr).unwrap_or(usize::MAX)
}

/// Execute `code` from `entry` until the sentinel frame is left, the
/// guest calls `exit`, or a runtime error ends the run. Returns the
/// guest's exit code.
pub fn run(
    machine: &mut Machine,
    code: &[Word],
    entry: usize,
    io: &mut HostIo<'_>,
    trace: bool,
) -> Result<Word, RuntimeError> {
    let mut pc = entry;
    loop {
        let word = fetch(code, pc, machine.cycle())?;
        let cycle = machine.bump_cycle();
        let Some(op) = Op::from_word(word) else {
            return Err(RuntimeError::UnknownInstruction { op: word, cycle });
        };

        if trace {
            let operand = if op.takes_operand() {
                Some(fetch(code, pc + 1, cycle)?)
            } else {
                None
            };
            io.trace(cycle, op, operand);
        }

        match op {
            Op::Lea => {
                let n = fetch(code, pc + 1, cycle)?;
                machine.set_a(machine.bp().wrapping_add(n.wrapping_mul(WORD_BYTES)));
                pc += 2;
            }
            Op::Imm => {
                let n = fetch(code, pc + 1, cycle)?;
                machine.set_a(n);
                pc += 2;
            }
            Op::Jmp => {
                let n = fetch(code, pc + 1, cycle)?;
                pc = target(n);
            }
            Op::Jsr => {
                let n = fetch(code, pc + 1, cycle)?;
                machine.push((pc + 2) as Word)?;
                pc = target(n);
            }
            Op::Bz => {
                let n = fetch(code, pc + 1, cycle)?;
                pc = if machine.a() == 0 { target(n) } else { pc + 2 };
            }
            Op::Bnz => {
                let n = fetch(code, pc + 1, cycle)?;
                pc = if machine.a() != 0 { target(n) } else { pc + 2 };
            }
            Op::Ent => {
                let n = fetch(code, pc + 1, cycle)?;
                machine.enter_frame(n)?;
                pc += 2;
            }
            Op::Adj => {
                let n = fetch(code, pc + 1, cycle)?;
                machine.drop_words(n)?;
                pc += 2;
            }
            Op::Lev => {
                let ret = machine.leave_frame()?;
                if ret == HALT {
                    return Ok(machine.a());
                }
                pc = target(ret);
            }
            Op::Li => {
                let v = machine.load_word(machine.a())?;
                machine.set_a(v);
                pc += 1;
            }
            Op::Lc => {
                let v = machine.load_byte(machine.a())?;
                machine.set_a(v);
                pc += 1;
            }
            Op::Si => {
                let addr = machine.pop()?;
                machine.store_word(addr, machine.a())?;
                pc += 1;
            }
            Op::Sc => {
                let addr = machine.pop()?;
                machine.store_byte(addr, machine.a())?;
                // A char store yields the stored char, like the
                // assignment expression it compiles from.
                machine.set_a(machine.a() as u8 as i8 as Word);
                pc += 1;
            }
            Op::Psh => {
                machine.push(machine.a())?;
                pc += 1;
            }
            Op::Or
            | Op::Xor
            | Op::And
            | Op::Eq
            | Op::Ne
            | Op::Lt
            | Op::Gt
            | Op::Le
            | Op::Ge
            | Op::Shl
            | Op::Shr
            | Op::Add
            | Op::Sub
            | Op::Mul
            | Op::Div
            | Op::Mod => {
                let b = machine.pop()?;
                let v = binop(op, b, machine.a(), cycle)?;
                machine.set_a(v);
                pc += 1;
            }
            Op::Open => {
                let path_addr = machine.stack_word(1)?;
                let fd = io.open(machine.cstr(path_addr)?);
                machine.set_a(fd);
                pc += 1;
            }
            Op::Read => {
                let fd = machine.stack_word(2)?;
                let buf_addr = machine.stack_word(1)?;
                let n = machine.stack_word(0)?;
                let buf = machine.bytes_mut(buf_addr, n)?;
                let count = io.read(fd, buf);
                machine.set_a(count);
                pc += 1;
            }
            Op::Clos => {
                let fd = machine.stack_word(0)?;
                let r = io.close(fd);
                machine.set_a(r);
                pc += 1;
            }
            Op::Prtf => {
                // The argument window sits above sp; the operand of the
                // ADJ that follows says how far up its base is. Exactly
                // six slots are read no matter how many were pushed.
                let nargs = match code.get(pc + 1).copied().and_then(Op::from_word) {
                    Some(Op::Adj) => fetch(code, pc + 2, cycle)?,
                    _ => 0,
                };
                let base = machine.sp().wrapping_add(nargs.wrapping_mul(WORD_BYTES));
                let mut args = [0; PRINTF_WINDOW];
                for (k, slot) in args.iter_mut().enumerate() {
                    *slot = machine.load_word(base - (k as Word + 1) * WORD_BYTES)?;
                }
                let n = io.printf(machine, &args)?;
                machine.set_a(n);
                pc += 1;
            }
            Op::Malc => {
                let n = machine.stack_word(0)?;
                let addr = machine.alloc(n);
                machine.set_a(addr);
                pc += 1;
            }
            Op::Free => {
                // Accepted; the arena never returns memory.
                pc += 1;
            }
            Op::Mset => {
                let addr = machine.stack_word(2)?;
                let val = machine.stack_word(1)?;
                let n = machine.stack_word(0)?;
                machine.bytes_mut(addr, n)?.fill(val as u8);
                machine.set_a(addr);
                pc += 1;
            }
            Op::Mcmp => {
                let a_addr = machine.stack_word(2)?;
                let b_addr = machine.stack_word(1)?;
                let n = machine.stack_word(0)?;
                let r = memcmp(machine.bytes(a_addr, n)?, machine.bytes(b_addr, n)?);
                machine.set_a(r);
                pc += 1;
            }
            Op::Exit => {
                return machine.stack_word(0);
            }
        }
    }
}

fn binop(op: Op, b: Word, a: Word, cycle: u64) -> Result<Word, RuntimeError> {
    Ok(match op {
        Op::Or => b | a,
        Op::Xor => b ^ a,
        Op::And => b & a,
        Op::Eq => (b == a) as Word,
        Op::Ne => (b != a) as Word,
        Op::Lt => (b < a) as Word,
        Op::Gt => (b > a) as Word,
        Op::Le => (b <= a) as Word,
        Op::Ge => (b >= a) as Word,
        Op::Shl => b.wrapping_shl(a as u32),
        // Arithmetic shift: sign bits come in from the left.
        Op::Shr => b.wrapping_shr(a as u32),
        Op::Add => b.wrapping_add(a),
        Op::Sub => b.wrapping_sub(a),
        Op::Mul => b.wrapping_mul(a),
        Op::Div => {
            if a == 0 {
                return Err(RuntimeError::DivisionByZero { cycle });
            }
            b.wrapping_div(a)
        }
        Op::Mod => {
            if a == 0 {
                return Err(RuntimeError::DivisionByZero { cycle });
            }
            b.wrapping_rem(a)
        }
        other => {
            return Err(RuntimeError::UnknownInstruction {
                op: other.as_word(),
                cycle,
            });
        }
    })
}

/// First-difference byte comparison over equal-length slices.
fn memcmp(x: &[u8], y: &[u8]) -> Word {
    for (&a, &b) in x.iter().zip(y.iter()) {
        if a != b {
            return a as Word - b as Word;
        }
    }
    0
}
