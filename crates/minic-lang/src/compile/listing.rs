use std::io::Write;

use minic_core::{Op, SourceFile};

use crate::pool::CodePool;

/// Source-listing sink: replays each consumed source line followed by
/// the instructions emitted while that line was being parsed.
pub(crate) struct Lister<'a> {
    out: &'a mut dyn Write,
    mark: usize,
}

impl<'a> Lister<'a> {
    pub(crate) fn new(out: &'a mut dyn Write) -> Self {
        Self { out, mark: 0 }
    }

    /// Replay lines `from..to` (1-indexed). Code emitted since the last
    /// flush belongs to the first crossed line; lines after it in the
    /// same flush were empty of tokens.
    pub(crate) fn flush(&mut self, source: &SourceFile, from: u32, to: u32, code: &CodePool) {
        for line in from..to {
            if let Some(text) = source.line_text(line) {
                let _ = writeln!(self.out, "{}: {}", line, text);
            }
            if line == from {
                self.disassemble(code);
            }
        }
    }

    fn disassemble(&mut self, code: &CodePool) {
        let mut pos = self.mark;
        while pos < code.here() {
            let Some(op) = code.get(pos).and_then(Op::from_word) else {
                break;
            };
            pos += 1;
            if op.takes_operand() {
                let operand = code.get(pos).unwrap_or(0);
                pos += 1;
                let _ = writeln!(self.out, "{:>8} {}", op.mnemonic(), operand);
            } else {
                let _ = writeln!(self.out, "{:>8}", op.mnemonic());
            }
        }
        self.mark = code.here();
    }
}
