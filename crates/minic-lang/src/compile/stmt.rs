use minic_core::{Op, Word};

use crate::error::{CompileError, ErrorKind};
use crate::token::Token;

use super::Compiler;

impl Compiler<'_> {
    /// One statement. Forward jump targets are reserved as zero slots
    /// and patched in place once the emitter reaches them.
    pub(crate) fn statement(&mut self) -> Result<(), CompileError> {
        match self.tok() {
            Token::If => {
                self.next()?;
                self.expect(Token::LParen, ErrorKind::OpenParenExpected)?;
                self.expression(Token::Assign)?;
                self.expect(Token::RParen, ErrorKind::CloseParenExpected)?;

                self.code.emit_op(Op::Bz);
                let skip = self.code.reserve();
                self.statement()?;
                if self.tok() == Token::Else {
                    // False branch lands past the JMP emitted next.
                    self.code.patch(skip, (self.code.here() + 2) as Word);
                    self.code.emit_op(Op::Jmp);
                    let done = self.code.reserve();
                    self.next()?;
                    self.statement()?;
                    self.code.patch(done, self.code.here() as Word);
                } else {
                    self.code.patch(skip, self.code.here() as Word);
                }
                Ok(())
            }
            Token::While => {
                self.next()?;
                let start = self.code.here() as Word;
                self.expect(Token::LParen, ErrorKind::OpenParenExpected)?;
                self.expression(Token::Assign)?;
                self.expect(Token::RParen, ErrorKind::CloseParenExpected)?;

                self.code.emit_op(Op::Bz);
                let done = self.code.reserve();
                self.statement()?;
                self.code.emit_op(Op::Jmp);
                self.code.emit(start);
                self.code.patch(done, self.code.here() as Word);
                Ok(())
            }
            Token::Return => {
                self.next()?;
                if self.tok() != Token::Semi {
                    self.expression(Token::Assign)?;
                }
                self.code.emit_op(Op::Lev);
                self.expect(Token::Semi, ErrorKind::SemicolonExpected)
            }
            Token::LBrace => {
                self.next()?;
                while self.tok() != Token::RBrace {
                    self.statement()?;
                }
                self.next()
            }
            Token::Semi => self.next(),
            _ => {
                self.expression(Token::Assign)?;
                self.expect(Token::Semi, ErrorKind::SemicolonExpected)
            }
        }
    }
}
