use smallvec::SmallVec;

use minic_core::{Op, Type, WORD_BYTES, Word};

use crate::error::{CompileError, ErrorKind};
use crate::symbol::{Binding, Class, SymbolId};
use crate::token::Token;

use super::{Compiler, Forward};

impl Compiler<'_> {
    /// Parse an expression at the given minimum precedence and emit
    /// code that leaves its value in the accumulator; `self.ty` ends up
    /// holding the value's type.
    pub(crate) fn expression(&mut self, min: Token) -> Result<(), CompileError> {
        self.primary()?;
        self.climb(min)
    }

    fn emit_load(&mut self, ty: Type) {
        self.ty = ty;
        self.code.emit_op(if ty.is_byte_sized() { Op::Lc } else { Op::Li });
    }

    fn emit_store(&mut self) {
        self.code
            .emit_op(if self.ty.is_byte_sized() { Op::Sc } else { Op::Si });
    }

    fn emit_imm(&mut self, val: Word) {
        self.code.emit_op(Op::Imm);
        self.code.emit(val);
    }

    /// Whether the most recent emission was a load, i.e. the accumulator
    /// currently holds a value read through an address that is still on
    /// record. Such a load can be reopened into an lvalue.
    fn last_is_load(&self) -> bool {
        matches!(self.code.last(),
            Some(w) if w == Op::Lc.as_word() || w == Op::Li.as_word())
    }

    /// Turn the pending load back into an lvalue for read-modify-write:
    /// the load becomes a push of the address, then reloads through it.
    fn reopen_lvalue(&mut self, kind: ErrorKind) -> Result<(), CompileError> {
        if !self.last_is_load() {
            return Err(self.err(kind));
        }
        let load = self.code.last().unwrap_or_default();
        self.code.rewrite_last(Op::Psh.as_word());
        self.code.emit(load);
        Ok(())
    }

    /// Primaries and unary-prefix forms.
    fn primary(&mut self) -> Result<(), CompileError> {
        match self.tok() {
            Token::Eof => Err(self.err(ErrorKind::EofInExpression)),
            Token::Num => {
                self.emit_imm(self.lexer.ival());
                self.next()?;
                self.ty = Type::INT;
                Ok(())
            }
            Token::Str => {
                self.emit_imm(self.lexer.ival());
                self.next()?;
                // Adjacent literals were appended byte-by-byte to the
                // same run; terminate it once the run ends.
                while self.tok() == Token::Str {
                    self.next()?;
                }
                self.data.terminate_str();
                self.ty = Type::CHAR.ptr_to();
                Ok(())
            }
            Token::Sizeof => {
                self.next()?;
                if self.tok() == Token::LParen {
                    self.next()?;
                } else {
                    return Err(self.err(ErrorKind::SizeofOpenParen));
                }
                let mut ty = Type::INT;
                if self.tok() == Token::Int {
                    self.next()?;
                } else if self.tok() == Token::Char {
                    self.next()?;
                    ty = Type::CHAR;
                }
                while self.tok() == Token::Mul {
                    self.next()?;
                    ty = ty.ptr_to();
                }
                if self.tok() == Token::RParen {
                    self.next()?;
                } else {
                    return Err(self.err(ErrorKind::SizeofCloseParen));
                }
                self.emit_imm(ty.size());
                self.ty = Type::INT;
                Ok(())
            }
            Token::Id => {
                let Some(id) = self.lexer.ident() else {
                    return Err(self.err(ErrorKind::UndefinedVariable));
                };
                self.next()?;
                if self.tok() == Token::LParen {
                    return self.call(id);
                }
                match self.syms.get(id).binding().copied() {
                    Some(Binding {
                        class: Class::Num,
                        val,
                        ..
                    }) => {
                        self.emit_imm(val);
                        self.ty = Type::INT;
                        Ok(())
                    }
                    Some(Binding {
                        class: Class::Loc,
                        ty,
                        val,
                    }) => {
                        self.code.emit_op(Op::Lea);
                        self.code.emit(self.loc - val);
                        self.emit_load(ty);
                        Ok(())
                    }
                    Some(Binding {
                        class: Class::Glo,
                        ty,
                        val,
                    }) => {
                        self.emit_imm(val);
                        self.emit_load(ty);
                        Ok(())
                    }
                    _ => Err(self.err(ErrorKind::UndefinedVariable)),
                }
            }
            Token::LParen => {
                self.next()?;
                if self.tok().is_type_keyword() {
                    // C-style cast
                    let mut ty = if self.tok() == Token::Int {
                        Type::INT
                    } else {
                        Type::CHAR
                    };
                    self.next()?;
                    while self.tok() == Token::Mul {
                        self.next()?;
                        ty = ty.ptr_to();
                    }
                    if self.tok() == Token::RParen {
                        self.next()?;
                    } else {
                        return Err(self.err(ErrorKind::BadCast));
                    }
                    self.expression(Token::Inc)?;
                    self.ty = ty;
                } else {
                    self.expression(Token::Assign)?;
                    self.expect(Token::RParen, ErrorKind::CloseParenExpected)?;
                }
                Ok(())
            }
            Token::Mul => {
                // dereference
                self.next()?;
                self.expression(Token::Inc)?;
                let Some(pointee) = self.ty.pointee() else {
                    return Err(self.err(ErrorKind::BadDereference));
                };
                self.emit_load(pointee);
                Ok(())
            }
            Token::And => {
                // address-of: drop the pending load, leaving the address
                self.next()?;
                self.expression(Token::Inc)?;
                if !self.last_is_load() {
                    return Err(self.err(ErrorKind::BadAddressOf));
                }
                self.code.discard_last();
                self.ty = self.ty.ptr_to();
                Ok(())
            }
            Token::Not => {
                self.next()?;
                self.expression(Token::Inc)?;
                self.code.emit_op(Op::Psh);
                self.emit_imm(0);
                self.code.emit_op(Op::Eq);
                self.ty = Type::INT;
                Ok(())
            }
            Token::BitNot => {
                self.next()?;
                self.expression(Token::Inc)?;
                self.code.emit_op(Op::Psh);
                self.emit_imm(-1);
                self.code.emit_op(Op::Xor);
                self.ty = Type::INT;
                Ok(())
            }
            Token::Add => {
                self.next()?;
                self.expression(Token::Inc)?;
                self.ty = Type::INT;
                Ok(())
            }
            Token::Sub => {
                self.next()?;
                self.code.emit_op(Op::Imm);
                if self.tok() == Token::Num {
                    // Fold the negation into the immediate.
                    self.code.emit(self.lexer.ival().wrapping_neg());
                    self.next()?;
                } else {
                    self.code.emit(-1);
                    self.code.emit_op(Op::Psh);
                    self.expression(Token::Inc)?;
                    self.code.emit_op(Op::Mul);
                }
                self.ty = Type::INT;
                Ok(())
            }
            Token::Inc | Token::Dec => {
                // prefix increment/decrement
                let tok = self.tok();
                self.next()?;
                self.expression(Token::Inc)?;
                self.reopen_lvalue(ErrorKind::BadPreIncrementLvalue)?;
                self.code.emit_op(Op::Psh);
                self.emit_imm(self.ty.stride());
                self.code
                    .emit_op(if tok == Token::Inc { Op::Add } else { Op::Sub });
                self.emit_store();
                Ok(())
            }
            _ => Err(self.err(ErrorKind::BadExpression)),
        }
    }

    /// A call, user function or syscall. Arguments are pushed
    /// left-to-right and unwound by the caller with `ADJ`.
    fn call(&mut self, id: SymbolId) -> Result<(), CompileError> {
        let call_line = self.lexer.line();
        self.next()?; // past `(`
        let mut nargs: Word = 0;
        while self.tok() != Token::RParen {
            self.expression(Token::Assign)?;
            self.code.emit_op(Op::Psh);
            nargs += 1;
            if self.tok() == Token::Comma {
                self.next()?;
            }
        }
        self.next()?; // past `)`

        match self.syms.get(id).binding().copied() {
            Some(Binding {
                class: Class::Sys,
                ty,
                val,
            }) => {
                self.code.emit(val);
                self.ty = ty;
            }
            Some(Binding {
                class: Class::Fun,
                ty,
                val,
            }) => {
                self.code.emit_op(Op::Jsr);
                let site = self.code.reserve();
                if let Some(fwd) = self.forward.get_mut(&id) {
                    fwd.sites.push(site);
                } else {
                    self.code.patch(site, val);
                }
                self.ty = ty;
            }
            None => {
                // Not yet defined: bind as a function and patch the
                // JSR operand when the definition is reached.
                self.syms.bind(
                    id,
                    Binding {
                        class: Class::Fun,
                        ty: Type::INT,
                        val: 0,
                    },
                );
                self.code.emit_op(Op::Jsr);
                let site = self.code.reserve();
                let mut sites = SmallVec::new();
                sites.push(site);
                self.forward.insert(
                    id,
                    Forward {
                        line: call_line,
                        sites,
                    },
                );
                self.ty = Type::INT;
            }
            Some(_) => return Err(self.err(ErrorKind::BadFunctionCall)),
        }

        if nargs > 0 {
            self.code.emit_op(Op::Adj);
            self.code.emit(nargs);
        }
        Ok(())
    }

    /// Precedence climb over binary, ternary, postfix, and assignment
    /// operators: while the lookahead binds at least as tightly as
    /// `min`, push the accumulator and parse the right side one level
    /// tighter.
    fn climb(&mut self, min: Token) -> Result<(), CompileError> {
        while self.tok() >= min {
            let lhs_ty = self.ty;
            match self.tok() {
                Token::Assign => {
                    self.next()?;
                    if !self.last_is_load() {
                        return Err(self.err(ErrorKind::BadAssignmentLvalue));
                    }
                    // The pending load becomes a push of the target
                    // address; the store consumes it after the RHS.
                    self.code.rewrite_last(Op::Psh.as_word());
                    self.expression(Token::Assign)?;
                    self.ty = lhs_ty;
                    self.emit_store();
                }
                Token::Cond => {
                    self.next()?;
                    self.code.emit_op(Op::Bz);
                    let other = self.code.reserve();
                    self.expression(Token::Assign)?;
                    if self.tok() == Token::Colon {
                        self.next()?;
                    } else {
                        return Err(self.err(ErrorKind::ConditionalMissingColon));
                    }
                    self.code.patch(other, (self.code.here() + 2) as Word);
                    self.code.emit_op(Op::Jmp);
                    let done = self.code.reserve();
                    self.expression(Token::Cond)?;
                    self.code.patch(done, self.code.here() as Word);
                }
                Token::Lor => {
                    // Short-circuit: skip the RHS when already true.
                    self.next()?;
                    self.code.emit_op(Op::Bnz);
                    let done = self.code.reserve();
                    self.expression(Token::Land)?;
                    self.code.patch(done, self.code.here() as Word);
                    self.ty = Type::INT;
                }
                Token::Land => {
                    self.next()?;
                    self.code.emit_op(Op::Bz);
                    let done = self.code.reserve();
                    self.expression(Token::Or)?;
                    self.code.patch(done, self.code.here() as Word);
                    self.ty = Type::INT;
                }
                Token::Or => self.binary(Op::Or, Token::Xor)?,
                Token::Xor => self.binary(Op::Xor, Token::And)?,
                Token::And => self.binary(Op::And, Token::Eq)?,
                Token::Eq => self.binary(Op::Eq, Token::Lt)?,
                Token::Ne => self.binary(Op::Ne, Token::Lt)?,
                Token::Lt => self.binary(Op::Lt, Token::Shl)?,
                Token::Gt => self.binary(Op::Gt, Token::Shl)?,
                Token::Le => self.binary(Op::Le, Token::Shl)?,
                Token::Ge => self.binary(Op::Ge, Token::Shl)?,
                Token::Shl => self.binary(Op::Shl, Token::Add)?,
                Token::Shr => self.binary(Op::Shr, Token::Add)?,
                Token::Add => {
                    self.next()?;
                    self.code.emit_op(Op::Psh);
                    self.expression(Token::Mul)?;
                    // Pointer arithmetic scales by the pointee size.
                    if lhs_ty.steps_by_word() {
                        self.code.emit_op(Op::Psh);
                        self.emit_imm(WORD_BYTES);
                        self.code.emit_op(Op::Mul);
                    }
                    self.code.emit_op(Op::Add);
                    self.ty = lhs_ty;
                }
                Token::Sub => {
                    self.next()?;
                    self.code.emit_op(Op::Psh);
                    self.expression(Token::Mul)?;
                    if lhs_ty.steps_by_word() && lhs_ty == self.ty {
                        // Pointer difference: subtract, then divide by
                        // the element size.
                        self.code.emit_op(Op::Sub);
                        self.code.emit_op(Op::Psh);
                        self.emit_imm(WORD_BYTES);
                        self.code.emit_op(Op::Div);
                        self.ty = Type::INT;
                    } else if lhs_ty.steps_by_word() {
                        self.code.emit_op(Op::Psh);
                        self.emit_imm(WORD_BYTES);
                        self.code.emit_op(Op::Mul);
                        self.code.emit_op(Op::Sub);
                        self.ty = lhs_ty;
                    } else {
                        self.code.emit_op(Op::Sub);
                        self.ty = lhs_ty;
                    }
                }
                Token::Mul => self.binary(Op::Mul, Token::Inc)?,
                Token::Div => self.binary(Op::Div, Token::Inc)?,
                Token::Mod => self.binary(Op::Mod, Token::Inc)?,
                Token::Inc | Token::Dec => {
                    // postfix: store the stepped value, then step the
                    // accumulator back so the expression yields the
                    // original.
                    let is_inc = self.tok() == Token::Inc;
                    self.reopen_lvalue(ErrorKind::BadPostIncrementLvalue)?;
                    self.code.emit_op(Op::Psh);
                    self.emit_imm(self.ty.stride());
                    self.code.emit_op(if is_inc { Op::Add } else { Op::Sub });
                    self.emit_store();
                    self.code.emit_op(Op::Psh);
                    self.emit_imm(self.ty.stride());
                    self.code.emit_op(if is_inc { Op::Sub } else { Op::Add });
                    self.next()?;
                }
                Token::Brak => {
                    self.next()?;
                    self.code.emit_op(Op::Psh);
                    self.expression(Token::Assign)?;
                    if self.tok() == Token::RBracket {
                        self.next()?;
                    } else {
                        return Err(self.err(ErrorKind::CloseBracketExpected));
                    }
                    if lhs_ty.steps_by_word() {
                        self.code.emit_op(Op::Psh);
                        self.emit_imm(WORD_BYTES);
                        self.code.emit_op(Op::Mul);
                    } else if !lhs_ty.is_pointer() {
                        return Err(self.err(ErrorKind::PointerTypeExpected));
                    }
                    self.code.emit_op(Op::Add);
                    let Some(pointee) = lhs_ty.pointee() else {
                        return Err(self.err(ErrorKind::PointerTypeExpected));
                    };
                    self.emit_load(pointee);
                }
                _ => return Err(self.err(ErrorKind::BadExpression)),
            }
        }
        Ok(())
    }

    /// Plain left-associative binary operator: push LHS, parse RHS one
    /// level tighter, combine. Result is int.
    fn binary(&mut self, op: Op, rhs_min: Token) -> Result<(), CompileError> {
        self.next()?;
        self.code.emit_op(Op::Psh);
        self.expression(rhs_min)?;
        self.code.emit_op(op);
        self.ty = Type::INT;
        Ok(())
    }
}
