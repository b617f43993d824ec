//! Single-pass compilation: declarations, statements, and expressions
//! emit VM words directly into the code pool as they are parsed.

mod expr;
mod listing;
mod stmt;

use std::collections::HashMap;
use std::io::Write;

use smallvec::SmallVec;

use minic_core::{Op, SourceFile, Type, Word};

use crate::error::{CompileError, ErrorKind};
use crate::lexer::Lexer;
use crate::pool::{CodePool, DataPool};
use crate::symbol::{Binding, Class, SymbolId, SymbolTable};
use crate::token::Token;

use listing::Lister;

/// A compiled program ready for execution.
#[derive(Debug)]
pub struct Program {
    /// The instruction words.
    pub code: Vec<Word>,
    /// Initial guest memory image: globals and string literals.
    pub data: Vec<u8>,
    /// Code-pool address of `main`.
    pub entry: usize,
}

/// Call sites of a function referenced before its definition. Each site
/// is a reserved `JSR` operand slot, patched when the definition lands.
struct Forward {
    line: u32,
    sites: SmallVec<[usize; 4]>,
}

/// The single-pass compiler.
///
/// Parsing and code generation are interleaved: there is no syntax
/// tree. `ty` tracks the type of the value the most recently emitted
/// code leaves in the VM accumulator, and the most recently emitted
/// load instruction doubles as the record of a usable lvalue.
pub struct Compiler<'a> {
    source: &'a SourceFile,
    lexer: Lexer<'a>,
    syms: SymbolTable,
    code: CodePool,
    data: DataPool,
    lister: Option<Lister<'a>>,
    /// Type of the value currently in the accumulator.
    ty: Type,
    /// Frame-offset base of the function being compiled: parameter and
    /// local slots are emitted as `loc - val`.
    loc: Word,
    forward: HashMap<SymbolId, Forward>,
}

impl<'a> Compiler<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        let mut syms = SymbolTable::new();
        for (name, tok) in [
            ("char", Token::Char),
            ("else", Token::Else),
            ("enum", Token::Enum),
            ("if", Token::If),
            ("int", Token::Int),
            ("return", Token::Return),
            ("sizeof", Token::Sizeof),
            ("while", Token::While),
            // `void` is accepted and treated as `char`.
            ("void", Token::Char),
        ] {
            syms.define_keyword(name, tok);
        }
        for (name, op) in [
            ("open", Op::Open),
            ("read", Op::Read),
            ("close", Op::Clos),
            ("printf", Op::Prtf),
            ("malloc", Op::Malc),
            ("free", Op::Free),
            ("memset", Op::Mset),
            ("memcmp", Op::Mcmp),
            ("exit", Op::Exit),
        ] {
            syms.define_syscall(name, Type::INT, op.as_word());
        }

        Self {
            source,
            lexer: Lexer::new(source),
            syms,
            code: CodePool::new(),
            data: DataPool::new(),
            lister: None,
            ty: Type::INT,
            loc: 0,
            forward: HashMap::new(),
        }
    }

    /// Enable source-listing mode: each consumed line is written to
    /// `out` followed by the instructions emitted while parsing it.
    pub fn with_listing(mut self, out: &'a mut dyn Write) -> Self {
        self.lister = Some(Lister::new(out));
        self
    }

    /// Compile the whole translation unit.
    pub fn compile(mut self) -> Result<Program, CompileError> {
        self.next()?;
        while self.tok() != Token::Eof {
            self.global_declaration()?;
        }

        if let Some(fwd) = self.forward.values().min_by_key(|f| f.line) {
            return Err(CompileError::at(fwd.line, ErrorKind::UndefinedFunction));
        }

        let main = self.syms.intern("main");
        let entry = match self.syms.get(main).binding() {
            Some(b) if b.class == Class::Fun => b.val as usize,
            _ => return Err(CompileError::MainNotDefined),
        };

        Ok(Program {
            code: self.code.finish(),
            data: self.data.finish(),
            entry,
        })
    }

    // ------------------------------------------------------------------
    // Scanner plumbing
    // ------------------------------------------------------------------

    pub(crate) fn tok(&self) -> Token {
        self.lexer.tok()
    }

    pub(crate) fn err(&self, kind: ErrorKind) -> CompileError {
        CompileError::at(self.lexer.line(), kind)
    }

    /// Advance the scanner; in listing mode, replay any lines it crossed
    /// together with the code emitted since the previous line.
    pub(crate) fn next(&mut self) -> Result<(), CompileError> {
        let before = self.lexer.line();
        self.lexer.advance(&mut self.syms, &mut self.data)?;
        let after = self.lexer.line();
        if after > before
            && let Some(lister) = self.lister.as_mut()
        {
            lister.flush(self.source, before, after, &self.code);
        }
        Ok(())
    }

    pub(crate) fn expect(&mut self, tok: Token, kind: ErrorKind) -> Result<(), CompileError> {
        if self.tok() == tok {
            self.next()
        } else {
            Err(self.err(kind))
        }
    }

    // ------------------------------------------------------------------
    // Top level
    // ------------------------------------------------------------------

    /// One top-level item: an enum declaration, or a run of type-prefixed
    /// declarators (globals and function definitions).
    fn global_declaration(&mut self) -> Result<(), CompileError> {
        let mut base = Type::INT;
        match self.tok() {
            Token::Int => self.next()?,
            Token::Char => {
                self.next()?;
                base = Type::CHAR;
            }
            Token::Enum => self.enum_declaration()?,
            _ => {}
        }

        while self.tok() != Token::Semi && self.tok() != Token::RBrace {
            let mut ty = base;
            while self.tok() == Token::Mul {
                self.next()?;
                ty = ty.ptr_to();
            }
            if self.tok() != Token::Id {
                return Err(self.err(ErrorKind::BadGlobalDeclaration));
            }
            let Some(id) = self.lexer.ident() else {
                return Err(self.err(ErrorKind::BadGlobalDeclaration));
            };
            self.next()?;

            if self.tok() == Token::LParen {
                self.function_definition(id, ty)?;
            } else {
                if self.syms.get(id).binding().is_some() {
                    return Err(self.err(ErrorKind::DuplicateGlobalDefinition));
                }
                let addr = self.data.alloc_word();
                self.syms.bind(
                    id,
                    Binding {
                        class: Class::Glo,
                        ty,
                        val: addr,
                    },
                );
            }
            if self.tok() == Token::Comma {
                self.next()?;
            }
        }
        // Consume the terminating `;` (or the `}` of a function body).
        self.next()
    }

    /// `enum [name] { A [= n], B, ... }` - each name becomes an integer
    /// constant. The optional tag is skipped; enums are not types here.
    fn enum_declaration(&mut self) -> Result<(), CompileError> {
        self.next()?;
        if self.tok() != Token::LBrace {
            self.next()?; // skip the tag
        }
        if self.tok() == Token::LBrace {
            self.next()?;
            let mut value: Word = 0;
            while self.tok() != Token::RBrace {
                if self.tok() != Token::Id {
                    return Err(self.err(ErrorKind::BadEnumIdentifier));
                }
                let Some(id) = self.lexer.ident() else {
                    return Err(self.err(ErrorKind::BadEnumIdentifier));
                };
                self.next()?;
                if self.tok() == Token::Assign {
                    self.next()?;
                    if self.tok() != Token::Num {
                        return Err(self.err(ErrorKind::BadEnumInitializer));
                    }
                    value = self.lexer.ival();
                    self.next()?;
                }
                self.syms.bind(
                    id,
                    Binding {
                        class: Class::Num,
                        ty: Type::INT,
                        val: value,
                    },
                );
                value = value.wrapping_add(1);
                if self.tok() == Token::Comma {
                    self.next()?;
                }
            }
            self.next()?;
        }
        Ok(())
    }

    /// Function definition: parameters, local declarations as a body
    /// prefix, then statements. Leaves the closing `}` for the caller.
    fn function_definition(&mut self, id: SymbolId, ret_ty: Type) -> Result<(), CompileError> {
        match self.syms.get(id).class() {
            None => {}
            // Forward references bound this name already; resolve them.
            Some(Class::Fun) if self.forward.contains_key(&id) => {}
            Some(_) => return Err(self.err(ErrorKind::DuplicateGlobalDefinition)),
        }
        let entry = self.code.here() as Word;
        self.syms.bind(
            id,
            Binding {
                class: Class::Fun,
                ty: ret_ty,
                val: entry,
            },
        );
        if let Some(fwd) = self.forward.remove(&id) {
            for site in fwd.sites {
                self.code.patch(site, entry);
            }
        }

        self.next()?; // past `(`
        let mut offset: Word = 0;
        while self.tok() != Token::RParen {
            let mut pty = Type::INT;
            if self.tok() == Token::Int {
                self.next()?;
            } else if self.tok() == Token::Char {
                self.next()?;
                pty = Type::CHAR;
            }
            while self.tok() == Token::Mul {
                self.next()?;
                pty = pty.ptr_to();
            }
            if self.tok() != Token::Id {
                return Err(self.err(ErrorKind::BadParameterDeclaration));
            }
            let Some(pid) = self.lexer.ident() else {
                return Err(self.err(ErrorKind::BadParameterDeclaration));
            };
            if self.syms.get(pid).class() == Some(Class::Loc) {
                return Err(self.err(ErrorKind::DuplicateParameterDefinition));
            }
            self.next()?;
            self.syms.shadow(pid, pty, offset);
            offset += 1;
            if self.tok() == Token::Comma {
                self.next()?;
            }
        }
        self.next()?; // past `)`
        if self.tok() != Token::LBrace {
            return Err(self.err(ErrorKind::BadFunctionDefinition));
        }
        self.next()?; // past `{`

        // Locals are declared as a prefix of the body. Slots continue
        // past the parameters; `loc` marks the frame base so parameter
        // offsets come out positive and local offsets negative.
        offset += 1;
        self.loc = offset;
        while self.tok().is_type_keyword() {
            let lbase = if self.tok() == Token::Char {
                Type::CHAR
            } else {
                Type::INT
            };
            self.next()?;
            while self.tok() != Token::Semi {
                let mut lty = lbase;
                while self.tok() == Token::Mul {
                    self.next()?;
                    lty = lty.ptr_to();
                }
                if self.tok() != Token::Id {
                    return Err(self.err(ErrorKind::BadLocalDeclaration));
                }
                let Some(lid) = self.lexer.ident() else {
                    return Err(self.err(ErrorKind::BadLocalDeclaration));
                };
                if self.syms.get(lid).class() == Some(Class::Loc) {
                    return Err(self.err(ErrorKind::DuplicateLocalDefinition));
                }
                self.next()?;
                offset += 1;
                self.syms.shadow(lid, lty, offset);
                if self.tok() == Token::Comma {
                    self.next()?;
                }
            }
            self.next()?; // past `;`
        }

        self.code.emit_op(Op::Ent);
        self.code.emit(offset - self.loc);
        while self.tok() != Token::RBrace {
            self.statement()?;
        }
        // Every function ends in LEV even when the body already returned:
        // a false branch of a trailing `if (..) return ..;` must still
        // have somewhere to land.
        self.code.emit_op(Op::Lev);

        self.syms.restore_locals();
        Ok(())
    }
}
