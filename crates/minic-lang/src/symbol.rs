use std::collections::HashMap;

use minic_core::{Type, Word};

use crate::token::Token;

/// An interned identifier handle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Storage class of a bound identifier.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Class {
    /// Enum constant; `val` is the constant itself.
    Num,
    /// Function; `val` is a code-pool address.
    Fun,
    /// Built-in syscall; `val` is the syscall opcode word.
    Sys,
    /// Global variable; `val` is a data-pool address.
    Glo,
    /// Local variable or parameter; `val` is a frame-offset index.
    Loc,
}

/// What an identifier currently means: storage class, type, and the
/// class-dependent payload.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Binding {
    pub class: Class,
    pub ty: Type,
    pub val: Word,
}

/// One identifier record.
///
/// `token` is what the lexer produces when the name is recognized: `Id`
/// for user identifiers, the keyword token for pre-seeded keywords.
/// While a local binding shadows an outer one, the outer binding is
/// parked in `saved` (the inner `Option` is the outer state itself,
/// which may have been "unbound").
#[derive(Clone, Debug)]
pub struct Symbol {
    token: Token,
    name: String,
    binding: Option<Binding>,
    saved: Option<Option<Binding>>,
}

impl Symbol {
    pub fn token(&self) -> Token {
        self.token
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    pub fn class(&self) -> Option<Class> {
        self.binding.map(|b| b.class)
    }
}

/// Identifier table: interner plus scope discipline.
///
/// Records are appended and never removed. Function bodies shadow
/// outer bindings in place; `restore_locals` undoes every live local
/// binding in a single pass at function exit.
#[derive(Default, Debug)]
pub struct SymbolTable {
    ids: HashMap<String, SymbolId>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning the same id for the same name.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            token: Token::Id,
            name: name.to_owned(),
            binding: None,
            saved: None,
        });
        self.ids.insert(name.to_owned(), id);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    /// Pre-seed a keyword: the lexer will re-emit `token` for this name.
    pub fn define_keyword(&mut self, name: &str, token: Token) {
        let id = self.intern(name);
        self.symbols[id.0 as usize].token = token;
    }

    /// Pre-seed a built-in syscall identifier.
    pub fn define_syscall(&mut self, name: &str, ty: Type, opcode: Word) {
        let id = self.intern(name);
        self.symbols[id.0 as usize].binding = Some(Binding {
            class: Class::Sys,
            ty,
            val: opcode,
        });
    }

    /// Replace the current binding outright (globals, enum constants,
    /// function definitions).
    pub fn bind(&mut self, id: SymbolId, binding: Binding) {
        self.symbols[id.0 as usize].binding = Some(binding);
    }

    /// Update the payload of the current binding, if any. Used to patch
    /// a function's entry address once its body is reached.
    pub fn set_val(&mut self, id: SymbolId, val: Word) {
        if let Some(b) = self.symbols[id.0 as usize].binding.as_mut() {
            b.val = val;
        }
    }

    /// Introduce a local binding, parking the outer one for restoration
    /// at function exit.
    pub fn shadow(&mut self, id: SymbolId, ty: Type, val: Word) {
        let sym = &mut self.symbols[id.0 as usize];
        sym.saved = Some(sym.binding.take());
        sym.binding = Some(Binding {
            class: Class::Loc,
            ty,
            val,
        });
    }

    /// Restore every shadowed outer binding. A single pass over the
    /// table, run once per function definition.
    pub fn restore_locals(&mut self) {
        for sym in &mut self.symbols {
            if sym.class() == Some(Class::Loc)
                && let Some(outer) = sym.saved.take()
            {
                sym.binding = outer;
            }
        }
    }
}
