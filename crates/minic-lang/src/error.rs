use thiserror::Error;

/// What went wrong, without the position. The `Display` text is the
/// diagnostic the user sees.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
pub enum ErrorKind {
    // Lexical
    #[error("bad character")]
    BadCharacter,

    // Expressions
    #[error("unexpected eof in expression")]
    EofInExpression,
    #[error("open paren expected in sizeof")]
    SizeofOpenParen,
    #[error("close paren expected in sizeof")]
    SizeofCloseParen,
    #[error("bad function call")]
    BadFunctionCall,
    #[error("undefined variable")]
    UndefinedVariable,
    #[error("bad cast")]
    BadCast,
    #[error("bad dereference")]
    BadDereference,
    #[error("bad address-of")]
    BadAddressOf,
    #[error("bad lvalue in pre-increment")]
    BadPreIncrementLvalue,
    #[error("bad lvalue in post-increment")]
    BadPostIncrementLvalue,
    #[error("bad lvalue in assignment")]
    BadAssignmentLvalue,
    #[error("conditional missing colon")]
    ConditionalMissingColon,
    #[error("pointer type expected")]
    PointerTypeExpected,
    #[error("close bracket expected")]
    CloseBracketExpected,
    #[error("bad expression")]
    BadExpression,

    // Statements
    #[error("open paren expected")]
    OpenParenExpected,
    #[error("close paren expected")]
    CloseParenExpected,
    #[error("semicolon expected")]
    SemicolonExpected,

    // Declarations
    #[error("bad enum identifier")]
    BadEnumIdentifier,
    #[error("bad enum initializer")]
    BadEnumInitializer,
    #[error("bad global declaration")]
    BadGlobalDeclaration,
    #[error("duplicate global definition")]
    DuplicateGlobalDefinition,
    #[error("bad parameter declaration")]
    BadParameterDeclaration,
    #[error("duplicate parameter definition")]
    DuplicateParameterDefinition,
    #[error("bad function definition")]
    BadFunctionDefinition,
    #[error("bad local declaration")]
    BadLocalDeclaration,
    #[error("duplicate local definition")]
    DuplicateLocalDefinition,
    #[error("undefined function")]
    UndefinedFunction,
}

/// A terminal compile-time diagnostic. There is no recovery: the first
/// error aborts the translation.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum CompileError {
    #[error("{line}: {kind}")]
    At { line: u32, kind: ErrorKind },
    #[error("main() not defined")]
    MainNotDefined,
}

impl CompileError {
    pub fn at(line: u32, kind: ErrorKind) -> Self {
        CompileError::At { line, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_line_and_message() {
        let err = CompileError::at(7, ErrorKind::BadCharacter);
        assert_eq!(err.to_string(), "7: bad character");
    }

    #[test]
    fn renders_statement_errors() {
        assert_eq!(
            CompileError::at(3, ErrorKind::OpenParenExpected).to_string(),
            "3: open paren expected"
        );
        assert_eq!(
            CompileError::at(12, ErrorKind::SemicolonExpected).to_string(),
            "12: semicolon expected"
        );
    }

    #[test]
    fn main_not_defined_has_no_line() {
        assert_eq!(CompileError::MainNotDefined.to_string(), "main() not defined");
    }
}
