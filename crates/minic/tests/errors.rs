//! Diagnostic tests: the first error at any stage produces a one-line
//! message and ends the session.

use minic::{Error, Session};
use minic_core::SourceFile;

/// Run a program expected to fail; returns the rendered diagnostic.
fn run_err(src: &str) -> String {
    let source = SourceFile::new("test.c", src);
    let mut out: Vec<u8> = Vec::new();
    match Session::new().run(&source, &[], &mut out) {
        Ok(code) => panic!("expected error for:\n{}\ngot exit code {}", src, code),
        Err(err) => err.to_string(),
    }
}

fn assert_compile_error(src: &str, expected: &str) {
    let source = SourceFile::new("test.c", src);
    let mut out: Vec<u8> = Vec::new();
    match Session::new().run(&source, &[], &mut out) {
        Ok(_) => panic!("expected compile error for:\n{}", src),
        Err(Error::Compile(err)) => assert_eq!(err.to_string(), expected),
        Err(Error::Runtime(err)) => {
            panic!("expected compile error, got runtime error: {}", err)
        }
    }
}

// ============================================================================
// Lexical
// ============================================================================

#[test]
fn bad_character() {
    assert_compile_error("int main(){ return 0; }\n$\n", "2: bad character");
}

// ============================================================================
// Syntactic
// ============================================================================

#[test]
fn missing_semicolon() {
    assert_compile_error("int main(){ return 0 }", "1: semicolon expected");
}

#[test]
fn missing_open_paren_in_if() {
    assert_compile_error(
        "int main(){ if 1) return 0; return 0; }",
        "1: open paren expected",
    );
}

#[test]
fn missing_close_paren_in_while() {
    assert_compile_error(
        "int main(){ while (1 { } return 0; }",
        "1: close paren expected",
    );
}

#[test]
fn missing_close_bracket() {
    assert_compile_error(
        "int main(){ char *p; p = \"a\"; return p[0; }",
        "1: close bracket expected",
    );
}

#[test]
fn conditional_missing_colon() {
    assert_compile_error(
        "int main(){ return 1 ? 2 3; }",
        "1: conditional missing colon",
    );
}

#[test]
fn eof_inside_expression() {
    assert_compile_error("int main(){ return 1 +", "1: unexpected eof in expression");
}

// ============================================================================
// Semantic
// ============================================================================

#[test]
fn undefined_variable() {
    assert_compile_error("int main(){ return nope; }", "1: undefined variable");
}

#[test]
fn undefined_function_reported_at_first_use() {
    assert_compile_error(
        "int main(){\n  return nothing_here();\n}",
        "2: undefined function",
    );
}

#[test]
fn duplicate_global() {
    assert_compile_error(
        "int x;\nint x;\nint main(){ return 0; }",
        "2: duplicate global definition",
    );
}

#[test]
fn duplicate_local() {
    assert_compile_error(
        "int main(){ int a; int a; return 0; }",
        "1: duplicate local definition",
    );
}

#[test]
fn duplicate_parameter() {
    assert_compile_error(
        "int f(int a, int a){ return a; }\nint main(){ return f(1, 2); }",
        "1: duplicate parameter definition",
    );
}

#[test]
fn bad_assignment_lvalue() {
    assert_compile_error("int main(){ 1 = 2; return 0; }", "1: bad lvalue in assignment");
}

#[test]
fn bad_dereference_of_int() {
    assert_compile_error(
        "int main(){ int x; x = 1; return *x; }",
        "1: bad dereference",
    );
}

#[test]
fn bad_address_of_literal() {
    assert_compile_error("int main(){ return &3; }", "1: bad address-of");
}

#[test]
fn indexing_a_non_pointer() {
    assert_compile_error(
        "int main(){ int x; x = 1; return x[0]; }",
        "1: pointer type expected",
    );
}

#[test]
fn calling_a_variable() {
    assert_compile_error(
        "int main(){ int x; x = 1; return x(); }",
        "1: bad function call",
    );
}

#[test]
fn main_must_exist() {
    assert_compile_error("int helper(){ return 1; }", "main() not defined");
}

// ============================================================================
// Runtime
// ============================================================================

#[test]
fn division_by_zero_is_terminal() {
    let msg = run_err("int main(){ int z; z = 0; return 1 / z; }");
    assert!(
        msg.starts_with("division by zero!"),
        "unexpected message: {}",
        msg
    );
}

#[test]
fn modulo_by_zero_is_terminal() {
    let msg = run_err("int main(){ int z; z = 0; return 1 % z; }");
    assert!(msg.starts_with("division by zero!"), "unexpected message: {}", msg);
}

#[test]
fn runaway_recursion_overflows_the_stack() {
    let msg = run_err("int f(int n){ return f(n + 1); } int main(){ return f(0); }");
    assert!(
        msg.starts_with("stack overflow!"),
        "unexpected message: {}",
        msg
    );
}

#[test]
fn wild_store_is_a_bad_address() {
    let msg = run_err("int main(){ int *p; p = (int *)(0 - 8); *p = 1; return 0; }");
    assert!(msg.starts_with("bad address"), "unexpected message: {}", msg);
}
