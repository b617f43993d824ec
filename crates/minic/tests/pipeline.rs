//! End-to-end compilation and execution tests.
//!
//! These tests verify the complete source → compile → run path: guest
//! stdout is captured through the session's writer and checked together
//! with the exit code.

use minic::Session;
use minic_core::SourceFile;

/// Compile and run a program, returning (stdout, exit code).
fn run_with_args(src: &str, args: &[&str]) -> (String, i64) {
    let source = SourceFile::new("test.c", src);
    let mut out: Vec<u8> = Vec::new();
    let code = Session::new()
        .run(&source, args, &mut out)
        .unwrap_or_else(|e| panic!("run failed for:\n{}\nerror: {}", src, e));
    (String::from_utf8_lossy(&out).into_owned(), code)
}

fn run_program(src: &str) -> (String, i64) {
    run_with_args(src, &[])
}

/// Check stdout and exit code in one step.
fn assert_program(src: &str, expected_out: &str, expected_code: i64) {
    let (out, code) = run_program(src);
    assert_eq!(out, expected_out, "stdout mismatch for:\n{}", src);
    assert_eq!(code, expected_code, "exit code mismatch for:\n{}", src);
}

// ============================================================================
// Core scenarios
// ============================================================================

#[test]
fn hello_world() {
    assert_program(
        "int main(){ printf(\"hello, world\\n\"); return 0; }",
        "hello, world\n",
        0,
    );
}

#[test]
fn arithmetic_precedence() {
    assert_program(
        "int main(){ printf(\"%d\\n\", 1+2*3); return 0; }",
        "7\n",
        0,
    );
}

#[test]
fn while_loop_with_locals() {
    assert_program(
        "int main(){ int i; int s; i=1; s=0; while(i<=10){ s=s+i; i=i+1; } printf(\"%d\\n\",s); return 0; }",
        "55\n",
        0,
    );
}

#[test]
fn char_pointer_into_string() {
    assert_program(
        "int main(){ char *p; p = \"abc\"; printf(\"%c%c\\n\", *p, *(p+2)); return 0; }",
        "ac\n",
        0,
    );
}

#[test]
fn enum_constants_and_if_else() {
    assert_program(
        "enum { A=10, B, C=20 }; int main(){ if (B==11) printf(\"y\\n\"); else printf(\"n\\n\"); return C; }",
        "y\n",
        20,
    );
}

// ============================================================================
// Functions and calls
// ============================================================================

#[test]
fn recursive_fibonacci() {
    assert_program(
        "int fib(int n){ if (n < 2) return n; return fib(n-1) + fib(n-2); }\n\
         int main(){ printf(\"%d\\n\", fib(10)); return 0; }",
        "55\n",
        0,
    );
}

#[test]
fn forward_reference_resolves_at_runtime() {
    // main calls a function defined after it.
    assert_program(
        "int main(){ printf(\"%d\\n\", triple(5)); return 0; }\n\
         int triple(int n){ return n * 3; }",
        "15\n",
        0,
    );
}

#[test]
fn nested_calls_balance_the_stack() {
    assert_program(
        "int add(int a, int b){ return a + b; }\n\
         int mul(int a, int b){ int r; r = 0; while (b) { r = add(r, a); b = b - 1; } return r; }\n\
         int main(){ printf(\"%d\\n\", mul(add(2, 3), 4)); return 0; }",
        "20\n",
        0,
    );
}

#[test]
fn parameters_shadow_globals() {
    assert_program(
        "int x;\n\
         int twice(int x){ return x + x; }\n\
         int main(){ x = 100; printf(\"%d %d\\n\", twice(4), x); return 0; }",
        "8 100\n",
        0,
    );
}

// ============================================================================
// Pointers and memory
// ============================================================================

#[test]
fn address_of_and_store_through_pointer() {
    assert_program(
        "int main(){ int x; int *p; x = 5; p = &x; *p = 7; printf(\"%d\\n\", x); return 0; }",
        "7\n",
        0,
    );
}

#[test]
fn word_pointer_indexing() {
    assert_program(
        "int main(){ int *a; a = (int *)malloc(3 * sizeof(int)); a[0] = 10; a[1] = 20; a[2] = a[0] + a[1]; printf(\"%d\\n\", a[2]); free(a); return 0; }",
        "30\n",
        0,
    );
}

#[test]
fn char_pointer_arithmetic_steps_by_one() {
    assert_program(
        "int main(){ char *p; p = \"abcdef\"; p = p + 2; p++; printf(\"%c\\n\", *p); return 0; }",
        "d\n",
        0,
    );
}

#[test]
fn pointer_difference_scales_by_element() {
    assert_program(
        "int main(){ int *p; int *q; p = (int *)malloc(64); q = p + 3; printf(\"%d\\n\", q - p); return 0; }",
        "3\n",
        0,
    );
}

#[test]
fn memset_and_memcmp() {
    assert_program(
        "int main(){ char *a; char *b;\n\
         a = (char *)malloc(4); b = (char *)malloc(4);\n\
         memset(a, 'x', 3); memset(b, 'x', 3);\n\
         if (memcmp(a, b, 3) == 0) printf(\"same\\n\");\n\
         *(a+1) = 'y';\n\
         if (memcmp(a, b, 3) > 0) printf(\"gt\\n\");\n\
         free(a); free(b); return 0; }",
        "same\ngt\n",
        0,
    );
}

#[test]
fn string_indexing() {
    assert_program(
        "int main(){ char *p; p = \"hello\"; printf(\"%c\\n\", p[1]); return 0; }",
        "e\n",
        0,
    );
}

#[test]
fn global_variables_persist_across_calls() {
    assert_program(
        "int g;\n\
         int bump(){ g = g + 1; return g; }\n\
         int main(){ bump(); bump(); printf(\"%d\\n\", g); return 0; }",
        "2\n",
        0,
    );
}

// ============================================================================
// Operators and literals
// ============================================================================

#[test]
fn sizeof_values() {
    assert_program(
        "int main(){ printf(\"%d %d %d\\n\", sizeof(char), sizeof(int), sizeof(char *)); return 0; }",
        "1 8 8\n",
        0,
    );
}

#[test]
fn shifts_and_bitwise_ops() {
    assert_program(
        "int main(){ printf(\"%d %d %d\\n\", (1 << 4) | 3, 12 & 10, 12 ^ 10); return 0; }",
        "19 8 6\n",
        0,
    );
}

#[test]
fn right_shift_is_arithmetic() {
    assert_program(
        "int main(){ printf(\"%d\\n\", (0 - 16) >> 2); return 0; }",
        "-4\n",
        0,
    );
}

#[test]
fn division_and_modulo() {
    assert_program(
        "int main(){ printf(\"%d %d\\n\", 7 / 2, 7 % 2); return 0; }",
        "3 1\n",
        0,
    );
}

#[test]
fn hex_and_octal_literals() {
    assert_program(
        "int main(){ printf(\"%d %d %d\\n\", 0x10, 010, 0); return 0; }",
        "16 8 0\n",
        0,
    );
}

#[test]
fn ternary_and_short_circuit() {
    assert_program(
        "int main(){ int a; a = 5; printf(\"%d\\n\", a > 3 && a < 10 ? 1 : 0); return 0; }",
        "1\n",
        0,
    );
}

#[test]
fn short_circuit_skips_rhs() {
    // The RHS would divide by zero if evaluated.
    assert_program(
        "int main(){ int z; z = 0; if (z && 1 / z) printf(\"bad\\n\"); else printf(\"ok\\n\"); return 0; }",
        "ok\n",
        0,
    );
}

#[test]
fn increment_decrement() {
    assert_program(
        "int main(){ int i; i = 5; printf(\"%d %d %d %d\\n\", i++, i, --i, i); return 0; }",
        "5 6 5 5\n",
        0,
    );
}

#[test]
fn negation_and_complement() {
    assert_program(
        "int main(){ printf(\"%d %d %d\\n\", -5, !0, ~0); return 0; }",
        "-5 1 -1\n",
        0,
    );
}

#[test]
fn adjacent_string_literals() {
    assert_program(
        "int main(){ printf(\"ab\" \"cd\\n\"); return 0; }",
        "abcd\n",
        0,
    );
}

#[test]
fn char_literals_and_escapes() {
    assert_program(
        "int main(){ printf(\"%c%c%d\\n\", 'h', 'i', '\\n'); return 0; }",
        "hi10\n",
        0,
    );
}

#[test]
fn string_conversion_in_printf() {
    assert_program(
        "int main(){ printf(\"%s!\\n\", \"ok\"); return 0; }",
        "ok!\n",
        0,
    );
}

#[test]
fn casts_between_char_and_int_pointers() {
    assert_program(
        "int main(){ int *w; char *c; w = (int *)malloc(8); *w = 65; c = (char *)w; printf(\"%c\\n\", *c); return 0; }",
        "A\n",
        0,
    );
}

// ============================================================================
// Process surface
// ============================================================================

#[test]
fn exit_syscall_stops_the_program() {
    assert_program(
        "int main(){ exit(3); printf(\"unreachable\\n\"); return 0; }",
        "",
        3,
    );
}

#[test]
fn exit_code_from_main_return() {
    assert_program("int main(){ return 41 + 1; }", "", 42);
}

#[test]
fn argc_argv_reach_the_guest() {
    let (out, code) = run_with_args(
        "int main(int argc, char **argv){ printf(\"%d %s\\n\", argc - 1, *(argv + 1)); return 0; }",
        &["alpha"],
    );
    assert_eq!(out, "1 alpha\n");
    assert_eq!(code, 0);
}

#[test]
fn argv_zero_is_the_source_name() {
    let (out, _) = run_with_args(
        "int main(int argc, char **argv){ printf(\"%s\\n\", *argv); return 0; }",
        &[],
    );
    assert_eq!(out, "test.c\n");
}

// ============================================================================
// Listing and trace modes
// ============================================================================

#[test]
fn listing_mode_does_not_execute() {
    let source = SourceFile::new(
        "test.c",
        "int main()\n{\n  printf(\"side effect\\n\");\n  return 0;\n}\n",
    );
    let mut out: Vec<u8> = Vec::new();
    Session::new().list(&source, &mut out).unwrap();
    let text = String::from_utf8_lossy(&out);
    assert!(!text.contains("side effect\n"), "guest code must not run");
    assert!(text.contains("1: int main()"));
    assert!(text.contains("ENT"));
    assert!(text.contains("PRTF"));
    assert!(text.contains("LEV"));
}

#[test]
fn trace_mode_interleaves_instructions() {
    let source = SourceFile::new("test.c", "int main(){ return 0; }\n");
    let mut out: Vec<u8> = Vec::new();
    let code = Session::new()
        .with_trace(true)
        .run(&source, &[], &mut out)
        .unwrap();
    assert_eq!(code, 0);
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("1> ENT"));
    assert!(text.contains("LEV"));
}

// ============================================================================
// Larger programs
// ============================================================================

#[test]
fn string_length_and_copy_routines() {
    assert_program(
        "int slen(char *s){ int n; n = 0; while (*s) { n = n + 1; s = s + 1; } return n; }\n\
         int scopy(char *d, char *s){ int n; n = 0; while (*s) { *d = *s; d = d + 1; s = s + 1; n = n + 1; } *d = 0; return n; }\n\
         int main(){ char *buf; buf = (char *)malloc(32); scopy(buf, \"minic\"); printf(\"%s %d\\n\", buf, slen(buf)); return 0; }",
        "minic 5\n",
        0,
    );
}

#[test]
fn sieve_counts_primes() {
    assert_program(
        "int main(){\n\
         char *seen; int i; int j; int count;\n\
         seen = (char *)malloc(100);\n\
         memset(seen, 0, 100);\n\
         count = 0;\n\
         i = 2;\n\
         while (i < 100) {\n\
           if (!seen[i]) { count = count + 1; j = i + i; while (j < 100) { seen[j] = 1; j = j + i; } }\n\
           i = i + 1;\n\
         }\n\
         printf(\"%d\\n\", count);\n\
         return 0; }",
        "25\n",
        0,
    );
}

#[test]
fn malloc_exhaustion_returns_null() {
    let source = SourceFile::new(
        "test.c",
        "int main(){ if (!malloc(128)) printf(\"oom\\n\"); return 0; }",
    );
    let mut out: Vec<u8> = Vec::new();
    let code = Session::new()
        .with_config(minic::MachineConfig {
            heap_size: 64,
            stack_size: 4096,
        })
        .run(&source, &[], &mut out)
        .unwrap();
    assert_eq!(code, 0);
    assert_eq!(out, b"oom\n");
}

#[test]
fn mutual_recursion() {
    // is_even calls is_odd before its definition; the JSR is patched
    // when the definition is reached.
    assert_program(
        "int is_even(int n){ if (n == 0) return 1; return is_odd(n - 1); }\n\
         int is_odd(int n){ if (n == 0) return 0; return is_even(n - 1); }\n\
         int main(){ printf(\"%d %d\\n\", is_even(10), is_odd(10)); return 0; }",
        "1 0\n",
        0,
    );
}
