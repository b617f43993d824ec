//! minic command line: `minic [-s] [-d] <file> [args...]`
//!
//! `-s` lists each source line with the code emitted for it instead of
//! running; `-d` traces every instruction during execution. Remaining
//! arguments are handed to the guest program. The process exit code is
//! the guest's, or -1 for any compile-time or runtime error.

use std::io::Write;
use std::{env, fs, io, process};

use minic::Session;
use minic_core::SourceFile;

fn main() {
    process::exit(real_main());
}

fn real_main() -> i32 {
    let argv: Vec<String> = env::args().skip(1).collect();

    let mut listing = false;
    let mut trace = false;
    let mut index = 0;
    while index < argv.len() && argv[index].starts_with('-') {
        match argv[index].as_str() {
            "-s" => listing = true,
            "-d" => trace = true,
            _ => return usage(),
        }
        index += 1;
    }
    let Some(path) = argv.get(index) else {
        return usage();
    };
    let guest_args: Vec<&str> = argv[index + 1..].iter().map(|s| s.as_str()).collect();

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            println!("could not read {}: {}", path, err);
            return -1;
        }
    };
    let source = SourceFile::new(path.as_str(), text);
    let session = Session::new().with_trace(trace);

    let mut stdout = io::stdout();
    let result = if listing {
        session.list(&source, &mut stdout).map(|_| 0)
    } else {
        session.run(&source, &guest_args, &mut stdout)
    };
    let _ = stdout.flush();

    match result {
        Ok(code) => code as i32,
        Err(err) => {
            println!("{}", err);
            -1
        }
    }
}

fn usage() -> i32 {
    println!("usage: minic [-s] [-d] file [args...]");
    -1
}
