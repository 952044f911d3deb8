//! Setker command-line driver.
//!
//! `setker <mode> <filename>` where the mode selects how far down the
//! pipeline to go: `tokenize` prints the token stream, `parse` the syntax
//! tree, `evaluate` the final value, and `run` executes the program for
//! its side effects.  Exit codes: 0 on success, 1 for driver errors, 65
//! for lexical or syntactic errors, 70 for runtime errors.

use std::env;
use std::fs;
use std::io;
use std::process::ExitCode;

use anyhow::Context;

use setker::ast::render_program;
use setker::interpreter::{parse_source, Interpreter};
use setker::scanner::Scanner;

const USAGE: &str = "Usage: setker <mode> <filename>";

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let mode = match args.next() {
        Some(mode) => mode,
        None => {
            eprintln!("{}", USAGE);
            eprintln!("Or use 'help' for more information.");
            return ExitCode::from(1);
        }
    };

    if mode == "help" {
        print_help();
        return ExitCode::SUCCESS;
    }

    let filename = match args.next() {
        Some(filename) => filename,
        None => {
            eprintln!("{}", USAGE);
            return ExitCode::from(1);
        }
    };

    let source = match read_source(&filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    let code = match mode.as_str() {
        "tokenize" => tokenize(&source),
        "parse" => parse(&source),
        "evaluate" => evaluate(&source),
        "run" => run(&source),
        _ => {
            eprintln!("Unknown command: {}", mode);
            eprintln!("Use 'help' for a list of available commands.");
            1
        }
    };
    ExitCode::from(code as u8)
}

fn read_source(filename: &str) -> anyhow::Result<String> {
    fs::read_to_string(filename).with_context(|| format!("Error reading file: {}", filename))
}

fn print_help() {
    println!("Available commands:");
    println!("  tokenize <filename>  - Print the token stream of the input file");
    println!("  parse <filename>     - Print the syntax tree of the input file");
    println!("  evaluate <filename>  - Print the value the input file evaluates to");
    println!("  run <filename>       - Execute the input file");
    println!("  help                 - Show this help message");
}

/// Lexical errors go to stderr as they are found; the tokens (including
/// the Eof sentinel) still print afterwards.
fn tokenize(source: &str) -> i32 {
    let (tokens, errors) = Scanner::new(source).scan_tokens();
    for e in &errors {
        eprintln!("{}", e);
    }
    for token in &tokens {
        println!("{}", token);
    }
    if errors.is_empty() {
        0
    } else {
        65
    }
}

fn parse(source: &str) -> i32 {
    match parse_source(source) {
        Ok(prg) => {
            println!("{}", render_program(&prg));
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

fn evaluate(source: &str) -> i32 {
    let result = {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut interp = Interpreter::new(&mut out);
        interp.evaluate(source)
    };
    match result {
        Ok(val) => {
            println!("{}", val);
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

fn run(source: &str) -> i32 {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut interp = Interpreter::new(&mut out);
    match interp.run(source) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}
