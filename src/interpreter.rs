//! API to control the interpreter.

use std::error::Error;
use std::fmt;
use std::io::prelude::*;

use crate::ast::Stmt;
use crate::diag::{LexError, ParseError};
use crate::eval::{Evaluator, RuntimeError, Value};
use crate::parser::Parser;
use crate::scanner::Scanner;

/// Tree-walk interpreter.
///
/// # Example
///
/// Invoke the interpreter a first time to define a function, then again to
/// call it; the global environment persists between invocations:
///
/// ```
/// # use setker::interpreter::{Interpreter, SetkerError};
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// let func_def = "
///     fun max(x, y) {
///         if (x > y) {
///             return x;
///         }
///         return y;
///     }
/// ";
/// interp.run(func_def)?;
/// interp.run("print max(10, 20);")?;
///
/// assert_eq!(output, b"20\n");
/// # Ok::<(), SetkerError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    evaluator: Evaluator<'t, W>,
}

/// Errors the interpreter can raise, by pipeline stage.
#[derive(Debug)]
pub enum SetkerError {
    /// Every lexical error found in one scan.
    Lex(Vec<LexError>),

    /// Error occurring during syntactic analysis.
    Parse(ParseError),

    /// Error occurring during evaluation.
    Runtime(RuntimeError),
}

impl SetkerError {
    /// The process exit code mandated for this error: 65 for lexical and
    /// syntactic faults, 70 for runtime faults (which the parse-time
    /// assignment-target check counts as).
    pub fn exit_code(&self) -> i32 {
        match self {
            SetkerError::Lex(_) => 65,
            SetkerError::Parse(e) => e.exit_code(),
            SetkerError::Runtime(_) => 70,
        }
    }
}

impl fmt::Display for SetkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetkerError::Lex(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
            SetkerError::Parse(e) => write!(f, "{}", e),
            SetkerError::Runtime(e) => write!(f, "{}", e),
        }
    }
}

impl Error for SetkerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SetkerError::Lex(_) => None,
            SetkerError::Parse(e) => Some(e),
            SetkerError::Runtime(e) => Some(e),
        }
    }
}

impl From<ParseError> for SetkerError {
    fn from(e: ParseError) -> SetkerError {
        SetkerError::Parse(e)
    }
}

impl From<RuntimeError> for SetkerError {
    fn from(e: RuntimeError) -> SetkerError {
        SetkerError::Runtime(e)
    }
}

/// Scans and parses a source text into a program.
pub fn parse_source(source: &str) -> Result<Vec<Stmt>, SetkerError> {
    let (tokens, errors) = Scanner::new(source).scan_tokens();
    if !errors.is_empty() {
        return Err(SetkerError::Lex(errors));
    }
    let prg = Parser::new(tokens).parse_program()?;
    Ok(prg)
}

impl<'t, W: Write> Interpreter<'t, W> {
    pub fn new(output: &'t mut W) -> Interpreter<'t, W> {
        Interpreter {
            evaluator: Evaluator::new(output),
        }
    }

    /// Runs a program for its side effects.
    pub fn run(&mut self, source: &str) -> Result<(), SetkerError> {
        self.evaluate(source)?;
        Ok(())
    }

    /// Runs a program and returns the value of its last statement.
    pub fn evaluate(&mut self, source: &str) -> Result<Value, SetkerError> {
        let prg = parse_source(source)?;
        let val = self.evaluator.eval_program(&prg)?;
        Ok(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(input: &str) -> Result<String, SetkerError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        interp.run(input)?;
        Ok(String::from_utf8(raw_output).expect("cannot convert output to string"))
    }

    fn evaluate(input: &str) -> Result<String, SetkerError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        let val = interp.evaluate(input)?;
        Ok(val.to_string())
    }

    #[test]
    fn precedence_end_to_end() -> Result<(), SetkerError> {
        assert_eq!(interpret("print 1 + 2 * 3;")?, "7\n");
        Ok(())
    }

    #[test]
    fn shadowing_in_a_block() -> Result<(), SetkerError> {
        assert_eq!(
            interpret("var x = 5; { var x = x + 1; print x; } print x;")?,
            "6\n5\n"
        );
        Ok(())
    }

    #[test]
    fn recursive_factorial() -> Result<(), SetkerError> {
        let prg = "fun fact(n) { if (n <= 1) return 1; return n * fact(n - 1); } print fact(5);";
        assert_eq!(interpret(prg)?, "120\n");
        Ok(())
    }

    #[test]
    fn closure_counter_survives_its_maker() -> Result<(), SetkerError> {
        let prg = "
            fun mk() {
                var c = 0;
                fun inc() {
                    c = c + 1;
                    return c;
                }
                return inc;
            }
            var f = mk();
            print f();
            print f();
        ";
        assert_eq!(interpret(prg)?, "1\n2\n");
        Ok(())
    }

    #[test]
    fn two_counters_do_not_share_state() -> Result<(), SetkerError> {
        let prg = "
            fun mk() {
                var c = 0;
                fun inc() {
                    c = c + 1;
                    return c;
                }
                return inc;
            }
            var a = mk();
            var b = mk();
            print a();
            print a();
            print b();
        ";
        assert_eq!(interpret(prg)?, "1\n2\n1\n");
        Ok(())
    }

    #[test]
    fn string_coercion_in_plus() -> Result<(), SetkerError> {
        assert_eq!(interpret("print \"a\" + 1;")?, "a1\n");
        assert_eq!(interpret("print 1 + \"a\";")?, "1a\n");
        assert_eq!(interpret("print true + \"!\";")?, "true!\n");
        Ok(())
    }

    #[test]
    fn adding_a_bool_to_a_number_is_a_type_error() {
        let err = interpret("print 1 + true;").unwrap_err();
        assert_eq!(err.exit_code(), 70);
        assert_eq!(err.to_string(), "Operands must be numbers.");
    }

    #[test]
    fn assignment_is_an_expression() -> Result<(), SetkerError> {
        assert_eq!(interpret("var a; print a = 3; print a;")?, "3\n3\n");
        Ok(())
    }

    #[test]
    fn unterminated_string_maps_to_exit_65() {
        let err = interpret("\"abc").unwrap_err();
        assert_eq!(err.exit_code(), 65);
        assert_eq!(err.to_string(), "[line 1] Error: Unterminated string.");
    }

    #[test]
    fn every_lexical_error_is_reported() {
        let err = interpret("$\n@").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[line 1] Error: Unexpected character: $\n[line 2] Error: Unexpected character: @"
        );
    }

    #[test]
    fn if_else_branches() -> Result<(), SetkerError> {
        assert_eq!(
            interpret("var x; if (2 + 2 == 4) x = 1; else x = 2; print x;")?,
            "1\n"
        );
        assert_eq!(
            interpret("var x; if (2 + 2 != 4) x = 1; else x = 2; print x;")?,
            "2\n"
        );
        Ok(())
    }

    #[test]
    fn while_loop_counts() -> Result<(), SetkerError> {
        let prg = "var i = 0; while (i < 3) { print i; i = i + 1; }";
        assert_eq!(interpret(prg)?, "0\n1\n2\n");
        Ok(())
    }

    #[test]
    fn for_loop_counts() -> Result<(), SetkerError> {
        assert_eq!(
            interpret("for (var i = 0; i < 3; i = i + 1) print i;")?,
            "0\n1\n2\n"
        );
        Ok(())
    }

    #[test]
    fn for_loop_initializer_scope_ends_with_the_loop() {
        let err = interpret("for (var i = 0; i < 1; i = i + 1) {} print i;").unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'i'.");
    }

    #[test]
    fn short_circuit_prevents_side_effects() -> Result<(), SetkerError> {
        let prg = "var x = 0; false and (x = 1); print x; true or (x = 2); print x;";
        assert_eq!(interpret(prg)?, "0\n0\n");
        Ok(())
    }

    #[test]
    fn logical_operators_yield_operands() -> Result<(), SetkerError> {
        assert_eq!(interpret("print nil or \"fallback\";")?, "fallback\n");
        assert_eq!(interpret("print 1 and 2;")?, "2\n");
        Ok(())
    }

    #[test]
    fn return_without_value_yields_nil() -> Result<(), SetkerError> {
        assert_eq!(
            interpret("fun f() { return; print 666; } print f();")?,
            "nil\n"
        );
        Ok(())
    }

    #[test]
    fn return_unwinds_nested_control_flow() -> Result<(), SetkerError> {
        let prg = "
            fun find(limit) {
                var i = 0;
                while (true) {
                    if (i >= limit) {
                        return i;
                    }
                    i = i + 1;
                }
            }
            print find(4);
        ";
        assert_eq!(interpret(prg)?, "4\n");
        Ok(())
    }

    #[test]
    fn return_outside_a_function_is_a_runtime_error() {
        let err = interpret("return 1;").unwrap_err();
        assert_eq!(err.exit_code(), 70);
        assert_eq!(err.to_string(), "'return' outside of function.");
    }

    #[test]
    fn functions_are_first_class() -> Result<(), SetkerError> {
        let prg = "
            fun greet() { print \"hi\"; }
            var g = greet;
            g();
        ";
        assert_eq!(interpret(prg)?, "hi\n");
        Ok(())
    }

    #[test]
    fn call_chains_through_returned_functions() -> Result<(), SetkerError> {
        let prg = "
            fun outer() {
                fun inner() {
                    return 42;
                }
                return inner;
            }
            print outer()();
        ";
        assert_eq!(interpret(prg)?, "42\n");
        Ok(())
    }

    #[test]
    fn evaluate_returns_the_final_value() -> Result<(), SetkerError> {
        assert_eq!(evaluate("1 + 2")?, "3");
        assert_eq!(evaluate("\"quz\" + \"hello\"")?, "quzhello");
        assert_eq!(evaluate("!nil")?, "true");
        assert_eq!(evaluate("var x = 7;")?, "7");
        assert_eq!(evaluate("")?, "nil");
        Ok(())
    }

    #[test]
    fn parse_errors_stop_before_evaluation() {
        let err = interpret("print (1;").unwrap_err();
        assert_eq!(err.exit_code(), 65);
        assert_eq!(err.to_string(), "Error at ';': Expect ')'");
    }

    #[test]
    fn invalid_assignment_target_exits_70() {
        let err = interpret("1 = 2;").unwrap_err();
        assert_eq!(err.exit_code(), 70);
        assert_eq!(err.to_string(), "Invalid assignment target.");
    }

    #[test]
    fn undefined_variable_call_is_reported() {
        let err = interpret("missing();").unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'missing'.");
    }

    #[test]
    fn clock_is_available_without_declaration() -> Result<(), SetkerError> {
        assert_eq!(interpret("print clock() > 0;")?, "true\n");
        Ok(())
    }

    #[test]
    fn comments_are_invisible_to_programs() -> Result<(), SetkerError> {
        let prg = "
            // leading comment
            var x = 1; <| block
            comment |> print x;
        ";
        assert_eq!(interpret(prg)?, "1\n");
        Ok(())
    }
}
