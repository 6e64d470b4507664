//! Interpreter for the JavaScript subset the Code Panel runs.
//!
//! Supported: `let`/`const`/`var`, functions and arrow functions with
//! closures, `if`/`while`/`do`/`for`/`for...of`, `try`/`catch`/`finally`,
//! `throw`, template literals, arrays, object literals, and the globals
//! `console`, `Math`, `JSON`, `Date.now`, `String`, `Number`, `Boolean`,
//! `Array`, `Object`, `parseInt`, `parseFloat`, `isNaN`, `isFinite` and the
//! error constructors.
//!
//! Not supported: classes, `this`, prototypes, getters, regular expressions,
//! destructuring, spread, generators, async code and modules.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::{ErrorKind, EvalError};

use crate::config::RunnerConfig;
use crate::console::{Capture, OutputSink};
use interpreter::Interpreter;

/// Resource limits for one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Statements executed plus functions called before the run is aborted
    pub max_steps: u64,
    /// Nested calls before a `RangeError` is thrown
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_steps: 1_000_000,
            max_call_depth: 64,
        }
    }
}

impl From<&RunnerConfig> for Limits {
    fn from(config: &RunnerConfig) -> Self {
        Limits {
            max_steps: config.max_steps,
            max_call_depth: config.max_call_depth,
        }
    }
}

/// Evaluates scripts with fresh globals on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptEngine {
    limits: Limits,
}

impl ScriptEngine {
    pub fn new(limits: Limits) -> Self {
        ScriptEngine { limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Parse without running.
    pub fn check(&self, source: &str) -> Result<(), EvalError> {
        parser::parse_program(source).map(|_| ())
    }

    /// Run `source`, sending console output to `sink`.
    ///
    /// Output is redirected only for the duration of this call. Lines written
    /// before a failure stay in the sink.
    pub fn evaluate(&self, source: &str, sink: &mut dyn OutputSink) -> Result<(), EvalError> {
        let program = parser::parse_program(source)?;

        let mut capture = Capture::acquire(sink);
        let mut interpreter = Interpreter::new(&mut capture, self.limits);
        let result = interpreter.run(&program);
        let steps = interpreter.steps();
        drop(interpreter);

        match &result {
            Ok(()) => tracing::debug!(steps, lines = capture.lines_written(), "script finished"),
            Err(err) => tracing::debug!(steps, error = %err, "script failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleLevel, ConsoleLog};

    fn run(source: &str) -> (Vec<String>, Result<(), EvalError>) {
        let engine = ScriptEngine::default();
        let mut log = ConsoleLog::new();
        let result = engine.evaluate(source, &mut log);
        (log.texts().into_iter().map(str::to_string).collect(), result)
    }

    fn output(source: &str) -> Vec<String> {
        let (lines, result) = run(source);
        assert!(result.is_ok(), "unexpected failure: {result:?}");
        lines
    }

    #[test]
    fn test_console_log_joins_arguments() {
        assert_eq!(output("console.log('a', 1, true, null, undefined, [1, [2, 3]])"), vec![
            "a 1 true null undefined 1,2,3"
        ]);
    }

    #[test]
    fn test_console_levels() {
        let engine = ScriptEngine::default();
        let mut log = ConsoleLog::new();
        engine
            .evaluate("console.warn('careful'); console.error('bad'); console.info('fyi')", &mut log)
            .unwrap();
        let levels: Vec<ConsoleLevel> = log.lines().iter().map(|line| line.level).collect();
        assert_eq!(levels, vec![ConsoleLevel::Warn, ConsoleLevel::Error, ConsoleLevel::Info]);
    }

    #[test]
    fn test_syntax_error_produces_no_output() {
        let (lines, result) = run("console.log('never'); let = ;");
        assert!(lines.is_empty());
        assert_eq!(result.unwrap_err().kind, ErrorKind::SyntaxError);
    }

    #[test]
    fn test_check_does_not_run() {
        let engine = ScriptEngine::default();
        assert!(engine.check("console.log(1)").is_ok());
        assert_eq!(engine.check("if (").unwrap_err().kind, ErrorKind::SyntaxError);
    }

    #[test]
    fn test_each_evaluation_has_fresh_globals() {
        let engine = ScriptEngine::default();
        let mut log = ConsoleLog::new();
        engine.evaluate("var leftover = 1;", &mut log).unwrap();
        let err = engine.evaluate("console.log(leftover)", &mut log).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReferenceError);
    }

    #[test]
    fn test_array_methods() {
        let source = "
            const xs = [5, 1, 4, 2, 3];
            console.log(xs.map(x => x * 2).filter(x => x > 4).join(' '));
            console.log(xs.reduce((sum, x) => sum + x, 0));
            console.log(xs.slice().sort().join(), xs.join());
            console.log([10, 9, 1].sort((a, b) => a - b).join(), [10, 9, 1].sort().join());
            console.log(xs.indexOf(4), xs.includes(7), xs.find(x => x > 3), xs.at(-1));
            const removed = xs.splice(1, 2, 'a');
            console.log(removed.join(), xs.join());
            console.log([[1, 2], [3, [4]]].flat().length, Array.isArray(xs), Array(3).length);
        ";
        assert_eq!(output(source), vec![
            "10 8 6",
            "15",
            "1,2,3,4,5 5,1,4,2,3",
            "1,9,10 1,10,9",
            "2 false 5 3",
            "1,4 5,a,2,3",
            "4 true 3",
        ]);
    }

    #[test]
    fn test_string_methods() {
        let source = "
            const s = '  Hello, World  ';
            console.log(s.trim().toUpperCase(), s.trim().length);
            console.log('a,b,,c'.split(',').length, 'abc'.split('').join('-'));
            console.log('abc'.slice(-2), 'abcdef'.substring(4, 1), 'ab'.repeat(3));
            console.log('5'.padStart(3, '0'), 'x'.padEnd(3, '.') + '|');
            console.log('a-b-c'.replace('-', '+'), 'a-b-c'.replaceAll('-', ''));
            console.log('hello'.indexOf('l'), 'hello'.startsWith('he'), 'hello'[1], 'hello'.charAt(4));
        ";
        assert_eq!(output(source), vec![
            "HELLO, WORLD 12",
            "4 a-b-c",
            "bc bcd ababab",
            "005 x..|",
            "a+b-c abc",
            "2 true e o",
        ]);
    }

    #[test]
    fn test_template_literals() {
        assert_eq!(output("const n = 3; console.log(`n = ${n}, doubled = ${n * 2}, ${'}'}`)"), vec![
            "n = 3, doubled = 6, }"
        ]);
    }

    #[test]
    fn test_json_round_trip_keeps_key_order() {
        let source = r#"
            const data = { zeta: 1, alpha: [true, null, 'x'], nested: { skip: undefined, f: 0.5 } };
            const text = JSON.stringify(data);
            console.log(text);
            console.log(JSON.parse(text).alpha[2]);
            console.log(JSON.stringify([1, 2], null, 2));
        "#;
        assert_eq!(output(source), vec![
            r#"{"zeta":1,"alpha":[true,null,"x"],"nested":{"f":0.5}}"#,
            "x",
            "[\n  1,\n  2\n]",
        ]);
    }

    #[test]
    fn test_json_parse_error_is_catchable() {
        let source = "
            try { JSON.parse('{oops'); } catch (e) { console.log(e.name); }
        ";
        assert_eq!(output(source), vec!["SyntaxError"]);
    }

    #[test]
    fn test_to_fixed_and_power_assignment() {
        let source = "
            console.log((0.5).toFixed(0), (2.5).toFixed(0), (-1.5).toFixed(0), (1.005).toFixed(2));
            let x = 5;
            x **= 2;
            const o = { n: 2 };
            o.n **= 10;
            console.log(x, o.n);
        ";
        assert_eq!(output(source), vec!["1 3 -2 1.00", "25 1024"]);
    }

    #[test]
    fn test_math_and_numbers() {
        let source = "
            console.log(Math.max(1, 9, 3), Math.min(), Math.round(2.5), Math.round(-2.5));
            console.log((1.005).toFixed(1), (255).toString(16), parseInt('42px'), parseFloat('3.5e1x'));
            console.log(0.1 + 0.2, 1e21, Number('  7 '), isNaN('abc'));
            const r = Math.random();
            console.log(r >= 0 && r < 1);
        ";
        assert_eq!(output(source), vec![
            "9 Infinity 3 -2",
            "1.0 ff 42 35",
            "0.30000000000000004 1e+21 7 true",
            "true",
        ]);
    }

    #[test]
    fn test_object_helpers() {
        let source = "
            const o = { b: 2, a: 1, greet() { return 'hi'; } };
            console.log(Object.keys(o).join(), o.greet(), o.hasOwnProperty('a'));
            const merged = Object.assign({}, o, { c: 3 });
            console.log(Object.entries(merged).length, merged.c, String(o));
            o.b += 5;
            o['a']++;
            console.log(o.a, o.b, o.missing);
        ";
        assert_eq!(output(source), vec![
            "b,a,greet hi true",
            "4 3 [object Object]",
            "2 7 undefined",
        ]);
    }

    #[test]
    fn test_error_objects() {
        let (lines, result) = run("const e = new TypeError('nope'); console.log(`${e}`); throw e;");
        assert_eq!(lines, vec!["TypeError: nope"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert_eq!(err.message, "nope");
    }

    #[test]
    fn test_recursion() {
        let source = "
            function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
            const fact = n => n <= 1 ? 1 : n * fact(n - 1);
            console.log(fib(15), fact(10));
        ";
        assert_eq!(output(source), vec!["610 3628800"]);
    }

    #[test]
    fn test_nullish_and_logical_operators() {
        assert_eq!(output("console.log(null ?? 'd', 0 ?? 'd', 0 || 'd', 1 && 2, !'')"), vec![
            "d 0 d 2 true"
        ]);
    }

    #[test]
    fn test_step_limit_from_limits() {
        let engine = ScriptEngine::new(Limits {
            max_steps: 50,
            max_call_depth: 8,
        });
        let mut log = ConsoleLog::new();
        let err = engine
            .evaluate("for (let i = 0; i < 1000; i++) { console.log(i); }", &mut log)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RangeError);
        assert!(!log.is_empty());
        assert!(log.len() < 50);
    }
}
