//! Tree-walking evaluator.
//!
//! Scopes are reference counted so closures can capture them. A closure
//! stored in the scope it captures forms a cycle, so every scope, array and
//! object the interpreter allocates is also recorded as a weak handle and
//! emptied when the interpreter is dropped.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::ast::{
    BinaryOp, DeclKind, Expr, FunctionBody, FunctionDef, LogicalOp, Program, PropertyKey, Stmt,
    TemplatePiece, UnaryOp,
};
use super::builtins;
use super::error::{ErrorKind, EvalError};
use super::value::{Function, Object, ObjectClass, Value};
use super::Limits;
use crate::console::{ConsoleLevel, OutputSink};

pub type Env = Rc<RefCell<Scope>>;

/// Largest index a script may grow an array to in one assignment
const MAX_ARRAY_GROWTH: usize = 1 << 20;

/// Statements and expressions evaluated inside one another, across calls.
/// Bounds native stack use independently of the call depth limit.
const MAX_EVAL_NESTING: usize = 160;

#[derive(Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Default)]
pub struct Scope {
    bindings: HashMap<String, Binding>,
    parent: Option<Env>,
}

/// Non-local exits out of expression evaluation.
pub enum Control {
    /// A script-level exception; `try`/`catch` can handle it
    Throw(Value),
    /// Evaluation stopped by the host. Never caught by scripts.
    Abort(EvalError),
}

enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub type Eval<T> = Result<T, Control>;

struct WeakList<T> {
    items: Vec<Weak<RefCell<T>>>,
    prune_at: usize,
}

impl<T> WeakList<T> {
    fn new() -> Self {
        WeakList {
            items: Vec::new(),
            prune_at: 256,
        }
    }

    fn track(&mut self, value: &Rc<RefCell<T>>) {
        if self.items.len() >= self.prune_at {
            self.items.retain(|weak| weak.strong_count() > 0);
            self.prune_at = (self.items.len() * 2).max(256);
        }
        self.items.push(Rc::downgrade(value));
    }

    /// Strong handles to every value still alive. Empties the list.
    fn take_live(&mut self) -> Vec<Rc<RefCell<T>>> {
        self.items.drain(..).filter_map(|weak| weak.upgrade()).collect()
    }
}

fn clear_each<T>(values: &[Rc<RefCell<T>>], mut clear: impl FnMut(&mut T)) {
    for value in values {
        if let Ok(mut inner) = value.try_borrow_mut() {
            clear(&mut inner);
        }
    }
}

pub struct Interpreter<'a> {
    globals: Env,
    output: &'a mut dyn OutputSink,
    limits: Limits,
    steps: u64,
    depth: usize,
    nesting: usize,
    scopes: WeakList<Scope>,
    arrays: WeakList<Vec<Value>>,
    objects: WeakList<Object>,
}

impl<'a> Interpreter<'a> {
    pub fn new(output: &'a mut dyn OutputSink, limits: Limits) -> Self {
        let globals: Env = Rc::new(RefCell::new(Scope::default()));
        let mut interpreter = Interpreter {
            globals: globals.clone(),
            output,
            limits,
            steps: 0,
            depth: 0,
            nesting: 0,
            scopes: WeakList::new(),
            arrays: WeakList::new(),
            objects: WeakList::new(),
        };
        interpreter.scopes.track(&globals);
        builtins::install(&mut interpreter);
        interpreter
    }

    /// Run a parsed program. The body behaves like a function body, so a
    /// top-level `return` ends the script early.
    pub fn run(&mut self, program: &Program) -> Result<(), EvalError> {
        let globals = self.globals.clone();
        let scope = self.new_scope(&globals);
        self.hoist_vars(&program.body, &scope);
        self.hoist_functions(&program.body, &scope);

        match self.exec_stmts(&program.body, &scope) {
            Ok(_) => Ok(()),
            Err(Control::Throw(value)) => Err(error_from_value(&value)),
            Err(Control::Abort(error)) => Err(error),
        }
    }

    /// Evaluation steps consumed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().bindings.insert(
            name.to_string(),
            Binding {
                value,
                mutable: false,
            },
        );
    }

    pub fn write(&mut self, level: ConsoleLevel, text: &str) {
        self.output.write_line(level, text);
    }

    pub fn new_array(&mut self, items: Vec<Value>) -> Value {
        let array = Rc::new(RefCell::new(items));
        self.arrays.track(&array);
        Value::Array(array)
    }

    pub fn new_object(&mut self, object: Object) -> Value {
        let object = Rc::new(RefCell::new(object));
        self.objects.track(&object);
        Value::Object(object)
    }

    pub fn new_error(&mut self, kind: ErrorKind, message: &str) -> Value {
        let error = Value::error(kind, message);
        if let Value::Object(object) = &error {
            self.objects.track(object);
        }
        error
    }

    pub fn throw<T>(&mut self, kind: ErrorKind, message: impl Into<String>) -> Eval<T> {
        let message = message.into();
        Err(Control::Throw(self.new_error(kind, &message)))
    }

    fn new_scope(&mut self, parent: &Env) -> Env {
        let scope = Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent: Some(parent.clone()),
        }));
        self.scopes.track(&scope);
        scope
    }

    fn tick(&mut self) -> Eval<()> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(Control::Abort(EvalError::range(format!(
                "Script exceeded the limit of {} evaluation steps",
                self.limits.max_steps
            ))));
        }
        Ok(())
    }

    fn enter(&mut self) -> Eval<()> {
        if self.nesting >= MAX_EVAL_NESTING {
            return self.throw(ErrorKind::RangeError, "Maximum call stack size exceeded");
        }
        self.nesting += 1;
        Ok(())
    }

    // ----- bindings -----

    fn lookup(&mut self, env: &Env, name: &str) -> Eval<Value> {
        let found = find_binding_scope(env, name).and_then(|scope| {
            let scope = scope.borrow();
            scope.bindings.get(name).map(|binding| binding.value.clone())
        });
        match found {
            Some(value) => Ok(value),
            None => self.throw(ErrorKind::ReferenceError, format!("{name} is not defined")),
        }
    }

    fn assign_var(&mut self, env: &Env, name: &str, value: Value) -> Eval<()> {
        let Some(scope) = find_binding_scope(env, name) else {
            return self.throw(ErrorKind::ReferenceError, format!("{name} is not defined"));
        };
        let mut scope = scope.borrow_mut();
        let Some(binding) = scope.bindings.get_mut(name) else {
            return Ok(());
        };
        if !binding.mutable {
            return self.throw(ErrorKind::TypeError, "Assignment to constant variable.");
        }
        binding.value = value;
        Ok(())
    }

    fn declare(&mut self, env: &Env, name: &str, value: Value, mutable: bool) -> Eval<()> {
        let mut scope = env.borrow_mut();
        if scope.bindings.contains_key(name) {
            return self.throw(
                ErrorKind::SyntaxError,
                format!("Identifier '{name}' has already been declared"),
            );
        }
        scope.bindings.insert(name.to_string(), Binding { value, mutable });
        Ok(())
    }

    fn hoist_vars(&mut self, body: &[Stmt], env: &Env) {
        for stmt in body {
            self.hoist_vars_in(stmt, env);
        }
    }

    fn hoist_vars_in(&mut self, stmt: &Stmt, env: &Env) {
        let declare_var = |name: &str| {
            env.borrow_mut()
                .bindings
                .entry(name.to_string())
                .or_insert(Binding {
                    value: Value::Undefined,
                    mutable: true,
                });
        };
        match stmt {
            Stmt::Declare {
                kind: DeclKind::Var,
                declarations,
            } => {
                for (name, _) in declarations {
                    declare_var(name);
                }
            }
            Stmt::ForOf {
                kind: DeclKind::Var,
                name,
                body,
                ..
            } => {
                declare_var(name);
                self.hoist_vars_in(body, env);
            }
            Stmt::ForOf { body, .. } | Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
                self.hoist_vars_in(body, env)
            }
            Stmt::If {
                then, otherwise, ..
            } => {
                self.hoist_vars_in(then, env);
                if let Some(otherwise) = otherwise {
                    self.hoist_vars_in(otherwise, env);
                }
            }
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    self.hoist_vars_in(init, env);
                }
                self.hoist_vars_in(body, env);
            }
            Stmt::Block(body) => self.hoist_vars(body, env),
            Stmt::Try {
                block,
                handler,
                finalizer,
            } => {
                self.hoist_vars(block, env);
                if let Some(handler) = handler {
                    self.hoist_vars(&handler.body, env);
                }
                if let Some(finalizer) = finalizer {
                    self.hoist_vars(finalizer, env);
                }
            }
            _ => {}
        }
    }

    fn hoist_functions(&mut self, body: &[Stmt], env: &Env) {
        for stmt in body {
            if let Stmt::Function(def) = stmt {
                let name = def.name.clone().unwrap_or_default();
                let closure = closure(def, env);
                env.borrow_mut().bindings.insert(
                    name,
                    Binding {
                        value: closure,
                        mutable: true,
                    },
                );
            }
        }
    }

    // ----- statements -----

    fn exec_block(&mut self, body: &[Stmt], parent: &Env) -> Eval<Completion> {
        let scope = self.new_scope(parent);
        self.hoist_functions(body, &scope);
        self.exec_stmts(body, &scope)
    }

    fn exec_stmts(&mut self, body: &[Stmt], env: &Env) -> Eval<Completion> {
        for stmt in body {
            match self.exec_stmt(stmt, env)? {
                Completion::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> Eval<Completion> {
        self.tick()?;
        self.enter()?;
        let completion = self.exec_stmt_kind(stmt, env);
        self.nesting -= 1;
        completion
    }

    fn exec_stmt_kind(&mut self, stmt: &Stmt, env: &Env) -> Eval<Completion> {
        match stmt {
            Stmt::Declare { kind, declarations } => {
                for (name, init) in declarations {
                    let value = match init {
                        Some(expr) => self.eval(expr, env)?,
                        None => Value::Undefined,
                    };
                    match kind {
                        DeclKind::Var if init.is_some() => self.assign_var(env, name, value)?,
                        DeclKind::Var => {}
                        DeclKind::Let => self.declare(env, name, value, true)?,
                        DeclKind::Const => self.declare(env, name, value, false)?,
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Completion::Normal),
            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Completion::Normal)
            }
            Stmt::If {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test, env)?.is_truthy() {
                    self.exec_stmt(then, env)
                } else if let Some(otherwise) = otherwise {
                    self.exec_stmt(otherwise, env)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Stmt::While { test, body } => {
                while self.eval(test, env)?.is_truthy() {
                    match self.exec_stmt(body, env)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::DoWhile { body, test } => {
                loop {
                    match self.exec_stmt(body, env)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if !self.eval(test, env)?.is_truthy() {
                        break;
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => self.exec_for(init.as_deref(), test.as_ref(), update.as_ref(), body, env),
            Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            } => self.exec_for_of(*kind, name, iterable, body, env),
            Stmt::Block(body) => self.exec_block(body, env),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::Break => Ok(Completion::Break),
            Stmt::Continue => Ok(Completion::Continue),
            Stmt::Throw(expr) => {
                let value = self.eval(expr, env)?;
                Err(Control::Throw(value))
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
            } => {
                let mut result = self.exec_block(block, env);

                if let Some(handler) = handler {
                    result = match result {
                        Err(Control::Throw(value)) => {
                            let catch_scope = self.new_scope(env);
                            if let Some(param) = &handler.param {
                                self.declare(&catch_scope, param, value, true)?;
                            }
                            self.exec_block(&handler.body, &catch_scope)
                        }
                        other => other,
                    };
                }

                if matches!(result, Err(Control::Abort(_))) {
                    return result;
                }
                if let Some(finalizer) = finalizer {
                    match self.exec_block(finalizer, env)? {
                        Completion::Normal => {}
                        other => return Ok(other),
                    }
                }
                result
            }
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        env: &Env,
    ) -> Eval<Completion> {
        let mut loop_scope = self.new_scope(env);
        // `let` loop variables get a fresh copy per iteration so closures
        // capture the value of the iteration that created them
        let per_iteration = matches!(
            init,
            Some(Stmt::Declare {
                kind: DeclKind::Let,
                ..
            })
        );

        if let Some(init) = init {
            self.exec_stmt(init, &loop_scope)?;
        }
        if per_iteration {
            loop_scope = self.copy_scope(&loop_scope, env);
        }

        loop {
            if let Some(test) = test {
                if !self.eval(test, &loop_scope)?.is_truthy() {
                    break;
                }
            }
            match self.exec_stmt(body, &loop_scope)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
            if per_iteration {
                loop_scope = self.copy_scope(&loop_scope, env);
            }
            if let Some(update) = update {
                self.eval(update, &loop_scope)?;
            }
        }
        Ok(Completion::Normal)
    }

    fn copy_scope(&mut self, source: &Env, parent: &Env) -> Env {
        let copy = self.new_scope(parent);
        copy.borrow_mut().bindings = source.borrow().bindings.clone();
        copy
    }

    fn exec_for_of(
        &mut self,
        kind: DeclKind,
        name: &str,
        iterable: &Expr,
        body: &Stmt,
        env: &Env,
    ) -> Eval<Completion> {
        let items = match self.eval(iterable, env)? {
            Value::Array(items) => items,
            Value::Str(text) => Rc::new(RefCell::new(
                text.chars().map(|c| Value::str(c.encode_utf8(&mut [0; 4]))).collect::<Vec<_>>(),
            )),
            other => {
                let description = other.to_js_string();
                return self.throw(ErrorKind::TypeError, format!("{description} is not iterable"));
            }
        };

        let mut index = 0;
        loop {
            // Read live so pushes during iteration are visited
            let next = items.borrow().get(index).cloned();
            let Some(item) = next else { break };
            index += 1;

            let iteration = self.new_scope(env);
            match kind {
                DeclKind::Var => self.assign_var(env, name, item)?,
                DeclKind::Let => self.declare(&iteration, name, item, true)?,
                DeclKind::Const => self.declare(&iteration, name, item, false)?,
            }
            match self.exec_stmt(body, &iteration)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
        }
        Ok(Completion::Normal)
    }

    // ----- expressions -----

    fn eval(&mut self, expr: &Expr, env: &Env) -> Eval<Value> {
        self.enter()?;
        let value = self.eval_expr(expr, env);
        self.nesting -= 1;
        value
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Env) -> Eval<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(text) => Ok(Value::Str(text.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Template(pieces) => {
                let mut out = String::new();
                for piece in pieces {
                    match piece {
                        TemplatePiece::Text(text) => out.push_str(text),
                        TemplatePiece::Expr(expr) => out.push_str(&self.eval(expr, env)?.to_js_string()),
                    }
                }
                Ok(Value::str(&out))
            }
            Expr::Ident(name) => self.lookup(env, name),
            Expr::Array(elements) => {
                let items = self.eval_list(elements, env)?;
                Ok(self.new_array(items))
            }
            Expr::Object(properties) => {
                let mut object = Object::new(ObjectClass::Plain);
                for (key, expr) in properties {
                    let value = self.eval(expr, env)?;
                    object.set(key, value);
                }
                Ok(self.new_object(object))
            }
            Expr::Function(def) => Ok(closure(def, env)),
            Expr::Unary { op, operand } => self.eval_unary(*op, operand, env),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            Expr::Assign { op, target, value } => self.eval_assign(*op, target, value, env),
            Expr::Update {
                increment,
                prefix,
                target,
            } => self.eval_update(*increment, *prefix, target, env),
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test, env)?.is_truthy() {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }
            Expr::Call { callee, args } => self.eval_call(callee, args, env),
            Expr::New { callee, args } => {
                let constructor = self.eval(callee, env)?;
                let args = self.eval_list(args, env)?;
                match &constructor {
                    Value::Function(function) if matches!(**function, Function::Native { .. }) => {
                        self.call_function(function, &args)
                    }
                    _ => self.throw(
                        ErrorKind::TypeError,
                        format!("{} is not a constructor", callee.describe()),
                    ),
                }
            }
            Expr::Member { object, property } => {
                let object = self.eval(object, env)?;
                let key = self.property_key(property, env)?;
                self.get_property(&object, &key)
            }
        }
    }

    fn eval_list(&mut self, exprs: &[Expr], env: &Env) -> Eval<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr, env)).collect()
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, env: &Env) -> Eval<Value> {
        // `typeof undeclared` is "undefined", not a ReferenceError
        if let (UnaryOp::Typeof, Expr::Ident(name)) = (op, operand) {
            if find_binding_scope(env, name).is_none() {
                return Ok(Value::str("undefined"));
            }
        }
        let value = self.eval(operand, env)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::Typeof => Value::str(value.type_of()),
        })
    }

    fn eval_assign(
        &mut self,
        op: Option<BinaryOp>,
        target: &Expr,
        value: &Expr,
        env: &Env,
    ) -> Eval<Value> {
        match target {
            Expr::Ident(name) => {
                let value = match op {
                    None => self.eval(value, env)?,
                    Some(op) => {
                        let current = self.lookup(env, name)?;
                        let rhs = self.eval(value, env)?;
                        binary(op, &current, &rhs)
                    }
                };
                self.assign_var(env, name, value.clone())?;
                Ok(value)
            }
            Expr::Member { object, property } => {
                let object = self.eval(object, env)?;
                let key = self.property_key(property, env)?;
                let value = match op {
                    None => self.eval(value, env)?,
                    Some(op) => {
                        let current = self.get_property(&object, &key)?;
                        let rhs = self.eval(value, env)?;
                        binary(op, &current, &rhs)
                    }
                };
                self.set_property(&object, &key, value.clone())?;
                Ok(value)
            }
            _ => self.throw(ErrorKind::SyntaxError, "Invalid left-hand side in assignment"),
        }
    }

    fn eval_update(&mut self, increment: bool, prefix: bool, target: &Expr, env: &Env) -> Eval<Value> {
        let delta = if increment { 1.0 } else { -1.0 };
        let old = match target {
            Expr::Ident(name) => {
                let old = self.lookup(env, name)?.to_number();
                self.assign_var(env, name, Value::Number(old + delta))?;
                old
            }
            Expr::Member { object, property } => {
                let object = self.eval(object, env)?;
                let key = self.property_key(property, env)?;
                let old = self.get_property(&object, &key)?.to_number();
                self.set_property(&object, &key, Value::Number(old + delta))?;
                old
            }
            _ => {
                return self.throw(
                    ErrorKind::SyntaxError,
                    "Invalid left-hand side expression in postfix operation",
                )
            }
        };
        Ok(Value::Number(if prefix { old + delta } else { old }))
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], env: &Env) -> Eval<Value> {
        if let Expr::Member { object, property } = callee {
            let receiver = self.eval(object, env)?;
            let key = self.property_key(property, env)?;
            let args = self.eval_list(args, env)?;
            if let Some(result) = builtins::call_method(self, &receiver, &key, &args) {
                return result;
            }
            let function = self.get_property(&receiver, &key)?;
            return self.call_value(&function, &args, &callee.describe());
        }

        let function = self.eval(callee, env)?;
        let args = self.eval_list(args, env)?;
        self.call_value(&function, &args, &callee.describe())
    }

    fn property_key(&mut self, property: &PropertyKey, env: &Env) -> Eval<String> {
        match property {
            PropertyKey::Named(name) => Ok(name.clone()),
            PropertyKey::Computed(expr) => Ok(self.eval(expr, env)?.to_js_string()),
        }
    }

    // ----- properties -----

    pub fn get_property(&mut self, object: &Value, key: &str) -> Eval<Value> {
        match object {
            Value::Undefined | Value::Null => self.throw(
                ErrorKind::TypeError,
                format!("Cannot read properties of {} (reading '{key}')", object.to_js_string()),
            ),
            Value::Array(items) => {
                let items = items.borrow();
                if key == "length" {
                    return Ok(Value::Number(items.len() as f64));
                }
                let item = array_index(key).and_then(|index| items.get(index).cloned());
                Ok(item.unwrap_or(Value::Undefined))
            }
            Value::Str(text) => {
                if key == "length" {
                    return Ok(Value::Number(text.chars().count() as f64));
                }
                Ok(array_index(key)
                    .and_then(|index| text.chars().nth(index))
                    .map(|c| Value::str(c.encode_utf8(&mut [0; 4])))
                    .unwrap_or(Value::Undefined))
            }
            Value::Object(object) => Ok(object.borrow().get(key).cloned().unwrap_or(Value::Undefined)),
            Value::Function(function) => {
                if key == "name" {
                    return Ok(Value::str(function.name()));
                }
                Ok(match &**function {
                    Function::Native { name, .. } => builtins::static_property(name, key),
                    Function::Script { .. } => None,
                }
                .unwrap_or(Value::Undefined))
            }
            Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
        }
    }

    pub fn set_property(&mut self, object: &Value, key: &str, value: Value) -> Eval<()> {
        match object {
            Value::Undefined | Value::Null => self.throw(
                ErrorKind::TypeError,
                format!("Cannot set properties of {} (setting '{key}')", object.to_js_string()),
            ),
            Value::Array(items) => {
                let len = items.borrow().len();
                let (index, resize) = if key == "length" {
                    let requested = value.to_number();
                    if requested < 0.0 || requested.fract() != 0.0 || !requested.is_finite() {
                        return self.throw(ErrorKind::RangeError, "Invalid array length");
                    }
                    (None, requested as usize)
                } else if let Some(index) = array_index(key) {
                    (Some(index), len.max(index + 1))
                } else {
                    return Ok(());
                };
                if resize > len + MAX_ARRAY_GROWTH {
                    return self.throw(ErrorKind::RangeError, "Invalid array length");
                }
                let mut items = items.borrow_mut();
                items.resize(resize, Value::Undefined);
                if let Some(index) = index {
                    items[index] = value;
                }
                Ok(())
            }
            Value::Object(object) => {
                object.borrow_mut().set(key, value);
                Ok(())
            }
            Value::Bool(_) | Value::Number(_) | Value::Str(_) | Value::Function(_) => Ok(()),
        }
    }

    // ----- calls -----

    pub fn call_value(&mut self, function: &Value, args: &[Value], description: &str) -> Eval<Value> {
        match function {
            Value::Function(function) => self.call_function(function, args),
            _ => self.throw(ErrorKind::TypeError, format!("{description} is not a function")),
        }
    }

    pub fn call_function(&mut self, function: &Rc<Function>, args: &[Value]) -> Eval<Value> {
        self.tick()?;
        if self.depth >= self.limits.max_call_depth {
            return self.throw(ErrorKind::RangeError, "Maximum call stack size exceeded");
        }

        self.depth += 1;
        let result = match &**function {
            Function::Native { func, .. } => func(self, args),
            Function::Script { def, env } => self.call_script(function, def, env, args),
        };
        self.depth -= 1;
        result
    }

    fn call_script(
        &mut self,
        function: &Rc<Function>,
        def: &FunctionDef,
        env: &Env,
        args: &[Value],
    ) -> Eval<Value> {
        let scope = self.new_scope(env);
        {
            let mut frame = scope.borrow_mut();
            if let Some(name) = &def.name {
                frame.bindings.insert(
                    name.clone(),
                    Binding {
                        value: Value::Function(function.clone()),
                        mutable: true,
                    },
                );
            }
            for (index, param) in def.params.iter().enumerate() {
                frame.bindings.insert(
                    param.clone(),
                    Binding {
                        value: args.get(index).cloned().unwrap_or(Value::Undefined),
                        mutable: true,
                    },
                );
            }
        }

        match &def.body {
            FunctionBody::Expr(expr) => self.eval(expr, &scope),
            FunctionBody::Block(body) => {
                self.hoist_vars(body, &scope);
                self.hoist_functions(body, &scope);
                match self.exec_stmts(body, &scope)? {
                    Completion::Return(value) => Ok(value),
                    _ => Ok(Value::Undefined),
                }
            }
        }
    }
}

impl Drop for Interpreter<'_> {
    fn drop(&mut self) {
        // Everything stays alive until all of it is empty, so a deeply nested
        // array is taken apart one level at a time instead of recursively.
        let scopes = self.scopes.take_live();
        let arrays = self.arrays.take_live();
        let objects = self.objects.take_live();
        clear_each(&scopes, |scope| {
            scope.bindings.clear();
            scope.parent = None;
        });
        clear_each(&arrays, Vec::clear);
        clear_each(&objects, Object::clear);
    }
}

fn find_binding_scope(env: &Env, name: &str) -> Option<Env> {
    let mut current = env.clone();
    loop {
        let parent = {
            let scope = current.borrow();
            if scope.bindings.contains_key(name) {
                return Some(current.clone());
            }
            scope.parent.clone()?
        };
        current = parent;
    }
}

fn closure(def: &Rc<FunctionDef>, env: &Env) -> Value {
    Value::Function(Rc::new(Function::Script {
        def: def.clone(),
        env: env.clone(),
    }))
}

/// Canonical array index: "0", "1", ... but not "01" or "1.5"
fn array_index(key: &str) -> Option<usize> {
    key.parse::<usize>().ok().filter(|index| index.to_string() == key)
}

fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Function(_) => Value::str(&value.to_js_string()),
        other => other.clone(),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let (left, right) = (to_primitive(left), to_primitive(right));
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                let mut text = left.to_js_string();
                text.push_str(&right.to_js_string());
                Value::str(&text)
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Pow => Value::Number(js_pow(left.to_number(), right.to_number())),
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::NotEq => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEq => Value::Bool(!left.strict_equals(right)),
        BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::LtEq => Value::Bool(matches!(compare(left, right), Some(Ordering::Less | Ordering::Equal))),
        BinaryOp::GtEq => {
            Value::Bool(matches!(compare(left, right), Some(Ordering::Greater | Ordering::Equal)))
        }
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (to_primitive(left), to_primitive(right)) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(&b)),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn js_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

/// Convert an uncaught exception into the error a caller sees.
pub fn error_from_value(value: &Value) -> EvalError {
    if let Value::Object(object) = value {
        if let Ok(object) = object.try_borrow() {
            if let ObjectClass::Error(kind) = object.class {
                let message = object.get("message").map(Value::to_js_string).unwrap_or_default();
                return EvalError::new(kind, message);
            }
        }
    }
    EvalError::new(ErrorKind::Error, value.to_js_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleLog;
    use crate::script::parser::parse_program;

    fn limits() -> Limits {
        Limits {
            max_steps: 100_000,
            max_call_depth: 32,
        }
    }

    fn run(source: &str) -> (Vec<String>, Result<(), EvalError>) {
        let mut log = ConsoleLog::new();
        let result = {
            let program = parse_program(source).expect("test source should parse");
            let mut interpreter = Interpreter::new(&mut log, limits());
            interpreter.run(&program)
        };
        let lines = log.texts().into_iter().map(str::to_string).collect();
        (lines, result)
    }

    fn output(source: &str) -> Vec<String> {
        let (lines, result) = run(source);
        assert!(result.is_ok(), "unexpected failure: {result:?}");
        lines
    }

    #[test]
    fn test_arithmetic_and_precedence() {
        assert_eq!(output("console.log(1 + 2 * 3, (1 + 2) * 3, 2 ** 3 ** 2, 7 % 3)"), vec!["7 9 512 1"]);
        assert_eq!(output("console.log('1' + 2, '3' * '4', 1 / 0, -'x')"), vec!["12 12 Infinity NaN"]);
    }

    #[test]
    fn test_closures_capture_scope() {
        let source = "
            function counter() {
                let count = 0;
                return () => ++count;
            }
            const next = counter();
            next();
            next();
            console.log(next());
        ";
        assert_eq!(output(source), vec!["3"]);
    }

    #[test]
    fn test_for_let_binds_per_iteration() {
        let source = "
            const fns = [];
            for (let i = 0; i < 3; i++) {
                fns.push(() => i);
            }
            console.log(fns.map(f => f()).join(','));
        ";
        assert_eq!(output(source), vec!["0,1,2"]);
    }

    #[test]
    fn test_var_and_function_hoisting() {
        let source = "
            console.log(typeof later, hoisted);
            if (true) { var hoisted = 1; }
            function later() { return 1; }
            console.log(hoisted);
        ";
        assert_eq!(output(source), vec!["function undefined", "1"]);
    }

    #[test]
    fn test_const_reassignment_is_type_error() {
        let (_, result) = run("const x = 1; x = 2;");
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::TypeError);
        assert_eq!(error.message, "Assignment to constant variable.");
    }

    #[test]
    fn test_undefined_variable_is_reference_error() {
        let (_, result) = run("console.log(missing)");
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::ReferenceError);
        assert_eq!(error.message, "missing is not defined");
        assert_eq!(output("console.log(typeof missing)"), vec!["undefined"]);
    }

    #[test]
    fn test_try_catch_finally() {
        let source = "
            try {
                null.x;
            } catch (e) {
                console.log(e.name, e.message);
            } finally {
                console.log('done');
            }
        ";
        assert_eq!(
            output(source),
            vec!["TypeError Cannot read properties of null (reading 'x')", "done"]
        );
    }

    // The thrown value's string form becomes the message, so `throw 'boom'`
    // reports "boom" rather than "undefined".
    #[test]
    fn test_uncaught_throw_of_plain_value() {
        let (lines, result) = run("console.log('before'); throw 'boom';");
        assert_eq!(lines, vec!["before"]);
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Error);
        assert_eq!(error.message, "boom");
    }

    #[test]
    fn test_top_level_return_stops_script() {
        assert_eq!(output("console.log(1); return; console.log(2);"), vec!["1"]);
    }

    #[test]
    fn test_step_budget_cannot_be_caught() {
        let (lines, result) = run("try { while (true) {} } catch (e) { console.log('caught'); }");
        assert!(lines.is_empty());
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::RangeError);
        assert!(error.message.contains("100000"));
    }

    #[test]
    fn test_call_depth_is_catchable() {
        let source = "
            function down(n) { return down(n + 1); }
            try { down(0); } catch (e) { console.log(e.message); }
        ";
        assert_eq!(output(source), vec!["Maximum call stack size exceeded"]);
    }

    #[test]
    fn test_evaluation_nesting_is_bounded_without_call_limit() {
        let mut log = ConsoleLog::new();
        let program = parse_program(
            "function down(n) { return down(n + 1); }
            try { down(0); } catch (e) { console.log(e.name, e.message); }",
        )
        .unwrap();
        let limits = Limits {
            max_steps: 100_000,
            max_call_depth: 100_000,
        };
        let result = {
            let mut interpreter = Interpreter::new(&mut log, limits);
            interpreter.run(&program)
        };
        assert!(result.is_ok(), "unexpected failure: {result:?}");
        assert_eq!(log.texts(), vec!["RangeError Maximum call stack size exceeded"]);
    }

    #[test]
    fn test_loops_break_and_continue() {
        let source = "
            let total = 0;
            for (const n of [1, 2, 3, 4, 5, 6]) {
                if (n === 5) break;
                if (n % 2) continue;
                total += n;
            }
            let i = 0;
            do { i++; } while (i < 10);
            console.log(total, i);
        ";
        assert_eq!(output(source), vec!["6 10"]);
    }

    #[test]
    fn test_array_length_assignment() {
        let source = "
            const xs = [1, 2, 3];
            xs.length = 1;
            xs[3] = 'x';
            console.log(xs.length, xs.join('-'));
        ";
        assert_eq!(output(source), vec!["4 1---x"]);
    }

    #[test]
    fn test_calling_non_function_is_type_error() {
        let (_, result) = run("const o = {}; o.missing();");
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::TypeError);
        assert_eq!(error.message, "o.missing is not a function");
    }

    #[test]
    fn test_self_referencing_closure_is_released() {
        let mut log = ConsoleLog::new();
        let program = parse_program("function f() { return f; } const g = f;").unwrap();
        let weak = {
            let mut interpreter = Interpreter::new(&mut log, limits());
            interpreter.run(&program).unwrap();
            Rc::downgrade(&interpreter.globals)
        };
        assert_eq!(weak.strong_count(), 0);
    }
}
