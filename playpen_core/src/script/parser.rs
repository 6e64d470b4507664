//! Recursive-descent parser producing [`Program`]s.
//!
//! Semicolons are optional where a line break, a closing brace or the end of
//! input ends a statement.

use std::rc::Rc;

use super::ast::*;
use super::error::EvalError;
use super::lexer::{tokenize, Keyword, Punct, Spanned, TemplatePart, Token};

/// Syntax tree levels a script may nest: blocks, statements, operands and
/// operator chains all count.
pub const MAX_NESTING: usize = 100;

/// Parse a whole script.
pub fn parse_program(source: &str) -> Result<Program, EvalError> {
    let tokens = tokenize(source, 1)?;
    let mut parser = Parser::new(tokens, 0);
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.statement()?);
    }
    Ok(Program { body })
}

/// Parse the body of a template substitution found `depth` levels down.
fn parse_embedded_expr(source: &str, line: u32, depth: usize) -> Result<Expr, EvalError> {
    let tokens = tokenize(source, line)?;
    let mut parser = Parser::new(tokens, depth);
    let expr = parser.expression()?;
    if !parser.at_eof() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    loop_depth: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>, depth: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            loop_depth: 0,
            depth,
        }
    }

    // ----- nesting -----

    fn enter(&mut self) -> Result<(), EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("Nesting too deep"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `parse` one level deeper.
    fn nested<T>(&mut self, parse: fn(&mut Self) -> Result<T, EvalError>) -> Result<T, EvalError> {
        self.enter()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Each link of a left-associative chain wraps the tree built so far.
    fn link(&mut self, links: &mut usize) -> Result<(), EvalError> {
        self.enter()?;
        *links += 1;
        Ok(())
    }

    fn unlink(&mut self, links: usize) {
        self.depth -= links;
    }

    // ----- token helpers -----

    fn current(&self) -> &Spanned {
        // tokenize always ends with Eof, and advance never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].token
    }

    fn advance(&mut self) -> Token {
        let token = self.current().token.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn is_punct(&self, punct: Punct) -> bool {
        matches!(self.peek(), Token::Punct(p) if *p == punct)
    }

    fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Token::Keyword(k) if *k == keyword)
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.is_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct) -> Result<(), EvalError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_ident(&mut self) -> Result<String, EvalError> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn unexpected(&self) -> EvalError {
        let current = self.current();
        let message = match &current.token {
            Token::Eof => "Unexpected end of input".to_string(),
            Token::Str(_) | Token::Template(_) => "Unexpected string".to_string(),
            Token::Number(_) => "Unexpected number".to_string(),
            Token::Ident(name) => format!("Unexpected identifier '{name}'"),
            other => format!("Unexpected token '{other}'"),
        };
        EvalError::syntax(message, current.line)
    }

    fn error(&self, message: &str) -> EvalError {
        EvalError::syntax(message, self.current().line)
    }

    /// End of a simple statement: `;`, or a position where one can be omitted.
    fn consume_semicolon(&mut self) -> Result<(), EvalError> {
        if self.eat_punct(Punct::Semicolon) {
            return Ok(());
        }
        if self.is_punct(Punct::RBrace) || self.at_eof() || self.current().newline_before {
            return Ok(());
        }
        Err(self.unexpected())
    }

    fn at_statement_end(&self) -> bool {
        self.is_punct(Punct::Semicolon)
            || self.is_punct(Punct::RBrace)
            || self.at_eof()
            || self.current().newline_before
    }

    // ----- statements -----

    fn statement(&mut self) -> Result<Stmt, EvalError> {
        self.nested(Self::statement_kind)
    }

    fn statement_kind(&mut self) -> Result<Stmt, EvalError> {
        match self.peek() {
            Token::Punct(Punct::LBrace) => Ok(Stmt::Block(self.block()?)),
            Token::Punct(Punct::Semicolon) => {
                self.advance();
                Ok(Stmt::Empty)
            }
            Token::Keyword(Keyword::Let | Keyword::Const | Keyword::Var) => {
                let stmt = self.declaration()?;
                self.consume_semicolon()?;
                Ok(stmt)
            }
            Token::Keyword(Keyword::Function) => {
                self.advance();
                let def = self.function_rest(true)?;
                Ok(Stmt::Function(def))
            }
            Token::Keyword(Keyword::If) => self.if_statement(),
            Token::Keyword(Keyword::While) => {
                self.advance();
                self.expect_punct(Punct::LParen)?;
                let test = self.expression()?;
                self.expect_punct(Punct::RParen)?;
                let body = self.loop_body()?;
                Ok(Stmt::While { test, body })
            }
            Token::Keyword(Keyword::Do) => {
                self.advance();
                let body = self.loop_body()?;
                if !self.eat_keyword(Keyword::While) {
                    return Err(self.unexpected());
                }
                self.expect_punct(Punct::LParen)?;
                let test = self.expression()?;
                self.expect_punct(Punct::RParen)?;
                self.eat_punct(Punct::Semicolon);
                Ok(Stmt::DoWhile { body, test })
            }
            Token::Keyword(Keyword::For) => self.for_statement(),
            Token::Keyword(Keyword::Return) => {
                self.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.consume_semicolon()?;
                Ok(Stmt::Return(value))
            }
            Token::Keyword(Keyword::Break) => {
                self.advance();
                if self.loop_depth == 0 {
                    return Err(self.error("Illegal break statement"));
                }
                self.consume_semicolon()?;
                Ok(Stmt::Break)
            }
            Token::Keyword(Keyword::Continue) => {
                self.advance();
                if self.loop_depth == 0 {
                    return Err(self.error("Illegal continue statement: no surrounding iteration statement"));
                }
                self.consume_semicolon()?;
                Ok(Stmt::Continue)
            }
            Token::Keyword(Keyword::Throw) => {
                self.advance();
                if self.current().newline_before {
                    return Err(self.error("Illegal newline after throw"));
                }
                let value = self.expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Throw(value))
            }
            Token::Keyword(Keyword::Try) => self.try_statement(),
            _ => {
                let expr = self.expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, EvalError> {
        self.expect_punct(Punct::LBrace)?;
        let mut body = Vec::new();
        while !self.is_punct(Punct::RBrace) {
            if self.at_eof() {
                return Err(self.unexpected());
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn loop_body(&mut self) -> Result<Box<Stmt>, EvalError> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        Ok(Box::new(body?))
    }

    fn decl_kind(&mut self) -> Option<DeclKind> {
        let kind = match self.peek() {
            Token::Keyword(Keyword::Let) => DeclKind::Let,
            Token::Keyword(Keyword::Const) => DeclKind::Const,
            Token::Keyword(Keyword::Var) => DeclKind::Var,
            _ => return None,
        };
        self.advance();
        Some(kind)
    }

    fn declaration(&mut self) -> Result<Stmt, EvalError> {
        let kind = self.decl_kind().ok_or_else(|| self.unexpected())?;
        let mut declarations = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if self.eat_punct(Punct::Assign) {
                Some(self.assignment()?)
            } else {
                None
            };
            if kind == DeclKind::Const && init.is_none() {
                return Err(self.error("Missing initializer in const declaration"));
            }
            declarations.push((name, init));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(Stmt::Declare { kind, declarations })
    }

    fn if_statement(&mut self) -> Result<Stmt, EvalError> {
        self.advance();
        self.expect_punct(Punct::LParen)?;
        let test = self.expression()?;
        self.expect_punct(Punct::RParen)?;
        let then = Box::new(self.statement()?);
        let otherwise = if self.eat_keyword(Keyword::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If { test, then, otherwise })
    }

    fn for_statement(&mut self) -> Result<Stmt, EvalError> {
        self.advance();
        self.expect_punct(Punct::LParen)?;

        // for (const x of xs)
        let is_decl = matches!(
            self.peek(),
            Token::Keyword(Keyword::Let | Keyword::Const | Keyword::Var)
        );
        if is_decl && matches!(self.peek_at(2), Token::Ident(word) if word == "of") {
            let kind = self.decl_kind().ok_or_else(|| self.unexpected())?;
            let name = self.expect_ident()?;
            self.advance(); // of
            let iterable = self.assignment()?;
            self.expect_punct(Punct::RParen)?;
            let body = self.loop_body()?;
            return Ok(Stmt::ForOf { kind, name, iterable, body });
        }

        let init = if self.is_punct(Punct::Semicolon) {
            None
        } else if is_decl {
            Some(Box::new(self.declaration()?))
        } else {
            Some(Box::new(Stmt::Expr(self.expression()?)))
        };
        self.expect_punct(Punct::Semicolon)?;

        let test = if self.is_punct(Punct::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(Punct::Semicolon)?;

        let update = if self.is_punct(Punct::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(Punct::RParen)?;

        let body = self.loop_body()?;
        Ok(Stmt::For { init, test, update, body })
    }

    fn try_statement(&mut self) -> Result<Stmt, EvalError> {
        self.advance();
        let block = self.block()?;

        let handler = if self.eat_keyword(Keyword::Catch) {
            let param = if self.eat_punct(Punct::LParen) {
                let name = self.expect_ident()?;
                self.expect_punct(Punct::RParen)?;
                Some(name)
            } else {
                None
            };
            Some(CatchClause {
                param,
                body: self.block()?,
            })
        } else {
            None
        };

        let finalizer = if self.eat_keyword(Keyword::Finally) {
            Some(self.block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Stmt::Try { block, handler, finalizer })
    }

    /// After `function`: optional name, params, body.
    fn function_rest(&mut self, require_name: bool) -> Result<Rc<FunctionDef>, EvalError> {
        let name = match self.peek() {
            Token::Ident(_) => Some(self.expect_ident()?),
            _ if require_name => return Err(self.error("Function statements require a function name")),
            _ => None,
        };
        self.expect_punct(Punct::LParen)?;
        let params = self.param_list()?;
        let body = self.function_block()?;
        Ok(Rc::new(FunctionDef {
            name,
            params,
            body: FunctionBody::Block(body),
        }))
    }

    /// Identifiers up to and including the closing `)`.
    fn param_list(&mut self) -> Result<Vec<String>, EvalError> {
        let mut params = Vec::new();
        while !self.eat_punct(Punct::RParen) {
            let name = self.expect_ident()?;
            if params.contains(&name) {
                return Err(self.error("Duplicate parameter name not allowed in this context"));
            }
            params.push(name);
            if !self.is_punct(Punct::RParen) {
                self.expect_punct(Punct::Comma)?;
            }
        }
        Ok(params)
    }

    fn function_block(&mut self) -> Result<Vec<Stmt>, EvalError> {
        let saved = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = saved;
        body
    }

    // ----- expressions -----

    fn expression(&mut self) -> Result<Expr, EvalError> {
        // The comma operator is not supported; a full expression is one assignment.
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, EvalError> {
        self.nested(Self::assignment_expr)
    }

    fn assignment_expr(&mut self) -> Result<Expr, EvalError> {
        if let Some(arrow) = self.try_arrow()? {
            return Ok(arrow);
        }

        let target = self.conditional()?;

        let op = match self.peek() {
            Token::Punct(Punct::Assign) => None,
            Token::Punct(Punct::PlusAssign) => Some(BinaryOp::Add),
            Token::Punct(Punct::MinusAssign) => Some(BinaryOp::Sub),
            Token::Punct(Punct::StarAssign) => Some(BinaryOp::Mul),
            Token::Punct(Punct::SlashAssign) => Some(BinaryOp::Div),
            Token::Punct(Punct::PercentAssign) => Some(BinaryOp::Rem),
            Token::Punct(Punct::StarStarAssign) => Some(BinaryOp::Pow),
            _ => return Ok(target),
        };

        if !matches!(target, Expr::Ident(_) | Expr::Member { .. }) {
            return Err(self.error("Invalid left-hand side in assignment"));
        }
        self.advance();
        let value = self.assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// `x => ...` or `(a, b) => ...`, detected by looking past the parameters.
    fn try_arrow(&mut self) -> Result<Option<Expr>, EvalError> {
        let params = match self.peek() {
            Token::Ident(name) if matches!(self.peek_at(1), Token::Punct(Punct::Arrow)) => {
                let name = name.clone();
                self.advance();
                vec![name]
            }
            Token::Punct(Punct::LParen) => {
                let Some(close) = self.matching_paren() else {
                    return Ok(None);
                };
                let after = self.tokens.get(close + 1).map(|t| &t.token);
                if !matches!(after, Some(Token::Punct(Punct::Arrow))) {
                    return Ok(None);
                }
                self.advance();
                self.param_list()?
            }
            _ => return Ok(None),
        };

        if self.current().newline_before {
            return Err(self.unexpected());
        }
        self.expect_punct(Punct::Arrow)?;

        let body = if self.is_punct(Punct::LBrace) {
            FunctionBody::Block(self.function_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.assignment()?))
        };

        Ok(Some(Expr::Function(Rc::new(FunctionDef {
            name: None,
            params,
            body,
        }))))
    }

    /// Index of the `)` matching the `(` at the current position.
    fn matching_paren(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (index, spanned) in self.tokens.iter().enumerate().skip(self.pos) {
            match spanned.token {
                Token::Punct(Punct::LParen) => depth += 1,
                Token::Punct(Punct::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                Token::Eof => return None,
                _ => {}
            }
        }
        None
    }

    fn conditional(&mut self) -> Result<Expr, EvalError> {
        let test = self.nullish()?;
        if !self.eat_punct(Punct::Question) {
            return Ok(test);
        }
        let then = self.assignment()?;
        self.expect_punct(Punct::Colon)?;
        let otherwise = self.assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn nullish(&mut self) -> Result<Expr, EvalError> {
        let mut links = 0;
        let mut left = self.logical_or()?;
        while self.eat_punct(Punct::QuestionQuestion) {
            self.link(&mut links)?;
            let right = self.logical_or()?;
            left = logical(LogicalOp::Nullish, left, right);
        }
        self.unlink(links);
        Ok(left)
    }

    fn logical_or(&mut self) -> Result<Expr, EvalError> {
        let mut links = 0;
        let mut left = self.logical_and()?;
        while self.eat_punct(Punct::OrOr) {
            self.link(&mut links)?;
            let right = self.logical_and()?;
            left = logical(LogicalOp::Or, left, right);
        }
        self.unlink(links);
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, EvalError> {
        let mut links = 0;
        let mut left = self.equality()?;
        while self.eat_punct(Punct::AndAnd) {
            self.link(&mut links)?;
            let right = self.equality()?;
            left = logical(LogicalOp::And, left, right);
        }
        self.unlink(links);
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, EvalError> {
        let mut links = 0;
        let mut left = self.relational()?;
        loop {
            let op = match self.peek() {
                Token::Punct(Punct::EqEq) => BinaryOp::Eq,
                Token::Punct(Punct::NotEq) => BinaryOp::NotEq,
                Token::Punct(Punct::EqEqEq) => BinaryOp::StrictEq,
                Token::Punct(Punct::NotEqEq) => BinaryOp::StrictNotEq,
                _ => break,
            };
            self.advance();
            self.link(&mut links)?;
            let right = self.relational()?;
            left = binary(op, left, right);
        }
        self.unlink(links);
        Ok(left)
    }

    fn relational(&mut self) -> Result<Expr, EvalError> {
        let mut links = 0;
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Token::Punct(Punct::Lt) => BinaryOp::Lt,
                Token::Punct(Punct::Gt) => BinaryOp::Gt,
                Token::Punct(Punct::LtEq) => BinaryOp::LtEq,
                Token::Punct(Punct::GtEq) => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            self.link(&mut links)?;
            let right = self.additive()?;
            left = binary(op, left, right);
        }
        self.unlink(links);
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        let mut links = 0;
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Punct(Punct::Plus) => BinaryOp::Add,
                Token::Punct(Punct::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.link(&mut links)?;
            let right = self.multiplicative()?;
            left = binary(op, left, right);
        }
        self.unlink(links);
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut links = 0;
        let mut left = self.exponent()?;
        loop {
            let op = match self.peek() {
                Token::Punct(Punct::Star) => BinaryOp::Mul,
                Token::Punct(Punct::Slash) => BinaryOp::Div,
                Token::Punct(Punct::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            self.link(&mut links)?;
            let right = self.exponent()?;
            left = binary(op, left, right);
        }
        self.unlink(links);
        Ok(left)
    }

    fn exponent(&mut self) -> Result<Expr, EvalError> {
        let base = self.unary()?;
        if self.eat_punct(Punct::StarStar) {
            // Right-associative: 2 ** 3 ** 2 == 2 ** 9
            let power = self.nested(Self::exponent)?;
            return Ok(binary(BinaryOp::Pow, base, power));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Token::Punct(Punct::Bang) => UnaryOp::Not,
            Token::Punct(Punct::Minus) => UnaryOp::Neg,
            Token::Punct(Punct::Plus) => UnaryOp::Plus,
            Token::Keyword(Keyword::Typeof) => UnaryOp::Typeof,
            Token::Punct(Punct::PlusPlus | Punct::MinusMinus) => {
                let increment = self.is_punct(Punct::PlusPlus);
                self.advance();
                let target = self.nested(Self::unary)?;
                return update(increment, true, target).ok_or_else(|| {
                    self.error("Invalid left-hand side expression in prefix operation")
                });
            }
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let expr = self.call_member()?;
        let increment = match self.peek() {
            Token::Punct(Punct::PlusPlus) => true,
            Token::Punct(Punct::MinusMinus) => false,
            _ => return Ok(expr),
        };
        if self.current().newline_before {
            return Ok(expr);
        }
        self.advance();
        update(increment, false, expr)
            .ok_or_else(|| self.error("Invalid left-hand side expression in postfix operation"))
    }

    fn call_member(&mut self) -> Result<Expr, EvalError> {
        let mut expr = if self.eat_keyword(Keyword::New) {
            let callee = self.member_only()?;
            let args = if self.eat_punct(Punct::LParen) {
                self.arguments()?
            } else {
                Vec::new()
            };
            Expr::New {
                callee: Box::new(callee),
                args,
            }
        } else {
            self.primary()?
        };

        let mut links = 0;
        loop {
            if matches!(self.peek(), Token::Punct(Punct::Dot | Punct::LBracket | Punct::LParen)) {
                self.link(&mut links)?;
            }
            if self.eat_punct(Punct::Dot) {
                let name = self.property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: PropertyKey::Named(name),
                };
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.expression()?;
                self.expect_punct(Punct::RBracket)?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: PropertyKey::Computed(Box::new(index)),
                };
            } else if self.eat_punct(Punct::LParen) {
                let args = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                self.unlink(links);
                return Ok(expr);
            }
        }
    }

    /// Callee of `new`: a primary with `.name` accesses, no calls.
    fn member_only(&mut self) -> Result<Expr, EvalError> {
        let mut links = 0;
        let mut expr = self.primary()?;
        while self.eat_punct(Punct::Dot) {
            self.link(&mut links)?;
            let name = self.property_name()?;
            expr = Expr::Member {
                object: Box::new(expr),
                property: PropertyKey::Named(name),
            };
        }
        self.unlink(links);
        Ok(expr)
    }

    /// After `.`: identifiers and keywords are both valid property names.
    fn property_name(&mut self) -> Result<String, EvalError> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            Token::Keyword(keyword) => {
                self.advance();
                Ok(keyword.as_str().to_string())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        while !self.eat_punct(Punct::RParen) {
            args.push(self.assignment()?);
            if !self.is_punct(Punct::RParen) {
                self.expect_punct(Punct::Comma)?;
            }
        }
        Ok(args)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.peek().clone() {
            Token::Number(value) => {
                self.advance();
                Ok(Expr::Number(value))
            }
            Token::Str(value) => {
                self.advance();
                Ok(Expr::Str(Rc::from(value)))
            }
            Token::Template(parts) => {
                self.advance();
                let mut pieces = Vec::with_capacity(parts.len());
                for part in parts {
                    pieces.push(match part {
                        TemplatePart::Text(text) => TemplatePiece::Text(text),
                        TemplatePart::Code { source, line } => TemplatePiece::Expr(parse_embedded_expr(&source, line, self.depth)?),
                    });
                }
                Ok(Expr::Template(pieces))
            }
            Token::Ident(name) => {
                self.advance();
                Ok(Expr::Ident(name))
            }
            Token::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Token::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Token::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Null)
            }
            Token::Keyword(Keyword::Function) => {
                self.advance();
                Ok(Expr::Function(self.function_rest(false)?))
            }
            Token::Punct(Punct::LParen) => {
                self.advance();
                let expr = self.expression()?;
                self.expect_punct(Punct::RParen)?;
                Ok(expr)
            }
            Token::Punct(Punct::LBracket) => {
                self.advance();
                let mut elements = Vec::new();
                while !self.eat_punct(Punct::RBracket) {
                    elements.push(self.assignment()?);
                    if !self.is_punct(Punct::RBracket) {
                        self.expect_punct(Punct::Comma)?;
                    }
                }
                Ok(Expr::Array(elements))
            }
            Token::Punct(Punct::LBrace) => self.object_literal(),
            _ => Err(self.unexpected()),
        }
    }

    fn object_literal(&mut self) -> Result<Expr, EvalError> {
        self.expect_punct(Punct::LBrace)?;
        let mut properties = Vec::new();
        while !self.eat_punct(Punct::RBrace) {
            let key = match self.peek().clone() {
                Token::Ident(name) => name,
                Token::Str(value) => value,
                Token::Number(value) => super::value::number_to_string(value),
                Token::Keyword(keyword) => keyword.as_str().to_string(),
                _ => return Err(self.unexpected()),
            };
            let shorthand_allowed = matches!(self.peek(), Token::Ident(_));
            self.advance();

            let value = if self.eat_punct(Punct::Colon) {
                self.assignment()?
            } else if self.eat_punct(Punct::LParen) {
                // Method shorthand: { area() { ... } }
                let params = self.param_list()?;
                let body = self.function_block()?;
                Expr::Function(Rc::new(FunctionDef {
                    name: Some(key.clone()),
                    params,
                    body: FunctionBody::Block(body),
                }))
            } else if shorthand_allowed {
                Expr::Ident(key.clone())
            } else {
                return Err(self.unexpected());
            };
            properties.push((key, value));

            if !self.is_punct(Punct::RBrace) {
                self.expect_punct(Punct::Comma)?;
            }
        }
        Ok(Expr::Object(properties))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr::Logical {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn update(increment: bool, prefix: bool, target: Expr) -> Option<Expr> {
    matches!(target, Expr::Ident(_) | Expr::Member { .. }).then(|| Expr::Update {
        increment,
        prefix,
        target: Box::new(target),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(source: &str) -> Expr {
        match parse_program(source).unwrap().body.remove(0) {
            Stmt::Expr(expr) => expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expr("1 + 2 * 3");
        let Expr::Binary { op: BinaryOp::Add, right, .. } = expr else {
            panic!("expected addition at the root");
        };
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let expr = parse_expr("2 ** 3 ** 2");
        let Expr::Binary { op: BinaryOp::Pow, left, right } = expr else {
            panic!("expected power at the root");
        };
        assert_eq!(*left, Expr::Number(2.0));
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn test_arrow_functions() {
        assert!(matches!(parse_expr("x => x * 2"), Expr::Function(_)));
        assert!(matches!(parse_expr("(a, b) => { return a + b }"), Expr::Function(_)));
        // A parenthesized expression is not an arrow
        assert!(matches!(parse_expr("(a + b) * 2"), Expr::Binary { .. }));
    }

    #[test]
    fn test_optional_semicolons() {
        let program = parse_program("let a = 1\nlet b = 2\nconsole.log(a + b)").unwrap();
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn test_return_on_its_own_line() {
        let program = parse_program("return\n42").unwrap();
        assert_eq!(program.body[0], Stmt::Return(None));
    }

    #[test]
    fn test_for_of_and_classic_for() {
        let program = parse_program("for (const x of [1, 2]) {}\nfor (let i = 0; i < 3; i++) {}").unwrap();
        assert!(matches!(program.body[0], Stmt::ForOf { .. }));
        assert!(matches!(program.body[1], Stmt::For { .. }));
    }

    #[test]
    fn test_object_literal_forms() {
        let program = parse_program("const o = { a: 1, 'b': 2, c, area() { return 1 } }").unwrap();
        let Stmt::Declare { declarations, .. } = &program.body[0] else {
            panic!("expected declaration");
        };
        let Some(Expr::Object(props)) = &declarations[0].1 else {
            panic!("expected object literal");
        };
        let keys: Vec<_> = props.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c", "area"]);
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_program("console.log(1").unwrap_err();
        assert_eq!(err.message, "Unexpected end of input");

        let err = parse_program("let = 5").unwrap_err();
        assert_eq!(err.message, "Unexpected token '='");

        let err = parse_program("const x;").unwrap_err();
        assert_eq!(err.message, "Missing initializer in const declaration");

        let err = parse_program("break").unwrap_err();
        assert_eq!(err.message, "Illegal break statement");

        let err = parse_program("1 = 2").unwrap_err();
        assert_eq!(err.message, "Invalid left-hand side in assignment");

        let err = parse_program("a b").unwrap_err();
        assert_eq!(err.message, "Unexpected identifier 'b'");
    }

    #[test]
    fn test_syntax_error_line() {
        let err = parse_program("let a = 1;\nlet b = ;").unwrap_err();
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_power_assignment() {
        let Expr::Assign { op, .. } = parse_expr("x **= 2") else {
            panic!("expected assignment");
        };
        assert_eq!(op, Some(BinaryOp::Pow));
    }

    /// `${`${...}`}` nested `levels` deep
    fn nested_template(levels: usize) -> String {
        let mut source = "1".to_string();
        for _ in 0..levels {
            source = format!("`${{{source}}}`");
        }
        source
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let sources = [
            "[".repeat(10_000),
            "(".repeat(20_000),
            format!("{}x", "!".repeat(10_000)),
            format!("2{}", " ** 2".repeat(10_000)),
            format!("1{}", " + 1".repeat(10_000)),
            format!("a{}", ".b".repeat(10_000)),
            "{".repeat(10_000),
            nested_template(MAX_NESTING + 50),
        ];
        for source in &sources {
            let err = parse_program(source).unwrap_err();
            assert_eq!(err.message, "Nesting too deep", "source starts with {:?}", &source[..8]);
        }
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let depth = MAX_NESTING / 4;
        let source = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
        assert!(parse_program(&source).is_ok());

        let chain = format!("1{}", " + 1".repeat(MAX_NESTING / 2));
        assert!(parse_program(&chain).is_ok());

        assert!(parse_program(&nested_template(MAX_NESTING / 4)).is_ok());
    }

    #[test]
    fn test_template_substitution_is_parsed() {
        let Expr::Template(pieces) = parse_expr("`sum: ${1 + 2}!`") else {
            panic!("expected template");
        };
        assert_eq!(pieces.len(), 3);
        assert!(matches!(pieces[1], TemplatePiece::Expr(Expr::Binary { .. })));
    }
}
