//! Tokenizer.

use std::fmt;

use super::error::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    Const,
    Var,
    Function,
    Return,
    If,
    Else,
    While,
    Do,
    For,
    Break,
    Continue,
    True,
    False,
    Null,
    Typeof,
    Throw,
    Try,
    Catch,
    Finally,
    New,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "let" => Keyword::Let,
            "const" => Keyword::Const,
            "var" => Keyword::Var,
            "function" => Keyword::Function,
            "return" => Keyword::Return,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "do" => Keyword::Do,
            "for" => Keyword::For,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "typeof" => Keyword::Typeof,
            "throw" => Keyword::Throw,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "finally" => Keyword::Finally,
            "new" => Keyword::New,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Var => "var",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Do => "do",
            Keyword::For => "for",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Typeof => "typeof",
            Keyword::Throw => "throw",
            Keyword::Try => "try",
            Keyword::Catch => "catch",
            Keyword::Finally => "finally",
            Keyword::New => "new",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Colon,
    Question,
    QuestionQuestion,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    StarStarAssign,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    PlusPlus,
    MinusMinus,
    Arrow,
}

impl Punct {
    pub fn as_str(&self) -> &'static str {
        match self {
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::Comma => ",",
            Punct::Semicolon => ";",
            Punct::Dot => ".",
            Punct::Colon => ":",
            Punct::Question => "?",
            Punct::QuestionQuestion => "??",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::StarStar => "**",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::Assign => "=",
            Punct::PlusAssign => "+=",
            Punct::MinusAssign => "-=",
            Punct::StarAssign => "*=",
            Punct::SlashAssign => "/=",
            Punct::PercentAssign => "%=",
            Punct::StarStarAssign => "**=",
            Punct::EqEq => "==",
            Punct::EqEqEq => "===",
            Punct::NotEq => "!=",
            Punct::NotEqEq => "!==",
            Punct::Lt => "<",
            Punct::Gt => ">",
            Punct::LtEq => "<=",
            Punct::GtEq => ">=",
            Punct::AndAnd => "&&",
            Punct::OrOr => "||",
            Punct::Bang => "!",
            Punct::PlusPlus => "++",
            Punct::MinusMinus => "--",
            Punct::Arrow => "=>",
        }
    }
}

// Longest first, so "===" wins over "==" and "=".
const PUNCTUATORS: &[(&str, Punct)] = &[
    ("===", Punct::EqEqEq),
    ("!==", Punct::NotEqEq),
    ("**=", Punct::StarStarAssign),
    ("**", Punct::StarStar),
    ("??", Punct::QuestionQuestion),
    ("=>", Punct::Arrow),
    ("==", Punct::EqEq),
    ("!=", Punct::NotEq),
    ("<=", Punct::LtEq),
    (">=", Punct::GtEq),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("+=", Punct::PlusAssign),
    ("-=", Punct::MinusAssign),
    ("*=", Punct::StarAssign),
    ("/=", Punct::SlashAssign),
    ("%=", Punct::PercentAssign),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    (",", Punct::Comma),
    (";", Punct::Semicolon),
    (".", Punct::Dot),
    (":", Punct::Colon),
    ("?", Punct::Question),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("=", Punct::Assign),
    ("<", Punct::Lt),
    (">", Punct::Gt),
    ("!", Punct::Bang),
];

/// A piece of a template literal
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    /// Source of a `${...}` substitution and the line it starts on
    Code { source: String, line: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Template(Vec<TemplatePart>),
    Ident(String),
    Keyword(Keyword),
    Punct(Punct),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Str(_) | Token::Template(_) => f.write_str("string"),
            Token::Ident(name) => f.write_str(name),
            Token::Keyword(keyword) => f.write_str(keyword.as_str()),
            Token::Punct(punct) => f.write_str(punct.as_str()),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    /// A line break separates this token from the previous one
    pub newline_before: bool,
}

pub fn tokenize(source: &str, first_line: u32) -> Result<Vec<Spanned>, EvalError> {
    Lexer::new(source, first_line).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    newline_before: bool,
}

impl Lexer {
    fn new(source: &str, first_line: u32) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: first_line,
            newline_before: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn invalid(&self) -> EvalError {
        EvalError::syntax("Invalid or unexpected token", self.line)
    }

    fn run(mut self) -> Result<Vec<Spanned>, EvalError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let line = self.line;
            let newline_before = std::mem::take(&mut self.newline_before);

            let Some(c) = self.peek() else {
                tokens.push(Spanned {
                    token: Token::Eof,
                    line,
                    newline_before,
                });
                return Ok(tokens);
            };

            let token = if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
                self.number()?
            } else if c == '"' || c == '\'' {
                self.string(c)?
            } else if c == '`' {
                self.template()?
            } else if is_ident_start(c) {
                let word = self.identifier();
                match Keyword::lookup(&word) {
                    Some(keyword) => Token::Keyword(keyword),
                    None => Token::Ident(word),
                }
            } else {
                self.punct()?
            };

            tokens.push(Spanned {
                token,
                line,
                newline_before,
            });
        }
    }

    fn skip_trivia(&mut self) -> Result<(), EvalError> {
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    self.newline_before = true;
                    self.bump();
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '/' if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some('\n') => self.newline_before = true,
                            Some(_) => {}
                            None => return Err(self.invalid()),
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn identifier(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_part(c) {
                break;
            }
            word.push(c);
            self.bump();
        }
        word
    }

    fn number(&mut self) -> Result<Token, EvalError> {
        let mut text = String::new();

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    text.push(c);
                } else if c != '_' {
                    break;
                }
                self.bump();
            }
            let value = u64::from_str_radix(&text, 16).map_err(|_| self.invalid())?;
            self.reject_trailing_ident()?;
            return Ok(Token::Number(value as f64));
        }

        self.digits(&mut text);
        if self.peek() == Some('.') {
            text.push('.');
            self.bump();
            self.digits(&mut text);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = self.peek_at(1);
            let has_digits = match sign {
                Some('+' | '-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if !has_digits {
                return Err(self.invalid());
            }
            text.push('e');
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.bump();
            }
            self.digits(&mut text);
        }

        self.reject_trailing_ident()?;
        text.parse::<f64>().map(Token::Number).map_err(|_| self.invalid())
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c != '_' {
                break;
            }
            self.bump();
        }
    }

    fn reject_trailing_ident(&self) -> Result<(), EvalError> {
        match self.peek() {
            Some(c) if is_ident_start(c) => Err(self.invalid()),
            _ => Ok(()),
        }
    }

    fn string(&mut self, quote: char) -> Result<Token, EvalError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(Token::Str(value)),
                Some('\\') => self.escape(&mut value)?,
                Some('\n') | None => return Err(self.invalid()),
                Some(c) => value.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), EvalError> {
        let c = self.bump().ok_or_else(|| self.invalid())?;
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\n' => {}
            'x' => {
                let code = self.hex_digits(2)?;
                out.push(char::from_u32(code).ok_or_else(|| self.invalid())?);
            }
            'u' => {
                let code = if self.peek() == Some('{') {
                    self.bump();
                    let mut code = 0u32;
                    loop {
                        match self.bump() {
                            Some('}') => break,
                            Some(c) => {
                                let digit = c.to_digit(16).ok_or_else(|| self.invalid())?;
                                code = code.checked_mul(16).and_then(|v| v.checked_add(digit)).ok_or_else(|| self.invalid())?;
                            }
                            None => return Err(self.invalid()),
                        }
                    }
                    code
                } else {
                    self.hex_digits(4)?
                };
                // Lone surrogates cannot live in a Rust string
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, EvalError> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self.bump().and_then(|c| c.to_digit(16)).ok_or_else(|| self.invalid())?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn template(&mut self) -> Result<Token, EvalError> {
        self.bump();
        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('`') => break,
                Some('\\') => self.escape(&mut text)?,
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    let line = self.line;
                    let source = self.substitution()?;
                    parts.push(TemplatePart::Code { source, line });
                }
                Some(c) => text.push(c),
                None => return Err(EvalError::syntax("Unterminated template literal", self.line)),
            }
        }
        if !text.is_empty() || parts.is_empty() {
            parts.push(TemplatePart::Text(text));
        }
        Ok(Token::Template(parts))
    }

    /// Raw source of a `${...}` body, up to the matching brace.
    fn substitution(&mut self) -> Result<String, EvalError> {
        let mut source = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        loop {
            let c = self
                .bump()
                .ok_or_else(|| EvalError::syntax("Unterminated template literal", self.line))?;
            match quote {
                Some(q) => {
                    if c == '\\' {
                        source.push(c);
                        if let Some(next) = self.bump() {
                            source.push(next);
                        }
                        continue;
                    }
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '"' | '\'' | '`' => quote = Some(c),
                    '{' => depth += 1,
                    '}' if depth == 0 => return Ok(source),
                    '}' => depth -= 1,
                    _ => {}
                },
            }
            source.push(c);
        }
    }

    fn punct(&mut self) -> Result<Token, EvalError> {
        for (text, punct) in PUNCTUATORS {
            let matches = text
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_at(i) == Some(c));
            if matches {
                for _ in 0..text.len() {
                    self.bump();
                }
                return Ok(Token::Punct(*punct));
            }
        }
        Err(self.invalid())
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source, 1)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn test_tokenizes_statement() {
        assert_eq!(
            kinds("let x = 1.5e2;"),
            vec![
                Token::Keyword(Keyword::Let),
                Token::Ident("x".into()),
                Token::Punct(Punct::Assign),
                Token::Number(150.0),
                Token::Punct(Punct::Semicolon),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_longest_punctuator_wins() {
        assert_eq!(
            kinds("a === b !== c => d ** e"),
            vec![
                Token::Ident("a".into()),
                Token::Punct(Punct::EqEqEq),
                Token::Ident("b".into()),
                Token::Punct(Punct::NotEqEq),
                Token::Ident("c".into()),
                Token::Punct(Punct::Arrow),
                Token::Ident("d".into()),
                Token::Punct(Punct::StarStar),
                Token::Ident("e".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_power_assignment_is_one_token() {
        assert_eq!(
            kinds("x **= 2"),
            vec![
                Token::Ident("x".into()),
                Token::Punct(Punct::StarStarAssign),
                Token::Number(2.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(kinds(r#"'a\'b' "c\nd" "A\x42""#)[..3], [
            Token::Str("a'b".into()),
            Token::Str("c\nd".into()),
            Token::Str("AB".into()),
        ]);
    }

    #[test]
    fn test_template_parts() {
        let tokens = kinds("`x = ${ {a: 1}.a } and ${'}'}`");
        assert_eq!(
            tokens[0],
            Token::Template(vec![
                TemplatePart::Text("x = ".into()),
                TemplatePart::Code { source: " {a: 1}.a ".into(), line: 1 },
                TemplatePart::Text(" and ".into()),
                TemplatePart::Code { source: "'}'".into(), line: 1 },
            ])
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = tokenize("a // note\n/* block\n */ b", 1).unwrap();
        assert_eq!(tokens[1].token, Token::Ident("b".into()));
        assert!(tokens[1].newline_before);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_hex_numbers() {
        assert_eq!(kinds("0xff")[0], Token::Number(255.0));
    }

    #[test]
    fn test_invalid_input() {
        assert!(tokenize("'unterminated", 1).is_err());
        assert!(tokenize("3in", 1).is_err());
        assert!(tokenize("a # b", 1).is_err());
        assert!(tokenize("`open", 1).is_err());
    }
}
