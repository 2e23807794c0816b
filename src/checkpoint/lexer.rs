//! Tokenizer for checkpoint and body expressions

use super::{EvalError, EvalErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Plus,
    Minus,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

fn syntax(message: String) -> EvalError {
    EvalError::new(EvalErrorKind::Syntax, message)
}

/// Split `source` into tokens
pub fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '(' | ')' | '[' | ']' | '{' | '}' | ',' | ':' | '.' | '+' | '-' => {
                // A dot followed by a digit starts a float such as `.5`
                if c == '.' && chars.get(i + 1).map_or(false, char::is_ascii_digit) {
                    let (token, next) = number(&chars, i)?;
                    tokens.push(token);
                    i = next;
                    continue;
                }
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    '.' => Token::Dot,
                    '+' => Token::Plus,
                    _ => Token::Minus,
                });
                i += 1;
            }
            '=' | '!' | '<' | '>' => {
                let follows_eq = chars.get(i + 1) == Some(&'=');
                let token = match (c, follows_eq) {
                    ('=', true) => Token::Eq,
                    ('!', true) => Token::Ne,
                    ('<', true) => Token::Le,
                    ('>', true) => Token::Ge,
                    ('<', false) => Token::Lt,
                    ('>', false) => Token::Gt,
                    _ => return Err(syntax(format!("invalid syntax at '{}'", c))),
                };
                tokens.push(token);
                i += if follows_eq { 2 } else { 1 };
            }
            '\'' | '"' => {
                let (value, next) = string(&chars, i)?;
                tokens.push(Token::Str(value));
                i = next;
            }
            c if c.is_ascii_digit() => {
                let (token, next) = number(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(syntax(format!("invalid character '{}'", other))),
        }
    }

    Ok(tokens)
}

/// Read a quoted string starting at `start`; returns the value and the
/// index after the closing quote
fn string(chars: &[char], start: usize) -> Result<(String, usize), EvalError> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((value, i + 1)),
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| syntax("unterminated string literal".to_string()))?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => *other,
                });
                i += 2;
            }
            c => {
                value.push(c);
                i += 1;
            }
        }
    }

    Err(syntax("unterminated string literal".to_string()))
}

/// Read an int or float literal starting at `start`
fn number(chars: &[char], start: usize) -> Result<(Token, usize), EvalError> {
    let mut i = start;
    let mut is_float = false;

    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' && chars.get(i + 1).map_or(false, char::is_ascii_digit) {
        is_float = true;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            is_float = true;
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    let text: String = chars[start..i].iter().collect();
    let token = if is_float {
        Token::Float(
            text.parse()
                .map_err(|_| syntax(format!("invalid number '{}'", text)))?,
        )
    } else {
        match text.parse() {
            Ok(n) => Token::Int(n),
            Err(_) => Token::Float(
                text.parse()
                    .map_err(|_| syntax(format!("invalid number '{}'", text)))?,
            ),
        }
    };
    Ok((token, i))
}
