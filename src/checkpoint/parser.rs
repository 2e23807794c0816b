//! Recursive-descent parser producing an expression tree
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparisons (chainable),
//! `+`/`-`, unary minus, postfix (`[..]`, `.name`, calls), atoms.

use serde_json::Value;

use super::lexer::{tokenize, Token};
use super::{EvalError, EvalErrorKind};

/// Deepest expression tree the parser will build
pub const MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Index(Box<Expr>, Box<Expr>),
    Field(Box<Expr>, String),
    Call(String, Vec<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Parse a complete expression
pub fn parse(source: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(syntax("unexpected end of expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(syntax(&format!("unexpected token {:?}", token))),
    }
}

fn syntax(message: &str) -> EvalError {
    EvalError::new(EvalErrorKind::Syntax, message.to_string())
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Tree levels opened by the productions currently on the stack
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(name)) if name == keyword)
    }

    fn peek_keyword_at(&self, offset: usize, keyword: &str) -> bool {
        matches!(self.tokens.get(self.pos + offset), Some(Token::Ident(name)) if name == keyword)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), EvalError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            match self.peek() {
                Some(found) => Err(syntax(&format!("expected {:?}, found {:?}", expected, found))),
                None => Err(syntax(&format!("expected {:?} before end of expression", expected))),
            }
        }
    }

    /// Open one more tree level, failing once the budget is spent
    fn enter(&mut self) -> Result<(), EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(syntax("expression nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    fn or(&mut self) -> Result<Expr, EvalError> {
        let depth = self.depth;
        self.enter()?;
        let mut left = self.and()?;
        while self.peek_keyword("or") {
            self.pos += 1;
            self.enter()?;
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, EvalError> {
        let depth = self.depth;
        let mut left = self.not()?;
        while self.peek_keyword("and") {
            self.pos += 1;
            self.enter()?;
            let right = self.not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr, EvalError> {
        if self.peek_keyword("not") {
            self.pos += 1;
            let depth = self.depth;
            self.enter()?;
            let operand = self.not()?;
            self.depth = depth;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.comparison()
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek()? {
            Token::Eq => CmpOp::Eq,
            Token::Ne => CmpOp::Ne,
            Token::Lt => CmpOp::Lt,
            Token::Le => CmpOp::Le,
            Token::Gt => CmpOp::Gt,
            Token::Ge => CmpOp::Ge,
            Token::Ident(name) if name == "in" => CmpOp::In,
            Token::Ident(name) if name == "not" && self.peek_keyword_at(1, "in") => {
                self.pos += 2;
                return Some(CmpOp::NotIn);
            }
            Token::Ident(name) if name == "is" => {
                if self.peek_keyword_at(1, "not") {
                    self.pos += 2;
                    return Some(CmpOp::IsNot);
                }
                CmpOp::Is
            }
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        let first = self.additive()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_op() {
            rest.push((op, self.additive()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        let depth = self.depth;
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.enter()?;
            let right = self.unary()?;
            left = Expr::Arith(op, Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let negate = if self.eat(&Token::Minus) {
            true
        } else if self.eat(&Token::Plus) {
            false
        } else {
            return self.postfix();
        };

        let depth = self.depth;
        self.enter()?;
        let operand = self.unary()?;
        self.depth = depth;
        Ok(if negate {
            Expr::Neg(Box::new(operand))
        } else {
            operand
        })
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let depth = self.depth;
        let mut expr = self.atom()?;
        loop {
            match self.peek() {
                Some(Token::LBracket) | Some(Token::Dot) | Some(Token::LParen) => self.enter()?,
                _ => break,
            }
            match self.peek() {
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.or()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    match self.next() {
                        Some(Token::Ident(name)) => expr = Expr::Field(Box::new(expr), name),
                        _ => return Err(syntax("expected a name after '.'")),
                    }
                }
                Some(Token::LParen) => {
                    let Expr::Name(function) = expr else {
                        return Err(syntax("only named functions can be called"));
                    };
                    self.pos += 1;
                    let args = self.sequence(Token::RParen)?;
                    expr = Expr::Call(function, args);
                }
                _ => break,
            }
        }
        self.depth = depth;
        Ok(expr)
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed
    fn sequence(&mut self, close: Token) -> Result<Vec<Expr>, EvalError> {
        let mut items = Vec::new();
        loop {
            if self.eat(&close) {
                return Ok(items);
            }
            items.push(self.or()?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn atom(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Int(n)) => Ok(Expr::Literal(Value::from(n))),
            Some(Token::Float(f)) => serde_json::Number::from_f64(f)
                .map(|n| Expr::Literal(Value::Number(n)))
                .ok_or_else(|| syntax("number is not finite")),
            Some(Token::Str(s)) => {
                // Adjacent string literals concatenate
                let mut value = s;
                while let Some(Token::Str(next)) = self.peek() {
                    value.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::Literal(Value::String(value)))
            }
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "True" | "true" => Expr::Literal(Value::Bool(true)),
                "False" | "false" => Expr::Literal(Value::Bool(false)),
                "None" | "null" => Expr::Literal(Value::Null),
                "and" | "or" | "not" | "in" | "is" => {
                    return Err(syntax(&format!("unexpected keyword '{}'", name)))
                }
                _ => Expr::Name(name),
            }),
            Some(Token::LParen) => {
                let inner = self.or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => Ok(Expr::List(self.sequence(Token::RBracket)?)),
            Some(Token::LBrace) => {
                let mut entries = Vec::new();
                loop {
                    if self.eat(&Token::RBrace) {
                        break;
                    }
                    let key = self.or()?;
                    self.expect(Token::Colon)?;
                    let value = self.or()?;
                    entries.push((key, value));
                    if !self.eat(&Token::Comma) {
                        self.expect(Token::RBrace)?;
                        break;
                    }
                }
                Ok(Expr::Dict(entries))
            }
            Some(token) => Err(syntax(&format!("unexpected token {:?}", token))),
            None => Err(syntax("unexpected end of expression")),
        }
    }
}
