//! Placeholder evaluation
//!
//! A tiny expression language for placeholder bodies:
//!
//! ```text
//! range   := additive ('..' additive)?
//! additive:= term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := '-' unary | primary
//! primary := INT | STRING | IDENT | '(' range ')' | '[' range (',' range)* ']'
//! ```
//!
//! Arithmetic is 64-bit integer arithmetic; `/` truncates and `%` keeps the
//! sign of the dividend. `+` concatenates when either side is a string.

use std::collections::HashMap;

use crate::error::{Result, ShardingError};
use crate::route::ShardingValue;

/// Largest number of items a single range literal may expand to
const MAX_RANGE_ITEMS: i64 = 1_000_000;

/// An evaluated placeholder value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Flatten into the strings the value renders as
    pub fn render(&self) -> Vec<String> {
        match self {
            Value::Int(v) => vec![v.to_string()],
            Value::Str(s) => vec![s.clone()],
            Value::List(items) => items.iter().flat_map(Value::render).collect(),
        }
    }
}

impl From<&ShardingValue> for Value {
    fn from(value: &ShardingValue) -> Self {
        match value {
            ShardingValue::Int(v) => Value::Int(*v),
            ShardingValue::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

/// Variable bindings for evaluation
pub type Variables = HashMap<String, Value>;

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    DotDot,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            c if c.is_whitespace() => i += 1,
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<i64>()
                    .map_err(|_| error(format!("integer literal out of range: {}", literal)))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '\'' | '"' => {
                let quote = ch;
                let mut literal = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(error(format!("unterminated string in '{}'", source))),
                        Some('\\') => {
                            if let Some(escaped) = chars.get(i + 1) {
                                literal.push(*escaped);
                            }
                            i += 2;
                        }
                        Some(c) if *c == quote => {
                            i += 1;
                            break;
                        }
                        Some(c) => {
                            literal.push(*c);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(literal));
            }
            '.' if chars.get(i + 1) == Some(&'.') => {
                tokens.push(Token::DotDot);
                i += 2;
            }
            _ => {
                let token = match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    ',' => Token::Comma,
                    other => return Err(error(format!("unexpected character '{}' in '{}'", other, source))),
                };
                tokens.push(token);
                i += 1;
            }
        }
    }
    Ok(tokens)
}

// =============================================================================
// Parser / Evaluator
// =============================================================================

/// Evaluate a placeholder body against the given variables
pub fn evaluate(source: &str, variables: &Variables) -> Result<Value> {
    let tokens = tokenize(source)?;
    let mut evaluator = Evaluator {
        tokens,
        pos: 0,
        variables,
        source,
    };
    let value = evaluator.range()?;
    if evaluator.pos != evaluator.tokens.len() {
        return Err(error(format!("unexpected trailing input in '{}'", source)));
    }
    Ok(value)
}

struct Evaluator<'a> {
    tokens: Vec<Token>,
    pos: usize,
    variables: &'a Variables,
    source: &'a str,
}

impl<'a> Evaluator<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(ref token) if *token == expected => Ok(()),
            other => Err(error(format!(
                "expected {:?} but found {:?} in '{}'",
                expected, other, self.source
            ))),
        }
    }

    fn range(&mut self) -> Result<Value> {
        let start = self.additive()?;
        if self.peek() != Some(&Token::DotDot) {
            return Ok(start);
        }
        self.pos += 1;
        let end = self.additive()?;
        match (start, end) {
            (Value::Int(from), Value::Int(to)) => expand_range(from, to),
            (from, to) => Err(error(format!("range bounds must be integers, got {:?}..{:?}", from, to))),
        }
    }

    fn additive(&mut self) -> Result<Value> {
        let mut left = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let right = self.term()?;
                    left = add(left, right)?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let right = self.term()?;
                    left = arithmetic(left, right, "-", i64::checked_sub)?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn term(&mut self) -> Result<Value> {
        let mut left = self.unary()?;
        loop {
            let op: (&str, fn(i64, i64) -> Option<i64>) = match self.peek() {
                Some(Token::Star) => ("*", i64::checked_mul),
                Some(Token::Slash) => ("/", i64::checked_div),
                Some(Token::Percent) => ("%", i64::checked_rem),
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = arithmetic(left, right, op.0, op.1)?;
        }
    }

    fn unary(&mut self) -> Result<Value> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            return match self.unary()? {
                Value::Int(v) => v
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| error("integer overflow".to_string())),
                other => Err(error(format!("cannot negate {:?}", other))),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Value> {
        match self.next() {
            Some(Token::Int(v)) => Ok(Value::Int(v)),
            Some(Token::Str(s)) => Ok(Value::Str(s)),
            Some(Token::Ident(name)) => self
                .variables
                .get(&name)
                .cloned()
                .ok_or_else(|| error(format!("no such property: {}", name))),
            Some(Token::LParen) => {
                let value = self.range()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if self.peek() == Some(&Token::RBracket) {
                    self.pos += 1;
                    return Ok(Value::List(items));
                }
                loop {
                    items.push(self.range()?);
                    match self.next() {
                        Some(Token::Comma) => continue,
                        Some(Token::RBracket) => return Ok(Value::List(items)),
                        other => {
                            return Err(error(format!(
                                "expected ',' or ']' but found {:?} in '{}'",
                                other, self.source
                            )))
                        }
                    }
                }
            }
            other => Err(error(format!("unexpected token {:?} in '{}'", other, self.source))),
        }
    }
}

fn expand_range(from: i64, to: i64) -> Result<Value> {
    let span = (to as i128 - from as i128).abs();
    if span >= MAX_RANGE_ITEMS as i128 {
        return Err(error(format!("range {}..{} is too large", from, to)));
    }
    let items: Vec<Value> = if from <= to {
        (from..=to).map(Value::Int).collect()
    } else {
        (to..=from).rev().map(Value::Int).collect()
    };
    Ok(Value::List(items))
}

fn add(left: Value, right: Value) -> Result<Value> {
    match (left, right) {
        (Value::Str(l), r @ (Value::Int(_) | Value::Str(_))) => Ok(Value::Str(l + &r.render().concat())),
        (l @ Value::Int(_), Value::Str(r)) => Ok(Value::Str(l.render().concat() + &r)),
        (l, r) => arithmetic(l, r, "+", i64::checked_add),
    }
}

fn arithmetic(left: Value, right: Value, op: &str, f: fn(i64, i64) -> Option<i64>) -> Result<Value> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => f(l, r).map(Value::Int).ok_or_else(|| {
            if r == 0 && (op == "/" || op == "%") {
                error("division by zero".to_string())
            } else {
                error(format!("integer overflow in {} {} {}", l, op, r))
            }
        }),
        (l, r) => Err(error(format!("cannot apply '{}' to {:?} and {:?}", op, l, r))),
    }
}

fn error(message: String) -> ShardingError {
    ShardingError::Configuration(format!("Inline expression error: {}", message))
}
