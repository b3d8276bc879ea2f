//! Restricted arithmetic evaluator.
//!
//! Accepts numbers, `+ - * /`, unary signs and parentheses; nothing else.
//! Integers stay integers until they meet a float or a division, which
//! always yields a float.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("names are not allowed: '{0}'")]
    NameNotAllowed(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("expression nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn neg(self) -> Result<Number, CalcError> {
        match self {
            Number::Int(i) => i.checked_neg().map(Number::Int).ok_or(CalcError::Overflow),
            Number::Float(f) => Ok(Number::Float(-f)),
        }
    }

    fn apply(self, op: Op, rhs: Number) -> Result<Number, CalcError> {
        match op {
            Op::Add => self.combine(rhs, i64::checked_add, |a, b| a + b),
            Op::Sub => self.combine(rhs, i64::checked_sub, |a, b| a - b),
            Op::Mul => self.combine(rhs, i64::checked_mul, |a, b| a * b),
            Op::Div => {
                let divisor = rhs.as_f64();
                if divisor == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                Ok(Number::Float(self.as_f64() / divisor))
            }
        }
    }

    fn combine(
        self,
        rhs: Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Number, CalcError> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => int_op(a, b).map(Number::Int).ok_or(CalcError::Overflow),
            (a, b) => Ok(Number::Float(float_op(a.as_f64(), b.as_f64()))),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Shortest round-trip form, always marked as a float: `2.0`, `3.5`,
/// `1e+16`, `1e-05`.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".into();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".into() } else { "-inf".into() };
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{x:e}");
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((&sci, "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(d) => ('-', d),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }
    let plain = format!("{x}");
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Op(Op),
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "number {n}"),
            Token::Op(Op::Add) => f.write_str("'+'"),
            Token::Op(Op::Sub) => f.write_str("'-'"),
            Token::Op(Op::Mul) => f.write_str("'*'"),
            Token::Op(Op::Div) => f.write_str("'/'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(match c {
                    '+' => Token::Op(Op::Add),
                    '-' => Token::Op(Op::Sub),
                    '*' => Token::Op(Op::Mul),
                    '/' => Token::Op(Op::Div),
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent: `1e5`, `2.5E-3`.
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_number(&literal)?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                return Err(CalcError::NameNotAllowed(chars[start..i].iter().collect()));
            }
            other => return Err(CalcError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

fn parse_number(literal: &str) -> Result<Number, CalcError> {
    let is_float = literal.contains(['.', 'e', 'E']);
    if is_float {
        if literal == "." {
            return Err(CalcError::InvalidNumber(literal.to_string()));
        }
        literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| CalcError::InvalidNumber(literal.to_string()))
    } else {
        literal.parse::<i64>().map(Number::Int).map_err(|_| CalcError::Overflow)
    }
}

const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Number, CalcError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ (Op::Add | Op::Sub))) = self.peek() {
            let op = *op;
            self.pos += 1;
            value = value.apply(op, self.term()?)?;
        }
        Ok(value)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<Number, CalcError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ (Op::Mul | Op::Div))) = self.peek() {
            let op = *op;
            self.pos += 1;
            value = value.apply(op, self.unary()?)?;
        }
        Ok(value)
    }

    // unary := ('+' | '-') unary | primary
    fn unary(&mut self) -> Result<Number, CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        let value = match self.peek() {
            Some(Token::Op(Op::Add)) => {
                self.pos += 1;
                self.unary()
            }
            Some(Token::Op(Op::Sub)) => {
                self.pos += 1;
                self.unary().and_then(Number::neg)
            }
            _ => self.primary(),
        };
        self.depth -= 1;
        value
    }

    // primary := number | '(' expr ')'
    fn primary(&mut self) -> Result<Number, CalcError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(CalcError::UnexpectedToken(other.to_string())),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(other) => Err(CalcError::UnexpectedToken(other.to_string())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(input: &str) -> Result<Number, CalcError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let value = parser.expr()?;
    match parser.next() {
        None => Ok(value),
        Some(extra) => Err(CalcError::UnexpectedToken(extra.to_string())),
    }
}
