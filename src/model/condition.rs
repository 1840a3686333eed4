//! Condition expressions attached to pages and content rules.
//!
//! The grammar is intentionally small:
//!
//! ```text
//! expr       := or
//! or         := and (("||" | "or") and)*
//! and        := unary (("&&" | "and") unary)*
//! unary      := ("!" | "not") unary | primary
//! primary    := "(" expr ")" | comparison | "true" | "false"
//! comparison := operand op operand
//! op         := "==" | "=" | "!=" | "<>" | "<" | "<=" | ">" | ">="
//! operand    := placeholder | 'text' | "text" | number | "true" | "false"
//! ```
//!
//! Placeholders use the same `%%token%%` syntax as content values and are
//! resolved against the variable table or the customer record.

use super::customer::parse_amount;
use super::template::PlaceholderRef;
use std::cmp::Ordering;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==` or `=`
    Eq,
    /// `!=` or `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal string, number or boolean word, kept as text
    Literal(String),
    /// A placeholder to resolve
    Placeholder {
        /// Token as written
        token: String,
        /// What the token refers to
        reference: PlaceholderRef,
    },
}

/// A parsed condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `true` / `false`
    Literal(bool),
    /// `left op right`
    Compare {
        /// Left operand
        left: Operand,
        /// Operator
        op: CompareOp,
        /// Right operand
        right: Operand,
    },
    /// Logical negation
    Not(Box<Condition>),
    /// Logical conjunction (short-circuit)
    And(Box<Condition>, Box<Condition>),
    /// Logical disjunction (short-circuit)
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Parse a condition using the default `%%` marker and `_` separator.
    pub fn parse(source: &str) -> Result<Self, String> {
        Self::parse_with(source, "%%", '_')
    }

    /// Parse a condition.
    pub fn parse_with(source: &str, marker: &str, separator: char) -> Result<Self, String> {
        let tokens = tokenize(source, marker, separator)?;
        if tokens.is_empty() {
            return Err("empty condition".to_string());
        }
        let mut parser = Parser { tokens, pos: 0 };
        let condition = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(format!("unexpected {} after end of condition", token.describe()));
        }
        Ok(condition)
    }

    /// Evaluate the condition; `resolve` supplies values for placeholders.
    ///
    /// `&&` and `||` short-circuit, so a placeholder on the skipped side is never resolved.
    pub fn evaluate<F>(&self, resolve: &mut F) -> Result<bool, String>
    where
        F: FnMut(&str, &PlaceholderRef) -> Result<String, String>,
    {
        match self {
            Condition::Literal(value) => Ok(*value),
            Condition::Not(inner) => Ok(!inner.evaluate(resolve)?),
            Condition::And(left, right) => Ok(left.evaluate(resolve)? && right.evaluate(resolve)?),
            Condition::Or(left, right) => Ok(left.evaluate(resolve)? || right.evaluate(resolve)?),
            Condition::Compare { left, op, right } => {
                let left = operand_value(left, resolve)?;
                let right = operand_value(right, resolve)?;
                Ok(op.holds(compare_values(&left, &right)))
            }
        }
    }
}

fn operand_value<F>(operand: &Operand, resolve: &mut F) -> Result<String, String>
where
    F: FnMut(&str, &PlaceholderRef) -> Result<String, String>,
{
    match operand {
        Operand::Literal(text) => Ok(text.clone()),
        Operand::Placeholder { token, reference } => resolve(token, reference),
    }
}

/// Numeric comparison when both sides are numbers, otherwise string comparison.
pub fn compare_values(left: &str, right: &str) -> Ordering {
    match (parse_amount(left), parse_amount(right)) {
        (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.trim().cmp(right.trim()),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Op(CompareOp),
    Bool(bool),
    Text(String),
    Number(String),
    Placeholder(String, PlaceholderRef),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::And => "'and'".to_string(),
            Token::Or => "'or'".to_string(),
            Token::Not => "'not'".to_string(),
            Token::Op(op) => format!("operator {:?}", op),
            Token::Bool(b) => format!("'{}'", b),
            Token::Text(t) => format!("string '{}'", t),
            Token::Number(n) => format!("number {}", n),
            Token::Placeholder(t, _) => format!("placeholder %%{}%%", t),
        }
    }
}

fn tokenize(source: &str, marker: &str, separator: char) -> Result<Vec<Token>, String> {
    if marker.is_empty() {
        return Err("placeholder marker must not be empty".to_string());
    }
    let mut tokens = Vec::new();
    let mut rest = source.trim_start();

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix(marker) {
            let close = after
                .find(marker)
                .ok_or_else(|| "unterminated placeholder".to_string())?;
            let token = &after[..close];
            if token.trim().is_empty() {
                return Err("empty placeholder token".to_string());
            }
            tokens.push(Token::Placeholder(
                token.to_string(),
                PlaceholderRef::parse_with_separator(token, separator),
            ));
            rest = &after[close + marker.len()..];
        } else {
            let (token, len) = next_token(rest)?;
            tokens.push(token);
            rest = &rest[len..];
        }
        rest = rest.trim_start();
    }

    Ok(tokens)
}

fn next_token(s: &str) -> Result<(Token, usize), String> {
    const SYMBOLS: [(&str, Token); 5] = [
        ("&&", Token::And),
        ("||", Token::Or),
        ("(", Token::LParen),
        (")", Token::RParen),
        ("!=", Token::Op(CompareOp::Ne)),
    ];
    for (symbol, token) in SYMBOLS.iter() {
        if s.starts_with(symbol) {
            return Ok((token.clone(), symbol.len()));
        }
    }

    let ops = [
        ("==", CompareOp::Eq),
        ("<>", CompareOp::Ne),
        ("<=", CompareOp::Le),
        (">=", CompareOp::Ge),
        ("=", CompareOp::Eq),
        ("<", CompareOp::Lt),
        (">", CompareOp::Gt),
    ];
    for (symbol, op) in ops {
        if s.starts_with(symbol) {
            return Ok((Token::Op(op), symbol.len()));
        }
    }

    let first = s.chars().next().unwrap_or_default();

    if first == '!' {
        return Ok((Token::Not, 1));
    }

    if first == '\'' || first == '"' {
        let body = &s[1..];
        let end = body
            .find(first)
            .ok_or_else(|| format!("unterminated string literal {}", s))?;
        return Ok((Token::Text(body[..end].to_string()), end + 2));
    }

    if first.is_ascii_digit() || first == '-' || first == '.' || first == '$' {
        let len = s
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '.' | ',' | '$')))
            .unwrap_or(s.len());
        let number = &s[..len];
        if parse_amount(number).is_none() {
            return Err(format!("invalid number '{}'", number));
        }
        return Ok((Token::Number(number.to_string()), len));
    }

    if first.is_alphabetic() {
        let len = s
            .find(|c: char| !c.is_alphanumeric())
            .unwrap_or(s.len());
        let word = &s[..len];
        let token = match word.to_ascii_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            _ => {
                return Err(format!(
                    "unknown word '{}' (field references must be written as placeholders)",
                    word
                ))
            }
        };
        return Ok((token, len));
    }

    Err(format!("unexpected character '{}'", first))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Condition, String> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition, String> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Condition, String> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Condition::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Condition, String> {
        match self.peek() {
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(format!("expected ')', found {}", other.describe())),
                    None => Err("missing ')'".to_string()),
                }
            }
            Some(Token::Bool(value)) if !matches!(self.peek_at(1), Some(Token::Op(_))) => {
                let value = *value;
                self.pos += 1;
                Ok(Condition::Literal(value))
            }
            Some(_) => self.parse_comparison(),
            None => Err("unexpected end of condition".to_string()),
        }
    }

    fn parse_comparison(&mut self) -> Result<Condition, String> {
        let left = self.parse_operand()?;
        let op = match self.advance() {
            Some(Token::Op(op)) => op,
            Some(other) => {
                return Err(format!("expected comparison operator, found {}", other.describe()))
            }
            None => return Err("expected comparison operator".to_string()),
        };
        let right = self.parse_operand()?;
        Ok(Condition::Compare { left, op, right })
    }

    fn parse_operand(&mut self) -> Result<Operand, String> {
        match self.advance() {
            Some(Token::Placeholder(token, reference)) => Ok(Operand::Placeholder { token, reference }),
            Some(Token::Text(text)) => Ok(Operand::Literal(text)),
            Some(Token::Number(number)) => Ok(Operand::Literal(number)),
            Some(Token::Bool(value)) => Ok(Operand::Literal(value.to_string())),
            Some(other) => Err(format!("expected a value, found {}", other.describe())),
            None => Err("expected a value".to_string()),
        }
    }
}
