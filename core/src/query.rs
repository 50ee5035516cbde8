use std::collections::BTreeSet;
use std::fmt;
use std::iter::Peekable;
use std::str::FromStr;
use std::vec::IntoIter;

use crate::error::QuerySyntaxError;
use crate::tokenizer::normalize_query_term;

/// Deepest allowed nesting of parentheses and `NOT`s combined.
pub const MAX_DEPTH: usize = 128;

/// Compiled boolean query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    Term(String),
    And(Vec<QueryExpr>),
    Or(Vec<QueryExpr>),
    Not(Box<QueryExpr>),
}

impl QueryExpr {
    /// Parse a query line.
    ///
    /// Precedence from tightest to loosest: `NOT` (prefix, right-associative), `OR`, `AND`.
    /// Adjacent operands without an operator are ANDed, so `a OR b c` is `(a OR b) AND c`.
    /// Keywords are case-insensitive; quote a keyword to search for it as a term.
    /// Literals are normalized like indexed text. Nesting beyond [`MAX_DEPTH`] is rejected.
    pub fn parse(input: &str) -> Result<Self, QuerySyntaxError> {
        let tokens = lex(input)?;
        if tokens.is_empty() {
            return Err(QuerySyntaxError::Empty);
        }
        let mut parser = Parser { tokens: tokens.into_iter().peekable(), depth: 0 };
        let expr = parser.and_expr()?;
        match parser.tokens.next() {
            None => Ok(expr),
            Some((Token::RParen, position)) => Err(QuerySyntaxError::UnbalancedParen { position }),
            Some((tok, position)) => Err(QuerySyntaxError::UnexpectedToken { token: tok.to_string(), position }),
        }
    }

    /// Distinct term literals referenced anywhere in the tree, operators excluded.
    pub fn terms(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            QueryExpr::Term(t) => {
                out.insert(t.as_str());
            }
            QueryExpr::And(ops) | QueryExpr::Or(ops) => ops.iter().for_each(|op| op.collect_terms(out)),
            QueryExpr::Not(op) => op.collect_terms(out),
        }
    }
}

impl FromStr for QueryExpr {
    type Err = QuerySyntaxError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, name: &str, ops: &[QueryExpr]) -> fmt::Result {
            write!(f, "{name}:(")?;
            for (i, op) in ops.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{op}")?;
            }
            f.write_str(")")
        }
        match self {
            QueryExpr::Term(t) => f.write_str(t),
            QueryExpr::And(ops) => list(f, "AND", ops),
            QueryExpr::Or(ops) => list(f, "OR", ops),
            QueryExpr::Not(op) => write!(f, "NOT:({op})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Phrase(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => f.write_str(w),
            Token::Phrase(p) => write!(f, "\"{p}\""),
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::Not => f.write_str("NOT"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn lex(input: &str) -> Result<Vec<(Token, usize)>, QuerySyntaxError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let start = i;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push((Token::LParen, start));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, start));
                i += 1;
            }
            '"' | '\'' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or(QuerySyntaxError::UnclosedQuote { position: start })?;
                let phrase: String = chars[i + 1..i + 1 + close].iter().collect();
                tokens.push((Token::Phrase(phrase), start));
                i += close + 2;
            }
            c if c.is_alphabetic() => {
                while i < chars.len() && chars[i].is_alphabetic() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let token = match word.to_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Word(word),
                };
                tokens.push((token, start));
            }
            ch => return Err(QuerySyntaxError::InvalidCharacter { ch, position: start }),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Peekable<IntoIter<(Token, usize)>>,
    depth: usize,
}

impl Parser {
    fn descend(&mut self, position: usize) -> Result<(), QuerySyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(QuerySyntaxError::TooDeep { position });
        }
        self.depth += 1;
        Ok(())
    }

    fn and_expr(&mut self) -> Result<QueryExpr, QuerySyntaxError> {
        let mut ops = vec![self.or_expr()?];
        loop {
            match self.tokens.peek() {
                Some((Token::And, _)) => {
                    self.tokens.next();
                }
                Some((Token::Word(_) | Token::Phrase(_) | Token::Not | Token::LParen, _)) => {}
                _ => break,
            }
            ops.push(self.or_expr()?);
        }
        Ok(variadic(ops, QueryExpr::And))
    }

    fn or_expr(&mut self) -> Result<QueryExpr, QuerySyntaxError> {
        let mut ops = vec![self.not_expr()?];
        while matches!(self.tokens.peek(), Some((Token::Or, _))) {
            self.tokens.next();
            ops.push(self.not_expr()?);
        }
        Ok(variadic(ops, QueryExpr::Or))
    }

    fn not_expr(&mut self) -> Result<QueryExpr, QuerySyntaxError> {
        if let Some(&(Token::Not, position)) = self.tokens.peek() {
            self.tokens.next();
            self.descend(position)?;
            let inner = self.not_expr()?;
            self.depth -= 1;
            return Ok(QueryExpr::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<QueryExpr, QuerySyntaxError> {
        match self.tokens.next() {
            Some((Token::Word(w) | Token::Phrase(w), _)) => Ok(QueryExpr::Term(normalize_query_term(&w))),
            Some((Token::LParen, open)) => {
                self.descend(open)?;
                let inner = self.and_expr()?;
                self.depth -= 1;
                match self.tokens.next() {
                    Some((Token::RParen, _)) => Ok(inner),
                    None => Err(QuerySyntaxError::UnbalancedParen { position: open }),
                    Some((tok, position)) => Err(QuerySyntaxError::UnexpectedToken { token: tok.to_string(), position }),
                }
            }
            Some((tok, position)) => Err(QuerySyntaxError::UnexpectedToken { token: tok.to_string(), position }),
            None => Err(QuerySyntaxError::UnexpectedEnd),
        }
    }
}

fn variadic(mut ops: Vec<QueryExpr>, make: fn(Vec<QueryExpr>) -> QueryExpr) -> QueryExpr {
    if ops.len() == 1 {
        ops.remove(0)
    } else {
        make(ops)
    }
}
