//! Arithmetic formulas typed into ledger cells (`=100+50*2`).
//!
//! Only numeric literals, `+ - * /` and parentheses are understood. Every
//! other character is stripped before parsing, and anything after a `;`
//! statement separator is ignored. Evaluation never fails from the caller's
//! point of view: malformed input, division by zero and non-finite results
//! all collapse to `0.0`.

use thiserror::Error;

const FORMULA_PREFIX: char = '=';
const STATEMENT_SEPARATOR: char = ';';
const MAX_NESTING: usize = 128;

#[derive(Debug, Error, PartialEq)]
pub enum FormulaError {
    #[error("empty expression")]
    Empty,
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("expression nested too deeply")]
    TooDeep,
}

pub fn is_formula(input: &str) -> bool {
    input.trim_start().starts_with(FORMULA_PREFIX)
}

/// Keeps only characters the parser understands.
pub fn sanitize(expression: &str) -> String {
    let statement = expression
        .split(STATEMENT_SEPARATOR)
        .next()
        .unwrap_or_default();
    statement
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '*' | '/' | '.' | '(' | ')' | ' '))
        .collect()
}

/// Evaluates a cell entry. Formulas start with `=`; anything else is read as a
/// plain number. Always returns a finite value.
pub fn evaluate(input: &str) -> f64 {
    let trimmed = input.trim();
    let Some(body) = trimmed.strip_prefix(FORMULA_PREFIX) else {
        return parse_plain(trimmed);
    };
    match evaluate_expression(&sanitize(body)) {
        Ok(value) if value.is_finite() => value,
        Ok(value) => {
            tracing::debug!(formula = trimmed, %value, "formula produced a non-finite value");
            0.0
        }
        Err(err) => {
            tracing::debug!(formula = trimmed, error = %err, "formula evaluation failed");
            0.0
        }
    }
}

/// Strict evaluation of an already sanitized expression.
pub fn evaluate_expression(expression: &str) -> Result<f64, FormulaError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expression(0)?;
    match parser.peek() {
        None => Ok(value),
        Some(token) => Err(FormulaError::UnexpectedToken(token.to_string())),
    }
}

fn parse_plain(input: &str) -> f64 {
    let cleaned: String = input
        .chars()
        .filter(|ch| !matches!(ch, ',' | '$' | ' '))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Open,
    Close,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{}", value),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        let token = match ch {
            ' ' => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::Open,
            ')' => Token::Close,
            '0'..='9' | '.' => {
                let mut end = start + ch.len_utf8();
                while let Some(&(idx, next)) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        end = idx + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &expression[start..end];
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| FormulaError::InvalidNumber(literal.to_string()))?;
                Token::Number(value)
            }
            other => return Err(FormulaError::UnexpectedToken(other.to_string())),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// Recursive-descent parser over the token stream.
///
/// expression := term (('+' | '-') term)*
/// term       := unary (('*' | '/') unary)*
/// unary      := ('+' | '-') unary | primary
/// primary    := number | '(' expression ')'
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self, depth: usize) -> Result<f64, FormulaError> {
        let mut value = self.term(depth)?;
        while let Some(token) = self.peek() {
            match token {
                Token::Plus => {
                    self.advance();
                    value += self.term(depth)?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term(depth)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self, depth: usize) -> Result<f64, FormulaError> {
        let mut value = self.unary(depth)?;
        while let Some(token) = self.peek() {
            match token {
                Token::Star => {
                    self.advance();
                    value *= self.unary(depth)?;
                }
                Token::Slash => {
                    self.advance();
                    let divisor = self.unary(depth)?;
                    if divisor == 0.0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self, depth: usize) -> Result<f64, FormulaError> {
        if depth > MAX_NESTING {
            return Err(FormulaError::TooDeep);
        }
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.unary(depth + 1)?)
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary(depth + 1)
            }
            _ => self.primary(depth),
        }
    }

    fn primary(&mut self, depth: usize) -> Result<f64, FormulaError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Open) => {
                let value = self.expression(depth + 1)?;
                match self.advance() {
                    Some(Token::Close) => Ok(value),
                    Some(other) => Err(FormulaError::UnexpectedToken(other.to_string())),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some(other) => Err(FormulaError::UnexpectedToken(other.to_string())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_precedence_and_parentheses() {
        assert_eq!(evaluate("=100+50"), 150.0);
        assert_eq!(evaluate("=2+3*4"), 14.0);
        assert_eq!(evaluate("=(2+3)*4"), 20.0);
        assert_eq!(evaluate("=10-4-3"), 3.0);
        assert_eq!(evaluate("=100/4/5"), 5.0);
        assert_eq!(evaluate("=-5+2"), -3.0);
        assert_eq!(evaluate("=2*-3"), -6.0);
        assert_eq!(evaluate("= 1.5 * 2 "), 3.0);
    }

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(sanitize("100+50; alert(1)"), "100+50");
        assert_eq!(evaluate("=100+50; alert(1)"), 150.0);
        assert_eq!(evaluate("=1e3"), 13.0);
        assert_eq!(evaluate("=$1,000+5"), 1005.0);
    }

    #[test]
    fn failures_collapse_to_zero() {
        assert_eq!(evaluate("=(("), 0.0);
        assert_eq!(evaluate("=5/0"), 0.0);
        assert_eq!(evaluate("=0/0"), 0.0);
        assert_eq!(evaluate("="), 0.0);
        assert_eq!(evaluate("=1 2"), 0.0);
        assert_eq!(evaluate("=1.2.3"), 0.0);
        assert_eq!(evaluate("=abc"), 0.0);
    }

    #[test]
    fn strict_evaluation_reports_errors() {
        assert_eq!(evaluate_expression("(("), Err(FormulaError::UnexpectedEnd));
        assert_eq!(evaluate_expression("4/0"), Err(FormulaError::DivisionByZero));
        assert_eq!(evaluate_expression(""), Err(FormulaError::Empty));
        assert_eq!(
            evaluate_expression("1)"),
            Err(FormulaError::UnexpectedToken(")".into()))
        );
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let deep = format!("={}1{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(evaluate(&deep), 0.0);
        let negations = format!("={}1", "-".repeat(500));
        assert_eq!(evaluate(&negations), 0.0);
    }

    #[test]
    fn plain_input_is_read_as_number() {
        assert!(!is_formula("42"));
        assert!(is_formula("  =1"));
        assert_eq!(evaluate("1,250.50"), 1250.5);
        assert_eq!(evaluate("not a number"), 0.0);
        assert_eq!(evaluate(""), 0.0);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let formula = "=(12.5+7.5)*3/4";
        let first = evaluate(formula);
        for _ in 0..10 {
            assert_eq!(evaluate(formula), first);
        }
        assert_eq!(first, 15.0);
    }
}
