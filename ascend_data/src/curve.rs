//! Experience curve evaluation.
//!
//! Custom curves use a deliberately small formula language: the variables
//! `base`, `multiplier` and `level`, numeric literals, `+`, `-`, `*` and at
//! most one `pow(a, b)` call whose arguments are flat expressions. There is no
//! general parenthesised grouping. Anything outside that grammar falls back to
//! the exponential curve.

use crate::defs::{CurveKind, ExpCurveDef};

impl ExpCurveDef {
    /// Experience required to advance past `level`. Levels below 1 are read as 1.
    ///
    /// ```
    /// use ascend_data::ExpCurveDef;
    ///
    /// let curve = ExpCurveDef::exponential(100.0, 1.15);
    /// assert!((curve.exp_for_level(1) - 100.0).abs() < 1e-9);
    /// assert!((curve.exp_for_level(2) - 115.0).abs() < 1e-9);
    ///
    /// let linear = ExpCurveDef::linear(150.0);
    /// assert!((linear.exp_for_level(3) - 450.0).abs() < 1e-9);
    /// ```
    pub fn exp_for_level(&self, level: u32) -> f64 {
        let level = level.max(1);
        match self.kind {
            CurveKind::Linear => self.base * f64::from(level),
            CurveKind::Exponential => self.exponential_at(level),
            CurveKind::Custom => evaluate_formula(&self.custom_formula, self.base, self.multiplier, level)
                .filter(|value| value.is_finite())
                .unwrap_or_else(|| self.exponential_at(level)),
        }
    }

    fn exponential_at(&self, level: u32) -> f64 {
        self.base * self.multiplier.powf(f64::from(level - 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Pow,
    Plus,
    Minus,
    Star,
    LParen,
    RParen,
    Comma,
}

/// Evaluate a custom curve formula, or `None` if it is outside the supported grammar.
///
/// ```
/// use ascend_data::curve::evaluate_formula;
///
/// let value = evaluate_formula("base * pow(multiplier, level - 1) + 10", 100.0, 2.0, 3);
/// assert_eq!(value, Some(410.0));
/// assert_eq!(evaluate_formula("sqrt(level)", 100.0, 2.0, 3), None);
/// ```
pub fn evaluate_formula(formula: &str, base: f64, multiplier: f64, level: u32) -> Option<f64> {
    let tokens = tokenize(formula, base, multiplier, f64::from(level))?;
    evaluate(&tokens)
}

fn tokenize(formula: &str, base: f64, multiplier: f64, level: f64) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = formula.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            },
            '+' | '-' | '*' | '(' | ')' | ',' => {
                chars.next();
                tokens.push(match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Comma,
                });
            },
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Num(literal.parse().ok()?));
            },
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match ident.as_str() {
                    "base" => Token::Num(base),
                    "multiplier" => Token::Num(multiplier),
                    "level" => Token::Num(level),
                    "pow" => Token::Pow,
                    _ => return None,
                });
            },
            _ => return None,
        }
    }
    Some(tokens)
}

/// Replace the single `pow(a, b)` call with its value, then fold what remains.
fn evaluate(tokens: &[Token]) -> Option<f64> {
    let mut flat = Vec::with_capacity(tokens.len());
    let mut seen_pow = false;
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == Token::Pow {
            if seen_pow || tokens.get(i + 1) != Some(&Token::LParen) {
                return None;
            }
            seen_pow = true;
            let open = i + 2;
            let close = open + tokens[open..].iter().position(|t| *t == Token::RParen)?;
            let args = &tokens[open..close];
            let comma = args.iter().position(|t| *t == Token::Comma)?;
            let lhs = fold(&args[..comma])?;
            let rhs = fold(&args[comma + 1..])?;
            flat.push(Token::Num(lhs.powf(rhs)));
            i = close + 1;
        } else {
            flat.push(tokens[i]);
            i += 1;
        }
    }
    fold(&flat)
}

/// Fold a flat expression with `*` binding tighter than `+` and `-`.
fn fold(tokens: &[Token]) -> Option<f64> {
    let mut total = 0.0;
    let mut sign = 1.0;
    let mut term: Option<f64> = None;
    let mut expect_operand = true;
    let mut negate = false;

    for token in tokens {
        match (*token, expect_operand) {
            (Token::Num(value), true) => {
                let value = if negate { -value } else { value };
                negate = false;
                term = Some(term.map_or(value, |product| product * value));
                expect_operand = false;
            },
            (Token::Minus, true) => negate = !negate,
            (Token::Star, false) => expect_operand = true,
            (Token::Plus | Token::Minus, false) => {
                total += sign * term?;
                term = None;
                sign = if *token == Token::Minus { -1.0 } else { 1.0 };
                expect_operand = true;
            },
            _ => return None,
        }
    }

    if expect_operand {
        return None;
    }
    Some(total + sign * term?)
}
