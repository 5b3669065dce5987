//! Gain expression evaluator.
//!
//! A gain is either a constant (`"0.01"`) or a small arithmetic formula in
//! the dependency ratio (`"0.01*λ^2"`, `"0.02*ratio"`, `"1/lambda"`). The
//! ratio is substituted textually, the result is checked against an
//! arithmetic-only character set and bounded in length, operator count and
//! parenthesis depth, then parsed by a dedicated grammar:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '//' | '/') unary)*
//! unary  := ('-' | '+') unary | power
//! power  := atom ('**' unary)?
//! atom   := number | '(' expr ')'
//! number := (digits ('.' digits?)? | '.' digits) (('e' | 'E') ('+' | '-')? digits)?
//! ```
//!
//! Any failure yields [`DEFAULT_GAIN`]; evaluation never reaches the caller
//! as an error unless [`GainExpression::evaluate`] is used directly.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit0, digit1, one_of};
use nom::combinator::{all_consuming, map, map_res, opt, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded};
use nom::{IResult, Parser};
use thiserror::Error;
use tracing::debug;

/// Gain used when no expression is given or the expression is unusable.
pub const DEFAULT_GAIN: f64 = 0.01;

/// Value substituted for a zero ratio so that `1/λ` stays finite.
pub const ZERO_RATIO_EPSILON: f64 = 1e-9;

/// Textual names of the free variable.
const VARIABLE_TOKENS: &[&str] = &["ratio", "lambda", "λ"];

const ALLOWED_CHARACTERS: &str = "0123456789+-*/.()eE";

const MAX_NESTING: usize = 64;

/// Longest substituted formula accepted by the parser, in characters.
const MAX_LENGTH: usize = 1024;

/// Most operator characters (`+ - * /`) a formula may contain. Bounds the
/// recursion depth of both the parser and the evaluator.
const MAX_OPERATORS: usize = 128;

/// Why a gain expression could not be evaluated for a given ratio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GainError {
    #[error("character '{0}' is not allowed in a gain expression")]
    ForbiddenCharacter(char),

    #[error("parentheses nested deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("expression longer than {max} characters")]
    TooLong { max: usize },

    #[error("expression has more than {max} operators")]
    TooComplex { max: usize },

    #[error("malformed expression: {0}")]
    Syntax(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("expression evaluates to a non-finite value")]
    NonFinite,
}

/// A gain value together with whether it came from the fallback branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    pub value: f64,
    /// `true` when the expression was unusable and [`DEFAULT_GAIN`] was used.
    pub fallback: bool,
}

/// A gain expression, classified once and evaluated per step.
#[derive(Debug, Clone, PartialEq)]
pub enum GainExpression {
    /// No expression was supplied.
    Default,
    /// A plain numeric literal.
    Constant(f64),
    /// A whitespace-free formula with `^` already rewritten to `**`.
    Formula(String),
}

impl GainExpression {
    /// Classifies a raw user expression.
    ///
    /// Whitespace is removed and `^` becomes `**`. A literal made of digits
    /// with an optional leading sign and at most one decimal point becomes
    /// [`GainExpression::Constant`]; everything else is kept as a formula
    /// and only validated when evaluated.
    pub fn parse(expression: Option<&str>) -> Self {
        let Some(raw) = expression else {
            return Self::Default;
        };

        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .replace('^', "**");

        if is_numeric_literal(&cleaned) {
            if let Ok(value) = cleaned.parse::<f64>() {
                if value.is_finite() {
                    return Self::Constant(value);
                }
            }
        }
        Self::Formula(cleaned)
    }

    /// Evaluates the expression at `ratio`, reporting why it failed.
    ///
    /// # Errors
    ///
    /// Returns a [`GainError`] when the substituted formula contains a
    /// forbidden character, is nested too deeply, does not parse, divides by
    /// zero or produces a non-finite value.
    pub fn evaluate(&self, ratio: f64) -> Result<f64, GainError> {
        match self {
            Self::Default => Ok(DEFAULT_GAIN),
            Self::Constant(value) => Ok(*value),
            Self::Formula(formula) => evaluate_formula(formula, ratio),
        }
    }

    /// Evaluates the expression at `ratio`, falling back to [`DEFAULT_GAIN`].
    pub fn gain(&self, ratio: f64) -> Gain {
        match self.evaluate(ratio) {
            Ok(value) => Gain {
                value,
                fallback: false,
            },
            Err(error) => {
                debug!(ratio, %error, "gain expression unusable, using default gain");
                Gain {
                    value: DEFAULT_GAIN,
                    fallback: true,
                }
            }
        }
    }
}

/// Evaluates `expression` at the dependency ratio `ratio`.
///
/// Returns [`DEFAULT_GAIN`] when `expression` is `None` or cannot be
/// evaluated. Pure: the same inputs always give the same gain.
///
/// # Examples
///
/// ```
/// use inverter_sim::evaluate_gain;
///
/// assert_eq!(evaluate_gain(Some("0.02"), 0.7), 0.02);
/// assert_eq!(evaluate_gain(Some("0.01*ratio^2"), 0.5), 0.0025);
/// assert_eq!(evaluate_gain(Some("not_a_formula!!"), 0.5), 0.01);
/// assert_eq!(evaluate_gain(None, 0.5), 0.01);
/// ```
pub fn evaluate_gain(expression: Option<&str>, ratio: f64) -> f64 {
    GainExpression::parse(expression).gain(ratio).value
}

fn is_numeric_literal(s: &str) -> bool {
    let unsigned = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    seen_digit
}

fn evaluate_formula(formula: &str, ratio: f64) -> Result<f64, GainError> {
    let substituted = substitute_ratio(formula, ratio);

    if let Some(c) = substituted
        .chars()
        .find(|c| !ALLOWED_CHARACTERS.contains(*c))
    {
        return Err(GainError::ForbiddenCharacter(c));
    }
    if substituted.len() > MAX_LENGTH {
        return Err(GainError::TooLong { max: MAX_LENGTH });
    }
    if substituted.matches(['+', '-', '*', '/']).count() > MAX_OPERATORS {
        return Err(GainError::TooComplex { max: MAX_OPERATORS });
    }
    if nesting_depth(&substituted) > MAX_NESTING {
        return Err(GainError::TooDeep { max: MAX_NESTING });
    }

    let (_, tree) = all_consuming(expr)
        .parse(substituted.as_str())
        .map_err(|e| GainError::Syntax(e.to_string()))?;
    let value = tree.eval()?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GainError::NonFinite)
    }
}

fn substitute_ratio(formula: &str, ratio: f64) -> String {
    let value = if ratio == 0.0 {
        ZERO_RATIO_EPSILON
    } else {
        ratio
    };
    let literal = format!("{value:?}");
    VARIABLE_TOKENS
        .iter()
        .fold(formula.to_string(), |acc, token| acc.replace(token, &literal))
}

fn nesting_depth(s: &str) -> usize {
    let mut depth = 0_usize;
    let mut max = 0_usize;
    for c in s.chars() {
        match c {
            '(' => {
                depth += 1;
                max = max.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

// ---------------------------------------------------------------------------
// Syntax tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Neg(Box<Expr>),
    Binary(Op, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn binary(op: Op, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    fn eval(&self) -> Result<f64, GainError> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Neg(inner) => Ok(-inner.eval()?),
            Self::Binary(op, lhs, rhs) => {
                let a = lhs.eval()?;
                let b = rhs.eval()?;
                match op {
                    Op::Add => Ok(a + b),
                    Op::Sub => Ok(a - b),
                    Op::Mul => Ok(a * b),
                    Op::Div | Op::FloorDiv if b == 0.0 => Err(GainError::DivisionByZero),
                    Op::Div => Ok(a / b),
                    Op::FloorDiv => Ok((a / b).floor()),
                    Op::Pow if a == 0.0 && b < 0.0 => Err(GainError::DivisionByZero),
                    Op::Pow => Ok(a.powf(b)),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

fn expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(one_of("+-"), term)).parse(input)?;
    let tree = rest.into_iter().fold(first, |lhs, (sign, rhs)| {
        let op = if sign == '+' { Op::Add } else { Op::Sub };
        Expr::binary(op, lhs, rhs)
    });
    Ok((input, tree))
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(alt((tag("//"), tag("/"), tag("*"))), unary)).parse(input)?;
    let tree = rest.into_iter().fold(first, |lhs, (symbol, rhs)| {
        let op = match symbol {
            "//" => Op::FloorDiv,
            "/" => Op::Div,
            _ => Op::Mul,
        };
        Expr::binary(op, lhs, rhs)
    });
    Ok((input, tree))
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(char('-'), unary), |inner| Expr::Neg(Box::new(inner))),
        preceded(char('+'), unary),
        power,
    ))
    .parse(input)
}

/// `**` is right associative and its exponent may carry a sign: `2**-1`.
fn power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = atom(input)?;
    let (input, exponent) = opt(preceded(tag("**"), unary)).parse(input)?;
    let tree = match exponent {
        Some(exponent) => Expr::binary(Op::Pow, base, exponent),
        None => base,
    };
    Ok((input, tree))
}

fn atom(input: &str) -> IResult<&str, Expr> {
    alt((number, delimited(char('('), expr, char(')')))).parse(input)
}

fn number(input: &str) -> IResult<&str, Expr> {
    map_res(
        recognize((
            alt((
                recognize((digit1, opt((char('.'), digit0)))),
                recognize((char('.'), digit1)),
            )),
            opt((one_of("eE"), opt(one_of("+-")), digit1)),
        )),
        |literal: &str| {
            if has_leading_zero(literal) {
                return Err(GainError::Syntax(format!("leading zero in \"{literal}\"")));
            }
            literal
                .parse::<f64>()
                .map(Expr::Number)
                .map_err(|e| GainError::Syntax(e.to_string()))
        },
    )
    .parse(input)
}

/// Integer literals such as `01` are rejected; `0`, `00`, `01.5` and `01e3` are not.
fn has_leading_zero(literal: &str) -> bool {
    literal.len() > 1
        && literal.starts_with('0')
        && !literal.contains(['.', 'e', 'E'])
        && literal.bytes().any(|b| b != b'0')
}
