use crate::error::WitError;
use crate::utils::quote;
use lazy_static::lazy_static;
use regex::Regex;
use wit_dbi_schema::{CmpOp, Operand, RefineExpr};

lazy_static! {
    // Float before integer, two-char operators before their one-char prefixes.
    static ref TOKEN_REGEX: Regex = Regex::new(
        r#"(-?\d+\.\d+|-?\d+|"[^"]*"|[a-z0-9][a-z0-9-]*|==|!=|<=|>=|&&|\|\||[<>()]|\s+)"#
    )
    .unwrap();
    static ref WHITESPACE_RX: Regex = Regex::new(r"^\s+$").unwrap();
}

#[derive(Debug, PartialEq)]
struct Token {
    text: String,
    column: usize,
}

/// Split a refinement rule into tokens, rejecting any text the restricted
/// grammar has no token for.
fn tokenize_rule(record: &str, rule: &str) -> Result<Vec<Token>, WitError> {
    let mut tokens = Vec::new();
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(rule) {
        if mat.start() > last_end {
            return Err(syntax_error(
                record,
                &format!("Syntax error: {}", quote(&rule[last_end..mat.start()])),
                last_end + 1,
            ));
        }
        let part = mat.as_str();
        if !WHITESPACE_RX.is_match(part) {
            tokens.push(Token {
                text: part.to_string(),
                column: mat.start() + 1,
            });
        }
        last_end = mat.end();
    }

    if last_end != rule.len() {
        return Err(syntax_error(
            record,
            &format!("Syntax error: {}", quote(&rule[last_end..])),
            last_end + 1,
        ));
    }

    Ok(tokens)
}

fn syntax_error(record: &str, msg: &str, column: usize) -> WitError {
    WitError::ParseError {
        record: record.to_string(),
        msg: msg.to_string(),
        column,
    }
}

struct Cursor<'a> {
    record: &'a str,
    rule_len: usize,
    tokens: Vec<Token>,
    index: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.peek().map(|t| t.text.as_str()) == Some(text) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn error_here(&self, expected: &str) -> WitError {
        match self.peek() {
            Some(token) => syntax_error(
                self.record,
                &format!("Expected {} but found {}", expected, quote(&token.text)),
                token.column,
            ),
            None => syntax_error(
                self.record,
                &format!("Expected {} but found end of rule", expected),
                self.rule_len + 1,
            ),
        }
    }
}

/// Parse a refinement rule into its expression tree.
///
/// Grammar: comparisons over field names and literals, joined by `&&` and
/// `||` (conjunction binds tighter), with parentheses for grouping.
pub fn parse_refine_rule(record: &str, rule: &str) -> Result<RefineExpr, WitError> {
    let tokens = tokenize_rule(record, rule)?;
    let mut cursor = Cursor {
        record,
        rule_len: rule.len(),
        tokens,
        index: 0,
    };

    let expr = parse_or(&mut cursor)?;
    if let Some(token) = cursor.peek() {
        return Err(syntax_error(
            record,
            &format!("Unexpected token {}", quote(&token.text)),
            token.column,
        ));
    }
    Ok(expr)
}

fn parse_or(cursor: &mut Cursor) -> Result<RefineExpr, WitError> {
    let mut lhs = parse_and(cursor)?;
    while cursor.eat("||") {
        let rhs = parse_and(cursor)?;
        lhs = RefineExpr::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_and(cursor: &mut Cursor) -> Result<RefineExpr, WitError> {
    let mut lhs = parse_cmp(cursor)?;
    while cursor.eat("&&") {
        let rhs = parse_cmp(cursor)?;
        lhs = RefineExpr::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_cmp(cursor: &mut Cursor) -> Result<RefineExpr, WitError> {
    if cursor.eat("(") {
        let expr = parse_or(cursor)?;
        if !cursor.eat(")") {
            return Err(cursor.error_here("\")\""));
        }
        return Ok(expr);
    }

    let lhs = parse_operand(cursor)?;
    let op = match cursor.peek().map(|t| t.text.as_str()) {
        Some("==") => CmpOp::Eq,
        Some("!=") => CmpOp::Ne,
        Some("<") => CmpOp::Lt,
        Some("<=") => CmpOp::Le,
        Some(">") => CmpOp::Gt,
        Some(">=") => CmpOp::Ge,
        _ => return Err(cursor.error_here("comparison operator")),
    };
    cursor.index += 1;
    let rhs = parse_operand(cursor)?;

    Ok(RefineExpr::Cmp { lhs, op, rhs })
}

fn parse_operand(cursor: &mut Cursor) -> Result<Operand, WitError> {
    let token = match cursor.peek() {
        Some(token) => token,
        None => return Err(cursor.error_here("operand")),
    };
    let text = token.text.clone();
    let column = token.column;
    cursor.index += 1;

    if text.starts_with('"') {
        return Ok(Operand::Str(text[1..text.len() - 1].to_string()));
    }
    if text.starts_with(|c: char| c.is_ascii_digit()) || text.starts_with('-') {
        if text.contains('.') {
            return match text.parse::<f64>() {
                Ok(v) => Ok(Operand::Float(v)),
                Err(_) => Err(syntax_error(
                    cursor.record,
                    &format!("Invalid number {}", quote(&text)),
                    column,
                )),
            };
        }
        return match text.parse::<i64>() {
            Ok(v) => Ok(Operand::Int(v)),
            Err(_) => Err(syntax_error(
                cursor.record,
                &format!("Invalid number {}", quote(&text)),
                column,
            )),
        };
    }
    Ok(Operand::Field(text))
}
