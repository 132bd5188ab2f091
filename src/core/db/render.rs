/// SQL Parsing and Rendering Module
///
/// Turns SQL text into a `sqlparser` statement and renders statements back
/// into text for a target dialect.

use crate::core::{DruidError, Result};
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, GenericDialect};
use sqlparser::parser::Parser;
use std::iter::Peekable;
use std::str::Chars;
use tracing::warn;

/// Parses exactly one statement using the generic dialect.
pub fn parse_sql(sql: &str) -> Result<Statement> {
    parse_sql_with(&GenericDialect {}, sql)
}

/// Parses exactly one statement using the given input dialect.
pub fn parse_sql_with(dialect: &dyn Dialect, sql: &str) -> Result<Statement> {
    let mut statements = Parser::parse_sql(dialect, sql).map_err(|e| DruidError::Parse(e.to_string()))?;
    match statements.len() {
        1 => Ok(statements.remove(0)),
        0 => Err(DruidError::Parse("no SQL statement found".to_string())),
        n => Err(DruidError::Parse(format!("expected a single statement, found {}", n))),
    }
}

/// Output dialect of a [`SqlRender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// Apache Druid SQL
    Druid,
    /// The statement's canonical text, untranslated
    Generic,
}

/// Renders statements into SQL text for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlRender {
    dialect: SqlDialect,
}

impl SqlRender {
    pub fn new(dialect: SqlDialect) -> Self {
        SqlRender { dialect }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Renders `statement` in the target dialect.
    ///
    /// With `with_fallback`, a statement the dialect cannot express is
    /// rendered as its canonical text instead of failing.
    ///
    /// # Errors
    ///
    /// Returns `DruidError::Render` when translation fails and
    /// `with_fallback` is off.
    pub fn get_string(&self, statement: &Statement, with_fallback: bool) -> Result<String> {
        let generic = statement.to_string();
        match self.dialect {
            SqlDialect::Generic => Ok(generic),
            SqlDialect::Druid => match render_druid(statement, &generic) {
                Ok(sql) => Ok(sql),
                Err(e) if with_fallback => {
                    warn!("Falling back to generic SQL: {}", e);
                    Ok(generic)
                }
                Err(e) => Err(e),
            },
        }
    }
}

fn render_druid(statement: &Statement, generic: &str) -> Result<String> {
    match statement {
        Statement::Query(_) | Statement::Insert { .. } => requote_identifiers(generic),
        // Druid only plans through `EXPLAIN PLAN FOR`.
        Statement::Explain { statement, .. } => match statement.as_ref() {
            Statement::Query(_) | Statement::Insert { .. } => {
                requote_identifiers(&format!("EXPLAIN PLAN FOR {}", statement))
            }
            _ => Err(unsupported(generic)),
        },
        _ => Err(unsupported(generic)),
    }
}

fn unsupported(sql: &str) -> DruidError {
    let keyword = sql.split_whitespace().next().unwrap_or_default();
    DruidError::Render(format!("{} statements are not supported by Druid SQL", keyword))
}

/// Rewrites backtick-quoted identifiers as ANSI double-quoted identifiers.
/// String literals and double-quoted identifiers are copied unchanged.
pub(crate) fn requote_identifiers(sql: &str) -> Result<String> {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                out.push(ch);
                copy_quoted(&mut chars, ch, &mut out)?;
            }
            '`' => requote_backtick(&mut chars, &mut out)?,
            _ => out.push(ch),
        }
    }
    Ok(out)
}

// Quotes inside a quoted run are escaped by doubling.
fn copy_quoted(chars: &mut Peekable<Chars>, quote: char, out: &mut String) -> Result<()> {
    while let Some(ch) = chars.next() {
        out.push(ch);
        if ch == quote {
            if chars.peek() == Some(&quote) {
                chars.next();
                out.push(quote);
            } else {
                return Ok(());
            }
        }
    }
    Err(DruidError::Render(format!("unterminated {} quote", quote)))
}

fn requote_backtick(chars: &mut Peekable<Chars>, out: &mut String) -> Result<()> {
    out.push('"');
    while let Some(ch) = chars.next() {
        match ch {
            '`' if chars.peek() == Some(&'`') => {
                chars.next();
                out.push('`');
            }
            '`' => {
                out.push('"');
                return Ok(());
            }
            '"' => out.push_str("\"\""),
            _ => out.push(ch),
        }
    }
    Err(DruidError::Render("unterminated ` quote".to_string()))
}
