//! WASM bindings for the LP notation
//!
//! JavaScript-friendly entry points for editors and the browser trace view.

use wasm_bindgen::prelude::*;

use crate::ast::*;
use crate::compiler::{CompileError, Compiler, variable_index};
use crate::lexer::{Lexer, TokenKind};
use crate::parser::{ParseError, Parser};
use bigm_solver::Solver;

fn js_error(e: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// Parse source code and return the AST as JSON
#[wasm_bindgen]
pub fn parse(source: &str) -> Result<JsValue, JsValue> {
    let program = Parser::parse(source).map_err(js_error)?;
    serde_wasm_bindgen::to_value(&program).map_err(js_error)
}

/// Tokenize source code and return tokens as JSON
#[wasm_bindgen]
pub fn tokenize(source: &str) -> Result<JsValue, JsValue> {
    let tokens: Vec<TokenInfo> = Lexer::tokenize(source)
        .into_iter()
        .map(|t| TokenInfo {
            kind: format!("{:?}", t.kind),
            token_type: token_type(t.kind),
            text: t.text,
            start: t.span.start,
            end: t.span.end,
        })
        .collect();
    serde_wasm_bindgen::to_value(&tokens).map_err(js_error)
}

/// Token information for JavaScript
#[derive(serde::Serialize)]
struct TokenInfo {
    kind: String,
    /// Highlighting class
    token_type: &'static str,
    text: String,
    start: usize,
    end: usize,
}

fn token_type(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Maximize | TokenKind::Minimize => "keyword",
        TokenKind::Subject | TokenKind::To | TokenKind::St => "keyword",
        TokenKind::Ident => "variable",
        TokenKind::Number => "number",
        TokenKind::Comment => "comment",
        TokenKind::Plus | TokenKind::Minus | TokenKind::Star => "operator",
        TokenKind::Le | TokenKind::Ge | TokenKind::Eq => "operator",
        TokenKind::Colon | TokenKind::Comma => "delimiter",
        TokenKind::Newline => "whitespace",
        TokenKind::Error | TokenKind::Eof => "error",
    }
}

/// Validate source code and return diagnostics as JSON
#[wasm_bindgen]
pub fn validate(source: &str) -> JsValue {
    let diagnostics = get_diagnostics(source);
    serde_wasm_bindgen::to_value(&diagnostics).unwrap_or(JsValue::NULL)
}

/// Solve the program and return every tableau of the trace as JSON
#[wasm_bindgen]
pub fn solve(source: &str, big_m: Option<f64>) -> Result<JsValue, JsValue> {
    let program = Parser::parse(source).map_err(js_error)?;
    let lp = Compiler::new().compile(&program).map_err(js_error)?;

    let mut solver = Solver::new();
    if let Some(m) = big_m {
        solver = solver.with_big_m(m);
    }
    let solution = solver.solve(&lp).map_err(js_error)?;
    serde_wasm_bindgen::to_value(&solution).map_err(js_error)
}

#[derive(serde::Serialize, Debug, PartialEq)]
struct Diagnostic {
    start: usize,
    end: usize,
    severity: String,
    message: String,
}

impl Diagnostic {
    fn error(start: usize, end: usize, message: impl Into<String>) -> Self {
        Self {
            start,
            end,
            severity: "error".to_string(),
            message: message.into(),
        }
    }
}

fn get_diagnostics(source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    match Parser::parse(source) {
        Err(e) => {
            let (start, end) = match &e {
                ParseError::UnexpectedToken { span, .. } => (span.start, span.end),
                _ => (0, source.len()),
            };
            diagnostics.push(Diagnostic::error(start, end, e.to_string()));
        }
        Ok(program) => {
            validate_program(&program, &mut diagnostics);
            if diagnostics.is_empty() {
                if let Err(e) = Compiler::new().compile(&program) {
                    diagnostics.push(Diagnostic::error(0, source.len(), e.to_string()));
                }
            }
        }
    }

    diagnostics
}

/// Per-term checks, so the editor can underline the offending term
fn validate_program(program: &Program, diagnostics: &mut Vec<Diagnostic>) {
    let objective = &program.objective;
    if objective.sense == Sense::Minimize {
        diagnostics.push(Diagnostic::error(
            objective.span.start,
            objective.span.end,
            CompileError::Minimization.to_string(),
        ));
    }

    let expressions = std::iter::once(&objective.expr).chain(program.constraints.iter().map(|c| &c.lhs));
    for term in expressions.flat_map(|e| &e.terms) {
        let error = match &term.variable {
            Some(name) => variable_index(name).err(),
            None => Some(CompileError::ConstantOnLeft(term.coefficient)),
        };
        if let Some(e) = error {
            diagnostics.push(Diagnostic::error(term.span.start, term.span.end, e.to_string()));
        }
    }

    for bound in &program.non_negativity {
        for name in &bound.variables {
            if let Err(e) = variable_index(name) {
                diagnostics.push(Diagnostic::error(bound.span.start, bound.span.end, e.to_string()));
            }
        }
    }
}
