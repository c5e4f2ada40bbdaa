use crate::ast::*;
use crate::lexer::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Invalid relation '{0}': use <=, >= or =")]
    InvalidRelation(String),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<Program, ParseError> {
        let tokens = crate::lexer::Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_program()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    /// The `n`th token ahead that is not a newline or comment
    fn significant(&self, n: usize) -> Option<&Token> {
        self.tokens
            .iter()
            .skip(self.pos)
            .filter(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Comment))
            .nth(n)
    }

    fn peek_significant(&self, n: usize) -> TokenKind {
        self.significant(n).map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn skip_newlines_and_comments(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comment) {
            self.advance();
        }
    }

    fn last_end(&self, fallback: Span) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span.end)
            .unwrap_or(fallback.end)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?} '{}'", t.kind, t.text),
                span: t.span,
            },
            _ => ParseError::UnexpectedEof,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        self.skip_newlines_and_comments();
        match self.current().cloned() {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.unexpected(&format!("{:?}", kind))),
        }
    }

    fn skip_optional(&mut self, kind: TokenKind) {
        self.skip_newlines_and_comments();
        if self.peek_kind() == kind {
            self.advance();
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let objective = self.parse_objective()?;

        self.skip_newlines_and_comments();
        match self.peek_kind() {
            TokenKind::Subject => {
                self.advance();
                self.expect(TokenKind::To)?;
            }
            TokenKind::St => {
                self.advance();
            }
            _ => return Err(self.unexpected("subject to")),
        }
        self.skip_optional(TokenKind::Colon);

        let mut constraints = Vec::new();
        let mut non_negativity = Vec::new();
        loop {
            self.skip_newlines_and_comments();
            if self.peek_kind() == TokenKind::Eof {
                break;
            }
            if self.at_non_negativity() {
                non_negativity.push(self.parse_non_negativity()?);
            } else {
                constraints.push(self.parse_constraint()?);
            }
        }

        Ok(Program {
            objective,
            constraints,
            non_negativity,
        })
    }

    fn parse_objective(&mut self) -> Result<Objective, ParseError> {
        self.skip_newlines_and_comments();
        let start = self.current().map(|t| t.span).unwrap_or(Span::new(0, 0));
        let sense = match self.peek_kind() {
            TokenKind::Maximize => Sense::Maximize,
            TokenKind::Minimize => Sense::Minimize,
            _ => return Err(self.unexpected("maximize or minimize")),
        };
        self.advance();
        self.skip_optional(TokenKind::Colon);

        // `Z = ...`
        let mut name = None;
        if self.peek_significant(0) == TokenKind::Ident && self.peek_significant(1) == TokenKind::Eq {
            name = Some(self.expect(TokenKind::Ident)?.text);
            self.expect(TokenKind::Eq)?;
        }

        let expr = self.parse_linear_expr()?;

        Ok(Objective {
            span: start.merge(expr.span),
            sense,
            name,
            expr,
        })
    }

    /// `x1, x2, x3 >= 0`
    fn at_non_negativity(&self) -> bool {
        let mut n = 0;
        loop {
            if self.peek_significant(n) != TokenKind::Ident {
                return false;
            }
            match self.peek_significant(n + 1) {
                TokenKind::Comma => n += 2,
                TokenKind::Ge => break,
                _ => return false,
            }
        }
        self.significant(n + 2)
            .filter(|t| t.kind == TokenKind::Number)
            .and_then(|t| t.text.parse::<f64>().ok())
            == Some(0.0)
    }

    fn parse_non_negativity(&mut self) -> Result<NonNegativity, ParseError> {
        let first = self.expect(TokenKind::Ident)?;
        let start = first.span;
        let mut variables = vec![first.text];
        while self.peek_significant(0) == TokenKind::Comma {
            self.expect(TokenKind::Comma)?;
            variables.push(self.expect(TokenKind::Ident)?.text);
        }
        self.expect(TokenKind::Ge)?;
        self.expect(TokenKind::Number)?;

        Ok(NonNegativity {
            span: Span::new(start.start, self.last_end(start)),
            variables,
        })
    }

    fn parse_constraint(&mut self) -> Result<ConstraintDecl, ParseError> {
        let lhs = self.parse_linear_expr()?;
        let relation = self.parse_relation()?;
        let rhs = self.parse_signed_number()?;

        Ok(ConstraintDecl {
            span: Span::new(lhs.span.start, self.last_end(lhs.span)),
            lhs,
            relation,
            rhs,
        })
    }

    fn parse_relation(&mut self) -> Result<Relation, ParseError> {
        self.skip_newlines_and_comments();
        let relation = match self.peek_kind() {
            TokenKind::Le => Relation::Le,
            TokenKind::Ge => Relation::Ge,
            TokenKind::Eq => Relation::Eq,
            TokenKind::Error => {
                let text = self.current().map(|t| t.text.clone()).unwrap_or_default();
                return Err(ParseError::InvalidRelation(text));
            }
            _ => return Err(self.unexpected("<=, >= or =")),
        };
        self.advance();
        Ok(relation)
    }

    fn parse_sign(&mut self) -> f64 {
        self.skip_newlines_and_comments();
        match self.peek_kind() {
            TokenKind::Plus => {
                self.advance();
                1.0
            }
            TokenKind::Minus => {
                self.advance();
                -1.0
            }
            _ => 1.0,
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Number)?;
        token
            .text
            .parse()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }

    fn parse_signed_number(&mut self) -> Result<f64, ParseError> {
        let sign = self.parse_sign();
        self.skip_newlines_and_comments();
        if self.peek_kind() != TokenKind::Number {
            return Err(self.unexpected("number"));
        }
        Ok(sign * self.parse_number()?)
    }

    fn parse_linear_expr(&mut self) -> Result<LinearExpr, ParseError> {
        let first = self.parse_term()?;
        let mut span = first.span;
        let mut terms = vec![first];

        loop {
            self.skip_newlines_and_comments();
            if !matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
                break;
            }
            let term = self.parse_term()?;
            span = span.merge(term.span);
            terms.push(term);
        }

        Ok(LinearExpr { span, terms })
    }

    /// `[+|-] [number] [*] [variable]`, at least one of number or variable
    fn parse_term(&mut self) -> Result<Term, ParseError> {
        self.skip_newlines_and_comments();
        let start = self.current().map(|t| t.span).unwrap_or(Span::new(0, 0));
        let sign = self.parse_sign();

        self.skip_newlines_and_comments();
        let magnitude = match self.peek_kind() {
            TokenKind::Number => Some(self.parse_number()?),
            _ => None,
        };

        let starred = self.peek_significant(0) == TokenKind::Star;
        if starred {
            self.expect(TokenKind::Star)?;
        }

        self.skip_newlines_and_comments();
        let variable = match self.peek_kind() {
            TokenKind::Ident => self.advance().map(|t| t.text.clone()),
            _ if starred || magnitude.is_none() => return Err(self.unexpected("number or variable")),
            _ => None,
        };

        Ok(Term {
            span: Span::new(start.start, self.last_end(start)),
            coefficient: sign * magnitude.unwrap_or(1.0),
            variable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTBOOK: &str = "// Wyndor Glass
maximize Z = 3x1 + 5x2
subject to
    x1 <= 4
    2x2 <= 12
    3x1 + 2x2 <= 18
    x1, x2 >= 0
";

    fn term(coefficient: f64, variable: &str) -> (f64, Option<String>) {
        (coefficient, Some(variable.to_string()))
    }

    fn terms(expr: &LinearExpr) -> Vec<(f64, Option<String>)> {
        expr.terms.iter().map(|t| (t.coefficient, t.variable.clone())).collect()
    }

    #[test]
    fn test_parse_textbook_program() {
        let program = Parser::parse(TEXTBOOK).unwrap();
        assert_eq!(program.objective.sense, Sense::Maximize);
        assert_eq!(program.objective.name.as_deref(), Some("Z"));
        assert_eq!(terms(&program.objective.expr), vec![term(3.0, "x1"), term(5.0, "x2")]);

        assert_eq!(program.constraints.len(), 3);
        let last = &program.constraints[2];
        assert_eq!(terms(&last.lhs), vec![term(3.0, "x1"), term(2.0, "x2")]);
        assert_eq!(last.relation, Relation::Le);
        assert_eq!(last.rhs, 18.0);

        assert_eq!(program.non_negativity.len(), 1);
        assert_eq!(program.non_negativity[0].variables, vec!["x1", "x2"]);
    }

    #[test]
    fn test_objective_name_is_optional() {
        let program = Parser::parse("max: 2x1 + x2\nst\nx1 + x2 <= 4").unwrap();
        assert_eq!(program.objective.name, None);
        assert_eq!(terms(&program.objective.expr), vec![term(2.0, "x1"), term(1.0, "x2")]);
    }

    #[test]
    fn test_signs_stars_and_decimals() {
        let program = Parser::parse("maximize P = -x1 + 2.5 * x2 - .5x3\nsubject to: x1 - x2 >= -3").unwrap();
        assert_eq!(
            terms(&program.objective.expr),
            vec![term(-1.0, "x1"), term(2.5, "x2"), term(-0.5, "x3")]
        );
        let c = &program.constraints[0];
        assert_eq!(c.relation, Relation::Ge);
        assert_eq!(c.rhs, -3.0);
    }

    #[test]
    fn test_constant_term_is_kept_for_the_compiler() {
        let program = Parser::parse("maximize Z = x1\nsubject to\nx1 + 2 <= 4").unwrap();
        assert_eq!(terms(&program.constraints[0].lhs), vec![term(1.0, "x1"), (2.0, None)]);
    }

    #[test]
    fn test_single_variable_lower_bound_is_not_a_constraint() {
        let program = Parser::parse("maximize Z = x1\nsubject to\nx1 <= 4\nx1 >= 0\nx1 >= 1").unwrap();
        assert_eq!(program.constraints.len(), 2);
        assert_eq!(program.constraints[1].relation, Relation::Ge);
        assert_eq!(program.non_negativity[0].variables, vec!["x1"]);
    }

    #[test]
    fn test_minimize_is_parsed() {
        let program = Parser::parse("minimize C = x1\nsubject to\nx1 >= 2").unwrap();
        assert_eq!(program.objective.sense, Sense::Minimize);
    }

    #[test]
    fn test_spans() {
        let program = Parser::parse("max Z = 3x1\nst\nx1 <= 4").unwrap();
        assert_eq!(program.objective.span, Span::new(0, 11));
        assert_eq!(program.constraints[0].span, Span::new(15, 22));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Parser::parse("maximize Z = x1\nsubject to\nx1 < 4").unwrap_err(),
            ParseError::InvalidRelation("<".to_string())
        );
        assert_eq!(
            Parser::parse("maximize Z = x1\nsubject to\nx1 <=").unwrap_err(),
            ParseError::UnexpectedEof
        );
        assert!(matches!(
            Parser::parse("Z = x1"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Parser::parse("maximize Z = x1\nx1 <= 4"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Parser::parse("maximize Z = 3 *\nsubject to\nx1 <= 4"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }
}
