use std::path::Path;

use bigm_solver::{ConstraintOp, LinearProgram, ProgramError};
use thiserror::Error;

use crate::ast::*;
use crate::parser::Parser;

/// Name given to the objective when the source does not write `Z = ...`
pub const DEFAULT_OBJECTIVE_NAME: &str = "Z";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Only maximization problems are supported; negate the objective to minimize")]
    Minimization,
    #[error("Unknown variable '{0}': variables are named x1, x2, ...")]
    UnknownVariable(String),
    #[error("Constant term {0} in a linear expression; move it to the right-hand side")]
    ConstantOnLeft(f64),
    #[error("Too many variables: {found} (at most {max})")]
    TooManyVariables { found: usize, max: usize },
    #[error("Too many constraints: {found} (at most {max})")]
    TooManyConstraints { found: usize, max: usize },
    #[error("No constraints after 'subject to'")]
    NoConstraints,
    #[error("Invalid program: {0}")]
    InvalidProgram(#[from] ProgramError),
    #[error("Parse error in {0}: {1}")]
    ParseError(String, String),
    #[error("IO error: {0}")]
    IoError(String),
}

/// Lowers a parsed [`Program`] to a [`LinearProgram`]
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    max_variables: usize,
    max_constraints: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            max_variables: 10,
            max_constraints: 10,
        }
    }

    pub fn with_limits(mut self, max_variables: usize, max_constraints: usize) -> Self {
        self.max_variables = max_variables;
        self.max_constraints = max_constraints;
        self
    }

    pub fn compile_file(&self, path: impl AsRef<Path>) -> Result<LinearProgram, CompileError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompileError::IoError(format!("{}: {}", path.display(), e)))?;
        let program = Parser::parse(&source)
            .map_err(|e| CompileError::ParseError(path.display().to_string(), e.to_string()))?;
        self.compile(&program)
    }

    pub fn compile_source(&self, source: &str) -> Result<LinearProgram, CompileError> {
        let program = Parser::parse(source)
            .map_err(|e| CompileError::ParseError("<input>".to_string(), e.to_string()))?;
        self.compile(&program)
    }

    pub fn compile(&self, program: &Program) -> Result<LinearProgram, CompileError> {
        if program.objective.sense == Sense::Minimize {
            return Err(CompileError::Minimization);
        }
        if program.constraints.is_empty() {
            return Err(CompileError::NoConstraints);
        }
        if program.constraints.len() > self.max_constraints {
            return Err(CompileError::TooManyConstraints {
                found: program.constraints.len(),
                max: self.max_constraints,
            });
        }

        // The highest index seen anywhere fixes the column count
        let mut num_variables = 0;
        let expressions = std::iter::once(&program.objective.expr).chain(program.constraints.iter().map(|c| &c.lhs));
        for expr in expressions {
            for term in &expr.terms {
                match &term.variable {
                    Some(name) => num_variables = num_variables.max(variable_index(name)? + 1),
                    None => return Err(CompileError::ConstantOnLeft(term.coefficient)),
                }
            }
        }
        for bound in &program.non_negativity {
            for name in &bound.variables {
                num_variables = num_variables.max(variable_index(name)? + 1);
            }
        }
        if num_variables > self.max_variables {
            return Err(CompileError::TooManyVariables {
                found: num_variables,
                max: self.max_variables,
            });
        }

        let name = program
            .objective
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_OBJECTIVE_NAME.to_string());
        let mut lp = LinearProgram::new(name, coefficients(&program.objective.expr, num_variables)?);
        for c in &program.constraints {
            lp.add_constraint(coefficients(&c.lhs, num_variables)?, relation_op(c.relation), c.rhs);
        }

        lp.validate()?;
        Ok(lp)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-based column of `x<k>`
pub(crate) fn variable_index(name: &str) -> Result<usize, CompileError> {
    name.strip_prefix('x')
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<usize>().ok())
        .filter(|&k| k >= 1)
        .map(|k| k - 1)
        .ok_or_else(|| CompileError::UnknownVariable(name.to_string()))
}

/// Dense coefficient row; repeated variables sum
fn coefficients(expr: &LinearExpr, num_variables: usize) -> Result<Vec<f64>, CompileError> {
    let mut row = vec![0.0; num_variables];
    for term in &expr.terms {
        let Some(name) = &term.variable else {
            return Err(CompileError::ConstantOnLeft(term.coefficient));
        };
        row[variable_index(name)?] += term.coefficient;
    }
    Ok(row)
}

fn relation_op(relation: Relation) -> ConstraintOp {
    match relation {
        Relation::Le => ConstraintOp::Le,
        Relation::Ge => ConstraintOp::Ge,
        Relation::Eq => ConstraintOp::Eq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigm_solver::{Solver, SolutionStatus};
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> Result<LinearProgram, CompileError> {
        Compiler::new().compile_source(source)
    }

    #[test]
    fn test_compile_textbook() {
        let lp = compile(
            "maximize Z = 3x1 + 5x2
             subject to
                 x1 <= 4
                 2x2 <= 12
                 3x1 + 2x2 <= 18
                 x1, x2 >= 0",
        )
        .unwrap();
        let expected = LinearProgram::new("Z", vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .with_constraint(vec![0.0, 2.0], ConstraintOp::Le, 12.0)
            .with_constraint(vec![3.0, 2.0], ConstraintOp::Le, 18.0);
        assert_eq!(lp, expected);
    }

    #[test]
    fn test_missing_and_repeated_variables() {
        let lp = compile("max P = x3 + x1 + x1\nst\nx2 - x3 >= -1\nx1 = 2").unwrap();
        assert_eq!(lp.objective_name, "P");
        assert_eq!(lp.objective, vec![2.0, 0.0, 1.0]);
        assert_eq!(lp.constraints[0].coefficients, vec![0.0, 1.0, -1.0]);
        assert_eq!(lp.constraints[0].op, ConstraintOp::Ge);
        assert_eq!(lp.constraints[0].rhs, -1.0);
        assert_eq!(lp.constraints[1].coefficients, vec![1.0, 0.0, 0.0]);
        assert_eq!(lp.constraints[1].op, ConstraintOp::Eq);
    }

    #[test]
    fn test_non_negativity_widens_columns() {
        let lp = compile("max Z = x1\nst\nx1 <= 1\nx1, x2 >= 0").unwrap();
        assert_eq!(lp.num_variables(), 2);
        assert_eq!(lp.objective, vec![1.0, 0.0]);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            compile("minimize C = x1\nsubject to\nx1 >= 1").unwrap_err(),
            CompileError::Minimization
        );
        assert_eq!(
            compile("max Z = y\nst\ny <= 1").unwrap_err(),
            CompileError::UnknownVariable("y".to_string())
        );
        assert_eq!(
            compile("max Z = x0\nst\nx0 <= 1").unwrap_err(),
            CompileError::UnknownVariable("x0".to_string())
        );
        assert_eq!(
            compile("max Z = x1\nst\nx1 + 2 <= 4").unwrap_err(),
            CompileError::ConstantOnLeft(2.0)
        );
        assert_eq!(compile("max Z = x1\nst\nx1 >= 0").unwrap_err(), CompileError::NoConstraints);
        assert!(matches!(
            compile("max Z = x1\nst\nx1 <"),
            Err(CompileError::ParseError(..))
        ));
    }

    #[test]
    fn test_limits() {
        let source = "max Z = x1 + x4\nst\nx1 <= 1\nx4 <= 2";
        assert_eq!(
            Compiler::new().with_limits(3, 10).compile_source(source).unwrap_err(),
            CompileError::TooManyVariables { found: 4, max: 3 }
        );
        assert_eq!(
            Compiler::new().with_limits(10, 1).compile_source(source).unwrap_err(),
            CompileError::TooManyConstraints { found: 2, max: 1 }
        );
        assert!(Compiler::new().compile_source(source).is_ok());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Compiler::new().compile_file("/nonexistent/program.lp"),
            Err(CompileError::IoError(_))
        ));
    }

    #[test]
    fn test_text_to_trace() {
        let lp = compile(
            "// mixed relations
             maximize Z = 2x1 + 3x2
             subject to
                 x1 + x2 <= 4
                 x1 + 3x2 >= 6
                 x1 = 2",
        )
        .unwrap();
        let solution = Solver::new().solve(&lp).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);

        let first = &solution.snapshots[0];
        assert_eq!(first.headers, vec!["x1", "x2", "s1", "s2", "a1", "a2", "RHS"]);
        assert_eq!(first.basis, vec!["s1", "a1", "a2"]);
        assert_eq!(first.rendered.zj_minus_cj[1], "-3M - 3");

        let values = solution.values();
        assert_eq!(values["x1"], "2");
        assert_eq!(values["x2"], "2");
        assert_eq!(values["Z"], "10");
    }

    #[test]
    fn test_text_to_infeasible_trace() {
        let lp = compile("max Z = x1\nst\nx1 >= 5\nx1 <= 3").unwrap();
        let solution = Solver::new().solve(&lp).unwrap();
        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.final_snapshot().infeasible);
    }
}
