use std::fmt;

use crate::error::ProgramError;
use crate::problem::{Constraint, ConstraintOp, LinearProgram};
use crate::tableau::{ColumnKind, MAX_PRECISION, Precision, Tableau};

/// Label of the RHS column
pub const RHS_LABEL: &str = "RHS";

/// Build the initial Big-M tableau for a program.
///
/// Each constraint gets its RHS made non-negative first, then a slack
/// (`<=`), a surplus and an artificial (`>=`), or an artificial (`=`).
/// Slack columns come before artificial columns, each numbered in
/// constraint order.
pub fn build(
    program: &LinearProgram,
    big_m: f64,
    precision: Precision,
) -> Result<Tableau, ProgramError> {
    program.validate()?;
    if !(big_m.is_finite() && big_m > 0.0) {
        return Err(ProgramError::InvalidBigM(big_m));
    }
    if precision.decimals() > MAX_PRECISION {
        return Err(ProgramError::InvalidPrecision {
            found: precision.decimals(),
            max: MAX_PRECISION,
        });
    }

    let n_vars = program.num_variables();
    let constraints: Vec<Constraint> = program.constraints.iter().map(Constraint::normalized).collect();

    // Count slack and artificial variables needed
    let mut n_slack = 0;
    let mut n_artificial = 0;
    for c in &constraints {
        match c.op {
            ConstraintOp::Le => n_slack += 1,
            ConstraintOp::Ge => {
                n_slack += 1; // surplus
                n_artificial += 1;
            }
            ConstraintOp::Eq => n_artificial += 1,
        }
    }

    let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
    let mut rows = vec![vec![0.0; total_cols]; constraints.len()];
    let mut basis = vec![0; constraints.len()];

    let mut slack_idx = n_vars;
    let mut artificial_idx = n_vars + n_slack;

    for (i, c) in constraints.iter().enumerate() {
        rows[i][..n_vars].copy_from_slice(&c.coefficients);
        rows[i][total_cols - 1] = c.rhs;

        match c.op {
            ConstraintOp::Le => {
                rows[i][slack_idx] = 1.0;
                basis[i] = slack_idx;
                slack_idx += 1;
            }
            ConstraintOp::Ge => {
                rows[i][slack_idx] = -1.0; // surplus
                slack_idx += 1;
                rows[i][artificial_idx] = 1.0;
                basis[i] = artificial_idx;
                artificial_idx += 1;
            }
            ConstraintOp::Eq => {
                rows[i][artificial_idx] = 1.0;
                basis[i] = artificial_idx;
                artificial_idx += 1;
            }
        }
    }

    let cj: Vec<f64> = program
        .objective
        .iter()
        .copied()
        .chain(std::iter::repeat_n(0.0, n_slack))
        .chain(std::iter::repeat_n(-big_m, n_artificial))
        .chain([0.0])
        .collect();

    let headers: Vec<String> = (1..=n_vars)
        .map(|k| format!("x{}", k))
        .chain((1..=n_slack).map(|k| format!("s{}", k)))
        .chain((1..=n_artificial).map(|k| format!("a{}", k)))
        .chain([RHS_LABEL.to_string()])
        .collect();

    let kinds: Vec<ColumnKind> = std::iter::repeat_n(ColumnKind::Decision, n_vars)
        .chain(std::iter::repeat_n(ColumnKind::Slack, n_slack))
        .chain(std::iter::repeat_n(ColumnKind::Artificial, n_artificial))
        .chain([ColumnKind::Rhs])
        .collect();

    let largest = program.largest_magnitude();
    if largest * 100.0 > big_m {
        log::warn!(
            "Big-M {} does not dominate the largest coefficient {}; penalties may not drive artificials out",
            big_m,
            largest
        );
    }
    log::debug!(
        "Standard form: {} variables, {} slack, {} artificial",
        n_vars,
        n_slack,
        n_artificial
    );

    Ok(Tableau::from_parts(rows, basis, cj, headers, kinds, precision))
}

/// The program rewritten as equations over slack and artificial variables,
/// for display before solving.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardForm {
    objective_name: String,
    objective: Vec<f64>,
    equations: Vec<Equation>,
}

#[derive(Debug, Clone, PartialEq)]
struct Equation {
    coefficients: Vec<f64>,
    /// `(coefficient, label)` pairs for the injected variables
    extra: Vec<(f64, String)>,
    rhs: f64,
}

impl StandardForm {
    pub fn new(program: &LinearProgram) -> Result<Self, ProgramError> {
        program.validate()?;
        let constraints: Vec<Constraint> = program.constraints.iter().map(Constraint::normalized).collect();

        let n_slack = constraints.iter().filter(|c| c.op != ConstraintOp::Eq).count();
        let mut slack = 0;
        let mut artificial = 0;
        let mut next_slack = || {
            slack += 1;
            format!("s{}", slack)
        };
        let mut equations = Vec::with_capacity(constraints.len());
        for c in &constraints {
            let extra = match c.op {
                ConstraintOp::Le => vec![(1.0, next_slack())],
                ConstraintOp::Ge => {
                    artificial += 1;
                    vec![(-1.0, next_slack()), (1.0, format!("a{}", artificial))]
                }
                ConstraintOp::Eq => {
                    artificial += 1;
                    vec![(1.0, format!("a{}", artificial))]
                }
            };
            equations.push(Equation {
                coefficients: c.coefficients.clone(),
                extra,
                rhs: c.rhs,
            });
        }
        debug_assert_eq!(slack, n_slack);

        Ok(Self {
            objective_name: program.objective_name.clone(),
            objective: program.objective.clone(),
            equations,
        })
    }
}

/// Writes `3x1 - x2 + 1/2x3` style linear terms, skipping zeros
fn write_terms<'a>(
    f: &mut fmt::Formatter<'_>,
    terms: impl Iterator<Item = (f64, &'a str)>,
) -> fmt::Result {
    let mut first = true;
    for (coef, name) in terms {
        if coef == 0.0 {
            continue;
        }
        let magnitude = coef.abs();
        let number = if magnitude == 1.0 {
            String::new()
        } else {
            crate::format::to_fraction(magnitude)
        };
        match (first, coef < 0.0) {
            (true, true) => write!(f, "-{}{}", number, name)?,
            (true, false) => write!(f, "{}{}", number, name)?,
            (false, true) => write!(f, " - {}{}", number, name)?,
            (false, false) => write!(f, " + {}{}", number, name)?,
        }
        first = false;
    }
    if first {
        write!(f, "0")?;
    }
    Ok(())
}

impl fmt::Display for StandardForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = (1..=self.objective.len()).map(|k| format!("x{}", k)).collect();

        write!(f, "Maximize {} = ", self.objective_name)?;
        write_terms(f, self.objective.iter().copied().zip(names.iter().map(String::as_str)))?;
        writeln!(f)?;
        writeln!(f, "Subject to:")?;
        for eq in &self.equations {
            write!(f, "  ")?;
            let decision = eq.coefficients.iter().copied().zip(names.iter().map(String::as_str));
            let extra = eq.extra.iter().map(|(c, n)| (*c, n.as_str()));
            write_terms(f, decision.chain(extra))?;
            writeln!(f, " = {}", crate::format::to_fraction(eq.rhs))?;
        }
        write!(f, "  ")?;
        let all: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .chain(self.equations.iter().flat_map(|e| e.extra.iter().map(|(_, n)| n.as_str())))
            .collect();
        write!(f, "{} >= 0", all.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mixed() -> LinearProgram {
        LinearProgram::new("Z", vec![2.0, 3.0])
            .with_constraint(vec![1.0, 1.0], ConstraintOp::Le, 4.0)
            .with_constraint(vec![1.0, 3.0], ConstraintOp::Ge, 6.0)
            .with_constraint(vec![1.0, 0.0], ConstraintOp::Eq, 2.0)
    }

    #[test]
    fn test_columns_and_basis() {
        let t = build(&mixed(), 1000.0, Precision::default()).unwrap();
        assert_eq!(t.headers(), &["x1", "x2", "s1", "s2", "a1", "a2", "RHS"]);
        assert_eq!(t.cj(), &[2.0, 3.0, 0.0, 0.0, -1000.0, -1000.0, 0.0]);
        assert_eq!(t.basis_labels(), vec!["s1", "a1", "a2"]);
        assert_eq!(t.cb(), &[0.0, -1000.0, -1000.0]);
        assert_eq!(t.row(0), &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 4.0]);
        assert_eq!(t.row(1), &[1.0, 3.0, 0.0, -1.0, 1.0, 0.0, 6.0]);
        assert_eq!(t.row(2), &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0]);
        assert_eq!(
            t.kinds(),
            &[
                ColumnKind::Decision,
                ColumnKind::Decision,
                ColumnKind::Slack,
                ColumnKind::Slack,
                ColumnKind::Artificial,
                ColumnKind::Artificial,
                ColumnKind::Rhs
            ]
        );
    }

    #[test]
    fn test_negative_rhs_is_normalized_first() {
        // -x1 - x2 >= -8 becomes x1 + x2 <= 8: a slack row, no artificial
        let lp = LinearProgram::new("Z", vec![1.0, 1.0]).with_constraint(
            vec![-1.0, -1.0],
            ConstraintOp::Ge,
            -8.0,
        );
        let t = build(&lp, 1000.0, Precision::default()).unwrap();
        assert_eq!(t.headers(), &["x1", "x2", "s1", "RHS"]);
        assert_eq!(t.row(0), &[1.0, 1.0, 1.0, 8.0]);
        assert_eq!(t.basis_labels(), vec!["s1"]);
        // caller data is untouched
        assert_eq!(lp.constraints[0].rhs, -8.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let lp = LinearProgram::new("Z", vec![1.0, 1.0]).with_constraint(
            vec![1.0],
            ConstraintOp::Le,
            1.0,
        );
        assert!(matches!(
            build(&lp, 1000.0, Precision::default()),
            Err(ProgramError::CoefficientCount { .. })
        ));
        assert_eq!(
            build(&mixed(), 0.0, Precision::default()).unwrap_err(),
            ProgramError::InvalidBigM(0.0)
        );
        assert_eq!(
            build(&mixed(), 1000.0, Precision::new(16)).unwrap_err(),
            ProgramError::InvalidPrecision { found: 16, max: 15 }
        );
        assert!(build(&mixed(), 1000.0, Precision::new(MAX_PRECISION)).is_ok());
    }

    #[test]
    fn test_standard_form_display() {
        let text = StandardForm::new(&mixed()).unwrap().to_string();
        assert_eq!(
            text,
            "Maximize Z = 2x1 + 3x2\n\
             Subject to:\n\
             \x20 x1 + x2 + s1 = 4\n\
             \x20 x1 + 3x2 - s2 + a1 = 6\n\
             \x20 x1 + a2 = 2\n\
             \x20 x1, x2, s1, s2, a1, a2 >= 0"
        );
    }
}
