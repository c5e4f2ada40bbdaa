use std::fmt;
use std::str::FromStr;

use crate::error::ProgramError;

/// Represents a maximization problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    /// Display label of the objective (e.g. `Z`)
    pub objective_name: String,
    /// Objective coefficients, one per decision variable
    pub objective: Vec<f64>,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Coefficients for each decision variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Eq,
}

impl ConstraintOp {
    /// The relation obtained after multiplying both sides by -1
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        })
    }
}

impl FromStr for ConstraintOp {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" | "≤" | "=<" => Ok(ConstraintOp::Le),
            ">=" | "≥" | "=>" => Ok(ConstraintOp::Ge),
            "=" | "==" => Ok(ConstraintOp::Eq),
            other => Err(ProgramError::UnknownRelation(other.to_string())),
        }
    }
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) -> Self {
        Self {
            coefficients,
            op,
            rhs,
        }
    }

    /// Copy of the constraint with a non-negative right-hand side.
    ///
    /// A negative RHS is fixed by multiplying the whole row by -1, which also
    /// swaps `<=` and `>=`.
    pub fn normalized(&self) -> Constraint {
        if self.rhs < 0.0 {
            Constraint {
                coefficients: self.coefficients.iter().map(|c| -c).collect(),
                op: self.op.flipped(),
                rhs: -self.rhs,
            }
        } else {
            self.clone()
        }
    }
}

impl LinearProgram {
    pub fn new(objective_name: impl Into<String>, objective: Vec<f64>) -> Self {
        Self {
            objective_name: objective_name.into(),
            objective,
            constraints: Vec::new(),
        }
    }

    pub fn add_constraint(&mut self, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint::new(coefficients, op, rhs));
    }

    pub fn with_constraint(mut self, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) -> Self {
        self.add_constraint(coefficients, op, rhs);
        self
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check the shape of the program before any tableau is built
    pub fn validate(&self) -> Result<(), ProgramError> {
        let n_vars = self.num_variables();
        if n_vars == 0 {
            return Err(ProgramError::NoVariables);
        }
        if self.constraints.is_empty() {
            return Err(ProgramError::NoConstraints);
        }
        if let Some(j) = self.objective.iter().position(|c| !c.is_finite()) {
            return Err(ProgramError::NonFinite {
                location: format!("objective coefficient {}", j + 1),
            });
        }
        for (i, c) in self.constraints.iter().enumerate() {
            if c.coefficients.len() != n_vars {
                return Err(ProgramError::CoefficientCount {
                    constraint: i + 1,
                    expected: n_vars,
                    found: c.coefficients.len(),
                });
            }
            if let Some(j) = c.coefficients.iter().position(|v| !v.is_finite()) {
                return Err(ProgramError::NonFinite {
                    location: format!("constraint {} coefficient {}", i + 1, j + 1),
                });
            }
            if !c.rhs.is_finite() {
                return Err(ProgramError::NonFinite {
                    location: format!("constraint {} right-hand side", i + 1),
                });
            }
        }
        Ok(())
    }

    /// Largest absolute coefficient or right-hand side in the program
    pub fn largest_magnitude(&self) -> f64 {
        self.objective
            .iter()
            .chain(self.constraints.iter().flat_map(|c| c.coefficients.iter().chain([&c.rhs])))
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}
