use thiserror::Error;

/// A program the solver refuses to build a tableau for
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgramError {
    #[error("The objective has no decision variables")]
    NoVariables,
    #[error("The program has no constraints")]
    NoConstraints,
    #[error("Constraint {constraint} has {found} coefficients, expected {expected}")]
    CoefficientCount {
        constraint: usize,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in {location}")]
    NonFinite { location: String },
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),
    #[error("Big-M must be a positive finite number, got {0}")]
    InvalidBigM(f64),
    #[error("Precision must be at most {max} decimals, got {found}")]
    InvalidPrecision { found: u32, max: u32 },
}
