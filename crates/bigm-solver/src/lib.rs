mod error;
mod format;
mod problem;
mod simplex;
mod solution;
mod standard_form;
mod steps;
mod tableau;

pub use error::ProgramError;
pub use format::{BigMFormat, DEFAULT_BIG_M, to_fraction};
pub use problem::{Constraint, ConstraintOp, LinearProgram};
pub use simplex::Solver;
pub use solution::{RenderedTableau, RowOperation, Solution, SolutionStatus, TableauSnapshot};
pub use standard_form::{RHS_LABEL, StandardForm};
pub use steps::StepRecorder;
pub use tableau::{ColumnKind, Evaluation, MAX_PRECISION, Pivot, Precision, Step, Tableau};
