use indexmap::IndexMap;

use crate::tableau::Pivot;

/// How the solve ended
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// Optimal tableau still has an artificial variable in the basis
    Infeasible,
    /// A column wanted to enter but the ratio test found no row (unbounded)
    Stalled,
    /// Gave up after the configured number of pivots
    IterationLimit,
}

impl SolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::Infeasible => "infeasible",
            SolutionStatus::Stalled => "stalled",
            SolutionStatus::IterationLimit => "iteration limit",
        }
    }
}

/// One elimination step with its per-column arithmetic
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RowOperation {
    /// e.g. `R2(new) = R2(old) × 1/2`
    pub description: String,
    pub detailed_steps: Vec<String>,
}

/// Tableau values rendered through the Big-M formatter
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTableau {
    pub rows: Vec<Vec<String>>,
    pub cb: Vec<String>,
    pub cj: Vec<String>,
    pub zj: Vec<String>,
    pub zj_minus_cj: Vec<String>,
    pub qi: Vec<Option<String>>,
    pub total_z: String,
}

/// Frozen copy of one tableau and everything derived from it
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TableauSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub basis: Vec<String>,
    pub cb: Vec<f64>,
    pub cj: Vec<f64>,
    pub zj: Vec<f64>,
    pub zj_minus_cj: Vec<f64>,
    /// Ratio column, `None` where undefined and everywhere on the final tableau
    pub qi: Vec<Option<f64>>,
    /// Column chosen to enter on this tableau
    pub entering: Option<usize>,
    /// Pivot chosen on this tableau, applied to produce the next one
    pub pivot: Option<Pivot>,
    /// Row operations that produced this tableau from the previous one
    pub operations: Vec<RowOperation>,
    pub zj_steps: Vec<String>,
    pub zj_minus_cj_steps: Vec<String>,
    /// Ratio breakdown per row, `None` where the row is not eligible
    pub qi_steps: Vec<Option<String>>,
    /// Variable and objective values as rational strings
    pub solution: IndexMap<String, String>,
    pub total_z: f64,
    pub rendered: RenderedTableau,
    /// Only ever true on the last snapshot
    pub infeasible: bool,
}

impl TableauSnapshot {
    pub fn basis_is_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.basis.iter().all(|b| seen.insert(b))
    }
}

/// The result of solving a program: every tableau from the initial one to the
/// terminal one, and how the solve ended
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: SolutionStatus,
    pub snapshots: Vec<TableauSnapshot>,
}

impl Solution {
    pub fn final_snapshot(&self) -> &TableauSnapshot {
        self.snapshots
            .last()
            .expect("a solution always holds the initial tableau")
    }

    /// Final variable and objective values
    pub fn values(&self) -> &IndexMap<String, String> {
        &self.final_snapshot().solution
    }

    pub fn iterations(&self) -> usize {
        self.snapshots.len() - 1
    }
}
