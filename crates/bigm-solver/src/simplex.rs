use indexmap::IndexMap;

use crate::error::ProgramError;
use crate::format::{BigMFormat, DEFAULT_BIG_M, to_fraction};
use crate::problem::LinearProgram;
use crate::solution::{RenderedTableau, RowOperation, Solution, SolutionStatus, TableauSnapshot};
use crate::standard_form;
use crate::steps::StepRecorder;
use crate::tableau::{Evaluation, Pivot, Precision, Step, Tableau};

/// Big-M simplex solver for maximization problems.
///
/// `big_m` must dominate every coefficient of the program by a wide margin:
/// the penalty only drives artificial variables out of the basis when
/// `-M` outweighs anything the real columns can contribute.
pub struct Solver {
    /// Penalty for artificial variables
    big_m: f64,
    /// Maximum pivots before giving up; `None` derives a bound from the tableau size
    max_iterations: Option<usize>,
    /// Decimal places kept after every arithmetic step
    precision: u32,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            big_m: DEFAULT_BIG_M,
            max_iterations: None,
            precision: 6,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_precision(mut self, decimals: u32) -> Self {
        self.precision = decimals;
        self
    }

    /// Solve the program, recording every tableau along the way
    pub fn solve(&self, program: &LinearProgram) -> Result<Solution, ProgramError> {
        let mut tableau = standard_form::build(program, self.big_m, Precision::new(self.precision))?;
        let trace = Trace::new(program, BigMFormat::new(self.big_m));
        let max_iterations = self
            .max_iterations
            .unwrap_or_else(|| iteration_bound(tableau.n_cols() - 1, tableau.n_rows()));

        let mut snapshots = Vec::new();
        let mut operations = Vec::new();
        let mut iteration = 0;

        let status = loop {
            log::info!("Tableau {}", iteration + 1);
            let evaluation = tableau.evaluate();

            match evaluation.step(&tableau) {
                Step::Optimal => {
                    let status = if tableau.has_basic_artificial() {
                        log::info!("Artificial variable left in the basis: no feasible solution");
                        SolutionStatus::Infeasible
                    } else {
                        log::info!("Optimal solution was found");
                        SolutionStatus::Optimal
                    };
                    snapshots.push(trace.terminal(&tableau, evaluation, operations));
                    break status;
                }
                Step::Stalled { entering } => {
                    log::info!(
                        "Column {} has no positive entry, the ratio test is empty",
                        tableau.headers()[entering]
                    );
                    snapshots.push(trace.terminal(&tableau, evaluation, operations));
                    break SolutionStatus::Stalled;
                }
                Step::Pivot(_) if iteration >= max_iterations => {
                    log::warn!("Giving up after {} pivots", iteration);
                    snapshots.push(trace.terminal(&tableau, evaluation, operations));
                    break SolutionStatus::IterationLimit;
                }
                Step::Pivot(pivot) => {
                    log::info!(
                        "Pivot: {} enters, {} leaves, element {}",
                        tableau.headers()[pivot.column],
                        tableau.headers()[tableau.basis()[pivot.row]],
                        pivot.element
                    );
                    snapshots.push(trace.pivoting(&tableau, evaluation, pivot, operations));

                    let before = tableau.clone();
                    tableau.pivot(pivot.row, pivot.column);
                    operations = trace.recorder.pivot_operations(&before, &tableau, pivot);
                    iteration += 1;
                }
            }
        };

        Ok(Solution { status, snapshots })
    }
}

/// Per-solve state shared by every snapshot
struct Trace<'a> {
    program: &'a LinearProgram,
    format: BigMFormat,
    recorder: StepRecorder,
}

impl<'a> Trace<'a> {
    fn new(program: &'a LinearProgram, format: BigMFormat) -> Self {
        Self {
            program,
            format,
            recorder: StepRecorder::new(format),
        }
    }

    /// Snapshot of a tableau the loop is about to pivot on
    fn pivoting(
        &self,
        tableau: &Tableau,
        evaluation: Evaluation,
        pivot: Pivot,
        operations: Vec<RowOperation>,
    ) -> TableauSnapshot {
        let qi_steps = self
            .recorder
            .qi_steps(tableau, evaluation.entering, &evaluation.ratios);
        self.snapshot(tableau, evaluation, Some(pivot), operations, qi_steps, false)
    }

    /// Snapshot of the tableau the loop stopped at
    fn terminal(
        &self,
        tableau: &Tableau,
        mut evaluation: Evaluation,
        operations: Vec<RowOperation>,
    ) -> TableauSnapshot {
        // Ratios are meaningless once the iteration has stopped
        evaluation.ratios = vec![None; tableau.n_rows()];
        let qi_steps = vec![None; tableau.n_rows()];
        self.snapshot(tableau, evaluation, None, operations, qi_steps, true)
    }

    fn snapshot(
        &self,
        tableau: &Tableau,
        evaluation: Evaluation,
        pivot: Option<Pivot>,
        operations: Vec<RowOperation>,
        qi_steps: Vec<Option<String>>,
        terminal: bool,
    ) -> TableauSnapshot {
        let format = &self.format;
        let Evaluation {
            zj,
            zj_minus_cj,
            entering,
            ratios,
            ..
        } = evaluation;

        let zj_steps = self.recorder.zj_steps(tableau, &zj);
        let zj_minus_cj_steps = self.recorder.zj_minus_cj_steps(&zj, tableau.cj(), &zj_minus_cj);

        let total_z = tableau.objective_value();
        let rows = tableau.rows();
        let rendered = RenderedTableau {
            rows: rows.iter().map(|r| format.format_all(r)).collect(),
            cb: format.format_all(tableau.cb()),
            cj: format.format_all(tableau.cj()),
            zj: format.format_all(&zj),
            zj_minus_cj: format.format_all(&zj_minus_cj),
            qi: ratios.iter().map(|q| format.format_opt(*q)).collect(),
            total_z: format.format(total_z),
        };

        TableauSnapshot {
            headers: tableau.headers().to_vec(),
            rows,
            basis: tableau.basis_labels(),
            cb: tableau.cb().to_vec(),
            cj: tableau.cj().to_vec(),
            zj,
            zj_minus_cj,
            qi: ratios,
            entering,
            pivot,
            operations,
            zj_steps,
            zj_minus_cj_steps,
            qi_steps,
            solution: extract_solution(self.program, tableau, total_z),
            total_z,
            rendered,
            infeasible: terminal && tableau.has_basic_artificial(),
        }
    }
}

/// Basic variables take their row's RHS, non-basic ones are zero
fn extract_solution(program: &LinearProgram, tableau: &Tableau, total_z: f64) -> IndexMap<String, String> {
    let mut solution: IndexMap<String, String> = tableau
        .headers()
        .iter()
        .take(tableau.rhs_col())
        .enumerate()
        .map(|(j, label)| {
            let value = match tableau.basic_row(j) {
                Some(i) => to_fraction(tableau.rhs(i)),
                None => "0".to_string(),
            };
            (label.clone(), value)
        })
        .collect();
    solution.insert(program.objective_name.clone(), to_fraction(total_z));
    solution
}

/// `n choose k`, saturating: the number of possible bases bounds the number
/// of distinct tableaux a non-cycling run can visit.
fn iteration_bound(n: usize, k: usize) -> usize {
    let k = k.min(n.saturating_sub(k));
    let mut result: usize = 1;
    for i in 0..k {
        result = match result.checked_mul(n - i) {
            Some(v) => v / (i + 1),
            None => return usize::MAX,
        };
    }
    result
}
