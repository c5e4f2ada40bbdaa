//! Plain-text rendering of a solve trace

use std::fmt::{self, Write};

use bigm_solver::{Solution, SolutionStatus, TableauSnapshot, to_fraction};

/// Column-aligned rows joined with ` | `
struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new() -> Self {
        Self { rows: Vec::new() }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self, out: &mut impl Write) -> fmt::Result {
        let n_cols = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..n_cols)
            .map(|j| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(j))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:>width$}", cell, width = width))
                .collect();
            writeln!(out, "{}", cells.join(" | ").trim_end())?;
        }
        Ok(())
    }
}

fn tableau_table(snapshot: &TableauSnapshot) -> Table {
    let r = &snapshot.rendered;
    let n = snapshot.headers.len();
    let blank = String::new;

    let mut table = Table::new();

    // Cj is not defined for the RHS column
    let mut cj_row = vec![blank(), "Cj".to_string()];
    cj_row.extend(r.cj.iter().take(n - 1).cloned());
    table.push(cj_row);

    let mut header = vec!["Cb".to_string(), "Basis".to_string()];
    header.extend(snapshot.headers.iter().cloned());
    header.push("Qi".to_string());
    table.push(header);

    for (i, row) in r.rows.iter().enumerate() {
        let mut line = vec![r.cb[i].clone(), snapshot.basis[i].clone()];
        line.extend(row.iter().cloned());
        line.push(r.qi[i].clone().unwrap_or_else(|| "-".to_string()));
        table.push(line);
    }

    let mut zj = vec![blank(), "Zj".to_string()];
    zj.extend(r.zj.iter().cloned());
    table.push(zj);

    let mut zj_minus_cj = vec![blank(), "Zj-Cj".to_string()];
    zj_minus_cj.extend(r.zj_minus_cj.iter().take(n - 1).cloned());
    table.push(zj_minus_cj);

    table
}

fn render_steps(snapshot: &TableauSnapshot, out: &mut impl Write) -> fmt::Result {
    let labels = &snapshot.headers;
    writeln!(out, "Zj:")?;
    for (label, step) in labels.iter().zip(&snapshot.zj_steps) {
        writeln!(out, "  {}: {}", label, step)?;
    }
    writeln!(out, "Zj - Cj:")?;
    for (label, step) in labels.iter().zip(&snapshot.zj_minus_cj_steps).take(labels.len() - 1) {
        writeln!(out, "  {}: {}", label, step)?;
    }
    if snapshot.qi_steps.iter().any(Option::is_some) {
        writeln!(out, "Qi:")?;
        for (i, step) in snapshot.qi_steps.iter().enumerate() {
            if let Some(step) = step {
                writeln!(out, "  R{}: {}", i + 1, step)?;
            }
        }
    }
    Ok(())
}

fn status_text(solution: &Solution) -> String {
    let last = solution.final_snapshot();
    match solution.status {
        SolutionStatus::Optimal => "Status: OPTIMAL".to_string(),
        SolutionStatus::Infeasible => {
            "Status: INFEASIBLE\nAn artificial variable remains in the basis; no solution satisfies all constraints."
                .to_string()
        }
        SolutionStatus::Stalled => {
            let column = last
                .entering
                .map(|j| last.headers[j].clone())
                .unwrap_or_default();
            format!(
                "Status: STALLED\n{} can enter but no row limits it; the objective is unbounded.",
                column
            )
        }
        SolutionStatus::IterationLimit => format!(
            "Status: ITERATION LIMIT\nStopped after {} pivots without reaching optimality.",
            solution.iterations()
        ),
    }
}

/// Every tableau of a solve, then the final values and status
pub struct Trace<'a> {
    solution: &'a Solution,
    steps: bool,
}

impl<'a> Trace<'a> {
    pub fn new(solution: &'a Solution, steps: bool) -> Self {
        Self { solution, steps }
    }
}

impl fmt::Display for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, snapshot) in self.solution.snapshots.iter().enumerate() {
            let title = if k == 0 {
                "Initial tableau".to_string()
            } else {
                format!("Iteration {}", k)
            };
            writeln!(f, "{}", title)?;
            writeln!(f, "{}", "-".repeat(title.len()))?;

            if self.steps && !snapshot.operations.is_empty() {
                for op in &snapshot.operations {
                    writeln!(f, "{}", op.description)?;
                    for step in &op.detailed_steps {
                        writeln!(f, "    {}", step)?;
                    }
                }
                writeln!(f)?;
            }

            tableau_table(snapshot).render(f)?;

            if self.steps {
                writeln!(f)?;
                render_steps(snapshot, f)?;
            }

            if let Some(pivot) = snapshot.pivot {
                writeln!(
                    f,
                    "Pivot: {} enters, {} leaves, pivot element {}",
                    snapshot.headers[pivot.column],
                    snapshot.basis[pivot.row],
                    to_fraction(pivot.element)
                )?;
            }
            writeln!(f)?;
        }

        let mut table = Table::new();
        table.push(vec!["Variable".to_string(), "Value".to_string()]);
        for (name, value) in self.solution.values() {
            table.push(vec![name.clone(), value.clone()]);
        }
        writeln!(f, "Solution")?;
        writeln!(f, "--------")?;
        table.render(f)?;
        writeln!(f)?;

        writeln!(f, "{}", status_text(self.solution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigm_solver::{ConstraintOp, LinearProgram, Solver};
    use pretty_assertions::assert_eq;

    fn single() -> Solution {
        let lp = LinearProgram::new("Z", vec![2.0]).with_constraint(vec![1.0], ConstraintOp::Le, 3.0);
        Solver::new().solve(&lp).unwrap()
    }

    #[test]
    fn test_table_alignment() {
        let mut table = Table::new();
        table.push(vec!["a".to_string(), "bbb".to_string()]);
        table.push(vec!["cc".to_string(), "d".to_string()]);
        let mut out = String::new();
        table.render(&mut out).unwrap();
        assert_eq!(out, " a | bbb\ncc |   d\n");
    }

    #[test]
    fn test_render_single_pivot() {
        let text = Trace::new(&single(), false).to_string();
        assert_eq!(
            text,
            "Initial tableau
---------------
   |    Cj |  2 |  0
Cb | Basis | x1 | s1 | RHS | Qi
 0 |    s1 |  1 |  1 |   3 |  3
   |    Zj |  0 |  0 |   0
   | Zj-Cj | -2 |  0
Pivot: x1 enters, s1 leaves, pivot element 1

Iteration 1
-----------
   |    Cj |  2 |  0
Cb | Basis | x1 | s1 | RHS | Qi
 2 |    x1 |  1 |  1 |   3 |  -
   |    Zj |  2 |  2 |   6
   | Zj-Cj |  0 |  2

Solution
--------
Variable | Value
      x1 |     3
      s1 |     0
       Z |     6

Status: OPTIMAL
"
        );
    }

    #[test]
    fn test_render_with_steps() {
        let text = Trace::new(&single(), true).to_string();
        assert!(text.contains("Zj:\n"));
        assert!(text.contains("Zj - Cj:\n"));
        assert_eq!(text.matches("Qi:\n").count(), 1);
        assert!(text.ends_with("Status: OPTIMAL\n"));
    }
}
