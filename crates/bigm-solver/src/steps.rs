//! Human-readable arithmetic behind each tableau.
//!
//! Nothing here recomputes a result: every right-hand side printed is a value
//! the tableau engine already stored, so the narration can never drift from
//! the numbers.

use crate::format::BigMFormat;
use crate::solution::RowOperation;
use crate::tableau::{Pivot, Tableau};

#[derive(Debug, Clone, Copy, Default)]
pub struct StepRecorder {
    format: BigMFormat,
}

impl StepRecorder {
    pub fn new(format: BigMFormat) -> Self {
        Self { format }
    }

    fn fmt(&self, value: f64) -> String {
        self.format.format(value)
    }

    /// `cb(a) + cb(b) = Zj` per column, listing only nonzero products
    pub fn zj_steps(&self, tableau: &Tableau, zj: &[f64]) -> Vec<String> {
        (0..tableau.n_cols())
            .map(|j| {
                let terms: Vec<String> = (0..tableau.n_rows())
                    .filter(|&i| tableau.cb()[i] != 0.0 && tableau.value(i, j) != 0.0)
                    .map(|i| format!("{}({})", self.fmt(tableau.cb()[i]), self.fmt(tableau.value(i, j))))
                    .collect();
                if terms.is_empty() {
                    "0".to_string()
                } else {
                    format!("{} = {}", terms.join(" + "), self.fmt(zj[j]))
                }
            })
            .collect()
    }

    /// `Zj - Cj = result` per column
    pub fn zj_minus_cj_steps(&self, zj: &[f64], cj: &[f64], zj_minus_cj: &[f64]) -> Vec<String> {
        zj.iter()
            .zip(cj)
            .zip(zj_minus_cj)
            .map(|((z, c), d)| format!("{} - {} = {}", self.fmt(*z), self.fmt(*c), self.fmt(*d)))
            .collect()
    }

    /// `RHS / entry = ratio` for every row the ratio test accepted
    pub fn qi_steps(
        &self,
        tableau: &Tableau,
        entering: Option<usize>,
        ratios: &[Option<f64>],
    ) -> Vec<Option<String>> {
        let Some(col) = entering else {
            return vec![None; tableau.n_rows()];
        };
        ratios
            .iter()
            .enumerate()
            .map(|(i, ratio)| {
                ratio.map(|q| {
                    format!(
                        "{} / {} = {}",
                        self.fmt(tableau.rhs(i)),
                        self.fmt(tableau.value(i, col)),
                        self.fmt(q)
                    )
                })
            })
            .collect()
    }

    /// Describe the pivot that turned `before` into `after`
    pub fn pivot_operations(&self, before: &Tableau, after: &Tableau, pivot: Pivot) -> Vec<RowOperation> {
        let r = pivot.row;
        let element = self.fmt(pivot.element);
        let mut operations = Vec::with_capacity(before.n_rows());

        operations.push(RowOperation {
            description: format!("R{0}(new) = R{0}(old) × 1/{1}", r + 1, element),
            detailed_steps: before
                .row(r)
                .iter()
                .zip(after.row(r))
                .map(|(old, new)| format!("{} × 1/{} = {}", self.fmt(*old), element, self.fmt(*new)))
                .collect(),
        });

        let pivot_row = after.row(r);
        for i in (0..before.n_rows()).filter(|&i| i != r) {
            let multiplier = self.fmt(before.value(i, pivot.column));
            operations.push(RowOperation {
                description: format!("R{}(new) = R{}(old) - ({}) × R{}", i + 1, i + 1, multiplier, r + 1),
                detailed_steps: before
                    .row(i)
                    .iter()
                    .zip(pivot_row)
                    .zip(after.row(i))
                    .map(|((old, p), new)| {
                        format!(
                            "{} - ({} × {}) = {}",
                            self.fmt(*old),
                            multiplier,
                            self.fmt(*p),
                            self.fmt(*new)
                        )
                    })
                    .collect(),
            });
        }

        operations
    }
}
