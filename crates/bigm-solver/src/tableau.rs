/// What a tableau column stands for
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Decision,
    /// Slack for `<=`, surplus for `>=`
    Slack,
    Artificial,
    Rhs,
}

/// Most decimals an `f64` can carry through the rounding scale
pub const MAX_PRECISION: u32 = 15;

/// Fixed decimal rounding applied after every arithmetic step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precision {
    decimals: u32,
    scale: f64,
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(6)
    }
}

impl Precision {
    pub fn new(decimals: u32) -> Self {
        Self {
            decimals,
            scale: 10f64.powi(decimals.min(MAX_PRECISION) as i32),
        }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn round(&self, value: f64) -> f64 {
        let rounded = (value * self.scale).round() / self.scale;
        // Avoid "-0" leaking into comparisons and display
        if rounded == 0.0 { 0.0 } else { rounded }
    }
}

/// A pivot position chosen by the ratio test
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub column: usize,
    pub row: usize,
    pub element: f64,
}

/// Outcome of inspecting a tableau
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// No negative `Zj - Cj` remains
    Optimal,
    /// A column wants to enter but no row has a positive entry in it
    Stalled { entering: usize },
    Pivot(Pivot),
}

/// Derived rows of one tableau
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub zj: Vec<f64>,
    pub zj_minus_cj: Vec<f64>,
    pub entering: Option<usize>,
    /// Ratio column, `None` where the pivot column entry is not positive
    pub ratios: Vec<Option<f64>>,
    pub leaving: Option<usize>,
}

impl Evaluation {
    pub fn step(&self, tableau: &Tableau) -> Step {
        match (self.entering, self.leaving) {
            (None, _) => Step::Optimal,
            (Some(entering), None) => Step::Stalled { entering },
            (Some(column), Some(row)) => Step::Pivot(Pivot {
                column,
                row,
                element: tableau.value(row, column),
            }),
        }
    }
}

/// Working state of the Big-M method.
///
/// Rows are stored row-major in a single buffer; the last column is the RHS.
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
    /// Column index of the basic variable of each row
    basis: Vec<usize>,
    cb: Vec<f64>,
    cj: Vec<f64>,
    headers: Vec<String>,
    kinds: Vec<ColumnKind>,
    precision: Precision,
}

impl Tableau {
    pub(crate) fn from_parts(
        rows: Vec<Vec<f64>>,
        basis: Vec<usize>,
        cj: Vec<f64>,
        headers: Vec<String>,
        kinds: Vec<ColumnKind>,
        precision: Precision,
    ) -> Self {
        let n_rows = rows.len();
        let n_cols = cj.len();
        debug_assert!(rows.iter().all(|r| r.len() == n_cols));
        debug_assert_eq!(basis.len(), n_rows);
        debug_assert_eq!(headers.len(), n_cols);
        debug_assert_eq!(kinds.len(), n_cols);

        let cb = basis.iter().map(|&j| cj[j]).collect();
        Self {
            data: rows.into_iter().flatten().collect(),
            n_rows,
            n_cols,
            basis,
            cb,
            cj,
            headers,
            kinds,
            precision,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Column count including RHS
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn rhs_col(&self) -> usize {
        self.n_cols - 1
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.n_cols..(row + 1) * self.n_cols]
    }

    /// Deep copy of the coefficient matrix
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.n_cols).map(|r| r.to_vec()).collect()
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.value(row, self.rhs_col())
    }

    pub fn basis(&self) -> &[usize] {
        &self.basis
    }

    pub fn basis_labels(&self) -> Vec<String> {
        self.basis.iter().map(|&j| self.headers[j].clone()).collect()
    }

    pub fn cb(&self) -> &[f64] {
        &self.cb
    }

    pub fn cj(&self) -> &[f64] {
        &self.cj
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    /// Row in which the column is basic
    pub fn basic_row(&self, col: usize) -> Option<usize> {
        self.basis.iter().position(|&b| b == col)
    }

    pub fn has_basic_artificial(&self) -> bool {
        self.basis
            .iter()
            .any(|&j| self.kinds[j] == ColumnKind::Artificial)
    }

    /// Rounded product `cb[i] * rows[i][col]`, the term feeding `Zj`
    pub fn zj_term(&self, row: usize, col: usize) -> f64 {
        self.precision.round(self.cb[row] * self.value(row, col))
    }

    /// `Zj` for every column, RHS included (where it is the objective value)
    pub fn zj(&self) -> Vec<f64> {
        (0..self.n_cols)
            .map(|j| {
                (0..self.n_rows).fold(0.0, |total, i| {
                    self.precision.round(total + self.zj_term(i, j))
                })
            })
            .collect()
    }

    pub fn zj_minus_cj(&self, zj: &[f64]) -> Vec<f64> {
        zj.iter()
            .zip(&self.cj)
            .map(|(z, c)| self.precision.round(z - c))
            .collect()
    }

    /// Current objective value `sum(cb[i] * rhs[i])`
    pub fn objective_value(&self) -> f64 {
        let rhs = self.rhs_col();
        (0..self.n_rows).fold(0.0, |total, i| self.precision.round(total + self.zj_term(i, rhs)))
    }

    /// Column with the most negative `Zj - Cj`, lowest index on ties
    pub fn entering_column(&self, zj_minus_cj: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (j, &value) in zj_minus_cj.iter().enumerate().take(self.rhs_col()) {
            if value < 0.0 && best.is_none_or(|(_, min)| value < min) {
                best = Some((j, value));
            }
        }
        best.map(|(j, _)| j)
    }

    /// Ratio test column for the given entering column
    pub fn ratios(&self, col: usize) -> Vec<Option<f64>> {
        (0..self.n_rows)
            .map(|i| {
                let entry = self.value(i, col);
                (entry > 0.0).then(|| self.precision.round(self.rhs(i) / entry))
            })
            .collect()
    }

    /// Row with the smallest ratio, lowest index on ties
    pub fn leaving_row(ratios: &[Option<f64>]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, ratio) in ratios.iter().enumerate() {
            if let Some(ratio) = *ratio {
                if best.is_none_or(|(_, min)| ratio < min) {
                    best = Some((i, ratio));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn evaluate(&self) -> Evaluation {
        let zj = self.zj();
        let zj_minus_cj = self.zj_minus_cj(&zj);
        let entering = self.entering_column(&zj_minus_cj);
        let ratios = match entering {
            Some(col) => self.ratios(col),
            None => vec![None; self.n_rows],
        };
        let leaving = entering.and_then(|_| Self::leaving_row(&ratios));
        log::debug!(
            "Zj-Cj = {:?}, entering = {:?}, ratios = {:?}, leaving = {:?}",
            zj_minus_cj,
            entering,
            ratios,
            leaving
        );
        Evaluation {
            zj,
            zj_minus_cj,
            entering,
            ratios,
            leaving,
        }
    }

    /// Gauss-Jordan elimination around `(row, col)`
    pub fn pivot(&mut self, row: usize, col: usize) {
        let n_cols = self.n_cols;
        let element = self.value(row, col);
        debug_assert!(element != 0.0, "pivot on a zero element");

        for j in 0..n_cols {
            let idx = row * n_cols + j;
            self.data[idx] = self.precision.round(self.data[idx] / element);
        }

        let pivot_row = self.row(row).to_vec();
        for i in (0..self.n_rows).filter(|&i| i != row) {
            let factor = self.value(i, col);
            for (j, p) in pivot_row.iter().enumerate() {
                let idx = i * n_cols + j;
                self.data[idx] = self.precision.round(self.data[idx] - factor * p);
            }
        }

        self.basis[row] = col;
        self.cb[row] = self.cj[col];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, LinearProgram};
    use crate::standard_form;

    fn textbook() -> Tableau {
        let lp = LinearProgram::new("Z", vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .with_constraint(vec![0.0, 2.0], ConstraintOp::Le, 12.0)
            .with_constraint(vec![3.0, 2.0], ConstraintOp::Le, 18.0);
        standard_form::build(&lp, 1000.0, Precision::default()).unwrap()
    }

    #[test]
    fn test_rounding() {
        let p = Precision::default();
        assert_eq!(p.round(0.1 + 0.2), 0.3);
        assert_eq!(p.round(-0.0000001), 0.0);
        assert!(p.round(-0.0000001).is_sign_positive());
        assert_eq!(Precision::new(2).round(1.23456), 1.23);
    }

    #[test]
    fn test_initial_derived_rows() {
        let t = textbook();
        let eval = t.evaluate();
        assert_eq!(eval.zj, vec![0.0; 6]);
        assert_eq!(eval.zj_minus_cj, vec![-3.0, -5.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(eval.entering, Some(1));
        assert_eq!(eval.ratios, vec![None, Some(6.0), Some(9.0)]);
        assert_eq!(eval.leaving, Some(1));
        assert_eq!(
            eval.step(&t),
            Step::Pivot(Pivot {
                column: 1,
                row: 1,
                element: 2.0
            })
        );
    }

    #[test]
    fn test_pivot_eliminates_column() {
        let mut t = textbook();
        t.pivot(1, 1);
        assert_eq!(t.row(0), &[1.0, 0.0, 1.0, 0.0, 0.0, 4.0]);
        assert_eq!(t.row(1), &[0.0, 1.0, 0.0, 0.5, 0.0, 6.0]);
        assert_eq!(t.row(2), &[3.0, 0.0, 0.0, -1.0, 1.0, 6.0]);
        assert_eq!(t.basis_labels(), vec!["s1", "x2", "s3"]);
        assert_eq!(t.cb(), &[0.0, 5.0, 0.0]);
        assert_eq!(t.objective_value(), 30.0);
    }

    #[test]
    fn test_entering_ignores_rhs_and_breaks_ties_low() {
        let t = textbook();
        assert_eq!(t.entering_column(&[-2.0, -5.0, -5.0, 0.0, 0.0, -100.0]), Some(1));
        assert_eq!(t.entering_column(&[0.0, 0.0, 0.0, 0.0, 0.0, -100.0]), None);
    }

    #[test]
    fn test_leaving_row_ties_pick_lowest_index() {
        assert_eq!(
            Tableau::leaving_row(&[None, Some(3.0), Some(2.0), Some(2.0)]),
            Some(2)
        );
        assert_eq!(Tableau::leaving_row(&[Some(0.0), Some(0.0)]), Some(0));
        assert_eq!(Tableau::leaving_row(&[None, None]), None);
    }

    #[test]
    fn test_rows_is_a_deep_copy() {
        let mut t = textbook();
        let before = t.rows();
        t.pivot(1, 1);
        assert_eq!(before[1], vec![0.0, 2.0, 0.0, 1.0, 0.0, 12.0]);
        assert_ne!(before, t.rows());
    }

    #[test]
    fn test_stalled_when_no_positive_entry() {
        // max x1 subject to -x1 <= 1: x1 can grow forever
        let lp = LinearProgram::new("Z", vec![1.0]).with_constraint(
            vec![-1.0],
            ConstraintOp::Le,
            1.0,
        );
        let t = standard_form::build(&lp, 1000.0, Precision::default()).unwrap();
        let eval = t.evaluate();
        assert_eq!(eval.step(&t), Step::Stalled { entering: 0 });
        assert_eq!(eval.ratios, vec![None]);
    }
}
