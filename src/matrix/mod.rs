// src/matrix/mod.rs

//! Cartesian-product engine over ordered string columns
//!
//! Rows are produced in odometer order: the last column is swept through
//! all of its points for every step of the columns before it, and the
//! second-to-last column is the fastest-moving counter digit, carrying
//! leftwards when it wraps. For columns `[a,b] [1,2] [x,y]` the rows are
//! `a1x a1y a2x a2y b1x b1y b2x b2y`.
//!
//! Iteration is lazy. The traversal state is an immutable [`Cursor`]
//! snapshot; each outer step computes the next snapshot with [`advance`].

use crate::error::{Error, Result};

/// Ordered, non-empty sequence of candidate strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    points: Vec<String>,
}

impl Column {
    /// Build a column; an empty point sequence is rejected
    pub fn new<I, S>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let points: Vec<String> = points.into_iter().map(Into::into).collect();
        if points.is_empty() {
            return Err(Error::TemplateError(
                "column has no points to combine".to_string(),
            ));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[String] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed column
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One emitted combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Concatenation of the selected point of every column
    pub value: String,
    /// Index of the selected point in each column
    pub coordinates: Vec<usize>,
}

/// Traversal position of every column except the last
pub type Cursor = Vec<usize>;

/// Compute the cursor for the next outer step
///
/// The last entry of `cursor` (the second-to-last column) increments first;
/// a wrap resets it to zero and carries into the entry on its left. Returns
/// `None` once the first column overflows, i.e. the traversal is complete,
/// or when `cursor` and `radices` disagree in length.
pub fn advance(cursor: &[usize], radices: &[usize]) -> Option<Cursor> {
    if cursor.len() != radices.len() {
        return None;
    }
    let mut next = cursor.to_vec();
    for digit in (0..next.len()).rev() {
        next[digit] += 1;
        if next[digit] < radices[digit] {
            return Some(next);
        }
        next[digit] = 0;
    }
    None
}

/// A validated set of columns
#[derive(Debug, Clone)]
pub struct Matrix {
    columns: Vec<Column>,
}

impl Matrix {
    /// At least one column is required
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::TemplateError(
                "matrix needs at least one column".to_string(),
            ));
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of rows the traversal will produce
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Column::len).product()
    }

    /// Lazily iterate every combination in odometer order
    pub fn rows(&self) -> Rows<'_> {
        let (prefix, last) = self.columns.split_at(self.columns.len() - 1);
        Rows {
            prefix,
            last: &last[0],
            radices: prefix.iter().map(Column::len).collect(),
            cursor: Some(vec![0; prefix.len()]),
            head: String::new(),
            sweep: 0,
        }
    }
}

/// Iterator returned by [`Matrix::rows`]
pub struct Rows<'a> {
    prefix: &'a [Column],
    last: &'a Column,
    radices: Vec<usize>,
    /// `None` after the first column overflowed
    cursor: Option<Cursor>,
    /// Concatenated prefix for the current outer step
    head: String,
    /// Next point of the last column to emit
    sweep: usize,
}

impl Rows<'_> {
    fn build_head(&self, cursor: &[usize]) -> String {
        self.prefix
            .iter()
            .zip(cursor)
            .map(|(column, &at)| column.points[at].as_str())
            .collect()
    }
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let cursor = self.cursor.as_ref()?;

        // Forward phase: recompute the prefix at the start of each sweep
        if self.sweep == 0 {
            self.head = self.build_head(cursor);
        }

        let mut coordinates = cursor.clone();
        coordinates.push(self.sweep);
        let row = Row {
            value: format!("{}{}", self.head, self.last.points[self.sweep]),
            coordinates,
        };

        self.sweep += 1;
        if self.sweep == self.last.len() {
            // Backward phase
            self.sweep = 0;
            let next = advance(cursor, &self.radices);
            self.cursor = next;
        }

        Some(row)
    }
}

/// Eagerly collect every combination of `columns` as plain strings
pub fn combination_rows(columns: Vec<Column>) -> Result<Vec<String>> {
    let matrix = Matrix::new(columns)?;
    Ok(matrix.rows().map(|row| row.value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn col(points: &[&str]) -> Column {
        Column::new(points.iter().copied()).unwrap()
    }

    #[test]
    fn test_empty_column_rejected() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(Column::new(empty), Err(Error::TemplateError(_))));
    }

    #[test]
    fn test_no_columns_rejected() {
        assert!(matches!(Matrix::new(Vec::new()), Err(Error::TemplateError(_))));
    }

    #[test]
    fn test_row_counts() {
        let three = || col(&["1", "2", "3"]);
        assert_eq!(combination_rows(vec![three(), three(), three()]).unwrap().len(), 27);
        assert_eq!(combination_rows(vec![three(), three()]).unwrap().len(), 9);
        assert_eq!(combination_rows(vec![three()]).unwrap().len(), 3);
    }

    #[test]
    fn test_odometer_order() {
        let rows = combination_rows(vec![
            col(&["a/", "b/"]),
            col(&["1/", "2/"]),
            col(&["x/", "y/", "z/"]),
        ])
        .unwrap();

        assert_eq!(
            &rows[..7],
            &["a/1/x/", "a/1/y/", "a/1/z/", "a/2/x/", "a/2/y/", "a/2/z/", "b/1/x/"]
        );
        assert_eq!(rows.last().unwrap(), "b/2/z/");
    }

    #[test]
    fn test_single_column_one_sweep() {
        let matrix = Matrix::new(vec![col(&["x", "y"])]).unwrap();
        let rows: Vec<Row> = matrix.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].coordinates, vec![1]);
    }

    #[test]
    fn test_no_duplicates_and_coordinates() {
        let matrix = Matrix::new(vec![col(&["a", "b", "c"]), col(&["1", "2"]), col(&["x", "y"])])
            .unwrap();
        let rows: Vec<Row> = matrix.rows().collect();
        assert_eq!(rows.len(), matrix.row_count());

        let distinct: HashSet<&str> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(distinct.len(), 12);
        assert_eq!(rows[5].coordinates, vec![1, 0, 1]);
        assert_eq!(rows[5].value, "b1y");
    }

    #[test]
    fn test_advance_carries_left() {
        assert_eq!(advance(&[0, 0], &[2, 2]), Some(vec![0, 1]));
        assert_eq!(advance(&[0, 1], &[2, 2]), Some(vec![1, 0]));
        assert_eq!(advance(&[1, 1], &[2, 2]), None);
        assert_eq!(advance(&[], &[]), None);
    }

    #[test]
    fn test_advance_mismatched_radices() {
        assert_eq!(advance(&[0, 0], &[2]), None);
        assert_eq!(advance(&[0], &[2, 2]), None);
    }

    #[test]
    fn test_rows_is_lazy() {
        let big = || col(&["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        let matrix = Matrix::new(vec![big(), big(), big(), big(), big(), big()]).unwrap();
        let first: Vec<String> = matrix.rows().take(3).map(|r| r.value).collect();
        assert_eq!(first, vec!["000000", "000001", "000002"]);
    }
}
