// crates/tc_fvm/src/linear_algebra/csr.rs

//! 压缩稀疏行（CSR）矩阵格式
//!
//! CSR 使用三个数组存储：
//! - `row_ptr`: 行指针，长度 n_rows + 1，row_ptr[i] 是第 i 行第一个非零元的索引
//! - `col_idx`: 列索引，与非零元一一对应
//! - `values`: 非零元值
//!
//! 有限体积矩阵每行的非零元就是单元自身与其面邻居，
//! 由 [`CsrBuilder`] 按 (行, 列) 累加后一次性压缩。
//!
//! ```
//! use tc_fvm::linear_algebra::CsrBuilder;
//!
//! let mut builder = CsrBuilder::new_square(2);
//! builder.add(0, 0, 4.0);
//! builder.add(0, 1, -1.0);
//! builder.add(1, 1, 4.0);
//! let matrix = builder.build();
//!
//! let mut y = vec![0.0; 2];
//! matrix.mul_vec(&[1.0, 1.0], &mut y);
//! assert_eq!(y, vec![3.0, 4.0]);
//! ```

use std::collections::BTreeMap;

// =============================================================================
// 稀疏模式
// =============================================================================

/// CSR 矩阵的稀疏模式
#[derive(Debug, Clone)]
pub struct CsrPattern {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl CsrPattern {
    /// 获取行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 获取列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 获取非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// 获取第 row 行的非零元列索引
    #[inline]
    pub fn row_indices(&self, row: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]]
    }

    /// 查找 (row, col) 对应的值索引
    ///
    /// 每行列索引有序，使用二分查找。
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.n_rows {
            return None;
        }
        let start = self.row_ptr[row];
        self.row_indices(row)
            .binary_search(&col)
            .ok()
            .map(|pos| start + pos)
    }
}

// =============================================================================
// CSR 矩阵
// =============================================================================

/// CSR 稀疏矩阵
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    pattern: CsrPattern,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// 获取行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows
    }

    /// 获取列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.pattern.n_cols
    }

    /// 获取非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 获取稀疏模式
    #[inline]
    pub fn pattern(&self) -> &CsrPattern {
        &self.pattern
    }

    /// 获取值切片
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 获取 (row, col) 的值（不存在返回 0）
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.pattern
            .find_index(row, col)
            .map(|idx| self.values[idx])
            .unwrap_or(0.0)
    }

    /// 获取对角元（结构中不存在时返回 None）
    #[inline]
    pub fn diagonal_value(&self, row: usize) -> Option<f64> {
        self.pattern.find_index(row, row).map(|idx| self.values[idx])
    }

    /// 提取对角线
    pub fn extract_diagonal(&self) -> Vec<f64> {
        (0..self.n_rows())
            .map(|i| self.diagonal_value(i).unwrap_or(0.0))
            .collect()
    }

    /// 矩阵-向量乘法: y = A * x
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.n_cols());
        debug_assert_eq!(y.len(), self.n_rows());

        for (row, yi) in y.iter_mut().enumerate() {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];
            let mut sum = 0.0;
            for idx in start..end {
                sum += self.values[idx] * x[self.pattern.col_idx[idx]];
            }
            *yi = sum;
        }
    }

    /// 是否严格对角占优（诊断用）
    pub fn is_diagonally_dominant(&self) -> bool {
        (0..self.n_rows()).all(|row| {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];
            let mut diag = 0.0;
            let mut off = 0.0;
            for idx in start..end {
                if self.pattern.col_idx[idx] == row {
                    diag = self.values[idx].abs();
                } else {
                    off += self.values[idx].abs();
                }
            }
            diag >= off
        })
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// CSR 矩阵构建器
///
/// 每行以 `BTreeMap` 存储，列索引天然有序。
pub struct CsrBuilder {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl CsrBuilder {
    /// 创建方阵构建器
    #[inline]
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// 创建构建器
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 设置 (row, col) 的值（覆盖）
    ///
    /// # Panics
    /// 索引越界
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    ///
    /// # Panics
    /// 索引越界
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// 获取当前非零元总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// 构建 CSR 矩阵（消耗构建器）
    pub fn build(self) -> CsrMatrix {
        let nnz = self.nnz();
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for row_map in self.rows {
            for (col, val) in row_map {
                col_idx.push(col);
                values.push(val);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix {
            pattern: CsrPattern {
                n_rows: self.n_rows,
                n_cols: self.n_cols,
                row_ptr,
                col_idx,
            },
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tridiagonal(n: usize) -> CsrMatrix {
        let mut builder = CsrBuilder::new_square(n);
        for i in 0..n {
            builder.set(i, i, 4.0);
            if i > 0 {
                builder.set(i, i - 1, -1.0);
            }
            if i + 1 < n {
                builder.set(i, i + 1, -1.0);
            }
        }
        builder.build()
    }

    #[test]
    fn test_build_and_get() {
        let m = tridiagonal(4);
        assert_eq!(m.nnz(), 10);
        assert_eq!(m.get(1, 0), -1.0);
        assert_eq!(m.get(0, 3), 0.0);
        assert_eq!(m.extract_diagonal(), vec![4.0; 4]);
        assert!(m.is_diagonally_dominant());
    }

    #[test]
    fn test_add_accumulates() {
        let mut builder = CsrBuilder::new_square(2);
        builder.add(0, 0, 1.0);
        builder.add(0, 0, 2.5);
        let m = builder.build();
        assert!((m.get(0, 0) - 3.5).abs() < 1e-15);
        assert_eq!(m.diagonal_value(1), None);
    }

    #[test]
    fn test_mul_vec() {
        let m = tridiagonal(3);
        let mut y = vec![0.0; 3];
        m.mul_vec(&[1.0, 2.0, 3.0], &mut y);
        assert_eq!(y, vec![2.0, 4.0, 10.0]);
    }
}
