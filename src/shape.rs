//! Elementwise arithmetic over shape, coordinate, and offset tuples.
//!
//! Shapes, coordinates, and neighbor offsets are all plain `i32` slices of
//! the topology's rank. The helpers here combine them elementwise; division
//! and remainder assume non-negative operands (tile partitioning never
//! produces anything else).
//!
//! # Panics
//!
//! Mixing tuples of different lengths is a programmer error; every binary
//! helper asserts matching lengths and panics with a diagnostic.

/// Elementwise sum `a + b`.
pub fn add(a: &[i32], b: &[i32]) -> Vec<i32> {
    assert_eq!(a.len(), b.len(), "tuple length mismatch in add");
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Elementwise difference `a - b`.
pub fn sub(a: &[i32], b: &[i32]) -> Vec<i32> {
    assert_eq!(a.len(), b.len(), "tuple length mismatch in sub");
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Elementwise floor division `a / b` (non-negative operands).
pub fn div(a: &[i32], b: &[i32]) -> Vec<i32> {
    assert_eq!(a.len(), b.len(), "tuple length mismatch in div");
    a.iter().zip(b).map(|(x, y)| x / y).collect()
}

/// Elementwise remainder `a % b` (non-negative operands).
pub fn rem(a: &[i32], b: &[i32]) -> Vec<i32> {
    assert_eq!(a.len(), b.len(), "tuple length mismatch in rem");
    a.iter().zip(b).map(|(x, y)| x % y).collect()
}

/// Scalar multiple `c * v`.
pub fn scale(c: i32, v: &[i32]) -> Vec<i32> {
    v.iter().map(|x| c * x).collect()
}

/// Componentwise negation `-v`.
pub fn neg(v: &[i32]) -> Vec<i32> {
    scale(-1, v)
}

/// Product of all components, with identity 1 for an empty tuple.
///
/// Accumulates in `i64` so that realistic global shapes (e.g. 1000^3) do
/// not overflow.
pub fn prod(v: &[i32]) -> i64 {
    v.iter().fold(1i64, |acc, &x| acc * i64::from(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elementwise_ops() {
        assert_eq!(add(&[1, 2, 3], &[4, 5, 6]), vec![5, 7, 9]);
        assert_eq!(sub(&[4, 5, 6], &[1, 2, 3]), vec![3, 3, 3]);
        assert_eq!(div(&[7, 9, 10], &[2, 3, 5]), vec![3, 3, 2]);
        assert_eq!(rem(&[7, 9, 10], &[2, 3, 5]), vec![1, 0, 0]);
        assert_eq!(scale(3, &[1, -1, 0]), vec![3, -3, 0]);
        assert_eq!(neg(&[1, -1, 0]), vec![-1, 1, 0]);
    }

    #[test]
    fn prod_reduces_with_identity() {
        assert_eq!(prod(&[]), 1);
        assert_eq!(prod(&[7]), 7);
        assert_eq!(prod(&[3, 3, 3]), 27);
        // a realistic global shape must not overflow i32
        assert_eq!(prod(&[1000, 1000, 1000]), 1_000_000_000);
        assert_eq!(prod(&[100_000, 100_000]), 10_000_000_000);
    }

    #[test]
    #[should_panic(expected = "tuple length mismatch")]
    fn mismatched_lengths_panic() {
        add(&[1, 2], &[1, 2, 3]);
    }
}
