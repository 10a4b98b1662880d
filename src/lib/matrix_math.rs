use super::view::Lane;

/* Unblocked micro-kernels. Everything above them (GEMM blocks, symmetric
 * panels, triangular substitution) reduces to dot products of one lane of
 * op(A) against one or four lanes of op(B), over a panel of bounded length. */

/// Dot products over a panel are unrolled by this many elements.
const MICROBLOCKM: usize = 4;

pub trait FMADD {
    fn fmadd(&mut self, a: Self, b: Self);
}

impl FMADD for f64 {
    #[inline(always)]
    fn fmadd(&mut self, a: f64, b: f64) {
        *self = a.mul_add(b, *self);
    }
}

/// Dot product of two lanes of equal length.
#[inline]
pub fn dot(x: &Lane, y: &Lane) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let len = x.len();
    let end = len - len % MICROBLOCKM;
    let mut acc = (0.0, 0.0, 0.0, 0.0);

    for k in (0 .. end).step_by(MICROBLOCKM) {
        acc.0.fmadd(x.at(k), y.at(k));
        acc.1.fmadd(x.at(k + 1), y.at(k + 1));
        acc.2.fmadd(x.at(k + 2), y.at(k + 2));
        acc.3.fmadd(x.at(k + 3), y.at(k + 3));
    }

    let mut sum = (acc.0 + acc.1) + (acc.2 + acc.3);
    for k in end .. len {
        sum.fmadd(x.at(k), y.at(k));
    }
    sum
}

/// Dot products of one lane against four lanes at once, e.g. one row of
/// op(A) against four columns of op(B). Each element of `x` is loaded once
/// and broadcast over the four accumulators.
#[inline]
pub fn dot4(x: &Lane, ys: &[Lane; 4]) -> [f64; 4] {
    debug_assert!(ys.iter().all(|y| y.len() == x.len()));
    let mut acc = [0.0; 4];

    for k in 0 .. x.len() {
        let x_elt = x.at(k);
        acc[0].fmadd(x_elt, ys[0].at(k));
        acc[1].fmadd(x_elt, ys[1].at(k));
        acc[2].fmadd(x_elt, ys[2].at(k));
        acc[3].fmadd(x_elt, ys[3].at(k));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::view::StridedView;

    #[test]
    fn dot_with_remainder() {
        let buf: Vec<f64> = (1 ..= 14).map(|x| x as f64).collect();
        /* 7x2: column 0 is 1..=7, column 1 is 8..=14 */
        let view = StridedView::new(&buf, 0, 7, 2, 7).unwrap();
        let expect: f64 = (1 ..= 7).map(|x| (x * (x + 7)) as f64).sum();
        assert_eq!(dot(&view.col(0), &view.col(1)), expect);
        assert_eq!(dot(&view.col(0).range(2, 2), &view.col(1).range(3, 3)), 0.0);
    }

    #[test]
    fn dot4_matches_dot() {
        let buf: Vec<f64> = (0 .. 30).map(|x| (x as f64) * 0.5 - 3.0).collect();
        let view = StridedView::new(&buf, 0, 6, 5, 6).unwrap();
        let x = view.col(0);
        let ys = [view.col(1), view.col(2), view.col(3), view.col(4)];
        let res = dot4(&x, &ys);
        for (q, y) in ys.iter().enumerate() {
            assert!((res[q] - dot(&x, y)).abs() < 1e-12);
        }
    }

    #[test]
    fn fmadd_accumulates() {
        let mut c = 1.0;
        c.fmadd(2.0, 3.0);
        assert_eq!(c, 7.0);
    }
}
