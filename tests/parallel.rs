use kobold_lib::{BlockingParams, Context, Dense, Matrix};
use kobold_lib::{naive_gemm, naive_syr2k, naive_syrk, naive_trmm, test_equality};
use kobold_lib::flags::{Flags, LEFT, LOWER, NONE, RIGHT, TRANS, TRANSA, TRANSB, UNIT, UPPER};

fn test_range(begin: usize, end: usize, func: &dyn Fn(usize)) {
    for n in begin ..= end {
        func(n)
    }
}

/// A context that partitions every problem, however small.
fn eager(workers: usize, block: usize) -> Context {
    Context::new(BlockingParams::uniform(block).unwrap())
        .with_workers(workers)
        .with_threshold(0)
}

fn gemm_nmp_parallel(ctx: &Context, n: usize, m: usize, p: usize, flags: Flags) {
    let a = if flags.trans_a() { Matrix::random(m, n, -1.0, 1.0) } else { Matrix::random(n, m, -1.0, 1.0) };
    let b = if flags.trans_b() { Matrix::random(p, m, -1.0, 1.0) } else { Matrix::random(m, p, -1.0, 1.0) };
    let mut c = Matrix::random(n, p, -1.0, 1.0);
    let mut expect = c.clone();
    naive_gemm(&mut expect, &a, &b, 0.5, 1.5, flags);
    ctx.mult(&mut c, &a, &b, 0.5, 1.5, flags).unwrap();
    test_equality(n, p, &c, &expect);
}

#[test]
fn gemm_worker_invariance() {
    for &workers in &[1, 2, 4, 8] {
        let ctx = eager(workers, 8);
        for &flags in &[NONE, TRANSA, TRANSB, TRANSA | TRANSB] {
            test_range(1, 20, &|n| gemm_nmp_parallel(&ctx, n, 13, 21, flags));
            test_range(1, 20, &|p| gemm_nmp_parallel(&ctx, 37, 5, p, flags));
        }
    }
}

#[test]
fn gemm_parallel_matches_serial() {
    let (n, m, p) = (101, 67, 93);
    let a = Matrix::random(n, m, -1.0, 1.0);
    let b = Matrix::random(m, p, -1.0, 1.0);
    let c0 = Matrix::random(n, p, -1.0, 1.0);

    let mut serial = c0.clone();
    Context::default().mult(&mut serial, &a, &b, 1.0, 1.0, NONE).unwrap();
    for &workers in &[2, 3, 4, 6, 8] {
        let mut par = c0.clone();
        eager(workers, 68).mult(&mut par, &a, &b, 1.0, 1.0, NONE).unwrap();
        test_equality(n, p, &par, &serial);
    }
}

#[test]
fn symm_worker_invariance() {
    let full = kobold_lib::mirror_triangle(&Matrix::random(30, 30, -1.0, 1.0), true);
    let b = Matrix::random(30, 23, -1.0, 1.0);
    let mut expect = Matrix::random(30, 23, -1.0, 1.0);
    let c0 = expect.clone();
    naive_gemm(&mut expect, &full, &b, 1.0, -1.0, NONE);

    for &workers in &[1, 2, 4, 8] {
        let mut c = c0.clone();
        eager(workers, 7).mult_sym(&mut c, &full, &b, 1.0, -1.0, LOWER | LEFT).unwrap();
        test_equality(30, 23, &c, &expect);
    }
}

#[test]
fn symm_right_worker_invariance() {
    /* C is 23x30 = op(B) * A with B stored 30x23 */
    let full = kobold_lib::mirror_triangle(&Matrix::random(30, 30, -1.0, 1.0), false);
    let b = Matrix::random(30, 23, -1.0, 1.0);
    let mut expect = Matrix::random(23, 30, -1.0, 1.0);
    let c0 = expect.clone();
    naive_gemm(&mut expect, &b, &full, 0.5, 2.0, TRANSA);

    for &workers in &[1, 2, 4, 8] {
        let mut c = c0.clone();
        eager(workers, 7).mult_sym(&mut c, &full, &b, 0.5, 2.0, UPPER | RIGHT | TRANSB).unwrap();
        test_equality(23, 30, &c, &expect);
    }
}

#[test]
fn triangular_worker_invariance() {
    let a = Matrix::from_fn(25, 25, |i, j| if i == j { 3.0 } else { 1.0 / (1 + i + 2 * j) as f64 });
    for &workers in &[1, 2, 4, 8] {
        let ctx = eager(workers, 6);
        for &flags in &[LOWER | LEFT, UPPER | RIGHT | TRANS, LOWER | RIGHT | UNIT, UPPER | LEFT | TRANS] {
            let x = if flags.right() { Matrix::random(19, 25, -1.0, 1.0) } else { Matrix::random(25, 19, -1.0, 1.0) };
            let mut b = x.clone();
            let mut expect = x.clone();
            naive_trmm(&mut expect, &a, 2.0, flags);
            ctx.mult_trm(&mut b, &a, 2.0, flags).unwrap();
            test_equality(b.rows(), b.cols(), &b, &expect);

            ctx.solve(&mut b, &a, 0.5, flags).unwrap();
            assert!(b.max_rel_diff(&x) < 1e-12);
        }
    }
}

#[test]
fn rank_update_worker_invariance() {
    let a = Matrix::random(11, 33, -1.0, 1.0);
    for &workers in &[1, 2, 4, 8] {
        let mut c = Matrix::random(33, 33, -1.0, 1.0);
        let mut expect = c.clone();
        naive_syrk(&mut expect, &a, 1.0, 0.5, UPPER | TRANS);
        eager(workers, 5).rank_update_sym(&mut c, &a, 1.0, 0.5, UPPER | TRANS).unwrap();
        test_equality(33, 33, &c, &expect);
    }
}

#[test]
fn rank_update2_worker_invariance() {
    let a = Matrix::random(29, 9, -1.0, 1.0);
    let b = Matrix::random(29, 9, -1.0, 1.0);
    for &flags in &[LOWER, UPPER | TRANS] {
        let n = 29;
        let (a, b) = if flags.trans_a() { (a.transpose(), b.transpose()) } else { (a.clone(), b.clone()) };
        for &workers in &[1, 2, 4, 8] {
            let mut c = Matrix::random(n, n, -1.0, 1.0);
            let mut expect = c.clone();
            naive_syr2k(&mut expect, &a, &b, -0.5, 1.5, flags);
            eager(workers, 4).rank_update2_sym(&mut c, &a, &b, -0.5, 1.5, flags).unwrap();
            test_equality(n, n, &c, &expect);
        }
    }
}

#[test]
fn num_workers_returns_previous() {
    let first = kobold_lib::num_workers(4);
    assert_eq!(kobold_lib::num_workers(2), 4);
    assert_eq!(kobold_lib::num_workers(first), 2);
}
