use kobold_lib::{BlockingParams, Context, Dense, Matrix};
use kobold_lib::{naive_trmm, test_equality};
use kobold_lib::flags::{Flags, LEFT, LOWER, NONE, RIGHT, TRANS, UNIT, UPPER};

fn test_range(begin: usize, end: usize, func: &dyn Fn(usize)) {
    for n in begin ..= end {
        func(n)
    }
}

fn all_variants() -> Vec<Flags> {
    let mut all = Vec::new();
    for &side in &[LEFT, RIGHT] {
        for &uplo in &[UPPER, LOWER] {
            for &trans in &[NONE, TRANS] {
                for &diag in &[NONE, UNIT] {
                    all.push(side | uplo | trans | diag);
                }
            }
        }
    }
    all
}

/// Well conditioned triangular factor: dominant diagonal, small off-diagonal.
fn factor(n: usize) -> Matrix {
    let noise = Matrix::random(n, n, -0.5, 0.5);
    Matrix::from_fn(n, n, |i, j| {
        if i == j { 2.0 + noise.get(i, j) } else { noise.get(i, j) / n as f64 }
    })
}

fn round_trip(ctx: &Context, n: usize, flags: Flags) {
    let a = factor(n);
    let x = if flags.right() { Matrix::random(9, n, -1.0, 1.0) } else { Matrix::random(n, 9, -1.0, 1.0) };
    let mut b = x.clone();
    let mut expect = x.clone();

    naive_trmm(&mut expect, &a, 3.0, flags);
    ctx.mult_trm(&mut b, &a, 3.0, flags).unwrap();
    test_equality(b.rows(), b.cols(), &b, &expect);

    ctx.solve(&mut b, &a, 1.0 / 3.0, flags).unwrap();
    assert!(b.max_rel_diff(&x) < 1e-10, "{:?} n = {}: {}", flags, n, b.max_rel_diff(&x));
}

#[test]
fn trmm_trsm_round_trip_small_blocks() {
    let ctx = Context::new(BlockingParams::uniform(4).unwrap());
    for flags in all_variants() {
        test_range(1, 17, &|n| round_trip(&ctx, n, flags));
    }
}

#[test]
fn trmm_trsm_round_trip_default_blocks() {
    let ctx = Context::default();
    for flags in all_variants() {
        round_trip(&ctx, 150, flags);
    }
}

#[test]
fn unit_lower_all_ones_5x5() {
    let a = Matrix::with_value(5, 5, 1.0);
    let ones = Matrix::with_value(5, 1, 1.0);
    let mut b = ones.clone();

    kobold_lib::mult_trm(&mut b, &a, 1.0, LOWER | UNIT | LEFT).unwrap();
    assert_eq!(b.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);

    kobold_lib::solve(&mut b, &a, 1.0, LOWER | UNIT | LEFT).unwrap();
    assert_eq!(b, ones);
}

#[test]
fn blocked_and_unblocked_solves_agree() {
    let a = factor(40);
    let variants = all_variants();
    assert_eq!(variants.len(), 16);
    for flags in variants {
        let b0 = if flags.right() { Matrix::random(6, 40, -1.0, 1.0) } else { Matrix::random(40, 6, -1.0, 1.0) };
        let mut blocked = b0.clone();
        let mut unblocked = b0.clone();
        Context::new(BlockingParams::uniform(6).unwrap())
            .solve(&mut blocked, &a, 2.0, flags).unwrap();
        Context::new(BlockingParams::uniform(64).unwrap())
            .solve(&mut unblocked, &a, 2.0, flags).unwrap();
        test_equality(b0.rows(), b0.cols(), &blocked, &unblocked);
    }
}

#[test]
fn zero_alpha_clears_b() {
    let a = factor(6);
    let mut b = Matrix::random(6, 4, -1.0, 1.0);
    kobold_lib::mult_trm(&mut b, &a, 0.0, UPPER).unwrap();
    assert_eq!(b, Matrix::zeros(6, 4));
}

#[test]
fn triangular_rejects_bad_shapes() {
    let ctx = Context::default();
    let a = Matrix::random(4, 4, -1.0, 1.0);
    let mut b = Matrix::random(3, 4, -1.0, 1.0);
    assert!(ctx.mult_trm(&mut b, &a, 1.0, LEFT).is_err());
    assert!(ctx.solve(&mut b, &a, 1.0, LEFT).is_err());
    assert!(ctx.mult_trm(&mut b, &a, 1.0, RIGHT).is_ok());

    let a = Matrix::random(4, 3, -1.0, 1.0);
    assert!(ctx.solve(&mut b, &a, 1.0, RIGHT).is_err());
}
