use kobold_lib::{default_workers, float_eq, Context, BlockingParams, Dense, Error, Matrix};
use kobold_lib::flags::NONE;
use ndarray::Array2;
use ndarray::linalg::general_mat_mul;

fn main() -> Result<(), Error> {
    let (n, m, p) = (300, 250, 280);
    let a = Matrix::random(n, m, -100.0, 100.0);
    let b = Matrix::random(m, p, -100.0, 100.0);
    let mut c = Matrix::random(n, p, -100.0, 100.0);

    let aarr = Array2::from_shape_fn((n, m), |(i, j)| a.get(i, j));
    let barr = Array2::from_shape_fn((m, p), |(i, j)| b.get(i, j));
    let mut carr = Array2::from_shape_fn((n, p), |(i, j)| c.get(i, j));

    general_mat_mul(1.0, &aarr, &barr, 1.0, &mut carr);

    let ctx = Context::new(BlockingParams::default()).with_workers(default_workers());
    ctx.mult(&mut c, &a, &b, 1.0, 1.0, NONE)?;

    let mut wrong = 0;
    for j in 0 .. c.cols() {
        for i in 0 .. c.rows() {
            if !float_eq(carr[[i, j]], c.get(i, j), 1e-9) {
                println!("({}, {}): {} != {}", i, j, carr[[i, j]], c.get(i, j));
                wrong += 1;
            }
        }
    }
    println!("{}x{}x{} on {} workers: {} mismatches", n, m, p, ctx.workers(), wrong);
    Ok(())
}
