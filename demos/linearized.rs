use formulix_rs::{Expression, StdRandom};
use std::sync::Arc;

fn main() {
    pretty_env_logger::init();

    let mut expr = Expression::lax("sigmoid(x, 1, 2.5, 0.4) * 100");
    expr.linearize_1d(0.0, 1.0, 500).expect("Failed to linearize");

    for x in [0.0, 0.25, 0.4, 0.777, 1.0, 1.5] {
        let fast = expr.evaluate(x, 0.0).unwrap_or(f64::NAN);
        let exact = expr.evaluate_exact(x, 0.0).unwrap_or(f64::NAN);
        println!("x = {:5}: table {:.6}  exact {:.6}", x, fast, exact);
    }

    let mut noisy = Expression::lax("x + rndg(0, 0.1)");
    noisy.set_random(Arc::new(StdRandom::seeded(42)));
    for x in [1.0, 2.0, 3.0] {
        println!("noisy({}) = {:?}", x, noisy.evaluate(x, 0.0));
    }
}
