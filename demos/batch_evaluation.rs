use formulix_rs::{Expression, ExpressionCache, ExpressionConfig};
use std::num::NonZeroUsize;

fn main() {
    pretty_env_logger::init();

    let cache = ExpressionCache::new(NonZeroUsize::new(16).expect("non-zero capacity"));

    let expression = "price > 100 and volume < 5000";
    let expr = cache
        .get_or_parse(expression, ExpressionConfig::lax())
        .expect("Failed to parse");
    println!("Variables: {:?}", expr.variables());

    let contexts = vec![vec![120.0, 3000.0], vec![80.0, 6000.0], vec![150.0, 4999.0]];
    match expr.execute_batch(&contexts) {
        Ok(results) => {
            for (i, result) in results.iter().enumerate() {
                println!("Result {}: {}", i, result);
            }
        }
        Err(err) => println!("Error: {}", err),
    }

    let growth = Expression::lax("incsum(x)");
    for x in [1.0, 2.5, 4.0] {
        println!("Running total: {}", growth.evaluate(x, 0.0).unwrap_or(f64::NAN));
    }
}
