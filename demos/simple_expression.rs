use formulix_rs::{Expression, RecordWrapper};
use std::sync::Arc;

fn main() {
    pretty_env_logger::init();

    let trees = vec![
        RecordWrapper::new(2024, [("dbh", 32.0), ("species", 1.0)]),
        RecordWrapper::new(2024, [("dbh", 18.5), ("species", 2.0)]),
    ];

    let expression = "0.5*dbh^2 + if(species=1,10,0)";

    let mut expr = Expression::strict(expression);
    expr.set_wrapper(Arc::new(trees[0].clone()));

    for (i, tree) in trees.iter().enumerate() {
        match expr.execute_on(tree, &[]) {
            Ok(result) => println!("Result {}: {}", i, result),
            Err(err) => println!("Error: {}", err),
        }
    }

    if let Some(program) = expr.compiled() {
        println!("Compiled program:\n{}", program);
    }
}
