//! Math and general-purpose calculation tools.
//!
//! Every tool here is a pure function of its arguments. Domain errors
//! (division by zero, negative square roots, ...) come back as
//! `ToolError::Rejected` so the model can explain them to the user.

use jarvis_core::error::{RegistryError, ToolError};
use jarvis_core::session::Session;
use jarvis_core::tool::{FnTool, ToolArgs, ToolParameter, ToolRegistry};

fn pair() -> Vec<ToolParameter> {
    vec![
        ToolParameter::number("a", "First number"),
        ToolParameter::number("b", "Second number"),
    ]
}

fn angle() -> Vec<ToolParameter> {
    vec![ToolParameter::number("angle", "Angle in radians")]
}

/// Register the math tools followed by the general-purpose ones.
pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    let tools = [
        FnTool::new("add", "Adds two numbers.", pair(), add),
        FnTool::new("subtract", "Subtracts two numbers.", pair(), subtract),
        FnTool::new("multiply", "Multiplies two numbers.", pair(), multiply),
        FnTool::new("divide", "Divides two numbers.", pair(), divide),
        FnTool::new(
            "power",
            "Calculates the power of a number.",
            vec![
                ToolParameter::number("base", "The base"),
                ToolParameter::number("exponent", "The exponent"),
            ],
            power,
        ),
        FnTool::new(
            "sqrt",
            "Calculates the square root of a number.",
            vec![ToolParameter::number("number", "A non-negative number")],
            sqrt,
        ),
        FnTool::new(
            "log",
            "Calculates the logarithm of a number with a given base (natural log by default).",
            vec![
                ToolParameter::number("number", "A positive number"),
                ToolParameter::number("base", "Logarithm base").with_default(std::f64::consts::E),
            ],
            log,
        ),
        FnTool::new("sin", "Calculates the sine of an angle in radians.", angle(), sin),
        FnTool::new("cos", "Calculates the cosine of an angle in radians.", angle(), cos),
        FnTool::new("tan", "Calculates the tangent of an angle in radians.", angle(), tan),
        FnTool::new(
            "calculate_grade",
            "Calculates the letter grade for a given score.",
            vec![ToolParameter::number("score", "The score to grade")],
            calculate_grade,
        ),
        FnTool::new(
            "average",
            "Calculates the average of a list of numbers.",
            vec![ToolParameter::number_array("numbers", "The numbers to average")],
            average,
        ),
        FnTool::new(
            "is_prime",
            "Checks if a number is prime.",
            vec![ToolParameter::integer("number", "The integer to test")],
            is_prime,
        ),
    ];
    for tool in tools {
        registry.register(Box::new(tool))?;
    }
    Ok(())
}

fn add(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let (a, b) = (args.number("a")?, args.number("b")?);
    Ok(format!("The sum of {a} and {b} is {}.", a + b))
}

fn subtract(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let (a, b) = (args.number("a")?, args.number("b")?);
    Ok(format!("The difference of {a} and {b} is {}.", a - b))
}

fn multiply(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let (a, b) = (args.number("a")?, args.number("b")?);
    Ok(format!("The product of {a} and {b} is {}.", a * b))
}

fn divide(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let (a, b) = (args.number("a")?, args.number("b")?);
    if b == 0.0 {
        return Err(ToolError::rejected("Cannot divide by zero."));
    }
    Ok(format!("The quotient of {a} and {b} is {}.", a / b))
}

fn power(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let (base, exponent) = (args.number("base")?, args.number("exponent")?);
    let result = base.powf(exponent);
    if !result.is_finite() {
        return Err(ToolError::rejected(format!(
            "{base} raised to the power of {exponent} is not a finite real number."
        )));
    }
    Ok(format!(
        "The result of {base} raised to the power of {exponent} is {result}."
    ))
}

fn sqrt(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let number = args.number("number")?;
    if number < 0.0 {
        return Err(ToolError::rejected(
            "Cannot calculate the square root of a negative number.",
        ));
    }
    Ok(format!("The square root of {number} is {}.", number.sqrt()))
}

fn log(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let (number, base) = (args.number("number")?, args.number("base")?);
    if number <= 0.0 {
        return Err(ToolError::rejected(
            "Cannot calculate the logarithm of a non-positive number.",
        ));
    }
    if base <= 0.0 || base == 1.0 {
        return Err(ToolError::rejected(
            "The logarithm base must be positive and not equal to 1.",
        ));
    }
    Ok(format!(
        "The logarithm of {number} with base {base} is {}.",
        number.log(base)
    ))
}

fn sin(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let angle = args.number("angle")?;
    Ok(format!("The sine of {angle} is {}.", angle.sin()))
}

fn cos(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let angle = args.number("angle")?;
    Ok(format!("The cosine of {angle} is {}.", angle.cos()))
}

fn tan(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let angle = args.number("angle")?;
    Ok(format!("The tangent of {angle} is {}.", angle.tan()))
}

/// Letter grade for a score: 85+ A1, 70+ B, 60+ C, 50+ D, otherwise Fail.
pub fn grade_for(score: f64) -> &'static str {
    match score {
        s if s >= 85.0 => "A1",
        s if s >= 70.0 => "B",
        s if s >= 60.0 => "C",
        s if s >= 50.0 => "D",
        _ => "Fail",
    }
}

fn calculate_grade(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    Ok(grade_for(args.number("score")?).to_string())
}

fn average(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let numbers = args.numbers("numbers")?;
    if numbers.is_empty() {
        return Err(ToolError::rejected(
            "Cannot calculate the average of an empty list.",
        ));
    }
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
    Ok(format!("The average of {numbers:?} is {mean}."))
}

/// Trial division up to the square root.
pub fn is_prime_number(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut i = 3;
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

fn is_prime(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let n = args.integer("number")?;
    if is_prime_number(n) {
        Ok(format!("{n} is a prime number."))
    } else {
        Ok(format!("{n} is not a prime number."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_core::tool::ToolCall;
    use jarvis_memory::NoopTodoStore;
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        register(&mut r).unwrap();
        r
    }

    async fn run(name: &str, args: serde_json::Value) -> (bool, String) {
        let mut session = Session::new(Arc::new(NoopTodoStore));
        let call = ToolCall {
            id: "t".into(),
            name: name.into(),
            arguments: args,
        };
        let result = registry().execute(&call, &mut session).await;
        (result.success, result.output)
    }

    #[tokio::test]
    async fn arithmetic() {
        assert_eq!(run("add", json!({"a": 2, "b": 3})).await.1, "The sum of 2 and 3 is 5.");
        assert_eq!(
            run("subtract", json!({"a": 2, "b": 3.5})).await.1,
            "The difference of 2 and 3.5 is -1.5."
        );
        assert_eq!(
            run("multiply", json!({"a": 4, "b": 2.5})).await.1,
            "The product of 4 and 2.5 is 10."
        );
        assert_eq!(
            run("divide", json!({"a": 10, "b": 4})).await.1,
            "The quotient of 10 and 4 is 2.5."
        );
    }

    #[tokio::test]
    async fn divide_by_zero_is_error_observation() {
        let (ok, out) = run("divide", json!({"a": 10, "b": 0})).await;
        assert!(!ok);
        assert_eq!(out, "Error: Cannot divide by zero.");
    }

    #[tokio::test]
    async fn sqrt_and_log_domains() {
        assert!(!run("sqrt", json!({"number": -4})).await.0);
        assert_eq!(run("sqrt", json!({"number": 9})).await.1, "The square root of 9 is 3.");
        assert!(!run("log", json!({"number": 0})).await.0);
        assert!(!run("log", json!({"number": 8, "base": 1})).await.0);
        assert_eq!(
            run("log", json!({"number": 8, "base": 2})).await.1,
            "The logarithm of 8 with base 2 is 3."
        );
        let (ok, out) = run("log", json!({"number": 1})).await;
        assert!(ok);
        assert!(out.ends_with(" is 0."));
    }

    #[tokio::test]
    async fn trig_uses_radians() {
        assert_eq!(run("sin", json!({"angle": 0})).await.1, "The sine of 0 is 0.");
        assert_eq!(run("cos", json!({"angle": 0})).await.1, "The cosine of 0 is 1.");
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(grade_for(85.0), "A1");
        assert_eq!(grade_for(84.9), "B");
        assert_eq!(grade_for(70.0), "B");
        assert_eq!(grade_for(60.0), "C");
        assert_eq!(grade_for(50.0), "D");
        assert_eq!(grade_for(49.99), "Fail");
    }

    #[tokio::test]
    async fn average_rejects_empty() {
        assert!(!run("average", json!({"numbers": []})).await.0);
        assert_eq!(
            run("average", json!({"numbers": [1, 2, 3, 4]})).await.1,
            "The average of [1.0, 2.0, 3.0, 4.0] is 2.5."
        );
    }

    #[test]
    fn primes() {
        let primes: Vec<i64> = (-3..30).filter(|&n| is_prime_number(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(is_prime_number(7919));
        assert!(!is_prime_number(7917));
    }

    #[tokio::test]
    async fn is_prime_messages() {
        assert_eq!(run("is_prime", json!({"number": 7})).await.1, "7 is a prime number.");
        assert_eq!(run("is_prime", json!({"number": 1})).await.1, "1 is not a prime number.");
    }
}
