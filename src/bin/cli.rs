use calcexpr::errors::ExpressionError;
use calcexpr::lexer::tokenize_str;
use calcexpr::operators::{combination, factorial};
use calcexpr::validate::validate_input;
use calcexpr::Expression;
use clap::{Parser, Subcommand};
use std::process;

#[derive(Parser)]
#[command(name = "calcexpr")]
#[command(about = "Inspect how calculator expressions are validated, tokenized and parsed")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tokens of an expression, one per line
    Tokens { expression: String },
    /// Print the parsed AST of an expression as JSON
    Ast { expression: String },
    /// Check an expression against the validation rules
    Validate { expression: String },
    /// Compute n!
    Factorial {
        #[arg(allow_hyphen_values = true)]
        n: i64,
    },
    /// Compute the number of k-combinations of n items
    Combination {
        #[arg(allow_hyphen_values = true)]
        n: i64,
        #[arg(allow_hyphen_values = true)]
        k: i64,
    },
}

fn main() {
    let args = Args::parse();

    match run(args.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(command: Command) -> Result<String, Box<dyn std::error::Error>> {
    match command {
        Command::Tokens { expression } => {
            let expression = expression.trim();
            validate_input(expression)?;
            let lines: Vec<String> = tokenize_str(expression)
                .iter()
                .map(ToString::to_string)
                .collect();
            Ok(lines.join("\n"))
        }
        Command::Ast { expression } => {
            let mut expr = Expression::new(&expression);
            // Surfaces validation failures before parsing absorbs them
            expr.tokenize()?;
            match expr.parse() {
                Some(ast) => Ok(serde_json::to_string_pretty(ast)?),
                None => Err(expr.error_message().unwrap_or("no expression").into()),
            }
        }
        Command::Validate { expression } => match validate_input(expression.trim()) {
            Ok(()) => Ok("valid".to_string()),
            Err(e) => Err(ExpressionError::from(e).into()),
        },
        Command::Factorial { n } => Ok(factorial(n)?.to_string()),
        Command::Combination { n, k } => Ok(combination(n, k).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_matches_expression_validity() {
        for input in ["   ", " (1", " sin(30) ", "1 % 2"] {
            let cli_valid = run(Command::Validate {
                expression: input.to_string(),
            })
            .is_ok();
            assert_eq!(cli_valid, Expression::new(input).is_valid(), "{input:?}");
        }
    }

    #[test]
    fn test_tokens_of_padded_input() {
        let output = run(Command::Tokens {
            expression: "  1+x ".to_string(),
        })
        .unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("@0"));
        assert!(run(Command::Tokens {
            expression: "  ".to_string()
        })
        .is_err());
    }

    #[test]
    fn test_factorial_of_huge_input() {
        let output = run(Command::Factorial { n: i64::MAX }).unwrap();
        assert_eq!(output, "inf");
    }
}
