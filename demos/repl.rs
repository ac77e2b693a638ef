use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;
use value_to_estree::convert::{Options, value_to_estree};
use value_to_estree::json::{estree_to_string, parse_json};

fn main() {
    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("value-to-estree: JSON values in, ESTree expressions out");
    println!("Enter JSON like: {{\"a\": [1, -2, null]}}");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let options = Options::default();
    let mut minify = false;

    loop {
        match rl.readline("estree> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":min" => {
                        minify = !minify;
                        if minify {
                            println!("Minified output enabled");
                        } else {
                            println!("Pretty output enabled");
                        }
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                let result = parse_json(line)
                    .and_then(|value| value_to_estree(&value, &options))
                    .and_then(|expression| estree_to_string(&expression, minify));

                match result {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("value-to-estree REPL:");
    println!("  :help  - Show this help message");
    println!("  :min   - Toggle minified / pretty ESTree output");
    println!("  :quit  - Exit the REPL");
    println!("  :exit  - Exit the REPL");
    println!("  Ctrl+C - Exit the REPL");
    println!();
    println!("Each line is parsed as JSON, converted, and printed as ESTree JSON.");
    println!("Negative numbers become unary minus expressions, e.g. -5:");
    println!("  {{\"type\": \"UnaryExpression\", \"operator\": \"-\", ...}}");
    println!();
}
