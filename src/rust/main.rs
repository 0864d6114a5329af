use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use codelang::{ranked_scores, CodePredictor, Corpus, EvaluationReport, ModelStore, PredictorError};
use env_logger::Env;
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Retrain the model and save it
    #[arg(long)]
    train: bool,

    /// Run the built-in example battery
    #[arg(long)]
    test: bool,

    /// Predict the language of a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Read snippets interactively
    #[arg(long)]
    interactive: bool,

    /// Location of the model bundle
    #[arg(long, env = "CODELANG_MODEL", value_name = "PATH")]
    model: Option<PathBuf>,

    /// Code snippet to classify (words are joined with spaces)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    code: Vec<String>,
}

const RULE: &str = "======================================================================";

fn print_report(report: &EvaluationReport) {
    println!("\nTraining samples: {}, test samples: {}", report.train_size, report.test_size);
    println!("Test Accuracy: {:.2}%", report.accuracy * 100.0);
    println!("\nClassification Report:");
    println!("{}", report);
}

fn display_prediction(label: &str, scores: &HashMap<String, f32>) {
    println!("\n{}", RULE);
    println!("Predicted Language: {}", label.to_uppercase());
    println!("\nConfidence Scores:");
    for (lang, prob) in ranked_scores(scores) {
        let filled = ((prob * 50.0) as usize).min(50);
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(50 - filled));
        println!("  {:12} [{}] {:5.2}%", lang, bar, prob * 100.0);
    }
    println!("{}\n", RULE);
}

fn predict_and_display(predictor: &CodePredictor, code: &str) -> Result<()> {
    let (label, scores) = predictor.predict(code)?;
    display_prediction(&label, &scores);
    Ok(())
}

fn run_test_examples(predictor: &CodePredictor) -> Result<()> {
    println!("\n{}\nRUNNING TEST EXAMPLES\n{}", RULE, RULE);
    let summary = predictor.run_test_examples()?;
    for outcome in &summary.outcomes {
        println!("\n{}:", outcome.name);
        println!("Predicted: {}", outcome.predicted);
        if outcome.is_correct() {
            println!("✓ Correct!");
        } else {
            println!("✗ Incorrect (expected {})", outcome.expected);
        }
    }
    println!(
        "\n{}\nTest Results: {}/{} correct ({:.1}%)\n{}",
        RULE,
        summary.correct(),
        summary.total(),
        summary.correct() as f32 / summary.total().max(1) as f32 * 100.0,
        RULE
    );
    Ok(())
}

fn interactive_mode(predictor: &CodePredictor) -> Result<()> {
    println!("\n{}\nINTERACTIVE CODE PREDICTION MODE\n{}", RULE, RULE);
    println!("\nCommands:");
    println!("  - Type or paste code (end with 'END' on a new line)");
    println!("  - Type 'quit' or 'exit' to quit");
    println!("  - Type 'test' to run test examples");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nEnter code (or command): ");
        io::stdout().flush()?;
        let Some(first) = lines.next() else { break };
        let first = first?;
        let command = first.trim();

        match command.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye!");
                break;
            }
            "test" => run_test_examples(predictor)?,
            _ => {
                println!("(Type 'END' on a new line when done)");
                let mut code_lines = vec![command.to_string()];
                for line in lines.by_ref() {
                    let line = line?;
                    if line.trim() == "END" {
                        break;
                    }
                    code_lines.push(line);
                }
                let snippet = code_lines.join("\n");
                if !snippet.trim().is_empty() {
                    predict_and_display(predictor, &snippet)?;
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let model_path = match args.model {
        Some(path) => path,
        None => ModelStore::new_default()
            .context("Failed to create model directory")?
            .bundle_path(),
    };

    let mut predictor = CodePredictor::new(model_path, Corpus::demo());
    info!("=== Code Language Predictor ===");

    if let Some(report) = predictor.load_or_train()? {
        print_report(&report);
    }

    if args.train {
        let report = predictor.train_new_model()?;
        print_report(&report);
        println!("✓ Model trained with {:.2}% accuracy", report.accuracy * 100.0);
    } else if args.test {
        run_test_examples(&predictor)?;
    } else if let Some(path) = args.file {
        match predictor.predict_from_file(&path) {
            Ok((label, scores)) => display_prediction(&label, &scores),
            Err(e @ (PredictorError::FileNotFound(_) | PredictorError::FileRead { .. })) => {
                eprintln!("Error: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    } else if args.interactive || args.code.is_empty() {
        interactive_mode(&predictor)?;
    } else {
        predict_and_display(&predictor, &args.code.join(" "))?;
    }

    Ok(())
}
