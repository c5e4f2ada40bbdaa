use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::Verbosity;
use env_logger::Builder;
use std::path::{Path, PathBuf};

use bigm_lang::Compiler;
use bigm_solver::{Solver, StandardForm};

mod render;

#[derive(Parser)]
#[command(name = "bigm")]
#[command(about = "Solve linear programs with the Big-M method, showing every tableau", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    verbose: Verbosity,
}

#[derive(Clone, Copy, ValueEnum)]
enum ParseFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum SolveFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a program and output the AST
    Parse {
        /// The file to parse
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: ParseFormat,
    },
    /// Check a program for errors and print its standard form
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Solve a program and print every tableau
    Solve {
        /// The file containing the program
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: SolveFormat,
        /// Show row operations and the Zj, Zj-Cj and Qi arithmetic
        #[arg(short, long)]
        steps: bool,
        /// Penalty for artificial variables
        #[arg(long, default_value_t = bigm_solver::DEFAULT_BIG_M)]
        big_m: f64,
        /// Give up after this many pivots
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Decimal places kept after every arithmetic step
        #[arg(
            long,
            default_value_t = 6,
            value_parser = clap::value_parser!(u32).range(0..=i64::from(bigm_solver::MAX_PRECISION))
        )]
        precision: u32,
    },
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn read_source(file: &Path) -> String {
    std::fs::read_to_string(file).unwrap_or_else(|e| fail(format!("Error reading file: {}", e)))
}

fn main() {
    let cli = Cli::parse();
    Builder::new().filter_level(cli.verbose.log_level_filter()).init();

    match cli.command {
        Commands::Parse { file, format } => {
            let source = read_source(&file);
            let program =
                bigm_lang::Parser::parse(&source).unwrap_or_else(|e| fail(format!("Parse error: {}", e)));
            match format {
                ParseFormat::Json => match serde_json::to_string_pretty(&program) {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail(format!("Error serializing AST: {}", e)),
                },
                ParseFormat::Pretty => println!("{:#?}", program),
            }
        }
        Commands::Check { file } => {
            let source = read_source(&file);
            let lp = match Compiler::new().compile_source(&source) {
                Ok(lp) => lp,
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    fail(format!("  {}", e));
                }
            };
            let form = StandardForm::new(&lp).unwrap_or_else(|e| fail(format!("  {}", e)));

            println!("✓ {} is valid", file.display());
            println!("  {} variables", lp.num_variables());
            println!("  {} constraints", lp.num_constraints());
            println!();
            println!("{}", form);
        }
        Commands::Solve {
            file,
            format,
            steps,
            big_m,
            max_iterations,
            precision,
        } => {
            let source = read_source(&file);
            let lp = Compiler::new()
                .compile_source(&source)
                .unwrap_or_else(|e| fail(format!("Compile error: {}", e)));

            log::info!(
                "Solving {}: {} variables, {} constraints",
                file.display(),
                lp.num_variables(),
                lp.num_constraints()
            );
            let mut solver = Solver::new().with_big_m(big_m).with_precision(precision);
            if let Some(max) = max_iterations {
                solver = solver.with_max_iterations(max);
            }
            let solution = solver
                .solve(&lp)
                .unwrap_or_else(|e| fail(format!("Invalid program: {}", e)));

            match format {
                SolveFormat::Json => match serde_json::to_string_pretty(&solution) {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail(format!("Error serializing solution: {}", e)),
                },
                SolveFormat::Text => print!("{}", render::Trace::new(&solution, steps)),
            }
        }
    }
}
