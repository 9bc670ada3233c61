use clap::Parser;
use std::path::PathBuf;

use mcc::cost::within_budget;
use mcc::pipeline;

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitKind {
    Report,
    Roots,
    Cost,
    Graph,
    Dag,
}

#[derive(Parser, Debug)]
#[command(
    name = "mcc",
    version,
    about = "Merkle Combinator Compiler — decodes, types, commits, and costs binary combinator programs"
)]
struct Cli {
    /// Input program file (binary encoding)
    program: PathBuf,

    /// Witness blob file
    #[arg(short, long)]
    witness: Option<PathBuf>,

    /// What to print on stdout
    #[arg(long, value_enum, default_value_t = EmitKind::Report)]
    emit: EmitKind,

    /// Reject programs whose static cost exceeds this many milli-weight-units
    #[arg(long)]
    budget: Option<u64>,

    /// Reject underdetermined programs instead of defaulting free type
    /// variables to unit
    #[arg(long)]
    strict_types: bool,

    /// Print pipeline stages and timing
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        eprintln!("mcc: program = {}", cli.program.display());
        if let Some(w) = &cli.witness {
            eprintln!("mcc: witness = {}", w.display());
        }
        eprintln!("mcc: emit    = {:?}", cli.emit);
    }

    let program = match std::fs::read(&cli.program) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("mcc: error: {}: {}", cli.program.display(), e);
            std::process::exit(2);
        }
    };

    let witness = match &cli.witness {
        Some(path) => match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                eprintln!("mcc: error: {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => None,
    };

    let options = pipeline::Options {
        strict_types: cli.strict_types,
        verbose: cli.verbose,
    };

    let compiled = match pipeline::run(&program, witness.as_deref(), &options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcc: error: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(budget) = cli.budget {
        if !within_budget(compiled.cost, budget) {
            eprintln!(
                "mcc: error: cost {} exceeds budget {}",
                compiled.cost, budget
            );
            std::process::exit(1);
        }
    }

    match cli.emit {
        EmitKind::Report => match serde_json::to_string_pretty(&compiled.report()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("mcc: error: {}", e);
                std::process::exit(1);
            }
        },
        EmitKind::Roots => {
            println!("commitment: {}", compiled.roots.commitment);
            println!("identity:   {}", compiled.roots.identity);
            println!("annotated:  {}", compiled.roots.annotated);
        }
        EmitKind::Cost => println!("{}", compiled.cost),
        EmitKind::Graph => print!("{}", mcc::dot::emit_dot(compiled.typed.dag())),
        EmitKind::Dag => print!("{}", compiled.typed.dag()),
    }
}
