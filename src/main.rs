use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use codeblock::bytecode::disasm::{bc_stats, print_listing};
use codeblock::frontend::extract::extract_clauses;
use codeblock::frontend::lexer::tokenize;
use codeblock::frontend::token_dumper::TokenDumper;
use codeblock::{CompileOptions, Codeblock, ErrorKind};

#[derive(Parser, Debug)]
#[command(name = "codeblock")]
#[command(about = "Compile and evaluate a {|params|expression} codeblock")]
struct Cli {
    /// Codeblock text, e.g. "{|a,b|a*b}"
    text: String,

    /// Comma-separated argument values
    #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    args: Vec<f64>,

    /// Show the tokens of both clauses and stop
    #[arg(long)]
    tokens: bool,

    /// Token dump without ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Token dump with plain lexeme text
    #[arg(long)]
    pretty: bool,

    /// Print the bytecode listing before running
    #[arg(long)]
    bc: bool,

    /// Print bytecode statistics before running
    #[arg(long)]
    stats: bool,

    /// Disable the peephole optimizer
    #[arg(long)]
    no_opt: bool,

    /// Permit assignment inside an iif condition
    #[arg(long)]
    allow_conditional_assignment: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if cli.tokens {
        dump_tokens(&cli);
        return;
    }

    let options = CompileOptions::default()
        .optimize(!cli.no_opt)
        .allow_conditional_assignment(cli.allow_conditional_assignment);
    let mut cb = Codeblock::with_options(options);

    if let Err(e) = cb.compile(&cli.text) {
        eprintln!("Compile error e{}: {}", e.code(), e.kind);
        eprintln!("  detail: {}", e.detail);
        std::process::exit(1);
    }

    if let Some(program) = cb.program() {
        if cli.bc {
            print_listing(program);
            println!();
        }
        if cli.stats {
            for line in bc_stats(program) {
                println!("{}", line);
            }
            println!();
        }
    }

    let value = cb.eval(&cli.args);

    match cb.last_error() {
        ErrorKind::None => {}
        ErrorKind::StackMemoryLeak => {
            eprintln!("Warning: {} ({})", cb.last_error(), cb.error_detail());
        }
        kind => {
            eprintln!("Runtime error e{}: {}", kind.code(), kind);
            eprintln!("  detail: {}", cb.error_detail());
            std::process::exit(1);
        }
    }

    println!("{}", value);
}

fn dump_tokens(cli: &Cli) {
    let clauses = match extract_clauses(&cli.text) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Compile error e{}: {}", e.code(), e.kind);
            eprintln!("  detail: {}", e.detail);
            std::process::exit(1);
        }
    };

    let mut dumper = TokenDumper::new();
    if cli.no_color {
        dumper = dumper.no_color();
    }
    if cli.pretty {
        dumper = dumper.pretty();
    }

    println!("-- params --");
    dumper.dump(&tokenize(&clauses.params));
    println!("-- body --");
    dumper.dump(&tokenize(&clauses.body));
}
