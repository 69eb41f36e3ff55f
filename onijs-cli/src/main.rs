use std::{process, str::FromStr};

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{LevelFilter, debug};
use onijs::{Diagnostic, Lexer, Options, ParseOptions, parse_with, transpile_debug, transpile_with};

#[derive(Parser, Debug)]
#[command(name = "onijs")]
#[command(about = "onijs - convert Onigmo (Ruby) regular expressions to JavaScript")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an Onigmo pattern to a JavaScript regex
    Convert {
        /// The pattern to convert
        pattern: String,
        /// Ruby option letters, e.g. "mi"
        #[arg(short, long, default_value = "")]
        flags: String,
        /// Add the JavaScript global flag
        #[arg(short, long)]
        global: bool,
        /// Show the tree and a full report
        #[arg(short, long)]
        debug: bool,
        /// Exit with status 2 if anything was dropped or rewritten
        #[arg(long)]
        strict: bool,
    },
    /// Print the parsed tree of a pattern
    Ast {
        /// The pattern to parse
        pattern: String,
        /// Parse in extended mode
        #[arg(short = 'x', long)]
        extended: bool,
    },
    /// Print the tokens of a pattern
    Tokens {
        /// The pattern to tokenize
        pattern: String,
        /// Tokenize in extended mode
        #[arg(short = 'x', long)]
        extended: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            cli.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!(command:? = cli.command; "Parsed arguments");

    match cli.command {
        Commands::Convert {
            pattern,
            flags,
            global,
            debug,
            strict,
        } => {
            let options = Options::from_flags(&flags).global(global);
            cmd_convert(&pattern, &options, debug, strict)
        }
        Commands::Ast { pattern, extended } => cmd_ast(&pattern, extended),
        Commands::Tokens { pattern, extended } => cmd_tokens(&pattern, extended),
    }
}

fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), error);
    process::exit(1);
}

fn print_warning(warning: &Diagnostic, indent: usize) {
    let pad = " ".repeat(indent);
    println!("{}{} {}", pad, "warning:".yellow().bold(), warning.message);
    println!(
        "{}  at {} {}",
        pad,
        warning.node.path.to_string().dimmed(),
        format!("`{}`", warning.node.source).cyan()
    );
    for related in &warning.related {
        print_warning(related, indent + 4);
    }
}

fn cmd_convert(pattern: &str, options: &Options, debug: bool, strict: bool) {
    let warning_count = if debug {
        let result = transpile_debug(pattern, options).unwrap_or_else(|e| fail(e));
        result.report();
        result.warnings.len()
    } else {
        let regex = transpile_with(pattern, options).unwrap_or_else(|e| fail(e));

        println!("{}", "Output:".bold());
        println!("  {}", regex.to_string().green());
        if regex.has_warnings() {
            println!();
            for warning in &regex.warnings {
                print_warning(warning, 0);
            }
        }
        regex.warnings.len()
    };

    if strict && warning_count > 0 {
        eprintln!(
            "{} {} construct(s) could not be converted exactly",
            "Strict:".red().bold(),
            warning_count
        );
        process::exit(2);
    }
}

fn cmd_ast(pattern: &str, extended: bool) {
    let options = ParseOptions {
        extended,
        ..ParseOptions::default()
    };
    let ast = parse_with(pattern, &options).unwrap_or_else(|e| fail(e));

    println!("{}", "Tree:".bold());
    println!("{:#?}", ast);
}

fn cmd_tokens(pattern: &str, extended: bool) {
    let tokens = Lexer::new(pattern)
        .with_extended(extended)
        .tokenize()
        .unwrap_or_else(|e| fail(e));

    println!("{}", "Tokens:".bold());
    for (token, span) in tokens {
        println!(
            "  {:>3}..{:<3} {}",
            span.start.to_string().dimmed(),
            span.end.to_string().dimmed(),
            token
        );
    }
}
