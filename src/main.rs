use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use kunyu::config::{RuntimeConfig, DEFAULT_MAX_CALL_DEPTH};
use kunyu::diagnostics;
use kunyu::interpreter::Interpreter;
use kunyu::keywords::{load_keywords, spelling_of, Keywords};
use kunyu::scanner::token::Keyword;
use kunyu::{parse, tokenize_with};
use rustyline::DefaultEditor;
use std::fs;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "kunyu", version)]
#[command(about = "The Kunyu (坤舆) programming language")]
struct Cli {
    /// Script file to run (omit for REPL)
    script: Option<PathBuf>,

    /// Start the REPL after running the script
    #[arg(short, long)]
    interactive: bool,

    /// Print the token stream before running
    #[arg(short = 't', long)]
    tokens: bool,

    /// Parse only, do not evaluate
    #[arg(short, long)]
    check: bool,

    /// Path to keywords JSON file
    #[arg(short, long)]
    keywords: Option<PathBuf>,

    /// Maximum nesting of user function calls
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let keywords = load_keywords(cli.keywords.as_deref())?;
    let runtime_config = RuntimeConfig {
        max_call_depth: cli.max_call_depth,
    };
    let mut interpreter = Interpreter::new(io::stdout(), runtime_config);

    let mut ok = true;
    if let Some(path) = &cli.script {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("could not read '{}'", path.display()))?;
        ok = run(&contents, &keywords, &mut interpreter, &cli);
    }

    if cli.script.is_none() || cli.interactive {
        run_prompt(&keywords, &mut interpreter, &cli)?;
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

// Logs go to stderr so they never mix with program output.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("KUNYU_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn run_prompt(keywords: &Keywords, interpreter: &mut Interpreter<Stdout>, cli: &Cli) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut buffer = String::new();

    let history_path = dirs::home_dir().map(|p| p.join(".kunyu_history"));
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = if buffer.is_empty() { "坤舆> " } else { "  ... " };

        match rl.readline(prompt) {
            Ok(line) => {
                buffer.push_str(&line);
                buffer.push('\n');

                if is_complete(&buffer) {
                    let input = buffer.trim();
                    if !input.is_empty() {
                        let _ = rl.add_history_entry(input);
                        let source = as_statement(input, keywords);
                        run(&source, keywords, interpreter, cli);
                    }
                    buffer.clear();
                }
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                buffer.clear();
                println!("^C");
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

// A bare expression typed at the prompt is printed, the way a calculator would.
fn as_statement(input: &str, keywords: &Keywords) -> String {
    if input.ends_with(';') || input.ends_with('}') {
        return input.to_string();
    }
    let print = spelling_of(keywords, Keyword::Print).unwrap_or("输出");
    format!("{} {};", print, input)
}

fn is_complete(code: &str) -> bool {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;

    for c in code.chars() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '#' => in_comment = true,
            '{' | '(' => depth += 1,
            '}' | ')' => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string
}

/// Tokenizes, parses and evaluates, reporting the first error. Returns whether it succeeded.
fn run(source: &str, keywords: &Keywords, interpreter: &mut Interpreter<Stdout>, cli: &Cli) -> bool {
    let result = (|| -> Result<(), kunyu::Error> {
        let tokens = tokenize_with(source, keywords)?;
        if cli.tokens {
            tokens.iter().for_each(|token| println!("{}", token));
        }

        let program = parse(tokens)?;
        if cli.check {
            return Ok(());
        }

        interpreter.evaluate(&program)?;
        Ok(())
    })();

    match result {
        Ok(()) => true,
        Err(e) => {
            eprint!("{}", diagnostics::report(source, &e));
            false
        }
    }
}
