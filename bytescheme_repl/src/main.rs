use std::path::{Path, PathBuf};

use anyhow::Context;
use bytescheme::{
    compiler::compile, general_parser::ParseError, Datum, Program, SyntaxError, Treewalk,
};
use clap::{Parser, Subcommand};
use codesnake::{Block, CodeWidth, Label, LineIndex};
use rustyline::error::ReadlineError;
use yansi::Paint;

#[derive(Parser)]
#[command(version, about = "A small Scheme with an interpreter and a Rust code generator")]
struct Cli {
    /// Without a command, an interactive session starts
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a program into Rust source, written next to it as `<name>.rs`
    Compile {
        // the count is checked by hand
        #[arg(value_name = "SOURCE")]
        sources: Vec<PathBuf>,
    },
    /// Interpret a program, printing the values of its top-level expressions
    Run { source: PathBuf },
}

fn make_block<'a>(idx: &'a LineIndex, errors: &[ParseError]) -> Option<Block<&'a str, String>> {
    let mut errors = errors.to_vec();
    errors.sort_by_key(|error| error.span().start);
    Block::new(
        idx,
        errors.into_iter().map(|error| {
            Label::new(error.span())
                .with_text(error.to_string().red().to_string())
                .with_style(|s| s.red().to_string())
        }),
    )
}

fn report_syntax(source: &str, name: &str, error: &SyntaxError) {
    if let SyntaxError::Parse(errors) = error {
        let idx = LineIndex::new(source);
        if let Some(block) = make_block(&idx, errors) {
            let block = block.map_code(|c| CodeWidth::new(c, c.len()));
            eprintln!("{}[{name}]", block.prologue());
            eprint!("{block}");
            eprintln!("{}", block.epilogue());
            return;
        }
    }
    eprintln!("{}", error.red());
}

fn print_values(values: &[Datum]) {
    let text = values
        .iter()
        .map(ToString::to_string)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !text.is_empty() {
        println!("{text}");
    }
}

/// Runs `source` form by form, returning whether every form succeeded
fn evaluate(treewalk: &mut Treewalk, source: &str, name: &str) -> bool {
    let program = match Program::parse(source) {
        Ok(program) => program,
        Err(error) => {
            report_syntax(source, name, &error);
            return false;
        }
    };

    let mut values = vec![];
    for form in &program.forms {
        if let Err(error) = treewalk.execute(form, &mut values) {
            print_values(&values);
            eprintln!("{}", error.red());
            return false;
        }
    }
    print_values(&values);
    true
}

fn repl() -> anyhow::Result<()> {
    println!("Welcome to ByteScheme. Enter \"exit\" to quit.");
    let mut readline = rustyline::DefaultEditor::new()?;
    let mut treewalk = Treewalk::new();

    loop {
        match readline.readline("> ") {
            Ok(input) if input.trim().eq_ignore_ascii_case("exit") => break,
            Ok(input) => {
                _ = readline.add_history_entry(input.as_str());
                evaluate(&mut treewalk, &input, "repl");
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => return Err(error.into()),
        }
    }

    println!("Bye!");
    Ok(())
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

fn compile_file(source: &Path) -> anyhow::Result<bool> {
    let text = read_source(source)?;
    let name = source.display().to_string();
    let program = match Program::parse(&text) {
        Ok(program) => program,
        Err(error) => {
            report_syntax(&text, &name, &error);
            return Ok(false);
        }
    };
    let code = match compile(&program) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error.red());
            return Ok(false);
        }
    };

    let file_name = source
        .file_name()
        .map_or_else(|| name.clone(), |file| file.to_string_lossy().into_owned());
    let target = source.with_extension("rs");
    std::fs::write(&target, code.render(&file_name))
        .with_context(|| format!("could not write {}", target.display()))?;
    println!("Wrote {}", target.display());
    Ok(true)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let succeeded = match cli.command {
        None => return repl(),
        Some(Command::Compile { sources }) => match sources.as_slice() {
            [source] => compile_file(source)?,
            _ => {
                eprintln!("Received wrong number of arguments");
                false
            }
        },
        Some(Command::Run { source }) => {
            let text = read_source(&source)?;
            evaluate(&mut Treewalk::new(), &text, &source.display().to_string())
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
