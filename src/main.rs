use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};

use dendron::backend::{self, Backend};
use dendron::bytecode;
use dendron::config::{BackendSelection, Config};
use dendron::lexer;
use dendron::report::WriterReporter;
use dendron::session::Session;

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::from_args(std::env::args().skip(1))?;
    let source = match config.input_path.as_deref() {
        Some(path) if path != "-" => {
            fs::read_to_string(path).with_context(|| format!("Reading {path}"))?
        }
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Reading stdin")?;
            buffer
        }
    };

    let selected: Vec<Box<dyn Backend>> = match &config.backends {
        BackendSelection::All => backend::backends(),
        BackendSelection::One(name) => vec![
            backend::backend_by_name(name)
                .ok_or_else(|| anyhow!("Unknown backend '{name}'"))?,
        ],
    };

    let mut reporter = WriterReporter::new(io::stdout(), io::stderr());
    let mut session = Session::new(config.parse_options(), &mut reporter);

    let tokens = lexer::tokenize(&source);
    let Some(program) = session.parse(&tokens) else {
        return Ok(ExitCode::FAILURE);
    };

    if config.show_tree {
        println!("The program, with expressions in infix notation:\n");
        println!("{program}");
    }
    if config.show_code {
        println!("Compiled code:");
        println!("{}", bytecode::compile(&program));
    }

    for backend in &selected {
        session.execute(backend.as_ref(), &program);
    }

    Ok(if session.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
