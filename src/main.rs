//! # Folha CLI
//!
//! Usage:
//!   folha form.json -o Folha_de_Testemunho.pdf
//!   echo '{ ... }' | folha
//!   folha --example > form.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use folha::model::OUTPUT_FILE_NAME;
use folha::{FormDocument, GenerationStatus, Generator};

#[derive(Parser)]
#[command(name = "folha")]
#[command(version)]
#[command(about = "Generate the Folha de Testemunho PDF from a JSON form", long_about = None)]
struct Cli {
    /// Form JSON file (stdin if not specified)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PDF file
    #[arg(short, long, value_name = "FILE", default_value = OUTPUT_FILE_NAME)]
    output: PathBuf,

    /// Print a sample form and exit
    #[arg(long)]
    example: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", default_level)).init();

    if cli.example {
        print!("{}", example_form_json());
        return ExitCode::SUCCESS;
    }

    let input = match read_input(cli.input.as_ref()) {
        Ok(input) => input,
        Err(e) => {
            log::error!("Failed to read input: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let document = match FormDocument::from_json(&input) {
        Ok(document) => document,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", GenerationStatus::Failure.message());
            return ExitCode::FAILURE;
        }
    };

    let generator = Generator::new();
    let result = generator.generate_document_to_path(document, &cli.output);
    if let Some(message) = generator.last_message() {
        eprintln!("{}", message);
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn read_input(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn example_form_json() -> &'static str {
    r##"{
  "testimonyName": "Cura",
  "testimonyTime": "19:30 - 20/06/2024",
  "beforeText": "Descreva aqui como era a situação antes.\nCada linha em branco é preservada.",
  "afterText": "Descreva aqui o que mudou depois.",
  "dayImage": { "src": "./logo.jpg" },
  "beforeImages": [
    { "src": "./antes-1.jpg" },
    { "src": "./antes-2.png" }
  ],
  "afterImages": [
    { "src": "./depois-1.jpg" },
    { "src": "data:image/png;base64,iVBORw0KGgo...", "mime": "image/png" }
  ],
  "page": { "size": "A4", "margin": 15 },
  "metadata": {
    "title": "Folha de Testemunho",
    "author": "Folha"
  }
}
"##
}
