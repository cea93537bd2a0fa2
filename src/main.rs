use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use diffstream::DiffParser;

#[derive(Parser)]
#[command(name = "diffstream")]
#[command(about = "Parse git diff output into structured JSON records")]
struct Cli {
    /// Diff file to read (defaults to standard input)
    input: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let text = match cli.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    for record in DiffParser::new(text.lines()) {
        println!("{}", serde_json::to_string(&record?)?);
    }

    Ok(())
}
