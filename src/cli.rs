use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input .amod model file
    pub input: PathBuf,

    /// Output directory for the generated code
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Framework(s) to generate code for ("all", "ccm", "pyactr", "vanilla")
    #[arg(short, long, default_value = "all")]
    pub framework: Vec<String>,

    /// Initial goal buffer contents, overriding the model's initializer
    /// (e.g. "[countFrom: 2 5 starting]")
    #[arg(short, long)]
    pub goal: Option<String>,

    /// Output issues as JSON
    #[arg(long)]
    pub json: bool,
}
