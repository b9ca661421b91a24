use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use rs_chat_core::{ChatRequest, Generator, GeneratorConfig};

/// Chat with a weights file from the terminal.
///
/// Type a message and press enter; `/reset` starts a new conversation and
/// `/quit` (or end of input) exits.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Weights file name, inside the models directory
    #[arg(short, long, default_value = "weights_dialog_ru_en.json")]
    model: String,

    /// Directory holding the weights files
    #[arg(short = 'd', long, default_value = "./data")]
    models_dir: PathBuf,

    /// Optional TOML configuration; `--models-dir` still applies
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short = 'n', long, default_value_t = 1400)]
    max_tokens: i64,

    #[arg(short, long, default_value_t = 0.30)]
    temperature: f64,

    #[arg(short = 'k', long, default_value_t = 160)]
    top_k: i64,

    #[arg(short = 'p', long, default_value_t = 0.85)]
    top_p: f64,

    /// Repetition penalty (`0` disables it)
    #[arg(short = 'r', long, default_value_t = 1.0)]
    rep_penalty: f64,

    /// Trailing tokens inspected by the repetition penalty
    #[arg(short = 'w', long, default_value_t = 180)]
    rep_window: i64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };
    let generator = Generator::new(config.with_models_dir(&args.models_dir))?;

    // Load once up front so a bad model name fails before the prompt
    let info = generator.model_info(&args.model)?;
    println!("{} loaded (N={}, {} unigrams)", args.model, info.n, info.unigram);

    let mut session = generator.new_session();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/reset" => {
                session.reset();
                println!("(new conversation)");
                continue;
            }
            message => {
                let request = ChatRequest {
                    max_tokens: Some(args.max_tokens),
                    temperature: Some(args.temperature),
                    top_k: Some(args.top_k),
                    top_p: Some(args.top_p),
                    rep_penalty: Some(args.rep_penalty),
                    rep_window: Some(args.rep_window),
                    ..ChatRequest::new(&args.model, message)
                };
                match generator.reply(&mut session, &request) {
                    Ok(response) => println!("{} [{} tokens]", response.reply, response.tokens_generated),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        }
    }

    Ok(())
}
