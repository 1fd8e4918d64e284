use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use pdf_quiz::generator::check_question_count;
use pdf_quiz::{logging, save_bank_to_json, Config, PdfSource, Pipeline, Quiz};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick a topic and take generated quizzes in the terminal
    Build {
        #[command(flatten)]
        request: Request,

        /// Save the last quiz shown to this file on exit
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Generate a question bank without the terminal UI
    Generate {
        #[command(flatten)]
        request: Request,

        /// Write the bank here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Take a quiz from a saved question bank
    Take {
        /// JSON file to load the questions from
        bank: PathBuf,
    },
}

#[derive(Args, Debug)]
struct Request {
    /// PDF files to build the quiz from
    #[arg(long = "pdf", required = true, num_args = 1..)]
    pdfs: Vec<PathBuf>,

    /// Quiz topic
    #[arg(short, long, default_value = "")]
    topic: String,

    /// Number of questions
    #[arg(short = 'n', long, default_value_t = 5)]
    questions: usize,
}

impl Request {
    /// Requested question count, rejected outside `1..=MAX_QUESTIONS`.
    fn question_count(&self) -> pdf_quiz::Result<usize> {
        check_question_count(self.questions)?;
        Ok(self.questions)
    }
}

#[derive(Args, Debug)]
struct Settings {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true, env = "QUIZ_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, global = true, env = "QUIZ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat model name
    #[arg(long, global = true)]
    model: Option<String>,

    #[arg(long, global = true)]
    embedding_model: Option<String>,

    #[arg(long, global = true)]
    temperature: Option<f32>,

    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,

    /// Chunks retrieved as prompt context
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Model calls allowed per question before giving up, 0 for no limit
    #[arg(long, global = true)]
    max_rounds_per_question: Option<usize>,

    #[arg(long, global = true, default_value = "pdf-quiz.log")]
    log_file: PathBuf,
}

impl Settings {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.model.base_url = base_url.clone();
            config.embedding.base_url = base_url.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.model.api_key = Some(api_key.clone());
            config.embedding.api_key = Some(api_key.clone());
        }
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }
        if let Some(model) = &self.embedding_model {
            config.embedding.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            config.model.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.model.max_tokens = max_tokens;
        }
        if let Some(size) = self.chunk_size {
            config.splitter.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.splitter.chunk_overlap = overlap;
        }
        if let Some(top_k) = self.top_k {
            config.generation.top_k = top_k;
        }
        if let Some(rounds) = self.max_rounds_per_question {
            config.generation.max_rounds_per_question = rounds;
        }

        config.validate()?;
        Ok(config)
    }
}

fn ingest(config: Config, pdfs: Vec<PathBuf>) -> anyhow::Result<Pipeline> {
    let mut pipeline = Pipeline::from_config(config)?;
    let pages = pipeline.ingest(&PdfSource::new(pdfs))?;
    if pages == 0 {
        bail!("the given PDFs contain no extractable text");
    }
    Ok(pipeline)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logging::init(&cli.settings.log_file)
        .with_context(|| format!("failed to open log file {}", cli.settings.log_file.display()))?;

    match cli.command {
        Command::Build { request, save } => {
            let questions = request.question_count()?;
            let config = cli.settings.load_config()?;
            let pipeline = ingest(config, request.pdfs)?;

            let last_bank = Quiz::builder(pipeline, request.topic, questions).run().await?;
            if let (Some(path), Some(bank)) = (save, last_bank) {
                save_bank_to_json(&bank, &path)?;
                eprintln!("Saved {} questions to {}", bank.len(), path.display());
            }
        }
        Command::Generate { request, output } => {
            let questions = request.question_count()?;
            let config = cli.settings.load_config()?;
            let mut pipeline = ingest(config, request.pdfs)?;
            let generation = pipeline.generate(&request.topic, questions).await?;

            match output {
                Some(path) => {
                    save_bank_to_json(&generation.bank, &path)?;
                    eprintln!(
                        "Wrote {} questions to {} ({} model calls)",
                        generation.bank.len(),
                        path.display(),
                        generation.stats.model_calls
                    );
                }
                None => {
                    let json = serde_json::to_string_pretty(&generation.bank)?;
                    writeln!(io::stdout(), "{}", json)?;
                }
            }
        }
        Command::Take { bank } => {
            let quiz = Quiz::from_json(&bank)
                .with_context(|| format!("failed to load questions from {}", bank.display()))?;
            quiz.run().await?;
        }
    }

    Ok(())
}
