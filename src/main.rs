use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chunkwise::store::{self, AnswerStore};
use chunkwise::{
    ChatError, ConfigError, Document, DocumentError, InterpreterBuilder, OpenAiClientBuilder,
    Question, Settings,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Question asked when none is given on the command line.
const DEFAULT_QUESTION: &str = "请用以下模板概括该文档，并将其中的占位符填入具体信息；若文中未提及某项，请写‘未说明’；\
若涉及到专业词汇，请在结尾处统一进行解释：[xxxx年]，[xx大学/研究机构]的[xx作者等]\
针对[研究问题]，采用[研究手段/方法]，对[研究对象或范围]进行了研究，并发现/得出[主要结论]。";

/// chunkwise - ask an LLM questions about long markdown documents, chunk by chunk
#[derive(Parser)]
#[command(name = "chunkwise")]
#[command(about = "Interpret long markdown documents with an LLM, one chunk at a time")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Answer questions about a markdown document and append them to the answer file
    Interpret(InterpretCommand),
    /// Print the answers recorded in an answer file
    Show(ShowCommand),
}

/// Interpret a markdown document
#[derive(Parser)]
struct InterpretCommand {
    /// Markdown file to interpret (defaults to CHUNKWISE_MD_PATH)
    #[arg(long, value_name = "PATH")]
    md_path: Option<PathBuf>,

    /// Question to ask; repeat for several. Defaults to a structured summary request
    #[arg(short, long = "question", value_name = "TEXT")]
    questions: Vec<String>,

    /// Answer file (defaults to interpretation_results.md next to the document)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Chat model name
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Maximum chunk length in characters (at least 1)
    #[arg(long, value_name = "N")]
    chunk_size: Option<NonZeroUsize>,

    /// Seconds to pause after each chunk request
    #[arg(long, value_name = "SECS")]
    pause_secs: Option<u64>,
}

/// Show recorded answers
#[derive(Parser)]
struct ShowCommand {
    /// Answer file to read
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Markdown document whose answer file should be read
    #[arg(long, value_name = "PATH", conflicts_with = "output")]
    md_path: Option<PathBuf>,

    /// Print only the questions
    #[arg(long)]
    questions_only: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Interpret(cmd) => handle_interpret(cmd),
        Commands::Show(cmd) => handle_show(cmd),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Installs the process-wide log subscriber, writing to stderr.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are configuration and input problems the user can fix:
/// a missing document or API key, bad settings, empty questions.
fn is_user_error(error: &anyhow::Error) -> bool {
    let typed = error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<DocumentError>(),
            Some(DocumentError::NotFound(_))
        ) || matches!(
            cause.downcast_ref::<ChatError>(),
            Some(ChatError::MissingApiKey | ChatError::InvalidUrl(_))
        ) || cause.downcast_ref::<ConfigError>().is_some()
    });
    if typed {
        return true;
    }

    let error_msg = error.to_string();
    error_msg.contains("cannot be empty")
        || error_msg.contains("must fit on one line")
        || error_msg.contains("Answer file not found")
}

/// Handles the interpret command.
fn handle_interpret(cmd: &InterpretCommand) -> Result<()> {
    let questions = collect_questions(&cmd.questions)?;
    let settings = Settings::load().context("Failed to load settings")?;
    settings.ensure_files_root().with_context(|| {
        format!(
            "Failed to create files directory: {}",
            settings.files_root.display()
        )
    })?;

    let md_path = cmd
        .md_path
        .clone()
        .unwrap_or_else(|| settings.default_md_path.clone());
    let document = Document::read(&md_path)?;
    let output = cmd
        .output
        .clone()
        .unwrap_or_else(|| store::output_path_for(&md_path));

    let mut client = OpenAiClientBuilder::new();
    if let Some(key) = &settings.openai_api_key {
        client = client.api_key(key);
    }
    if let Some(url) = &settings.openai_base_url {
        client = client.base_url(url);
    }
    let client = client.build().context("Failed to create chat client")?;

    let interpreter = InterpreterBuilder::new()
        .client(Arc::new(client))
        .model(cmd.model.clone().unwrap_or(settings.model))
        .chunk_size(cmd.chunk_size.map_or(settings.chunk_size, NonZeroUsize::get))
        .chunk_pause(
            cmd.pause_secs
                .map(Duration::from_secs)
                .unwrap_or(settings.chunk_pause),
        )
        .build();

    info!(
        document = %md_path.display(),
        output = %output.display(),
        questions = questions.len(),
        "Starting interpretation"
    );
    let sections = interpreter.interpret(Some(&document), &questions, &output);

    if sections.is_empty() {
        println!("No new answers; all questions are already in {}", output.display());
    } else {
        print!("{}", sections);
    }
    info!("Interpretation finished");

    Ok(())
}

/// Handles the show command.
fn handle_show(cmd: &ShowCommand) -> Result<()> {
    let path = match (&cmd.output, &cmd.md_path) {
        (Some(output), _) => output.clone(),
        (None, Some(md_path)) => store::output_path_for(md_path),
        (None, None) => {
            let settings = Settings::load().context("Failed to load settings")?;
            store::output_path_for(&settings.default_md_path)
        }
    };

    print!("{}", render_show(&path, cmd.questions_only)?);
    Ok(())
}

/// Renders the contents of the answer file at `path` for display.
fn render_show(path: &Path, questions_only: bool) -> Result<String> {
    if !path.is_file() {
        anyhow::bail!("Answer file not found: {}", path.display());
    }

    let answers = AnswerStore::load(path);
    let mut out = String::new();
    for (question, answer) in answers.iter() {
        if questions_only {
            out.push_str(&format!("- {}\n", question));
        } else {
            out.push_str(&store::render_section(question, answer));
        }
    }
    Ok(out)
}

/// Turns command-line question text into questions, defaulting to the summary question.
///
/// Each question becomes its answer file heading, so it must fit on one line
/// and still have text once a leading `Q:` marker is dropped.
fn collect_questions(raw: &[String]) -> Result<Vec<Question>> {
    if raw.is_empty() {
        return Ok(vec![Question::from(DEFAULT_QUESTION)]);
    }

    raw.iter()
        .map(|text| {
            if text.contains(['\n', '\r']) {
                anyhow::bail!("Question must fit on one line: {:?}", text);
            }
            let question = store::normalize_question(text);
            if question.is_empty() {
                anyhow::bail!("Question cannot be empty");
            }
            Ok(question)
        })
        .collect()
}
