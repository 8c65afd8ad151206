mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use prompt_chain::domain::ports::LlmService;
use prompt_chain::domain::{Conversation, DomainError};
use prompt_chain::infrastructure::config::ensure_api_key;
use prompt_chain::infrastructure::{
    init_tracing, AppConfig, FileSource, GeminiLlm, TextEmbedding, TimeoutLlm,
};
use prompt_chain::lessons::{run_chat_loop, sample_history, Lessons, STUDENT_SCHEMA};
use serde::Serialize;
use tracing::{error, info};

use cli::{Cli, Commands, MemoryCommand, ParseCommand, RagCommand};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = match &cli.config_dir {
        Some(dir) => AppConfig::load_from(dir),
        None => AppConfig::load(),
    }
    .context("failed to load configuration")?;
    // Still single-threaded: the runtime has not started yet.
    ensure_api_key()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?
        .block_on(run_lessons(cli.command, config))
}

async fn run_lessons(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(config.config.llm.timeout_seconds);
    let llm: Arc<dyn LlmService> = Arc::new(TimeoutLlm::new(
        Arc::new(GeminiLlm::from_config(&config.config.llm)),
        timeout,
    ));
    let embedding = Arc::new(TextEmbedding::from_config(&config.config.embedding).with_timeout(timeout));
    info!(model = %config.config.llm.model, "lessons ready");

    let lessons = Lessons::new(config, llm, embedding);
    if let Err(e) = run(command, &lessons).await {
        error!(error = %e, kind = ?e.kind(), "lesson failed");
        return Err(e.into());
    }
    Ok(())
}

async fn run(command: Commands, lessons: &Lessons) -> Result<(), DomainError> {
    match command {
        Commands::Ask { question } => println!("{}", lessons.ask(&question).await?),
        Commands::Joke { word } => println!("{}", lessons.joke(&word).await?),
        Commands::Parse { kind } => match kind {
            ParseCommand::String { word } => println!("{}", lessons.parse_string(&word).await?),
            ParseCommand::List { word } => print_json(&lessons.parse_list(&word).await?)?,
            ParseCommand::Person { phrase } => print_json(&lessons.parse_person(&phrase).await?)?,
            ParseCommand::Recipe { phrase } => print_json(&lessons.parse_recipe(&phrase).await?)?,
        },
        Commands::Rag { mode } => match mode {
            RagCommand::Bare { question } => println!("{}", lessons.rag_bare(&question).await?),
            RagCommand::Inline { question } => {
                println!("{}", lessons.rag_inline(&question).await?)
            }
            RagCommand::File { question, path } => {
                let output = lessons
                    .rag_retrieval(&FileSource::single(path), &question)
                    .await?;
                print_json(&output)?;
            }
        },
        Commands::History {
            question,
            path,
            top_k,
        } => {
            let output = lessons
                .rag_history(&FileSource::single(path), &question, &sample_history(), top_k)
                .await?;
            print_json(&output)?;
        }
        Commands::Memory { mode } => {
            let replies = match mode {
                MemoryCommand::Buffer { inputs } => lessons.memory_buffer(&inputs).await?,
                MemoryCommand::Runnable { inputs } => lessons.memory_runnable(&inputs).await?,
            };
            for reply in replies {
                println!("{reply}");
            }
        }
        Commands::Agent { path } => {
            let session = lessons.agent_session(&FileSource::single(path)).await?;
            let mut conversation = Conversation::new();
            run_chat_loop(
                &session,
                &mut conversation,
                tokio::io::BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await?;
        }
        Commands::Evaluate { topic } => println!("{}", lessons.evaluate(&topic).await?),
        Commands::Sql {
            request,
            columns,
            schema,
        } => {
            let schema = match schema {
                Some(path) => tokio::fs::read_to_string(&path).await.map_err(|e| {
                    DomainError::configuration(format!("{}: {e}", path.display()))
                })?,
                None => STUDENT_SCHEMA.to_string(),
            };
            println!("{}", lessons.sql(&schema, &request, &columns).await?);
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DomainError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| DomainError::internal(format!("failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}
