//! Chat Command
//!
//! Interactive question answering over embedded application logs.
//!
//! Usage:
//!   lograg chat [--secrets .lograg/secrets.toml] [--size 10]
//!
//! Session commands: `/stats` shows usage, `/quit` exits.

use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;

use crate::ai::{BedrockProvider, EmbeddingClient, UsageTracker};
use crate::cli::ui::output::Output;
use crate::config::{ChatConfig, ConfigLoader};
use crate::logging;
use crate::pipeline::ChatSession;
use crate::search::{OpenSearchBackend, QueryCache};
use crate::types::{CorrelationId, Result};

/// Input line classified for the REPL
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Stats,
    Ask(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        "/quit" | "/exit" => Command::Quit,
        "/stats" => Command::Stats,
        _ => Command::Ask(line),
    }
}

pub fn run(secrets: Option<PathBuf>, size: Option<usize>) -> Result<()> {
    let config = ConfigLoader::resolve_chat(secrets.as_deref())?;
    logging::init(&config.logging_settings());

    let rt = Runtime::new()?;
    rt.block_on(session(&config, size))
}

async fn session(config: &ChatConfig, size: Option<usize>) -> Result<()> {
    let output = Output::new();
    let k = config.clamp_search_size(size);

    let embedder = BedrockProvider::connect(
        &config.runtime_settings(),
        &config.bedrock_model_id_embedding,
    )
    .await;
    let synthesizer = embedder.with_model(&config.bedrock_model_id_claude);
    let search = OpenSearchBackend::from_config(config).await?;

    let client = EmbeddingClient::new(
        embedder,
        config.embedding_settings(),
        UsageTracker::new(config.usage_limits()),
    );
    let mut session = ChatSession::new(
        CorrelationId::session(),
        client,
        search,
        synthesizer,
        QueryCache::new(config.enable_query_caching),
        config.max_search_size(),
    );

    output.header(&config.page_title);
    if config.enable_debug_mode {
        output.section("Configuration");
        println!("{}", ConfigLoader::render(&config.debug_info(), false)?);
    }
    output.info(&format!(
        "Session {} · top {} logs per question · /stats for usage · /quit to exit",
        session.session_id(),
        k
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Command::Quit => break,
            Command::Stats => output.usage(&session.usage(), &session.cache_stats()),
            Command::Ask(question) => {
                if !question.trim().is_empty() {
                    output.step("Analyzing logs...");
                }
                let outcome = session.ask(question, k).await;
                output.outcome(&outcome);
            }
        }
    }

    let summary = session.finish();
    output.usage(&summary, &session.cache_stats());
    Ok(())
}
