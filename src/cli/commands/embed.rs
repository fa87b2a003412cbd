//! Embed Command
//!
//! Run the batch embedding function over one invocation payload.
//!
//! Usage:
//!   lograg embed [--input events.json] [--output enriched.json] [--request-id ID]
//!
//! Reads `{"events": [...]}` from the input file (stdin when omitted) and writes
//! the enriched payload as JSON to the output file (stdout when omitted).

use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::ai::{BedrockProvider, EmbeddingClient, UsageTracker};
use crate::cli::ui::output::Output;
use crate::config::{BatchConfig, ConfigLoader};
use crate::logging;
use crate::pipeline::{BatchOrchestrator, BatchReport};
use crate::types::{BatchPayload, CorrelationId, Result};

pub fn run(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    request_id: Option<String>,
) -> Result<()> {
    let config = ConfigLoader::resolve_batch()?;
    logging::init(&config.logging_settings());

    let payload = read_payload(input.as_deref())?;
    let request_id = request_id
        .map(CorrelationId::from)
        .unwrap_or_else(CorrelationId::unknown);

    let rt = Runtime::new()?;
    let (enriched, report) = rt.block_on(execute(&config, payload, &request_id));

    let json = serde_json::to_string(&enriched)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            print_report(&report, &path);
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn execute(
    config: &BatchConfig,
    payload: BatchPayload,
    request_id: &CorrelationId,
) -> (BatchPayload, BatchReport) {
    let provider =
        BedrockProvider::connect(&config.runtime_settings(), &config.bedrock_model_id).await;
    let client = EmbeddingClient::new(
        provider,
        config.embedding_settings(),
        UsageTracker::new(config.usage_limits()),
    );

    let mut orchestrator = BatchOrchestrator::new(client, config.batch_size());
    if config.enable_detailed_logging {
        orchestrator = orchestrator.with_debug_config(config.debug_info());
    }

    orchestrator.handle(payload, request_id).await
}

fn read_payload(input: Option<&Path>) -> Result<BatchPayload> {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&content)?)
}

fn print_report(report: &BatchReport, path: &Path) {
    let output = Output::new();
    if report.failed == 0 {
        output.success(&format!(
            "Embedded {} records → {}",
            report.successful,
            path.display()
        ));
    } else {
        output.warning(&format!(
            "Embedded {}/{} records ({}% success) → {}",
            report.successful,
            report.total,
            report.success_rate,
            path.display()
        ));
    }
}
