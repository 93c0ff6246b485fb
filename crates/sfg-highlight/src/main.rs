use std::env;

use anyhow::Context;
use sfg_highlight::stdio::run_stdio;
use sfg_highlight::{GainSummary, HighlightConfig, HighlightSession, SfgGraph};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: sfg-highlight --stdio | sfg-highlight <elements.json> <source> <target>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HighlightConfig::from_env();

    // stdout carries protocol output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--stdio") {
        tracing::info!("Starting sfg-highlight (stdio mode)");
        return run_stdio(config).await;
    }

    let [path, source, target] = args.as_slice() else {
        anyhow::bail!(USAGE);
    };

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read elements file: {}", path))?;
    let mut graph = SfgGraph::from_json(&json)?;
    let mut summary = GainSummary::default();
    let mut session = HighlightSession::new(&config);

    let outcome = session.highlight(&mut graph, &mut summary, source, target)?;
    if let Some(message) = outcome.message() {
        eprintln!("{}", message);
    }

    let report = serde_json::json!({
        "outcome": outcome,
        "summary": summary,
        "tags": graph
            .tagged_elements()
            .into_iter()
            .map(|(element, tags)| serde_json::json!({
                "element": element,
                "classes": tags.iter().map(|t| t.class_name()).collect::<Vec<_>>(),
            }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
