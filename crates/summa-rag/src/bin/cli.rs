//! summa-rag command-line interface
//!
//! Run with: cargo run -p summa-rag --features cli -- <command>
//!
//! ```bash
//! summa-rag ingest notes.txt report.md
//! summa-rag search "how are borrows checked" -k 3
//! summa-rag answer "what does the report conclude?"
//! summa-rag summarize report.md
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use summa_rag::{
    AnswerGenerator, Document, HybridSearcher, IngestPipeline, RagConfig, RagContext,
    RecursiveSummarizer,
};

/// Hybrid retrieval and recursive summarization over local documents
#[derive(Parser)]
#[command(name = "summa-rag", version, about)]
struct Cli {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed, index and summarize text files
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Hybrid search over the ingested chunks
    Search {
        query: String,
        /// Number of results (config `retrieval.top_k` when omitted)
        #[arg(short)]
        k: Option<usize>,
    },
    /// Answer a question from retrieved context
    Answer {
        question: String,
        #[arg(short)]
        k: Option<usize>,
    },
    /// Summarize files without indexing them (several files are summarized together)
    Summarize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Check that the model and index backends are reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "summa_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => RagConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RagConfig::default(),
    }
    .with_env_overrides()?;

    let ctx = RagContext::from_config(config)?;
    let top_k = ctx.config().retrieval.top_k;

    match cli.command {
        Command::Ingest { files } => {
            let pipeline = IngestPipeline::new(ctx.clone());

            for path in files {
                let document = load_document(&path).await?;
                let report = pipeline.ingest(document).await?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!("{}: {} chunks\n{}\n", report.source, report.chunks, report.summary);
                }
            }
        }
        Command::Search { query, k } => {
            ctx.restore_index().await?;
            let results = HybridSearcher::new(ctx).search(&query, k.unwrap_or(top_k)).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No results.");
            } else {
                for (i, r) in results.iter().enumerate() {
                    let source = r.metadata.get("source").and_then(|v| v.as_str()).unwrap_or("?");
                    println!(
                        "{}. [{:.3}] {} (vector {:.3}, rerank {:.3})\n   {}",
                        i + 1,
                        r.final_score,
                        source,
                        r.vector_score,
                        r.rerank_score,
                        r.content.replace('\n', " ")
                    );
                }
            }
        }
        Command::Answer { question, k } => {
            ctx.restore_index().await?;
            let answer = AnswerGenerator::new(ctx).answer(&question, k.unwrap_or(top_k)).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}\n\nSources:", answer.answer);
                for (i, r) in answer.context.iter().enumerate() {
                    let source = r.metadata.get("source").and_then(|v| v.as_str()).unwrap_or("?");
                    println!("  Document {}: {}", i + 1, source);
                }
            }
        }
        Command::Summarize { files } => {
            let mut documents = Vec::with_capacity(files.len());
            for path in &files {
                documents.push(load_document(path).await?);
            }

            let summarizer = RecursiveSummarizer::from_context(&ctx);
            let summary = match documents.as_slice() {
                [single] => summarizer.summarize_document(single).await,
                many => summarizer.summarize_documents(many).await,
            };

            if cli.json {
                println!("{}", serde_json::json!({ "summary": summary }));
            } else {
                println!("{}", summary);
            }
        }
        Command::Health => {
            let embedder = ctx.embedder().health_check().await.unwrap_or(false);
            let generator = ctx.generator().health_check().await.unwrap_or(false);
            let index = match ctx.restore_index().await {
                Ok(true) => match ctx.index() {
                    Some(index) => status(index.health_check().await.unwrap_or(false)),
                    None => status(false),
                },
                Ok(false) => "not created yet",
                Err(e) => {
                    tracing::warn!("Vector index unavailable: {}", e);
                    status(false)
                }
            };

            println!("embedder ({}): {}", ctx.embedder().name(), status(embedder));
            println!("generator ({}): {}", ctx.generator().model(), status(generator));
            println!("vector index: {}", index);
        }
    }

    Ok(())
}

async fn load_document(path: &Path) -> Result<Document> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(Document::new(path.display().to_string(), content))
}

fn status(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "unavailable"
    }
}
