use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use transit_agents::{AgentConfig, RailAgent, DEFAULT_MAX_TOOL_ROUNDS};
use transit_core::Conversation;
use transit_llm::{
    HashEmbedder, OpenAiClient, OpenAiConfig, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_TIMEOUT_SECS,
};
use transit_observability::{init_tracing, AppMetrics, TracingFlag};
use transit_retrieval::{
    DocumentSources, Embedder, RetrievalIndex, DEFAULT_POLICY_PATH, DEFAULT_SCHEDULE_PATH,
    DEFAULT_TOP_K,
};

#[derive(Debug, Parser)]
#[command(name = "transitsense")]
#[command(about = "TransitSense railway assistant")]
struct Cli {
    #[arg(long, env = "TRANSIT_SCHEDULE_PATH", default_value = DEFAULT_SCHEDULE_PATH)]
    schedule: PathBuf,

    #[arg(long, env = "TRANSIT_POLICY_PATH", default_value = DEFAULT_POLICY_PATH)]
    policies: PathBuf,

    #[arg(long, env = "TRANSIT_EMBEDDER", value_enum, default_value_t = EmbedderKind::Openai)]
    embedder: EmbedderKind,

    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_TOOL_ROUNDS)]
    max_tool_rounds: usize,

    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Args)]
struct ProviderArgs {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "TRANSIT_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    chat_model: String,

    #[arg(long, env = "TRANSIT_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    #[arg(long, env = "TRANSIT_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl ProviderArgs {
    fn config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            chat_model: self.chat_model.clone(),
            embedding_model: self.embedding_model.clone(),
            temperature: 0.0,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmbedderKind {
    Openai,
    Hash,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat (default).
    Chat,
    /// Run one retrieval query and print the matching text.
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let tracing_flag = TracingFlag::from_env();
    init_tracing("transitsense", tracing_flag.enabled);
    println!("{}", tracing_flag.banner());

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "fatal error");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let provider = cli.provider.config();
    let index = Arc::new(build_index(&cli, &provider).await?);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let model = OpenAiClient::new(&provider).context("chat model unavailable")?;
            let metrics = AppMetrics::shared();
            let agent = RailAgent::new(
                Arc::new(model),
                index,
                metrics.clone(),
                AgentConfig {
                    top_k: cli.top_k,
                    max_tool_rounds: cli.max_tool_rounds,
                },
            );

            run_chat(&agent).await?;
            let summary = metrics.summary();
            info!(summary = %summary, "session finished");
            println!("Session summary: {summary}");
        }
        Command::Search { query, limit } => {
            let text = index.query(&query, limit.unwrap_or(cli.top_k)).await?;
            println!("{text}");
        }
    }

    Ok(())
}

async fn build_index(cli: &Cli, provider: &OpenAiConfig) -> Result<RetrievalIndex> {
    let make_embedder = || -> Result<Arc<dyn Embedder>> {
        Ok(match cli.embedder {
            EmbedderKind::Openai => {
                Arc::new(OpenAiClient::new(provider).context("embedding provider unavailable")?)
            }
            EmbedderKind::Hash => Arc::new(HashEmbedder::default()),
        })
    };

    let sources = DocumentSources {
        schedule_path: cli.schedule.clone(),
        policy_path: cli.policies.clone(),
    };

    let index = RetrievalIndex::from_sources(&sources, make_embedder)
        .await
        .context("failed building retrieval index")?;

    let stats = index.stats();
    if stats.initialized {
        println!("RAG pipeline ready. Loaded {} chunks.", stats.chunks_loaded);
    } else {
        println!("No documents found to index.");
    }

    Ok(index)
}

async fn run_chat(agent: &RailAgent) -> Result<()> {
    let mut conversation = Conversation::new();

    println!("TransitSense running. Type 'exit' to quit.\n");

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        match agent.handle_turn(&mut conversation, message).await {
            Ok(reply) => println!("\nAI: {}\n", reply.text),
            Err(err) => {
                error!(error = ?err, "turn failed");
                println!("\nAI: Sorry, that request failed: {err:#}\n");
            }
        }
    }

    Ok(())
}
