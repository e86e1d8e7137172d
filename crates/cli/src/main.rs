use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use triage_agents::ClassificationOrchestrator;
use triage_core::{clean_text, remove_stopwords, tokenize_text, EmailInput};
use triage_inference::{GatewaySettings, HuggingFaceGateway};
use triage_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "triage")]
#[command(about = "Classify emails as productive or unproductive and draft a reply")]
struct Cli {
    /// Upper bound for each model call, in seconds.
    #[arg(long, env = "TRIAGE_STAGE_TIMEOUT_SECONDS", default_value_t = 30)]
    stage_timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify one email; the body is read from stdin when --content is omitted.
    Classify {
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        sender: Option<String>,
    },
    /// Print the normalized form of a text.
    Clean {
        text: String,
        #[arg(long)]
        tokens: bool,
        #[arg(long)]
        drop_stopwords: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("triage_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Classify {
            content,
            subject,
            sender,
        } => {
            let content = match content {
                Some(content) => content,
                None => read_stdin()?,
            };
            let input = EmailInput {
                content,
                subject,
                sender,
            };
            run_classify(input, Duration::from_secs(cli.stage_timeout.max(1))).await?;
        }
        Command::Clean {
            text,
            tokens,
            drop_stopwords,
        } => {
            let mut output = clean_text(&text);
            if tokens {
                output = tokenize_text(&output);
            }
            if drop_stopwords {
                output = remove_stopwords(&output);
            }
            println!("{output}");
        }
    }

    Ok(())
}

async fn run_classify(input: EmailInput, stage_timeout: Duration) -> Result<()> {
    let settings = GatewaySettings::from_env().context("cannot reach the classifier model")?;
    let gateway = HuggingFaceGateway::new(settings)?;
    let orchestrator = ClassificationOrchestrator::new(Arc::new(gateway), AppMetrics::shared())
        .with_stage_timeout(stage_timeout);

    // Dropping the in-flight future on Ctrl-C aborts the pending model call.
    let response = tokio::select! {
        result = orchestrator.classify(input) => result?,
        _ = tokio::signal::ctrl_c() => bail!("interrupted"),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed reading email body from stdin")?;
    Ok(buffer)
}
