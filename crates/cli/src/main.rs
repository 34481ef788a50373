use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use temporal_core::{
    AnalysisRequest, AnalysisService, ConfigValues, CoreConfig, TaskKind, DEFAULT_LANGUAGE,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "temporal")]
#[command(about = "Temporal text analysis from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Events, causation and entity relations merged into one result
    Analyze {
        #[command(flatten)]
        input: TextInput,
        /// Document date used to anchor relative dates
        #[arg(long)]
        doc_date: Option<String>,
    },
    /// Events, named entities and timeline
    Events {
        #[command(flatten)]
        input: TextInput,
        #[arg(long)]
        doc_date: Option<String>,
    },
    /// Causal relations between events
    Causation {
        #[command(flatten)]
        input: TextInput,
    },
    /// Relations between entities
    Entities {
        #[command(flatten)]
        input: TextInput,
    },
    /// Part of speech of every token
    Pos {
        #[command(flatten)]
        input: TextInput,
    },
    /// Morphology of a single word
    Morphology {
        word: String,
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },
    /// Any task by name (events, causation, entities, pos, morphology, ...)
    Run {
        #[arg(long, value_parser = parse_task)]
        task: TaskKind,
        #[command(flatten)]
        input: TextInput,
        #[arg(long)]
        doc_date: Option<String>,
    },
}

/// Text to analyse, given inline or read from a file.
#[derive(Args)]
struct TextInput {
    /// Text to analyse
    #[arg(required_unless_present = "file")]
    text: Option<String>,
    /// Read the text from this file instead
    #[arg(long, conflicts_with = "text")]
    file: Option<PathBuf>,
    /// Language the output should be written in
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    language: String,
}

impl TextInput {
    async fn read(&self) -> anyhow::Result<String> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display())),
            (None, None) => anyhow::bail!("no text given; pass it inline or with --file"),
        }
    }
}

fn parse_task(name: &str) -> Result<TaskKind, String> {
    name.parse::<TaskKind>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("temporal=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cfg = CoreConfig::from_values(ConfigValues::from_env())?;
    tracing::debug!("completion backend: {:?}", cfg);
    let service = AnalysisService::from_config(&cfg)?;

    let output = execute(&service, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn execute(service: &AnalysisService, command: Commands) -> anyhow::Result<Value> {
    let output = match command {
        Commands::Analyze { input, doc_date } => {
            let text = input.read().await?;
            let envelope = service
                .analyze_combined(&text, doc_date.as_deref(), &input.language)
                .await?;
            serde_json::to_value(envelope)?
        }
        Commands::Morphology { word, language } => {
            serde_json::to_value(service.analyze_morphology(&word, &language).await?)?
        }
        Commands::Events { input, doc_date } => {
            run_task(service, TaskKind::EventTimeline, &input, doc_date).await?
        }
        Commands::Causation { input } => {
            run_task(service, TaskKind::Causation, &input, None).await?
        }
        Commands::Entities { input } => {
            run_task(service, TaskKind::EntityRelations, &input, None).await?
        }
        Commands::Pos { input } => {
            run_task(service, TaskKind::PartOfSpeech, &input, None).await?
        }
        Commands::Run {
            task,
            input,
            doc_date,
        } => run_task(service, task, &input, doc_date).await?,
    };
    Ok(output)
}

async fn run_task(
    service: &AnalysisService,
    task: TaskKind,
    input: &TextInput,
    doc_date: Option<String>,
) -> anyhow::Result<Value> {
    let request = AnalysisRequest::new(task, input.read().await?)
        .language(input.language.clone())
        .doc_date(doc_date);
    Ok(service.payload(&request).await?)
}
