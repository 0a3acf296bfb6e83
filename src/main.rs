use anyhow::Result;
use clap::{Parser, Subcommand};
use sql_optimizer::observability::init_tracing;
use sql_optimizer::{AnalyzeRequest, Mode, OptimizerConfig, OptimizerEngine, TextToSqlRequest};
use tracing::info;

#[derive(Parser)]
#[command(name = "sql-optimizer")]
#[command(about = "Analyze SQL queries for performance issues and generate SQL from questions")]
struct Args {
    /// Skip the language model even if an API key is configured
    #[arg(long, global = true)]
    heuristic_only: bool,

    /// Print single-line JSON instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce an optimization report for a query
    Analyze {
        /// The SQL query to analyze
        query: String,

        /// Optional schema description passed to the model
        #[arg(long)]
        schema_context: Option<String>,
    },
    /// Generate SQL from a natural-language question
    Generate {
        /// The question to answer
        question: String,

        /// Schema definition (DDL or free text)
        #[arg(long, default_value = "")]
        schema: String,
    },
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let config = OptimizerConfig::from_env()?.with_heuristic_only(args.heuristic_only);
    let engine = OptimizerEngine::from_config(&config);
    info!(ai_enabled = engine.ai_enabled(), provider = %config.llm.provider, "SQL Optimizer starting");

    let mode = match args.command {
        Command::Analyze { query, schema_context } => {
            let request = AnalyzeRequest { query, schema_context };
            let (result, mode) = engine.analyze_with_mode(&request).await?;
            print_json(&result, args.compact)?;
            mode
        }
        Command::Generate { question, schema } => {
            let request = TextToSqlRequest::new(schema, question);
            let (response, mode) = engine.generate_sql_with_mode(&request).await?;
            print_json(&response, args.compact)?;
            mode
        }
    };

    if engine.ai_enabled() && mode == Mode::Heuristic {
        eprintln!("note: the language model was unavailable; this answer came from heuristics");
    }

    Ok(())
}
