use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use shardmerge::merger::QueryContext;
use shardmerge::plan::{load_plan, run_plan};

#[derive(Parser)]
#[command(author, version, about = "shardmerge - merge partial aggregate results from database shards")]
struct Cli {
    /// JSON merge plan: group-by columns, aggregates and per-shard rows
    plan: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let plan = load_plan(&cli.plan)?;
    let result = run_plan(plan, &QueryContext::new())
        .with_context(|| format!("Failed to merge {}", cli.plan.display()))?;

    match cli.format {
        OutputFormat::Table => {
            print!("{}", result.to_string_table());
            println!("({} row{})", result.row_count(), if result.row_count() == 1 { "" } else { "s" });
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result.to_json())?);
        }
    }

    Ok(())
}
