//! CLI for querying JSON record files.
//!
//! Loads a JSON array of objects into a memory store and runs one query
//! against it:
//! - `find`: page with total count
//! - `slice`: page without count, probing for a next page
//! - `count`: number of matching records
//! - `select`: page of projected records

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use query_dsl_core::{
    MemoryStore, NullOrdering, Projection, QueryConfig, QueryParams, Record, Repository,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Page size when the query string has no `size`
    #[arg(long, global = true, default_value_t = 20)]
    default_page_size: usize,

    /// Upper bound for requested page sizes
    #[arg(long, global = true, default_value_t = 2000)]
    max_page_size: usize,

    /// Place nulls first for sort keys that do not say otherwise
    #[arg(long, global = true)]
    nulls_first: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// JSON file holding an array of records
    #[arg(short, long)]
    data: PathBuf,

    /// Query string, e.g. `username=member1&age.gt=10&page=0&size=3&sort=age,desc`
    #[arg(short, long)]
    query: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one page of matching records with total count
    Find(QueryArgs),

    /// Print one slice of matching records without counting
    Slice(QueryArgs),

    /// Print the number of matching records
    Count(QueryArgs),

    /// Print one page of matching records reduced to selected fields
    Select {
        #[command(flatten)]
        args: QueryArgs,

        /// Fields to keep (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        fields: Vec<String>,

        /// Rename on output, as `source:alias` (repeatable)
        #[arg(long)]
        alias: Vec<String>,
    },
}

impl Cli {
    fn config(&self) -> QueryConfig {
        QueryConfig {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            default_null_ordering: if self.nulls_first {
                NullOrdering::NullsFirst
            } else {
                NullOrdering::NullsLast
            },
        }
    }
}

fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not a JSON array of objects", path.display()))?;
    tracing::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn open(args: &QueryArgs, config: &QueryConfig) -> Result<(Repository<MemoryStore>, QueryParams)> {
    let params = QueryParams::parse(args.query.as_deref(), config)?;
    let repository = Repository::new(MemoryStore::from_records(load_records(&args.data)?));
    Ok((repository, params))
}

fn projection(fields: &[String], aliases: &[String]) -> Result<Projection> {
    let mut projection = Projection::of(fields.iter().cloned());
    for alias in aliases {
        let Some((source, target)) = alias.split_once(':') else {
            bail!("Invalid alias '{}', expected source:alias", alias);
        };
        projection = projection.alias(source, target);
    }
    Ok(projection)
}

fn run(cli: &Cli) -> Result<serde_json::Value> {
    let config = cli.config();
    let output = match &cli.command {
        Commands::Find(args) => {
            let (repository, params) = open(args, &config)?;
            let page = repository.find_page(params.predicate(), &params.page)?;
            serde_json::to_value(page)?
        }
        Commands::Slice(args) => {
            let (repository, params) = open(args, &config)?;
            let slice = repository.find_slice(params.predicate(), &params.page)?;
            serde_json::to_value(slice)?
        }
        Commands::Count(args) => {
            let (repository, params) = open(args, &config)?;
            let count = repository.count(params.predicate())?;
            serde_json::json!({ "count": count })
        }
        Commands::Select {
            args,
            fields,
            alias,
        } => {
            let projection = projection(fields, alias)?;
            let (repository, params) = open(args, &config)?;
            let page =
                repository.find_projected::<Record>(params.predicate(), &projection, &params.page)?;
            serde_json::to_value(page)?
        }
    };
    Ok(output)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let output = run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
