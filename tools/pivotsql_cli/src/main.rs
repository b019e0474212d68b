use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use pivotsql::{
    parser, AdhocRequest, InMemoryCatalog, PivotRequest, QueryService, RenderedQuery, ServiceConfig,
};

mod logging;

#[derive(Parser)]
#[command(name = "pivotsql")]
#[command(about = "Compile and run BI pivot and ad-hoc queries against a YAML catalog")]
#[command(version)]
struct Args {
    /// Catalog file with data sources, datasets and models
    #[arg(long, global = true, env = "PIVOTSQL_CATALOG", default_value = "catalog.yaml")]
    catalog: PathBuf,

    /// Service configuration (TOML); PIVOTSQL_* env vars override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL a request compiles to, without running it
    Compile {
        /// Request JSON, or @path to read it from a file
        request: String,

        /// Treat the request as an ad-hoc request
        #[arg(long)]
        adhoc: bool,
    },
    /// Run a pivot request
    Pivot {
        /// Request JSON, or @path to read it from a file
        request: String,
    },
    /// Run an ad-hoc request
    Adhoc {
        /// Request JSON, or @path to read it from a file
        request: String,
    },
    /// Check that a data source is reachable
    TestConnection {
        data_source: i64,
    },
    /// List tables, files or API collections of a data source
    ListRelations {
        data_source: i64,
    },
    /// List the fields of one relation
    ListFields {
        data_source: i64,
        relation: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let config = ServiceConfig::load(args.config.as_deref()).context("loading configuration")?;
    let catalog = parser::parse_file(&args.catalog)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;
    let service = QueryService::new(Arc::new(InMemoryCatalog::from_file(catalog)), config);

    match args.command {
        Commands::Compile { request, adhoc } => {
            if adhoc {
                let request: AdhocRequest = read_request(&request)?;
                let compiled = service.compile_adhoc(&request).await?;
                print_query("rows", &compiled.rows);
                print_query("count", &compiled.count);
            } else {
                let request: PivotRequest = read_request(&request)?;
                let compiled = service.compile_pivot(&request).await?;
                print_query("pivot", &compiled.query);
            }
        }
        Commands::Pivot { request } => {
            let request: PivotRequest = read_request(&request)?;
            let result = service.pivot(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Adhoc { request } => {
            let request: AdhocRequest = read_request(&request)?;
            let result = service.adhoc(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::TestConnection { data_source } => {
            let status = service.test_connection(data_source).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            if !status.ok {
                std::process::exit(1);
            }
        }
        Commands::ListRelations { data_source } => {
            for name in service.list_relations(data_source).await? {
                println!("{name}");
            }
        }
        Commands::ListFields {
            data_source,
            relation,
        } => {
            for name in service.list_fields(data_source, &relation).await? {
                println!("{name}");
            }
        }
    }

    Ok(())
}

/// Inline JSON, or `@path` naming a JSON file
fn read_request<T: DeserializeOwned>(arg: &str) -> anyhow::Result<T> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("reading request file {path}"))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&text).context("parsing request JSON")
}

fn print_query(label: &str, query: &RenderedQuery) {
    println!("-- {label} ({})", query.dialect);
    println!("{}", query.sql);
    if !query.params.is_empty() {
        let params = query
            .params
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("-- params: {params}");
    }
}
