//! CLI for the alpha-ops cross-sectional operator library.
//!
//! This binary provides a command-line interface for discovering and
//! introspecting operators, and for applying them to wide CSV panels.

use alpha_ops::{
    LabeledPanel, OperatorCategory, OperatorError, OperatorRegistry, panel_from_frame,
    panel_to_frame,
};
use clap::{Parser, Subcommand};
use ndarray::ArrayView2;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "alpha-ops")]
#[command(about = "NaN-aware cross-sectional operators over panel data", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all available operators
    List,
    /// Show information about a specific operator
    Info {
        /// Operator name
        operator: String,
    },
    /// Apply an operator to CSV panels
    Apply {
        /// Operator name
        operator: String,
        /// First input panel: a `date` column plus one column per instrument
        #[arg(long)]
        input: PathBuf,
        /// Further input panels for multi-input operators, in order
        #[arg(long = "with")]
        with: Vec<PathBuf>,
        /// Operator parameters as a JSON object
        #[arg(long)]
        params: Option<String>,
        /// Output CSV path; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let registry = OperatorRegistry::with_defaults();

    let result = match cli.command {
        Commands::List => {
            list_operators(&registry);
            Ok(())
        }
        Commands::Info { operator } => show_operator_info(&registry, &operator),
        Commands::Apply {
            operator,
            input,
            with,
            params,
            output,
        } => apply_operator(
            &registry,
            &operator,
            &input,
            &with,
            params.as_deref(),
            output.as_deref(),
        ),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        if let OperatorError::NotFound(_) = err {
            eprintln!("\nAvailable operators:");
            let mut names = registry.names();
            names.sort_unstable();
            for name in names {
                eprintln!("  {name}");
            }
        }
        std::process::exit(1);
    }
}

/// List all available operators grouped by category.
fn list_operators(registry: &OperatorRegistry) {
    let mut by_category: HashMap<OperatorCategory, Vec<_>> = HashMap::new();
    for info in registry.all_info() {
        by_category.entry(info.category).or_default().push(info);
    }

    println!("Available Operators ({} total)\n", registry.len());

    // Sort categories for consistent output
    let mut categories: Vec<_> = by_category.into_iter().collect();
    categories.sort_by_key(|(c, _)| c.to_string());

    for (category, mut operators) in categories {
        println!("{category}:");
        operators.sort_by(|a, b| a.name.cmp(&b.name));
        for info in operators {
            println!("  {} - {}", info.name, info.description);
        }
        println!();
    }
}

/// Show detailed information about a specific operator.
fn show_operator_info(registry: &OperatorRegistry, name: &str) -> alpha_ops::Result<()> {
    let operator = registry
        .get(name)
        .ok_or_else(|| OperatorError::NotFound(name.to_string()))?;
    let info = alpha_ops::registry::info(operator);

    println!("Operator: {}", info.name);
    println!("Category: {}", info.category);
    println!("Description: {}", info.description);
    println!("Inputs: {}", info.arity);
    if info.parameters.is_null() {
        println!("Parameters: none");
    } else {
        println!("Default parameters:");
        println!("{}", serde_json::to_string_pretty(&info.parameters)?);
    }
    Ok(())
}

/// Apply an operator to one or more CSV panels.
fn apply_operator(
    registry: &OperatorRegistry,
    name: &str,
    input: &Path,
    with: &[PathBuf],
    params: Option<&str>,
    output: Option<&Path>,
) -> alpha_ops::Result<()> {
    let params = match params {
        Some(json) => serde_json::from_str(json)?,
        None => serde_json::Value::Null,
    };
    let operator = registry.build(name, params)?;

    let first = read_panel(input)?;
    let rest = with
        .iter()
        .map(|path| read_panel(path))
        .collect::<alpha_ops::Result<Vec<_>>>()?;
    let inputs: Vec<ArrayView2<'_, f64>> = std::iter::once(&first)
        .chain(&rest)
        .map(|panel| panel.values.view())
        .collect();

    tracing::info!(
        operator = name,
        inputs = inputs.len(),
        dates = first.values.nrows(),
        instruments = first.values.ncols(),
        "applying operator"
    );
    let values = operator.compute(&inputs)?;
    let mut df = panel_to_frame(&first.with_values(values)?)?;

    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            CsvWriter::new(&mut file).finish(&mut df)?;
            tracing::info!(path = %path.display(), "wrote output panel");
        }
        None => CsvWriter::new(std::io::stdout()).finish(&mut df)?,
    }
    Ok(())
}

fn read_panel(path: &Path) -> alpha_ops::Result<LabeledPanel> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    tracing::debug!(path = %path.display(), rows = df.height(), "read input panel");
    panel_from_frame(&df)
}
