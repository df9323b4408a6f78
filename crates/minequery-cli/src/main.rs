//! Minequery CLI
//!
//! Works on template XML files against a JSON model:
//! - `inspect`: metadata, nodes, and editable constraints in form order
//! - `strip`: the template with every editable constraint removed
//! - `summarise`: possible values per editable node from a JSON row fixture
//! - `validate`: fail when the template is not usable

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use minequery_core::{StaticExecutor, SummaryState, TemplateQuery, Value};
use minequery_model::Model;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "minequery")]
#[command(author, version, about = "Minequery: path queries and query templates")]
struct Cli {
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Model JSON (defaults to $MINEQUERY_MODEL)
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print template metadata, nodes, and editable constraints.
    Inspect {
        /// Template XML file
        template: PathBuf,
    },

    /// Write the template with all editable constraints removed.
    Strip {
        /// Template XML file
        template: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Summarise editable nodes against canned rows.
    ///
    /// The rows file maps a projected path to its rows, e.g.
    /// `{"Gene.length": [[1200], [5400]]}`.
    Summarise {
        /// Template XML file
        template: PathBuf,
        /// Row fixture JSON
        #[arg(short, long)]
        rows: PathBuf,
    },

    /// Exit non-zero unless the template has a name.
    Validate {
        /// Template XML file
        template: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_env();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level(cli.verbose)?)
        .with_writer(std::io::stderr)
        .init();

    let model = load_model(&config.model_path(cli.model)?)?;

    match cli.command {
        Commands::Inspect { template } => cmd_inspect(&load_template(&template, &model)?),
        Commands::Strip { template, out } => {
            cmd_strip(&load_template(&template, &model)?, out.as_deref())
        }
        Commands::Summarise { template, rows } => {
            cmd_summarise(load_template(&template, &model)?, &rows)
        }
        Commands::Validate { template } => cmd_validate(&load_template(&template, &model)?),
    }
}

fn load_model(path: &Path) -> Result<Arc<Model>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read model {}", path.display()))?;
    let model = Model::from_json(&text)
        .with_context(|| format!("failed to load model {}", path.display()))?;
    tracing::debug!(model = model.name(), path = %path.display(), "loaded model");
    Ok(Arc::new(model))
}

fn load_template(path: &Path, model: &Arc<Model>) -> Result<TemplateQuery> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read template {}", path.display()))?;
    TemplateQuery::from_xml(&text, model)
        .with_context(|| format!("failed to parse template {}", path.display()))
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn cmd_inspect(template: &TemplateQuery) -> Result<()> {
    println!("{} {}", "template".bold(), or_dash(template.name()));
    println!("  title:       {}", or_dash(template.title()));
    println!("  description: {}", or_dash(template.description()));
    println!("  comment:     {}", or_dash(template.comment()));
    println!("  important:   {}", template.is_important());
    println!("  keywords:    {}", template.keywords());
    println!("  edited:      {}", template.is_edited());

    let query = template.query();
    println!("{}", "view".bold());
    for path in query.view() {
        println!("  {path}");
    }

    println!("{}", "nodes".bold());
    for node in query.nodes() {
        println!("  {}", node.path());
        for constraint in node.constraints() {
            println!("    {constraint}");
        }
    }

    println!("{}", "editable constraints".bold());
    let mut position = 0;
    for node in template.editable_nodes() {
        for constraint in template.editable_constraints_for(node) {
            position += 1;
            println!("  {position}. {} {constraint}", node.path());
        }
    }
    if position == 0 {
        println!("  (none)");
    }
    Ok(())
}

fn cmd_strip(template: &TemplateQuery, out: Option<&Path>) -> Result<()> {
    let stripped = template.clone_without_editable_constraints();
    let xml = stripped
        .to_xml()
        .context("failed to serialize stripped template")?;
    match out {
        Some(path) => {
            fs::write(path, format!("{xml}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => println!("{xml}"),
    }
    Ok(())
}

fn format_values(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn cmd_summarise(mut template: TemplateQuery, rows: &Path) -> Result<()> {
    let text = fs::read_to_string(rows)
        .with_context(|| format!("failed to read rows {}", rows.display()))?;
    let executor = StaticExecutor::from_json(&text)
        .with_context(|| format!("failed to parse rows {}", rows.display()))?;

    template
        .summarise(&executor)
        .context("summarise failed")?;

    let paths: Vec<String> = template
        .editable_nodes()
        .into_iter()
        .map(|n| n.path().to_string())
        .collect();
    for path in &paths {
        match template.summary_state(path) {
            SummaryState::Complete(values) => println!(
                "{} {path}: {} value(s): {}",
                "ok".green().bold(),
                values.len(),
                format_values(values)
            ),
            SummaryState::TooManyValues => {
                println!("{} {path}: too many values", "skip".yellow().bold())
            }
            SummaryState::NotSummarised => {
                println!("{} {path}: not summarised", "skip".yellow().bold())
            }
        }
    }
    println!("summarised: {}", template.is_summarised());
    Ok(())
}

fn cmd_validate(template: &TemplateQuery) -> Result<()> {
    if !template.validate() {
        bail!("template has no name");
    }
    println!(
        "{} {} ({} editable constraint(s))",
        "ok".green().bold(),
        or_dash(template.name()),
        template.all_editable_constraints().len()
    );
    Ok(())
}
