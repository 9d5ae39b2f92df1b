use clap::Parser;
use polars::prelude::{AnyValue, DataFrame};
use std::path::PathBuf;
use std::process::ExitCode;
use trace_critpath::{
    AnalysisConfig, AnalysisError, AnalysisReport, GraphBuilder, analyze, load_config_from_json,
    load_events_from_jsonl, load_task_metadata_from_csv, save_report_to_json,
    save_task_report_to_csv,
};
use tracing_subscriber::EnvFilter;

/// Reconstructs the task/file dependency graph of a traced run and reports
/// its critical path.
#[derive(Parser, Debug)]
#[command(name = "cli", version)]
struct Args {
    /// Operation events, one JSON object per line.
    #[arg(long)]
    events: PathBuf,

    /// Per-task metadata CSV (task_id,duration,cpu_user,cpu_system,host,started_at,command).
    #[arg(long)]
    tasks: Option<PathBuf>,

    /// Analysis configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the full report as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the per-task cost table as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also print the file table.
    #[arg(long)]
    show_files: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn render_value(av: &AnyValue<'_>) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) => format!("{v:.3}"),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Boolean(true) => "*".to_string(),
        AnyValue::Boolean(false) => String::new(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| render_value(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(value.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => load_config_from_json(path)?,
        None => AnalysisConfig::default(),
    };
    let metadata = match &args.tasks {
        Some(path) => load_task_metadata_from_csv(path)?,
        None => Vec::new(),
    };
    let stream = load_events_from_jsonl(&args.events)?;

    let mut builder = GraphBuilder::new(config);
    builder.register_all_metadata(&metadata);
    builder.ingest_all(&stream.events);
    let stats = builder.stats().clone();
    let graph = builder.finish();

    println!(
        "Events: {} applied, {} malformed, {} unknown kind, {} ignored path, {} undecodable lines",
        stats.applied,
        stats.malformed,
        stats.unknown_kind,
        stats.ignored_path,
        stream.skipped_lines.len()
    );
    println!(
        "Graph: {} tasks, {} files, {} edges",
        graph.task_count(),
        graph.file_count(),
        graph.edge_count()
    );

    let analysis = match analyze(&graph) {
        Ok(analysis) => analysis,
        Err(AnalysisError::Cycle { tasks }) => {
            println!("Dependency cycle detected between tasks: {}", tasks.join(", "));
            return Ok(ExitCode::from(2));
        }
    };

    let report = AnalysisReport::new(&graph, &analysis);
    println!("{}", render_df_as_text_table(&report.tasks_frame()?));
    if args.show_files {
        println!("{}", render_df_as_text_table(&report.files_frame()?));
    }

    if analysis.critical_path.is_empty() {
        println!("Critical path: (empty)");
    } else {
        println!("Critical path: {}", analysis.critical_path.describe());
        println!("Makespan: {:.3}", analysis.makespan());
    }

    if let Some(path) = &args.json {
        save_report_to_json(&report, path)?;
        println!("Report written to {}", path.display());
    }
    if let Some(path) = &args.csv {
        save_task_report_to_csv(&report, path)?;
        println!("Task table written to {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
