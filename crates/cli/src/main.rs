// claimgrid CLI - turns SC / Benefit / CR claim exports into the XLSX claim report

mod exit_codes;
mod input;
mod util;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use claimgrid_io::xlsx;
use claimgrid_pipeline::schema::{self, BENEFIT, CR, SC, SUMMARY};
use claimgrid_pipeline::{ClaimTotals, Diagnostic, PipelineError, PipelineInput, PipelineOutput, Table};

use exit_codes::{pipeline_exit_code, EXIT_CONFIG, EXIT_INPUT, EXIT_OUTPUT, EXIT_SUCCESS};
use util::{format_amount, format_count, render_grid};

#[derive(Parser)]
#[command(name = "claimgrid")]
#[command(about = "Clean claim exports and build the policy claim report (XLSX)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline and write the report workbook
    #[command(after_help = "\
Writes <out-dir>/<name>.xlsx with the sheets Summary, SC and Benefit.
Duplicate claims and unparseable dates are reported as warnings; the run still succeeds.

Examples:
  claimgrid run --sc sc.csv --benefit benefit.csv --cr cr.xlsx
  claimgrid run --sc sc.csv --benefit benefit.csv --cr cr.xlsx --cr-sheet CR --name Q3_Claims
  claimgrid run --sc sc.csv --benefit benefit.csv --cr cr.csv --out-dir reports --json
  claimgrid run --sc sc.csv --benefit benefit.csv --cr cr.xlsx --preview 10")]
    Run {
        /// SC claim export (CSV)
        #[arg(long)]
        sc: PathBuf,

        /// Benefit export (CSV)
        #[arg(long)]
        benefit: PathBuf,

        /// CR policy summary (xlsx/xls/xlsb/ods, or CSV)
        #[arg(long)]
        cr: PathBuf,

        /// Sheet of the CR workbook to read (default: first sheet)
        #[arg(long, value_name = "NAME")]
        cr_sheet: Option<String>,

        /// Report file name; ".xlsx" is appended when missing
        #[arg(long)]
        name: Option<String>,

        /// Directory the report is written to (created if missing)
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Pipeline config (TOML)
        #[arg(long, env = "CLAIMGRID_CONFIG")]
        config: Option<PathBuf>,

        /// Print a machine-readable run report to stdout
        #[arg(long, conflicts_with = "preview")]
        json: bool,

        /// Print the first N rows of each output table
        #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "5")]
        preview: Option<usize>,

        /// Suppress the stderr summary and warnings
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Check inputs against their column contracts without writing anything
    #[command(after_help = "\
Examples:
  claimgrid check --sc sc.csv
  claimgrid check --sc sc.csv --benefit benefit.csv --cr cr.xlsx")]
    Check {
        /// SC claim export (CSV)
        #[arg(long)]
        sc: PathBuf,

        /// Benefit export (CSV)
        #[arg(long)]
        benefit: Option<PathBuf>,

        /// CR policy summary (xlsx/xls/xlsb/ods, or CSV)
        #[arg(long)]
        cr: Option<PathBuf>,

        /// Sheet of the CR workbook to read (default: first sheet)
        #[arg(long, value_name = "NAME")]
        cr_sheet: Option<String>,

        /// Pipeline config (TOML)
        #[arg(long, env = "CLAIMGRID_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the effective pipeline config as TOML
    Config {
        /// Pipeline config (TOML) to load instead of the default lookup
        #[arg(long, env = "CLAIMGRID_CONFIG")]
        config: Option<PathBuf>,

        /// Print the default config file location and exit
        #[arg(long)]
        path: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\npipeline: claimgrid-pipeline ", env!("CARGO_PKG_VERSION"),
        "\ntarget:   ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    // Diagnostics reach stderr through the run summary; log lines are opt-in via RUST_LOG
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { sc, benefit, cr, cr_sheet, name, out_dir, config, json, preview, quiet } => {
            cmd_run(RunArgs { sc, benefit, cr, cr_sheet, name, out_dir, config, json, preview, quiet })
        }
        Commands::Check { sc, benefit, cr, cr_sheet, config } => {
            cmd_check(sc, benefit, cr, cr_sheet, config)
        }
        Commands::Config { config, path } => cmd_config(config, path),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: String) -> Self {
        self.hint = Some(hint);
        self
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        let hint = match &err {
            PipelineError::MissingColumn { table, .. } => {
                Some(format!("run `claimgrid check` to list what the {} export is missing", table))
            }
            _ => None,
        };
        Self { code: pipeline_exit_code(&err), message: err.to_string(), hint }
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

struct RunArgs {
    sc: PathBuf,
    benefit: PathBuf,
    cr: PathBuf,
    cr_sheet: Option<String>,
    name: Option<String>,
    out_dir: PathBuf,
    config: Option<PathBuf>,
    json: bool,
    preview: Option<usize>,
    quiet: bool,
}

#[derive(Serialize)]
struct RowCounts {
    summary: usize,
    sc: usize,
    benefit: usize,
}

/// `--json` output of `claimgrid run`.
#[derive(Serialize)]
struct RunReport<'a> {
    output: String,
    config: String,
    rows: RowCounts,
    totals: ClaimTotals,
    diagnostics: &'a [Diagnostic],
}

fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let (config, source) = input::load_config(args.config.as_deref())?;

    let pipeline_input = PipelineInput {
        sc: input::load_csv(&args.sc)?,
        benefit: input::load_csv(&args.benefit)?,
        summary: input::load_summary(&args.cr, args.cr_sheet.as_deref())?,
    };

    let output = claimgrid_pipeline::run(&config, pipeline_input)?;

    let name = args.name.unwrap_or_else(|| config.report.default_name.clone());
    let artifact = xlsx::export_report(&output.summary, &output.sc, &output.benefit, &name)
        .map_err(CliError::output)?;

    std::fs::create_dir_all(&args.out_dir).map_err(|e| {
        CliError::output(format!("cannot create {}: {}", args.out_dir.display(), e))
    })?;
    let path = artifact.save_in(&args.out_dir).map_err(CliError::output)?;

    if !args.quiet {
        print_human_summary(&output, &path);
    }

    if args.json {
        let report = RunReport {
            output: path.display().to_string(),
            config: source.to_string(),
            rows: RowCounts {
                summary: output.summary.len(),
                sc: output.sc.len(),
                benefit: output.benefit.len(),
            },
            totals: output.totals,
            diagnostics: &output.diagnostics,
        };
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::output(format!("cannot serialize run report: {}", e)))?;
        println!("{}", text);
    }

    if let Some(n) = args.preview {
        for (label, table) in [(SUMMARY, &output.summary), (SC, &output.sc), (BENEFIT, &output.benefit)] {
            print_preview(label, table, n);
        }
    }

    Ok(())
}

fn print_human_summary(output: &PipelineOutput, path: &Path) {
    for diag in &output.diagnostics {
        eprintln!("warning: {}", diag);
    }

    let t = &output.totals;
    eprintln!("Claim Summary:");
    eprintln!("- Total Claims: {}", format_count(t.total_claims));
    eprintln!("- Total Billed: {}", format_amount(t.total_billed));
    eprintln!("- Total Accepted: {}", format_amount(t.total_accepted));
    eprintln!("- Total Excess: {}", format_amount(t.total_excess));
    eprintln!("- Total Unpaid: {}", format_amount(t.total_unpaid));
    eprintln!(
        "wrote {} ({} policy row(s), {} claim(s), {} benefit row(s))",
        path.display(),
        output.summary.len(),
        output.sc.len(),
        output.benefit.len()
    );
}

fn print_preview(label: &str, table: &Table, n: usize) {
    println!("{} (first {} of {} row(s))", label, n.min(table.len()), table.len());
    print!("{}", render_grid(table, n));
    println!();
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn cmd_check(
    sc: PathBuf,
    benefit: Option<PathBuf>,
    cr: Option<PathBuf>,
    cr_sheet: Option<String>,
    config: Option<PathBuf>,
) -> Result<(), CliError> {
    let (config, _) = input::load_config(config.as_deref())?;

    let sc_table = input::load_csv(&sc)?;
    report_check(SC, &sc, &sc_table, &schema::sc_required(&config))?;

    if let Some(path) = benefit {
        let table = input::load_csv(&path)?;
        report_check(BENEFIT, &path, &table, &schema::benefit_required(&config))?;
    }

    if let Some(path) = cr {
        let table = input::load_summary(&path, cr_sheet.as_deref())?;
        report_check(CR, &path, &table, &schema::summary_required())?;
    }

    Ok(())
}

fn report_check(label: &str, path: &Path, table: &Table, required: &[String]) -> Result<(), CliError> {
    if let Err(err) = schema::check_columns(table, label, required) {
        // Name every absent column, not just the first
        let missing: Vec<&str> = required
            .iter()
            .filter(|c| table.column_index(c).is_none())
            .map(String::as_str)
            .collect();
        return Err(CliError::from(err).with_hint(format!("{} is missing: {}", label, missing.join(", "))));
    }

    println!(
        "{}: ok ({} row(s), {} column(s)) {}",
        label,
        table.len(),
        table.width(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config(config: Option<PathBuf>, path: bool) -> Result<(), CliError> {
    if path {
        match input::default_config_path() {
            Some(p) => println!("{}", p.display()),
            None => return Err(CliError::config("no config directory on this platform")),
        }
        return Ok(());
    }

    let (config, source) = input::load_config(config.as_deref())?;
    let text = config.to_toml()?;
    println!("# source: {}", source);
    print!("{}", text);
    Ok(())
}
