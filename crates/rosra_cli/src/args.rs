// crates/rosra_cli/src/args.rs
//
// Offline CLI argument surface (types + value parsers + path checks).
//
// Rules:
// - No networked paths (reject any scheme:// like http/https/file)
// - A workbook comes from a saved report (--dir + --report) or a plain file
//   (--workbook); category edits only work on saved reports
// - Timestamps are RFC3339 and normalized to UTC seconds at parse time

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use rosra_core::entities::StreamKind;
use rosra_core::ids::{CategoryId, ReportId};
use rosra_io::hasher::{normalize_rfc3339_utc_seconds, now_rfc3339_utc_seconds};

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "rosra",
    version,
    disable_help_subcommand = true,
    about = "Offline, deterministic own-source revenue gap engine"
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential stderr messages.
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Write the seed workbook as a new saved report.
    Init {
        #[command(flatten)]
        report: ReportRef,
        /// Replace the title of the seed workbook.
        #[arg(long)]
        title: Option<String>,
        /// Overwrite an existing report.
        #[arg(long)]
        force: bool,
    },
    /// List saved reports in a directory.
    List {
        /// Report directory.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Load and validate a workbook without computing.
    Validate {
        #[command(flatten)]
        source: Source,
        /// Engine params JSON (defaults apply when omitted).
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Run the full pipeline and write result.json and run_record.json.
    Compute {
        #[command(flatten)]
        source: Source,
        /// Engine params JSON (defaults apply when omitted).
        #[arg(long)]
        params: Option<PathBuf>,
        /// Output directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Renderer(s) to emit. Omit to skip rendering.
        #[arg(long, value_enum, num_args = 0..=2)]
        render: Vec<RenderFormat>,
        /// Run timestamp (RFC3339); defaults to now. Fix it for reproducible run ids.
        #[arg(long, value_parser = parse_timestamp)]
        timestamp: Option<String>,
    },
    /// Edit the categories of a saved report.
    #[command(subcommand)]
    Category(CategoryCommand),
}

#[derive(Debug, Subcommand, Clone)]
pub enum CategoryCommand {
    /// Append a category with template values.
    Add {
        #[command(flatten)]
        target: StreamRef,
        /// Name of the new category (default "New Category").
        #[arg(long)]
        name: Option<String>,
    },
    /// Set one numeric or enum field from raw text.
    Update {
        #[command(flatten)]
        target: StreamRef,
        #[arg(long, value_parser = parse_category_id)]
        id: CategoryId,
        #[arg(long)]
        field: String,
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },
    /// Rename a category.
    Rename {
        #[command(flatten)]
        target: StreamRef,
        #[arg(long, value_parser = parse_category_id)]
        id: CategoryId,
        #[arg(long)]
        name: String,
    },
    /// Remove a category.
    Delete {
        #[command(flatten)]
        target: StreamRef,
        #[arg(long, value_parser = parse_category_id)]
        id: CategoryId,
    },
}

/// A saved report: `<dir>/<report>.json`.
#[derive(Debug, Args, Clone)]
pub struct ReportRef {
    /// Report directory.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// Report id (letters, digits, `_`, `-`, `.`, `:`).
    #[arg(long, value_parser = parse_report_id)]
    pub report: ReportId,
}

/// One stream of a saved report.
#[derive(Debug, Args, Clone)]
pub struct StreamRef {
    #[command(flatten)]
    pub report: ReportRef,
    /// Stream code, e.g. `license` or `short_term_user_charge`.
    #[arg(long, value_parser = parse_stream)]
    pub stream: StreamKind,
}

/// Where a workbook is read from.
#[derive(Debug, Args, Clone)]
pub struct Source {
    /// Report directory (used with --report).
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// Saved report id.
    #[arg(long, value_parser = parse_report_id, required_unless_present = "workbook", conflicts_with = "workbook")]
    pub report: Option<ReportId>,
    /// Workbook JSON file.
    #[arg(long)]
    pub workbook: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    Json,
    Html,
}

/// Errors surfaced by argument checks after clap parsing.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NonLocalPath(p) => write!(f, "path must be local (no scheme): {p}"),
        }
    }
}

impl std::error::Error for CliError {}

pub fn parse_stream(s: &str) -> Result<StreamKind, String> {
    StreamKind::from_code(s.trim()).ok_or_else(|| {
        let codes: Vec<&str> = StreamKind::ALL.iter().map(|k| k.code()).collect();
        format!("unknown stream `{s}` (expected one of: {})", codes.join(", "))
    })
}

pub fn parse_report_id(s: &str) -> Result<ReportId, String> {
    s.parse::<ReportId>().map_err(|e| format!("invalid report id `{s}`: {e}"))
}

pub fn parse_category_id(s: &str) -> Result<CategoryId, String> {
    s.parse::<CategoryId>().map_err(|e| format!("invalid category id `{s}`: {e}"))
}

/// RFC3339 with any offset; normalized to `YYYY-MM-DDTHH:MM:SSZ`.
pub fn parse_timestamp(s: &str) -> Result<String, String> {
    normalize_rfc3339_utc_seconds(s).map_err(|_| format!("invalid RFC3339 timestamp `{s}`"))
}

/// Current time in the same normalized form.
pub fn now_timestamp() -> String {
    now_rfc3339_utc_seconds()
}

/// Reject any explicit URI scheme (e.g., http://, https://, file://).
#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

/// Every path-like flag of the parsed command.
fn iter_all_paths(cli: &Cli) -> Vec<&Path> {
    match &cli.command {
        Command::Init { report, .. } => vec![report.dir.as_path()],
        Command::List { dir } => vec![dir.as_path()],
        Command::Validate { source, params } => {
            [Some(source.dir.as_path()), source.workbook.as_deref(), params.as_deref()]
                .into_iter()
                .flatten()
                .collect()
        }
        Command::Compute { source, params, out, .. } => {
            [Some(source.dir.as_path()), source.workbook.as_deref(), params.as_deref(), Some(out.as_path())]
                .into_iter()
                .flatten()
                .collect()
        }
        Command::Category(c) => vec![c.target().report.dir.as_path()],
    }
}

impl CategoryCommand {
    pub fn target(&self) -> &StreamRef {
        match self {
            CategoryCommand::Add { target, .. }
            | CategoryCommand::Update { target, .. }
            | CategoryCommand::Rename { target, .. }
            | CategoryCommand::Delete { target, .. } => target,
        }
    }
}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Cli, CliError> {
    let cli = Cli::parse();
    check_paths(&cli)?;
    Ok(cli)
}

pub fn check_paths(cli: &Cli) -> Result<(), CliError> {
    for p in iter_all_paths(cli) {
        ensure_local_path(p)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn clap_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn timestamp_is_normalized_to_utc_seconds() {
        assert_eq!(parse_timestamp("2025-03-01T10:30:00.750+02:00").unwrap(), "2025-03-01T08:30:00Z");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn stream_codes() {
        assert_eq!(parse_stream("license").unwrap(), StreamKind::License);
        let err = parse_stream("parking").unwrap_err();
        assert!(err.contains("short_term_user_charge"), "{err}");
    }

    #[test]
    fn schemes_are_rejected() {
        let cli = Cli::try_parse_from(["rosra", "list", "--dir", "https://example.org/reports"]).unwrap();
        assert!(matches!(check_paths(&cli), Err(CliError::NonLocalPath(_))));
        let cli = Cli::try_parse_from(["rosra", "list", "--dir", "/tmp/reports"]).unwrap();
        assert!(check_paths(&cli).is_ok());
    }

    #[test]
    fn compute_needs_exactly_one_source() {
        assert!(Cli::try_parse_from(["rosra", "compute"]).is_err());
        assert!(Cli::try_parse_from(["rosra", "compute", "--report", "a", "--workbook", "wb.json"]).is_err());
        let cli = Cli::try_parse_from(["rosra", "compute", "--workbook", "wb.json", "--render", "json", "html"])
            .unwrap();
        let Command::Compute { render, .. } = cli.command else { panic!("expected compute") };
        assert_eq!(render, vec![RenderFormat::Json, RenderFormat::Html]);
    }

    #[test]
    fn update_accepts_negative_raw_values() {
        let cli = Cli::try_parse_from([
            "rosra", "category", "update", "--report", "r1", "--stream", "license", "--id", "LIC-1", "--field",
            "license_fee", "--value", "-5",
        ])
        .unwrap();
        let Command::Category(CategoryCommand::Update { value, .. }) = cli.command else { panic!("expected update") };
        assert_eq!(value, "-5");
    }
}
