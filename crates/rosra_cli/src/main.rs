// crates/rosra_cli/src/main.rs
//
// Exit codes, typed error mapping, logging setup and subcommand dispatch.
// Artifacts go to files, summaries to stdout, logs and diagnostics to stderr.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const SELF_VERIFY: i32 = 3;
    pub const IO: i32 = 4;
}

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use rosra_core::entities::Workbook;
use rosra_core::seeds::seed_workbook;
use rosra_io::canonical_json;
use rosra_io::gateway::{FileGateway, ReportGateway};
use rosra_io::loader::{self, LoadedWorkbook};
use rosra_io::IoError;
use rosra_pipeline::{
    edit_workbook, run_with_ctx, validate, EngineParams, Outcome, PipelineCtx, PipelineError, PipelineOutputs,
    Severity, StreamEdit, ValidationReport,
};
use rosra_report::{build_model, ReportError, ReportModel};

use args::{CategoryCommand, Cli, Command, RenderFormat, ReportRef, Source};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Schema / JSON shape / param domain / validation issues / no-op edits
    Validation(String),
    /// Self-verification or id construction failures
    SelfVerify(String),
    /// Read/write/path/limit errors
    Io(String),
    /// Report model or renderer failures
    Render(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::SelfVerify(m) => write!(f, "self-verify: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
            MainError::Render(m) => write!(f, "render: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let cli = match args::parse_and_validate() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("rosra: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_logging(cli.verbose);

    let rc = match dispatch(&cli) {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("rosra: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// `RUST_LOG` wins; otherwise `-v` raises the default level from warn.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests embedding main) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn dispatch(cli: &Cli) -> Result<(), MainError> {
    match &cli.command {
        Command::Init { report, title, force } => init(report, title.as_deref(), *force, cli.quiet),
        Command::List { dir } => list(dir),
        Command::Validate { source, params } => validate_only(source, params.as_deref(), cli.quiet),
        Command::Compute { source, params, out, render, timestamp } => {
            let ts = timestamp.clone().unwrap_or_else(args::now_timestamp);
            compute(source, params.as_deref(), out, render, &ts, cli.quiet)
        }
        Command::Category(cmd) => category(cmd),
    }
}

/// Map our typed errors to the exit-code table.
fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::SelfVerify(_) => SELF_VERIFY,
        MainError::Io(_) | MainError::Render(_) => IO,
    }
}

/// Translate rosra_io::IoError into MainError buckets.
fn map_io_err(e: IoError) -> MainError {
    use IoError::*;
    match e {
        Schema { pointer, msg } => MainError::Validation(format!("schema {pointer}: {msg}")),
        Json { pointer, msg } => MainError::Validation(format!("json {pointer}: {msg}")),
        Invalid(m) => MainError::Validation(m),
        Hash(m) => MainError::SelfVerify(format!("hash: {m}")),
        Path(m) => MainError::Io(format!("path: {m}")),
        Limit(m) => MainError::Io(format!("limit: {m}")),
        NotFound(id) => MainError::Io(format!("report not found: {id}")),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Io(e) => map_io_err(e),
        // Issues were already logged by the pipeline.
        PipelineError::Validation(report) => MainError::Validation(format!("{} error(s)", report.error_count())),
        PipelineError::SelfVerify(m) | PipelineError::Build(m) => MainError::SelfVerify(m),
    }
}

fn map_report_err(e: ReportError) -> MainError {
    MainError::Render(e.to_string())
}

/* ---------------------------------- loading ---------------------------------- */

fn load_source(source: &Source) -> Result<LoadedWorkbook, MainError> {
    match (&source.report, &source.workbook) {
        (_, Some(path)) => loader::load_workbook(path).map_err(map_io_err),
        (Some(id), None) => gateway(&source.dir)?.load(id).map_err(map_io_err),
        (None, None) => Err(MainError::Validation("one of --report or --workbook is required".into())),
    }
}

fn load_params(path: Option<&Path>) -> Result<EngineParams, MainError> {
    match path {
        Some(p) => loader::load_params(p).map_err(map_io_err),
        None => Ok(EngineParams::default()),
    }
}

fn gateway(dir: &Path) -> Result<FileGateway, MainError> {
    FileGateway::new(dir).map_err(map_io_err)
}

fn print_issues(report: &ValidationReport) {
    for i in &report.issues {
        let sev = match i.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        eprintln!("{sev} {} at {}: {}", i.code, i.where_, i.message);
    }
}

/* --------------------------------- commands --------------------------------- */

fn init(report: &ReportRef, title: Option<&str>, force: bool, quiet: bool) -> Result<(), MainError> {
    let mut gw = gateway(&report.dir)?;
    let path = gw.path_for(&report.report);
    if path.exists() && !force {
        return Err(MainError::Validation(format!(
            "report {} already exists (use --force to overwrite)",
            report.report
        )));
    }
    let mut wb = seed_workbook();
    if let Some(t) = title {
        wb.title = t.to_string();
    }
    let saved = gw.save(&report.report, &wb).map_err(map_io_err)?;
    if !quiet {
        eprintln!("init: wrote {} ({} bytes)", path.display(), saved.bytes);
    }
    println!("{}", saved.id);
    Ok(())
}

fn list(dir: &Path) -> Result<(), MainError> {
    for r in gateway(dir)?.list().map_err(map_io_err)? {
        println!("{}\t{}", r.id, r.title);
    }
    Ok(())
}

fn validate_only(source: &Source, params: Option<&Path>, quiet: bool) -> Result<(), MainError> {
    let loaded = load_source(source)?;
    let params = load_params(params)?;
    let report = validate(&loaded.workbook, &params, &loaded.coercions);
    print_issues(&report);
    if !report.pass {
        return Err(MainError::Validation(format!("{} error(s)", report.error_count())));
    }
    if !quiet {
        eprintln!("validate: OK ({} warning(s))", report.warning_count());
    }
    Ok(())
}

fn compute(
    source: &Source,
    params: Option<&Path>,
    out: &Path,
    render: &[RenderFormat],
    timestamp: &str,
    quiet: bool,
) -> Result<(), MainError> {
    let loaded = load_source(source)?;
    let mut ctx = PipelineCtx::new(loaded.workbook, load_params(params)?, timestamp);
    ctx.coercions = loaded.coercions;
    ctx.report_id = source.report.clone();

    let outs = run_with_ctx(ctx).map_err(map_pipeline_err)?;
    write_artifacts(out, &outs)?;
    maybe_render_reports(render, &outs, out)?;

    println!("{}", outs.run_record.outputs.result_id);
    println!("{}", outs.run_record.id);
    if !quiet {
        eprintln!("{}", outs.result.narrative.overall);
        eprintln!("{}", outs.result.narrative.largest_stream);
        eprintln!("compute: artifacts written to {}", out.display());
    }
    Ok(())
}

fn category(cmd: &CategoryCommand) -> Result<(), MainError> {
    let target = cmd.target();
    let id = &target.report.report;
    let mut gw = gateway(&target.report.dir)?;
    let mut wb: Workbook = gw.load(id).map_err(map_io_err)?.workbook;

    let edit = match cmd.clone() {
        CategoryCommand::Add { name, .. } => StreamEdit::Add { name },
        CategoryCommand::Update { id, field, value, .. } => StreamEdit::UpdateRaw { id, field, raw: value },
        CategoryCommand::Rename { id, name, .. } => StreamEdit::Rename { id, name },
        CategoryCommand::Delete { id, .. } => StreamEdit::Delete(id),
    };
    let outcome = edit_workbook(&mut wb, target.stream, edit);
    if outcome == Outcome::Ignored {
        // Nothing changed, so nothing is saved.
        return Err(MainError::Validation(format!(
            "edit had no effect on {} (unknown category id or field?)",
            target.stream.code()
        )));
    }
    gw.save(id, &wb).map_err(map_io_err)?;
    if let Outcome::Added(cat) = outcome {
        println!("{cat}");
    }
    Ok(())
}

/* --------------------------------- artifacts --------------------------------- */

fn write_artifacts(out_dir: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    fs::create_dir_all(out_dir).map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.display())))?;

    let result = serde_json::to_value(&outs.result).map_err(|e| MainError::Io(format!("result to JSON: {e}")))?;
    canonical_json::write_canonical_file(&out_dir.join("result.json"), &result)
        .map_err(|e| MainError::Io(format!("write result.json: {e}")))?;

    let run = serde_json::to_value(&outs.run_record)
        .map_err(|e| MainError::Io(format!("run_record to JSON: {e}")))?;
    canonical_json::write_canonical_file(&out_dir.join("run_record.json"), &run)
        .map_err(|e| MainError::Io(format!("write run_record.json: {e}")))?;
    Ok(())
}

fn maybe_render_reports(render: &[RenderFormat], outs: &PipelineOutputs, out_dir: &Path) -> Result<(), MainError> {
    if render.is_empty() {
        return Ok(());
    }
    // The model is built from the artifacts, never from live metrics.
    let result_val =
        serde_json::to_value(&outs.result).map_err(|e| MainError::Render(format!("result to JSON: {e}")))?;
    let run_val =
        serde_json::to_value(&outs.run_record).map_err(|e| MainError::Render(format!("run_record to JSON: {e}")))?;
    let model = build_model(&result_val, &run_val).map_err(map_report_err)?;

    for fmt in render {
        match fmt {
            RenderFormat::Json => render_json_report(&model, out_dir)?,
            RenderFormat::Html => render_html_report(&model, out_dir)?,
        }
    }
    Ok(())
}

fn render_json_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-json")]
    {
        let v = rosra_report::render_json(model).map_err(map_report_err)?;
        canonical_json::write_canonical_file(&out_dir.join("report.json"), &v)
            .map_err(|e| MainError::Io(format!("write report.json: {e}")))
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render("json renderer not enabled (build with feature `report-json`)".into()))
    }
}

fn render_html_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-html")]
    {
        let html = rosra_report::render_html(model).map_err(map_report_err)?;
        canonical_json::write_bytes_atomic(&out_dir.join("report.html"), html.as_bytes())
            .map_err(|e| MainError::Io(format!("write report.html: {e}")))
    }
    #[cfg(not(feature = "report-html"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render("html renderer not enabled (build with feature `report-html`)".into()))
    }
}
