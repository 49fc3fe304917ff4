use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::time::Instant;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile, SourceConfig, SourceSettings};
use crate::output::{self, OutputFormat};
use crate::records;
use crate::server::{self, AppState};
use crate::source::{self, RecordPageSource, TableSource};

fn print_banner() {
    println!(
        "{} {} - community member directory service",
        "zapdir".bold().cyan(),
        env!("CARGO_PKG_VERSION")
    );
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

#[derive(Clone, Debug)]
struct RunConfig {
    port: u16,
    dump: bool,
    output: Option<String>,
    output_format: Option<String>,
    no_color: bool,
    verbose: u8,
    settings: SourceSettings,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let port = args.port.or(cfg.port).unwrap_or(config::DEFAULT_PORT);
    if port == 0 {
        return Err("invalid port, expected 1-65535".to_string());
    }

    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(config::DEFAULT_TIMEOUT_SECONDS);
    if timeout == 0 {
        return Err("invalid timeout, expected positive seconds".to_string());
    }

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = args.output_format.or(cfg.output_format);
    if let Some(raw) = output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid output format '{raw}', expected text or json"));
        }
    }

    let settings = SourceSettings {
        api_url: args.api_url.or(cfg.api_url),
        api_key: cfg.api_key,
        base_id: args.base_id.or(cfg.base_id),
        table: args.table.or(cfg.table),
        view: args.view.or(cfg.view),
        timeout_seconds: Some(timeout),
    };

    Ok(RunConfig {
        port,
        dump: args.dump,
        output,
        output_format,
        no_color,
        verbose: args.verbose,
        settings,
    })
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_async(run: RunConfig, source_config: SourceConfig) -> Result<(), String> {
    if run.dump {
        return dump_records(&run, source_config).await;
    }

    let client = source::build_client(source_config.timeout_seconds).map_err(|e| e.to_string())?;
    let state = Arc::new(AppState {
        client,
        source: source_config,
    });
    server::serve(state, run.port).await.map_err(|e| e.to_string())
}

// Drives the page loop directly so the spinner can tick per page; the serve
// path goes through fetch_all_records instead.
async fn dump_records(run: &RunConfig, source_config: SourceConfig) -> Result<(), String> {
    let now = Instant::now();
    let client = source::build_client(source_config.timeout_seconds).map_err(|e| e.to_string())?;
    let mut table = TableSource::new(client, source_config);

    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {elapsed} {msg}")
            .map_err(|e| format!("failed to build progress style: {e}"))?,
    );

    let mut all: Vec<records::ZapRecord> = Vec::new();
    let mut pages = 0usize;
    loop {
        let rows = match table.next_page().await {
            Ok(Some(rows)) => rows,
            Ok(None) => break,
            Err(e) => {
                pb.finish_and_clear();
                return Err(e.to_string());
            }
        };
        pages += 1;
        for row in rows.iter() {
            all.push(records::normalize_fields(&row.fields));
        }
        pb.set_message(format!("page {pages} ({} records)", all.len()));
    }
    pb.finish_and_clear();

    let format = run
        .output_format
        .as_deref()
        .and_then(OutputFormat::parse)
        .or_else(|| run.output.as_deref().and_then(output::infer_format_from_path))
        .unwrap_or(OutputFormat::Json);
    let rendered = match format {
        OutputFormat::Json => output::render_json(&all),
        OutputFormat::Text => output::render_text(&all),
    };

    match run.output.as_deref() {
        Some(path) => tokio::fs::write(path, &rendered)
            .await
            .map_err(|e| format!("failed to write output file '{path}': {e}"))?,
        None => std::io::stdout()
            .write_all(&rendered)
            .map_err(|e| format!("failed to write output: {e}"))?,
    }

    let elapsed = now.elapsed();
    println!(
        ":: Completed :: {} records in {}s ::",
        all.len(),
        elapsed.as_secs()
    );
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = CliArgs::parse();

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    init_tracing(run.verbose);
    if run.no_color {
        colored::control::set_override(false);
    }

    // Fail fast before binding anything when credentials are absent.
    let source_config = config::resolve_source_config(run.settings.clone())?;

    print_banner();
    format_kv_line(
        "Source",
        &format!(
            "table={} view={} api={}",
            source_config.table, source_config.view, source_config.api_url
        ),
    );
    format_kv_line("HTTP", &format!("timeout={}s", source_config.timeout_seconds));
    if run.dump {
        format_kv_line(
            "Mode",
            &format!(
                "dump format={} out={}",
                run.output_format.as_deref().unwrap_or("auto"),
                run.output.as_deref().unwrap_or("stdout")
            ),
        );
    } else {
        format_kv_line("Mode", &format!("serve 0.0.0.0:{}", run.port));
    }
    println!();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run, source_config))
}
