use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use healthgate_core::config::Config;
use healthgate_core::{
    compute_health, relevant_count, HealthReport, Severity, SeverityCounts, ThresholdConfig,
    ToolLabels,
};

#[derive(Parser, Debug)]
#[command(
    name = "healthgate",
    version,
    about = "Build health score from static analysis issue counts"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Score {
        #[arg(long, allow_negative_numbers = true)]
        healthy: Option<i32>,

        #[arg(long, allow_negative_numbers = true)]
        unhealthy: Option<i32>,

        #[arg(long)]
        minimum_severity: Option<SeverityArg>,

        /// Issue count as SEVERITY=N, repeatable
        #[arg(long = "count", value_parser = parse_count)]
        counts: Vec<(Severity, i64)>,

        /// JSON object mapping severity to count
        #[arg(long = "counts")]
        counts_file: Option<PathBuf>,

        #[arg(long)]
        tool_name: Option<String>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Exit with code 2 when health drops below this percentage
        #[arg(long)]
        fail_below: Option<u8>,

        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SeverityArg {
    Error,
    High,
    Normal,
    Low,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Error => Severity::Error,
            SeverityArg::High => Severity::High,
            SeverityArg::Normal => Severity::Normal,
            SeverityArg::Low => Severity::Low,
        }
    }
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

struct Style {
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
    yellow: &'static str,
    reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    yellow: "",
    reset: "",
};

fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("HEALTHGATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() -> std::process::ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let res = match cli.cmd {
        Commands::Score {
            healthy,
            unhealthy,
            minimum_severity,
            counts,
            counts_file,
            tool_name,
            config,
            fail_below,
            output_format,
        } => {
            load_config(config.as_deref()).and_then(|cfg| {
                let thresholds = resolve_thresholds(
                    cfg.health.unwrap_or_default(),
                    healthy,
                    unhealthy,
                    minimum_severity.map(Severity::from),
                );
                let labels = ToolLabels::new(
                    tool_name
                        .or(cfg.tool_name)
                        .unwrap_or_else(|| ToolLabels::default().name),
                );
                let fail_below = fail_below.or(cfg.fail_below);
                let counts = load_counts(counts_file.as_deref(), counts)?;
                run_score(&thresholds, &labels, &counts, fail_below, &output_format)
            })
        }
    };

    match res {
        Ok(code) => code,
        Err(e) => {
            let s = style();
            eprintln!(
                "{}{red}error:{reset} {:#}",
                s.bold,
                e,
                red = s.red,
                reset = s.reset
            );
            std::process::ExitCode::from(1)
        }
    }
}

fn parse_count(s: &str) -> Result<(Severity, i64), String> {
    let (name, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SEVERITY=N, got '{s}'"))?;
    let severity = name.parse::<Severity>().map_err(|e| e.to_string())?;
    let count = count
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid count '{}': {e}", count.trim()))?;
    Ok((severity, count))
}

fn resolve_thresholds(
    base: ThresholdConfig,
    healthy: Option<i32>,
    unhealthy: Option<i32>,
    minimum_severity: Option<Severity>,
) -> ThresholdConfig {
    ThresholdConfig {
        healthy: healthy.unwrap_or(base.healthy),
        unhealthy: unhealthy.unwrap_or(base.unhealthy),
        minimum_severity: minimum_severity.unwrap_or(base.minimum_severity),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load(p).context("load config"),
        None => Ok(Config::discover()
            .context("load discovered config")?
            .unwrap_or_default()),
    }
}

fn load_counts(
    file: Option<&Path>,
    flags: Vec<(Severity, i64)>,
) -> anyhow::Result<SeverityCounts> {
    let mut counts = match file {
        Some(p) => {
            let bytes = std::fs::read(p).with_context(|| format!("read {}", p.display()))?;
            SeverityCounts::from_json(&bytes)
                .with_context(|| format!("load counts {}", p.display()))?
        }
        None => SeverityCounts::new(),
    };
    counts.merge(&SeverityCounts::try_from_signed(flags)?)?;
    Ok(counts)
}

fn health_color(percentage: u8) -> &'static str {
    let s = style();
    if percentage >= 80 {
        s.green
    } else if percentage >= 40 {
        s.yellow
    } else {
        s.red
    }
}

fn print_report(report: Option<&HealthReport>, relevant: u64, counts: &SeverityCounts) {
    let s = style();

    for severity in Severity::ALL {
        eprintln!(
            "  {dim}{:<9}{reset}{}",
            severity.as_str().to_lowercase(),
            counts.get(severity),
            dim = s.dim,
            reset = s.reset
        );
    }
    eprintln!(
        "  {dim}relevant {reset}{bold}{}{reset}",
        relevant,
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );
    eprintln!();

    match report {
        Some(r) => eprintln!(
            "  {hc}{bold}{}%{reset}  {}",
            r.percentage,
            r.message,
            hc = health_color(r.percentage),
            bold = s.bold,
            reset = s.reset
        ),
        None => eprintln!(
            "  {dim}health reporting disabled (need 0 <= healthy < unhealthy){reset}",
            dim = s.dim,
            reset = s.reset
        ),
    }
    eprintln!();
}

#[derive(Debug, Serialize)]
struct ScoreOutput<'a> {
    health: Option<&'a HealthReport>,
    relevant: u64,
}

fn run_score(
    thresholds: &ThresholdConfig,
    labels: &ToolLabels,
    counts: &SeverityCounts,
    fail_below: Option<u8>,
    output_format: &OutputFormat,
) -> anyhow::Result<std::process::ExitCode> {
    let s = style();

    debug!(?thresholds, "scoring build health");
    let relevant = relevant_count(thresholds, counts);
    let report = compute_health(thresholds, labels, counts);

    // Machine-parseable output on stdout
    match output_format {
        OutputFormat::Text => match &report {
            Some(r) => println!("health={} relevant={}", r.percentage, relevant),
            None => println!("health=disabled relevant={}", relevant),
        },
        OutputFormat::Json => {
            let output = ScoreOutput {
                health: report.as_ref(),
                relevant,
            };
            let json = serde_json::to_string_pretty(&output).context("serialize health json")?;
            println!("{json}");
        }
    }

    // Human-readable output on stderr
    print_report(report.as_ref(), relevant, counts);

    let exit = match (&report, fail_below) {
        (Some(r), Some(min)) if r.percentage < min => {
            eprintln!(
                "  {red}{bold}UNHEALTHY{reset}  {dim}({}% < {}%){reset}",
                r.percentage,
                min,
                red = s.red,
                bold = s.bold,
                dim = s.dim,
                reset = s.reset,
            );
            std::process::ExitCode::from(2)
        }
        _ => std::process::ExitCode::from(0),
    };

    Ok(exit)
}
