//! namefmt CLI - render and inspect placeholder templates
//!
//! Usage:
//!   namefmt render 'release-${version}-${date:%Y%m%d}' --set version=1.4 --now date
//!   namefmt render --file notes.tmpl --env
//!   namefmt scan --file notes.tmpl

use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use namefmt_core::{CaseFold, NamedFormatter, Pattern};

/// namefmt - named-placeholder template rendering
#[derive(Parser)]
#[command(name = "namefmt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template by substituting registered markers
    Render {
        /// Template text (reads stdin when omitted and --file is not given)
        template: Option<String>,

        /// Read the template from a file instead
        #[arg(short, long, conflicts_with = "template")]
        file: Option<PathBuf>,

        /// Bind a marker: NAME=VALUE (repeatable; integers and floats honor
        /// format tokens like 000 or 0.00, everything else is literal)
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Satisfy remaining markers from environment variables
        #[arg(short, long)]
        env: bool,

        /// Bind NAME to the current UTC time (format tokens use strftime)
        #[arg(long, value_name = "NAME")]
        now: Option<String>,

        /// Custom marker pattern (must define a `name` capture group)
        #[arg(short, long)]
        pattern: Option<String>,

        /// Match marker names case-insensitively
        #[arg(short, long)]
        ignore_case: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the marker names present in a template
    Scan {
        /// Template text (reads stdin when omitted and --file is not given)
        template: Option<String>,

        /// Read the template from a file instead
        #[arg(short, long, conflicts_with = "template")]
        file: Option<PathBuf>,

        /// Custom marker pattern (must define a `name` capture group)
        #[arg(short, long)]
        pattern: Option<String>,
    },
}

/// Run the CLI with the given arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            file,
            set,
            env,
            now,
            pattern,
            ignore_case,
            output,
        } => cmd_render(template, file, set, env, now, pattern, ignore_case, output),

        Commands::Scan {
            template,
            file,
            pattern,
        } => cmd_scan(template, file, pattern),
    }
}

fn load_template(template: Option<String>, file: Option<PathBuf>) -> Result<String, String> {
    if let Some(text) = template {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|e| format!("Failed to read stdin: {}", e))?;
    Ok(text)
}

fn build_pattern(pattern: Option<&str>) -> Result<Pattern, String> {
    match pattern {
        Some(text) => Pattern::new(text).map_err(|e| e.to_string()),
        None => Ok(Pattern::default()),
    }
}

/// Bind a `NAME=VALUE` pair, sniffing numeric values so format tokens work
fn bind_set(formatter: &mut NamedFormatter, spec: &str) -> Result<(), String> {
    let (name, value) = spec
        .split_once('=')
        .ok_or_else(|| format!("Invalid --set '{}': expected NAME=VALUE", spec))?;

    let result = if let Ok(int) = value.parse::<i64>() {
        formatter.add_formattable(name, int)
    } else if let Ok(float) = value.parse::<f64>() {
        formatter.add_formattable(name, float)
    } else {
        formatter.add(name, value)
    };

    result.map(|_| ()).map_err(|e| e.to_string())
}

/// Bind unsatisfied marker names to matching environment variables
fn bind_env(formatter: &mut NamedFormatter, template: &str) -> Result<(), String> {
    let names: Vec<String> = formatter
        .pattern()
        .markers(template)
        .map(|m| m.name.to_string())
        .collect();

    let mut seen = HashSet::new();
    for name in names {
        if formatter.contains(&name) || !seen.insert(name.clone()) {
            continue;
        }
        if let Ok(value) = std::env::var(&name) {
            formatter
                .add(&name, value)
                .map(|_| ())
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_render(
    template: Option<String>,
    file: Option<PathBuf>,
    set: Vec<String>,
    env: bool,
    now: Option<String>,
    pattern: Option<String>,
    ignore_case: bool,
    output: Option<PathBuf>,
) -> ExitCode {
    let template = match load_template(template, file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let formatter = match build_formatter(&template, set, env, now, pattern, ignore_case) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    match formatter.format(&template) {
        Ok(rendered) => match output {
            Some(path) => {
                if let Err(e) = std::fs::write(&path, rendered) {
                    eprintln!("{}", format!("Failed to write {}: {}", path.display(), e).red());
                    return ExitCode::from(2);
                }
                println!("{} wrote {}", "✓".green(), path.display());
                ExitCode::SUCCESS
            }
            None => {
                println!("{}", rendered);
                ExitCode::SUCCESS
            }
        },
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            ExitCode::from(1)
        }
    }
}

fn build_formatter(
    template: &str,
    set: Vec<String>,
    env: bool,
    now: Option<String>,
    pattern: Option<String>,
    ignore_case: bool,
) -> Result<NamedFormatter, String> {
    let pattern = build_pattern(pattern.as_deref())?;
    let mut formatter = NamedFormatter::from_pattern(pattern);
    if ignore_case {
        formatter = formatter.with_key_fold(CaseFold).map_err(|e| e.to_string())?;
    }

    for spec in &set {
        bind_set(&mut formatter, spec)?;
    }

    if let Some(name) = now {
        formatter
            .add_formattable_producer(&name, chrono::Utc::now)
            .map(|_| ())
            .map_err(|e| e.to_string())?;
    }

    if env {
        bind_env(&mut formatter, template)?;
    }

    Ok(formatter)
}

fn cmd_scan(template: Option<String>, file: Option<PathBuf>, pattern: Option<String>) -> ExitCode {
    let template = match load_template(template, file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let pattern = match build_pattern(pattern.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let mut seen = HashSet::new();
    let mut found = false;
    for marker in pattern.markers(&template) {
        if seen.insert(marker.name.to_string()) {
            println!("{}", marker.name);
            found = true;
        }
    }

    if found {
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", "no markers found".yellow());
        ExitCode::from(1)
    }
}
