//! Indoor navigation command line interface.
//!
//! # Usage
//!
//! ```bash
//! # Fill defaults and derived fields, write the completed graph
//! indoor-nav autocomplete map.json -o map.completed.json
//!
//! # Report rule violations (exit code 1 on errors with --strict)
//! indoor-nav validate map.json --strict
//!
//! # Route with a profile, weather and alternatives
//! indoor-nav route map.json lobby lab-204 --profile accessible --weather rain -k 2
//!
//! # List routing profiles (built-ins plus configured ones)
//! indoor-nav --config router.yaml profiles
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indoor_nav::cost::{RouteContext, Weather};
use indoor_nav::persistence;
use indoor_nav::routing::RouteRequest;
use indoor_nav::validation::validate;
use indoor_nav::RouterConfig;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "indoor-nav")]
#[command(version)]
#[command(about = "Constraint-aware routing and graph integrity for indoor maps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Router configuration (YAML)
    #[arg(long, global = true, env = "INDOOR_NAV_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WeatherArg {
    Clear,
    Rain,
    Snow,
}

impl From<WeatherArg> for Weather {
    fn from(arg: WeatherArg) -> Self {
        match arg {
            WeatherArg::Clear => Weather::Clear,
            WeatherArg::Rain => Weather::Rain,
            WeatherArg::Snow => Weather::Snow,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fill defaults, infer relations and derive geometry
    Autocomplete {
        /// Graph file (JSON)
        input: PathBuf,

        /// Output file (stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scan a graph for rule violations
    Validate {
        /// Graph file (JSON)
        input: PathBuf,

        /// Fail when any error-severity issue is found
        #[arg(long)]
        strict: bool,
    },

    /// Find a route between two nodes
    Route {
        /// Graph file (JSON)
        input: PathBuf,

        /// Start node id
        start: String,

        /// Goal node id
        goal: String,

        /// Routing profile name
        #[arg(short, long, default_value = "default")]
        profile: String,

        /// Weather at the time of travel
        #[arg(short, long, default_value = "clear", value_enum)]
        weather: WeatherArg,

        /// Number of alternative routes
        #[arg(short = 'k', long)]
        alternatives: Option<usize>,

        /// Node expansion budget
        #[arg(long)]
        max_expansions: Option<usize>,
    },

    /// List available routing profiles
    Profiles,
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "indoor_nav=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Autocomplete { input, output } => cmd_autocomplete(&input, output.as_deref()),
        Commands::Validate { input, strict } => cmd_validate(&input, strict, cli.format),
        Commands::Route {
            input,
            start,
            goal,
            profile,
            weather,
            alternatives,
            max_expansions,
        } => {
            let mut request = RouteRequest::new(start, goal);
            request.profile = config
                .catalog()
                .get(&profile)
                .cloned()
                .with_context(|| format!("unknown profile '{profile}'"))?;
            request.context = RouteContext::new().with_weather(weather.into());
            request.options = config.route_options();
            if let Some(k) = alternatives {
                request.options.alternatives = k;
            }
            if max_expansions.is_some() {
                request.options.max_expansions = max_expansions;
            }
            cmd_route(&input, &request, &config, cli.format)
        }
        Commands::Profiles => cmd_profiles(&config, cli.format),
    }
}

fn load_config(path: Option<&Path>) -> Result<RouterConfig> {
    match path {
        Some(path) => RouterConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(RouterConfig::default()),
    }
}

fn load_graph(path: &Path) -> Result<indoor_nav::Graph> {
    persistence::load_file(path).with_context(|| format!("loading graph {}", path.display()))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_autocomplete(input: &Path, output: Option<&Path>) -> Result<ExitCode> {
    // Loading already runs the pipeline.
    let graph = load_graph(input)?;
    match output {
        Some(path) => persistence::save_file(&graph, path)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", persistence::save_json(&graph)?),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(input: &Path, strict: bool, format: OutputFormat) -> Result<ExitCode> {
    let graph = load_graph(input)?;
    let report = validate(&graph);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Pretty => {
            for issue in &report.issues {
                println!("{issue}");
            }
            println!(
                "{} error(s), {} warning(s)",
                report.summary.errors, report.summary.warnings
            );
        }
    }

    if strict {
        if let Err(failed) = report.ensure_valid() {
            bail!(failed);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_route(
    input: &Path,
    request: &RouteRequest,
    config: &RouterConfig,
    format: OutputFormat,
) -> Result<ExitCode> {
    let graph = load_graph(input)?;
    let result = config.router(&graph).route(request);

    if format == OutputFormat::Json {
        let response = indoor_nav::RouteResponse::from(result);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(if response.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let routes = result.with_context(|| {
        format!("routing {} -> {} ({})", request.start, request.goal, request.profile.name)
    })?;
    let all = std::iter::once(&routes.primary).chain(&routes.alternatives);
    for (i, route) in all.enumerate() {
        let label = if i == 0 {
            "route".to_string()
        } else {
            format!("alternative {i}")
        };
        let path: Vec<&str> = route.node_ids.iter().map(|n| n.as_str()).collect();
        println!("{label}: {} (cost {:.2})", path.join(" -> "), route.total_cost);
        for transition in &route.transitions {
            println!("  at {}: {}", transition.node_id, transition.description);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_profiles(config: &RouterConfig, format: OutputFormat) -> Result<ExitCode> {
    let catalog = config.catalog();
    match format {
        OutputFormat::Json => {
            let profiles: Vec<_> = catalog.iter().collect();
            println!("{}", serde_json::to_string_pretty(&profiles)?);
        }
        OutputFormat::Pretty => {
            for profile in catalog.iter() {
                println!(
                    "{:<12} {}",
                    profile.name,
                    profile.description.as_deref().unwrap_or("")
                );
                for modifier in &profile.modifiers {
                    let effect = if modifier.is_blocking() {
                        "impassable".to_string()
                    } else {
                        format!("x{} {:+}", modifier.multiplier, modifier.additive)
                    };
                    println!("    when {}: {effect}", modifier.condition);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
