mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use spacemine_core::{CatalogLoader, MiningEngine, ModuleTables, TableConfig};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use common::{TesterLoader, parse_drone_mask, split_csv};
use logic::{MiningFixture, MiningTester, Probe, Scenario, list_scenarios, resolve_seed_inputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for a terminal
    Console,
    /// Pretty-printed JSON array of results
    Json,
    /// Markdown document
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "spacemine-tester", version)]
#[command(about = "Acceptance scenarios for the spacemine asteroid tables")]
struct Args {
    /// Asteroid catalog JSON to load instead of the bundled one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Content packs to enable (comma-separated, or "all")
    #[arg(long, default_value = "")]
    packs: String,

    /// Number of module tiers to build tables for
    #[arg(long, default_value_t = 3)]
    module_tiers: u8,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Iterations per scenario run
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Distance probed by the distribution and query scenarios
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    distance: i32,

    /// Drone tiers for the distribution and query scenarios (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    drones: String,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let fixture = Arc::new(load_fixture(&args)?);
    let tester = MiningTester::new(Arc::clone(&fixture), args.verbose);

    println!("{}", "🛰️  Running Table Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let results: Vec<_> = scenarios
        .into_iter()
        .flat_map(|scenario| tester.run_scenario(scenario, &seeds, args.iterations))
        .collect();

    write_report(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:15} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "⛏️  Spacemine Table Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Result<Vec<Scenario>> {
    let mut scenarios = Vec::new();
    for token in split_csv(scenarios_arg) {
        if token.eq_ignore_ascii_case("all") {
            scenarios.extend(Scenario::ALL);
        } else if let Some(scenario) = Scenario::from_key(&token) {
            scenarios.push(scenario);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", token.yellow());
        }
    }
    let mut seen = Vec::with_capacity(scenarios.len());
    scenarios.retain(|scenario| {
        if seen.contains(scenario) {
            false
        } else {
            seen.push(*scenario);
            true
        }
    });
    if scenarios.is_empty() {
        bail!("No scenarios selected from {scenarios_arg:?}");
    }
    Ok(scenarios)
}

fn table_config(args: &Args, loader: &TesterLoader) -> Result<TableConfig> {
    let requested = split_csv(&args.packs);
    let enabled_packs = if requested.iter().any(|pack| pack == "all") {
        let catalog = loader
            .load_catalog()
            .context("loading catalog to resolve pack list")?;
        catalog.packs().into_iter().map(str::to_string).collect()
    } else {
        requested
    };
    Ok(TableConfig {
        module_tiers: args.module_tiers,
        enabled_packs,
    })
}

fn load_fixture(args: &Args) -> Result<MiningFixture> {
    let engine = MiningEngine::new(TesterLoader::new(args.catalog.clone()));
    let config = table_config(args, engine.loader())?;
    let mask = parse_drone_mask(engine.tiers(), &args.drones)?;
    let recipes = engine.load_recipes(&config)?;
    let tables = ModuleTables::build(&recipes, &config).context("building asteroid tables")?;
    log::info!(
        "loaded {} recipes into {} module tables",
        recipes.len(),
        tables.module_tiers()
    );

    Ok(MiningFixture {
        tiers: engine.tiers().clone(),
        recipes,
        tables: Arc::new(tables),
        probe: Probe {
            distance: args.distance,
            mask,
            module_tier: config.module_tiers,
        },
    })
}

fn write_report(args: &Args, results: &[logic::ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Console => logic::reports::generate_console_report(
            &mut output_target,
            results,
            start_time.elapsed(),
        )?,
        ReportFormat::Json => logic::reports::generate_json_report(&mut output_target, results)?,
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, results)?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
