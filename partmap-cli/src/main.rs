//! Partmap CLI - resolve component descriptions into purchasable parts.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use partmap::{
    ComponentMapper, ComponentSpec, MapperConfig, MappingResult, PhysicalComponent, ResultCache,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "partmap")]
#[command(about = "Component to part mapper for BOM generation", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Result cache directory
    #[arg(long, global = true, value_name = "DIR", env = "PARTMAP_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Component database JSON (built-in database when absent)
    #[arg(long, global = true, value_name = "FILE", env = "PARTMAP_DATABASE")]
    database: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map one component to a part
    Map {
        /// Component type (resistor, capacitor, led, ic, ...)
        #[arg(value_name = "TYPE")]
        component_type: String,

        #[arg(long)]
        value: Option<String>,

        #[arg(long)]
        package: Option<String>,

        #[arg(long)]
        tolerance: Option<String>,

        #[arg(long)]
        power: Option<String>,

        #[arg(long)]
        voltage: Option<String>,

        #[arg(long)]
        temperature: Option<String>,

        /// Extra attribute, repeatable
        #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Bypass the persistent cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Map every spec in a JSON array file
    Batch {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: BatchFormat,

        /// Exit with error code if any spec could not be mapped
        #[arg(long)]
        fail_on_unknown: bool,
    },

    /// Print the normalized form of a value
    Normalize {
        value: String,

        /// Component type the value belongs to
        #[arg(short = 't', long = "type", default_value = "resistor")]
        component_type: String,
    },

    /// List the component database contents
    Kb {
        /// Show recognized attributes and entry names
        #[arg(long)]
        details: bool,
    },

    /// Show which supplier APIs are configured
    Suppliers {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Inspect or clear the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached keys
    List,
    /// Delete every cached result
    Clear,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[derive(Clone, ValueEnum)]
enum BatchFormat {
    /// Human-readable table
    Human,
    /// JSON array of results
    Json,
    /// CSV bill of materials
    Csv,
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Map {
            component_type,
            value,
            package,
            tolerance,
            power,
            voltage,
            temperature,
            attributes,
            format,
            no_cache,
        } => {
            let spec = ComponentSpec {
                component_type,
                value,
                tolerance,
                power,
                voltage,
                package,
                temperature,
                attributes: attributes.into_iter().collect(),
            };
            handle_map(config, spec, format, no_cache).await
        }
        Commands::Batch {
            file,
            format,
            fail_on_unknown,
        } => handle_batch(&config, &file, format, fail_on_unknown).await,
        Commands::Normalize {
            value,
            component_type,
        } => {
            println!("{}", partmap::normalize(&value, &component_type));
            Ok(0)
        }
        Commands::Kb { details } => handle_kb(&config, details),
        Commands::Suppliers { format } => handle_suppliers(&config, format),
        Commands::Cache { action } => handle_cache(&config, action),
    }
}

/// File config (if any), then environment, then command-line flags
fn load_config(cli: &Cli) -> anyhow::Result<MapperConfig> {
    let base = match cli.config {
        Some(ref path) => MapperConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MapperConfig::default(),
    };

    let mut config = base.merge_env();
    if let Some(ref dir) = cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(ref db) = cli.database {
        config.database_path = Some(db.clone());
    }
    Ok(config)
}

async fn handle_map(
    mut config: MapperConfig,
    spec: ComponentSpec,
    format: OutputFormat,
    no_cache: bool,
) -> anyhow::Result<i32> {
    spec.validate()?;

    // Held until the mapping is done; the directory is removed on drop
    let scratch = if no_cache {
        let dir = tempfile::tempdir().context("failed to create scratch cache")?;
        config.cache_dir = dir.path().to_path_buf();
        Some(dir)
    } else {
        None
    };

    let mapper = ComponentMapper::new(&config)?;
    let result = mapper.map_component(&spec).await;
    drop(scratch);

    match format {
        OutputFormat::Human => output_result_human(&spec, &result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(0)
}

async fn handle_batch(
    config: &MapperConfig,
    file: &Path,
    format: BatchFormat,
    fail_on_unknown: bool,
) -> anyhow::Result<i32> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let specs: Vec<ComponentSpec> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of component specs", file.display()))?;

    for (i, spec) in specs.iter().enumerate() {
        if let Err(e) = spec.validate() {
            bail!("spec #{}: {}", i + 1, e);
        }
    }

    let mapper = ComponentMapper::new(config)?;
    let mut results = Vec::with_capacity(specs.len());
    for spec in &specs {
        results.push(mapper.map_component(spec).await);
    }

    match format {
        BatchFormat::Human => output_batch_human(&specs, &results),
        BatchFormat::Json => output_batch_json(&specs, &results)?,
        BatchFormat::Csv => output_batch_csv(&specs, &results),
    }

    let unknown = results.iter().filter(|r| r.is_unknown()).count();
    if unknown > 0 {
        eprintln!("{} of {} components could not be mapped", unknown, results.len());
        if fail_on_unknown {
            return Ok(1);
        }
    }
    Ok(0)
}

fn format_price(part: &PhysicalComponent) -> String {
    part.price
        .map(|p| format!("${:.4}", p))
        .unwrap_or_else(|| "-".to_string())
}

fn format_stock(part: &PhysicalComponent) -> String {
    part.stock
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn output_result_human(spec: &ComponentSpec, result: &MappingResult) {
    let part = &result.primary;

    println!("\nComponent: {}", spec);
    println!("{}", "─".repeat(60));
    println!("  MPN:          {}", part.mpn);
    println!("  Manufacturer: {}", part.manufacturer);
    println!("  Description:  {}", part.description);
    println!("  Package:      {}", part.package);
    println!("  Supplier:     {} ({})", part.supplier, part.supplier_pn);
    println!("  Price:        {}", format_price(part));
    println!("  Stock:        {}", format_stock(part));
    if let Some(ref datasheet) = part.datasheet {
        println!("  Datasheet:    {}", datasheet);
    }
    println!("  Confidence:   {:.2}", result.confidence);

    if !result.alternatives.is_empty() {
        println!("\n  Alternatives:");
        for alt in &result.alternatives {
            println!(
                "    - {} ({}, {} {}) {}",
                alt.mpn,
                alt.package,
                alt.supplier,
                alt.supplier_pn,
                format_price(alt)
            );
        }
    }

    if !result.warnings.is_empty() {
        println!("\n  Warnings:");
        for warning in &result.warnings {
            println!("    - {}", warning);
        }
    }
}

fn output_batch_human(specs: &[ComponentSpec], results: &[MappingResult]) {
    println!(
        "{:<32} {:<24} {:<10} {:<12} {:>6}",
        "COMPONENT", "MPN", "SUPPLIER", "SUPPLIER PN", "CONF"
    );
    println!("{}", "─".repeat(88));
    for (spec, result) in specs.iter().zip(results) {
        println!(
            "{:<32} {:<24} {:<10} {:<12} {:>6.2}",
            spec.to_string(),
            result.primary.mpn,
            result.primary.supplier,
            result.primary.supplier_pn,
            result.confidence
        );
        for warning in &result.warnings {
            println!("    ! {}", warning);
        }
    }
}

fn output_batch_json(specs: &[ComponentSpec], results: &[MappingResult]) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "results": specs.iter().zip(results).map(|(spec, result)| {
            serde_json::json!({
                "spec": spec,
                "result": result,
            })
        }).collect::<Vec<_>>(),
        "summary": {
            "total": results.len(),
            "unknown": results.iter().filter(|r| r.is_unknown()).count(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn output_batch_csv(specs: &[ComponentSpec], results: &[MappingResult]) {
    println!("type,value,package,mpn,manufacturer,supplier,supplier_pn,price,stock,confidence");
    for (spec, result) in specs.iter().zip(results) {
        let part = &result.primary;
        let fields = [
            csv_field(&spec.component_type),
            csv_field(spec.value.as_deref().unwrap_or("")),
            csv_field(spec.package.as_deref().unwrap_or("")),
            csv_field(&part.mpn),
            csv_field(&part.manufacturer),
            csv_field(&part.supplier),
            csv_field(&part.supplier_pn),
            part.price.map(|p| p.to_string()).unwrap_or_default(),
            part.stock.map(|s| s.to_string()).unwrap_or_default(),
            format!("{:.2}", result.confidence),
        ];
        println!("{}", fields.join(","));
    }
}

fn handle_kb(config: &MapperConfig, details: bool) -> anyhow::Result<i32> {
    let matcher = partmap::LocalMatcher::from_path(config.database_path.as_deref())?;
    let library = matcher.library();
    let (types, entries) = matcher.stats();

    println!("Component database: {} types, {} entries\n", types, entries);
    for component_type in library.types() {
        let Some(entry) = library.get(component_type) else {
            continue;
        };
        println!("  {:<12} {} entries", component_type, entry.count());
        if details {
            if !entry.attributes.is_empty() {
                println!("    attributes: {}", entry.attributes.join(", "));
            }
            let keys = entry.keys();
            if !keys.is_empty() {
                println!("    entries:    {}", keys.join(", "));
            }
        }
    }
    Ok(0)
}

fn handle_suppliers(config: &MapperConfig, format: OutputFormat) -> anyhow::Result<i32> {
    let federation = partmap::SupplierFederation::from_config(config);
    let status = federation.get_status();

    match format {
        OutputFormat::Human => {
            println!("Suppliers (query order):\n");
            for s in &status {
                let state = if s.available { "configured" } else { "not configured" };
                println!("  {:<10} {}", s.name, state);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }
    Ok(0)
}

fn handle_cache(config: &MapperConfig, action: CacheAction) -> anyhow::Result<i32> {
    let cache = ResultCache::new(&config.cache_dir)?;
    match action {
        CacheAction::List => {
            for key in cache.keys()? {
                println!("{}", key);
            }
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("Removed {} cached results from {}", removed, cache.root().display());
        }
    }
    Ok(0)
}
