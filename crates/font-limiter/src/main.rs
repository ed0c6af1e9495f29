use std::{
    fs::read,
    io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use env_logger::{Builder, Env};
use font_limiter::{
    AxisLimits, Condition, LayoutTable, TentSolver, TupleVariation, UserAxisLimit,
    hvar_regions, limit_feature_variations, limit_hvar_regions,
};
use read_fonts::{FontRef, TableProvider, types::Tag};
use skrifa::MetadataProvider;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Limiter(#[from] font_limiter::Error),
    #[error("no axis limits given")]
    NoLimits,
}

#[derive(Parser)]
#[command(name = "font-limiter", version)]
#[command(about = "Restrict variable font axes and report how variations are rewritten")]
struct Cli {
    /// Input variable font file
    input: PathBuf,

    /// Axis limits as TAG=VALUE, TAG=MIN:MAX or TAG=MIN:DEFAULT:MAX (e.g., wght=300:700)
    limits: Vec<String>,

    /// Quiet output
    #[arg(short, long)]
    quiet: bool,

    /// Log progress (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    /// Show font axes info
    #[arg(long)]
    info: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(level)).init();

    let result = if cli.info { show_info(&cli.input) } else { run(&cli) };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let user_limits = parse_limits(&cli.limits)?;

    let data = read(&cli.input)?;
    let font = FontRef::new(&data).map_err(font_limiter::Error::from)?;
    let limits = AxisLimits::from_user(&font, &user_limits)?;

    let layout = limit_feature_variations(&data, &limits)?;
    let mut solver = TentSolver::new();
    let regions = limit_hvar_regions(&data, &limits, &mut solver)?;

    if cli.quiet {
        return Ok(());
    }

    println!("Normalized limits:");
    for (tag, limit) in limits.iter() {
        println!("  {tag}  {limit}");
    }

    for table in layout.tables() {
        let original = if table.tag == Tag::new(b"GSUB") {
            font.gsub().ok().map(|t| LayoutTable::from_gsub(&t))
        } else {
            font.gpos().ok().map(|t| LayoutTable::from_gpos(&t))
        }
        .transpose()?;
        print_table(table, original.as_ref());
    }

    if !regions.is_empty() {
        print_regions(&regions);
        log::info!("{} regions solved, {} cache hits", solver.misses(), solver.hits());
    }

    Ok(())
}

fn parse_limits(args: &[String]) -> Result<Vec<UserAxisLimit>, CliError> {
    if args.is_empty() {
        return Err(CliError::NoLimits);
    }
    Ok(args.iter().map(|s| s.parse()).collect::<font_limiter::Result<_>>()?)
}

fn print_table(table: &LayoutTable, original: Option<&LayoutTable>) {
    println!("{} {}.{}", table.tag, table.version.major, table.version.minor);

    match &table.feature_variations {
        Some(fv) => {
            for (i, record) in fv.records.iter().enumerate() {
                let conditions = record
                    .condition_set
                    .conditions
                    .iter()
                    .map(Condition::to_string)
                    .collect::<Vec<_>>();
                let conditions = if conditions.is_empty() {
                    "always".to_string()
                } else {
                    conditions.join(" and ")
                };
                println!(
                    "  record {i}: {conditions} -> {} substitution(s)",
                    record.feature_table_substitution.substitutions.len()
                );
            }
        }
        None => println!("  FeatureVariations removed"),
    }

    let Some(original) = original else {
        return;
    };
    for (i, (new, old)) in table.feature_list.iter().zip(&original.feature_list).enumerate() {
        if new.feature != old.feature {
            println!(
                "  feature {i} '{}': lookups {:?} -> {:?}",
                new.tag, old.feature.lookup_indices, new.feature.lookup_indices
            );
        }
    }
}

fn print_regions(regions: &[TupleVariation]) {
    println!("HVAR regions:");
    for region in regions {
        let share = region.deltas.first().copied().flatten().map_or(0.0, |d| d.x);
        if region.is_default() {
            println!("  {share:+.5} x default");
            continue;
        }
        let axes = region
            .axes
            .iter()
            .map(|(tag, t)| format!("{tag}=({:.5}, {:.5}, {:.5})", t.lower, t.peak, t.upper))
            .collect::<Vec<_>>();
        println!("  {share:+.5} x {}", axes.join(" "));
    }
}

fn show_info(path: &Path) -> Result<(), CliError> {
    let data = read(path)?;
    let font = FontRef::new(&data).map_err(font_limiter::Error::from)?;

    let axes = font.axes();
    if axes.is_empty() {
        println!("Not a variable font");
        return Ok(());
    }

    println!("Variable font axes:");
    for axis in axes.iter() {
        println!(
            "  {:4}  {:6.0} .. {:6.0} .. {:6.0}",
            axis.tag(),
            axis.min_value(),
            axis.default_value(),
            axis.max_value(),
        );
    }

    let tables = [
        font.gpos().ok().map(|t| LayoutTable::from_gpos(&t)),
        font.gsub().ok().map(|t| LayoutTable::from_gsub(&t)),
    ];
    for table in tables.into_iter().flatten() {
        let table = table?;
        let records = table.feature_variations.as_ref().map_or(0, |fv| fv.records.len());
        println!("{}: {records} FeatureVariation record(s)", table.tag);
    }
    println!("HVAR: {} region(s)", hvar_regions(&font)?.len());

    Ok(())
}
