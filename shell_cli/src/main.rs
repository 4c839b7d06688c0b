//! # Shell Property CLI
//!
//! Reads shell property cards from a JSON file, resolves them against an
//! optional material list, and prints derived quantities, the canonical
//! card text, and the record as JSON.
//!
//! ```text
//! shell_cli <cards.json> [--materials <materials.json>] [--settings <settings.json>]
//!           [--method nplies|rho*t|t] [--long]
//! ```
//!
//! `cards.json` holds one card (`["PSHELL", 1, 2, 0.1]`) or a list of
//! cards. Set `RUST_LOG=debug` to trace parsing and cross-referencing.

mod printer;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use shell_core::fields::{BdfCard, FieldWidth};
use shell_core::materials::{Material, ModelRegistry};
use shell_core::plies::{PlySelect, SmearMethod};
use shell_core::properties::ShellProperty;
use shell_core::settings::Settings;
use shell_core::PropResult;

use printer::FixedFormatPrinter;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "shell_cli")]
#[command(about = "Read, cross-reference and print shell property cards")]
#[command(version)]
struct Args {
    /// JSON file holding one card or a list of cards
    cards: PathBuf,

    /// Material list used to cross-reference the cards
    #[arg(short, long)]
    materials: Option<PathBuf>,

    /// Settings file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Non-structural mass smearing for per-ply masses (nplies, rho*t, t)
    #[arg(long)]
    method: Option<SmearMethod>,

    /// Write large-field (16 column) cards
    #[arg(short, long)]
    long: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CardInput {
    Many(Vec<BdfCard>),
    One(BdfCard),
}

impl CardInput {
    fn into_cards(self) -> Vec<BdfCard> {
        match self {
            CardInput::Many(cards) => cards,
            CardInput::One(card) => vec![card],
        }
    }
}

fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn load_settings(args: &Args) -> Result<Settings, String> {
    let mut settings = match &args.settings {
        Some(path) => Settings::from_json(&read_file(path)?).map_err(|e| e.to_string())?,
        None => Settings::default(),
    };
    if let Some(method) = args.method {
        settings.smear_method = method;
    }
    if args.long {
        settings.field_width = FieldWidth::Long;
    }
    Ok(settings)
}

fn load_registry(args: &Args) -> Result<Option<ModelRegistry>, String> {
    let Some(path) = &args.materials else {
        return Ok(None);
    };
    let materials: Vec<Material> =
        serde_json::from_str(&read_file(path)?).map_err(|e| format!("{}: {}", path.display(), e))?;
    tracing::info!(count = materials.len(), path = %path.display(), "loaded materials");
    Ok(Some(ModelRegistry::from_materials(materials)))
}

fn report(prop: &ShellProperty, resolved: bool, method: SmearMethod) -> PropResult<()> {
    println!("═══════════════════════════════════════");
    println!("  {} pid={}", prop.card_type(), prop.pid());
    println!("═══════════════════════════════════════");

    match prop.thickness() {
        Ok(t) => println!("  Thickness:      {:.6}", t),
        Err(e) => println!("  Thickness:      n/a ({})", e),
    }
    if let Ok(nsm) = prop.nonstructural_mass() {
        println!("  NSM:            {:.6}", nsm);
    }
    if resolved {
        match prop.mass_per_area() {
            Ok(mpa) => println!("  Mass/Area:      {:.6}", mpa),
            Err(e) => println!("  Mass/Area:      n/a ({})", e),
        }
    }
    println!("  Materials:      {:?}", prop.material_ids());
    if let Ok(z) = prop.z_locations() {
        println!("  z-locations:    {:?}", z);
    }

    if let Some(laminate) = prop.laminate() {
        println!();
        println!("  Plies ({}, lam={:?}):", laminate.nplies(), laminate.lamination());
        for i in 0..laminate.nplies() {
            let mass = if resolved {
                format!("{:.6}", laminate.mass_per_area(PlySelect::Ply(i), method)?)
            } else {
                "-".to_string()
            };
            println!(
                "    {:>3}  mid={:<8} t={:<10.6} theta={:<7.2} sout={:?}  m/A[{}]={}",
                i,
                laminate.material_id(i)?,
                laminate.thickness(PlySelect::Ply(i))?,
                laminate.theta(i)?,
                laminate.sout(i)?,
                method,
                mass
            );
        }
    }
    Ok(())
}

fn process(card: &BdfCard, registry: Option<&ModelRegistry>, settings: &Settings) -> PropResult<ShellProperty> {
    let mut prop = ShellProperty::parse(card)?;
    prop.verify(false)?;
    if let Some(registry) = registry {
        prop.cross_reference(registry)?;
        prop.verify(true)?;
    }

    report(&prop, registry.is_some(), settings.smear_method)?;
    println!();
    print!("{}", prop.write_card(&FixedFormatPrinter, settings.field_width));
    Ok(prop)
}

fn run(args: &Args) -> Result<bool, String> {
    let settings = load_settings(args)?;
    let registry = load_registry(args)?;
    let input: CardInput =
        serde_json::from_str(&read_file(&args.cards)?).map_err(|e| format!("{}: {}", args.cards.display(), e))?;

    let mut all_ok = true;
    for card in input.into_cards() {
        match process(&card, registry.as_ref(), &settings) {
            Ok(prop) => {
                println!();
                println!("JSON Output:");
                if let Ok(json) = serde_json::to_string_pretty(&prop) {
                    println!("{}", json);
                }
            }
            Err(e) => {
                all_ok = false;
                eprintln!("Error: {}", e);
                if let Ok(json) = serde_json::to_string_pretty(&e) {
                    eprintln!();
                    eprintln!("Error JSON:");
                    eprintln!("{}", json);
                }
            }
        }
        println!();
    }
    Ok(all_ok)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
