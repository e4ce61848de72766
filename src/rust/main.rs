use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use firerisk::fields::{self, FieldKind, FIELDS};
use firerisk::map::{heatmap_grid, DEFAULT_GRID_SPACING};
use firerisk::tracker::{step, TrackerEvent, TrackerState, TrackerView};
use firerisk::{
    ArtifactStore, Coordinates, Geocoder, PredictionOutcome, PredictionResult, PropertyForm,
    RiskPredictor,
};
use log::{info, warn};
use serde_json::Value;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the model artifacts (defaults to $FIRERISK_ARTIFACTS or the user data dir)
    #[arg(short, long, global = true)]
    artifacts: Option<PathBuf>,

    /// Skip checking artifacts against manifest.json
    #[arg(long, global = true)]
    skip_verify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict the damage category for one property
    Predict(PredictArgs),
    /// Show the loaded feature schema
    Schema,
    /// Check artifact digests against the manifest
    Verify,
    /// List the input fields and their options
    Fields,
    /// Follow a live location from `start`, `stop`, `none` or `lat,lon` lines on stdin
    Track,
}

#[derive(Args)]
struct PredictArgs {
    /// JSON object of field -> value; field flags are ignored when given
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Print the tagged prediction outcome as JSON
    #[arg(long)]
    json: bool,

    /// Geocode the address and print the risk heatmap
    #[arg(long)]
    map: bool,

    /// Heatmap grid spacing in degrees
    #[arg(long, default_value_t = DEFAULT_GRID_SPACING)]
    spacing: f64,

    #[command(flatten)]
    fields: FieldArgs,
}

#[derive(Args)]
struct FieldArgs {
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    county: Option<String>,
    #[arg(long)]
    community: Option<String>,
    #[arg(long)]
    veg_clearance: Option<String>,
    #[arg(long)]
    structure_type: Option<String>,
    #[arg(long)]
    roof: Option<String>,
    #[arg(long)]
    eaves: Option<String>,
    #[arg(long)]
    vent_screen: Option<String>,
    #[arg(long)]
    exterior: Option<String>,
    #[arg(long)]
    window_pane: Option<String>,
    #[arg(long)]
    topography: Option<String>,
    #[arg(long)]
    year_built: Option<String>,
}

impl FieldArgs {
    fn answers(&self) -> [(&'static str, Option<&String>); 12] {
        [
            (fields::CITY, self.city.as_ref()),
            (fields::COUNTY, self.county.as_ref()),
            (fields::COMMUNITY, self.community.as_ref()),
            (fields::VEG_CLEARANCE, self.veg_clearance.as_ref()),
            (fields::STRUCTURE_TYPE, self.structure_type.as_ref()),
            (fields::ROOF_CONSTRUCTION, self.roof.as_ref()),
            (fields::EAVES, self.eaves.as_ref()),
            (fields::VENT_SCREEN, self.vent_screen.as_ref()),
            (fields::EXTERIOR_SURFACE, self.exterior.as_ref()),
            (fields::WINDOW_PANE, self.window_pane.as_ref()),
            (fields::TOPOGRAPHY, self.topography.as_ref()),
            (fields::YEAR_BUILT, self.year_built.as_ref()),
        ]
    }

    fn is_empty(&self) -> bool {
        self.answers().iter().all(|(_, v)| v.is_none())
    }

    fn to_form(&self) -> Result<PropertyForm> {
        let mut form = PropertyForm::new();
        for (field, value) in self.answers() {
            if let Some(value) = value {
                form.set(field, value.as_str())?;
            }
        }
        Ok(form)
    }
}

fn store(cli: &Cli) -> ArtifactStore {
    match &cli.artifacts {
        Some(dir) => ArtifactStore::new(dir),
        None => ArtifactStore::new_default(),
    }
}

fn build_predictor(cli: &Cli) -> Result<RiskPredictor> {
    let store = store(cli);
    let start_time = Instant::now();
    info!("Loading artifacts from {:?}", store.dir());
    let predictor = RiskPredictor::builder()
        .verify_artifacts(!cli.skip_verify)
        .with_artifacts(&store)
        .with_context(|| format!("failed to load artifacts from {:?}", store.dir()))?
        .build()?;
    info!("Predictor ready (took {:.2?}): {}", start_time.elapsed(), predictor.engine().describe());
    Ok(predictor)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Command::Predict(args) => predict(&cli, args).await,
        Command::Schema => show_schema(&cli),
        Command::Verify => verify(&cli),
        Command::Fields => {
            show_fields();
            Ok(())
        }
        Command::Track => track(),
    }
}

async fn predict(cli: &Cli, args: &PredictArgs) -> Result<()> {
    let predictor = build_predictor(cli)?;

    let input: Value = match &args.input {
        Some(path) => {
            if !args.fields.is_empty() {
                warn!("--input given; ignoring field flags");
            }
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {:?}", path))?;
            serde_json::from_str(&text).with_context(|| format!("{:?} is not valid JSON", path))?
        }
        None => {
            let record = args.fields.to_form()?.to_record()?;
            let object = FIELDS
                .iter()
                .filter_map(|spec| {
                    record.get(spec.name).map(|value| {
                        let value = match value {
                            firerisk::AttributeValue::Text(s) => Value::from(s.as_str()),
                            firerisk::AttributeValue::Number(n) => Value::from(*n),
                        };
                        (spec.name.to_string(), value)
                    })
                })
                .collect::<serde_json::Map<_, _>>();
            Value::Object(object)
        }
    };

    let outcome = predictor.evaluate(&input);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    let result = match outcome {
        PredictionOutcome::Success(result) => result,
        PredictionOutcome::Failure { kind, message } => {
            eprintln!("\nError predicting risk ({}): {}", kind, message);
            eprintln!("Consider:");
            eprintln!("  - Checking that the input is a flat JSON object of field -> value");
            eprintln!("  - Running `firerisk fields` to see the expected field names");
            eprintln!("  - Running `firerisk schema` to check the loaded artifacts");
            bail!("prediction failed");
        }
    };

    if !args.json {
        print_result(&result);
    }

    if args.map {
        let text = |field: &str| {
            input.get(field).and_then(Value::as_str).unwrap_or_default().to_string()
        };
        let located = Geocoder::default()
            .locate(&text(fields::CITY), &text(fields::COUNTY), &text(fields::COMMUNITY))
            .await;
        print_map(located.coordinates, located.fallback, &result, args.spacing);
    }

    Ok(())
}

fn print_result(result: &PredictionResult) {
    let mut scores: Vec<_> = result.probabilities.iter().collect();
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    println!("\nResults:");
    println!("  Predicted risk: {}", result.predicted_risk);
    println!("  Probabilities (sorted):");
    for (label, score) in scores {
        println!("    {}: {:.1}%", label, score * 100.0);
    }
}

fn print_map(center: Coordinates, fallback: bool, result: &PredictionResult, spacing: f64) {
    let grid = heatmap_grid(center, &result.probabilities, spacing);
    println!("\nMap:");
    println!(
        "  Location: ({:.4}, {:.4}){}",
        center.lat,
        center.lon,
        if fallback { " [default, address not found]" } else { "" }
    );
    println!("  Marker: Predicted Risk: {}", result.predicted_risk);
    if let (Some(first), Some(last)) = (grid.first(), grid.last()) {
        println!(
            "  Heatmap: {} points from ({:.4}, {:.4}) to ({:.4}, {:.4}), peak intensity {:.3}",
            grid.len(),
            first.lat,
            first.lon,
            last.lat,
            last.lon,
            result.probabilities.max()
        );
    }
}

fn show_schema(cli: &Cli) -> Result<()> {
    let schema = store(cli).load_schema()?;
    println!("Encoding version: {}", fields::ENCODING_VERSION);
    println!("Columns: {}", schema.len());
    println!("Fingerprint: {}", schema.fingerprint());
    println!("Columns per field:");
    for (field, count) in schema.columns_per_field() {
        println!("  {}: {}", field, count);
    }
    Ok(())
}

fn verify(cli: &Cli) -> Result<()> {
    let store = store(cli);
    let Some(manifest) = store.manifest()? else {
        println!("No manifest in {:?}; nothing to verify", store.dir());
        return Ok(());
    };
    for (file, digest) in &manifest {
        println!("  {}  {}", digest, file);
    }
    if !store.verify()? {
        bail!("artifacts in {:?} do not match their manifest", store.dir());
    }
    println!("All {} artifacts verified", manifest.len());
    Ok(())
}

fn show_fields() {
    for spec in FIELDS {
        match spec.kind {
            FieldKind::Text => println!("{} ({}): free text", spec.name, spec.label),
            FieldKind::Choice(options) => {
                println!("{} ({}): {}", spec.name, spec.label, options.join(" | "))
            }
            FieldKind::Integer { min, max } => {
                println!("{} ({}): {}..={}", spec.name, spec.label, min, max)
            }
        }
    }
}

fn parse_event(line: &str) -> Option<TrackerEvent> {
    match line.trim() {
        "start" => Some(TrackerEvent::Start),
        "stop" => Some(TrackerEvent::Stop),
        "none" => Some(TrackerEvent::Fix(None)),
        other => {
            let (lat, lon) = other.split_once(',')?;
            let lat = lat.trim().parse().ok()?;
            let lon = lon.trim().parse().ok()?;
            Some(TrackerEvent::Fix(Some(Coordinates { lat, lon })))
        }
    }
}

fn track() -> Result<()> {
    let mut state = TrackerState::default();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(event) = parse_event(&line) else {
            warn!("Unrecognized tracker input: {}", line);
            continue;
        };
        let (next, view) = step(&state, event);
        state = next;
        match view {
            TrackerView::Idle => println!("Click 'start' to begin tracking"),
            TrackerView::Fetching => println!("Fetching location..."),
            TrackerView::Live { location, moved } => {
                let note = if moved { "" } else { " (unchanged)" };
                println!("Current Location: ({:.6}, {:.6}){}", location.lat, location.lon, note)
            }
            TrackerView::Stopped { last: Some(location) } => {
                println!(
                    "Tracking stopped. Last location: ({:.6}, {:.6})",
                    location.lat, location.lon
                )
            }
            TrackerView::Stopped { last: None } => println!("Tracking stopped"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_commands() {
        assert_eq!(parse_event("start"), Some(TrackerEvent::Start));
        assert_eq!(parse_event("  stop \n"), Some(TrackerEvent::Stop));
        assert_eq!(parse_event("none"), Some(TrackerEvent::Fix(None)));
    }

    #[test]
    fn test_parse_event_coordinates() {
        assert_eq!(
            parse_event("39.7596, -121.6219"),
            Some(TrackerEvent::Fix(Some(Coordinates { lat: 39.7596, lon: -121.6219 })))
        );
        assert_eq!(
            parse_event("0,0"),
            Some(TrackerEvent::Fix(Some(Coordinates { lat: 0.0, lon: 0.0 })))
        );
    }

    #[test]
    fn test_parse_event_rejects_garbage() {
        for line in ["", "go", "START", "39.7", "north,west", "1,2,3", "39.7;-121.6"] {
            assert_eq!(parse_event(line), None, "{:?} should not parse", line);
        }
    }

    #[test]
    fn test_field_flags_build_form() {
        let cli = Cli::parse_from([
            "firerisk",
            "predict",
            "--roof",
            "Metal",
            "--year-built",
            "1990",
        ]);
        let Command::Predict(args) = cli.command else {
            panic!("expected the predict command");
        };
        assert!(!args.fields.is_empty());
        let form = args.fields.to_form().unwrap();
        assert_eq!(form.get(fields::ROOF_CONSTRUCTION), Some("Metal"));
        assert_eq!(form.get(fields::YEAR_BUILT), Some("1990"));

        let cli = Cli::parse_from(["firerisk", "predict", "--eaves", "Thatch"]);
        let Command::Predict(args) = cli.command else {
            panic!("expected the predict command");
        };
        assert!(args.fields.to_form().is_err());
    }
}
