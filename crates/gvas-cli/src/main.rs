use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use gvas::{projection, DecodeOptions, Decoded, ProjectionOptions, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gvas", about = "Inspect and re-save tagged property save files")]
struct Cli {
    /// Save file to decode.
    input: PathBuf,
    /// Top-level structure the file holds.
    #[arg(long, default_value = "File_Data_Player")]
    entry: String,
    /// Write the decoded tree as JSON.
    #[arg(long, num_args = 0..=1, default_missing_value = "out.json")]
    json: Option<PathBuf>,
    /// Re-encode the decoded tree to this file.
    #[arg(long, num_args = 0..=1, default_missing_value = "out.sav")]
    resave: Option<PathBuf>,
    /// Leave property tags out of the JSON output.
    #[arg(long)]
    skip_tags: bool,
    /// Abort on the first recoverable fault instead of skipping past it.
    #[arg(long)]
    fail_fast: bool,
    /// Re-encode in memory and compare with the input.
    #[arg(long)]
    check: bool,
    /// List the known entry points and exit.
    #[arg(long)]
    list_entries: bool,
    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let registry = gvas::schema::registry().context("failed to build struct registry")?;
    debug!(structs = registry.len(), "registry ready");
    if cli.list_entries {
        for name in registry.entry_point_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let data = fs::read(&cli.input)
        .with_context(|| format!("failed to read save file: {}", cli.input.display()))?;

    let options = DecodeOptions {
        fail_fast: cli.fail_fast,
        ..DecodeOptions::default()
    };
    let mut decoded = gvas::decode(&data, &cli.entry, &registry, options)
        .with_context(|| format!("failed to decode {} as {}", cli.input.display(), cli.entry))?;
    report(&cli.entry, &data, &decoded);

    if let Some(path) = &cli.json {
        let options = if cli.skip_tags {
            ProjectionOptions::values_only()
        } else {
            ProjectionOptions::default()
        };
        write_json(path, &decoded.value, &options)?;
    }

    if cli.check {
        let encoded = gvas::encode(&mut decoded.value, &cli.entry, &registry)
            .context("failed to re-encode decoded tree")?;
        match first_difference(&data, &encoded) {
            None => eprintln!("[check] round trip is byte-identical ({} bytes)", data.len()),
            Some(at) => bail!(
                "round trip differs at offset {at:#x} (input {} bytes, output {} bytes)",
                data.len(),
                encoded.len()
            ),
        }
    }

    if let Some(path) = &cli.resave {
        let encoded = gvas::encode(&mut decoded.value, &cli.entry, &registry)
            .context("failed to re-encode decoded tree")?;
        fs::write(path, &encoded)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("[resave] wrote {} ({} bytes)", path.display(), encoded.len());
    }

    Ok(())
}

fn report(entry: &str, data: &[u8], decoded: &Decoded) {
    let properties = match &decoded.value {
        Value::Record(record) => record
            .get("Data")
            .and_then(Value::as_struct)
            .map_or(0, |list| list.len()),
        _ => 0,
    };
    eprintln!(
        "[decode] {entry}: {} bytes, {properties} top-level properties, {} faults",
        data.len(),
        decoded.faults.len()
    );
    for fault in &decoded.faults {
        eprintln!("[fault] {fault}");
    }
}

fn write_json(path: &Path, value: &Value, options: &ProjectionOptions) -> Result<()> {
    let json = projection::to_json(value, options);
    let text = serde_json::to_string_pretty(&json).context("failed to serialize JSON")?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("[json] wrote {}", path.display());
    Ok(())
}

fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}
