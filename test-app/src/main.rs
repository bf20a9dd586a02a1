// ivilib test application -- CLI tool for exercising the Rigol, Agilent and
// Tektronix backends against real hardware or in simulate mode.
//
// Usage:
//   ivilib-test-app list
//   ivilib-test-app list --vendor rigol
//   ivilib-test-app --vendor rigol --model MSO5072 --host 192.168.1.50 info
//   ivilib-test-app --vendor rigol --model MSO5072 --simulate \
//       set output.standard_waveform.frequency 2500 --index output2
//   ivilib-test-app --vendor rigol --model DS1104Z --serial /dev/ttyUSB0 settings
//   ivilib-test-app --vendor agilent --model MSO9064A --host scope fetch-digital d0
//   ivilib-test-app --vendor tektronix --model DPO7354C --host scope fetch channel1
//   ivilib-test-app --vendor tektronix --model DPO7354C --host scope screenshot screen.png

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ivilib::agilent::{AgilentBuilder, AgilentInstrument, models as agilent_models};
use ivilib::rigol::{RigolBuilder, RigolInstrument, models as rigol_models};
use ivilib::tektronix::{TektronixBuilder, TektronixInstrument, models as tektronix_models};
use ivilib::{
    AnalogWaveformFetch, AttributeValue, DigitalWaveformFetch, FunctionGenerator, Index,
    Instrument,
};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// ivilib test application -- exercises instrument backends from the command line.
#[derive(Parser)]
#[command(name = "ivilib-test-app", version, about)]
struct Cli {
    /// Vendor: rigol, agilent, tektronix.
    /// Required for all commands except `list`.
    #[arg(long)]
    vendor: Option<String>,

    /// Model name (e.g. MSO5072, MSO9064A, DPO7354C).
    /// Required for all commands except `list`.
    #[arg(long)]
    model: Option<String>,

    /// Instrument host name or IP address for a raw SCPI socket.
    #[arg(long)]
    host: Option<String>,

    /// Raw SCPI socket port.
    #[arg(long)]
    port: Option<u16>,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    #[arg(long)]
    serial: Option<String>,

    /// Serial baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Per-exchange timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Run without hardware: writes only update the cache.
    #[arg(long)]
    simulate: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all supported models (optionally filtered by vendor).
    List {
        /// Filter by vendor: rigol, agilent, tektronix.
        #[arg(long)]
        vendor: Option<String>,
    },

    /// Print identity and the attribute table.
    Info,

    /// Read one attribute.
    Get {
        /// Attribute name (e.g. output.standard_waveform.frequency).
        attribute: String,

        /// Channel or output, by name or zero-based position (default: 0).
        #[arg(long)]
        index: Option<String>,
    },

    /// Write one attribute.
    Set {
        /// Attribute name.
        attribute: String,

        /// New value, parsed according to the attribute's kind.
        value: String,

        /// Channel or output, by name or zero-based position (default: 0).
        #[arg(long)]
        index: Option<String>,
    },

    /// Read every standard waveform setting of a generator output (Rigol).
    Settings {
        /// Output, by name or zero-based position (default: 0).
        #[arg(long)]
        index: Option<String>,
    },

    /// Fetch a logic analyzer capture (Rigol MSO, Agilent).
    FetchDigital {
        /// Source channel (e.g. d0).
        source: String,

        /// Print at most this many points.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Fetch an analog capture (Tektronix).
    Fetch {
        /// Channel (e.g. channel1).
        channel: String,

        /// Print at most this many points.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Save a screen capture to a file (Tektronix DPO7000).
    Screenshot {
        /// Output file path.
        path: PathBuf,

        /// Image format.
        #[arg(long, default_value = "png")]
        format: String,
    },
}

// ---------------------------------------------------------------------------
// Driver dispatch
// ---------------------------------------------------------------------------

/// One connected instrument of any supported vendor.
enum Driver {
    Rigol(RigolInstrument),
    Agilent(AgilentInstrument),
    Tektronix(TektronixInstrument),
}

impl Driver {
    fn instrument(&self) -> &Instrument {
        match self {
            Driver::Rigol(d) => d.instrument(),
            Driver::Agilent(d) => d.instrument(),
            Driver::Tektronix(d) => d.instrument(),
        }
    }
}

/// Interpret `"2"` as a position and anything else as a name.
fn parse_index(index: Option<&str>) -> Index {
    match index {
        None => Index::Ordinal(0),
        Some(s) => match s.parse::<usize>() {
            Ok(n) => Index::Ordinal(n),
            Err(_) => Index::Name(s.to_string()),
        },
    }
}

const VENDORS: &[&str] = &["rigol", "agilent", "tektronix"];

fn check_vendor(vendor: &str) -> Result<String> {
    let lower = vendor.to_lowercase();
    if !VENDORS.contains(&lower.as_str()) {
        bail!(
            "unknown vendor '{}'. Supported: {}",
            vendor,
            VENDORS.join(", ")
        );
    }
    Ok(lower)
}

/// Apply the shared connection options to any vendor builder.
macro_rules! configure {
    ($builder:expr, $cli:expr) => {{
        let mut b = $builder.simulate($cli.simulate);
        if let Some(host) = $cli.host.as_deref() {
            b = b.host(host);
        }
        if let Some(port) = $cli.port {
            b = b.port(port);
        }
        if let Some(serial) = $cli.serial.as_deref() {
            b = b.serial_port(serial);
        }
        if let Some(baud) = $cli.baud {
            b = b.baud_rate(baud);
        }
        if let Some(ms) = $cli.timeout_ms {
            b = b.command_timeout(Duration::from_millis(ms));
        }
        b
    }};
}

/// Construct a driver from CLI arguments, dispatching to the vendor builder.
async fn create_driver(cli: &Cli) -> Result<Driver> {
    let vendor = cli
        .vendor
        .as_deref()
        .context("--vendor is required for this command")?;
    let model_name = cli
        .model
        .as_deref()
        .context("--model is required for this command")?;

    let driver = match check_vendor(vendor)?.as_str() {
        "rigol" => {
            let model = rigol_models::rigol_model(model_name)
                .with_context(|| format!("unknown Rigol model '{model_name}'"))?;
            Driver::Rigol(configure!(RigolBuilder::new(model), cli).build().await?)
        }
        "agilent" => {
            let model = agilent_models::agilent_model(model_name)
                .with_context(|| format!("unknown Agilent model '{model_name}'"))?;
            Driver::Agilent(configure!(AgilentBuilder::new(model), cli).build().await?)
        }
        _ => {
            let model = tektronix_models::tektronix_model(model_name)
                .with_context(|| format!("unknown Tektronix model '{model_name}'"))?;
            Driver::Tektronix(configure!(TektronixBuilder::new(model), cli).build().await?)
        }
    };
    info!(vendor, model = model_name, simulate = cli.simulate, "instrument ready");
    Ok(driver)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_list(filter: Option<&str>) -> Result<()> {
    let filter = filter.map(check_vendor).transpose()?;
    let defs: Vec<_> = ivilib::supported_instruments()
        .into_iter()
        .filter(|d| {
            filter
                .as_deref()
                .is_none_or(|f| d.manufacturer.to_string().eq_ignore_ascii_case(f))
        })
        .collect();

    if defs.is_empty() {
        println!("No models found.");
        return Ok(());
    }

    println!(
        "{:<12}  {:<12}  {:>6}  {:>7}  {:>7}  {:>10}",
        "Manufacturer", "Model", "Analog", "Digital", "Outputs", "Bandwidth"
    );
    println!(
        "{:<12}  {:<12}  {:>6}  {:>7}  {:>7}  {:>10}",
        "-".repeat(12),
        "-".repeat(12),
        "------",
        "-------",
        "-------",
        "----------"
    );
    for d in &defs {
        println!(
            "{:<12}  {:<12}  {:>6}  {:>7}  {:>7}  {:>6.0} MHz",
            d.manufacturer.to_string(),
            d.model_name,
            d.analog_channels,
            d.digital_channels,
            d.outputs,
            d.bandwidth_hz / 1e6
        );
    }
    println!();
    println!("{} models total.", defs.len());
    Ok(())
}

async fn cmd_info(driver: &Driver) -> Result<()> {
    let inst = driver.instrument();
    let id = inst.identify().await?;
    println!("Instrument Information");
    println!("  Manufacturer:   {}", id.manufacturer);
    println!("  Model:          {}", id.model);
    println!("  Serial:         {}", id.serial_number);
    println!("  Firmware:       {}", id.firmware_revision);
    println!("  Class:          {}", inst.info().class);
    println!("  Simulated:      {}", inst.simulate());
    println!();
    println!("Attributes");
    for name in inst.attribute_names().await {
        println!("  {name}");
    }
    Ok(())
}

async fn cmd_get(driver: &Driver, attribute: &str, index: Index) -> Result<()> {
    let value = driver.instrument().get(attribute, index.clone()).await?;
    println!("{attribute}[{index}] = {value}");
    Ok(())
}

async fn cmd_set(driver: &Driver, attribute: &str, value: &str, index: Index) -> Result<()> {
    let mut session = driver.instrument().lock().await;
    let kind = {
        let registry = session.registry();
        registry.spec(registry.find(attribute)?).kind
    };
    let value = AttributeValue::parse(value, kind)?;
    session.set(attribute, index.clone(), value.clone()).await?;
    println!("{attribute}[{index}] <- {value}");
    Ok(())
}

async fn cmd_settings(driver: &Driver, index: Index) -> Result<()> {
    let Driver::Rigol(rigol) = driver else {
        bail!("the 'settings' command is only available for Rigol generators");
    };
    let s = rigol.read_output_settings(index.clone()).await?;
    println!("Output {index}");
    println!("  Waveform:       {}", s.waveform);
    if let Some(f) = s.frequency {
        println!("  Frequency:      {f} Hz");
    }
    println!("  Amplitude:      {} V", s.amplitude);
    println!("  DC offset:      {} V", s.dc_offset);
    if let Some(p) = s.start_phase {
        println!("  Start phase:    {p} deg");
    }
    Ok(())
}

async fn cmd_fetch_digital(driver: &Driver, source: &str, limit: usize) -> Result<()> {
    let points: Vec<(f64, String)> = match driver {
        Driver::Rigol(d) => d
            .fetch_waveform_digital(source.into())
            .await?
            .iter()
            .map(|(t, s)| (t, format!("0x{s:02x}")))
            .collect(),
        Driver::Agilent(d) => d
            .fetch_waveform_digital(source.into())
            .await?
            .iter()
            .map(|(t, s)| (t, s.clone()))
            .collect(),
        Driver::Tektronix(_) => bail!("the 'fetch-digital' command needs a logic analyzer"),
    };
    print_points(points.iter().map(|(t, s)| (*t, s.as_str())), points.len(), limit);
    Ok(())
}

async fn cmd_fetch(driver: &Driver, channel: &str, limit: usize) -> Result<()> {
    let Driver::Tektronix(tek) = driver else {
        bail!("the 'fetch' command is only available for Tektronix scopes");
    };
    let trace = tek.fetch_waveform(channel.into()).await?;
    let points: Vec<(f64, String)> = trace.iter().map(|(t, v)| (t, format!("{v:.6} V"))).collect();
    print_points(points.iter().map(|(t, s)| (*t, s.as_str())), trace.len(), limit);
    Ok(())
}

async fn cmd_screenshot(driver: &Driver, path: &Path, format: &str) -> Result<()> {
    let Driver::Tektronix(tek) = driver else {
        bail!("the 'screenshot' command is only available for Tektronix scopes");
    };
    let image = tek.fetch_screenshot(format).await?;
    std::fs::write(path, &image).with_context(|| format!("writing {}", path.display()))?;
    println!("{} bytes written to {}.", image.len(), path.display());
    Ok(())
}

fn print_points<'a>(points: impl Iterator<Item = (f64, &'a str)>, total: usize, limit: usize) {
    for (t, v) in points.take(limit) {
        println!("{t:>14.6e} s  {v}");
    }
    if total > limit {
        println!("... {} more", total - limit);
    }
    println!("{total} points.");
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();

    // The `list` command does not require an instrument.
    if let Command::List { vendor } = &cli.command {
        return cmd_list(vendor.as_deref().or(cli.vendor.as_deref()));
    }

    let driver = create_driver(&cli).await?;

    match &cli.command {
        Command::Info => cmd_info(&driver).await,
        Command::Get { attribute, index } => {
            cmd_get(&driver, attribute, parse_index(index.as_deref())).await
        }
        Command::Set {
            attribute,
            value,
            index,
        } => cmd_set(&driver, attribute, value, parse_index(index.as_deref())).await,
        Command::Settings { index } => cmd_settings(&driver, parse_index(index.as_deref())).await,
        Command::FetchDigital { source, limit } => cmd_fetch_digital(&driver, source, *limit).await,
        Command::Fetch { channel, limit } => cmd_fetch(&driver, channel, *limit).await,
        Command::Screenshot { path, format } => cmd_screenshot(&driver, path, format).await,
        Command::List { .. } => unreachable!("list handled above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_parsing() {
        assert_eq!(parse_index(None), Index::Ordinal(0));
        assert_eq!(parse_index(Some("1")), Index::Ordinal(1));
        assert_eq!(parse_index(Some("output2")), Index::Name("output2".into()));
    }

    #[test]
    fn vendor_check() {
        assert_eq!(check_vendor("Rigol").unwrap(), "rigol");
        assert!(check_vendor("keysight").is_err());
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "ivilib-test-app",
            "--vendor",
            "rigol",
            "--model",
            "MSO5072",
            "--simulate",
            "-v",
            "set",
            "output.standard_waveform.amplitude",
            "2.5",
            "--index",
            "output2",
        ])
        .unwrap();
        assert!(cli.simulate && cli.verbose);
        assert!(matches!(cli.command, Command::Set { .. }));
    }

    #[tokio::test]
    async fn simulated_set_then_get() {
        let cli = Cli::try_parse_from([
            "ivilib-test-app",
            "--vendor",
            "rigol",
            "--model",
            "mso5072",
            "--simulate",
            "info",
        ])
        .unwrap();
        let driver = create_driver(&cli).await.unwrap();
        cmd_set(&driver, "output.standard_waveform.amplitude", "2.5", Index::Ordinal(1))
            .await
            .unwrap();
        let v = driver
            .instrument()
            .get("output.standard_waveform.amplitude", 1usize)
            .await
            .unwrap();
        assert_eq!(v, AttributeValue::Float(2.5));
        assert!(cmd_set(&driver, "output.enabled", "maybe", Index::Ordinal(0)).await.is_err());
    }

    #[tokio::test]
    async fn capability_mismatch_is_reported() {
        let cli = Cli::try_parse_from([
            "ivilib-test-app",
            "--vendor",
            "agilent",
            "--model",
            "MSO9064A",
            "--simulate",
            "info",
        ])
        .unwrap();
        let driver = create_driver(&cli).await.unwrap();
        assert!(cmd_settings(&driver, Index::Ordinal(0)).await.is_err());
        assert!(cmd_fetch(&driver, "channel1", 5).await.is_err());
        assert!(cmd_screenshot(&driver, Path::new("screen.png"), "png").await.is_err());
        assert!(cmd_fetch_digital(&driver, "d0", 5).await.is_ok());
    }
}
