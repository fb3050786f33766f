use anyhow::{bail, Context};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use smsa_core::{SmsaConfig, SmsaRuntime, GEOMETRY, MAX_ADDRESS};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "smsa",
    about = "Read and write the flat address space of a simulated drum array."
)]
struct Args {
    /// Backing store image (overrides --config and SMSA_STORE).
    #[arg(long, value_name = "PATH", global = true)]
    store: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print drum array operation counts as JSON on exit.
    #[arg(long, default_value_t = false, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Zero the whole address space.
    Format,
    /// Dump a byte range as hex, or raw into --out.
    Read {
        #[command(flatten)]
        span: Span,
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Write bytes given as hex or taken from a file.
    Write {
        /// Start address (decimal or 0x hex).
        #[arg(long, value_parser = parse_number)]
        addr: u32,
        /// Bytes as hex, e.g. "de ad be ef" or "deadbeef".
        #[arg(long, value_name = "HEX", conflicts_with = "file")]
        hex: Option<String>,
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Write LEN copies of one byte.
    Fill {
        #[command(flatten)]
        span: Span,
        #[arg(long, value_parser = parse_number)]
        byte: u32,
    },
    /// Print geometry and effective configuration.
    Info,
}

#[derive(ClapArgs, Debug)]
struct Span {
    /// Start address (decimal or 0x hex).
    #[arg(long, value_parser = parse_number)]
    addr: u32,
    /// Length in bytes (decimal or 0x hex).
    #[arg(long, value_parser = parse_number)]
    len: u32,
}

impl Span {
    /// Buffer of `len` copies of `fill`, allocated only once the span is known to
    /// fit the address space.
    fn buffer(&self, fill: u8) -> anyhow::Result<Vec<u8>> {
        let len = self.len as usize;
        smsa_core::geometry::check_range(self.addr, len)?;
        Ok(vec![fill; len])
    }
}

#[derive(Serialize)]
struct Info<'a> {
    geometry: smsa_core::geometry::GeometryInfo,
    config: &'a SmsaConfig,
}

struct StderrLogger {
    level: log::LevelFilter,
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[ {:>5} ] [{}] {}",
                record.level(),
                record.module_path().unwrap_or("<n/a>"),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => env::var("SMSA_LOG")
            .ok()
            .and_then(|raw| raw.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Warn),
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let logger = Box::leak(Box::new(StderrLogger { level }));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

fn parse_number(raw: &str) -> Result<u32, String> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid number '{raw}': {e}"))
}

fn parse_hex_bytes(raw: &str) -> anyhow::Result<Vec<u8>> {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != ':')
        .collect();
    let digits = digits.strip_prefix("0x").unwrap_or(digits.as_str());
    if !digits.is_ascii() {
        bail!("hex input contains non-ASCII characters");
    }
    if digits.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("invalid hex byte '{}'", &digits[i..i + 2]))
        })
        .collect()
}

fn hex_dump(out: &mut impl Write, base: u32, bytes: &[u8]) -> io::Result<()> {
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let addr = base as usize + row * 16;
        let hex = chunk
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        let ascii: String = chunk
            .iter()
            .map(|b| if b.is_ascii_graphic() { *b as char } else { '.' })
            .collect();
        writeln!(out, "{addr:06X}  {hex:<47}  {ascii}")?;
    }
    Ok(())
}

fn resolve_config(args: &Args) -> anyhow::Result<SmsaConfig> {
    let mut config = match &args.config {
        Some(path) => SmsaConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SmsaConfig::default(),
    };
    config = config.with_env_overrides();
    if let Some(store) = &args.store {
        config.store_path = store.clone();
    }
    Ok(config)
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;

    if let Command::Info = args.command {
        let info = Info {
            geometry: GEOMETRY,
            config: &config,
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let mut rt = SmsaRuntime::simulated(config);
    let report = rt.mount()?;
    if report.reformatted {
        log::info!(
            "formatted {} (previous size 0x{:X})",
            rt.config().store_path.display(),
            report.previous_len
        );
    }

    match &args.command {
        Command::Format => rt.write(0, &vec![0u8; MAX_ADDRESS])?,
        Command::Read { span, out } => {
            let mut buf = span.buffer(0)?;
            rt.read(span.addr, &mut buf)?;
            match out {
                Some(path) => fs::write(path, &buf)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => hex_dump(&mut io::stdout().lock(), span.addr, &buf)?,
            }
        }
        Command::Write { addr, hex, file } => {
            let data = match (hex, file) {
                (Some(hex), None) => parse_hex_bytes(hex)?,
                (None, Some(path)) => {
                    fs::read(path).with_context(|| format!("reading {}", path.display()))?
                }
                _ => bail!("write needs exactly one of --hex or --file"),
            };
            rt.write(*addr, &data)?;
        }
        Command::Fill { span, byte } => {
            let Ok(value) = u8::try_from(*byte) else {
                bail!("fill byte 0x{byte:X} does not fit in a byte");
            };
            rt.write(span.addr, &span.buffer(value)?)?;
        }
        Command::Info => {}
    }

    rt.unmount()?;
    if args.stats {
        println!("{}", serde_json::to_string_pretty(&rt.drum_stats())?);
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    if let Err(err) = run(args) {
        eprintln!("fatal: {err:#}");
        std::process::exit(1);
    }
}
