//! OCES command-line tool
//!
//! Lists, inspects and evaluates the transforms in the registry.

use anyhow::{anyhow, bail, Context, Result};
use oces_color::{PixelTransform, Registry};
use oces_core::Pixel;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const USAGE: &str = "\
usage: oces [--registry FILE] <command>

commands:
  list                      list output and input transforms
  show NAME                 print a transform definition as JSON
  apply NAME R G B [A]      evaluate an output transform on one pixel
  idt NAME R G B [A]        evaluate an input transform on one pixel
  export FILE               write the registry to FILE";

#[derive(Debug, PartialEq)]
enum Command {
    List,
    Show(String),
    Apply { name: String, pixel: Pixel },
    Idt { name: String, pixel: Pixel },
    Export(PathBuf),
    Help,
}

#[derive(Debug, PartialEq)]
struct Args {
    registry: Option<PathBuf>,
    command: Command,
}

fn parse_pixel(values: &[String]) -> Result<Pixel> {
    if values.len() != 3 && values.len() != 4 {
        bail!("expected R G B [A], got {} values", values.len());
    }
    let mut channels = [0.0f32, 0.0, 0.0, 1.0];
    for (slot, raw) in channels.iter_mut().zip(values) {
        *slot = raw
            .parse()
            .with_context(|| format!("invalid channel value '{}'", raw))?;
    }
    Ok(Pixel::from(channels))
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut registry = None;
    let mut rest = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--registry" {
            let path = iter.next().ok_or_else(|| anyhow!("--registry needs a file"))?;
            registry = Some(PathBuf::from(path));
        } else {
            rest.push(arg);
        }
    }

    let command = match rest.first().map(String::as_str) {
        None | Some("help") | Some("--help") | Some("-h") => Command::Help,
        Some("list") => Command::List,
        Some("show") => Command::Show(name_arg(&rest)?),
        Some("apply") => Command::Apply {
            name: name_arg(&rest)?,
            pixel: parse_pixel(&rest[2..])?,
        },
        Some("idt") => Command::Idt {
            name: name_arg(&rest)?,
            pixel: parse_pixel(&rest[2..])?,
        },
        Some("export") => Command::Export(PathBuf::from(name_arg(&rest)?)),
        Some(other) => bail!("unknown command '{}'\n\n{}", other, USAGE),
    };
    Ok(Args { registry, command })
}

fn name_arg(rest: &[String]) -> Result<String> {
    rest.get(1)
        .cloned()
        .ok_or_else(|| anyhow!("'{}' needs an argument\n\n{}", rest[0], USAGE))
}

fn format_pixel(p: Pixel) -> String {
    format!("{} {} {} {}", p.r, p.g, p.b, p.a)
}

fn run(args: Args) -> Result<()> {
    let mut registry = Registry::with_builtins();
    if let Some(path) = &args.registry {
        registry
            .load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
    }

    match args.command {
        Command::Help => println!("{}", USAGE),
        Command::List => {
            println!("output transforms:");
            for d in registry.outputs() {
                println!("  {:<28} {}", d.name, d.description);
            }
            println!("input transforms:");
            for d in registry.inputs() {
                println!("  {:<28} {}", d.name, d.description);
            }
        }
        Command::Show(name) => {
            let json = match registry.output(&name) {
                Ok(d) => serde_json::to_string_pretty(d)?,
                Err(_) => serde_json::to_string_pretty(registry.input(&name)?)?,
            };
            println!("{}", json);
        }
        Command::Apply { name, pixel } => {
            let odt = registry.compile_output(&name)?;
            println!("{}", format_pixel(odt.apply_pixel(pixel)?));
        }
        Command::Idt { name, pixel } => {
            let idt = registry.compile_input(&name)?;
            println!("{}", format_pixel(idt.apply_pixel(pixel)?));
        }
        Command::Export(path) => {
            registry.save_to_file(&path)?;
            info!(path = %path.display(), "Registry written");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = parse_args(std::env::args().skip(1))?;
    run(args)
}
