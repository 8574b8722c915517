//! mimir - Detect the content type of files
//!
//! This tool reads the leading bytes of files and matches them against a
//! type database of magic signatures, XML root qualifiers and glob patterns.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use mimir_core::{Detection, Detector, DetectorConfig, Loader, Registry};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Bytes read from each file when the type database needs fewer
const DEFAULT_READ_LIMIT: usize = 8192;

/// Detect the content type of files from their leading bytes and names
#[derive(Parser, Debug)]
#[command(name = "mimir")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Additional type database to load (may be repeated)
    #[arg(short, long = "config", value_name = "PATH")]
    configs: Vec<PathBuf>,

    /// Do not load the bundled type database
    #[arg(long)]
    no_defaults: bool,

    /// Number of leading bytes to read from each file
    #[arg(long, value_name = "N")]
    bytes: Option<usize>,

    /// Ignore file names and detect from content only
    #[arg(long)]
    content_only: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single file to detect
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory whose files are detected recursively
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// List the types in the loaded database instead of detecting
    #[arg(long)]
    list_types: bool,
}

/// Output format for detection results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// `path: type (signal)`
    Text,
    /// Just the type name (for scripting)
    Mime,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let registry = load_registry(&cli)?;

    if cli.input.list_types {
        list_types(&registry);
        return Ok(());
    }

    let config = DetectorConfig::new().match_names(!cli.content_only);
    let detector = Detector::with_config(&registry, config);

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, &detector, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, &detector, directory)
    } else {
        bail!("One of --file, --directory or --list-types must be specified")
    }
}

/// Build the registry from the bundled database and any extra configs
fn load_registry(cli: &Cli) -> Result<Registry> {
    let mut registry = if cli.no_defaults {
        Registry::new()
    } else {
        Registry::with_defaults().context("Failed to load the bundled type database")?
    };

    let loader = Loader::new();
    for path in &cli.configs {
        loader
            .load_file(&mut registry, path)
            .with_context(|| format!("Failed to load type database: {}", path.display()))?;
        info!("Loaded {}", path.display());
    }

    debug!("Registry holds {} types", registry.len());
    Ok(registry)
}

/// Print every known type with its parent and description
fn list_types(registry: &Registry) {
    let mut types: Vec<_> = registry.types().collect();
    types.sort_by(|(_, a), (_, b)| a.name().cmp(b.name()));

    for (_, ty) in types {
        let parent = ty
            .supertype()
            .map(|p| format!(" < {}", registry.name(p)))
            .unwrap_or_default();
        match ty.description() {
            Some(description) => println!("{}{}\t{}", ty.name(), parent, description),
            None => println!("{}{}", ty.name(), parent),
        }
    }
}

/// Detect a single file
fn process_single_file(cli: &Cli, detector: &Detector<'_>, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let detection = detect_file(cli, detector, file)?;
    println!("{}", render(cli.format, detector.registry(), file, detection));
    Ok(())
}

/// Detect every file under a directory
fn process_directory(cli: &Cli, detector: &Detector<'_>, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut files_processed = 0;
    let mut unknown = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        match detect_file(cli, detector, path) {
            Ok(detection) => {
                if detection.is_unknown() {
                    unknown += 1;
                }
                println!("{}", render(cli.format, detector.registry(), path, detection));
                files_processed += 1;
            }
            Err(e) => {
                // Log error but continue with other files
                warn!("Error processing {}: {:#}", path.display(), e);
            }
        }
    }

    info!(
        "Processed {} files ({} of unknown type)",
        files_processed, unknown
    );
    Ok(())
}

/// Skip dotfiles and dot-directories
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Read the leading bytes of a file and detect its type
fn detect_file(cli: &Cli, detector: &Detector<'_>, path: &Path) -> Result<Detection> {
    let limit = cli
        .bytes
        .unwrap_or_else(|| detector.min_length().max(DEFAULT_READ_LIMIT));
    let data = read_prefix(path, limit)?;
    trace!("Read {} bytes from {}", data.len(), path.display());

    let name = path.file_name().and_then(|n| n.to_str());
    Ok(detector.detect_with_name(&data, name))
}

/// Read at most `limit` bytes from the start of a file
fn read_prefix(path: &Path, limit: usize) -> Result<Vec<u8>> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut data = Vec::with_capacity(limit.min(64 * 1024));
    file.take(limit as u64)
        .read_to_end(&mut data)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(data)
}

/// Format one detection result
fn render(format: OutputFormat, registry: &Registry, path: &Path, detection: Detection) -> String {
    let name = detection
        .content_type()
        .map(|r| registry.name(r))
        .unwrap_or("application/octet-stream");

    match format {
        OutputFormat::Mime => name.to_string(),
        OutputFormat::Text => format!("{}: {} ({})", path.display(), name, detection.signal()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_read_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");
        fs::write(&path, b"0123456789").unwrap();

        assert_eq!(read_prefix(&path, 4).unwrap(), b"0123");
        assert_eq!(read_prefix(&path, 100).unwrap(), b"0123456789");
        assert!(read_prefix(&temp_dir.path().join("missing"), 4).is_err());
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("/tmp/.git")));
        assert!(!is_hidden(Path::new("/tmp/file.txt")));
    }

    #[test]
    fn test_render() {
        let registry = Registry::with_defaults().unwrap();
        let pdf = registry.lookup("application/pdf").unwrap();
        let path = Path::new("a.pdf");

        assert_eq!(
            render(OutputFormat::Text, &registry, path, Detection::Magic(pdf)),
            "a.pdf: application/pdf (magic)"
        );
        assert_eq!(
            render(OutputFormat::Mime, &registry, path, Detection::Unknown),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_detect_file_with_extra_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("types.xml");
        let mut config = fs::File::create(&config_path).unwrap();
        config
            .write_all(
                br#"<mime-info>
                      <mime-type type="application/x-demo">
                        <magic priority="90"><match type="string" offset="0:8" value="DEMO"/></magic>
                      </mime-type>
                    </mime-info>"#,
            )
            .unwrap();

        let data_path = temp_dir.path().join("sample");
        fs::write(&data_path, b"...DEMO...").unwrap();

        let cli = Cli::parse_from([
            "mimir",
            "--file",
            data_path.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
        ]);
        let registry = load_registry(&cli).unwrap();
        let detector = Detector::new(&registry);

        let detection = detect_file(&cli, &detector, &data_path).unwrap();
        assert_eq!(
            detection.content_type().map(|r| registry.name(r)),
            Some("application/x-demo")
        );
    }

    #[test]
    fn test_no_defaults() {
        let cli = Cli::parse_from(["mimir", "--list-types", "--no-defaults"]);
        assert!(load_registry(&cli).unwrap().is_empty());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
