//! pakrat CLI - Command-line tool for listing and extracting VPK archives.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use pakrat_vpk::{Error, Extraction, VpkArchive, VpkEntry};

/// pakrat - Valve Pak (VPK) extraction tool
#[derive(Parser)]
#[command(name = "pakrat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of a VPK archive
    List {
        /// Path to the _dir.vpk file
        #[arg(env = "INPUT_VPK")]
        vpk: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show archive index, offset, length and CRC
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract files from a VPK archive
    Extract {
        /// Path to the _dir.vpk file
        #[arg(env = "INPUT_VPK")]
        vpk: PathBuf,

        /// Output directory (defaults to the archive's directory)
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: Option<PathBuf>,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Extract entries on all cores
        #[arg(short, long)]
        parallel: bool,
    },

    /// Print path, CRC and length of every entry
    Dump {
        /// Path to the _dir.vpk file
        #[arg(env = "INPUT_VPK")]
        vpk: PathBuf,
    },

    /// Show header fields of a VPK archive
    Info {
        /// Path to the _dir.vpk file
        #[arg(env = "INPUT_VPK")]
        vpk: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::List {
            vpk,
            filter,
            detailed,
        } => cmd_list(&vpk, filter.as_deref(), detailed)?,
        Commands::Extract {
            vpk,
            output,
            filter,
            parallel,
        } => cmd_extract(&vpk, output.as_deref(), filter.as_deref(), parallel)?,
        Commands::Dump { vpk } => cmd_dump(&vpk)?,
        Commands::Info { vpk } => cmd_info(&vpk)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_archive(path: &Path) -> Result<VpkArchive> {
    let archive = VpkArchive::open(path)
        .with_context(|| format!("Failed to open VPK archive {}", path.display()))?;
    tracing::debug!(?archive, "opened archive");
    Ok(archive)
}

fn compile_filter(filter: Option<&str>) -> Result<Option<Pattern>> {
    filter
        .map(|f| Pattern::new(f).with_context(|| format!("Invalid filter pattern: {f}")))
        .transpose()
}

fn is_selected(pattern: Option<&Pattern>, entry: &VpkEntry) -> bool {
    pattern.map_or(true, |p| p.matches(entry.path()))
}

fn cmd_list(vpk: &Path, filter: Option<&str>, detailed: bool) -> Result<()> {
    let archive = open_archive(vpk)?;
    let pattern = compile_filter(filter)?;

    let mut count = 0;
    for entry in archive.iter().filter(|e| is_selected(pattern.as_ref(), e)) {
        if detailed {
            println!(
                "{:>5} {:>10} {:>10} {:08x} {}",
                entry.archive_index(),
                entry.entry_offset(),
                entry.entry_length(),
                entry.crc(),
                entry.path()
            );
        } else {
            println!("{}", entry.path());
        }
        count += 1;
    }

    println!("\nTotal: {} entries", count);

    Ok(())
}

fn cmd_extract(
    vpk: &Path,
    output: Option<&Path>,
    filter: Option<&str>,
    parallel: bool,
) -> Result<()> {
    println!("Opening VPK archive: {}", vpk.display());

    let start = Instant::now();
    let archive = open_archive(vpk)?;
    let pattern = compile_filter(filter)?;

    println!(
        "Loaded {} entries in {:?}",
        archive.entry_count(),
        start.elapsed()
    );

    if let Some(output) = output {
        fs::create_dir_all(output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
    }

    let selected: Vec<&VpkEntry> = archive
        .iter()
        .filter(|e| is_selected(pattern.as_ref(), e))
        .collect();

    println!("Extracting {} entries...", selected.len());

    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let outcomes: Vec<(&VpkEntry, pakrat_vpk::Result<Extraction>)> =
        if parallel {
            let results = archive.extract_entries_parallel(&selected, output, |_, _| pb.inc(1));
            selected.iter().copied().zip(results).collect()
        } else {
            selected
                .iter()
                .map(|&entry| {
                    pb.set_message(entry.path().to_string());
                    let result = archive.extract_entry(entry, output);
                    pb.inc(1);
                    (entry, result)
                })
                .collect()
        };

    pb.finish_with_message("Done");

    let mut written = 0;
    let mut skipped = 0;
    let mut failures: Vec<(&VpkEntry, Error)> = Vec::new();
    for (entry, outcome) in outcomes {
        match outcome {
            Ok(Extraction::Written { .. }) => written += 1,
            Ok(Extraction::AlreadyPresent) => skipped += 1,
            Err(e) => failures.push((entry, e)),
        }
    }

    for (entry, e) in &failures {
        tracing::error!(path = entry.path(), error = %e, "failed to extract entry");
    }

    println!(
        "Extracted {} entries in {:?} ({} already present, {} errors)",
        written,
        start.elapsed(),
        skipped,
        failures.len()
    );

    let failed = failures.len();
    archive.close();

    if failed > 0 {
        anyhow::bail!("{} entries could not be extracted", failed);
    }

    Ok(())
}

fn cmd_dump(vpk: &Path) -> Result<()> {
    let archive = open_archive(vpk)?;
    print!("{}", archive.dump());
    Ok(())
}

fn cmd_info(vpk: &Path) -> Result<()> {
    let archive = open_archive(vpk)?;
    let header = archive.header();

    println!("Archive:                  {}", archive.name());
    println!("Version:                  {}", header.version);
    println!("Header size:              {}", header.size());
    println!("Tree size:                {}", header.tree_size);
    if header.version >= 2 {
        println!("File data section size:   {}", header.file_data_section_size);
        println!("Archive MD5 section size: {}", header.archive_md5_section_size);
        println!("Other MD5 section size:   {}", header.other_md5_section_size);
        println!("Signature section size:   {}", header.signature_section_size);
    }
    println!("Entries:                  {}", archive.entry_count());

    let mut parts: Vec<u16> = archive
        .iter()
        .filter(|e| !e.is_inline())
        .map(VpkEntry::archive_index)
        .collect();
    parts.sort_unstable();
    parts.dedup();
    println!("Archive parts:            {}", parts.len());

    let inline = archive.iter().filter(|e| e.is_inline()).count();
    if inline > 0 {
        println!("Inline entries:           {} (not extractable)", inline);
    }

    Ok(())
}
