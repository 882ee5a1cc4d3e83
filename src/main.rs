// src/main.rs
mod logger;

use anyhow::Context;
use clap::{Parser, Subcommand};
use huffpack::archive::{self, Archive};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "huffpack", version = "0.1.0")]
#[command(about = "Static Huffman file compressor.", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a .huf archive
    Compress {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,
    },
    /// Restore the original file from a .huf archive
    Decompress {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        force: bool,
        /// Skip the SHA-256 check of the decoded bytes
        #[arg(long)]
        no_verify: bool,
    },
    /// Show the header and code table of an archive
    Inspect { archive: PathBuf },
    /// Compress and decompress in memory and confirm the bytes match
    Roundtrip { input: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(logger::level(cli.verbose, cli.quiet))?;

    let span = tracing::info_span!("command_execution", command = ?std::env::args().collect::<Vec<_>>());
    let _enter = span.enter();

    match cli.command {
        Commands::Compress { input, output, force } => {
            let output = output.unwrap_or_else(|| archive::compressed_path(&input));
            compress_file(&input, &output, force)
        }
        Commands::Decompress { input, output, force, no_verify } => {
            let output = output.unwrap_or_else(|| archive::decompressed_path(&input));
            decompress_file(&input, &output, force, !no_verify)
        }
        Commands::Inspect { archive } => inspect(&archive),
        Commands::Roundtrip { input } => roundtrip(&input),
    }
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    archive::read_input(file).with_context(|| format!("cannot read {}", path.display()))
}

fn ratio(packed: usize, original: u64) -> f64 {
    if original == 0 {
        0.0
    } else {
        packed as f64 / original as f64 * 100.0
    }
}

fn compress_file(input: &Path, output: &Path, force: bool) -> anyhow::Result<()> {
    archive::ensure_writable(output, force)?;
    let data = read_file(input)?;

    let packed = Archive::pack(&data)?;
    let bytes = packed.to_bytes()?;
    archive::save_atomic(output, &bytes)
        .with_context(|| format!("cannot write {}", output.display()))?;

    tracing::info!(input = %input.display(), output = %output.display(), "compressed");
    println!(
        "Compressed {} -> {} ({} -> {} bytes, {:.1}%)",
        input.display(),
        output.display(),
        data.len(),
        bytes.len(),
        ratio(bytes.len(), data.len() as u64)
    );
    Ok(())
}

fn decompress_file(input: &Path, output: &Path, force: bool, verify: bool) -> anyhow::Result<()> {
    archive::ensure_writable(output, force)?;
    let packed = Archive::load(input).with_context(|| format!("cannot load {}", input.display()))?;
    let data = packed
        .unpack(verify)
        .with_context(|| format!("cannot decode {}", input.display()))?;
    archive::save_atomic(output, &data)
        .with_context(|| format!("cannot write {}", output.display()))?;

    tracing::info!(input = %input.display(), output = %output.display(), verify, "decompressed");
    println!("Decompressed {} -> {} ({} bytes)", input.display(), output.display(), data.len());
    Ok(())
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let packed = Archive::load(path).with_context(|| format!("cannot load {}", path.display()))?;
    let codec = packed.codec();
    let table = codec.table();

    println!("Archive:        {}", path.display());
    println!("Original size:  {} bytes", packed.original_len());
    println!("SHA-256:        {}", packed.digest_hex());
    println!("Symbols:        {}", table.len());
    println!("Payload bits:   {}", codec.bit_count());
    println!("Payload bytes:  {}", codec.payload().len());
    println!("Entropy:        {:.3} bits/symbol", packed.entropy()?);
    if packed.original_len() > 0 {
        println!(
            "Avg code len:   {:.3} bits/symbol",
            codec.bit_count() as f64 / packed.original_len() as f64
        );
    }
    println!();
    println!("{:>6}  {:>5}  code", "symbol", "bits");
    for (symbol, code) in table.iter() {
        let shown = if symbol.is_ascii_graphic() {
            format!("'{}'", symbol as char)
        } else {
            format!("{symbol:#04x}")
        };
        println!("{shown:>6}  {:>5}  {code}", code.len());
    }
    Ok(())
}

fn roundtrip(input: &Path) -> anyhow::Result<()> {
    let data = read_file(input)?;
    let freqs = huffpack::FrequencyTable::from_bytes(&data);

    let packed = Archive::pack(&data)?;
    let bytes = packed.to_bytes()?;
    let restored = Archive::from_bytes(&bytes)?.unpack(true)?;
    anyhow::ensure!(restored == data, "round trip changed the data");

    let avg = if data.is_empty() {
        0.0
    } else {
        packed.codec().bit_count() as f64 / data.len() as f64
    };
    println!(
        "{}: {} -> {} bytes ({:.1}%), entropy {:.3} bits/symbol, average code {:.3}",
        input.display(),
        data.len(),
        bytes.len(),
        ratio(bytes.len(), data.len() as u64),
        freqs.entropy(),
        avg
    );
    println!("Compression and decompression completed successfully.");
    Ok(())
}
