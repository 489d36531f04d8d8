use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use unite_extract::extract::{ExtractOptions, Extractor};
use unite_extract::keys::{parse_salt, ResourceKey};
use unite_extract::Platform;

/// Decrypt protected bundles, resource archives and sound banks.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input file or directory
    input: PathBuf,

    /// Output directory; relative paths under the input are preserved
    output: PathBuf,

    /// Platform the files were built for
    #[arg(short, long, default_value_t = Platform::Android)]
    platform: Platform,

    /// Resource archive salt, by owner class name or as hex
    #[arg(short, long, value_parser = parse_salt)]
    salt: Option<u32>,

    /// Extra resource key pair as MAGIC:KEY in hex (repeatable)
    #[arg(long = "resource-key", value_name = "MAGIC:KEY")]
    resource_keys: Vec<ResourceKey>,

    /// Keep resource payloads compressed
    #[arg(long)]
    raw: bool,
}

fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let args = Args::parse();

    info!("Starting...");
    let start_time = Instant::now();

    for key in &args.resource_keys {
        info!("Registered resource key {}", key);
    }

    let extractor = Extractor::new(ExtractOptions {
        platform: args.platform,
        salt: args.salt,
        raw: args.raw,
        resource_keys: args.resource_keys,
    });
    info!("Extracting {} ({})", args.input.display(), extractor.platform());
    let summary = extractor.extract(&args.input, &args.output)?;

    let elapsed = Instant::now() - start_time;
    info!(
        "{} decrypted, {} copied, {} skipped, {} failed",
        summary.decrypted, summary.copied, summary.skipped, summary.failed
    );
    info!("Time elapsed: {:.4} seconds", elapsed.as_secs_f64());

    if summary.failed > 0 {
        bail!("{} file(s) could not be decrypted", summary.failed);
    }
    info!("Done.");

    Ok(())
}
