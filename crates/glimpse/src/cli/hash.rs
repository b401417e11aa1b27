//! The `glimpse hash` command for fingerprinting images.

use clap::{Args, ValueEnum};
use glimpse_core::{
    Config, HashParams, HashRecord, HashStats, Hasher, ImageHash,
    OutputFormat as CoreOutputFormat, OutputWriter, PixelBuffer,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::input::{FileDiscovery, ImageLoader};

/// Arguments for the `hash` command.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Image files or directories to hash
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Side of the kept coefficient block (default from config)
    #[arg(long)]
    pub thumb_size: Option<u32>,

    /// Hash size in bytes (default from config)
    #[arg(long)]
    pub hash_size: Option<u32>,

    /// Output format (default from config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Execute the hash command.
pub async fn execute(args: HashArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let output = args.output.clone();

    let writer: Box<dyn Write + Send> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };

    let stats = run(&args, &config, writer).await?;
    if let Some(path) = &output {
        tracing::info!("Output written to {:?}", path);
    }

    if stats.succeeded == 0 && stats.failed > 0 {
        anyhow::bail!("None of the {} image(s) could be hashed", stats.failed);
    }
    Ok(())
}

/// Hash every discovered image into `writer`.
///
/// Failed images are logged and counted, never fatal.
pub(crate) async fn run<W: Write>(
    args: &HashArgs,
    config: &Config,
    writer: W,
) -> anyhow::Result<HashStats> {
    let hasher = Hasher::new(resolve_params(args, config))?;
    let format = resolve_format(args.format, config);

    let discovery = FileDiscovery::new(config.processing.clone());
    let files = discovery.discover_all(&args.inputs);
    if files.is_empty() {
        tracing::warn!("No supported image files found in {:?}", args.inputs);
        return Ok(HashStats::default());
    }
    let total_bytes: u64 = files.iter().map(|f| f.size).sum();
    tracing::info!("Found {} image(s) to hash ({} bytes)", files.len(), total_bytes);

    let loader = ImageLoader::new(config.limits.clone());
    let mut out = OutputWriter::new(writer, format, config.output.pretty);
    let mut stats = HashStats::default();
    let start_time = Instant::now();

    for file in &files {
        match hash_file(&loader, &hasher, &file.path).await {
            Ok(record) => {
                stats.succeeded += 1;
                out.write(&record)?;
            }
            Err(e) => {
                stats.failed += 1;
                tracing::error!("Failed: {:?} - {:#}", file.path, e);
            }
        }
    }

    out.finish()?;
    stats.finish(start_time.elapsed());

    tracing::info!(
        "Hashed {} image(s), {} failed ({:.1} img/sec, {:.2}s)",
        stats.succeeded,
        stats.failed,
        stats.images_per_second,
        stats.total_seconds
    );
    Ok(stats)
}

/// Load and hash one file.
pub(crate) async fn hash_file(
    loader: &ImageLoader,
    hasher: &Hasher,
    path: &Path,
) -> anyhow::Result<HashRecord> {
    let image = loader.load(path).await?;
    let (width, height) = (image.width(), image.height());
    let hash = hash_blocking(*hasher, image.pixels).await?;
    let params = hasher.params();

    tracing::debug!("{:?} ({:?}): {}", path, image.format, hash);

    Ok(HashRecord {
        file_path: path.to_path_buf(),
        width,
        height,
        thumb_size: params.thumb_size,
        hash_size: params.hash_size,
        bits: hash.bits(),
        hash: hash.to_hex(),
    })
}

/// Hash decoded pixels on the blocking pool, next to decoding.
async fn hash_blocking(hasher: Hasher, pixels: PixelBuffer) -> anyhow::Result<ImageHash> {
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&pixels)).await??;
    Ok(hash)
}

/// Command line sizes win over the `[hash]` section.
fn resolve_params(args: &HashArgs, config: &Config) -> HashParams {
    HashParams::new(
        args.thumb_size.unwrap_or(config.hash.thumb_size),
        args.hash_size.unwrap_or(config.hash.hash_size),
    )
}

fn resolve_format(format: Option<OutputFormat>, config: &Config) -> CoreOutputFormat {
    match format {
        Some(format) => format.into(),
        None => CoreOutputFormat::parse(&config.output.format).unwrap_or(CoreOutputFormat::Json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn args(inputs: Vec<PathBuf>) -> HashArgs {
        HashArgs {
            inputs,
            thumb_size: None,
            hash_size: None,
            format: Some(OutputFormat::Jsonl),
            output: None,
        }
    }

    fn write_gradient(path: &Path) {
        RgbImage::from_fn(64, 48, |x, y| {
            Rgb([(x * 4) as u8, (y * 5) as u8, ((x + y) * 2) as u8])
        })
        .save(path)
        .unwrap();
    }

    #[test]
    fn test_params_from_config_and_flags() {
        let config = Config::default();
        let mut hash_args = args(vec![]);
        assert_eq!(resolve_params(&hash_args, &config), HashParams::new(16, 32));

        hash_args.thumb_size = Some(8);
        hash_args.hash_size = Some(64);
        assert_eq!(resolve_params(&hash_args, &config), HashParams::new(8, 64));
    }

    #[test]
    fn test_format_falls_back_to_config() {
        let mut config = Config::default();
        config.output.format = "jsonl".into();
        assert_eq!(resolve_format(None, &config), CoreOutputFormat::JsonLines);
        assert_eq!(
            resolve_format(Some(OutputFormat::Json), &config),
            CoreOutputFormat::Json
        );
    }

    #[tokio::test]
    async fn test_hash_file_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grad.png");
        write_gradient(&path);

        let loader = ImageLoader::new(Config::default().limits);
        let record = hash_file(&loader, &Hasher::default(), &path).await.unwrap();

        assert_eq!((record.width, record.height), (64, 48));
        assert_eq!((record.thumb_size, record.hash_size), (16, 32));
        assert_eq!(record.bits, 256);
        assert_eq!(record.hash.len(), 64);
    }

    #[tokio::test]
    async fn test_blocking_hash_matches_direct_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grad.png");
        write_gradient(&path);

        let loader = ImageLoader::new(Config::default().limits);
        let hasher = Hasher::new(HashParams::new(8, 32)).unwrap();
        let image = loader.load(&path).await.unwrap();
        let direct = hasher.hash(&image.pixels).unwrap();

        let record = hash_file(&loader, &hasher, &path).await.unwrap();
        assert_eq!(record.hash, direct.to_hex());
        assert_eq!(record.bits, 256);

        let pooled = hash_blocking(hasher, image.pixels).await.unwrap();
        assert_eq!(pooled, direct);
    }

    #[tokio::test]
    async fn test_small_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbImage::new(16, 16).save(&path).unwrap();

        let loader = ImageLoader::new(Config::default().limits);
        assert!(hash_file(&loader, &Hasher::default(), &path).await.is_err());
    }

    #[tokio::test]
    async fn test_run_skips_failures_and_streams_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        write_gradient(&dir.path().join("a.png"));
        write_gradient(&dir.path().join("b.png"));
        std::fs::write(dir.path().join("broken.png"), b"garbage").unwrap();

        let mut buffer = Vec::new();
        let stats = run(&args(vec![dir.path().to_path_buf()]), &Config::default(), &mut buffer)
            .await
            .unwrap();
        assert_eq!((stats.succeeded, stats.failed), (2, 1));

        let text = String::from_utf8(buffer).unwrap();
        let records: Vec<HashRecord> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert!(records[0].file_path.ends_with("a.png"));
        assert_eq!(records[0].hash, records[1].hash);
    }

    #[tokio::test]
    async fn test_run_rejects_bad_sizes() {
        let mut hash_args = args(vec![]);
        hash_args.thumb_size = Some(64);
        hash_args.hash_size = Some(8);

        let result = run(&hash_args, &Config::default(), Vec::new()).await;
        assert!(result.is_err());
    }
}
