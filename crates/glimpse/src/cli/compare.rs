//! The `glimpse compare` command for scoring the similarity of two images.

use clap::Args;
use glimpse_core::{
    compare_images, compare_images_64, ComparisonMethod, ComparisonRecord, Config,
};
use std::path::PathBuf;

use crate::input::ImageLoader;

/// Arguments for the `compare` command.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First image
    pub a: PathBuf,

    /// Second image
    pub b: PathBuf,

    /// Compare 64-bit hashes instead of the default 256-bit ones
    #[arg(long)]
    pub fast: bool,
}

/// Execute the compare command.
pub async fn execute(args: CompareArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let record = run(&args, &config).await?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Load both images and score them.
pub(crate) async fn run(args: &CompareArgs, config: &Config) -> anyhow::Result<ComparisonRecord> {
    let loader = ImageLoader::new(config.limits.clone());
    let (a, b) = tokio::try_join!(loader.load(&args.a), loader.load(&args.b))?;

    let fast = args.fast;
    let (a_pixels, b_pixels) = (a.pixels, b.pixels);
    let (method, similarity) = tokio::task::spawn_blocking(move || {
        if fast {
            compare_images_64(&a_pixels, &b_pixels).map(|s| (ComparisonMethod::Fast, s))
        } else {
            compare_images(&a_pixels, &b_pixels).map(|s| (ComparisonMethod::Full, s))
        }
    })
    .await??;

    let record = ComparisonRecord::new(a.path, b.path, method, similarity);
    tracing::info!(
        "{:?} vs {:?}: {:.4} ({:?})",
        record.file_a,
        record.file_b,
        record.similarity,
        record.verdict
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_core::types::Verdict;
    use image::{Rgb, RgbImage};
    use std::path::Path;

    fn gradient(x: u32, y: u32) -> [u8; 3] {
        [
            ((x * 4) % 256) as u8,
            ((y * 4) % 256) as u8,
            (((x + y) * 2) % 256) as u8,
        ]
    }

    fn save(path: &Path, pixel: impl Fn(u32, u32) -> [u8; 3]) {
        RgbImage::from_fn(64, 64, |x, y| Rgb(pixel(x, y)))
            .save(path)
            .unwrap();
    }

    fn args(a: &Path, b: &Path, fast: bool) -> CompareArgs {
        CompareArgs {
            a: a.to_path_buf(),
            b: b.to_path_buf(),
            fast,
        }
    }

    #[tokio::test]
    async fn test_same_image_is_highly_similar() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        save(&a, gradient);
        save(&b, gradient);

        let record = run(&args(&a, &b, false), &Config::default()).await.unwrap();
        assert_eq!(record.method, ComparisonMethod::Full);
        assert_eq!(record.similarity, 1.0);
        assert_eq!(record.verdict, Verdict::HighlySimilar);
    }

    #[tokio::test]
    async fn test_inverted_image_is_dissimilar() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("inverted.png");
        save(&a, gradient);
        save(&b, |x, y| gradient(x, y).map(|c| 255 - c));

        let record = run(&args(&a, &b, false), &Config::default()).await.unwrap();
        assert!(record.similarity < 0.5);
        assert_eq!(record.verdict, Verdict::Dissimilar);

        let fast = run(&args(&a, &b, true), &Config::default()).await.unwrap();
        assert_eq!(fast.method, ComparisonMethod::Fast);
        assert!(fast.similarity < 1.0);
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        save(&a, gradient);

        let result = run(&args(&a, &dir.path().join("nope.png"), false), &Config::default()).await;
        assert!(result.is_err());
    }
}
