//! Serializable result records emitted by the command line front-end.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Similarity at or above which two images are reported as near-duplicates.
pub const HIGH_SIMILARITY: f32 = 0.9;

/// Similarity at or above which two images are reported as possibly related.
pub const POSSIBLE_SIMILARITY: f32 = 0.7;

/// The hash of one image file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashRecord {
    /// Path of the source file
    pub file_path: PathBuf,

    /// Decoded width in pixels
    pub width: u32,

    /// Decoded height in pixels
    pub height: u32,

    /// Thumbnail size the hash was computed with
    pub thumb_size: u32,

    /// Requested hash size in bytes
    pub hash_size: u32,

    /// Number of meaningful bits in `hash`
    pub bits: usize,

    /// Lowercase hexadecimal hash
    pub hash: String,
}

/// Which comparator produced a similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMethod {
    /// Default 256-bit hashes, compared bit by bit
    Full,
    /// 64-bit hashes
    Fast,
}

/// Coarse reading of a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    HighlySimilar,
    PossiblySimilar,
    Dissimilar,
}

impl Verdict {
    pub fn from_similarity(similarity: f32) -> Self {
        if similarity >= HIGH_SIMILARITY {
            Self::HighlySimilar
        } else if similarity >= POSSIBLE_SIMILARITY {
            Self::PossiblySimilar
        } else {
            Self::Dissimilar
        }
    }
}

/// Result of comparing two image files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub file_a: PathBuf,
    pub file_b: PathBuf,
    pub method: ComparisonMethod,

    /// Fraction of agreeing hash bits, in `[0, 1]`
    pub similarity: f32,

    pub verdict: Verdict,
}

impl ComparisonRecord {
    pub fn new(
        file_a: PathBuf,
        file_b: PathBuf,
        method: ComparisonMethod,
        similarity: f32,
    ) -> Self {
        Self {
            file_a,
            file_b,
            method,
            similarity,
            verdict: Verdict::from_similarity(similarity),
        }
    }
}

/// Statistics for a batch hashing run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HashStats {
    /// Images hashed successfully
    pub succeeded: usize,

    /// Images that could not be loaded or hashed
    pub failed: usize,

    /// Hashing rate in images per second
    pub images_per_second: f64,

    /// Total wall time in seconds
    pub total_seconds: f64,
}

impl HashStats {
    /// Fill in the timing fields from the elapsed wall time.
    pub fn finish(&mut self, elapsed: std::time::Duration) {
        self.total_seconds = elapsed.as_secs_f64();
        self.images_per_second = if self.total_seconds > 0.0 {
            self.succeeded as f64 / self.total_seconds
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_verdict_bands() {
        assert_eq!(Verdict::from_similarity(1.0), Verdict::HighlySimilar);
        assert_eq!(Verdict::from_similarity(0.9), Verdict::HighlySimilar);
        assert_eq!(Verdict::from_similarity(0.75), Verdict::PossiblySimilar);
        assert_eq!(Verdict::from_similarity(0.7), Verdict::PossiblySimilar);
        assert_eq!(Verdict::from_similarity(0.1), Verdict::Dissimilar);
    }

    #[test]
    fn test_comparison_record_serde() {
        let record = ComparisonRecord::new(
            PathBuf::from("a.png"),
            PathBuf::from("b.png"),
            ComparisonMethod::Fast,
            0.75,
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"method\":\"fast\""));
        assert!(json.contains("\"verdict\":\"possibly_similar\""));

        let parsed: ComparisonRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.verdict, Verdict::PossiblySimilar);
        assert_eq!(parsed.similarity, 0.75);
    }

    #[test]
    fn test_hash_record_serde() {
        let record = HashRecord {
            file_path: PathBuf::from("/photos/beach.jpg"),
            width: 1920,
            height: 1080,
            thumb_size: 16,
            hash_size: 32,
            bits: 256,
            hash: "ff00".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"hash\":\"ff00\""));
        assert!(json.contains("\"bits\":256"));

        let parsed: HashRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.file_path, PathBuf::from("/photos/beach.jpg"));
    }

    #[test]
    fn test_stats_rate() {
        let mut stats = HashStats {
            succeeded: 10,
            failed: 1,
            ..Default::default()
        };
        stats.finish(Duration::from_secs(2));
        assert_eq!(stats.total_seconds, 2.0);
        assert_eq!(stats.images_per_second, 5.0);

        let mut empty = HashStats::default();
        empty.finish(Duration::ZERO);
        assert_eq!(empty.images_per_second, 0.0);
    }
}
