//! Artifact existence checks.

use std::path::Path;

use async_trait::async_trait;

/// Answers whether an artifact has already been produced.
#[async_trait]
pub trait ArtifactProbe: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;
}

/// Filesystem probe: an artifact exists if it is a non-empty file.
///
/// Zero-byte files are left behind by interrupted encoder runs and are
/// treated as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactProbe;

#[async_trait]
impl ArtifactProbe for FsArtifactProbe {
    async fn exists(&self, path: &Path) -> bool {
        match tokio::fs::metadata(path).await {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_probe() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("full.mp4");
        let empty = dir.path().join("empty.mp4");
        tokio::fs::write(&full, b"data").await.unwrap();
        tokio::fs::write(&empty, b"").await.unwrap();

        let probe = FsArtifactProbe;
        assert!(probe.exists(&full).await);
        assert!(!probe.exists(&empty).await);
        assert!(!probe.exists(&dir.path().join("missing.mp4")).await);
        assert!(!probe.exists(dir.path()).await);
    }
}
