//! Raw PCM input.

use std::path::Path;

use mvgen_media::MediaError;

use crate::error::WorkerResult;

/// Load raw mono f32le samples from a file.
///
/// A trailing partial sample is ignored.
pub async fn load_pcm_f32le(path: &Path) -> WorkerResult<Vec<f32>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediaError::FileNotFound(path.to_path_buf()).into());
        }
        Err(e) => return Err(e.into()),
    };

    // 4 bytes per sample, little-endian
    let samples: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_samples_with_data() {
        let temp = NamedTempFile::new().unwrap();
        let samples: Vec<f32> = vec![0.0, 0.5, 1.0, -1.0];
        let mut bytes: Vec<u8> = samples.iter().flat_map(|f| f.to_le_bytes()).collect();
        bytes.push(0x7f);
        tokio::fs::write(temp.path(), &bytes).await.unwrap();

        let loaded = load_pcm_f32le(temp.path()).await.unwrap();
        assert_eq!(loaded, samples);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_pcm_f32le(&dir.path().join("nope.f32")).await;
        assert!(matches!(
            result,
            Err(WorkerError::Media(MediaError::FileNotFound(_)))
        ));
    }
}
