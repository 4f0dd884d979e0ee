//! Local materialization of stock assets.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use reel_models::StockAsset;

use crate::error::{AssetError, AssetResult};

/// Ensure `asset` has a local file under `clips_dir` and return its
/// path. Real URLs are downloaded once; mock assets copy the
/// placeholder clip. Filenames embed the job ID for retention.
pub async fn ensure_local(
    asset: &StockAsset,
    clips_dir: &Path,
    placeholder: &Path,
    job_id: &str,
) -> AssetResult<PathBuf> {
    tokio::fs::create_dir_all(clips_dir).await?;
    let dest = clips_dir.join(format!("job_{}_{}.mp4", job_id, asset.id));

    if dest.exists() {
        debug!(asset_id = %asset.id, "Asset already materialized");
        return Ok(dest);
    }

    match &asset.url {
        Some(url) => download_to(url, &dest).await?,
        None => {
            if !placeholder.exists() {
                return Err(AssetError::download_failed(format!(
                    "Mock placeholder missing: {}",
                    placeholder.display()
                )));
            }
            tokio::fs::copy(placeholder, &dest).await?;
            debug!(asset_id = %asset.id, "Copied placeholder for mock asset");
        }
    }

    Ok(dest)
}

/// Stream a remote URL to disk via a temp file so partial downloads
/// never appear at the final path.
async fn download_to(url: &str, dest: &Path) -> AssetResult<()> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(AssetError::download_failed(format!(
            "GET {} returned {}",
            url,
            response.status()
        )));
    }

    let tmp = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&tmp).await?;
    let bytes = response.bytes().await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, dest).await?;
    info!(bytes = bytes.len(), "Downloaded asset to {}", dest.display());
    Ok(())
}
