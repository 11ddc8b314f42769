use crate::core::interfaces::FileSystemService;
use crate::utils::{DualBuildError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio::fs;

pub struct TokioFileSystemService;

#[async_trait]
impl FileSystemService for TokioFileSystemService {
    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            // lost a race with something else removing it; the goal is reached
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(DualBuildError::Io(err)),
        }
    }

    async fn read_json(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}
