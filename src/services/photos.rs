use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Multipart field names that carry order photos.
pub const PHOTO_FIELDS: &[&str] = &["fotos", "foto", "files"];

/// A file written to the uploads directory, not yet tied to a database row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Generated file name inside the uploads directory
    pub nome_arquivo: String,
    /// Storage path recorded in `ordem_fotos.caminho`
    pub caminho: String,
}

/// Local-disk storage for order photos.
#[derive(Debug, Clone)]
pub struct PhotoStorage {
    root: PathBuf,
}

impl PhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a multipart field with this name carries a photo.
    pub fn is_photo_field(name: &str) -> bool {
        let name = name.trim_end_matches("[]");
        PHOTO_FIELDS.contains(&name)
    }

    /// Writes `data` under a generated name keeping the original extension.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn store(
        &self,
        original_name: Option<&str>,
        data: &[u8],
    ) -> Result<StagedFile, ServiceError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let nome_arquivo = format!("ordem-{}{}", Uuid::new_v4().simple(), extension_of(original_name));
        let path = self.root.join(&nome_arquivo);

        if let Err(e) = write_file(&path, data).await {
            Self::remove_paths([path]).await;
            return Err(e.into());
        }

        debug!(path = %path.display(), "Photo stored");
        Ok(StagedFile {
            nome_arquivo,
            caminho: path.to_string_lossy().into_owned(),
        })
    }

    /// Removes stored files, logging failures instead of returning them.
    pub async fn remove_paths<I, P>(paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref();
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(path = %path.display(), "Photo removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove photo"),
            }
        }
    }

    /// Discards files staged for a request that did not complete.
    pub async fn discard(files: &[StagedFile]) {
        let paths: Vec<String> = files.iter().map(|f| f.caminho.clone()).collect();
        Self::remove_paths(paths).await;
    }
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await
}

/// Lower-cased `.ext` of an uploaded file name, empty when absent or odd.
fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
