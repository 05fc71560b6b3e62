use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::Multipart;
use jobportal_types::CoreError;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use crate::error::AppResult;

/// Upload limit for a single file.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// URL prefix under which stored blobs are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    /// jpeg/jpg/png; MIME type and extension must both match.
    Image,
    /// pdf/doc/docx; MIME type or extension must match.
    Document,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Uploaded file is empty")]
    Empty,

    #[error("File exceeds the 10 MB limit")]
    TooLarge,

    #[error("Only jpeg, jpg and png images are allowed")]
    NotAnImage,

    #[error("Only pdf, doc and docx files are allowed")]
    NotADocument,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("jpg", "image/jpg"),
    ("png", "image/png"),
];

const DOCUMENT_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// One file field read from a multipart body.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Flat directory of uploaded blobs, each stored as `{uuid}.{ext}`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validates and writes the upload. Returns its public path,
    /// e.g. `/uploads/0b9c...e1.pdf`.
    pub async fn put(&self, upload: &Upload, kind: BlobKind) -> Result<String, StorageError> {
        let ext = check_upload(
            &upload.file_name,
            upload.content_type.as_deref(),
            upload.bytes.len(),
            kind,
        )?;

        let name = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.dir.join(&name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(&upload.bytes).await?;
        file.flush().await?;

        info!("Stored {} ({} bytes)", name, upload.bytes.len());
        Ok(format!("{PUBLIC_PREFIX}/{name}"))
    }
}

/// Applies the allow-list and size rules. Returns the extension to store under.
pub fn check_upload(
    file_name: &str,
    content_type: Option<&str>,
    len: usize,
    kind: BlobKind,
) -> Result<&'static str, StorageError> {
    if len == 0 {
        return Err(StorageError::Empty);
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(StorageError::TooLarge);
    }

    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let mime = content_type.map(|m| m.trim().to_ascii_lowercase());

    let (table, err) = match kind {
        BlobKind::Image => (IMAGE_TYPES, StorageError::NotAnImage),
        BlobKind::Document => (DOCUMENT_TYPES, StorageError::NotADocument),
    };
    let by_ext = table.iter().find(|(e, _)| Some(*e) == ext.as_deref());
    let by_mime = table.iter().find(|(_, m)| Some(*m) == mime.as_deref());

    let matched = match kind {
        BlobKind::Image => by_ext.filter(|_| by_mime.is_some()),
        BlobKind::Document => by_ext.or(by_mime),
    };
    matched.map(|(e, _)| *e).ok_or(err)
}

/// Reads the named file field, skipping any other fields. `Ok(None)` when the
/// body has no such field.
pub async fn read_file_field(multipart: &mut Multipart, field_name: &str) -> AppResult<Option<Upload>> {
    let mut found = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CoreError::validation(e.body_text()))?
    {
        if found.is_some() || field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| CoreError::validation(e.body_text()))?;
        found = Some(Upload {
            file_name,
            content_type,
            bytes,
        });
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_need_mime_and_extension() {
        assert_eq!(
            check_upload("me.PNG", Some("image/png"), 10, BlobKind::Image).unwrap(),
            "png"
        );
        assert!(matches!(
            check_upload("me.png", Some("application/pdf"), 10, BlobKind::Image),
            Err(StorageError::NotAnImage)
        ));
        assert!(matches!(
            check_upload("me.gif", Some("image/png"), 10, BlobKind::Image),
            Err(StorageError::NotAnImage)
        ));
    }

    #[test]
    fn documents_need_mime_or_extension() {
        assert_eq!(
            check_upload("cv.pdf", Some("application/octet-stream"), 10, BlobKind::Document).unwrap(),
            "pdf"
        );
        assert_eq!(
            check_upload("cv", Some("application/msword"), 10, BlobKind::Document).unwrap(),
            "doc"
        );
        assert!(matches!(
            check_upload("cv.txt", Some("text/plain"), 10, BlobKind::Document),
            Err(StorageError::NotADocument)
        ));
    }

    #[test]
    fn size_bounds() {
        assert!(matches!(
            check_upload("cv.pdf", None, 0, BlobKind::Document),
            Err(StorageError::Empty)
        ));
        assert!(check_upload("cv.pdf", None, MAX_UPLOAD_BYTES, BlobKind::Document).is_ok());
        assert!(matches!(
            check_upload("cv.pdf", None, MAX_UPLOAD_BYTES + 1, BlobKind::Document),
            Err(StorageError::TooLarge)
        ));
    }

    #[tokio::test]
    async fn put_writes_under_public_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf()).await.unwrap();
        let upload = Upload {
            file_name: "cv.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        };

        let public = storage.put(&upload, BlobKind::Document).await.unwrap();
        let name = public.strip_prefix("/uploads/").unwrap();
        assert!(name.ends_with(".pdf"));
        assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), b"%PDF-1.4");
    }
}
