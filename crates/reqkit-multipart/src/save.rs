//! Multipart upload persistence.
//!
//! Parts stream to disk chunk by chunk: memory held per part is the sniff
//! prefix plus one in-flight chunk, never the whole file. The MIME type is
//! sniffed from the first bytes of the content itself, not taken from the
//! part's declared type, so a mislabelled upload cannot bypass the
//! allow-list.

use std::path::Path;

use axum::extract::multipart::{Field, Multipart};
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use reqkit_core::{random_string, Config};

use crate::error::{PartialUpload, UploadError};

/// Bytes of a part buffered for content sniffing.
const SNIFF_LEN: usize = 512;

/// Length of the random portion of a generated filename.
const RANDOM_NAME_LEN: usize = 25;

/// Sniffed type for content no signature matches.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Record of one successfully stored file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name the file was stored under in the destination directory.
    pub new_file_name: String,
    /// Filename as submitted by the client.
    pub original_file_name: String,
    /// Bytes actually written to disk (never the declared part size).
    pub file_size: u64,
}

/// Per-call options for [`save_file`] and [`save_files`].
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    /// Store under `<random><original extension>` instead of the
    /// client-supplied name. Defaults to `true`; disabling it means the
    /// caller accepts name-collision risk.
    pub rename: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { rename: true }
    }
}

/// Stores exactly one uploaded file from `multipart` into `dir`.
///
/// Every file part in the request is persisted (matching [`save_files`]);
/// the record for the first one is returned. A request with no file part at
/// all is [`UploadError::NoFile`].
pub async fn save_file(
    config: &Config,
    multipart: Multipart,
    dir: impl AsRef<Path>,
    options: SaveOptions,
) -> Result<UploadedFile, UploadError> {
    match save_files(config, multipart, dir, options).await {
        Ok(files) => files.into_iter().next().ok_or(UploadError::NoFile),
        Err(partial) => Err(partial.error),
    }
}

/// Stores every file part of `multipart` into `dir`, in request order.
///
/// The destination directory is created if missing (all parents,
/// idempotent). Each part is admitted only after its sniffed MIME type
/// passes `config.allowed_file_types`; the total bytes accepted across the
/// whole call are bounded by `config.max_upload_bytes`. Non-file parts are
/// skipped.
///
/// On failure the files stored before the failing part are returned inside
/// [`PartialUpload`] and remain on disk; nothing is rolled back.
pub async fn save_files(
    config: &Config,
    mut multipart: Multipart,
    dir: impl AsRef<Path>,
    options: SaveOptions,
) -> Result<Vec<UploadedFile>, PartialUpload> {
    let dir = dir.as_ref();
    let mut saved = Vec::new();

    if let Err(source) = fs::create_dir_all(dir).await {
        tracing::error!(path = %dir.display(), error = %source, "Failed to create upload directory");
        return Err(PartialUpload {
            saved,
            error: UploadError::CreateDir {
                path: dir.to_path_buf(),
                source,
            },
        });
    }

    let mut budget = config.max_upload_bytes;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(PartialUpload {
                    saved,
                    error: err.into(),
                })
            }
        };

        // Parts without a filename are ordinary form fields, not uploads.
        let Some(original_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        match store_field(config, field, dir, &original_name, options.rename, &mut budget).await {
            Ok(file) => saved.push(file),
            Err(error) => return Err(PartialUpload { saved, error }),
        }
    }

    Ok(saved)
}

async fn store_field(
    config: &Config,
    mut field: Field<'_>,
    dir: &Path,
    original_name: &str,
    rename: bool,
    budget: &mut u64,
) -> Result<UploadedFile, UploadError> {
    // Buffer a prefix of the part so the content can be identified before
    // anything is admitted to disk. The buffer becomes the head of the
    // stored copy, so sniffing consumes no bytes.
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    let mut carry: Option<Bytes> = None;
    let mut reached_end = false;
    while prefix.len() < SNIFF_LEN && !reached_end {
        match field.chunk().await? {
            Some(chunk) => {
                let need = SNIFF_LEN - prefix.len();
                if chunk.len() > need {
                    prefix.extend_from_slice(&chunk[..need]);
                    carry = Some(chunk.slice(need..));
                } else {
                    prefix.extend_from_slice(&chunk);
                }
            }
            None => reached_end = true,
        }
    }

    let detected = infer::get(&prefix)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

    if !type_allowed(&config.allowed_file_types, &detected) {
        tracing::warn!(
            detected = %detected,
            original_filename = %original_name,
            "Rejected upload: file type not allowed"
        );
        return Err(UploadError::FileTypeNotAllowed { detected });
    }

    let new_file_name = if rename {
        randomized_name(original_name)
    } else {
        sanitize_file_name(original_name)?
    };

    let dest = dir.join(&new_file_name);
    let written = match copy_part(
        &mut field,
        &dest,
        &prefix,
        carry,
        reached_end,
        budget,
        config.max_upload_bytes,
    )
    .await
    {
        Ok(written) => written,
        Err(err) => {
            // The failing part must not leave a half-written file behind;
            // earlier parts stay on disk per the partial-success contract.
            let _ = fs::remove_file(&dest).await;
            return Err(err);
        }
    };

    tracing::info!(
        path = %dest.display(),
        content_type = %detected,
        size_bytes = written,
        "Stored uploaded file"
    );

    Ok(UploadedFile {
        new_file_name,
        original_file_name: original_name.to_string(),
        file_size: written,
    })
}

async fn copy_part(
    field: &mut Field<'_>,
    dest: &Path,
    prefix: &[u8],
    carry: Option<Bytes>,
    reached_end: bool,
    budget: &mut u64,
    limit: u64,
) -> Result<u64, UploadError> {
    let mut out = fs::File::create(dest).await?;
    let mut written: u64 = 0;

    charge(budget, prefix.len() as u64, limit)?;
    out.write_all(prefix).await?;
    written += prefix.len() as u64;

    if let Some(chunk) = carry {
        charge(budget, chunk.len() as u64, limit)?;
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    if !reached_end {
        while let Some(chunk) = field.chunk().await? {
            charge(budget, chunk.len() as u64, limit)?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
    }

    out.flush().await?;
    Ok(written)
}

/// Deducts `amount` from the request-wide byte budget.
fn charge(budget: &mut u64, amount: u64, limit: u64) -> Result<(), UploadError> {
    if amount > *budget {
        return Err(UploadError::TooLarge { limit });
    }
    *budget -= amount;
    Ok(())
}

fn type_allowed(allowed: &[String], detected: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|entry| entry.eq_ignore_ascii_case(detected))
}

fn randomized_name(original_name: &str) -> String {
    match Path::new(original_name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}.{}", random_string(RANDOM_NAME_LEN), ext),
        None => random_string(RANDOM_NAME_LEN),
    }
}

/// Reduces a client-supplied filename to its final path component,
/// rejecting traversal sequences.
fn sanitize_file_name(original_name: &str) -> Result<String, UploadError> {
    let base = Path::new(original_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(original_name);

    if base.is_empty() || base.contains("..") {
        return Err(UploadError::BadFilename(original_name.to_string()));
    }

    Ok(base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};
    use tempfile::tempdir;

    const BOUNDARY: &str = "reqkit-test-boundary";

    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match filename {
                Some(filename) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn multipart_from(body: Vec<u8>) -> Multipart {
        let request = Request::builder()
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn png_bytes(total_len: usize) -> Vec<u8> {
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        data.resize(total_len.max(8), 0xAB);
        data
    }

    fn jpeg_bytes(total_len: usize) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.resize(total_len.max(4), 0xCD);
        data
    }

    #[tokio::test]
    async fn stores_single_png_under_random_name() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let data = png_bytes(2048);
        let multipart =
            multipart_from(multipart_body(&[("file", Some("photo.png"), &data)])).await;

        let file = save_file(&config, multipart, dir.path(), SaveOptions::default())
            .await
            .unwrap();

        assert!(file.new_file_name.ends_with(".png"));
        assert_ne!(file.new_file_name, "photo.png");
        assert_eq!(file.new_file_name.len(), RANDOM_NAME_LEN + ".png".len());
        assert_eq!(file.original_file_name, "photo.png");
        assert_eq!(file.file_size, data.len() as u64);

        let on_disk = std::fs::read(dir.path().join(&file.new_file_name)).unwrap();
        assert_eq!(on_disk, data);
    }

    #[tokio::test]
    async fn stores_file_shorter_than_sniff_prefix() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let data = png_bytes(16);
        let multipart = multipart_from(multipart_body(&[("file", Some("tiny.png"), &data)])).await;

        let file = save_file(&config, multipart, dir.path(), SaveOptions::default())
            .await
            .unwrap();

        assert_eq!(file.file_size, 16);
    }

    #[tokio::test]
    async fn rejects_type_not_in_allowlist() {
        let dir = tempdir().unwrap();
        let config = Config {
            allowed_file_types: vec!["image/jpeg".to_string()],
            ..Config::default()
        };
        let data = png_bytes(1024);
        let multipart =
            multipart_from(multipart_body(&[("file", Some("photo.png"), &data)])).await;

        let partial = save_files(&config, multipart, dir.path(), SaveOptions::default())
            .await
            .unwrap_err();

        assert!(partial.saved.is_empty());
        assert!(matches!(
            partial.error,
            UploadError::FileTypeNotAllowed { ref detected } if detected == "image/png"
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn allowlist_matches_case_insensitively() {
        let dir = tempdir().unwrap();
        let config = Config {
            allowed_file_types: vec!["IMAGE/PNG".to_string()],
            ..Config::default()
        };
        let data = png_bytes(1024);
        let multipart =
            multipart_from(multipart_body(&[("file", Some("photo.png"), &data)])).await;

        let files = save_files(&config, multipart, dir.path(), SaveOptions::default())
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn keeps_original_name_when_rename_disabled() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let data = png_bytes(1024);
        let multipart =
            multipart_from(multipart_body(&[("file", Some("photo.png"), &data)])).await;

        let file = save_file(&config, multipart, dir.path(), SaveOptions { rename: false })
            .await
            .unwrap();

        assert_eq!(file.new_file_name, "photo.png");
        assert!(dir.path().join("photo.png").exists());
    }

    #[tokio::test]
    async fn strips_directories_from_client_filename() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let data = png_bytes(1024);
        let multipart =
            multipart_from(multipart_body(&[("file", Some("nested/dirs/photo.png"), &data)]))
                .await;

        let file = save_file(&config, multipart, dir.path(), SaveOptions { rename: false })
            .await
            .unwrap();

        assert_eq!(file.new_file_name, "photo.png");
    }

    #[tokio::test]
    async fn rejects_traversal_filename() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let data = png_bytes(1024);
        let multipart = multipart_from(multipart_body(&[("file", Some(".."), &data)])).await;

        let err = save_file(&config, multipart, dir.path(), SaveOptions { rename: false })
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::BadFilename(_)));
    }

    #[tokio::test]
    async fn enforces_total_upload_budget() {
        let dir = tempdir().unwrap();
        let config = Config {
            max_upload_bytes: 100,
            ..Config::default()
        };
        let data = png_bytes(4096);
        let multipart =
            multipart_from(multipart_body(&[("file", Some("photo.png"), &data)])).await;

        let partial = save_files(&config, multipart, dir.path(), SaveOptions::default())
            .await
            .unwrap_err();

        assert!(partial.saved.is_empty());
        assert!(matches!(partial.error, UploadError::TooLarge { limit: 100 }));
        // No half-written file is left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn keeps_saved_prefix_when_a_later_part_fails() {
        let dir = tempdir().unwrap();
        let config = Config {
            allowed_file_types: vec!["image/png".to_string()],
            ..Config::default()
        };
        let good = png_bytes(1024);
        let bad = jpeg_bytes(1024);
        let multipart = multipart_from(multipart_body(&[
            ("file", Some("good.png"), &good),
            ("file", Some("bad.jpg"), &bad),
        ]))
        .await;

        let partial = save_files(&config, multipart, dir.path(), SaveOptions::default())
            .await
            .unwrap_err();

        assert_eq!(partial.saved.len(), 1);
        assert_eq!(partial.saved[0].original_file_name, "good.png");
        assert!(dir.path().join(&partial.saved[0].new_file_name).exists());
        assert!(matches!(
            partial.error,
            UploadError::FileTypeNotAllowed { .. }
        ));
    }

    #[tokio::test]
    async fn stores_multiple_files_in_request_order() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let first = png_bytes(1024);
        let second = jpeg_bytes(2048);
        let multipart = multipart_from(multipart_body(&[
            ("file", Some("a.png"), &first),
            ("file", Some("b.jpg"), &second),
        ]))
        .await;

        let files = save_files(&config, multipart, dir.path(), SaveOptions::default())
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].original_file_name, "a.png");
        assert_eq!(files[1].original_file_name, "b.jpg");
        assert!(files[0].new_file_name.ends_with(".png"));
        assert!(files[1].new_file_name.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn skips_plain_form_fields() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let data = png_bytes(1024);
        let multipart = multipart_from(multipart_body(&[
            ("description", None, b"holiday snaps"),
            ("file", Some("photo.png"), &data),
        ]))
        .await;

        let files = save_files(&config, multipart, dir.path(), SaveOptions::default())
            .await
            .unwrap();

        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn request_without_file_part_is_no_file() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let multipart =
            multipart_from(multipart_body(&[("description", None, b"text only")])).await;

        let err = save_file(&config, multipart, dir.path(), SaveOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::NoFile));
    }

    #[tokio::test]
    async fn destination_directory_creation_is_idempotent() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        let config = Config::default();

        for _ in 0..2 {
            let data = png_bytes(64);
            let multipart =
                multipart_from(multipart_body(&[("file", Some("photo.png"), &data)])).await;
            save_files(&config, multipart, &nested, SaveOptions::default())
                .await
                .unwrap();
        }

        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 2);
    }
}
