//! Pulls the resume file and optional job description out of a multipart
//! upload and turns the file into plain text.

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::warn;

use crate::errors::AppError;

/// Upload cap enforced on `POST /api/resume/analyze`.
pub const RESUME_MAX_BYTES: usize = 5 * 1024 * 1024;

const RESUME_FIELD: &str = "resume";
const JOB_DESCRIPTION_FIELD: &str = "jobDescription";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file: UploadedFile,
    pub job_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Pdf,
    PlainText,
}

/// Reads the multipart body. Unknown fields are skipped.
pub async fn read_upload(mut multipart: Multipart) -> Result<ResumeUpload, AppError> {
    let mut file = None;
    let mut job_description = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(RESUME_FIELD) => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read resume: {e}")))?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some(JOB_DESCRIPTION_FIELD) => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Could not read jobDescription: {e}"))
                })?;
                job_description = Some(text.trim().to_string()).filter(|t| !t.is_empty());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;
    if file.data.is_empty() {
        return Err(AppError::Validation("resume file is empty".to_string()));
    }

    Ok(ResumeUpload {
        file,
        job_description,
    })
}

fn detect_kind(file: &UploadedFile) -> Option<FileKind> {
    let content_type = file.content_type.as_deref().unwrap_or_default();
    let extension = file
        .file_name
        .as_deref()
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    if content_type == "application/pdf"
        || extension.as_deref() == Some("pdf")
        || file.data.starts_with(b"%PDF")
    {
        return Some(FileKind::Pdf);
    }
    if content_type.starts_with("text/") || matches!(extension.as_deref(), Some("txt" | "md")) {
        return Some(FileKind::PlainText);
    }
    None
}

/// Extracts plain text from a PDF or UTF-8 text upload.
pub async fn extract_text(file: &UploadedFile) -> Result<String, AppError> {
    let text = match detect_kind(file) {
        Some(FileKind::Pdf) => {
            let data = file.data.clone();
            // pdf-extract is synchronous and can panic on malformed documents.
            let extracted =
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
                    .await;
            match extracted {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    return Err(AppError::UnprocessableEntity(format!(
                        "Could not read PDF: {e}"
                    )))
                }
                Err(e) => {
                    warn!(error = %e, "PDF extraction aborted");
                    return Err(AppError::UnprocessableEntity(
                        "Could not read PDF".to_string(),
                    ));
                }
            }
        }
        Some(FileKind::PlainText) => String::from_utf8(file.data.to_vec()).map_err(|_| {
            AppError::UnprocessableEntity("Text resume must be UTF-8".to_string())
        })?,
        None => {
            return Err(AppError::UnprocessableEntity(
                "Unsupported resume format; upload a PDF or plain text file".to_string(),
            ))
        }
    };

    if text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the resume".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: Option<&str>, content_type: Option<&str>, data: &'static [u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn test_detects_pdf_by_magic_bytes() {
        let f = file(Some("resume.bin"), None, b"%PDF-1.7 ...");
        assert_eq!(detect_kind(&f), Some(FileKind::Pdf));
    }

    #[test]
    fn test_detects_text_by_extension() {
        let f = file(Some("Resume.TXT"), None, b"hello");
        assert_eq!(detect_kind(&f), Some(FileKind::PlainText));
    }

    #[tokio::test]
    async fn test_extracts_plain_text() {
        let f = file(None, Some("text/plain"), b"EXPERIENCE\n- Built things");
        let text = extract_text(&f).await.unwrap();
        assert!(text.starts_with("EXPERIENCE"));
    }

    #[tokio::test]
    async fn test_unsupported_format_is_unprocessable() {
        let f = file(Some("resume.docx"), Some("application/msword"), b"PK\x03\x04");
        assert!(matches!(
            extract_text(&f).await,
            Err(AppError::UnprocessableEntity(_))
        ));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_unprocessable() {
        let f = file(Some("resume.pdf"), Some("application/pdf"), b"not really a pdf");
        assert!(matches!(
            extract_text(&f).await,
            Err(AppError::UnprocessableEntity(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_text_is_unprocessable() {
        let f = file(Some("resume.txt"), None, b"   \n  ");
        assert!(matches!(
            extract_text(&f).await,
            Err(AppError::UnprocessableEntity(_))
        ));
    }
}
