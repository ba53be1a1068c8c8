//! Text extraction from uploaded files.

use crate::errors::AppError;

const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "text/plain",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Minimum plausible length for a document worth analyzing.
pub const MIN_DOCUMENT_CHARS: usize = 50;

/// Extracts plain text from an uploaded file body.
///
/// PDFs go through `pdf-extract`; everything else is treated as UTF-8 text
/// (lossy, matching how the original service handled Word uploads).
pub fn extract_text(content_type: &str, data: &[u8]) -> Result<String, AppError> {
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(AppError::Validation(format!(
            "Unsupported file type: {content_type}. Please upload a PDF, Word document, or text file."
        )));
    }

    let text = if content_type == "application/pdf" {
        pdf_extract::extract_text_from_mem(data)
            .map_err(|e| AppError::Validation(format!("Could not read PDF content: {e}")))?
    } else {
        String::from_utf8_lossy(data).into_owned()
    };

    if text.trim().len() < MIN_DOCUMENT_CHARS {
        return Err(AppError::Validation(
            "Document content is too short. Please provide a complete document.".to_string(),
        ));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let body = "A perfectly reasonable cover letter with enough characters to analyze.";
        let text = extract_text("text/plain", body.as_bytes()).unwrap();
        assert_eq!(text, body);
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let result = extract_text("image/png", b"....");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn short_content_is_rejected() {
        let result = extract_text("text/plain", b"too short");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
