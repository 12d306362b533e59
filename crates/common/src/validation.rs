//! Input validation for uploads and summarization requests
//!
//! Every check runs before anything is written to the blob store or the
//! database.

use crate::config::{SummaryConfig, UploadConfig};
use crate::errors::{AppError, Result};
use std::path::Path;

/// Case-insensitive extension check against the allow-list
pub fn validate_file_extension(filename: &str, config: &UploadConfig) -> Result<()> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    let allowed = config
        .allowed_extensions
        .iter()
        .any(|a| a.to_lowercase() == ext);

    if ext.is_empty() || !allowed {
        return Err(AppError::InvalidFile {
            message: format!(
                "File type not allowed. Allowed extensions: {}",
                config.allowed_extensions.join(", ")
            ),
        });
    }
    Ok(())
}

pub fn validate_file_size(size: u64, config: &UploadConfig) -> Result<()> {
    if size == 0 {
        return Err(AppError::InvalidFile {
            message: "File is empty".to_string(),
        });
    }
    if size > config.max_file_size {
        return Err(AppError::InvalidFile {
            message: format!(
                "File size exceeds maximum allowed size of {}",
                human_size(config.max_file_size)
            ),
        });
    }
    Ok(())
}

/// Title must be non-blank, bounded in characters and free of control characters
pub fn validate_title(title: &str, config: &UploadConfig) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidTitle {
            message: "Title cannot be empty".to_string(),
        });
    }
    if title.chars().count() > config.max_title_length {
        return Err(AppError::InvalidTitle {
            message: format!(
                "Title cannot exceed {} characters",
                config.max_title_length
            ),
        });
    }
    if title.chars().any(char::is_control) {
        return Err(AppError::InvalidTitle {
            message: "Title contains invalid characters".to_string(),
        });
    }
    Ok(())
}

pub fn validate_style(style: &str, config: &SummaryConfig) -> Result<()> {
    if !config.allowed_styles.iter().any(|s| s == style) {
        return Err(AppError::InvalidStyle {
            message: format!(
                "Invalid summary style '{}'. Allowed styles: {}",
                style,
                config.allowed_styles.join(", ")
            ),
        });
    }
    Ok(())
}

pub fn validate_language(language: &str, config: &SummaryConfig) -> Result<()> {
    if !config.allowed_languages.iter().any(|l| l == language) {
        return Err(AppError::InvalidLanguage {
            message: format!(
                "Invalid language '{}'. Allowed languages: {}",
                language,
                config.allowed_languages.join(", ")
            ),
        });
    }
    Ok(())
}

/// Title used when the upload form has none: the file name without extension
pub fn default_title(filename: &str) -> String {
    let path = Path::new(filename);
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string()
}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_extension() {
        let config = UploadConfig::default();
        assert_ok!(validate_file_extension("report.pdf", &config));
        assert_ok!(validate_file_extension("REPORT.PDF", &config));

        for name in ["report.docx", "report", "pdf", "report.pdf.exe"] {
            let err = validate_file_extension(name, &config).unwrap_err();
            assert_eq!(err.kind(), "invalid_file", "{name}");
        }
    }

    #[test]
    fn test_size() {
        let config = UploadConfig::default();
        assert_ok!(validate_file_size(1, &config));
        assert_ok!(validate_file_size(config.max_file_size, &config));
        assert_err!(validate_file_size(0, &config));

        let err = validate_file_size(config.max_file_size + 1, &config).unwrap_err();
        assert_eq!(err.message(), "File size exceeds maximum allowed size of 10 MB");
    }

    #[test]
    fn test_title() {
        let config = UploadConfig::default();
        assert_ok!(validate_title("Annual report 2024", &config));
        assert_ok!(validate_title(&"é".repeat(255), &config));
        assert_err!(validate_title("   ", &config));
        assert_err!(validate_title(&"a".repeat(256), &config));

        let err = validate_title("bad\u{0}title", &config).unwrap_err();
        assert_eq!(err.kind(), "invalid_title");
    }

    #[test]
    fn test_style_and_language() {
        let config = SummaryConfig::default();
        assert_ok!(validate_style("concise", &config));
        assert_ok!(validate_language("en", &config));
        assert_eq!(validate_style("epic", &config).unwrap_err().kind(), "invalid_style");
        assert_eq!(
            validate_language("klingon", &config).unwrap_err().kind(),
            "invalid_language"
        );
        // allow-lists are case sensitive
        assert_err!(validate_style("Short", &config));
    }

    #[test]
    fn test_default_title() {
        assert_eq!(default_title("report.pdf"), "report");
        assert_eq!(default_title("my.annual.report.PDF"), "my.annual.report");
        assert_eq!(default_title("noext"), "noext");
    }
}
