//! Input validation and sanitization.
//!
//! Everything here is pure: these checks run before the store touches the
//! filesystem, so a rejected upload never has side effects.
//!
//! Acceptance is a metadata check only. An upload counts as an archive when
//! its declared media type or its file extension says so; the bytes are not
//! inspected.

use crate::Error;

/// Canonical media type for ZIP archives.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Canonical file extension for ZIP archives, including the dot.
pub const ZIP_EXTENSION: &str = ".zip";

/// File name used when the client does not send one.
pub const DEFAULT_FILENAME: &str = "upload.zip";

/// Replacement for characters outside an allow-list.
pub const PLACEHOLDER: char = '_';

/// Character allow-lists for the two segments of a stored file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
  /// ASCII alphanumerics, `-` and `_`.
  Identifier,
  /// ASCII alphanumerics, `.`, `-` and `_`.
  Filename,
}

impl Charset {
  pub fn allows(self, c: char) -> bool {
    match c {
      'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => true,
      '.' => self == Charset::Filename,
      _ => false,
    }
  }
}

/// Which uploads count as archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePolicy {
  content_type: String,
  extension: String,
}

impl Default for ArchivePolicy {
  fn default() -> Self {
    Self {
      content_type: ZIP_CONTENT_TYPE.to_string(),
      extension: ZIP_EXTENSION.to_string(),
    }
  }
}

impl ArchivePolicy {
  /// Create a policy. The extension is lower-cased and given a leading dot
  /// if it lacks one.
  pub fn new(content_type: impl Into<String>, extension: &str) -> Self {
    let extension = extension.to_lowercase();
    let extension = if extension.starts_with('.') {
      extension
    } else {
      format!(".{extension}")
    };

    Self {
      content_type: content_type.into(),
      extension,
    }
  }

  pub fn content_type(&self) -> &str {
    &self.content_type
  }

  pub fn extension(&self) -> &str {
    &self.extension
  }

  /// Case-insensitive comparison against the archive media type.
  pub fn matches_content_type(&self, content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.eq_ignore_ascii_case(&self.content_type))
  }

  /// Case-insensitive check of the file name's extension.
  pub fn matches_filename(&self, filename: &str) -> bool {
    filename.to_lowercase().ends_with(&self.extension)
  }
}

/// Decide whether an upload is an acceptable archive.
///
/// Empty content is always rejected. Otherwise the upload is accepted when
/// either the declared media type or the file name matches `policy`.
pub fn is_acceptable_upload(
  content: &[u8],
  content_type: Option<&str>,
  filename: Option<&str>,
  policy: &ArchivePolicy,
) -> Result<(), Error> {
  if content.is_empty() {
    return Err(Error::InvalidInput("file must not be empty".to_string()));
  }

  if policy.matches_content_type(content_type) || filename.is_some_and(|f| policy.matches_filename(f))
  {
    return Ok(());
  }

  Err(Error::InvalidInput(format!(
    "only {} files are supported",
    policy.extension().trim_start_matches('.').to_uppercase()
  )))
}

/// Replace every character outside `charset` with [`PLACEHOLDER`].
///
/// One placeholder is emitted per offending character, so the result has the
/// same number of characters as the input.
pub fn sanitize_token(raw: &str, charset: Charset) -> String {
  raw
    .chars()
    .map(|c| if charset.allows(c) { c } else { PLACEHOLDER })
    .collect()
}

/// Fail with [`Error::MissingRequiredField`] when `value` is empty or
/// whitespace only.
pub fn require_non_blank<'a>(value: &'a str, field: &'static str) -> Result<&'a str, Error> {
  if value.trim().is_empty() {
    Err(Error::MissingRequiredField { field })
  } else {
    Ok(value)
  }
}

/// The client's file name, or [`DEFAULT_FILENAME`] when absent or blank.
pub fn default_filename(filename: Option<&str>) -> &str {
  match filename {
    Some(name) if !name.trim().is_empty() => name,
    _ => DEFAULT_FILENAME,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAFE: &[&str] = &["report-123", "abc_DEF", "", "0"];

  #[test]
  fn test_sanitize_keeps_safe_input() {
    for s in SAFE {
      assert_eq!(sanitize_token(s, Charset::Identifier), *s);
      assert_eq!(sanitize_token(s, Charset::Filename), *s);
    }
    assert_eq!(
      sanitize_token("sample.v2.zip", Charset::Filename),
      "sample.v2.zip"
    );
  }

  #[test]
  fn test_sanitize_replaces_disallowed_characters() {
    assert_eq!(sanitize_token("a b/c", Charset::Identifier), "a_b_c");
    assert_eq!(sanitize_token("../etc", Charset::Identifier), "___etc");
    assert_eq!(sanitize_token("../etc", Charset::Filename), ".._etc");
    assert_eq!(sanitize_token("a\0b", Charset::Filename), "a_b");
    assert_eq!(sanitize_token("r\\p.zip", Charset::Filename), "r_p.zip");
  }

  #[test]
  fn test_sanitize_preserves_character_count() {
    let raw = "réport 名前/..zip";
    let out = sanitize_token(raw, Charset::Filename);
    assert_eq!(out.chars().count(), raw.chars().count());
    assert_eq!(out, "r_port____..zip");
  }

  #[test]
  fn test_sanitize_is_idempotent() {
    let inputs = ["", "a/b", "../../x", "white space", "ünï©ødé", "a\0.zip", "..."];
    for raw in inputs {
      for charset in [Charset::Identifier, Charset::Filename] {
        let once = sanitize_token(raw, charset);
        assert_eq!(sanitize_token(&once, charset), once, "input {raw:?}");
      }
    }
  }

  #[test]
  fn test_identifier_charset_rejects_dot() {
    assert_eq!(sanitize_token("v1.2", Charset::Identifier), "v1_2");
  }

  #[test]
  fn test_require_non_blank() {
    assert!(matches!(
      require_non_blank("", "identifier"),
      Err(Error::MissingRequiredField {
        field: "identifier"
      })
    ));
    assert!(matches!(
      require_non_blank(" \t\n", "identifier"),
      Err(Error::MissingRequiredField { .. })
    ));
    assert_eq!(require_non_blank(" x ", "identifier").unwrap(), " x ");
  }

  #[test]
  fn test_empty_content_is_rejected() {
    let policy = ArchivePolicy::default();
    let result = is_acceptable_upload(b"", Some(ZIP_CONTENT_TYPE), Some("a.zip"), &policy);
    assert!(matches!(result, Err(Error::InvalidInput(_))));
  }

  #[test]
  fn test_content_type_alone_is_accepted() {
    let policy = ArchivePolicy::default();
    assert!(is_acceptable_upload(b"PK", Some("application/zip"), None, &policy).is_ok());
    assert!(is_acceptable_upload(b"PK", Some("Application/ZIP"), None, &policy).is_ok());
  }

  #[test]
  fn test_extension_alone_is_accepted() {
    let policy = ArchivePolicy::default();
    assert!(is_acceptable_upload(b"PK", None, Some("report.ZIP"), &policy).is_ok());
    assert!(is_acceptable_upload(b"PK", Some("garbage"), Some("report.Zip"), &policy).is_ok());
  }

  #[test]
  fn test_text_upload_is_rejected() {
    let policy = ArchivePolicy::default();
    let result = is_acceptable_upload(b"hello", Some("text/plain"), Some("notes.txt"), &policy);
    assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("ZIP")));
  }

  #[test]
  fn test_custom_policy_normalizes_extension() {
    let policy = ArchivePolicy::new("application/x-tar", "TAR");
    assert_eq!(policy.extension(), ".tar");
    assert!(policy.matches_filename("backup.TAR"));
    assert!(!policy.matches_filename("backup.zip"));
  }

  #[test]
  fn test_default_filename() {
    assert_eq!(default_filename(None), DEFAULT_FILENAME);
    assert_eq!(default_filename(Some("  ")), DEFAULT_FILENAME);
    assert_eq!(default_filename(Some("a.zip")), "a.zip");
  }
}
