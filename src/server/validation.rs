//! Display-name sanitization for the `usuarios` table.
//!
//! A name goes through: trim, length bound, tag stripping, a case-insensitive
//! denylist of injection-looking fragments, and finally an allowlist of
//! letters (including Spanish accented letters), digits and spaces.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::server::response::ApiError;

/// Minimum length of a sanitized name, in characters.
pub const NAME_MIN_LEN: usize = 3;
/// Maximum length of a name, in characters, both before and after sanitization.
pub const NAME_MAX_LEN: usize = 25;

pub const INVALID_NAME_MESSAGE: &str = "Nombre inválido: sin scripts, máx 25 caracteres";

/// Fragments that reject a name wherever they appear, compared lowercase.
pub const DENYLIST: &[&str] = &[
    // SQL keywords
    "select",
    "insert",
    "update",
    "delete",
    "drop",
    "truncate",
    "alter",
    "create",
    "replace",
    "rename",
    "grant",
    "revoke",
    "commit",
    "rollback",
    "savepoint",
    "union",
    "having",
    "where",
    "order by",
    "group by",
    "limit",
    "offset",
    "benchmark",
    "sleep",
    "load_file",
    "outfile",
    "into outfile",
    "information_schema",
    "table_schema",
    "database()",
    "version()",
    // SQL comments
    "--",
    "#",
    "/*",
    "*/",
    // boolean injection
    "' or ",
    "\" or ",
    "' and ",
    "\" and ",
    " or 1=1",
    " or '1'='1",
    " or \"1\"=\"1",
    // script and markup
    "script",
    "<script",
    "</script>",
    "javascript:",
    "onerror",
    "onload",
    "onclick",
    "onmouseover",
    "alert(",
    "prompt(",
    "confirm(",
    "<img",
    "<iframe",
    "<svg",
    "<object",
    "<embed",
    "<link",
    "<style",
    "<meta",
    "<",
    ">",
    "&lt;",
    "&gt;",
    // code execution
    "require(",
    "process.",
    "eval(",
    "child_process",
    "fs.",
    "exec(",
    // schemes and encodings
    "http://",
    "https://",
    "data:",
    "base64",
    "%27",
    "%22",
    "%3c",
    "%3e",
];

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>?").expect("valid tag regex"));

static ALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!("^[A-Za-z0-9áéíóúÁÉÍÓÚñÑ ]{{{NAME_MIN_LEN},{NAME_MAX_LEN}}}$");
    Regex::new(&pattern).expect("valid name regex")
});

/// Why a name was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameRejection {
    #[error("name is missing")]
    Missing,

    #[error("name is empty")]
    Empty,

    #[error("name exceeds {NAME_MAX_LEN} characters")]
    TooLong,

    #[error("name contains denied fragment {0:?}")]
    DeniedFragment(&'static str),

    #[error("name must be {NAME_MIN_LEN}-{NAME_MAX_LEN} letters, digits or spaces")]
    DisallowedCharacters,
}

fn find_denied(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    DENYLIST
        .iter()
        .copied()
        .find(|fragment| lower.contains(fragment))
}

/// Sanitizes a raw name, returning the cleaned value.
pub fn sanitize_name(raw: Option<&str>) -> Result<String, NameRejection> {
    let trimmed = raw.ok_or(NameRejection::Missing)?.trim();

    if trimmed.is_empty() {
        return Err(NameRejection::Empty);
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(NameRejection::TooLong);
    }

    let stripped = TAG_RE.replace_all(trimmed, "");

    if let Some(fragment) = find_denied(&stripped) {
        return Err(NameRejection::DeniedFragment(fragment));
    }

    if !ALLOWED_RE.is_match(&stripped) {
        return Err(NameRejection::DisallowedCharacters);
    }

    Ok(stripped.into_owned())
}

/// Sanitizes a request-supplied name, mapping any rejection to a 400.
pub fn validate_usuario_name(raw: Option<&str>) -> Result<String, ApiError> {
    sanitize_name(raw).map_err(|reason| {
        tracing::warn!(%reason, "Rejected usuario name");
        ApiError::bad_request(INVALID_NAME_MESSAGE)
    })
}
