//! Configuration constants, option types and URL builders.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::version::FimVersion;

/// Namespace of XDatenfelder 1.x documents.
pub const NAMESPACE_V1: &str = "urn:xoev-de:fim:standard:xdatenfelder_1";

/// Namespace of XDatenfelder 2.x documents.
pub const NAMESPACE_V2: &str = "urn:xoev-de:fim:standard:xdatenfelder_2";

/// Namespace prefix the FIM exports declare for their elements.
pub const NAMESPACE_PREFIX: &str = "xdf";

/// Base URL of the XRepository code-list registry.
pub const XREPOSITORY_URL: &str = "https://www.xrepository.de";

/// JSON Schema dialect written into every generated schema.
pub const JSON_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// HTTP timeout in seconds, applied to document and code-list downloads.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for a single HTTP request.
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// `maxItems` value written for structures with a `*` upper bound.
///
/// Form renderers consuming these schemas expect a number here, so the
/// unbounded case is written as this sentinel instead of omitting the key.
pub const UNBOUNDED_MAX_ITEMS: u64 = 9999;

/// Header placeholder values that FIM authors use to mean "no value".
pub const EMPTY_VALUES: [&str; 3] = ["", ".", "-"];

/// Display hint for the top-level schema (renderer layout).
pub const DISPLAY_EXPANSION_PANELS: &str = "expansion-panels";

/// Display hint for read-only label fields.
pub const DISPLAY_LABEL: &str = "label";

/// Display hint for file attachments.
pub const DISPLAY_FILE: &str = "file";

/// Display hint for binary objects.
pub const DISPLAY_DATA_URL: &str = "data-url";

/// Code-list URN that XRepository cannot resolve to a current version.
pub const PINNED_CODE_LISTS: [(&str, &str); 1] = [(
    "urn:xoev-de:xunternehmen:codeliste:ihk",
    "urn:xoev-de:xunternehmen:codeliste:ihk_2021-02-15",
)];

/// Cardinality pattern: `min:max` where max may be `*`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub static CARDINALITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*:\s*(\d+|\*)\s*$").expect("valid regex"));

/// Retry behaviour for HTTP requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (including the first one).
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for every further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before the given (zero-based) attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            Duration::ZERO
        } else {
            self.base_delay * (1 << (attempt - 1).min(16))
        }
    }
}

/// Settings for the blocking HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// Options for building the element model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip namespace detection and use this version.
    ///
    /// No validation happens when set; a wrong version yields missing ids or
    /// code-list references rather than an error.
    pub version: Option<FimVersion>,
}

/// Options for schema emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// Collect contained elements under `$defs` and reference them.
    pub deduplicate: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { deduplicate: true }
    }
}

/// Options for a complete load, parse and emit run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub parse: ParseOptions,
    pub emit: EmitOptions,
    pub http: HttpConfig,
}

/// Build the URL that reports the current version of a code list.
///
/// # Examples
/// ```
/// use ozg_xdatenfelder::config::code_list_version_url;
///
/// assert_eq!(
///     code_list_version_url("https://www.xrepository.de", "urn:de:example"),
///     "https://www.xrepository.de/api/codeliste/urn:de:example/gueltigeVersion"
/// );
/// ```
pub fn code_list_version_url(base_url: &str, urn: &str) -> String {
    format!(
        "{}/api/codeliste/{urn}/gueltigeVersion",
        base_url.trim_end_matches('/')
    )
}

/// Build the URL of the JSON rendering of a specific code-list version.
pub fn code_list_json_url(base_url: &str, version_urn: &str) -> String {
    format!(
        "{}/api/version_codeliste/{version_urn}/json",
        base_url.trim_end_matches('/')
    )
}

/// Look up a code list whose version is pinned instead of queried.
pub fn pinned_code_list_version(urn: &str) -> Option<&'static str> {
    PINNED_CODE_LISTS
        .iter()
        .find(|(pinned, _)| *pinned == urn)
        .map(|(_, version)| *version)
}
