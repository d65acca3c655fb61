use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for VPN-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Search endpoint queried once per key
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Query parameter carrying the key
    #[serde(rename = "search-param", default = "default_search_param")]
    pub search_param: String,

    /// CSS selector for the link to a record's profile page
    #[serde(
        rename = "profile-link-selector",
        default = "default_profile_link_selector"
    )]
    pub profile_link_selector: String,

    /// Location fragments that mean the site denied access to this identity
    #[serde(rename = "blocked-patterns", default = "default_blocked_patterns")]
    pub blocked_patterns: Vec<String>,

    /// HTTP statuses that also count as a block signal
    #[serde(rename = "blocked-statuses", default)]
    pub blocked_statuses: Vec<u16>,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Pause between consecutive items (milliseconds)
    #[serde(rename = "item-delay", default = "default_item_delay")]
    pub item_delay: u64,
}

/// Egress control configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// Program that switches the VPN
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments for connecting; `{identity}` is replaced by the identity name
    #[serde(rename = "connect-args", default = "default_connect_args")]
    pub connect_args: Vec<String>,

    /// Arguments for disconnecting
    #[serde(rename = "disconnect-args", default = "default_disconnect_args")]
    pub disconnect_args: Vec<String>,

    /// Output word that reports a successful connect
    #[serde(rename = "connect-marker", default = "default_connect_marker")]
    pub connect_marker: String,

    /// Output word that reports a successful disconnect
    #[serde(rename = "disconnect-marker", default = "default_disconnect_marker")]
    pub disconnect_marker: String,

    /// Connect command timeout (seconds)
    #[serde(rename = "connect-timeout", default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Disconnect command timeout (seconds)
    #[serde(rename = "disconnect-timeout", default = "default_disconnect_timeout")]
    pub disconnect_timeout: u64,

    /// Connect attempts per identity before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between failed attempts (milliseconds)
    #[serde(rename = "retry-backoff", default = "default_retry_backoff")]
    pub retry_backoff: u64,

    /// Pause after a disconnect before connecting (milliseconds)
    #[serde(rename = "disconnect-settle", default = "default_disconnect_settle")]
    pub disconnect_settle: u64,

    /// Pause after a successful connect so the tunnel can come up (milliseconds)
    #[serde(rename = "stabilization", default = "default_stabilization")]
    pub stabilization: u64,

    /// Ordered identity catalog; the built-in list is used when absent
    #[serde(default)]
    pub identities: Option<Vec<String>>,
}

/// Rotation cadence and state location
#[derive(Debug, Clone, Deserialize)]
pub struct RotationConfig {
    /// Rotate after this many items
    #[serde(rename = "every-n", default = "default_every_n")]
    pub every_n: usize,

    /// Path of the JSON rotation state file
    #[serde(rename = "state-path", default = "default_state_path")]
    pub state_path: String,
}

/// Work-item input configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Text file with one key per line
    #[serde(default = "default_input_path")]
    pub path: String,

    /// Skip keys that already have a row in the results file
    #[serde(rename = "skip-completed", default = "default_skip_completed")]
    pub skip_completed: bool,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// CSV file results are appended to
    #[serde(rename = "results-path", default = "default_results_path")]
    pub results_path: String,

    /// Replace diacritics in text columns before writing
    #[serde(default)]
    pub transliterate: bool,
}

/// Extraction tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// Locality names recognised in address blocks (matched upper-cased)
    #[serde(default = "default_localities")]
    pub localities: Vec<String>,

    /// Email addresses containing any of these fragments are skipped
    #[serde(rename = "email-exclusions", default = "default_email_exclusions")]
    pub email_exclusions: Vec<String>,
}

impl TargetConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay)
    }
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            connect_args: default_connect_args(),
            disconnect_args: default_disconnect_args(),
            connect_marker: default_connect_marker(),
            disconnect_marker: default_disconnect_marker(),
            connect_timeout: default_connect_timeout(),
            disconnect_timeout: default_disconnect_timeout(),
            max_attempts: default_max_attempts(),
            retry_backoff: default_retry_backoff(),
            disconnect_settle: default_disconnect_settle(),
            stabilization: default_stabilization(),
            identities: None,
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            every_n: default_every_n(),
            state_path: default_state_path(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            skip_completed: default_skip_completed(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: default_results_path(),
            transliterate: false,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            localities: default_localities(),
            email_exclusions: default_email_exclusions(),
        }
    }
}

fn default_search_param() -> String {
    "n".to_string()
}

fn default_profile_link_selector() -> String {
    "a[href*='/firma/']".to_string()
}

fn default_blocked_patterns() -> Vec<String> {
    vec!["registracija".to_string()]
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_item_delay() -> u64 {
    2000
}

fn default_command() -> String {
    "nordvpn".to_string()
}

fn default_connect_args() -> Vec<String> {
    vec!["-c".to_string(), "-g".to_string(), "{identity}".to_string()]
}

fn default_disconnect_args() -> Vec<String> {
    vec!["-d".to_string()]
}

fn default_connect_marker() -> String {
    "connected".to_string()
}

fn default_disconnect_marker() -> String {
    "disconnected".to_string()
}

fn default_connect_timeout() -> u64 {
    90
}

fn default_disconnect_timeout() -> u64 {
    45
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    5000
}

fn default_disconnect_settle() -> u64 {
    2000
}

fn default_stabilization() -> u64 {
    5000
}

fn default_every_n() -> usize {
    12
}

fn default_state_path() -> String {
    "vpn_state.json".to_string()
}

fn default_input_path() -> String {
    "input_keys.txt".to_string()
}

fn default_skip_completed() -> bool {
    true
}

fn default_results_path() -> String {
    "results.csv".to_string()
}

fn default_localities() -> Vec<String> {
    [
        "BAR",
        "PODGORICA",
        "CETINJE",
        "BUDVA",
        "ULCINJ",
        "HERCEG NOVI",
        "KOTOR",
        "TIVAT",
        "NIKŠIĆ",
        "PLJEVLJA",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_email_exclusions() -> Vec<String> {
    ["companywall", "example", "test", "noreply"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
