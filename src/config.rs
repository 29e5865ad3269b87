//! Configuration for the harvester.

use serde::{Deserialize, Serialize};

/// Target site and sport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Unauthenticated discovery endpoint listing sports and their tournaments
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    #[serde(default = "default_sport_id")]
    pub sport_id: String,
    /// Display name of the sport, also used as the in-page link text
    #[serde(default = "default_sport_name")]
    pub sport_name: String,
    /// Value written to the `sport` field of every record
    #[serde(default = "default_sport_label")]
    pub sport_label: String,
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

fn default_base_url() -> String {
    "https://sportsbook.draftkings.com".to_string()
}

fn default_catalog_url() -> String {
    "https://sportsbook.draftkings.com/sites/US-SB/api/v5/sports".to_string()
}

fn default_sport_id() -> String {
    "6".to_string()
}

fn default_sport_name() -> String {
    "Tennis".to_string()
}

fn default_sport_label() -> String {
    "tennis".to_string()
}

fn default_id_prefix() -> String {
    "sbk-tennis".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            catalog_url: default_catalog_url(),
            sport_id: default_sport_id(),
            sport_name: default_sport_name(),
            sport_label: default_sport_label(),
            id_prefix: default_id_prefix(),
        }
    }
}

/// Tournament exclusion filters, applied in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Tournaments already sourced elsewhere
    #[serde(default)]
    pub excluded_keywords: Vec<String>,
    #[serde(default = "default_category_keywords")]
    pub category_keywords: Vec<String>,
    #[serde(default = "default_catalog_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_category_keywords() -> Vec<String> {
    vec!["doubles".to_string()]
}

fn default_catalog_timeout_secs() -> u64 {
    20
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            excluded_keywords: Vec::new(),
            category_keywords: default_category_keywords(),
            timeout_secs: default_catalog_timeout_secs(),
        }
    }
}

/// Headless browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_chrome_path")]
    pub chrome_executable: Option<String>,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_launch_timeout_secs")]
    pub launch_timeout_secs: u64,
}

fn default_chrome_path() -> Option<String> {
    let path = if cfg!(target_os = "macos") {
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"
    } else if cfg!(target_os = "windows") {
        "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe"
    } else {
        "google-chrome"
    };
    Some(path.to_string())
}

fn default_true() -> bool {
    true
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_launch_timeout_secs() -> u64 {
    30
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_executable: default_chrome_path(),
            headless: true,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            user_agent: default_user_agent(),
            launch_timeout_secs: default_launch_timeout_secs(),
        }
    }
}

/// Page navigation strategies, tried in the configured order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStrategy {
    /// Per-tournament deep link built from the tournament slug and id
    DeepLink,
    /// Open the home page and click the link whose text names the sport
    LinkDiscovery,
    /// Known section URLs, tried in order until one yields data
    SectionCandidates,
}

/// Capture engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    /// Fixed wait after each navigation for the site's own requests to fire
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
    #[serde(default = "default_primary_strategies")]
    pub primary_strategies: Vec<NavigationStrategy>,
    /// Deep-link each tournament still missing data after the primary pass
    #[serde(default = "default_true")]
    pub secondary_deep_link: bool,
    #[serde(default = "default_section_candidates")]
    pub section_candidates: Vec<String>,
    /// Placeholders: `{base}`, `{slug}`, `{id}`
    #[serde(default = "default_deep_link_template")]
    pub deep_link_template: String,
    /// Placeholders: `{base}`, `{event_id}`
    #[serde(default = "default_event_template")]
    pub event_template: String,
    #[serde(default)]
    pub event_detail_pass: bool,
    #[serde(default = "default_max_detail_pages")]
    pub max_detail_pages: usize,
    #[serde(default = "default_navigations_per_minute")]
    pub navigations_per_minute: u32,
    #[serde(default = "default_min_pacing_secs")]
    pub min_pacing_secs: f64,
    #[serde(default = "default_max_pacing_secs")]
    pub max_pacing_secs: f64,
}

fn default_navigation_timeout_secs() -> u64 {
    45
}

fn default_settle_delay_secs() -> u64 {
    20
}

fn default_primary_strategies() -> Vec<NavigationStrategy> {
    vec![
        NavigationStrategy::LinkDiscovery,
        NavigationStrategy::SectionCandidates,
    ]
}

fn default_section_candidates() -> Vec<String> {
    vec![
        "{base}/sports/tennis".to_string(),
        "{base}/leagues/tennis".to_string(),
        "{base}/featured/tennis".to_string(),
    ]
}

fn default_deep_link_template() -> String {
    "{base}/leagues/tennis/{slug}".to_string()
}

fn default_event_template() -> String {
    "{base}/event/{event_id}".to_string()
}

fn default_max_detail_pages() -> usize {
    10
}

fn default_navigations_per_minute() -> u32 {
    12
}

fn default_min_pacing_secs() -> f64 {
    1.0
}

fn default_max_pacing_secs() -> f64 {
    3.0
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: default_navigation_timeout_secs(),
            settle_delay_secs: default_settle_delay_secs(),
            primary_strategies: default_primary_strategies(),
            secondary_deep_link: true,
            section_candidates: default_section_candidates(),
            deep_link_template: default_deep_link_template(),
            event_template: default_event_template(),
            event_detail_pass: false,
            max_detail_pages: default_max_detail_pages(),
            navigations_per_minute: default_navigations_per_minute(),
            min_pacing_secs: default_min_pacing_secs(),
            max_pacing_secs: default_max_pacing_secs(),
        }
    }
}

/// Upload endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Records are only logged when unset
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_publish_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_publish_timeout_secs() -> u64 {
    30
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            upload_url: None,
            token: None,
            timeout_secs: default_publish_timeout_secs(),
        }
    }
}

/// Recurring trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

fn default_interval_minutes() -> u64 {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            run_on_startup: true,
        }
    }
}

/// Capture archive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_archive_dir")]
    pub dir: String,
    #[serde(default = "default_archive_ttl_hours")]
    pub ttl_hours: i64,
}

fn default_archive_dir() -> String {
    "data/captures".to_string()
}

fn default_archive_ttl_hours() -> i64 {
    24
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_archive_dir(),
            ttl_hours: default_archive_ttl_hours(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> crate::error::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (TENNIS_ODDS_PUBLISH__UPLOAD_URL, etc.)
            .add_source(
                config::Environment::with_prefix("TENNIS_ODDS")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("catalog.excluded_keywords")
                    .with_list_parse_key("catalog.category_keywords")
                    .with_list_parse_key("capture.section_candidates")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
