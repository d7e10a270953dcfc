use serde::Deserialize;

/// Main configuration structure for vidsift
///
/// Every table and key is optional; missing values fall back to the defaults
/// below, so an empty file is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_categories", rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            api: ApiConfig::default(),
            output: OutputConfig::default(),
            categories: default_categories(),
        }
    }
}

impl Config {
    /// Looks up a category by its display name or slug
    pub fn find_category(&self, name: &str) -> Option<&CategoryEntry> {
        self.categories
            .iter()
            .find(|c| c.name == name || c.slug.as_deref() == Some(name))
    }
}

/// Crawl policy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Like rate an entry must strictly exceed to be kept
    pub quality_threshold: f64,

    /// Number of entries to collect per ranking category
    pub target_per_category: usize,

    /// Number of entries to collect from the popular feed
    pub target_popular: usize,

    /// Maximum number of pages to request in one run
    pub max_pages: u32,

    /// Consecutive pages without a kept entry before a run gives up
    pub max_empty_pages: u32,

    /// Entries requested per page
    pub page_size: u32,

    /// Per-request timeout (seconds)
    pub request_timeout: u64,

    /// Lower bound of the randomized wait between requests (seconds)
    pub delay_min: f64,

    /// Upper bound of the randomized wait between requests (seconds)
    pub delay_max: f64,

    /// Extra attempts for a page that failed at the transport level
    pub fetch_retries: u32,

    /// Base wait before a retry (seconds), multiplied by the attempt number
    pub retry_backoff: f64,

    /// Stop the remaining categories once the API reports blocking
    pub abort_on_blocked: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 0.1,
            target_per_category: 100,
            target_popular: 500,
            max_pages: 50,
            max_empty_pages: 5,
            page_size: 20,
            request_timeout: 10,
            delay_min: 2.0,
            delay_max: 4.0,
            fetch_retries: 0,
            retry_backoff: 1.0,
            abort_on_blocked: false,
        }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Scheme and host of the API, without a trailing path
    pub base_url: String,

    /// Path of the per-category ranking listing
    pub ranking_path: String,

    /// Path of the paginated popular listing
    pub popular_path: String,

    /// Prefix joined with an entry id to build its public URL
    pub content_url_base: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Referer header sent with every request
    pub referer: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bilibili.com".to_string(),
            ranking_path: "/x/web-interface/ranking/v2".to_string(),
            popular_path: "/x/web-interface/popular".to_string(),
            content_url_base: "https://www.bilibili.com/video/".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            referer: "https://www.bilibili.com/".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving one CSV per ranking category
    pub ranking_dir: String,

    /// Directory receiving timestamped popular-feed CSVs
    pub popular_dir: String,

    /// File name prefix for ranking exports
    pub csv_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ranking_dir: "data/ranking".to_string(),
            popular_dir: "data/popular".to_string(),
            csv_prefix: "TOP".to_string(),
        }
    }
}

/// One entry of the category registry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryEntry {
    /// Display name, also used in export file names
    pub name: String,

    /// Numeric category id sent to the ranking endpoint
    pub id: u32,

    /// Short ASCII alias accepted on the command line
    #[serde(default)]
    pub slug: Option<String>,
}

impl CategoryEntry {
    fn new(name: &str, id: u32, slug: &str) -> Self {
        Self {
            name: name.to_string(),
            id,
            slug: Some(slug.to_string()),
        }
    }
}

/// The built-in category registry
pub fn default_categories() -> Vec<CategoryEntry> {
    vec![
        CategoryEntry::new("全站", 0, "all"),
        CategoryEntry::new("国产动画", 168, "guochan"),
        CategoryEntry::new("国创相关", 168, "guochuang"),
        CategoryEntry::new("纪录片", 177, "documentary"),
        CategoryEntry::new("动画", 1, "douga"),
        CategoryEntry::new("音乐", 3, "music"),
        CategoryEntry::new("舞蹈", 129, "dance"),
        CategoryEntry::new("游戏", 4, "game"),
        CategoryEntry::new("知识", 36, "knowledge"),
        CategoryEntry::new("科技", 188, "tech"),
        CategoryEntry::new("运动", 234, "sports"),
        CategoryEntry::new("汽车", 223, "car"),
        CategoryEntry::new("生活", 160, "life"),
        CategoryEntry::new("美食", 211, "food"),
        CategoryEntry::new("动物圈", 217, "animal"),
        CategoryEntry::new("鬼畜", 119, "kichiku"),
        CategoryEntry::new("时尚", 155, "fashion"),
        CategoryEntry::new("娱乐", 5, "ent"),
        CategoryEntry::new("影视", 181, "cinephile"),
    ]
}
