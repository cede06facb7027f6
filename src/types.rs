use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Posts considered when totalling likes and comments
pub const POST_SAMPLE_SIZE: usize = 12;

/// Monthly lookup allowance before the usage ledger refuses queries
pub const DEFAULT_MAX_USAGE: u32 = 1000;

pub const DEFAULT_RAPIDAPI_HOST: &str = "instagram-social-api.p.rapidapi.com";
pub const DEFAULT_TIKTOK_HOST: &str = "https://api.omar-thing.site";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    TikTok,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Instagram => write!(f, "instagram"),
            Platform::TikTok => write!(f, "tiktok"),
        }
    }
}

/// A profile page resolved to a platform and username
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileHandle {
    pub platform: Platform,
    pub username: String,
    pub url: String,
}

/// A single content item reduced to the one metric being aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentItem {
    pub taken_at: Option<i64>, // seconds since epoch; None when the feed gave no usable date
    pub engagement_count: u64,
    pub is_pinned: bool,
}

impl ContentItem {
    pub fn new(taken_at: i64, engagement_count: u64) -> Self {
        Self {
            taken_at: Some(taken_at),
            engagement_count,
            is_pinned: false,
        }
    }

    pub fn undated(engagement_count: u64) -> Self {
        Self {
            taken_at: None,
            engagement_count,
            is_pinned: false,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.is_pinned = true;
        self
    }
}

/// Sum, count and mean over the retained item set
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub total_count: u64,
    pub item_count: usize,
    pub average_count: f64,
}

impl AggregationResult {
    pub fn rounded_average(&self) -> u64 {
        self.average_count.round() as u64
    }

    /// Rounded average as the UI renders it
    pub fn average_display(&self) -> String {
        self.rounded_average().to_string()
    }
}

/// Which metric of a feed entry feeds the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementMetric {
    Likes,
    Comments,
    Plays,
}

/// Content categories carry different same-day cutoffs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Posts,
    Reels,
}

impl ContentCategory {
    /// Trailing days (today included) dropped before aggregation
    pub fn cutoff_days(&self) -> u32 {
        match self {
            ContentCategory::Posts => 1,
            ContentCategory::Reels => 0,
        }
    }

    pub fn primary_metric(&self) -> EngagementMetric {
        match self {
            ContentCategory::Posts => EngagementMetric::Likes,
            ContentCategory::Reels => EngagementMetric::Plays,
        }
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentCategory::Posts => write!(f, "posts"),
            ContentCategory::Reels => write!(f, "reels"),
        }
    }
}

impl std::str::FromStr for ContentCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(ContentCategory::Posts),
            "reels" => Ok(ContentCategory::Reels),
            _ => Err(anyhow::anyhow!("Invalid content category: {}", s)),
        }
    }
}

/// A feed entry as the posts/reels endpoints deliver it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaItem {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub taken_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub comment_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub play_count: u64,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_pinned: bool,
}

impl MediaItem {
    pub fn to_content_item(&self, metric: EngagementMetric) -> ContentItem {
        let engagement_count = match metric {
            EngagementMetric::Likes => self.like_count,
            EngagementMetric::Comments => self.comment_count,
            EngagementMetric::Plays => self.play_count,
        };
        ContentItem {
            taken_at: self.taken_at,
            engagement_count,
            is_pinned: self.is_pinned,
        }
    }
}

/// Interpret an arbitrary JSON value as a non-negative count, 0 when it isn't one
pub fn count_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
                    _ => 0,
                }
            }
        }
        Value::String(s) => {
            let cleaned = s.trim().replace(',', "");
            cleaned
                .parse::<u64>()
                .ok()
                .or_else(|| {
                    cleaned
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f > 0.0)
                        .map(|f| f.trunc() as u64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_from_value(&value))
}

/// Unix seconds, or `None` for anything that isn't a usable date
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(matches!(value, Value::Bool(true)))
}

/// Likes and comments totalled over the most recent eligible posts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PostStats {
    pub total_likes: u64,
    pub total_comments: u64,
    pub sample_size: usize,
}

impl PostStats {
    pub fn average_likes(&self) -> f64 {
        if self.sample_size == 0 {
            return 0.0;
        }
        self.total_likes as f64 / self.sample_size as f64
    }

    pub fn average_comments(&self) -> f64 {
        if self.sample_size == 0 {
            return 0.0;
        }
        self.total_comments as f64 / self.sample_size as f64
    }
}

/// Outlier-filtered play statistics for short-video content
#[derive(Debug, Clone, PartialEq)]
pub struct ReelsStats {
    pub average_plays: String,
    pub plays: AggregationResult,
}

/// Profile summary in the shape the sidebar renders
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProfileData {
    pub username: String,
    pub email: String,
    pub followers_count: Option<u64>,
    pub location: String,
    #[serde(rename = "profilePicUrl")]
    pub profile_pic_url: Option<String>,
    #[serde(rename = "profileUrl")]
    pub profile_url: String,
    pub engagement_rate: Option<f64>,
}

/// Historical performance figures reported for a TikTok creator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CreatorStats {
    pub average_likes: Option<f64>,
    pub average_comments: Option<f64>,
    pub average_views: Option<f64>,
    pub engagement_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub profile: ProfileHandle,
    pub profile_pic_url: Option<String>,
    pub user_id: Option<String>,
    pub reference: DateTime<FixedOffset>,
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: String,
    pub tiktok_host: String,
    pub tiktok_key: Option<String>,
    pub state_dir: PathBuf,
    pub max_usage: u32,
    pub timeout_secs: u64,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}
