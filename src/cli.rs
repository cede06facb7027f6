use crate::types::{
    Config, OutputFormat, Platform, ProfileHandle, DEFAULT_MAX_USAGE, DEFAULT_RAPIDAPI_HOST,
    DEFAULT_TIKTOK_HOST,
};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Instagram or TikTok profile URL
    pub url: String,

    /// Avatar URL already known to the caller; preferred over the API's
    #[arg(long)]
    pub profile_pic_url: Option<String>,

    #[arg(long)]
    pub user_id: Option<String>,

    /// "now", "today", "yesterday", YYYY-MM-DD or RFC 3339
    #[arg(long, default_value = "now")]
    pub reference: String,

    #[arg(long, env = "RAPIDAPI_KEY", hide_env_values = true)]
    pub rapidapi_key: Option<String>,

    #[arg(long, default_value = DEFAULT_RAPIDAPI_HOST)]
    pub rapidapi_host: String,

    #[arg(long, default_value = DEFAULT_TIKTOK_HOST)]
    pub tiktok_host: String,

    #[arg(long, env = "TIKTOK_API_KEY", hide_env_values = true)]
    pub tiktok_key: Option<String>,

    #[arg(long, default_value = "./state")]
    pub state_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_MAX_USAGE)]
    pub max_usage: u32,

    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    #[arg(long, default_value = "table")]
    pub format: String,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl Args {
    pub fn into_config(self) -> Result<Config> {
        let profile = parse_profile_url(&self.url)?;
        let reference = parse_reference(&self.reference)?;

        let format = match self.format.as_str() {
            "table" => OutputFormat::Table,
            "json" => OutputFormat::Json,
            _ => return Err(anyhow!("Invalid output format")),
        };

        if self.timeout_secs == 0 {
            return Err(anyhow!("Timeout must be at least one second"));
        }

        Ok(Config {
            profile,
            profile_pic_url: self.profile_pic_url.filter(|u| !u.is_empty()),
            user_id: self.user_id,
            reference,
            rapidapi_key: self.rapidapi_key.filter(|k| !k.is_empty()),
            rapidapi_host: self.rapidapi_host,
            tiktok_host: self.tiktok_host.trim_end_matches('/').to_string(),
            tiktok_key: self.tiktok_key.filter(|k| !k.is_empty()),
            state_dir: self.state_dir,
            max_usage: self.max_usage,
            timeout_secs: self.timeout_secs,
            format,
            output: self.output,
        })
    }
}

/// Resolve the platform and username from a profile page URL.
///
/// `https://www.tiktok.com/@name` and `https://www.instagram.com/name/` both
/// carry the username in the fourth `/`-separated segment.
pub fn parse_profile_url(url: &str) -> Result<ProfileHandle> {
    let parts: Vec<&str> = url.split('/').collect();
    if parts.len() < 4 {
        return Err(anyhow!("Invalid profile URL: {}", url));
    }

    let segment = parts[3].trim();
    let (platform, username) = if url.contains("tiktok.com") {
        (Platform::TikTok, segment.strip_prefix('@').unwrap_or(segment))
    } else {
        (Platform::Instagram, segment)
    };

    // Drop any query string left on the last segment
    let username = username.split(['?', '#']).next().unwrap_or_default();
    if username.is_empty() {
        return Err(anyhow!("Invalid profile URL: {}", url));
    }

    Ok(ProfileHandle {
        platform,
        username: username.to_string(),
        url: url.to_string(),
    })
}

pub fn parse_reference(s: &str) -> Result<DateTime<FixedOffset>> {
    let now = Local::now().fixed_offset();

    match s {
        "now" | "today" => Ok(now),
        "yesterday" => Ok(now - Duration::days(1)),
        _ => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt);
            }
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| anyhow!("Invalid reference time {}: {}", s, e))?;
            let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
            Local
                .from_local_datetime(&noon)
                .earliest()
                .map(|dt| dt.fixed_offset())
                .ok_or_else(|| anyhow!("Reference time {} does not exist locally", s))
        }
    }
}
