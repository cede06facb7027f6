use crate::context::QueryContext;
use crate::sources::{lookup, lookup_str, FetchError, HttpClient, ProfileReport, ProfileSource};
use crate::types::{count_from_value, CreatorStats, Platform, ProfileData};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

const HISTORICAL_PERFORMANCE: [&str; 4] = [
    "shadow_ban_risk_assessment",
    "result",
    "detailed_metrics",
    "historical_performance",
];

pub struct TikTokSource {
    http: HttpClient,
    host: String,
    api_key: String,
}

impl TikTokSource {
    pub fn new(http: HttpClient, host: String, api_key: String) -> Self {
        Self { http, host, api_key }
    }

    fn request_url(&self, username: &str, kind: Option<&str>) -> String {
        match kind {
            Some(kind) => format!(
                "{}/?key={}&username={}&type={}",
                self.host, self.api_key, username, kind
            ),
            None => format!("{}/?key={}&username={}", self.host, self.api_key, username),
        }
    }

    async fn get(&self, username: &str, kind: Option<&str>) -> Result<Value, FetchError> {
        let endpoint = match kind {
            Some(kind) => format!("tiktok:{}", kind),
            None => "tiktok:profile".to_string(),
        };
        self.http
            .get_json(&endpoint, self.request_url(username, kind), Vec::new())
            .await
    }
}

#[async_trait]
impl ProfileSource for TikTokSource {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    async fn fetch_report(&self, ctx: &QueryContext, username: &str) -> ProfileReport {
        // The contact and full-data lookups are slow; start them alongside the profile
        let (profile_body, email_body, full_body) = tokio::join!(
            self.get(username, None),
            self.get(username, Some("domain")),
            self.get(username, Some("full"))
        );

        let parsed = profile_body.and_then(|body| {
            let bio = lookup_str(&body, &["profile", "About"]).map(str::to_string);
            parse_profile(&body, username, ctx.profile_pic_url.as_deref()).map(|p| (p, bio))
        });

        let (profile, bio) = match parsed {
            Ok((profile, bio)) => {
                info!("Fetched TikTok profile {}", profile.username);
                (profile, bio)
            }
            Err(e) => {
                error!("Error fetching TikTok profile: {}", e);
                return ProfileReport::new(Platform::TikTok, Err(e));
            }
        };

        let email_body = email_body
            .map_err(|e| warn!("TikTok email fetch error: {}", e))
            .ok();
        let email = resolve_email(email_body.as_ref(), bio.as_deref());
        debug!("Final TikTok email: {}", email);

        let creator_stats = full_body.and_then(|body| parse_creator_stats(&body));
        if let Err(e) = &creator_stats {
            warn!("TikTok stats unavailable: {}", e);
        }

        let mut report = ProfileReport::new(Platform::TikTok, Ok(profile));
        report.contact_email = Some(Ok(email));
        report.creator_stats = Some(creator_stats);
        report
    }
}

pub fn parse_profile(body: &Value, username: &str, direct_pic_url: Option<&str>) -> Result<ProfileData, FetchError> {
    let (Some(profile), Some(stats)) = (lookup(body, &["profile"]), lookup(body, &["stats"])) else {
        return Err(FetchError::InvalidResponse(
            "invalid TikTok API response structure".to_string(),
        ));
    };

    let followers = lookup(stats, &["Followers"])
        .or_else(|| lookup(stats, &["followers"]))
        .map(count_from_value)
        .unwrap_or(0);

    let unique_id = lookup_str(profile, &["Username"])
        .map(|name| name.strip_prefix('@').unwrap_or(name))
        .unwrap_or(username)
        .to_string();

    let profile_pic_url = direct_pic_url
        .filter(|url| !url.is_empty())
        .or_else(|| lookup_str(profile, &["Avatar URL"]))
        .map(str::to_string);

    Ok(ProfileData {
        email: "Loading...".to_string(),
        followers_count: Some(followers),
        location: lookup_str(profile, &["Country"]).unwrap_or("N/A").to_string(),
        profile_pic_url,
        profile_url: format!("https://www.tiktok.com/@{}", unique_id),
        username: unique_id,
        engagement_rate: None,
    })
}

/// Contact email from the lookup response, else the first address in the bio, else "N/A".
pub fn resolve_email(body: Option<&Value>, bio: Option<&str>) -> String {
    body.and_then(|b| lookup_str(b, &["email"]).or_else(|| lookup_str(b, &["data", "email"])))
        .map(str::to_string)
        .or_else(|| bio.and_then(email_from_bio))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn email_from_bio(bio: &str) -> Option<String> {
    let re = Regex::new(EMAIL_PATTERN).ok()?;
    re.find(bio).map(|m| m.as_str().to_string())
}

pub fn parse_creator_stats(body: &Value) -> Result<CreatorStats, FetchError> {
    let Some(perf) = lookup(body, &HISTORICAL_PERFORMANCE) else {
        return Err(FetchError::Unavailable("Stats unavailable".to_string()));
    };

    let metric = |key: &str| lookup(perf, &[key]).and_then(number_from_value);

    Ok(CreatorStats {
        average_likes: metric("avg_likes"),
        average_comments: metric("avg_comments"),
        average_views: metric("avg_views"),
        engagement_rate: metric("engagement_rate"),
    })
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').replace(',', "").parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_profile() {
        let body = json!({
            "profile": {
                "Username": "@dancer",
                "Country": "Brazil",
                "Avatar URL": "https://cdn.example/avatar.jpg",
                "About": "booking: team@dancer.io"
            },
            "stats": {"Followers": "1,250,000"}
        });

        let profile = parse_profile(&body, "fallback", None).unwrap();
        assert_eq!(profile.username, "dancer");
        assert_eq!(profile.followers_count, Some(1_250_000));
        assert_eq!(profile.location, "Brazil");
        assert_eq!(profile.email, "Loading...");
        assert_eq!(profile.profile_url, "https://www.tiktok.com/@dancer");
        assert_eq!(profile.profile_pic_url.as_deref(), Some("https://cdn.example/avatar.jpg"));
    }

    #[test]
    fn test_parse_profile_requires_stats() {
        let body = json!({"profile": {"Username": "dancer"}});
        assert!(parse_profile(&body, "dancer", None).is_err());
    }

    #[test]
    fn test_resolve_email_order() {
        let direct = json!({"email": "a@b.com"});
        let nested = json!({"data": {"email": "c@d.org"}});
        let bio = Some("DM or mail hello@studio.co.uk for collabs");

        assert_eq!(resolve_email(Some(&direct), bio), "a@b.com");
        assert_eq!(resolve_email(Some(&nested), bio), "c@d.org");
        assert_eq!(resolve_email(Some(&json!({})), bio), "hello@studio.co.uk");
        assert_eq!(resolve_email(None, Some("no contact here")), "N/A");
    }

    #[test]
    fn test_parse_creator_stats() {
        let body = json!({
            "shadow_ban_risk_assessment": {"result": {"detailed_metrics": {"historical_performance": {
                "avg_likes": 1520.5,
                "avg_comments": "42",
                "avg_views": 30100,
                "engagement_rate": "5.2%"
            }}}}
        });

        let stats = parse_creator_stats(&body).unwrap();
        assert_eq!(stats.average_likes, Some(1520.5));
        assert_eq!(stats.average_comments, Some(42.0));
        assert_eq!(stats.average_views, Some(30100.0));
        assert_eq!(stats.engagement_rate, Some(5.2));
    }

    #[test]
    fn test_parse_creator_stats_missing_block() {
        let err = parse_creator_stats(&json!({"shadow_ban_risk_assessment": {}})).unwrap_err();
        assert_eq!(err, FetchError::Unavailable("Stats unavailable".to_string()));
    }
}
