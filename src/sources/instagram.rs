use crate::aggregation::{engagement_rate, summarize_posts, summarize_reels};
use crate::context::QueryContext;
use crate::sources::{lookup, lookup_str, FetchError, HttpClient, ProfileReport, ProfileSource};
use crate::types::{
    count_from_value, ContentCategory, MediaItem, Platform, PostStats, ProfileData, ReelsStats,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

pub struct InstagramSource {
    http: HttpClient,
    host: String,
    base_url: String,
    api_key: String,
}

impl InstagramSource {
    pub fn new(http: HttpClient, host: String, api_key: String) -> Self {
        let base_url = format!("https://{}", host);
        Self {
            http,
            host,
            base_url,
            api_key,
        }
    }

    /// Send requests to `base_url` while still presenting `host` in the RapidAPI header
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint_url(&self, endpoint: &str, username: &str) -> String {
        format!(
            "{}{}?username_or_id_or_url={}",
            self.base_url, endpoint, username
        )
    }

    async fn get(&self, endpoint: &str, username: &str) -> Result<Value, FetchError> {
        let headers = vec![
            ("x-rapidapi-key", self.api_key.clone()),
            ("x-rapidapi-host", self.host.clone()),
        ];
        self.http
            .get_json(endpoint, self.endpoint_url(endpoint, username), headers)
            .await
    }

    async fn fetch_profile(&self, ctx: &QueryContext, username: &str) -> Result<ProfileData, FetchError> {
        let (info, about) = tokio::join!(
            self.get("/v1/info", username),
            self.get("/v1/info_about", username)
        );
        let profile = parse_profile(&info?, &about?, ctx.profile_pic_url.as_deref())?;
        info!("Fetched Instagram profile {}", profile.username);
        Ok(profile)
    }

    async fn fetch_feed(&self, category: ContentCategory, username: &str) -> Result<Vec<MediaItem>, FetchError> {
        let endpoint = match category {
            ContentCategory::Posts => "/v1/posts",
            ContentCategory::Reels => "/v1/reels",
        };
        let body = self.get(endpoint, username).await?;
        parse_feed(&body, category)
    }

    async fn fetch_post_stats(&self, ctx: &QueryContext, username: &str) -> Result<PostStats, FetchError> {
        let posts = self.fetch_feed(ContentCategory::Posts, username).await?;
        Ok(summarize_posts(&ctx.cutoff(ContentCategory::Posts), &posts))
    }

    async fn fetch_reels_stats(&self, ctx: &QueryContext, username: &str) -> Result<ReelsStats, FetchError> {
        let reels = self.fetch_feed(ContentCategory::Reels, username).await?;
        Ok(summarize_reels(&ctx.cutoff(ContentCategory::Reels), &reels))
    }
}

#[async_trait]
impl ProfileSource for InstagramSource {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn fetch_report(&self, ctx: &QueryContext, username: &str) -> ProfileReport {
        let (profile, post_stats, reels_stats) = tokio::join!(
            self.fetch_profile(ctx, username),
            self.fetch_post_stats(ctx, username),
            self.fetch_reels_stats(ctx, username)
        );

        if let Err(e) = &profile {
            error!("Error fetching profile data: {}", e);
        }
        if let Err(e) = &post_stats {
            error!("Error fetching post stats: {}", e);
        }
        if let Err(e) = &reels_stats {
            error!("Error fetching reels stats: {}", e);
        }

        let profile = profile.map(|mut data| {
            if let (Some(followers), Ok(stats)) = (data.followers_count, &post_stats) {
                data.engagement_rate = engagement_rate(stats, followers);
            }
            data
        });

        let mut report = ProfileReport::new(Platform::Instagram, profile);
        report.post_stats = Some(post_stats);
        report.reels_stats = Some(reels_stats);
        report
    }
}

/// Build the sidebar profile from the `/v1/info` and `/v1/info_about` bodies.
pub fn parse_profile(info: &Value, about: &Value, direct_pic_url: Option<&str>) -> Result<ProfileData, FetchError> {
    let Some(data) = lookup(info, &["data"]) else {
        return Err(FetchError::InvalidResponse("missing data in /v1/info response".to_string()));
    };

    let username = lookup_str(data, &["username"]).unwrap_or_default().replace('#', "");

    let location = lookup_str(about, &["data", "country"])
        .or_else(|| lookup_str(data, &["about", "country"]))
        .unwrap_or("N/A")
        .to_string();

    let email = lookup_str(data, &["public_email"])
        .unwrap_or("email not available")
        .to_string();

    let followers_count = lookup(data, &["follower_count"])
        .map(count_from_value)
        .filter(|&count| count > 0);

    let profile_pic_url = direct_pic_url
        .filter(|url| !url.is_empty())
        .or_else(|| lookup_str(data, &["profile_pic_url_hd"]))
        .or_else(|| lookup_str(data, &["hd_profile_pic_url_info", "url"]))
        .or_else(|| lookup_str(data, &["profile_pic_url"]))
        .map(str::to_string);

    let profile_url = lookup_str(data, &["profile_page_url"])
        .map(str::to_string)
        .unwrap_or_else(|| format!("https://www.instagram.com/{}/", username));

    Ok(ProfileData {
        username,
        email,
        followers_count,
        location,
        profile_pic_url,
        profile_url,
        engagement_rate: None,
    })
}

/// Decode `data.items` from a posts or reels response.
///
/// Entries that are not objects are skipped rather than failing the whole feed.
pub fn parse_feed(body: &Value, category: ContentCategory) -> Result<Vec<MediaItem>, FetchError> {
    let Some(items) = lookup(body, &["data", "items"]).and_then(Value::as_array) else {
        return Err(FetchError::InvalidResponse(format!(
            "invalid data in {} API response",
            category
        )));
    };

    let mut feed = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<MediaItem>(item.clone()) {
            Ok(media) => feed.push(media),
            Err(e) => warn!("Skipping malformed {} entry: {}", category, e),
        }
    }
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_profile_fallbacks() {
        let info = json!({
            "data": {
                "username": "#travel",
                "follower_count": 52000,
                "hd_profile_pic_url_info": {"url": "https://cdn.example/hd.jpg"},
                "profile_pic_url": "https://cdn.example/sd.jpg",
                "about": {"country": "Portugal"}
            }
        });
        let about = json!({"data": {}});

        let profile = parse_profile(&info, &about, None).unwrap();
        assert_eq!(profile.username, "travel");
        assert_eq!(profile.email, "email not available");
        assert_eq!(profile.followers_count, Some(52000));
        assert_eq!(profile.location, "Portugal");
        assert_eq!(profile.profile_pic_url.as_deref(), Some("https://cdn.example/hd.jpg"));
        assert_eq!(profile.profile_url, "https://www.instagram.com/travel/");
    }

    #[test]
    fn test_parse_profile_prefers_direct_picture_and_about_country() {
        let info = json!({
            "data": {
                "username": "natgeo",
                "public_email": "press@natgeo.com",
                "profile_pic_url_hd": "https://cdn.example/hd.jpg",
                "profile_page_url": "https://www.instagram.com/natgeo",
                "about": {"country": "Portugal"}
            }
        });
        let about = json!({"data": {"country": "United States"}});

        let profile = parse_profile(&info, &about, Some("https://page.example/pic.jpg")).unwrap();
        assert_eq!(profile.location, "United States");
        assert_eq!(profile.email, "press@natgeo.com");
        assert_eq!(profile.followers_count, None);
        assert_eq!(profile.profile_pic_url.as_deref(), Some("https://page.example/pic.jpg"));
        assert_eq!(profile.profile_url, "https://www.instagram.com/natgeo");
    }

    #[test]
    fn test_parse_profile_without_data() {
        let err = parse_profile(&json!({"status": "fail"}), &json!({}), None).unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_feed() {
        let body = json!({
            "data": {
                "items": [
                    {"taken_at": 1700000000, "play_count": 1200, "is_pinned": true},
                    {"taken_at": 1690000000, "like_count": 88, "comment_count": 4},
                    "not an object"
                ]
            }
        });

        let feed = parse_feed(&body, ContentCategory::Reels).unwrap();
        assert_eq!(feed.len(), 2);
        assert!(feed[0].is_pinned);
        assert_eq!(feed[0].play_count, 1200);
        assert_eq!(feed[1].like_count, 88);
    }

    #[test]
    fn test_parse_feed_missing_items() {
        let err = parse_feed(&json!({"data": {"items": null}}), ContentCategory::Posts).unwrap_err();
        assert_eq!(
            err,
            FetchError::InvalidResponse("invalid data in posts API response".to_string())
        );
    }
}
