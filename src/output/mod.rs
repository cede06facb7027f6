use crate::sources::{FetchError, ProfileReport};
use crate::types::{CreatorStats, Platform, PostStats, ProfileData, ReelsStats};
use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStatsPayload {
    pub total_likes: u64,
    pub total_comments: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelsStatsPayload {
    pub average_plays: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailPayload {
    pub email: String,
}

/// Messages consumed by the sidebar, tagged by their `message` name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum SidebarMessage {
    ProfileData { data: ProfileData },
    ProfileDataError { error: String },
    PostStatsData { data: PostStatsPayload },
    PostStatsError { error: String },
    ReelsStatsData { data: ReelsStatsPayload },
    ReelsStatsError { error: String },
    TiktokEmailData { data: EmailPayload },
    TiktokStatsData { data: CreatorStats },
    TiktokStatsError { error: String },
    UsageLimitReached { error: String, remaining: u32 },
    RemainingCredits { remaining: u32 },
}

impl SidebarMessage {
    pub fn usage_limit_reached() -> Self {
        SidebarMessage::UsageLimitReached {
            error: "You have reached your monthly usage limit.".to_string(),
            remaining: 0,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SidebarMessage::ProfileDataError { .. }
                | SidebarMessage::PostStatsError { .. }
                | SidebarMessage::ReelsStatsError { .. }
                | SidebarMessage::TiktokStatsError { .. }
                | SidebarMessage::UsageLimitReached { .. }
        )
    }
}

impl From<&PostStats> for PostStatsPayload {
    fn from(stats: &PostStats) -> Self {
        Self {
            total_likes: stats.total_likes,
            total_comments: stats.total_comments,
        }
    }
}

impl From<&ReelsStats> for ReelsStatsPayload {
    fn from(stats: &ReelsStats) -> Self {
        Self {
            average_plays: stats.average_plays.clone(),
        }
    }
}

impl ProfileReport {
    /// Translate the report into sidebar messages, profile first.
    ///
    /// Failures become the fixed user-facing error text; the detailed cause
    /// has already been logged by the source.
    pub fn into_messages(self) -> Vec<SidebarMessage> {
        let mut messages = Vec::new();

        messages.push(match self.profile {
            Ok(data) => SidebarMessage::ProfileData { data },
            Err(_) => SidebarMessage::ProfileDataError {
                error: match self.platform {
                    Platform::Instagram => "Failed to fetch profile data.",
                    Platform::TikTok => "Failed to fetch TikTok data.",
                }
                .to_string(),
            },
        });

        if let Some(post_stats) = self.post_stats {
            messages.push(match post_stats {
                Ok(stats) => SidebarMessage::PostStatsData { data: (&stats).into() },
                Err(_) => SidebarMessage::PostStatsError {
                    error: "Failed to fetch post stats.".to_string(),
                },
            });
        }

        if let Some(reels_stats) = self.reels_stats {
            messages.push(match reels_stats {
                Ok(stats) => SidebarMessage::ReelsStatsData { data: (&stats).into() },
                Err(_) => SidebarMessage::ReelsStatsError {
                    error: "Failed to fetch reels stats.".to_string(),
                },
            });
        }

        match self.contact_email {
            Some(Ok(email)) => messages.push(SidebarMessage::TiktokEmailData {
                data: EmailPayload { email },
            }),
            Some(Err(e)) => warn!("Dropping contact email section: {}", e),
            None => {}
        }

        if let Some(creator_stats) = self.creator_stats {
            messages.push(match creator_stats {
                Ok(data) => SidebarMessage::TiktokStatsData { data },
                Err(FetchError::Unavailable(reason)) => SidebarMessage::TiktokStatsError { error: reason },
                Err(_) => SidebarMessage::TiktokStatsError {
                    error: "Failed to fetch engagement stats.".to_string(),
                },
            });
        }

        messages
    }
}

/// Writes sidebar messages as JSON lines
pub struct OutputWriter {
    path: Option<PathBuf>,
}

impl OutputWriter {
    /// `None` writes to stdout
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn write_messages(&self, messages: &[SidebarMessage]) -> Result<()> {
        match &self.path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let mut writer = BufWriter::new(File::create(path)?);
                Self::write_lines(&mut writer, messages)?;
                writer.flush()?;
            }
            None => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                Self::write_lines(&mut lock, messages)?;
                lock.flush()?;
            }
        }
        Ok(())
    }

    pub fn write_lines<W: Write>(writer: &mut W, messages: &[SidebarMessage]) -> Result<()> {
        for message in messages {
            serde_json::to_writer(&mut *writer, message)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AggregationResult;
    use serde_json::json;

    #[test]
    fn test_message_shapes() {
        let post = SidebarMessage::PostStatsData {
            data: PostStatsPayload {
                total_likes: 120,
                total_comments: 7,
            },
        };
        assert_eq!(
            serde_json::to_value(&post).unwrap(),
            json!({"message": "post_stats_data", "data": {"totalLikes": 120, "totalComments": 7}})
        );

        assert_eq!(
            serde_json::to_value(SidebarMessage::usage_limit_reached()).unwrap(),
            json!({
                "message": "usage_limit_reached",
                "error": "You have reached your monthly usage limit.",
                "remaining": 0
            })
        );

        assert_eq!(
            serde_json::to_value(SidebarMessage::RemainingCredits { remaining: 999 }).unwrap(),
            json!({"message": "remaining_credits", "remaining": 999})
        );
    }

    #[test]
    fn test_instagram_report_messages() {
        let mut report = ProfileReport::new(
            Platform::Instagram,
            Err(FetchError::Transport("timed out".to_string())),
        );
        report.post_stats = Some(Err(FetchError::InvalidResponse("bad".to_string())));
        report.reels_stats = Some(Ok(ReelsStats {
            average_plays: "0".to_string(),
            plays: AggregationResult::default(),
        }));

        let messages = report.into_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0],
            SidebarMessage::ProfileDataError {
                error: "Failed to fetch profile data.".to_string()
            }
        );
        assert!(messages[1].is_error());
        assert_eq!(
            serde_json::to_value(&messages[2]).unwrap(),
            json!({"message": "reels_stats_data", "data": {"averagePlays": "0"}})
        );
    }

    #[test]
    fn test_tiktok_stats_error_text() {
        let mut report = ProfileReport::new(Platform::TikTok, Ok(ProfileData::default()));
        report.contact_email = Some(Ok("N/A".to_string()));
        report.creator_stats = Some(Err(FetchError::Unavailable("Stats unavailable".to_string())));

        let messages = report.into_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[2],
            SidebarMessage::TiktokStatsError {
                error: "Stats unavailable".to_string()
            }
        );

        let mut report = ProfileReport::new(Platform::TikTok, Ok(ProfileData::default()));
        report.creator_stats = Some(Err(FetchError::Http {
            endpoint: "tiktok:full".to_string(),
            status: 500,
        }));
        assert_eq!(
            report.into_messages()[1],
            SidebarMessage::TiktokStatsError {
                error: "Failed to fetch engagement stats.".to_string()
            }
        );
    }

    #[test]
    fn test_write_lines() {
        let mut buffer = Vec::new();
        let messages = vec![
            SidebarMessage::RemainingCredits { remaining: 3 },
            SidebarMessage::TiktokEmailData {
                data: EmailPayload {
                    email: "a@b.com".to_string(),
                },
            },
        ];
        OutputWriter::write_lines(&mut buffer, &messages).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"message":"remaining_credits","remaining":3}"#);
        assert!(lines[1].contains("\"email\":\"a@b.com\""));
    }
}
