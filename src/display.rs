use crate::output::SidebarMessage;

const WIDTH: usize = 60;

/// Compact follower count: 950, 12.3K, 4.5M
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000_000 {
        format!("{:.1}B", count as f64 / 1_000_000_000.0)
    } else if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.2}%", rate),
        None => "N/A".to_string(),
    }
}

fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format_count(v.max(0.0).round() as u64),
        None => "N/A".to_string(),
    }
}

/// Render messages as the rows the sidebar would show
pub fn profile_rows(messages: &[SidebarMessage]) -> Vec<(String, String)> {
    let mut rows = Vec::new();

    for message in messages {
        match message {
            SidebarMessage::ProfileData { data } => {
                rows.push(("Username".to_string(), format!("@{}", data.username)));
                rows.push((
                    "Followers".to_string(),
                    data.followers_count.map(format_count).unwrap_or_else(|| "N/A".to_string()),
                ));
                rows.push(("Location".to_string(), data.location.clone()));
                rows.push(("Email".to_string(), data.email.clone()));
                if data.engagement_rate.is_some() {
                    rows.push(("Engagement rate".to_string(), format_rate(data.engagement_rate)));
                }
                rows.push(("Profile".to_string(), data.profile_url.clone()));
            }
            SidebarMessage::PostStatsData { data } => {
                rows.push(("Likes (last posts)".to_string(), format_count(data.total_likes)));
                rows.push(("Comments (last posts)".to_string(), format_count(data.total_comments)));
            }
            SidebarMessage::ReelsStatsData { data } => {
                rows.push(("Average plays".to_string(), data.average_plays.clone()));
            }
            SidebarMessage::TiktokEmailData { data } => {
                rows.push(("Email".to_string(), data.email.clone()));
            }
            SidebarMessage::TiktokStatsData { data } => {
                rows.push(("Average views".to_string(), format_optional(data.average_views)));
                rows.push(("Average likes".to_string(), format_optional(data.average_likes)));
                rows.push(("Average comments".to_string(), format_optional(data.average_comments)));
                rows.push(("Engagement rate".to_string(), format_rate(data.engagement_rate)));
            }
            SidebarMessage::RemainingCredits { remaining } => {
                rows.push(("Credits left".to_string(), remaining.to_string()));
            }
            SidebarMessage::ProfileDataError { error }
            | SidebarMessage::PostStatsError { error }
            | SidebarMessage::ReelsStatsError { error }
            | SidebarMessage::TiktokStatsError { error }
            | SidebarMessage::UsageLimitReached { error, .. } => {
                rows.push(("Error".to_string(), error.clone()));
            }
        }
    }

    rows
}

/// Print the profile panel to stdout
pub fn display_profile_table(messages: &[SidebarMessage]) {
    if messages.is_empty() {
        println!("No data to display");
        return;
    }

    println!("\n{}", "=".repeat(WIDTH));
    println!("{:^width$}", "PROFILE INSIGHTS", width = WIDTH);
    println!("{}", "=".repeat(WIDTH));

    for (label, value) in profile_rows(messages) {
        println!("{:<24} {}", label, value);
    }

    println!("{}", "=".repeat(WIDTH));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ReelsStatsPayload;
    use crate::types::ProfileData;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(950), "950");
        assert_eq!(format_count(12_300), "12.3K");
        assert_eq!(format_count(4_500_000), "4.5M");
        assert_eq!(format_count(2_000_000_000), "2.0B");
    }

    #[test]
    fn test_profile_rows() {
        let messages = vec![
            SidebarMessage::ProfileData {
                data: ProfileData {
                    username: "natgeo".to_string(),
                    followers_count: Some(280_000_000),
                    engagement_rate: Some(0.0456),
                    ..Default::default()
                },
            },
            SidebarMessage::ReelsStatsData {
                data: ReelsStatsPayload {
                    average_plays: "1520".to_string(),
                },
            },
            SidebarMessage::PostStatsError {
                error: "Failed to fetch post stats.".to_string(),
            },
        ];

        let rows = profile_rows(&messages);
        assert_eq!(rows[0], ("Username".to_string(), "@natgeo".to_string()));
        assert_eq!(rows[1].1, "280.0M");
        assert!(rows.contains(&("Engagement rate".to_string(), "0.05%".to_string())));
        assert!(rows.contains(&("Average plays".to_string(), "1520".to_string())));
        assert_eq!(rows.last().unwrap().1, "Failed to fetch post stats.");
    }
}
