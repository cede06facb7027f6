use crate::types::{
    AggregationResult, ContentCategory, ContentItem, EngagementMetric, MediaItem, PostStats,
    ReelsStats, POST_SAMPLE_SIZE,
};
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use tracing::debug;

/// Minimum sample size for quartile estimation
pub const MIN_IQR_SAMPLE: usize = 4;

const IQR_FENCE: f64 = 1.5;

/// Day-granularity cutoff: items published on or after the boundary date are dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayCutoff {
    pub reference: DateTime<FixedOffset>,
    pub offset_days: u32,
}

impl DayCutoff {
    pub fn new(reference: DateTime<FixedOffset>, offset_days: u32) -> Self {
        Self {
            reference,
            offset_days,
        }
    }

    pub fn for_category(reference: DateTime<FixedOffset>, category: ContentCategory) -> Self {
        Self::new(reference, category.cutoff_days())
    }

    /// First excluded date, in the reference's offset.
    ///
    /// `None` when the offset reaches past the earliest representable date, in which
    /// case nothing is old enough to be admitted.
    pub fn boundary(&self) -> Option<NaiveDate> {
        self.reference
            .date_naive()
            .checked_sub_days(Days::new(u64::from(self.offset_days)))
    }

    pub fn admits(&self, taken_at: i64) -> bool {
        let Some(boundary) = self.boundary() else {
            return false;
        };
        match DateTime::from_timestamp(taken_at, 0) {
            Some(utc) => utc.with_timezone(self.reference.offset()).date_naive() < boundary,
            None => false,
        }
    }

    /// Undated items are never admitted
    pub fn admits_taken_at(&self, taken_at: Option<i64>) -> bool {
        taken_at.is_some_and(|ts| self.admits(ts))
    }
}

pub struct EngagementAggregator {
    cutoff: DayCutoff,
}

impl EngagementAggregator {
    pub fn new(cutoff: DayCutoff) -> Self {
        Self { cutoff }
    }

    pub fn cutoff(&self) -> &DayCutoff {
        &self.cutoff
    }

    /// Drop items dated on or after the cutoff and pinned items, keeping feed order.
    pub fn retain_eligible(&self, items: &[ContentItem]) -> Vec<ContentItem> {
        items
            .iter()
            .filter(|item| is_eligible(ContentCategory::Reels, &self.cutoff, item))
            .copied()
            .collect()
    }

    pub fn aggregate(&self, items: &[ContentItem]) -> AggregationResult {
        let eligible = self.retain_eligible(items);
        let retained = remove_outliers_iqr(&eligible);

        debug!(
            "Aggregated {} items: {} eligible before {:?}, {} after outlier removal",
            items.len(),
            eligible.len(),
            self.cutoff.boundary(),
            retained.len()
        );

        summarize(&retained)
    }
}

/// Whether `item` would enter `category`'s statistics. Post sampling keeps pinned
/// posts; the reels aggregator drops them.
pub fn is_eligible(category: ContentCategory, cutoff: &DayCutoff, item: &ContentItem) -> bool {
    match category {
        ContentCategory::Posts => cutoff.admits_taken_at(item.taken_at),
        ContentCategory::Reels => !item.is_pinned && cutoff.admits_taken_at(item.taken_at),
    }
}

/// Drop items outside [q1 - 1.5*iqr, q3 + 1.5*iqr].
///
/// Quartiles are read straight off the sorted counts at `n/4` and `3n/4`, with
/// no interpolation. Samples smaller than [`MIN_IQR_SAMPLE`] pass through untouched.
pub fn remove_outliers_iqr(items: &[ContentItem]) -> Vec<ContentItem> {
    if items.len() < MIN_IQR_SAMPLE {
        return items.to_vec();
    }

    let mut counts: Vec<u64> = items.iter().map(|item| item.engagement_count).collect();
    counts.sort_unstable();

    let n = counts.len();
    let q1 = counts[n / 4] as f64;
    let q3 = counts[n * 3 / 4] as f64;
    let iqr = q3 - q1;
    let lower_bound = q1 - IQR_FENCE * iqr;
    let upper_bound = q3 + IQR_FENCE * iqr;

    items
        .iter()
        .filter(|item| {
            let count = item.engagement_count as f64;
            count >= lower_bound && count <= upper_bound
        })
        .copied()
        .collect()
}

/// Totals saturate at `u64::MAX` instead of overflowing.
pub fn summarize(items: &[ContentItem]) -> AggregationResult {
    let total_count = saturating_total(items.iter().map(|item| item.engagement_count));
    let item_count = items.len();
    let average_count = if item_count > 0 {
        total_count as f64 / item_count as f64
    } else {
        0.0
    };

    AggregationResult {
        total_count,
        item_count,
        average_count,
    }
}

/// Likes and comments over the first [`POST_SAMPLE_SIZE`] posts older than the cutoff.
pub fn summarize_posts(cutoff: &DayCutoff, posts: &[MediaItem]) -> PostStats {
    let sample: Vec<&MediaItem> = posts
        .iter()
        .filter(|post| {
            let item = post.to_content_item(EngagementMetric::Likes);
            is_eligible(ContentCategory::Posts, cutoff, &item)
        })
        .take(POST_SAMPLE_SIZE)
        .collect();

    PostStats {
        total_likes: saturating_total(sample.iter().map(|post| post.like_count)),
        total_comments: saturating_total(sample.iter().map(|post| post.comment_count)),
        sample_size: sample.len(),
    }
}

fn saturating_total(counts: impl Iterator<Item = u64>) -> u64 {
    counts.fold(0u64, |acc, count| acc.saturating_add(count))
}

pub fn summarize_reels(cutoff: &DayCutoff, reels: &[MediaItem]) -> ReelsStats {
    let metric = ContentCategory::Reels.primary_metric();
    let items: Vec<ContentItem> = reels.iter().map(|reel| reel.to_content_item(metric)).collect();
    let plays = EngagementAggregator::new(*cutoff).aggregate(&items);

    ReelsStats {
        average_plays: plays.average_display(),
        plays,
    }
}

/// (average likes + average comments) per follower, as a percentage
pub fn engagement_rate(stats: &PostStats, followers: u64) -> Option<f64> {
    if followers == 0 || stats.sample_size == 0 {
        return None;
    }
    Some((stats.average_likes() + stats.average_comments()) / followers as f64 * 100.0)
}
