pub mod aggregation;
pub mod cli;
pub mod context;
pub mod display;
pub mod output;
pub mod query;
pub mod sources;
pub mod types;
pub mod usage;

// Re-exports for library users
pub use aggregation::{
    engagement_rate, is_eligible, remove_outliers_iqr, summarize, summarize_posts, summarize_reels,
    DayCutoff, EngagementAggregator,
};
pub use context::QueryContext;
pub use display::display_profile_table;
pub use output::{OutputWriter, SidebarMessage};
pub use query::run_query;
pub use sources::{create_source, FetchError, ProfileReport, ProfileSource};
pub use types::{
    AggregationResult, Config, ContentCategory, ContentItem, MediaItem, Platform, PostStats,
    ProfileData, ReelsStats, POST_SAMPLE_SIZE,
};
pub use usage::{UsageDecision, UsageTracker};
