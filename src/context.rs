use crate::aggregation::DayCutoff;
use crate::types::{Config, ContentCategory};
use chrono::{DateTime, FixedOffset};

/// Per-query identity and clock, handed to every source call
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub user_id: Option<String>,
    pub profile_pic_url: Option<String>,
    pub reference: DateTime<FixedOffset>,
}

impl QueryContext {
    pub fn new(reference: DateTime<FixedOffset>) -> Self {
        Self {
            user_id: None,
            profile_pic_url: None,
            reference,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            user_id: config.user_id.clone(),
            profile_pic_url: config.profile_pic_url.clone(),
            reference: config.reference,
        }
    }

    pub fn cutoff(&self, category: ContentCategory) -> DayCutoff {
        DayCutoff::for_category(self.reference, category)
    }
}
