use crate::context::QueryContext;
use crate::output::SidebarMessage;
use crate::sources::create_source;
use crate::types::Config;
use crate::usage::{UsageDecision, UsageTracker};
use anyhow::Result;
use tracing::{info_span, warn, Instrument};

/// Run one profile lookup and collect the sidebar messages it produces.
///
/// The source is resolved before a credit is spent, so a missing API key
/// fails without touching the usage ledger.
pub async fn run_query(config: &Config, tracker: &UsageTracker) -> Result<Vec<SidebarMessage>> {
    let source = create_source(config.profile.platform, config)?;
    let ctx = QueryContext::from_config(config);

    let span = info_span!(
        "lookup",
        user = ctx.user_id.as_deref().unwrap_or("-"),
        platform = %config.profile.platform,
        profile = %config.profile.username,
    );

    async move {
        let mut messages = Vec::new();
        match tracker.consume_now()? {
            UsageDecision::LimitReached => {
                warn!("Monthly usage limit of {} reached", config.max_usage);
                messages.push(SidebarMessage::usage_limit_reached());
            }
            UsageDecision::Granted { remaining } => {
                messages.push(SidebarMessage::RemainingCredits { remaining });
                let report = source.fetch_report(&ctx, &config.profile.username).await;
                messages.extend(report.into_messages());
            }
        }
        Ok(messages)
    }
    .instrument(span)
    .await
}
