use chrono::Local;
use profile_stats::aggregation::{is_eligible, summarize_posts, DayCutoff, EngagementAggregator};
use profile_stats::sources::instagram::parse_feed;
use profile_stats::types::{ContentCategory, ContentItem};
use std::env;
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <response.json> [posts|reels] [offset-days]", args[0]);
        std::process::exit(1);
    }

    let filepath = &args[1];
    let category: ContentCategory = match args.get(2) {
        Some(s) => s.parse()?,
        None => ContentCategory::Reels,
    };
    let offset_days = match args.get(3) {
        Some(s) => s.parse()?,
        None => category.cutoff_days(),
    };

    println!("\n{}", "=".repeat(72));
    println!("Inspecting: {} ({}, cutoff offset {})", filepath, category, offset_days);
    println!("{}", "=".repeat(72));

    let body: serde_json::Value = serde_json::from_slice(&fs::read(filepath)?)?;
    let feed = parse_feed(&body, category)?;
    println!("Feed entries: {}", feed.len());

    if feed.is_empty() {
        println!("No data found!");
        return Ok(());
    }

    let cutoff = DayCutoff::new(Local::now().fixed_offset(), offset_days);
    let aggregator = EngagementAggregator::new(cutoff);
    let items: Vec<ContentItem> = feed
        .iter()
        .map(|m| m.to_content_item(category.primary_metric()))
        .collect();
    let eligible = items
        .iter()
        .filter(|item| is_eligible(category, &cutoff, item))
        .count();

    println!("\n{:<22} {:>14} {:>8} {:>10}", "Taken at", "Count", "Pinned", "Eligible");
    println!("{}", "-".repeat(72));
    for item in &items {
        let taken = match item.taken_at {
            Some(ts) => chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.with_timezone(cutoff.reference.offset()).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "invalid".to_string()),
            None => "undated".to_string(),
        };
        println!(
            "{:<22} {:>14} {:>8} {:>10}",
            taken,
            item.engagement_count,
            item.is_pinned,
            is_eligible(category, &cutoff, item)
        );
    }

    println!("{}", "=".repeat(72));
    match cutoff.boundary() {
        Some(boundary) => println!("Cutoff boundary: {}", boundary),
        None => println!("Cutoff boundary: before the earliest representable date"),
    }
    println!("Eligible: {}", eligible);
    match category {
        ContentCategory::Reels => {
            let result = aggregator.aggregate(&items);
            println!("Retained after IQR: {}", result.item_count);
            println!("Total plays: {}", result.total_count);
            println!("Average plays: {:.2} (displayed {})", result.average_count, result.average_display());
        }
        ContentCategory::Posts => {
            let stats = summarize_posts(&cutoff, &feed);
            println!("Sampled posts: {}", stats.sample_size);
            println!("Total likes: {}", stats.total_likes);
            println!("Total comments: {}", stats.total_comments);
        }
    }
    println!("{}", "=".repeat(72));

    Ok(())
}
