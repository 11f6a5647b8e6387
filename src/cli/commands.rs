use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::time::interval;

use crate::app::{AppContext, Result, ScorelineError};
use crate::domain::{normalize_group_name, ItemId};
use crate::roster::MarkerSource;
use crate::tracker::StatusReport;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn status(ctx: &AppContext, no_fetch: bool) -> Result<()> {
    let report = ctx.tracker.refresh(today(), !no_fetch).await?;
    print_report(&report);
    Ok(())
}

pub async fn refresh_item(ctx: &AppContext, id: &str) -> Result<()> {
    let id = ItemId::new(id);
    let meta = ctx.resolver.force_refresh(&id).await?;
    ctx.tracker.aggregator().invalidate_all();

    match meta.timestamp {
        Some(ts) => println!("{}: last submission {}", id, ts.format("%Y-%m-%d %H:%M:%S")),
        None => println!("{}: no submissions found", id),
    }
    Ok(())
}

pub fn threshold_set(ctx: &AppContext, date: &str) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ScorelineError::Other(format!("invalid date: {} (expected yyyy-mm-dd)", date)))?;
    ctx.tracker.aggregator().set_threshold(Some(date))?;
    println!("Hiding items last solved before {}", date);
    Ok(())
}

pub fn threshold_clear(ctx: &AppContext) -> Result<()> {
    ctx.tracker.aggregator().set_threshold(None)?;
    println!("Cutoff cleared");
    Ok(())
}

pub fn threshold_show(ctx: &AppContext) -> Result<()> {
    match ctx.tracker.aggregator().threshold() {
        Some(date) => println!("Hiding items last solved before {}", date),
        None => println!("No cutoff set"),
    }
    Ok(())
}

pub fn group_set_excluded(ctx: &AppContext, name: &str, excluded: bool) -> Result<()> {
    let known = ctx
        .tracker
        .list_groups()?
        .iter()
        .any(|g| normalize_group_name(&g.name) == normalize_group_name(name));
    if !known {
        eprintln!("Warning: no group named {:?} in the current roster", name);
    }

    ctx.tracker.aggregator().set_excluded(name, excluded)?;
    if excluded {
        println!("Excluded {} from the global tally", name);
    } else {
        println!("Included {} in the global tally", name);
    }
    Ok(())
}

pub fn group_list(ctx: &AppContext) -> Result<()> {
    let groups = ctx.tracker.list_groups()?;
    if groups.is_empty() {
        println!("No groups");
        return Ok(());
    }

    for group in groups {
        let mark = if ctx.tracker.aggregator().is_excluded(&group.name) {
            "excluded"
        } else {
            "included"
        };
        println!("{:<32} {} ({} items)", group.name, mark, group.items.len());
    }
    Ok(())
}

pub async fn watch(ctx: &AppContext, interval_spec: &str) -> Result<()> {
    let secs = parse_interval(interval_spec).map_err(ScorelineError::Other)?;
    println!("Watching roster every {}s (Ctrl+C to stop)", secs);

    let tracker = ctx.tracker.clone();
    ctx.roster.subscribe(Box::new({
        let tracker = tracker.clone();
        move |change| tracker.note_marker_change(change)
    }));

    let mut ticker = interval(Duration::from_secs(secs));
    loop {
        ticker.tick().await;
        if let Err(e) = ctx.roster.reload() {
            tracing::warn!("roster reload failed: {}", e);
            continue;
        }
        let report = tracker.refresh(today(), true).await?;
        print_report(&report);
    }
}

fn print_report(report: &StatusReport) {
    for group in &report.groups {
        let tally = &group.tally;
        let mark = if group.excluded { "-" } else { " " };
        println!(
            "{} {:<28} {:>4} total {:>4} solved {:>4} wrong {:>4} unattended | filtered: {}/{}/{}",
            mark,
            group.name,
            tally.overall.total,
            tally.overall.solved,
            tally.overall.wrong,
            tally.overall.unattended,
            tally.filtered.solved,
            tally.filtered.wrong,
            tally.filtered.unattended,
        );
    }

    let total = &report.total;
    println!(
        "  {:<28} {:>4} total {:>4} solved {:>4} wrong {:>4} unattended | filtered: {}/{}/{}",
        "TOTAL",
        total.overall.total,
        total.overall.solved,
        total.overall.wrong,
        total.overall.unattended,
        total.filtered.solved,
        total.filtered.wrong,
        total.filtered.unattended,
    );

    if report.pending > 0 {
        println!("  {} items still awaiting remote lookup", report.pending);
    }
}

/// Parse an interval string like "30s", "5m", "1h".
fn parse_interval(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();

    if let Some(hours) = s.strip_suffix('h') {
        hours
            .parse::<u64>()
            .map(|h| h * 3600)
            .map_err(|_| format!("Invalid hours: {}", hours))
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes
            .parse::<u64>()
            .map(|m| m * 60)
            .map_err(|_| format!("Invalid minutes: {}", minutes))
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '30s', '5m', '1h'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("30s").unwrap(), 30);
        assert_eq!(parse_interval("5m").unwrap(), 300);
        assert_eq!(parse_interval("1h").unwrap(), 3600);
        assert_eq!(parse_interval("45").unwrap(), 45);
        assert!(parse_interval("soon").is_err());
    }
}
