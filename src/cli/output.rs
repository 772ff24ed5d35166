use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::apps::{FetchInfo, CatalogSource, InstalledApp, ScanProgress, SmartCategory};
use crate::cleaner::{CleanupExecutionResult, CleanupPlan};
use crate::common::format::{self, format_path, format_safety, format_size, format_size_colored};
use crate::duplicates::DuplicateReport;
use crate::profiles::RecommendationSet;
use crate::scanner::{DiskNode, SemanticCleanupUnit};

/// Print any serializable result as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}

/// Progress bar driven by [`ScanProgress`] updates
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let pb = ProgressBar::new(1);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("━━░"),
            );
            pb
        });
        Self { bar }
    }

    pub fn update(&self, progress: ScanProgress) {
        if let Some(pb) = &self.bar {
            pb.set_length(progress.total.max(1) as u64);
            pb.set_position(progress.completed as u64);
            pb.set_message(progress.message);
        }
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
    }
}

/// Spinner for work without a known total
pub fn spinner(enabled: bool, message: &str) -> Option<ProgressBar> {
    enabled.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}").unwrap());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    })
}

fn cache_note(from_cache: bool) -> ColoredString {
    if from_cache {
        "(cached)".dimmed()
    } else {
        "".normal()
    }
}

/// Print app list with true sizes
pub fn print_app_list(apps: &[&InstalledApp], info: FetchInfo) {
    println!();
    println!(
        "  {} Installed Applications ({}) {}",
        "📱",
        apps.len(),
        cache_note(info.source == CatalogSource::Cached)
    );
    println!("{}", "─".repeat(70).dimmed());
    println!();

    if apps.is_empty() {
        println!("  No applications found.");
        return;
    }

    println!(
        "  {:<30} {:>10} {:>10} {:>10}  {}",
        "Name".dimmed(),
        "Bundle".dimmed(),
        "Artifacts".dimmed(),
        "Total".dimmed(),
        "Last used".dimmed(),
    );
    println!("  {}", "─".repeat(68).dimmed());

    for app in apps {
        let leftovers = app.true_size().saturating_sub(app.bundle_size);
        println!(
            "  {:<30} {:>10} {:>10} {:>10}  {}",
            format::truncate(&app.display_name, 30),
            format_size(app.bundle_size),
            if leftovers > 0 { format_size(leftovers) } else { "-".to_string() },
            format_size(app.true_size()),
            app.last_used
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "never".to_string())
                .dimmed(),
        );
    }
    println!();
}

/// Print an app's artifacts grouped by kind
pub fn print_app_detail(app: &InstalledApp) {
    println!();
    println!("  {} {}", "📱", app.display_name.bold());
    println!("{}", "─".repeat(50).dimmed());
    println!("  Path:       {}", format_path(&app.bundle_path));
    println!("  Bundle ID:  {}", app.bundle_id);
    println!("  True size:  {}", format_size_colored(app.true_size()));

    for group in app.grouped_artifacts() {
        println!();
        println!(
            "  {} {} ({})",
            format_safety(group.kind.safety()),
            group.kind.to_string().bold(),
            format_size(group.total_bytes())
        );
        for artifact in &group.artifacts {
            println!(
                "    {} {} ({})",
                "↳".dimmed(),
                format_path(&artifact.path),
                format_size(artifact.size_bytes)
            );
        }
    }
}

/// Print a cleanup plan before it runs
pub fn print_plan(title: &str, plan: &CleanupPlan) {
    println!();
    println!("  {} {}", "🗑", title.bold());
    println!("{}", "─".repeat(60).dimmed());

    if plan.is_empty() {
        println!("  Nothing to remove.");
        println!();
        return;
    }

    for artifact in plan.artifacts() {
        println!(
            "    {:<10} {:>10}  {}  {}",
            format_safety(artifact.safety()),
            format_size(artifact.size_bytes),
            format_path(&artifact.path),
            format!("[{}]", artifact.kind).dimmed(),
        );
    }
    println!();
    println!(
        "  {} {} in {}",
        "💾",
        format_size_colored(plan.total_bytes()),
        format::format_count(plan.file_count())
    );
    println!();
}

/// Print what an execution removed and what it could not
pub fn print_execution_result(result: &CleanupExecutionResult) {
    println!();
    println!(
        "  {} {} {} item(s), {}",
        "✓".green(),
        "Moved to Trash:".bold(),
        result.removed_paths.len(),
        format_size_colored(result.reclaimed_bytes),
    );

    if !result.failures.is_empty() {
        println!();
        for failure in &result.failures {
            println!(
                "    {} {} {}",
                "⚠".yellow(),
                format_path(&failure.path),
                failure.reason.dimmed()
            );
        }
    }
    println!();
}

/// Print a storage map down to `depth` levels
pub fn print_storage_map(root: &DiskNode, depth: usize, from_cache: bool) {
    println!();
    println!(
        "  {} Storage map of {} ({}) {}",
        "🗺",
        format_path(&root.path).cyan(),
        format_size_colored(root.size_bytes),
        cache_note(from_cache)
    );
    println!("{}", "─".repeat(70).dimmed());
    print_tree_children(root, root.size_bytes, 1, depth);
    println!();
}

fn print_tree_children(node: &DiskNode, total: u64, level: usize, depth: usize) {
    if level > depth {
        return;
    }
    for child in &node.children {
        let share = if total > 0 {
            child.size_bytes as f64 / total as f64
        } else {
            0.0
        };
        let bar_len = (share * 20.0).round() as usize;
        println!(
            "  {}{:<32} {:>10}  {}{}",
            "  ".repeat(level - 1),
            format::truncate(&child.name, 32),
            format_size(child.size_bytes),
            "█".repeat(bar_len).cyan(),
            "░".repeat(20 - bar_len.min(20)).dimmed(),
        );
        print_tree_children(child, total, level + 1, depth);
    }
}

/// Print large items and duplicate groups
pub fn print_duplicate_report(report: &DuplicateReport) {
    println!();
    println!("  {} Largest items", "📦");
    println!("{}", "─".repeat(70).dimmed());
    if report.large_items.is_empty() {
        println!("  None above the size floor.");
    }
    for item in &report.large_items {
        println!(
            "  {:>10}  {:<30} {}",
            format_size(item.size_bytes),
            format::truncate(&item.title, 30),
            format_path(&item.path).dimmed(),
        );
    }

    println!();
    println!(
        "  {} Duplicate groups ({}), {} reclaimable",
        "🔍",
        report.groups.len(),
        format_size_colored(report.potential_reclaim())
    );
    println!("{}", "─".repeat(70).dimmed());
    for group in &report.groups {
        println!(
            "  {} {} × {} ({} reclaimable)",
            "●".yellow(),
            group.name.bold(),
            group.members.len(),
            format_size(group.reclaimable_bytes()),
        );
        for member in &group.members {
            let owner = member
                .source_bundle_id
                .as_deref()
                .map(|id| format!(" [{}]", id))
                .unwrap_or_default();
            println!(
                "      {} {}{}",
                "↳".dimmed(),
                format_path(&member.path),
                owner.dimmed()
            );
        }
    }
    println!();
}

/// Print semantic cleanup units
pub fn print_units(units: &[SemanticCleanupUnit]) {
    println!();
    println!("  {} Cleanup units ({})", "🧹", units.len());
    println!("{}", "─".repeat(70).dimmed());

    if units.is_empty() {
        println!("  {} No bulky rebuildable folders found.", "✨");
        println!();
        return;
    }

    for unit in units {
        println!(
            "  {:>10}  {:<8} {}",
            format_size_colored(unit.total_bytes),
            format_safety(unit.risk),
            format_path(&unit.path),
        );
        println!(
            "              {} {}",
            unit.reason.dimmed(),
            format::format_count(unit.file_count).dimmed()
        );
    }
    let total: u64 = units.iter().map(|u| u.total_bytes).sum();
    println!();
    println!("  {} Total: {}", "💾", format_size_colored(total));
    println!();
}

/// Print the inferred profile and its ranked recommendations
pub fn print_recommendations(set: &RecommendationSet, from_cache: bool) {
    let profile = &set.profile;
    let kinds = profile
        .kinds
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" + ");

    println!();
    println!(
        "  {} Profile: {} ({:.0}% confidence) {}",
        "👤",
        kinds.bold(),
        profile.confidence * 100.0,
        cache_note(from_cache)
    );
    for evidence in &profile.evidence {
        println!("    {} {}", "↳".dimmed(), evidence.reason.dimmed());
    }

    println!();
    println!("  {} Recommendations", "💡");
    println!("{}", "─".repeat(70).dimmed());
    if set.recommendations.is_empty() {
        println!("  Nothing to recommend.");
    }
    for (index, rec) in set.recommendations.iter().enumerate() {
        println!("  {:>2}. {}", index + 1, rec.title.bold());
        println!("      {}", rec.detail);
        if let Some(path) = &rec.path {
            println!("      {}", format_path(path).dimmed());
        }
        println!(
            "      {}",
            format!(
                "impact {:.2}  confidence {:.2}  risk {:.2}",
                rec.impact, rec.confidence, rec.risk
            )
            .dimmed()
        );
    }
    println!();
}

/// Print smart category totals
pub fn print_categories(categories: &[SmartCategory]) {
    println!();
    println!("  {} Storage by category", "📊");
    println!("{}", "─".repeat(70).dimmed());
    println!(
        "  {:<20} {:>10} {:>8} {:>10} {:>10} {:>10}",
        "Category".dimmed(),
        "Total".dimmed(),
        "Items".dimmed(),
        "Safe".dimmed(),
        "Review".dimmed(),
        "Risky".dimmed(),
    );
    for category in categories {
        println!(
            "  {:<20} {:>10} {:>8} {:>10} {:>10} {:>10}",
            category.kind.to_string(),
            format_size(category.total_bytes),
            category.item_count,
            format_size(category.safe_bytes).green(),
            format_size(category.review_bytes).yellow(),
            format_size(category.risky_bytes).red(),
        );
    }
    println!();
}
