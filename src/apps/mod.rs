pub mod artifacts;
pub mod categories;
pub mod detector;
pub mod model;

pub use artifacts::{ArtifactResolver, ArtifactSource, HomeLayout};
pub use categories::{build_categories, safe_cleanup_plan, SmartCategory, SmartCategoryKind};
pub use detector::{AppCatalog, AppCatalogDiscoverer, CatalogSource, FetchInfo, ScanProgress};
pub use model::{Artifact, ArtifactGroup, GroupKind, InstalledApp, SafetyLevel};

/// Ordering for app listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppSort {
    #[default]
    Size,
    Name,
    LastUsed,
}

/// Sort in place: size descending, name ascending, or most recently used first
pub fn sort_apps(apps: &mut [InstalledApp], order: AppSort) {
    match order {
        AppSort::Size => apps.sort_by(|a, b| {
            b.true_size()
                .cmp(&a.true_size())
                .then_with(|| a.id.cmp(&b.id))
        }),
        AppSort::Name => apps.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        }),
        // Never-used apps sort last
        AppSort::LastUsed => apps.sort_by(|a, b| b.last_used.cmp(&a.last_used).then_with(|| a.id.cmp(&b.id))),
    }
}

/// Apps whose name or bundle id contains `term`, case-insensitively
pub fn filter_apps<'a>(apps: &'a [InstalledApp], term: &str) -> Vec<&'a InstalledApp> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return apps.iter().collect();
    }
    apps.iter()
        .filter(|app| {
            app.display_name.to_lowercase().contains(&term) || app.bundle_id.to_lowercase().contains(&term)
        })
        .collect()
}

/// Populate each app's artifacts once, reporting progress per app
pub fn resolve_all(
    apps: &mut [InstalledApp],
    resolver: &dyn ArtifactSource,
    progress: &mut dyn FnMut(ScanProgress),
) {
    let total = apps.len();
    for (index, app) in apps.iter_mut().enumerate() {
        progress(ScanProgress::new(
            format!("Resolving {}...", app.display_name),
            index,
            total,
        ));
        app.artifacts = resolver.artifacts(app);
    }
    progress(ScanProgress::new("Artifact resolution complete.", total, total));
}
