use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use reclaim::apps::{self, AppCatalog, InstalledApp};
use reclaim::cleaner::{CleanupMode, CleanupPlan};
use reclaim::cli::args::{CacheAction, Cli, Commands, ConfigAction, SortArg};
use reclaim::cli::output::{self, ProgressReporter};
use reclaim::common::config::{expand_home, Config};
use reclaim::common::format;
use reclaim::pipeline::{ScanScope, Services};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let _guard = init_logging(cli.verbose);

    let config = Config::load()?;
    let services = Services::from_config(config);

    match cli.command {
        Commands::Apps {
            sort,
            ref search,
            no_cache,
        } => cmd_apps(&cli, &services, sort, search.as_deref(), no_cache),

        Commands::Uninstall {
            ref name,
            keep_user_data,
            dry_run,
            yes,
        } => cmd_uninstall(&cli, &services, name, keep_user_data, dry_run, yes),

        Commands::Orphans { clean, yes } => cmd_orphans(&cli, &services, clean, yes),

        Commands::Map {
            scope,
            depth_preview,
            no_cache,
        } => cmd_map(&cli, &services, scope, depth_preview, no_cache),

        Commands::Dups { scope } => cmd_dups(&cli, &services, scope),

        Commands::Units { ref path } => cmd_units(&cli, &services, path.as_deref()),

        Commands::Recommend { scope } => cmd_recommend(&cli, &services, scope),

        Commands::Categories { quick_clean, yes } => cmd_categories(&cli, &services, quick_clean, yes),

        Commands::Cache { ref action } => match action {
            CacheAction::Clear => {
                services.clear_caches()?;
                if !cli.json {
                    println!("  {} Caches cleared", "✓".green());
                }
                Ok(())
            }
        },

        Commands::Config { ref action } => cmd_config(&cli, &services.config, action),
    }
}

/// Daily log file under the data dir; stderr too when verbose.
///
/// `RECLAIM_LOG` overrides the filter. Logging is best effort: if the log
/// directory cannot be created only the stderr layer is installed.
fn init_logging(verbose: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default = if verbose { "reclaim=debug" } else { "reclaim=info" };
    let filter = EnvFilter::try_from_env("RECLAIM_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
    });

    let (file_layer, guard) = match Config::init_dirs() {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(Config::logs_dir(), "reclaim.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("\n  {} {} [y/N] ", "❓", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn show_progress(cli: &Cli) -> bool {
    !cli.json
}

/// Catalog plus resolved artifacts
fn load_apps(services: &Services, progress: bool, no_cache: bool) -> Result<Vec<InstalledApp>> {
    let reporter = ProgressReporter::new(progress);
    let mut on_progress = |p: apps::ScanProgress| reporter.update(p);

    let fetched = if no_cache {
        services.catalog.refresh(&mut on_progress)
    } else {
        services.catalog.fetch_catalog(&mut on_progress)
    };
    let mut installed = fetched.context("Failed to discover installed applications")?;

    apps::resolve_all(&mut installed, &services.artifacts, &mut on_progress);
    reporter.finish();
    Ok(installed)
}

/// Trash a plan after confirmation, then report
fn run_plan(cli: &Cli, services: &Services, plan: &CleanupPlan, yes: bool) -> Result<()> {
    if plan.is_empty() {
        return Ok(());
    }
    if !yes {
        if cli.json {
            bail!("Refusing to prompt in JSON mode; pass --yes to confirm");
        }
        let prompt = format!(
            "Move {} ({}) to the Trash?",
            format::format_count(plan.file_count()),
            format::format_size(plan.total_bytes())
        );
        if !confirm(&prompt)? {
            println!("  {} Cancelled", "✗".red());
            return Ok(());
        }
    }

    let reporter = ProgressReporter::new(show_progress(cli));
    let total = plan.file_count();
    let mut done = 0;
    let result = services.executor.execute_with(plan, &mut |path| {
        reporter.update(apps::ScanProgress::new(format::format_path(path), done, total));
        done += 1;
    });
    reporter.finish();

    if cli.json {
        output::print_json(&result);
    } else {
        output::print_execution_result(&result);
    }
    Ok(())
}

// ─── Apps ─────────────────────────────────────────────────────────────────────

fn cmd_apps(cli: &Cli, services: &Services, sort: SortArg, search: Option<&str>, no_cache: bool) -> Result<()> {
    let mut installed = load_apps(services, show_progress(cli), no_cache)?;
    apps::sort_apps(&mut installed, sort.into());
    let shown = apps::filter_apps(&installed, search.unwrap_or(""));
    let info = services.catalog.latest_fetch_info();

    if cli.json {
        output::print_json(&serde_json::json!({
            "fetch_info": info,
            "apps": shown,
        }));
    } else {
        output::print_app_list(&shown, info);
    }
    Ok(())
}

fn find_app<'a>(installed: &'a [InstalledApp], name: &str) -> Result<&'a InstalledApp> {
    let needle = name.to_lowercase();
    if let Some(app) = installed
        .iter()
        .find(|a| a.display_name.to_lowercase() == needle || a.bundle_id.to_lowercase() == needle)
    {
        return Ok(app);
    }

    let matches = apps::filter_apps(installed, name);
    match matches.as_slice() {
        [] => bail!("No installed application matches '{}'", name),
        [only] => Ok(*only),
        many => bail!(
            "'{}' matches {} applications: {}",
            name,
            many.len(),
            many.iter()
                .map(|a| a.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn cmd_uninstall(
    cli: &Cli,
    services: &Services,
    name: &str,
    keep_user_data: bool,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let installed = load_apps(services, show_progress(cli), false)?;
    let app = find_app(&installed, name)?;

    let mode = if keep_user_data {
        CleanupMode::KeepUserData
    } else {
        CleanupMode::RemoveEverything
    };
    let plan = services.planner.make_plan(app, mode);
    tracing::info!("uninstall plan for {}: {} items", app.display_name, plan.file_count());

    if cli.json && dry_run {
        output::print_json(&plan);
        return Ok(());
    }
    if !cli.json {
        output::print_app_detail(app);
        output::print_plan(&format!("{} ({})", app.display_name, mode), &plan);
    }
    if dry_run {
        println!("  {} Dry run, nothing was moved.", "ℹ️");
        return Ok(());
    }
    run_plan(cli, services, &plan, yes)
}

// ─── Orphans ──────────────────────────────────────────────────────────────────

fn cmd_orphans(cli: &Cli, services: &Services, clean: bool, yes: bool) -> Result<()> {
    let reporter = ProgressReporter::new(show_progress(cli));
    let installed = services
        .catalog
        .fetch_catalog(&mut |p| reporter.update(p))
        .context("Failed to discover installed applications")?;
    reporter.finish();

    let plan = services.planner.orphan_plan(services.orphans(&installed));

    if cli.json && !clean {
        output::print_json(&plan);
        return Ok(());
    }
    if !cli.json {
        output::print_plan("Orphaned data", &plan);
    }
    if clean {
        run_plan(cli, services, &plan, yes)?;
    }
    Ok(())
}

// ─── Map / Dups / Units ───────────────────────────────────────────────────────

fn cmd_map(cli: &Cli, services: &Services, scope: ScanScope, depth: usize, no_cache: bool) -> Result<()> {
    let root = scope.current_root();
    let spinner = output::spinner(show_progress(cli), &format!("Mapping {}...", format::format_path(&root)));
    let map = if no_cache {
        services.storage.refresh(scope, &root)
    } else {
        services.storage.map(scope, &root)
    };
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let map = match map {
        Ok(map) => map,
        Err(e) if e.is_retryable() => {
            return Err(anyhow::Error::new(e).context(format!(
                "Failed to map {} (check Full Disk Access and try again)",
                root.display()
            )));
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("Failed to map {}", root.display()))),
    };

    if cli.json {
        output::print_json(&map);
    } else {
        output::print_storage_map(&map.value, depth, map.from_cache);
    }
    Ok(())
}

fn cmd_dups(cli: &Cli, services: &Services, scope: ScanScope) -> Result<()> {
    let root = scope.current_root();
    let spinner = output::spinner(show_progress(cli), "Discovering apps and mapping disk...");

    let (installed, map) = rayon::join(|| load_apps(services, false, false), || services.storage.map(scope, &root));
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let installed = installed?;
    let tree = match map {
        Ok(map) => Some(map.value),
        Err(e) => {
            tracing::warn!("continuing without a disk map: {}", e);
            None
        }
    };

    let report = services.duplicates.detect(&installed, tree.as_ref());
    if cli.json {
        output::print_json(&serde_json::json!({
            "large_items": report.large_items,
            "groups": report.groups,
            "potential_reclaim": report.potential_reclaim(),
        }));
    } else {
        output::print_duplicate_report(&report);
    }
    Ok(())
}

fn cmd_units(cli: &Cli, services: &Services, path: Option<&str>) -> Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
    let root = path.map(|p| expand_home(p, &home)).unwrap_or(home);
    if !root.exists() {
        bail!("Path does not exist: {}", root.display());
    }

    let spinner = output::spinner(show_progress(cli), &format!("Searching {}...", format::format_path(&root)));
    let units = services.units.detect_units(&root);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if cli.json {
        output::print_json(&units);
    } else {
        output::print_units(&units);
    }
    Ok(())
}

// ─── Recommend / Categories ───────────────────────────────────────────────────

fn cmd_recommend(cli: &Cli, services: &Services, scope: ScanScope) -> Result<()> {
    let installed = load_apps(services, show_progress(cli), false)?;
    let root = scope.current_root();

    let spinner = output::spinner(show_progress(cli), "Analyzing storage profile...");
    let result = services.recommender.recommend(scope, &root, &installed);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if cli.json {
        output::print_json(&result);
    } else {
        output::print_recommendations(&result.value, result.from_cache);
    }
    Ok(())
}

fn cmd_categories(cli: &Cli, services: &Services, quick_clean: bool, yes: bool) -> Result<()> {
    let installed = load_apps(services, show_progress(cli), false)?;
    let categories = apps::build_categories(&installed);

    if !quick_clean {
        if cli.json {
            output::print_json(&categories);
        } else {
            output::print_categories(&categories);
        }
        return Ok(());
    }

    let plan = apps::safe_cleanup_plan(&installed);
    if !cli.json {
        output::print_categories(&categories);
        output::print_plan("Safe caches and logs", &plan);
    }
    run_plan(cli, services, &plan, yes)
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(cli: &Cli, config: &Config, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            if cli.json {
                output::print_json(config);
            } else {
                println!("# {}", Config::config_path().display());
                println!("{}", toml::to_string_pretty(config)?);
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            if !cli.json {
                println!(
                    "  {} Configuration reset to defaults at {}",
                    "✓".green(),
                    format::format_path(&Config::config_path())
                );
            }
        }
    }
    Ok(())
}
