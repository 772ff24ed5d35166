use clap::{Parser, Subcommand, ValueEnum};

use crate::apps::AppSort;
use crate::pipeline::ScanScope;

/// reclaim: storage intelligence for macOS
#[derive(Parser, Debug)]
#[command(
    name = "reclaim",
    version,
    about = "Storage intelligence for macOS: apps, leftovers, duplicates and recommendations",
    long_about = "reclaim measures installed apps together with everything they leave behind,\n\
                   maps disk usage, finds heuristic duplicates and ranks cleanup\n\
                   recommendations for the kind of user you appear to be.",
    after_help = "EXAMPLES:\n  \
        reclaim apps --sort size               Apps by true size\n  \
        reclaim uninstall Slack --dry-run      Preview an app removal\n  \
        reclaim orphans                        Leftovers of removed apps\n  \
        reclaim map --scope applications       Storage map of /Applications\n  \
        reclaim dups --json                    Large items and duplicate groups\n  \
        reclaim units ~/Projects               Rebuildable dev folders\n  \
        reclaim recommend                      Ranked suggestions\n  \
        reclaim categories --quick-clean       Trash safe caches"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List installed applications with their true size
    Apps {
        /// Sort order
        #[arg(long, default_value = "size")]
        sort: SortArg,

        /// Only show apps whose name or bundle id contains this
        #[arg(long)]
        search: Option<String>,

        /// Ignore the cached catalog and rediscover
        #[arg(long)]
        no_cache: bool,
    },

    /// Move an application and its artifacts to the Trash
    Uninstall {
        /// Application name or bundle id
        name: String,

        /// Leave user data and preferences in place
        #[arg(long)]
        keep_user_data: bool,

        /// Preview what would be removed
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Find leftovers from apps that are no longer installed
    Orphans {
        /// Move the orphans to the Trash
        #[arg(long)]
        clean: bool,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show a storage map
    Map {
        /// Which part of the disk to map
        #[arg(long, default_value = "home")]
        scope: ScanScope,

        /// Levels of the tree to print
        #[arg(long, default_value = "2")]
        depth_preview: usize,

        /// Ignore a cached map and rescan
        #[arg(long)]
        no_cache: bool,
    },

    /// Largest items and heuristic duplicate groups
    Dups {
        /// Which part of the disk to include
        #[arg(long, default_value = "home")]
        scope: ScanScope,
    },

    /// Detect rebuildable folders (node_modules, DerivedData, ...)
    Units {
        /// Directory to search (defaults to home)
        path: Option<String>,
    },

    /// Profile-aware ranked cleanup recommendations
    Recommend {
        /// Which part of the disk to analyze
        #[arg(long, default_value = "home")]
        scope: ScanScope,
    },

    /// Smart category totals across all apps
    Categories {
        /// Move every safe cache and log artifact to the Trash
        #[arg(long)]
        quick_clean: bool,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage cached results
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Delete every cached catalog, map and recommendation set
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset to default configuration
    Reset,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Size,
    Name,
    LastUsed,
}

impl From<SortArg> for AppSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Size => AppSort::Size,
            SortArg::Name => AppSort::Name,
            SortArg::LastUsed => AppSort::LastUsed,
        }
    }
}
