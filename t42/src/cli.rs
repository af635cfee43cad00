use clap::{Args, Parser, Subcommand, ValueEnum};
use crate::eligibility::CampusSelector;
use std::path::PathBuf;
use t42_api::endpoints::LevelRange;

/// 42cursus, the default curriculum.
pub const DEFAULT_CURSUS_ID: u64 = 21;
pub const DEFAULT_ELIGIBLE_LIMIT: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "t42", version, about = "Command-line client for the 42 intra API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Show debug logs on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Load environment variables from this file instead of secret/.env.
    #[arg(long, global = true, value_name = "FILE", env = "T42_ENV_FILE")]
    pub env: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in, inspect, or discard the stored credentials.
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Query users.
    #[command(visible_alias = "u")]
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Query projects.
    #[command(visible_alias = "p")]
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Query campuses.
    Campus {
        #[command(subcommand)]
        action: CampusAction,
    },
    /// Find users who meet a project's inscription requirements.
    Eligible(EligibleArgs),
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Authorize through the browser (Authorization Code + PKCE).
    Login {
        /// Use the application's client credentials instead of a user login.
        #[arg(long)]
        with_secret: bool,
        /// Preferred loopback port for the OAuth redirect.
        #[arg(long, value_name = "N")]
        redirect_port: Option<u16>,
        /// Print the authorization URL instead of opening a browser.
        #[arg(long)]
        no_browser: bool,
        /// Skip the loopback listener and paste the redirected URL or code instead.
        #[arg(long, conflicts_with = "with_secret")]
        no_localhost: bool,
    },
    /// Show the stored token and what the API reports about it.
    Status,
    /// Delete the stored credentials.
    Logout,
}

/// Campus given by name (or city) or by numeric id.
#[derive(Args, Debug, Clone, Default)]
pub struct CampusArgs {
    /// Campus name or city, matched case-insensitively.
    #[arg(long, conflicts_with = "campus_id")]
    pub campus: Option<String>,
    #[arg(long, value_name = "N")]
    pub campus_id: Option<u64>,
}

impl CampusArgs {
    /// `None` when neither flag was given.
    pub fn selector(&self) -> Option<CampusSelector> {
        match (&self.campus, self.campus_id) {
            (_, Some(id)) => Some(CampusSelector::Id(id)),
            (Some(name), None) => Some(CampusSelector::Name(name.clone())),
            (None, None) => None,
        }
    }
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct LevelArgs {
    #[arg(long, value_name = "F")]
    pub min_level: Option<f64>,
    #[arg(long, value_name = "F")]
    pub max_level: Option<f64>,
}

impl LevelArgs {
    pub fn range(&self) -> LevelRange {
        LevelRange::new(self.min_level, self.max_level)
    }
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    #[arg(short, long, value_name = "N")]
    pub page: Option<u32>,
    #[arg(long, value_name = "N", default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub per_page: u32,
    /// Sort field, prefixed with `-` for descending order.
    #[arg(short, long, value_name = "F")]
    pub sort: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlackholeStatus {
    /// Blackhole within the next --blackhole-days days.
    Upcoming,
    /// Blackhole already passed.
    Past,
    /// Blackhole set and the cursus still running.
    Active,
    /// No blackhole date.
    None,
}

/// Account filters go to the server; project and blackhole filters are applied to each page.
#[derive(Args, Debug, Clone, Default)]
pub struct UserFilterArgs {
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,
    #[arg(long)]
    pub inactive: bool,
    #[arg(long, conflicts_with_all = ["non_alumni", "cursus_id", "min_level", "max_level", "blackhole_status"])]
    pub alumni: bool,
    #[arg(long, conflicts_with_all = ["cursus_id", "min_level", "max_level", "blackhole_status"])]
    pub non_alumni: bool,
    #[arg(long, conflicts_with_all = ["cursus_id", "min_level", "max_level", "blackhole_status"])]
    pub staff: bool,
    /// At least this many validated projects.
    #[arg(long, value_name = "N", conflicts_with_all = ["cursus_id", "min_level", "max_level", "blackhole_status"])]
    pub min_projects: Option<usize>,
    /// Filter on the cursus blackhole; implies cursus 21 unless --cursus-id is given.
    #[arg(long, value_enum, value_name = "STATUS")]
    pub blackhole_status: Option<BlackholeStatus>,
    /// Window for `--blackhole-status upcoming`.
    #[arg(long, value_name = "DAYS", default_value_t = 30)]
    pub blackhole_days: i64,
}

impl UserFilterArgs {
    /// `filter[active]`, or `None` when neither flag was given.
    pub fn active(&self) -> Option<bool> {
        flag_pair(self.active, self.inactive)
    }

    /// `filter[alumni?]`, or `None` when neither flag was given.
    pub fn alumni(&self) -> Option<bool> {
        flag_pair(self.alumni, self.non_alumni)
    }

    pub fn staff(&self) -> Option<bool> {
        self.staff.then_some(true)
    }
}

fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

#[derive(Args, Debug, Clone)]
pub struct UserListArgs {
    #[command(flatten)]
    pub campus: CampusArgs,
    /// Read cursus progress (level, blackhole) for this cursus.
    #[arg(long, value_name = "N")]
    pub cursus_id: Option<u64>,
    #[command(flatten)]
    pub page: PageArgs,
    #[command(flatten)]
    pub levels: LevelArgs,
    #[command(flatten)]
    pub filters: UserFilterArgs,
    /// Fetch every page instead of one.
    #[arg(long, conflicts_with = "page")]
    pub all: bool,
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// List users, optionally by campus, cursus, level, or account filters.
    List(UserListArgs),
    /// Show a user's profile.
    Show { login: String },
    /// List a user's quests.
    Quests { login: String },
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// List projects, or your own project attempts with --mine.
    List {
        #[arg(long)]
        mine: bool,
        /// Only projects of this cursus.
        #[arg(long, value_name = "N")]
        cursus: Option<u64>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a project by slug.
    Show { slug: String },
}

#[derive(Subcommand, Debug)]
pub enum CampusAction {
    /// List campuses.
    List {
        /// Substring of the name, city, or country.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        active_only: bool,
    },
    /// Show a campus by id or name.
    Show {
        #[arg(value_name = "ID_OR_NAME")]
        campus: String,
    },
}

#[derive(Args, Debug)]
pub struct EligibleArgs {
    /// Project slug, e.g. ft_transcendence.
    #[arg(long)]
    pub project: String,
    // Falls back to the primary campus of the logged-in user
    #[command(flatten)]
    pub campus: CampusArgs,
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CURSUS_ID)]
    pub cursus_id: u64,
    #[command(flatten)]
    pub levels: LevelArgs,
    /// Stop after this many eligible users.
    #[arg(
        short,
        long,
        value_name = "N",
        default_value_t = DEFAULT_ELIGIBLE_LIMIT,
        value_parser = parse_limit
    )]
    pub limit: usize,
}

fn parse_limit(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
