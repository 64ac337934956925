use std::path::{Path, PathBuf};

mod init;
mod list;
mod report;
mod show;
mod status;
mod submit;
mod terminal;
mod transition;
mod validate;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::ArgAction;
use grievance::{
    ComplaintId, ComplaintStore, Config, Criteria, LoadError, Snapshot, Status,
    domain::DEFAULT_CONFIG_FILE, storage::Restored,
};
use init::Init;
use list::List;
use report::Report;
use show::Show;
use status::Summary;
use submit::Submit;
use transition::Transition;
use validate::Validate;

/// Parse a complaint ID from a string, normalizing to uppercase.
///
/// This is a CLI boundary function that accepts lowercase input
/// and normalizes it before parsing.
fn parse_id(s: &str) -> Result<ComplaintId, String> {
    s.trim().to_uppercase().parse().map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// The complaint data file, overriding the configured one
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let workspace = Workspace::open(self.config, self.data)?;

        self.command
            .unwrap_or_else(|| Command::Status(Summary::default()))
            .run(&workspace)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show complaint counts by status (default)
    Status(Summary),

    /// Write a default configuration and the sample data set
    Init(Init),

    /// List complaints, most recent first
    List(List),

    /// Show a complaint and its history
    Show(Show),

    /// Register a new complaint
    Submit(Submit),

    /// Move a complaint to a new status
    ///
    /// Any status may follow any other. Every transition is recorded in the
    /// complaint's history.
    Transition(Transition),

    /// Grouped statistics over a filtered set of complaints
    Report(Report),

    /// Check the data file for broken complaints
    Validate(Validate),
}

impl Command {
    fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(workspace)?,
            Self::Init(command) => command.run(workspace)?,
            Self::List(command) => command.run(workspace)?,
            Self::Show(command) => command.run(workspace)?,
            Self::Submit(command) => command.run(workspace)?,
            Self::Transition(command) => command.run(workspace)?,
            Self::Report(command) => command.run(workspace)?,
            Self::Validate(command) => command.run(workspace)?,
        }
        Ok(())
    }
}

/// The configuration and data file every command works against.
#[derive(Debug)]
pub struct Workspace {
    config_path: PathBuf,
    config: Config,
}

impl Workspace {
    fn open(config_path: PathBuf, data: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = Config::load_or_default(&config_path).map_err(|e| anyhow::anyhow!(e))?;
        if let Some(data) = data {
            config.set_data(data);
        }
        Ok(Self {
            config_path,
            config,
        })
    }

    fn config_path(&self) -> &Path {
        &self.config_path
    }

    const fn config(&self) -> &Config {
        &self.config
    }

    fn data(&self) -> &Path {
        self.config.data()
    }

    /// Loads the data file, keeping any records skipped under
    /// `allow_invalid` so that [`save`](Self::save) writes them back. A
    /// missing data file is an empty store.
    fn load(&self) -> anyhow::Result<Restored> {
        match Snapshot::load(self.data()) {
            Ok(snapshot) => Ok(snapshot.restore(self.config.allow_invalid)?),
            Err(LoadError::NotFound(path)) => {
                tracing::debug!("{} does not exist yet, starting empty", path.display());
                Ok(Restored::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Loads the data file into a store for reading.
    fn load_store(&self) -> anyhow::Result<ComplaintStore> {
        Ok(self.load()?.store)
    }

    fn save(&self, restored: &Restored) -> anyhow::Result<()> {
        restored
            .snapshot()
            .save(self.data())
            .with_context(|| format!("failed to write {}", self.data().display()))
    }
}

/// Filter flags shared by `list` and `report`.
#[derive(Debug, Default, clap::Args)]
pub struct FilterArgs {
    /// Only complaints with this status
    #[arg(long)]
    status: Option<Status>,

    /// Only complaints in this ward
    #[arg(long)]
    ward: Option<String>,

    /// Only complaints in this category
    #[arg(long)]
    category: Option<String>,

    /// Only complaints filed on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    from: Option<NaiveDate>,

    /// Only complaints filed on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    to: Option<NaiveDate>,

    /// Case-insensitive match against the description or ID
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> Criteria {
        Criteria {
            status: self.status,
            ward: self.ward.clone(),
            date_from: self.from,
            date_to: self.to,
            category: self.category.clone(),
            search: self.search.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parse_id_normalizes_case() {
        assert_eq!(parse_id("grv-007").unwrap().to_string(), "GRV-007");
        assert!(parse_id("REQ-007").is_err());
    }

    #[test]
    fn filter_flags_build_criteria() {
        let cli = Cli::try_parse_from([
            "griev",
            "list",
            "--status",
            "in progress",
            "--ward",
            "Ward 12",
            "--from",
            "2026-02-01",
        ])
        .unwrap();

        let Some(Command::List(list)) = cli.command else {
            panic!("expected list command");
        };
        let criteria = list.filters().criteria();
        assert_eq!(criteria.status, Some(Status::InProgress));
        assert_eq!(criteria.ward.as_deref(), Some("Ward 12"));
        assert_eq!(criteria.date_from, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(criteria.date_to, None);
    }

    #[test]
    fn unknown_status_flag_is_rejected() {
        assert!(Cli::try_parse_from(["griev", "list", "--status", "Closed"]).is_err());
    }

    #[test]
    fn missing_data_file_is_an_empty_store() {
        let tmp = tempdir().unwrap();
        let workspace = Workspace::open(
            tmp.path().join(DEFAULT_CONFIG_FILE),
            Some(tmp.path().join("complaints.yaml")),
        )
        .unwrap();

        assert!(workspace.load_store().unwrap().is_empty());
    }

    #[test]
    fn store_survives_a_save_and_load() {
        let tmp = tempdir().unwrap();
        let workspace = Workspace::open(
            tmp.path().join(DEFAULT_CONFIG_FILE),
            Some(tmp.path().join("complaints.json")),
        )
        .unwrap();

        let store = grievance::storage::sample()
            .unwrap()
            .into_store(false)
            .unwrap();
        let restored = Restored::from(store);
        workspace.save(&restored).unwrap();

        assert_eq!(
            workspace.load_store().unwrap().list(),
            restored.store.list()
        );
    }
}
