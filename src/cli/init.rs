use clap::Parser;
use grievance::storage::sample;
use tracing::instrument;

use super::Workspace;

#[derive(Debug, Parser)]
pub struct Init {
    /// Start with an empty data file instead of the sample complaints
    #[arg(long)]
    empty: bool,
}

impl Init {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let data = workspace.data();
        if data.exists() {
            anyhow::bail!(
                "Already initialized (found existing data file {})",
                data.display()
            );
        }

        let config_path = workspace.config_path();
        let config_created = !config_path.exists();
        if config_created {
            workspace
                .config()
                .save(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", config_path.display()))?;
        }

        let snapshot = if self.empty {
            grievance::Snapshot::default()
        } else {
            sample()?
        };
        snapshot
            .save(data)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", data.display()))?;

        println!("Initialized grievance tracker");
        if config_created {
            println!("  Created: {}", config_path.display());
        }
        println!(
            "  Created: {} ({} complaints)",
            data.display(),
            snapshot.len()
        );
        println!();
        println!("Next steps:");
        println!("  griev list");
        println!("  griev report --group-by ward");

        Ok(())
    }
}
