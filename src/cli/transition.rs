use clap::Parser;
use grievance::{ComplaintId, LifecycleEngine, Status};
use tracing::instrument;

use super::{
    Workspace,
    terminal::{Colorize, status_cell},
};

#[derive(Debug, Parser)]
pub struct Transition {
    /// The ID of the complaint
    #[clap(value_parser = super::parse_id)]
    id: ComplaintId,

    /// The new status (Pending, "In Progress", Resolved, Rejected)
    status: Status,

    /// A note for the audit trail
    #[arg(long, short)]
    note: Option<String>,
}

impl Transition {
    #[instrument(level = "debug", skip(self, workspace), fields(id = %self.id))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let restored = workspace.load()?;
        let engine = LifecycleEngine::new(&restored.store);

        let previous = restored.store.get(self.id)?.status();
        let complaint = engine.transition(self.id, self.status, self.note.as_deref())?;
        workspace.save(&restored)?;

        let entry = complaint.history().last();
        println!(
            "{} {} {} {}",
            format!("✅ {}:", complaint.id()).success(),
            status_cell(previous, 0),
            "→".dim(),
            status_cell(entry.status(), 0),
        );
        println!("   {}", entry.note().dim());
        Ok(())
    }
}
