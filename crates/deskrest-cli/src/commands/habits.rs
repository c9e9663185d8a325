use clap::Subcommand;
use deskrest_core::storage::Database;
use deskrest_core::HabitStore;

#[derive(Subcommand)]
pub enum HabitsAction {
    /// List recorded breaks, newest first
    List,
    /// Delete a habit record by id
    Delete {
        /// Record id
        id: i64,
    },
}

pub fn run(action: HabitsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        HabitsAction::List => {
            let records = db.fetch()?;
            if records.is_empty() {
                println!("no breaks recorded yet");
            }
            for record in records {
                println!(
                    "{:>5}  {:<12}  {}",
                    record.id,
                    record.kind.as_str(),
                    record.at.to_rfc3339()
                );
            }
        }
        HabitsAction::Delete { id } => {
            db.delete(id)?;
            println!("ok");
        }
    }
    Ok(())
}
