use super::commands::{GroupAction, OutputFormat};
use super::utils::{load_members, print_json};
use anonsignals_client::rebuild_group;
use anonsignals_types::AnonResult;

pub fn handle_group(action: GroupAction, format: &OutputFormat) -> AnonResult<()> {
    match action {
        GroupAction::Root { members } => {
            let members = load_members(&members)?;
            let group = rebuild_group(&members)?;
            match format {
                OutputFormat::Json => print_json(&group.snapshot())?,
                OutputFormat::Text => {
                    println!("Members: {}", group.size());
                    println!("Depth:   {}", group.depth());
                    println!("Root:    {}", group.root());
                }
            }
        }
    }
    Ok(())
}
