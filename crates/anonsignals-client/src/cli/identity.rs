use super::commands::{IdentityAction, OutputFormat};
use super::utils::{parse_field, print_json};
use anonsignals_client::{ClientConfig, IdentityManager, SledIdentityStore};
use anonsignals_crypto::derive_identity;
use anonsignals_types::AnonResult;
use serde_json::json;
use std::sync::Arc;

pub async fn handle_identity(
    action: IdentityAction,
    config: &ClientConfig,
    format: &OutputFormat,
) -> AnonResult<()> {
    match action {
        IdentityAction::Derive { user_id } => {
            let identity = derive_identity(&user_id);
            match format {
                OutputFormat::Json => print_json(&json!({
                    "userId": user_id,
                    "commitment": identity.commitment(),
                }))?,
                OutputFormat::Text => println!("Commitment: {}", identity.commitment()),
            }
        }
        IdentityAction::Show { user_id, member_commitment } => {
            let member = member_commitment.as_deref().map(parse_field).transpose()?;
            let manager = open_manager(config)?;
            let identity = manager.load_or_create(&user_id, member.as_ref())?;
            match format {
                OutputFormat::Json => print_json(&json!({
                    "userId": user_id,
                    "commitment": identity.commitment(),
                    "storage": config.storage.path,
                }))?,
                OutputFormat::Text => {
                    println!("User:       {}", user_id);
                    println!("Commitment: {}", identity.commitment());
                    println!("Stored in:  {:?}", config.storage.path);
                }
            }
        }
        IdentityAction::Forget { user_id } => {
            let removed = open_manager(config)?.forget(&user_id)?;
            match format {
                OutputFormat::Json => print_json(&json!({ "userId": user_id, "removed": removed }))?,
                OutputFormat::Text if removed => println!("Stored identity removed."),
                OutputFormat::Text => println!("No stored identity for this user."),
            }
        }
    }

    Ok(())
}

pub fn open_manager(config: &ClientConfig) -> AnonResult<IdentityManager> {
    let store = SledIdentityStore::open(&config.storage.path)?;
    Ok(IdentityManager::new(Arc::new(store)))
}
