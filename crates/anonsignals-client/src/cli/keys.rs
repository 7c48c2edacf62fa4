use super::commands::{KeysAction, OutputFormat, VkAction};
use super::utils::{print_json, read_json};
use anonsignals_client::{ClientConfig, RelayerClient, VkCache};
use anonsignals_crypto::Groth16MembershipProver;
use anonsignals_types::{AnonError, AnonResult};
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

pub async fn handle_keys(action: KeysAction, format: &OutputFormat) -> AnonResult<()> {
    match action {
        KeysAction::Generate { output, vk_output } => {
            let prover = tokio::task::spawn_blocking(|| {
                Groth16MembershipProver::setup(&mut rand::thread_rng())
            })
            .await
            .map_err(|e| AnonError::Internal(format!("Setup task failed: {}", e)))??;

            write_file(&output, &prover.to_bytes()?)?;
            info!("Proving key written to {:?}", output);

            if let Some(vk_path) = &vk_output {
                let rendered = serde_json::to_vec_pretty(&prover.verifying_key_json())
                    .map_err(|e| AnonError::Serialization(format!("Failed to render vk: {}", e)))?;
                write_file(vk_path, &rendered)?;
            }

            match format {
                OutputFormat::Json => print_json(&json!({
                    "provingKey": output,
                    "verifyingKey": vk_output,
                }))?,
                OutputFormat::Text => {
                    println!("Proving key:   {:?}", output);
                    if let Some(vk_path) = &vk_output {
                        println!("Verifying key: {:?}", vk_path);
                    }
                }
            }
        }
    }
    Ok(())
}

pub async fn handle_vk(action: VkAction, config: &ClientConfig, format: &OutputFormat) -> AnonResult<()> {
    match action {
        VkAction::Register { vk, slug } => {
            let vk: Value = read_json(&vk)?;
            let relayer = RelayerClient::from_config(config, VkCache::new())?;
            let hash = relayer.ensure_verification_key(&vk, &slug).await?;
            match format {
                OutputFormat::Json => print_json(&json!({ "slug": slug, "vkHash": hash }))?,
                OutputFormat::Text => println!("{}", hash),
            }
        }
    }
    Ok(())
}

pub fn load_prover(path: &Path) -> AnonResult<Groth16MembershipProver> {
    let bytes = std::fs::read(path)
        .map_err(|e| AnonError::Config(format!("Failed to read proving key {:?}: {}", path, e)))?;
    Groth16MembershipProver::from_bytes(&bytes)
}

fn write_file(path: &Path, contents: &[u8]) -> AnonResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AnonError::Config(format!("Failed to create {:?}: {}", parent, e)))?;
    }
    std::fs::write(path, contents)
        .map_err(|e| AnonError::Config(format!("Failed to write {:?}: {}", path, e)))
}
