use super::commands::{ActionArgs, ActionKind, OutputFormat};
use super::keys::load_prover;
use super::utils::{load_members, parse_field, print_json};
use anonsignals_client::{
    ActionPipeline, ActionRequest, AggregationVerifier, CancellationToken, ClientConfig,
    GroupAction, RelayerClient, SubmitOptions, VkCache,
};
use anonsignals_crypto::ProofGenerator;
use anonsignals_types::{AnonResult, GROUP_TREE_DEPTH};
use tracing::info;

use super::identity::open_manager;

const MEMBERSHIP_VK_SLUG: &str = "anonsignals-membership";

pub async fn handle_action(
    args: ActionArgs,
    config: &ClientConfig,
    format: &OutputFormat,
    cancel: &CancellationToken,
) -> AnonResult<()> {
    let action = match args.kind {
        ActionKind::Join { group } => GroupAction::Join { group_id: group },
        ActionKind::Post { group, content } => GroupAction::Post { group_id: group, content },
        ActionKind::Vote { group, post, choice } => GroupAction::Vote {
            group_id: group,
            post_id: post,
            choice,
        },
    };

    let request = ActionRequest {
        user_id: args.user,
        action,
        members: load_members(&args.members)?,
        member_commitment: args.member_commitment.as_deref().map(parse_field).transpose()?,
    };

    let prover = load_prover(&args.proving_key)?;
    let relayer = RelayerClient::from_config(config, VkCache::new())?;

    let vk_hash = if args.register_vk {
        let slug = format!("{}-{}", MEMBERSHIP_VK_SLUG, GROUP_TREE_DEPTH);
        relayer
            .ensure_verification_key(&prover.verifying_key_json(), &slug)
            .await?
    } else {
        config.vk_hash_for_depth(GROUP_TREE_DEPTH)?
    };
    info!("Using verifying key {}", vk_hash);

    let pipeline = ActionPipeline::new(
        open_manager(config)?,
        ProofGenerator::new(prover),
        relayer,
        AggregationVerifier::from_config(&config.aggregation)?,
        vk_hash,
        SubmitOptions {
            chain_id: config.relayer.chain_id,
        },
    );

    let receipt = pipeline.run(&request, cancel).await?;

    match format {
        OutputFormat::Json => print_json(&receipt)?,
        OutputFormat::Text => {
            println!("Job:        {}", receipt.job_id);
            println!("Status:     {}", receipt.status);
            println!("Root:       {}", receipt.bundle.merkle_tree_root);
            println!("Nullifier:  {}", receipt.bundle.nullifier);
            if let Some(report) = &receipt.aggregation {
                println!("Aggregation {} leaf {}", report.artifacts.aggregation_id, report.computed_leaf);
                match (&report.on_chain_verified, &report.on_chain_verification_error) {
                    (Some(true), _) => println!("On-chain:   included"),
                    (Some(false), _) => println!("On-chain:   NOT confirmed"),
                    (None, Some(e)) => println!("On-chain:   unavailable ({})", e),
                    (None, None) => println!("On-chain:   not configured"),
                }
            }
        }
    }

    Ok(())
}
