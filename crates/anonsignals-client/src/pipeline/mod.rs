mod action;
mod email;
mod runner;


pub use action::GroupAction;
pub use email::{submit_external_proof, EmailBlueprint, EmailVerification, ExternalProof};
pub use runner::{ActionPipeline, ActionReceipt, ActionRequest};
