use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "anonsignals")]
#[command(version = BUILD_VERSION)]
#[command(author = "AnonSignals <team@anonsignals.xyz>")]
#[command(about = "AnonSignals - Anonymous group proofs with relayer verification")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true, value_name = "FILE", help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'd', long, global = true, value_name = "DIR", env = "ANONSIGNALS_DATA_DIR", help = "Data directory path")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(long, global = true, value_name = "FILE", help = "Write logs to file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text", help = "Output format")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Derive, inspect and forget anonymous identities")]
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },

    #[command(about = "Hash a message or scope the way proofs commit to it")]
    Hash {
        #[command(subcommand)]
        action: HashAction,
    },

    #[command(about = "Group operations")]
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    #[command(about = "Membership circuit keys")]
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    #[command(about = "Verifying-key registration with the relayer")]
    Vk {
        #[command(subcommand)]
        action: VkAction,
    },

    #[command(about = "Inspect relayer jobs")]
    Job {
        #[command(subcommand)]
        action: JobAction,
    },

    #[command(about = "Compute an aggregation leaf and optionally compare it")]
    Leaf {
        #[arg(long, value_delimiter = ',', required = true, help = "Public signals, decimal or 0x hex, comma separated")]
        signals: Vec<String>,
        #[arg(long, help = "Verifying-key hash (0x...)")]
        vk_hash: String,
        #[arg(long, help = "Leaf reported by the relayer")]
        reported: Option<String>,
    },

    #[command(about = "Prove, submit and verify a group action")]
    #[command(long_about = "Prove membership for a group action, submit the proof to the relayer and poll until it is verified.\n\nThe member list is a JSON array of {\"commitment\", \"joinedAt\"} entries.")]
    Action(ActionArgs),
}

#[derive(Subcommand)]
pub enum IdentityAction {
    #[command(about = "Derive the identity for a user id without touching storage")]
    Derive {
        user_id: String,
    },
    #[command(about = "Load (or create) the stored identity for a user id")]
    Show {
        user_id: String,
        #[arg(long, help = "Commitment recorded by the membership store")]
        member_commitment: Option<String>,
    },
    #[command(about = "Remove the stored identity for a user id")]
    Forget {
        user_id: String,
    },
}

#[derive(Subcommand)]
pub enum HashAction {
    #[command(about = "Hash normalized text")]
    Text {
        text: String,
    },
    #[command(about = "Hash a number (decimal or 0x hex)")]
    Number {
        value: String,
    },
}

#[derive(Subcommand)]
pub enum GroupAction {
    #[command(about = "Rebuild a group from a member list and print its root")]
    Root {
        #[arg(long, value_name = "FILE")]
        members: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum KeysAction {
    #[command(about = "Run circuit setup and write the proving key")]
    Generate {
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        #[arg(long, value_name = "FILE", help = "Also write the verifying key as snarkjs JSON")]
        vk_output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum VkAction {
    #[command(about = "Register a snarkjs verifying key and print its hash")]
    Register {
        #[arg(long, value_name = "FILE")]
        vk: PathBuf,
        #[arg(long, help = "Cache slug, e.g. a blueprint name")]
        slug: String,
    },
}

#[derive(Subcommand)]
pub enum JobAction {
    #[command(about = "Fetch the current status of a job")]
    Status {
        job_id: String,
    },
    #[command(about = "Poll a job until it reaches a terminal status")]
    Wait {
        job_id: String,
        #[arg(long)]
        max_attempts: Option<u32>,
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[derive(clap::Args)]
pub struct ActionArgs {
    #[arg(long, help = "Anonymous user id")]
    pub user: String,
    #[arg(long, value_name = "FILE", help = "Member list (JSON)")]
    pub members: PathBuf,
    #[arg(long, value_name = "FILE", help = "Proving key from `keys generate`")]
    pub proving_key: PathBuf,
    #[arg(long, help = "Commitment recorded by the membership store")]
    pub member_commitment: Option<String>,
    #[arg(long, help = "Register the proving key's verifying key instead of using the configured hash")]
    pub register_vk: bool,
    #[command(subcommand)]
    pub kind: ActionKind,
}

#[derive(Subcommand)]
pub enum ActionKind {
    #[command(about = "Join a group")]
    Join {
        #[arg(long)]
        group: String,
    },
    #[command(about = "Post anonymously in a group")]
    Post {
        #[arg(long)]
        group: String,
        #[arg(long)]
        content: String,
    },
    #[command(about = "Vote on a post")]
    Vote {
        #[arg(long)]
        group: String,
        #[arg(long)]
        post: String,
        #[arg(long)]
        choice: String,
    },
}
