pub mod client;
pub mod config;
pub mod crd;
pub mod error;

pub use client::{SupportArchiveClient, SupportArchiveClientSet};
pub use crd::{
    Condition, ConditionStatus, ConditionType, StatusPhase, SupportArchive,
    SupportArchiveSpec, SupportArchiveStatus,
};
pub use error::Error;

use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

pub fn init_tracing(default_env: &str) {
    let filter = EnvFilter::builder()
        .with_env_var("RUST_LOG")
        .from_env_lossy()
        .add_directive(
            default_env
                .parse()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        );

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();
}
