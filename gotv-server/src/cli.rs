use clap::{Parser, ValueEnum};

/// Which `BackingStore` variant to construct the engine around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum StoreKind {
    Memory,
    Disk,
    Blob,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Shared secret enforced on ingest and admin routes.
    #[arg(long, env = "AUTH")]
    pub auth: String,

    /// Fragments to lag behind live before surfacing them to spectators.
    #[arg(long, env = "DELAY", default_value_t = 8)]
    pub delay: u32,

    /// Listen address of the HTTP adapter.
    #[arg(long, env = "ADDR", default_value = "0.0.0.0:8080")]
    pub addr: String,

    #[arg(long, env = "KEYFRAME_INTERVAL", default_value_t = 3.0)]
    pub keyframe_interval: f64,

    #[arg(long, env = "STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    /// Working directory for the `disk` store variant.
    #[arg(long, env = "STORE_DIR", default_value = "./gotv-data")]
    pub store_dir: String,

    /// Bucket name for the `blob` store variant; credentials come from the
    /// standard `AWS_*` environment variables.
    #[arg(long, env = "BLOB_BUCKET")]
    pub blob_bucket: Option<String>,
}
