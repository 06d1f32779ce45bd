#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]

use std::sync::Arc;

use clap::Parser;
use gotv_core::{BackingStore, Engine, MemoryStore};
use gotv_server::cli::{Config, StoreKind};
use gotv_server::routes;

fn build_store(config: &Config) -> anyhow::Result<Arc<dyn BackingStore>> {
    Ok(match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        #[cfg(feature = "disk-store")]
        StoreKind::Disk => Arc::new(gotv_core::DiskStore::new(config.store_dir.clone())),
        #[cfg(not(feature = "disk-store"))]
        StoreKind::Disk => anyhow::bail!("binary was built without the disk-store feature"),
        #[cfg(feature = "blob-store")]
        StoreKind::Blob => {
            let bucket = config
                .blob_bucket
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--blob-bucket is required for the blob store variant"))?;
            let s3 = object_store::aws::AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()?;
            Arc::new(gotv_core::BlobStore::new(Arc::new(s3), "matches"))
        }
        #[cfg(not(feature = "blob-store"))]
        StoreKind::Blob => anyhow::bail!("binary was built without the blob-store feature"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::init_tracing();
    common::init_metrics()?;

    let config = Config::parse();
    tracing::info!(addr = %config.addr, delay = config.delay, "starting gotv-server");

    let store = build_store(&config)?;
    let engine = Arc::new(Engine::new(store, config.auth.clone(), config.delay, config.keyframe_interval));

    let app = routes::router(engine);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
