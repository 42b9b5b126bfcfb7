//! Bot entry point.
//!
//! Wires the shared collaborators together and runs three concurrent
//! pieces: the liveness endpoint, the Telegram update loop, and the
//! scan loop. Ctrl+C shuts everything down.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drive_module_watcher::prelude::*;
use drive_module_watcher::run_scan_loop;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("drive_module_watcher=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    let drive = Arc::new(DriveClient::new(&config.google_api_key)?);
    let cache = Arc::new(SwrCache::new(drive, config.cache_ttl));
    let telegram = Arc::new(TelegramClient::new(&config.bot_token)?);
    let store = Arc::new(StateStore::load(&config.state_path));

    let topics = TopicIndex::new(Arc::clone(&cache), config.root_folder_id.clone());
    let scanner = ChangeScanner::new(Arc::clone(&cache) as Arc<dyn Lister>, config.max_scan_depth);
    let notifier = Notifier::new(
        Arc::clone(&telegram) as Arc<dyn MessageSender>,
        Arc::clone(&store),
        config.broadcast_chat_id,
    );

    let (cycle, mut scan_updates) = ScanCycle::new(
        topics.clone(),
        scanner,
        Arc::clone(&store),
        notifier,
        config.min_module_key,
        config.max_notify_per_cycle,
    );

    let mut health = HealthServer::start(config.health_port).await?;
    tracing::info!("liveness endpoint on {}", health.addr());

    // Log per-module scan summaries as they arrive.
    tokio::spawn(async move {
        while let Ok(update) = scan_updates.recv().await {
            tracing::info!(
                module = update.topic.key,
                new = update.new_items.len(),
                scanned = update.scanned,
                "scanned {}",
                update.topic.name
            );
        }
    });

    let handler = Arc::new(BotHandler::new(
        telegram,
        cache,
        topics,
        store,
        config.root_folder_id.clone(),
        config.broadcast_chat_id,
        config.page_size,
    ));
    tokio::spawn(Arc::clone(&handler).run());

    tokio::spawn(run_scan_loop(cycle, config.scan_interval));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    health.shutdown();

    Ok(())
}
