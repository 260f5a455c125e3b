use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use promolink::config::AppConfig;
use promolink::error::AppError;
use promolink::marketplace::{
    Clock, FileSystemObjectStore, InMemoryMarketplaceStore, InMemoryObjectStore,
    MarketplaceServices, NotificationHub, ObjectStore, PhotoStorage, StorageError,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Photo backend picked at startup: on disk when a root is configured, otherwise in memory.
pub(crate) enum PhotoBackend {
    Memory(InMemoryObjectStore),
    Disk(FileSystemObjectStore),
}

impl ObjectStore for PhotoBackend {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        match self {
            PhotoBackend::Memory(store) => store.put(path, bytes),
            PhotoBackend::Disk(store) => store.put(path, bytes),
        }
    }

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match self {
            PhotoBackend::Memory(store) => store.get(path),
            PhotoBackend::Disk(store) => store.get(path),
        }
    }

    fn remove(&self, path: &str) -> Result<bool, StorageError> {
        match self {
            PhotoBackend::Memory(store) => store.remove(path),
            PhotoBackend::Disk(store) => store.remove(path),
        }
    }
}

pub(crate) type ApiServices = MarketplaceServices<InMemoryMarketplaceStore, PhotoBackend>;

pub(crate) fn photo_backend(config: &AppConfig) -> Result<PhotoBackend, AppError> {
    match &config.storage.photo_root {
        Some(root) => {
            std::fs::create_dir_all(root)?;
            info!(root = %root.display(), "storing offer photos on disk");
            Ok(PhotoBackend::Disk(FileSystemObjectStore::new(root.clone())))
        }
        None => {
            info!("storing offer photos in memory");
            Ok(PhotoBackend::Memory(InMemoryObjectStore::new()))
        }
    }
}

pub(crate) fn build_services(
    config: &AppConfig,
    store: Arc<InMemoryMarketplaceStore>,
    clock: Arc<dyn Clock>,
) -> Result<ApiServices, AppError> {
    let photos = PhotoStorage::new(photo_backend(config)?, config.storage.public_base_url.clone());
    let hub = NotificationHub::new(config.notifications.channel_capacity);
    Ok(MarketplaceServices::new(store, clock, hub, photos)
        .with_page_size(config.notifications.page_size))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
