//! Client-side state services

pub mod library;
pub mod notifications;
pub mod preferences;
pub mod search;

use std::sync::Arc;

use crate::{config::AppConfig, remote::RemoteLibrary};

pub use library::{LibraryStore, LibraryView, PendingMove};
pub use notifications::{Notification, NotificationLevel, Notifier};
pub use preferences::{Theme, ThemePreference};
pub use search::{SearchController, SearchState};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub notifier: Notifier,
    pub library: LibraryStore,
    pub search: SearchController,
    pub theme: Arc<ThemePreference>,
}

impl Services {
    /// Create all services around the given remote library
    pub async fn new(remote: Arc<dyn RemoteLibrary>, config: &AppConfig) -> Self {
        let notifier = Notifier::new();
        Self {
            library: LibraryStore::new(remote.clone(), notifier.clone()),
            search: SearchController::new(remote, config.search.debounce()),
            theme: Arc::new(ThemePreference::load(config.preferences.path.clone()).await),
            notifier,
        }
    }
}
