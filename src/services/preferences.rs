//! Theme preference, the only value persisted across sessions

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn other(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredPreferences {
    theme: Theme,
}

pub struct ThemePreference {
    path: PathBuf,
    theme: watch::Sender<Theme>,
}

impl ThemePreference {
    /// Read the stored theme. A missing or unreadable file means light.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let theme = match read_theme(&path).await {
            Ok(Some(theme)) => theme,
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
                Theme::default()
            }
        };
        tracing::debug!("Theme: {}", theme.as_str());

        let (sender, _) = watch::channel(theme);
        Self { path, theme: sender }
    }

    pub fn theme(&self) -> Theme {
        *self.theme.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.theme.subscribe()
    }

    /// Switch theme and persist it
    pub async fn set_theme(&self, theme: Theme) -> AppResult<()> {
        self.theme.send_replace(theme);
        let contents = serde_json::to_vec_pretty(&StoredPreferences { theme })?;
        tokio::fs::write(&self.path, contents).await?;
        tracing::info!("Theme set to {}", theme.as_str());
        Ok(())
    }

    pub async fn toggle(&self) -> AppResult<Theme> {
        let theme = self.theme().other();
        self.set_theme(theme).await?;
        Ok(theme)
    }
}

async fn read_theme(path: &Path) -> AppResult<Option<Theme>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let stored: StoredPreferences = serde_json::from_slice(&bytes)?;
            Ok(Some(stored.theme))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
