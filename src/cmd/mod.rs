//! CLI command implementations.
//!
//! | Module     | Commands handled                                  |
//! |------------|---------------------------------------------------|
//! | `session`  | `Login`, `Signup`, `Logout`, `Whoami`, `Users`    |
//! | `projects` | `Projects`, `CreateProject`, `Board`, `Stats`     |
//! | `config`   | `Config`                                          |

pub mod config;
pub mod projects;
pub mod session;

pub use config::cmd_config;
pub use projects::{cmd_board, cmd_create_project, cmd_projects, cmd_stats};
pub use session::{cmd_login, cmd_logout, cmd_signup, cmd_users, cmd_whoami};

use std::sync::Arc;

use anyhow::{Context, Result};
use taskboard::board::models::User;
use taskboard::board::token::{FileTokenStore, TokenStore};
use taskboard::board::{HttpApiClient, ProjectStore, RemoteApi, SessionStore};
use taskboard::config::ClientConfig;

/// Session and project store wired to the configured backend.
pub struct Client {
    pub session: SessionStore,
    pub store: ProjectStore,
}

impl Client {
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.session_file));
        let api: Arc<dyn RemoteApi> = Arc::new(
            HttpApiClient::new(&config.api_url, config.timeout, tokens.clone())
                .context("Failed to build API client")?,
        );
        Ok(Self {
            session: SessionStore::new(api.clone(), tokens),
            store: ProjectStore::new(api),
        })
    }

    /// Restore the persisted session or fail with a hint to log in.
    pub async fn require_user(&self) -> Result<User> {
        self.session
            .restore()
            .await
            .context("Failed to restore session")?
            .context("Not logged in. Run `taskboard login` first.")
    }
}
