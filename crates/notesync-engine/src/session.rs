//! Login, logout and session restore.

use notesync_core::defaults::settings::{
    AUTO_LOGIN, CURRENT_CATEGORY, PASSWORD, TOKEN, URL, USER_ID,
};
use notesync_core::{Credentials, Error, LoginResult, Result, SyncEvent};
use serde_json::{json, Map};
use tracing::{info, instrument, warn};

use crate::NoteSync;

/// How credentials are remembered after a successful login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginOptions {
    /// Persist the password for later auto-login.
    pub remember_password: bool,
    /// The account server URL is user-supplied and should be remembered.
    pub self_hosted: bool,
}

impl NoteSync {
    /// Restore the persisted selection and log in automatically when
    /// `autoLogin` is set. Returns the login result when one happened.
    pub async fn init_from_store(&self) -> Result<Option<LoginResult>> {
        let current = self
            .settings
            .get_string(CURRENT_CATEGORY)?
            .unwrap_or_default();
        self.state.write().current_category = current;
        // Tokens from a previous run are never reused.
        self.settings.remove(TOKEN)?;

        let auto_login = self
            .settings
            .get(AUTO_LOGIN)?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !auto_login {
            return Ok(None);
        }

        let credentials = self.stored_credentials()?;
        let opts = LoginOptions {
            remember_password: true,
            self_hosted: credentials.url.is_some(),
        };
        self.login(&credentials, opts).await.map(Some)
    }

    /// Log in, remember the credentials as `opts` asks, and load the tag
    /// list, category tree and listing of the new session.
    #[instrument(skip(self, credentials), fields(subsystem = "session", op = "login", user_id = %credentials.user_id))]
    pub async fn login(&self, credentials: &Credentials, opts: LoginOptions) -> Result<LoginResult> {
        let result = self.account.login(credentials).await?;

        let mut items = Map::new();
        items.insert(USER_ID.to_string(), json!(credentials.user_id));
        if let Some(url) = credentials.url.as_deref().filter(|u| !u.is_empty()) {
            items.insert(URL.to_string(), json!(url));
        }
        if opts.remember_password {
            items.insert(PASSWORD.to_string(), json!(credentials.password));
        } else if self.settings.contains(PASSWORD)? {
            self.settings.remove(PASSWORD)?;
        }
        self.settings.set_many(items)?;
        if !opts.self_hosted && self.settings.contains(URL)? {
            self.settings.remove(URL)?;
        }

        {
            let mut state = self.state.write();
            state.kb_guid = Some(result.kb_guid.clone());
            state.user_id = Some(credentials.user_id.clone());
        }
        info!(kb_guid = %result.kb_guid, "Session established");
        self.emit(SyncEvent::LoggedIn {
            user_id: credentials.user_id.clone(),
        });

        self.refresh_tags().await?;
        if let Err(e) = self.refresh_categories().await {
            warn!(error = %e, "Category refresh after login failed");
        }
        if let Err(e) = self.refresh_listing().await {
            warn!(error = %e, "Listing refresh after login failed");
        }
        Ok(result)
    }

    /// Close the session. The persisted selection survives.
    #[instrument(skip(self), fields(subsystem = "session", op = "logout"))]
    pub async fn logout(&self) -> Result<()> {
        self.account.logout().await?;
        self.settings.remove(TOKEN)?;
        {
            let mut state = self.state.write();
            let current_category = std::mem::take(&mut state.current_category);
            *state = Default::default();
            state.current_category = current_category;
        }
        info!("Logged out");
        self.events.emit(SyncEvent::LoggedOut);
        Ok(())
    }

    /// Log in again with the stored credentials.
    pub async fn re_login(&self) -> Result<LoginResult> {
        let credentials = self.stored_credentials()?;
        let opts = LoginOptions {
            remember_password: true,
            self_hosted: credentials.url.is_some(),
        };
        self.login(&credentials, opts).await
    }

    fn stored_credentials(&self) -> Result<Credentials> {
        let values = self.settings.get_many(&[USER_ID, PASSWORD, URL])?;
        let as_string = |i: usize| {
            values
                .get(i)
                .and_then(Option::as_ref)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        match (as_string(0), as_string(1)) {
            (Some(user_id), Some(password)) => Ok(Credentials {
                user_id,
                password,
                url: as_string(2),
            }),
            _ => Err(Error::Config("no stored credentials".to_string())),
        }
    }
}
