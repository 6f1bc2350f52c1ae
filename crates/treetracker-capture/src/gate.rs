//! Authentication gate in front of the capture session
//!
//! The gate owns the [`SessionContext`] and the [`CaptureSession`]. Capture
//! operations are only reachable while the context is authenticated, and a
//! logout tears down both.

use std::sync::Arc;

use anyhow::Result;

use treetracker_core::{IdentityError, IdentityProvider, SessionContext, TokenSet, TokenStore};

use crate::session::CaptureSession;

/// Messages that change the authentication state
#[derive(Debug, Clone, PartialEq)]
pub enum GateMessage {
    /// Tokens obtained from the identity service. `remember` selects the
    /// persistent store over the session store.
    SignedIn { tokens: TokenSet, remember: bool },
    Logout,
}

/// Screens the gate can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Register,
    Upload,
}

/// Route a path the way the app does: unauthenticated visitors only see the
/// login and registration pages, authenticated ones only the upload page.
pub fn resolve_page(path: &str, authenticated: bool) -> Page {
    if authenticated {
        return Page::Upload;
    }
    match path.trim_end_matches('/') {
        "/register" => Page::Register,
        _ => Page::Login,
    }
}

pub struct SessionGate {
    context: SessionContext,
    persistent: Arc<dyn TokenStore>,
    session: Arc<dyn TokenStore>,
    capture: CaptureSession,
}

impl SessionGate {
    pub fn new(
        context: SessionContext,
        persistent: Arc<dyn TokenStore>,
        session: Arc<dyn TokenStore>,
        capture: CaptureSession,
    ) -> Self {
        Self {
            context,
            persistent,
            session,
            capture,
        }
    }

    /// Build a gate from whatever tokens the stores hold.
    ///
    /// The persistent store is consulted first. A store that cannot be read
    /// or holds an expired token leaves the gate anonymous.
    pub fn restore(
        persistent: Arc<dyn TokenStore>,
        session: Arc<dyn TokenStore>,
        capture: CaptureSession,
    ) -> Self {
        let context = match load_first(&[persistent.as_ref(), session.as_ref()]) {
            Some(tokens) if tokens.is_valid() => {
                tracing::debug!("Restored stored session");
                SessionContext::authenticated(tokens)
            }
            Some(_) => {
                tracing::debug!("Stored token is not valid, starting anonymous");
                SessionContext::anonymous()
            }
            None => SessionContext::anonymous(),
        };
        Self::new(context, persistent, session, capture)
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn is_authenticated(&self) -> bool {
        self.context.is_authenticated()
    }

    pub fn page(&self, path: &str) -> Page {
        resolve_page(path, self.is_authenticated())
    }

    pub fn capture(&self) -> Option<&CaptureSession> {
        self.is_authenticated().then_some(&self.capture)
    }

    pub fn capture_mut(&mut self) -> Option<&mut CaptureSession> {
        if self.is_authenticated() {
            Some(&mut self.capture)
        } else {
            None
        }
    }

    pub fn handle(&mut self, message: GateMessage) -> Result<()> {
        match message {
            GateMessage::SignedIn { tokens, remember } => self.sign_in(tokens, remember),
            GateMessage::Logout => {
                self.logout();
                Ok(())
            }
        }
    }

    /// Accept tokens and persist them in the chosen store.
    pub fn sign_in(&mut self, tokens: TokenSet, remember: bool) -> Result<()> {
        if !tokens.is_valid() {
            anyhow::bail!("Identity service returned an unusable token");
        }

        let store = if remember {
            &self.persistent
        } else {
            &self.session
        };
        store.save(&tokens)?;

        tracing::info!(
            remember,
            expires_in = tokens.expires_in,
            "Signed in"
        );
        self.context = SessionContext::authenticated(tokens);
        Ok(())
    }

    /// Authenticate with the identity service and sign in with the result.
    pub async fn login(
        &mut self,
        identity: &dyn IdentityProvider,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<(), IdentityError> {
        let tokens = identity.authenticate(username, password).await?;
        self.sign_in(tokens, remember)
            .map_err(|e| IdentityError::LoginFailed(e.to_string()))
    }

    /// Clear stored tokens, the context, and any capture in progress.
    pub fn logout(&mut self) {
        for store in [&self.persistent, &self.session] {
            if let Err(e) = store.clear() {
                tracing::warn!(error = %e, "Failed to clear stored token");
            }
        }
        self.context.clear();
        self.capture.reset();
        tracing::info!("Logged out");
    }
}

fn load_first(stores: &[&dyn TokenStore]) -> Option<TokenSet> {
    for store in stores {
        match store.load() {
            Ok(Some(tokens)) => return Some(tokens),
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "Stored token could not be read, treating as signed out");
                return None;
            }
        }
    }
    None
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("authenticated", &self.is_authenticated())
            .field("capture", &self.capture)
            .finish()
    }
}
