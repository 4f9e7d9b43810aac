//! Terminal implementations of the navigation and session hook ports.

use std::time::Duration;

use gatekeep_application::AuthSession;
use gatekeep_application::ports::{Navigator, SessionHooks};
use parking_lot::Mutex;
use tracing::info;

/// Location shown while signed in.
pub const HOME: &str = "/";

/// Tracks a virtual location and tells the user when they are sent to login.
#[derive(Debug)]
pub struct TerminalNavigator {
    location: Mutex<String>,
    login_path: String,
}

impl TerminalNavigator {
    /// Creates a navigator at [`HOME`].
    #[must_use]
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(HOME.to_string()),
            login_path: login_path.into(),
        }
    }

    /// Records that the user is signed in again.
    pub fn go_home(&self) {
        *self.location.lock() = HOME.to_string();
    }
}

impl Navigator for TerminalNavigator {
    fn current_location(&self) -> String {
        self.location.lock().clone()
    }

    fn navigate_to_login(&self) {
        self.location.lock().clone_from(&self.login_path);
        println!("You are signed out. Use 'login <username> <password>' to continue.");
    }
}

/// Prints the idle warning and signs out on expiry.
#[derive(Debug)]
pub struct TerminalHooks {
    auth: AuthSession,
}

impl TerminalHooks {
    /// Creates hooks signing out through `auth`.
    #[must_use]
    pub const fn new(auth: AuthSession) -> Self {
        Self { auth }
    }
}

impl SessionHooks for TerminalHooks {
    fn on_show_idle_warning(&self, remaining: Duration) {
        println!(
            "\nStill there? Your session expires in {}s unless you enter a command.",
            remaining.as_secs()
        );
    }

    fn on_session_expired(&self) {
        info!("idle session expired");
        println!("\nYour session expired after a period of inactivity.");
        self.auth.expire();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_navigator_tracks_location() {
        let navigator = TerminalNavigator::new("/login");
        assert_eq!(navigator.current_location(), HOME);

        navigator.navigate_to_login();
        assert_eq!(navigator.current_location(), "/login");

        navigator.go_home();
        assert_eq!(navigator.current_location(), HOME);
    }
}
