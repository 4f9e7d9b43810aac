//! Navigation port

/// Navigation side effects owned by the embedding application.
pub trait Navigator: Send + Sync {
    /// The location currently shown, e.g. `/dashboard`.
    fn current_location(&self) -> String;

    /// Leaves the current location for the login destination.
    fn navigate_to_login(&self);
}
