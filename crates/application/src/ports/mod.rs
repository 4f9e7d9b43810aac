//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the client core and its environment.
//! Each port is a trait that can be implemented by adapters in the
//! infrastructure layer or by the embedding application.

mod activity_source;
mod clock;
mod http_transport;
mod navigator;
mod session_hooks;
mod storage;
mod token_refresher;

pub use activity_source::{ActivityListener, ActivitySource, ListenerId, ListenerOptions};
pub use clock::Clock;
pub use http_transport::{HttpTransport, OutboundRequest, TransportError, TransportFuture};
pub use navigator::Navigator;
pub use session_hooks::SessionHooks;
pub use storage::{KeyValueStorage, StorageError};
pub use token_refresher::{RefreshError, RefreshGrant, TokenRefresher};
