pub mod client;
pub mod sync;
pub mod transport;

pub use client::ChatClient;
pub use sync::{Connectivity, PollOutcome, SyncConfig, SyncEngine, SyncState};
pub use transport::{HttpTransport, Transport};
