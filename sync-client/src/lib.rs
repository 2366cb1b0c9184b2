//! # sync-client
//!
//! Sync engine for the picochat low-memory Matrix client.
//!
//! This is the library a device firmware or terminal driver embeds.
//!
//! ## Features
//!
//! - **Two-Phase Sync**: cheap token probe, then filtered incremental fetches
//! - **Bounded Decoding**: response bodies are streamed, never buffered whole
//! - **Admission Control**: cycles are skipped when free memory is low
//! - **Transport Abstraction**: Pluggable HTTP layer (ureq, mock)
//! - **Pure State Machines**: Uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use picochat_client::{ChatSession, ClientConfig, HttpTransport, SystemMemory};
//!
//! let config = ClientConfig::from_file("picochat.toml".as_ref())?;
//! let transport = HttpTransport::new(&config);
//! let mut session = ChatSession::new(&config, transport, SystemMemory::new());
//!
//! loop {
//!     let report = session.tick(now_ms(), poll_input());
//!     render(session.history());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod memory;
pub mod session;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use engine::{ClientError, CycleOutcome, SyncEngine};
pub use memory::{FixedMemory, MemoryProbe, SystemMemory};
pub use session::{ChatSession, Input, SendReport, TickReport, SUSPENDED_POLL_MS};
pub use transport::{HttpResponse, HttpTransport, MockTransport, Transport, TransportError};
