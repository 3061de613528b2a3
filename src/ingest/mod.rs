//! The ingest protocol (C10): transactional session state machine plus the
//! gRPC service wrapper around it.

pub mod convert;
pub mod proto;
pub mod server;
pub mod session;

pub use server::IngestServer;
pub use session::{IngestSession, PushBatch};
