pub mod signature;

pub use signature::{SignError, SignatureEngine, SignedPayload};
