pub mod signature;

pub use signature::{notification_signature, verify_notification_signature};
