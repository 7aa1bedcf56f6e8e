//! # kaos_state
//!
//! Persistence for the provisioned backend's connection state.
//!
//! Holds the backend URL, user and auth token plus the cluster access
//! credential, and knows where Terraform drops its generated artifacts so a
//! teardown can remove everything in one pass.

pub mod error;
pub mod state;

pub use error::{StateError, StateResult};
pub use state::{StatePaths, StateService, BACKEND, INFRASTRUCTURE};
