//! Authorization hooks: who is calling, and what they may do.

pub mod authorizer;
pub mod capability;
pub mod directory;
pub mod principal;

pub use authorizer::{Authorizer, CapabilityAuthorizer};
pub use capability::{Capability, Role};
pub use directory::{DirectoryError, PrincipalDirectory};
pub use principal::Principal;
