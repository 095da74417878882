mod errors;
mod invalidation;
mod link;

pub use errors::SignedLinkError;
pub use invalidation::{DriverInvalidationSet, InvalidationSet};
pub use link::{EXPIRES_PARAM, SIGNATURE_PARAM, SignedLink, VerifiedLink};
