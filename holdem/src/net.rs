//! Wire format for the client event boundary.

/// JSON events exchanged with clients.
pub mod messages;
