pub mod post;
pub mod source;

pub use post::{CanonicalPost, PostStatus, DEFAULT_CATEGORY};
pub use source::{AdapterKind, SourceDescriptor};
