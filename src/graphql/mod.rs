pub mod comments;
pub mod composer;
pub mod context;
pub mod errors;
pub mod posts;
pub mod schema;
pub mod shows;
pub mod values;

pub use composer::{CollisionPolicy, ComposeError, ComposedSchema};
pub use context::{ContextFactory, RequestContext};
pub use schema::*;
