use super::composer::{
    CollisionPolicy, ComposeError, ComposedSchema, ObjectDef, SchemaComposer, SchemaFragment, QUERY,
};
use super::{comments, posts, shows};

/// Schema served by the gateway, composed with collisions rejected.
pub fn build_schema() -> Result<ComposedSchema, ComposeError> {
    build_schema_with(CollisionPolicy::Reject)
}

pub fn build_schema_with(policy: CollisionPolicy) -> Result<ComposedSchema, ComposeError> {
    SchemaComposer::new(policy)
        .fragment(root_fragment())
        .fragment(shows::fragment())
        .fragment(posts::fragment())
        .fragment(comments::fragment())
        .resolvers(shows::resolvers())
        .resolvers(posts::resolvers())
        .resolvers(comments::resolvers())
        .compose()
}

/// Declares the query root that every feature module extends
fn root_fragment() -> SchemaFragment {
    SchemaFragment::new("root").object(ObjectDef::new(QUERY))
}
