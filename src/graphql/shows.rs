//! Shows, read through the upstream connector.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext, TypeRef};

use super::composer::{FieldDef, ObjectDef, ResolverMap, SchemaFragment, QUERY};
use super::context::RequestContext;
use super::errors::OperationExt;
use super::values;

pub const SHOW: &str = "Show";
pub const AKA: &str = "Aka";
pub const COUNTRY: &str = "Country";

pub fn fragment() -> SchemaFragment {
    SchemaFragment::new("shows")
        .object(
            ObjectDef::new(SHOW)
                .field(FieldDef::new("id", TypeRef::named(TypeRef::INT)))
                .field(FieldDef::new("name", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("type", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("language", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("genres", TypeRef::named_list(TypeRef::STRING)))
                .field(FieldDef::new("status", TypeRef::named(TypeRef::STRING)))
                .field(
                    FieldDef::new("runtime", TypeRef::named(TypeRef::INT))
                        .description("Episode length in minutes"),
                )
                .field(FieldDef::new("premiered", TypeRef::named(TypeRef::STRING)))
                .field(
                    FieldDef::new("akas", TypeRef::named_list(AKA))
                        .description("Alternative titles, fetched on demand"),
                ),
        )
        .object(
            ObjectDef::new(AKA)
                .field(FieldDef::new("name", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("country", TypeRef::named(COUNTRY))),
        )
        .object(
            ObjectDef::new(COUNTRY)
                .field(FieldDef::new("name", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("code", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("timezone", TypeRef::named(TypeRef::STRING))),
        )
        .object(
            ObjectDef::extend(QUERY)
                .field(FieldDef::new("shows", TypeRef::named_list(SHOW)))
                .field(
                    FieldDef::new("showById", TypeRef::named(SHOW))
                        .argument("id", TypeRef::named_nn(TypeRef::ID)),
                ),
        )
}

pub fn resolvers() -> ResolverMap {
    ResolverMap::new("shows")
        .field(QUERY, "shows", shows)
        .field(QUERY, "showById", show_by_id)
        .field(SHOW, "akas", show_akas)
}

fn shows(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let shows = RequestContext::of(&ctx)?
            .show_connector()
            .get_shows()
            .await
            .or_operation("find all shows")?;
        Ok(Some(values::list(&shows)?))
    })
}

fn show_by_id(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let id = values::id(&ctx, "id")?;
        let show = RequestContext::of(&ctx)?
            .show_connector()
            .get_show_by_id(&id)
            .await
            .or_operation("find show by id")?;
        Ok(Some(values::object(&show)?))
    })
}

fn show_akas(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let Some(id) = values::parent_id(&ctx, "id") else {
            return Ok(Some(FieldValue::list(Vec::<FieldValue>::new())));
        };

        let akas = RequestContext::of(&ctx)?
            .show_connector()
            .get_shows_akas(&id)
            .await
            .or_operation("find all akas")?;
        Ok(Some(values::list(&akas)?))
    })
}
