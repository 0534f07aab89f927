//! Posts: listing, lookup, mutations and the cross-entity text search.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext, TypeRef};

use super::comments::COMMENT;
use super::composer::{
    FieldDef, InputDef, ObjectDef, ResolverMap, SchemaFragment, UnionDef, MUTATION, QUERY,
};
use super::context::RequestContext;
use super::errors::OperationExt;
use super::values::{self, NOT_FOUND_TYPE};
use crate::storage::{CommentFilter, PostDraft, PostFilter, PostPatch};

pub const POST: &str = "Post";
pub const POST_LOOKUP: &str = "PostLookup";
pub const SEARCH_RESULT: &str = "SearchResult";

pub fn fragment() -> SchemaFragment {
    SchemaFragment::new("posts")
        .object(
            ObjectDef::new(POST)
                .description("A blog post")
                .field(FieldDef::new("id", TypeRef::named(TypeRef::ID)))
                .field(FieldDef::new("author", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("email", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("title", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("body", TypeRef::named(TypeRef::STRING)))
                .field(
                    FieldDef::new("createdAt", TypeRef::named(TypeRef::STRING))
                        .description("RFC 3339 creation timestamp"),
                ),
        )
        .object(
            ObjectDef::new(NOT_FOUND_TYPE)
                .description("Returned in place of a document that does not exist")
                .field(FieldDef::new("failed", TypeRef::named_nn(TypeRef::BOOLEAN)))
                .field(FieldDef::new("message", TypeRef::named_nn(TypeRef::STRING))),
        )
        .union(UnionDef::new(POST_LOOKUP).member(POST).member(NOT_FOUND_TYPE))
        .union(UnionDef::new(SEARCH_RESULT).member(POST))
        .input(
            InputDef::new("PostInput")
                .field("author", TypeRef::named_nn(TypeRef::STRING))
                .field("email", TypeRef::named(TypeRef::STRING))
                .field("title", TypeRef::named_nn(TypeRef::STRING))
                .field("body", TypeRef::named_nn(TypeRef::STRING)),
        )
        .input(
            InputDef::new("PostEditInput")
                .description("Fields left out keep their stored values")
                .field("author", TypeRef::named(TypeRef::STRING))
                .field("email", TypeRef::named(TypeRef::STRING))
                .field("title", TypeRef::named(TypeRef::STRING))
                .field("body", TypeRef::named(TypeRef::STRING)),
        )
        .object(
            ObjectDef::extend(QUERY)
                .field(FieldDef::new("posts", TypeRef::named_list(POST)))
                .field(
                    FieldDef::new("search", TypeRef::named_list(SEARCH_RESULT))
                        .argument("search", TypeRef::named_nn(TypeRef::STRING))
                        .description("Posts, then comments, whose body contains the text"),
                )
                .field(
                    FieldDef::new("postById", TypeRef::named(POST_LOOKUP))
                        .argument("id", TypeRef::named_nn(TypeRef::ID)),
                ),
        )
        .object(
            ObjectDef::new(MUTATION)
                .field(
                    FieldDef::new("postAdd", TypeRef::named(POST))
                        .argument("data", TypeRef::named_nn("PostInput")),
                )
                .field(
                    FieldDef::new("postEdit", TypeRef::named(POST_LOOKUP))
                        .argument("id", TypeRef::named_nn(TypeRef::ID))
                        .argument("data", TypeRef::named_nn("PostEditInput")),
                )
                .field(
                    FieldDef::new("postDelete", TypeRef::named(POST_LOOKUP))
                        .argument("id", TypeRef::named_nn(TypeRef::ID)),
                ),
        )
}

pub fn resolvers() -> ResolverMap {
    ResolverMap::new("posts")
        .field(QUERY, "posts", posts)
        .field(QUERY, "search", search)
        .field(QUERY, "postById", post_by_id)
        .field(MUTATION, "postAdd", post_add)
        .field(MUTATION, "postEdit", post_edit)
        .field(MUTATION, "postDelete", post_delete)
}

fn posts(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let posts = RequestContext::of(&ctx)?
            .post_storage()
            .find(PostFilter::default())
            .await
            .or_operation("find all posts")?;
        Ok(Some(values::list(&posts)?))
    })
}

fn search(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let request = RequestContext::of(&ctx)?;
        let needle = ctx.args.try_get("search")?.string()?.to_string();

        let (posts, comments) = tokio::try_join!(
            request
                .post_storage()
                .find(PostFilter::body_contains(needle.as_str())),
            request
                .comment_storage()
                .find(CommentFilter::body_contains(needle.as_str())),
        )
        .or_operation("search comments and posts")?;

        let mut results = Vec::with_capacity(posts.len() + comments.len());
        for post in &posts {
            results.push(values::typed(post, POST)?);
        }
        for comment in &comments {
            results.push(values::typed(comment, COMMENT)?);
        }
        Ok(Some(FieldValue::list(results)))
    })
}

fn post_by_id(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let id = values::id(&ctx, "id")?;
        let post = RequestContext::of(&ctx)?
            .post_storage()
            .find_by_id(&id)
            .await
            .or_operation("find post by id")?;
        Ok(Some(values::lookup(&post, POST)?))
    })
}

fn post_add(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let draft: PostDraft = values::input(&ctx, "data")?;
        let post = RequestContext::of(&ctx)?
            .post_storage()
            .save(draft)
            .await
            .or_operation("save post")?;
        Ok(Some(values::object(&post)?))
    })
}

fn post_edit(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let id = values::id(&ctx, "id")?;
        let patch: PostPatch = values::input(&ctx, "data")?;
        let post = RequestContext::of(&ctx)?
            .post_storage()
            .update(&id, patch)
            .await
            .or_operation("update post")?;
        Ok(Some(values::lookup(&post, POST)?))
    })
}

fn post_delete(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let id = values::id(&ctx, "id")?;
        let post = RequestContext::of(&ctx)?
            .post_storage()
            .delete(&id)
            .await
            .or_operation("delete post")?;
        Ok(Some(values::lookup(&post, POST)?))
    })
}
