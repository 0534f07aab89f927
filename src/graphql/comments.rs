//! Comments: listing, the `Post.comments` / `Comment.post` links and the
//! `commentAdd` subscription.

use async_graphql::dynamic::{
    FieldFuture, FieldValue, ResolverContext, SubscriptionFieldFuture, TypeRef,
};
use futures_util::stream;

use super::composer::{
    FieldDef, InputDef, ObjectDef, ResolverMap, SchemaFragment, UnionDef, QUERY, SUBSCRIPTION,
};
use super::context::RequestContext;
use super::errors::OperationExt;
use super::posts::{POST, SEARCH_RESULT};
use super::values;
use crate::errors::Lookup;
use crate::storage::{CommentDraft, CommentFilter};

pub const COMMENT: &str = "Comment";

pub fn fragment() -> SchemaFragment {
    SchemaFragment::new("comments")
        .object(
            ObjectDef::new(COMMENT)
                .field(FieldDef::new("id", TypeRef::named(TypeRef::ID)))
                .field(
                    FieldDef::new("post", TypeRef::named(POST))
                        .description("Commented post; empty when it no longer exists"),
                )
                .field(FieldDef::new("name", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("email", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("body", TypeRef::named(TypeRef::STRING)))
                .field(FieldDef::new("createdAt", TypeRef::named(TypeRef::STRING))),
        )
        .input(
            InputDef::new("CommentInput")
                .field("postId", TypeRef::named_nn(TypeRef::ID))
                .field("name", TypeRef::named_nn(TypeRef::STRING))
                .field("email", TypeRef::named_nn(TypeRef::STRING))
                .field("body", TypeRef::named_nn(TypeRef::STRING)),
        )
        .object(
            ObjectDef::extend(POST).field(FieldDef::new("comments", TypeRef::named_list(COMMENT))),
        )
        .union(UnionDef::extend(SEARCH_RESULT).member(COMMENT))
        .object(
            ObjectDef::extend(QUERY)
                .field(FieldDef::new("comments", TypeRef::named_list(COMMENT))),
        )
        .object(
            ObjectDef::new(SUBSCRIPTION).field(
                FieldDef::new("commentAdd", TypeRef::named(COMMENT))
                    .argument("data", TypeRef::named_nn("CommentInput"))
                    .description("Save a comment and receive it once stored"),
            ),
        )
}

pub fn resolvers() -> ResolverMap {
    ResolverMap::new("comments")
        .field(QUERY, "comments", comments)
        .field(COMMENT, "post", comment_post)
        .field(POST, "comments", post_comments)
        .subscription(SUBSCRIPTION, "commentAdd", comment_add)
}

fn comments(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let comments = RequestContext::of(&ctx)?
            .comment_storage()
            .find(CommentFilter::default())
            .await
            .or_operation("find all comment")?;
        Ok(Some(values::list(&comments)?))
    })
}

fn comment_post(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let Some(post_id) = values::parent_id(&ctx, "postId") else {
            return Ok(Some(values::empty_object()));
        };

        let post = RequestContext::of(&ctx)?
            .post_storage()
            .find_by_id(&post_id)
            .await
            .or_operation("find post")?;
        match post {
            Lookup::Found(post) => Ok(Some(values::object(&post)?)),
            Lookup::NotFound(_) => Ok(Some(values::empty_object())),
        }
    })
}

fn post_comments(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let Some(post_id) = values::parent_id(&ctx, "id") else {
            return Ok(Some(FieldValue::list(Vec::<FieldValue>::new())));
        };

        let comments = RequestContext::of(&ctx)?
            .comment_storage()
            .find(CommentFilter::for_post(post_id))
            .await
            .or_operation("find comments")?;
        Ok(Some(values::list(&comments)?))
    })
}

fn comment_add(ctx: ResolverContext<'_>) -> SubscriptionFieldFuture<'_> {
    SubscriptionFieldFuture::new(async move {
        let draft: CommentDraft = values::input(&ctx, "data")?;
        let comment = RequestContext::of(&ctx)?
            .comment_storage()
            .save(draft)
            .await
            .or_operation("save comment")?;

        let comment = values::object(&comment)?;
        Ok(stream::once(async move {
            Ok::<_, async_graphql::Error>(comment)
        }))
    })
}
