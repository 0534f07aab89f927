//! Composition of independently authored schema fragments and resolver maps
//! into one executable schema.
//!
//! Feature modules describe their types with [`SchemaFragment`] (the
//! equivalent of `type X { .. }` / `extend type X { .. }` documents) and the
//! behaviour of their fields with a [`ResolverMap`] keyed by type name, then
//! field name. [`SchemaComposer`] merges all of them and binds every field to
//! its resolver, falling back to a property read on the parent value for
//! fields nobody resolves explicitly.
//!
//! Two modules claiming the same type or field are handled according to the
//! [`CollisionPolicy`]. Startup uses [`CollisionPolicy::Reject`], so
//! ownership of every field must be disjoint across modules.

use std::sync::Arc;

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Object, ResolverContext, Schema,
    Subscription, SubscriptionField, SubscriptionFieldFuture, TypeRef, Union,
};
use async_graphql::Value;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

pub const QUERY: &str = "Query";
pub const MUTATION: &str = "Mutation";
pub const SUBSCRIPTION: &str = "Subscription";

/// Executable result of composition; `sdl()` exports the merged schema.
pub type ComposedSchema = Schema;

pub type FieldResolver =
    Arc<dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync>;

pub type SubscriptionResolver =
    Arc<dyn for<'a> Fn(ResolverContext<'a>) -> SubscriptionFieldFuture<'a> + Send + Sync>;

/// What happens when two modules define the same type or field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Fail composition, naming both owners
    #[default]
    Reject,
    /// The module merged later silently replaces the earlier definition
    LastWriteWins,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ComposeError {
    #[error("type '{type_name}' is declared by both '{first}' and '{second}'")]
    DuplicateType {
        type_name: String,
        first: String,
        second: String,
    },

    #[error("field '{type_name}.{field}' is defined by both '{first}' and '{second}'")]
    FieldCollision {
        type_name: String,
        field: String,
        first: String,
        second: String,
    },

    #[error("resolver for '{type_name}.{field}' is provided by both '{first}' and '{second}'")]
    ResolverCollision {
        type_name: String,
        field: String,
        first: String,
        second: String,
    },

    #[error("type '{type_name}' is defined with conflicting kinds")]
    KindMismatch { type_name: String },

    #[error("'{fragment}' extends type '{type_name}', which is never declared")]
    UndeclaredType { type_name: String, fragment: String },

    #[error("resolver '{type_name}.{field}' from '{map}' does not match any declared field")]
    OrphanResolver {
        type_name: String,
        field: String,
        map: String,
    },

    #[error("resolver for '{type_name}.{field}' has the wrong kind for its type")]
    ResolverKind { type_name: String, field: String },

    #[error("subscription field '{field}' has no resolver")]
    MissingSubscriptionResolver { field: String },

    #[error("no fragment declares the 'Query' root type")]
    MissingQuery,

    #[error("schema rejected: {0}")]
    Schema(String),
}

/// Argument of a field, or field of an input object.
#[derive(Clone, Debug)]
pub struct ArgDef {
    name: String,
    ty: TypeRef,
    description: Option<String>,
}

impl ArgDef {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn into_input_value(self) -> InputValue {
        let input = InputValue::new(self.name, self.ty);
        match self.description {
            Some(description) => input.description(description),
            None => input,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDef {
    name: String,
    ty: TypeRef,
    args: Vec<ArgDef>,
    description: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            args: Vec::new(),
            description: None,
        }
    }

    pub fn argument(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.args.push(ArgDef::new(name, ty));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// `type Name { .. }` or `extend type Name { .. }`.
#[derive(Clone, Debug)]
pub struct ObjectDef {
    name: String,
    description: Option<String>,
    fields: Vec<FieldDef>,
    extension: bool,
}

impl ObjectDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            extension: false,
        }
    }

    pub fn extend(name: impl Into<String>) -> Self {
        Self {
            extension: true,
            ..Self::new(name)
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct InputDef {
    name: String,
    description: Option<String>,
    fields: Vec<ArgDef>,
}

impl InputDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.fields.push(ArgDef::new(name, ty));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// `union Name = A | B`, or `extend union Name = C`.
#[derive(Clone, Debug)]
pub struct UnionDef {
    name: String,
    description: Option<String>,
    members: Vec<String>,
    extension: bool,
}

impl UnionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            members: Vec::new(),
            extension: false,
        }
    }

    pub fn extend(name: impl Into<String>) -> Self {
        Self {
            extension: true,
            ..Self::new(name)
        }
    }

    pub fn member(mut self, type_name: impl Into<String>) -> Self {
        self.members.push(type_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug)]
pub enum TypeDef {
    Object(ObjectDef),
    Input(InputDef),
    Union(UnionDef),
}

impl TypeDef {
    fn name(&self) -> &str {
        match self {
            TypeDef::Object(def) => &def.name,
            TypeDef::Input(def) => &def.name,
            TypeDef::Union(def) => &def.name,
        }
    }
}

/// Named, self-contained set of type definitions owned by one feature module.
#[derive(Clone, Debug)]
pub struct SchemaFragment {
    name: String,
    defs: Vec<TypeDef>,
}

impl SchemaFragment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defs: Vec::new(),
        }
    }

    pub fn object(mut self, def: ObjectDef) -> Self {
        self.defs.push(TypeDef::Object(def));
        self
    }

    pub fn input(mut self, def: InputDef) -> Self {
        self.defs.push(TypeDef::Input(def));
        self
    }

    pub fn union(mut self, def: UnionDef) -> Self {
        self.defs.push(TypeDef::Union(def));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone)]
pub enum Resolver {
    Field(FieldResolver),
    Subscription(SubscriptionResolver),
}

/// Field implementations of one feature module, keyed by type then field.
#[derive(Clone)]
pub struct ResolverMap {
    name: String,
    types: IndexMap<String, IndexMap<String, Resolver>>,
}

impl ResolverMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: IndexMap::new(),
        }
    }

    pub fn field<F>(self, type_name: &str, field: &str, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        self.insert(type_name, field, Resolver::Field(Arc::new(resolver)))
    }

    pub fn subscription<F>(self, type_name: &str, field: &str, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> SubscriptionFieldFuture<'a> + Send + Sync + 'static,
    {
        self.insert(type_name, field, Resolver::Subscription(Arc::new(resolver)))
    }

    fn insert(mut self, type_name: &str, field: &str, resolver: Resolver) -> Self {
        self.types
            .entry(type_name.to_string())
            .or_default()
            .insert(field.to_string(), resolver);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Owned<T> {
    value: T,
    owner: String,
}

struct MergedObject {
    declared_by: Option<String>,
    first_extender: String,
    description: Option<String>,
    fields: IndexMap<String, Owned<FieldDef>>,
}

struct MergedUnion {
    declared_by: Option<String>,
    first_extender: String,
    description: Option<String>,
    members: Vec<String>,
}

enum MergedType {
    Object(MergedObject),
    Input(Owned<InputDef>),
    Union(MergedUnion),
}

/// Accumulates fragments and resolver maps, then builds the schema.
pub struct SchemaComposer {
    policy: CollisionPolicy,
    fragments: Vec<SchemaFragment>,
    resolvers: Vec<ResolverMap>,
}

impl SchemaComposer {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            fragments: Vec::new(),
            resolvers: Vec::new(),
        }
    }

    pub fn fragment(mut self, fragment: SchemaFragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    pub fn resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.resolvers.push(resolvers);
        self
    }

    pub fn compose(self) -> Result<ComposedSchema, ComposeError> {
        let policy = self.policy;
        let types = merge_type_defs(self.fragments, policy)?;
        let mut resolvers = merge_resolver_maps(self.resolvers, policy)?;

        if !types.contains_key(QUERY) {
            return Err(ComposeError::MissingQuery);
        }
        let mutation = types.contains_key(MUTATION).then_some(MUTATION);
        let subscription = types.contains_key(SUBSCRIPTION).then_some(SUBSCRIPTION);

        let mut builder = Schema::build(QUERY, mutation, subscription);
        for (type_name, merged) in types {
            let mut owned = resolvers.shift_remove(&type_name).unwrap_or_default();
            builder = match merged {
                MergedType::Object(object) if type_name == SUBSCRIPTION => {
                    builder.register(bind_subscription(object, &mut owned)?)
                }
                MergedType::Object(object) => {
                    builder.register(bind_object(&type_name, object, &mut owned)?)
                }
                MergedType::Input(input) => builder.register(build_input(&type_name, input.value)),
                MergedType::Union(union) => builder.register(build_union(&type_name, union)),
            };

            if let Some((field, resolver)) = owned.into_iter().next() {
                return Err(ComposeError::OrphanResolver {
                    type_name,
                    field,
                    map: resolver.owner,
                });
            }
        }

        // Resolvers aimed at types nobody declared
        if let Some((type_name, fields)) = resolvers.into_iter().next() {
            let (field, map) = fields
                .into_iter()
                .next()
                .map(|(field, resolver)| (field, resolver.owner))
                .unwrap_or_default();
            return Err(ComposeError::OrphanResolver {
                type_name,
                field,
                map,
            });
        }

        builder
            .finish()
            .map_err(|err| ComposeError::Schema(err.to_string()))
    }
}

fn merge_type_defs(
    fragments: Vec<SchemaFragment>,
    policy: CollisionPolicy,
) -> Result<IndexMap<String, MergedType>, ComposeError> {
    let mut types: IndexMap<String, MergedType> = IndexMap::new();

    for fragment in fragments {
        let owner = fragment.name;
        for def in fragment.defs {
            let type_name = def.name().to_string();
            let Some(existing) = types.get_mut(&type_name) else {
                let merged = first_definition(&type_name, def, &owner, policy)?;
                types.insert(type_name, merged);
                continue;
            };

            match (def, existing) {
                (TypeDef::Object(def), MergedType::Object(object)) => {
                    if !def.extension {
                        if let (Some(first), CollisionPolicy::Reject) =
                            (&object.declared_by, policy)
                        {
                            return Err(ComposeError::DuplicateType {
                                type_name,
                                first: first.clone(),
                                second: owner,
                            });
                        }
                        object.declared_by = Some(owner.clone());
                        if def.description.is_some() {
                            object.description = def.description;
                        }
                    }
                    merge_fields(&type_name, object, def.fields, &owner, policy)?;
                }
                (TypeDef::Input(def), MergedType::Input(input)) => {
                    if policy == CollisionPolicy::Reject {
                        return Err(ComposeError::DuplicateType {
                            type_name,
                            first: input.owner.clone(),
                            second: owner,
                        });
                    }
                    *input = Owned {
                        value: def,
                        owner: owner.clone(),
                    };
                }
                (TypeDef::Union(def), MergedType::Union(union)) => {
                    if !def.extension {
                        if let (Some(first), CollisionPolicy::Reject) =
                            (&union.declared_by, policy)
                        {
                            return Err(ComposeError::DuplicateType {
                                type_name,
                                first: first.clone(),
                                second: owner,
                            });
                        }
                        union.declared_by = Some(owner.clone());
                        if def.description.is_some() {
                            union.description = def.description;
                        }
                    }
                    for member in def.members {
                        if !union.members.contains(&member) {
                            union.members.push(member);
                        }
                    }
                }
                _ => return Err(ComposeError::KindMismatch { type_name }),
            }
        }
    }

    for (type_name, merged) in &types {
        let undeclared = match merged {
            MergedType::Object(object) => object
                .declared_by
                .is_none()
                .then(|| object.first_extender.clone()),
            MergedType::Union(union) => union
                .declared_by
                .is_none()
                .then(|| union.first_extender.clone()),
            MergedType::Input(_) => None,
        };
        if let Some(fragment) = undeclared {
            return Err(ComposeError::UndeclaredType {
                type_name: type_name.clone(),
                fragment,
            });
        }
    }

    Ok(types)
}

fn first_definition(
    type_name: &str,
    def: TypeDef,
    owner: &str,
    policy: CollisionPolicy,
) -> Result<MergedType, ComposeError> {
    Ok(match def {
        TypeDef::Object(def) => {
            let mut object = MergedObject {
                declared_by: (!def.extension).then(|| owner.to_string()),
                first_extender: owner.to_string(),
                description: def.description,
                fields: IndexMap::new(),
            };
            merge_fields(type_name, &mut object, def.fields, owner, policy)?;
            MergedType::Object(object)
        }
        TypeDef::Input(def) => MergedType::Input(Owned {
            value: def,
            owner: owner.to_string(),
        }),
        TypeDef::Union(def) => MergedType::Union(MergedUnion {
            declared_by: (!def.extension).then(|| owner.to_string()),
            first_extender: owner.to_string(),
            description: def.description,
            members: def.members,
        }),
    })
}

fn merge_fields(
    type_name: &str,
    object: &mut MergedObject,
    fields: Vec<FieldDef>,
    owner: &str,
    policy: CollisionPolicy,
) -> Result<(), ComposeError> {
    for field in fields {
        if let Some(existing) = object.fields.get(&field.name) {
            if policy == CollisionPolicy::Reject {
                return Err(ComposeError::FieldCollision {
                    type_name: type_name.to_string(),
                    field: field.name,
                    first: existing.owner.clone(),
                    second: owner.to_string(),
                });
            }
            debug!(
                "Field {}.{} from '{}' replaces the one from '{}'",
                type_name, field.name, owner, existing.owner
            );
        }
        object.fields.insert(
            field.name.clone(),
            Owned {
                value: field,
                owner: owner.to_string(),
            },
        );
    }
    Ok(())
}

type MergedResolvers = IndexMap<String, IndexMap<String, Owned<Resolver>>>;

fn merge_resolver_maps(
    maps: Vec<ResolverMap>,
    policy: CollisionPolicy,
) -> Result<MergedResolvers, ComposeError> {
    let mut merged: MergedResolvers = IndexMap::new();

    for map in maps {
        for (type_name, fields) in map.types {
            let target = merged.entry(type_name.clone()).or_default();
            for (field, resolver) in fields {
                if let Some(existing) = target.get(&field) {
                    if policy == CollisionPolicy::Reject {
                        return Err(ComposeError::ResolverCollision {
                            type_name,
                            field,
                            first: existing.owner.clone(),
                            second: map.name.clone(),
                        });
                    }
                    debug!(
                        "Resolver {}.{} from '{}' replaces the one from '{}'",
                        type_name, field, map.name, existing.owner
                    );
                }
                target.insert(
                    field,
                    Owned {
                        value: resolver,
                        owner: map.name.clone(),
                    },
                );
            }
        }
    }

    Ok(merged)
}

fn bind_object(
    type_name: &str,
    object: MergedObject,
    resolvers: &mut IndexMap<String, Owned<Resolver>>,
) -> Result<Object, ComposeError> {
    let mut built = Object::new(type_name);
    if let Some(description) = object.description {
        built = built.description(description);
    }

    for (name, def) in object.fields {
        let def = def.value;
        let field = match resolvers.shift_remove(&name).map(|owned| owned.value) {
            Some(Resolver::Field(resolver)) => {
                Field::new(def.name, def.ty, move |ctx| resolver(ctx))
            }
            Some(Resolver::Subscription(_)) => {
                return Err(ComposeError::ResolverKind {
                    type_name: type_name.to_string(),
                    field: name,
                });
            }
            None => {
                let property = def.name.clone();
                Field::new(def.name, def.ty, move |ctx| {
                    let property = property.clone();
                    FieldFuture::new(
                        async move { Ok(parent_property(ctx.parent_value, &property)) },
                    )
                })
            }
        };
        let field = def
            .args
            .into_iter()
            .fold(field, |field, arg| field.argument(arg.into_input_value()));
        built = built.field(match def.description {
            Some(description) => field.description(description),
            None => field,
        });
    }

    Ok(built)
}

fn bind_subscription(
    object: MergedObject,
    resolvers: &mut IndexMap<String, Owned<Resolver>>,
) -> Result<Subscription, ComposeError> {
    let mut built = Subscription::new(SUBSCRIPTION);
    if let Some(description) = object.description {
        built = built.description(description);
    }

    for (name, def) in object.fields {
        let def = def.value;
        let resolver = match resolvers.shift_remove(&name).map(|owned| owned.value) {
            Some(Resolver::Subscription(resolver)) => resolver,
            Some(Resolver::Field(_)) => {
                return Err(ComposeError::ResolverKind {
                    type_name: SUBSCRIPTION.to_string(),
                    field: name,
                });
            }
            None => return Err(ComposeError::MissingSubscriptionResolver { field: name }),
        };

        let field = SubscriptionField::new(def.name, def.ty, move |ctx| resolver(ctx));
        let field = def
            .args
            .into_iter()
            .fold(field, |field, arg| field.argument(arg.into_input_value()));
        built = built.field(match def.description {
            Some(description) => field.description(description),
            None => field,
        });
    }

    Ok(built)
}

fn build_input(type_name: &str, def: InputDef) -> InputObject {
    let mut input = InputObject::new(type_name);
    if let Some(description) = def.description {
        input = input.description(description);
    }
    def.fields
        .into_iter()
        .fold(input, |input, field| input.field(field.into_input_value()))
}

fn build_union(type_name: &str, def: MergedUnion) -> Union {
    let mut union = Union::new(type_name);
    if let Some(description) = def.description {
        union = union.description(description);
    }
    def.members
        .into_iter()
        .fold(union, |union, member| union.possible_type(member))
}

/// Default resolution: read the field's name off the parent object value.
fn parent_property(parent: &FieldValue<'_>, property: &str) -> Option<FieldValue<'static>> {
    match parent.as_value() {
        Some(Value::Object(map)) => map.get(property).cloned().and_then(into_field_value),
        _ => None,
    }
}

fn into_field_value(value: Value) -> Option<FieldValue<'static>> {
    match value {
        Value::Null => None,
        Value::List(items) => Some(FieldValue::list(items.into_iter().map(|item| {
            into_field_value(item).unwrap_or_else(|| FieldValue::value(Value::Null))
        }))),
        other => Some(FieldValue::value(other)),
    }
}
