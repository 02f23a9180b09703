//! The schema graph the executor runs against.
//!
//! A [`Registry`] is built once, compiled once into a [`CompiledSchema`]
//! (see [`compile`]), and then shared immutably by any number of requests.

use std::{collections::BTreeMap, fmt, sync::Arc};

use futures_util::future::{BoxFuture, FutureExt};
use indexmap::{IndexMap, IndexSet};

use crate::{
    context::ResolveFieldContext,
    error::Result,
    value::{ConstValue, Name},
};

mod compile;
pub mod scalars;

pub use compile::CompiledSchema;

/// A reference to an output or input type.
///
/// Types are non-null unless wrapped in `Nullable`; the GraphQL notation
/// `[Int!]` therefore reads as `Nullable(List(Named(Int)))`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(Name),
    List(Box<TypeRef>),
    Nullable(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<Name>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    pub fn nullable(inner: TypeRef) -> Self {
        TypeRef::Nullable(Box::new(inner))
    }

    /// The innermost named type.
    pub fn named_type(&self) -> &Name {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::Nullable(inner) => inner.named_type(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }

    fn fmt_unwrapped(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::Nullable(inner) => inner.fmt_unwrapped(f),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Nullable(inner) => inner.fmt_unwrapped(f),
            wrapped => {
                wrapped.fmt_unwrapped(f)?;
                f.write_str("!")
            }
        }
    }
}

impl From<&str> for TypeRef {
    /// Parse the GraphQL type notation, e.g. `[Int!]!`.
    fn from(s: &str) -> Self {
        let s = s.trim();
        let (inner, non_null) = match s.strip_suffix('!') {
            Some(inner) => (inner.trim_end(), true),
            None => (s, false),
        };
        let base = match inner.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            Some(element) => TypeRef::list(TypeRef::from(element)),
            None => TypeRef::named(inner),
        };
        if non_null {
            base
        } else {
            TypeRef::nullable(base)
        }
    }
}

pub type SyncResolverFn =
    Arc<dyn Fn(&ResolveFieldContext, &ConstValue) -> Result<ConstValue> + Send + Sync>;
pub type AsyncResolverFn = Arc<
    dyn Fn(ResolveFieldContext, ConstValue) -> BoxFuture<'static, Result<ConstValue>> + Send + Sync,
>;

/// How a field obtains its value from its parent.
#[derive(Clone, Default)]
pub enum Resolver {
    /// No resolver. Traversing such a field is a programmer error.
    #[default]
    Undefined,
    Sync(SyncResolverFn),
    Async(AsyncResolverFn),
}

impl Resolver {
    pub fn new(
        f: impl Fn(&ResolveFieldContext, &ConstValue) -> Result<ConstValue> + Send + Sync + 'static,
    ) -> Self {
        Resolver::Sync(Arc::new(f))
    }

    pub fn new_async<F, Fut>(f: F) -> Self
    where
        F: Fn(ResolveFieldContext, ConstValue) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<ConstValue>> + Send + 'static,
    {
        Resolver::Async(Arc::new(move |ctx, parent| f(ctx, parent).boxed()))
    }

    /// Resolve to the named key of an object-shaped parent value, `null` if
    /// the key is absent.
    pub fn property(key: impl Into<Name>) -> Self {
        let key = key.into();
        Resolver::new(move |_ctx, parent| {
            Ok(parent.get(&key).cloned().unwrap_or(ConstValue::Null))
        })
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Resolver::Undefined)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Undefined => f.write_str("Undefined"),
            Resolver::Sync(_) => f.write_str("Sync"),
            Resolver::Async(_) => f.write_str("Async"),
        }
    }
}

pub type ResolveTypeFn = Arc<dyn Fn(&ConstValue) -> Option<Name> + Send + Sync>;
pub type ResolveValueFn = Arc<dyn Fn(ConstValue) -> ConstValue + Send + Sync>;
pub type IsTypeOfFn = Arc<dyn Fn(&ConstValue) -> bool + Send + Sync>;
pub type ScalarParseFn = Arc<dyn Fn(ConstValue) -> Result<ConstValue> + Send + Sync>;
pub type ScalarCoerceFn = Arc<dyn Fn(&ConstValue) -> Option<ConstValue> + Send + Sync>;

/// An argument of a field, or a field of an input object.
#[derive(Clone, Debug)]
pub struct MetaInputValue {
    pub name: Name,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<ConstValue>,
}

impl MetaInputValue {
    pub fn new(name: impl Into<Name>, ty: impl Into<TypeRef>) -> MetaInputValue {
        MetaInputValue {
            name: name.into(),
            description: None,
            ty: ty.into(),
            default_value: None,
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> MetaInputValue {
        MetaInputValue {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_default(self, default: ConstValue) -> MetaInputValue {
        MetaInputValue {
            default_value: Some(default),
            ..self
        }
    }
}

/// An output field of an object type.
#[derive(Clone)]
pub struct MetaField {
    pub name: Name,
    pub description: Option<String>,
    pub args: IndexMap<Name, MetaInputValue>,
    pub ty: TypeRef,
    pub deprecation: Option<String>,
    pub resolver: Resolver,
}

impl MetaField {
    pub fn new(name: impl Into<Name>, ty: impl Into<TypeRef>) -> MetaField {
        MetaField {
            name: name.into(),
            description: None,
            args: IndexMap::new(),
            ty: ty.into(),
            deprecation: None,
            resolver: Resolver::Undefined,
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        MetaField {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_argument(mut self, argument: MetaInputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }

    pub fn with_resolver(self, resolver: Resolver) -> Self {
        MetaField { resolver, ..self }
    }
}

/// A scalar type. Custom `parse`/`coerce` closures override the built-in
/// behaviour selected by name (Int, Float, String, Boolean, ID); scalars
/// with neither pass values through unchanged.
#[derive(Clone)]
pub struct ScalarType {
    pub name: Name,
    pub description: Option<String>,
    pub parse: Option<ScalarParseFn>,
    pub coerce: Option<ScalarCoerceFn>,
}

impl ScalarType {
    pub fn new(name: impl Into<Name>) -> ScalarType {
        ScalarType {
            name: name.into(),
            description: None,
            parse: None,
            coerce: None,
        }
    }

    pub fn with_parse(
        self,
        parse: impl Fn(ConstValue) -> Result<ConstValue> + Send + Sync + 'static,
    ) -> Self {
        ScalarType {
            parse: Some(Arc::new(parse)),
            ..self
        }
    }

    pub fn with_coerce(
        self,
        coerce: impl Fn(&ConstValue) -> Option<ConstValue> + Send + Sync + 'static,
    ) -> Self {
        ScalarType {
            coerce: Some(Arc::new(coerce)),
            ..self
        }
    }

    /// Input coercion of a literal or variable value.
    pub fn parse_input(&self, value: ConstValue) -> Result<ConstValue> {
        match &self.parse {
            Some(parse) => parse(value),
            None => scalars::parse_by_name(&self.name, value),
        }
    }

    /// Output coercion of a resolved value; `None` completes to `null`.
    pub fn coerce_output(&self, value: &ConstValue) -> Option<ConstValue> {
        match &self.coerce {
            Some(coerce) => coerce(value),
            None => scalars::coerce_by_name(&self.name, value),
        }
    }
}

/// An object type: an ordered set of named, resolvable fields.
#[derive(Clone)]
pub struct ObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub fields: IndexMap<Name, MetaField>,
    /// Used by default abstract-type resolution to test whether a runtime
    /// value belongs to this type.
    pub is_type_of: Option<IsTypeOfFn>,
}

impl ObjectType {
    pub fn new(name: impl Into<Name>, fields: impl IntoIterator<Item = MetaField>) -> ObjectType {
        ObjectType {
            name: name.into(),
            description: None,
            fields: fields
                .into_iter()
                .map(|field| (field.name.clone(), field))
                .collect(),
            is_type_of: None,
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        ObjectType {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_is_type_of(
        self,
        is_type_of: impl Fn(&ConstValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        ObjectType {
            is_type_of: Some(Arc::new(is_type_of)),
            ..self
        }
    }

    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.get(name)
    }
}

/// An interface type. Execution only needs its possible types and the
/// optional explicit type resolver; field definitions live on the
/// implementing objects.
#[derive(Clone)]
pub struct InterfaceType {
    pub name: Name,
    pub description: Option<String>,
    pub possible_types: IndexSet<Name>,
    pub resolve_type: Option<ResolveTypeFn>,
}

impl InterfaceType {
    pub fn new<T: Into<Name>>(
        name: impl Into<Name>,
        possible_types: impl IntoIterator<Item = T>,
    ) -> InterfaceType {
        InterfaceType {
            name: name.into(),
            description: None,
            possible_types: possible_types.into_iter().map(Into::into).collect(),
            resolve_type: None,
        }
    }

    pub fn with_resolve_type(
        self,
        resolve_type: impl Fn(&ConstValue) -> Option<Name> + Send + Sync + 'static,
    ) -> Self {
        InterfaceType {
            resolve_type: Some(Arc::new(resolve_type)),
            ..self
        }
    }
}

/// A union type. `resolve_value` unwraps a tagged host value into the
/// payload the case's object fields resolve against.
#[derive(Clone)]
pub struct UnionType {
    pub name: Name,
    pub description: Option<String>,
    pub possible_types: IndexSet<Name>,
    pub resolve_type: Option<ResolveTypeFn>,
    pub resolve_value: Option<ResolveValueFn>,
}

impl UnionType {
    pub fn new<T: Into<Name>>(
        name: impl Into<Name>,
        possible_types: impl IntoIterator<Item = T>,
    ) -> UnionType {
        UnionType {
            name: name.into(),
            description: None,
            possible_types: possible_types.into_iter().map(Into::into).collect(),
            resolve_type: None,
            resolve_value: None,
        }
    }

    pub fn with_resolve_type(
        self,
        resolve_type: impl Fn(&ConstValue) -> Option<Name> + Send + Sync + 'static,
    ) -> Self {
        UnionType {
            resolve_type: Some(Arc::new(resolve_type)),
            ..self
        }
    }

    pub fn with_resolve_value(
        self,
        resolve_value: impl Fn(ConstValue) -> ConstValue + Send + Sync + 'static,
    ) -> Self {
        UnionType {
            resolve_value: Some(Arc::new(resolve_value)),
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct MetaEnumValue {
    pub name: Name,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

impl MetaEnumValue {
    pub fn new(name: impl Into<Name>) -> MetaEnumValue {
        MetaEnumValue {
            name: name.into(),
            description: None,
            deprecation: None,
        }
    }
}

/// An enum type.
#[derive(Clone, Debug)]
pub struct EnumType {
    pub name: Name,
    pub description: Option<String>,
    pub values: IndexMap<Name, MetaEnumValue>,
}

impl EnumType {
    pub fn new<T: Into<Name>>(name: impl Into<Name>, values: impl IntoIterator<Item = T>) -> EnumType {
        EnumType {
            name: name.into(),
            description: None,
            values: values
                .into_iter()
                .map(|value| {
                    let value = MetaEnumValue::new(value);
                    (value.name.clone(), value)
                })
                .collect(),
        }
    }

    pub fn value(&self, name: &str) -> Option<&MetaEnumValue> {
        self.values.get(name)
    }
}

/// An input object type.
#[derive(Clone)]
pub struct InputObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub input_fields: IndexMap<Name, MetaInputValue>,
}

impl InputObjectType {
    pub fn new(
        name: impl Into<Name>,
        input_fields: impl IntoIterator<Item = MetaInputValue>,
    ) -> InputObjectType {
        InputObjectType {
            name: name.into(),
            description: None,
            input_fields: input_fields
                .into_iter()
                .map(|field| (field.name.clone(), field))
                .collect(),
        }
    }
}

/// A type definition of the schema.
#[derive(Clone)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl MetaType {
    pub fn name(&self) -> &Name {
        match self {
            MetaType::Scalar(inner) => &inner.name,
            MetaType::Object(inner) => &inner.name,
            MetaType::Interface(inner) => &inner.name,
            MetaType::Union(inner) => &inner.name,
            MetaType::Enum(inner) => &inner.name,
            MetaType::InputObject(inner) => &inner.name,
        }
    }

    pub fn object(&self) -> Option<&ObjectType> {
        match self {
            MetaType::Object(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, MetaType::Object(_))
    }

    pub fn is_input_kind(&self) -> bool {
        matches!(
            self,
            MetaType::Scalar(_) | MetaType::Enum(_) | MetaType::InputObject(_)
        )
    }

}

impl From<ScalarType> for MetaType {
    fn from(val: ScalarType) -> Self {
        MetaType::Scalar(val)
    }
}

impl From<ObjectType> for MetaType {
    fn from(val: ObjectType) -> Self {
        MetaType::Object(val)
    }
}

impl From<InterfaceType> for MetaType {
    fn from(val: InterfaceType) -> Self {
        MetaType::Interface(val)
    }
}

impl From<UnionType> for MetaType {
    fn from(val: UnionType) -> Self {
        MetaType::Union(val)
    }
}

impl From<EnumType> for MetaType {
    fn from(val: EnumType) -> Self {
        MetaType::Enum(val)
    }
}

impl From<InputObjectType> for MetaType {
    fn from(val: InputObjectType) -> Self {
        MetaType::InputObject(val)
    }
}

/// The uncompiled schema: the type map plus the root operation types.
pub struct Registry {
    pub types: BTreeMap<Name, MetaType>,
    pub query_type: Name,
    pub mutation_type: Option<Name>,
    pub subscription_type: Option<Name>,
}

impl Registry {
    /// Create a registry with the built-in scalars pre-registered.
    pub fn new(query_type: impl Into<Name>) -> Registry {
        let mut registry = Registry {
            types: BTreeMap::new(),
            query_type: query_type.into(),
            mutation_type: None,
            subscription_type: None,
        };
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            registry.insert_type(ScalarType::new(name));
        }
        registry
    }

    pub fn insert_type(&mut self, ty: impl Into<MetaType>) {
        let ty = ty.into();
        self.types.insert(ty.name().clone(), ty);
    }

    pub fn with_type(mut self, ty: impl Into<MetaType>) -> Self {
        self.insert_type(ty);
        self
    }

    pub fn with_mutation_type(mut self, name: impl Into<Name>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    pub fn lookup_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ref_parses_graphql_notation() {
        assert_eq!(TypeRef::from("Int"), TypeRef::nullable(TypeRef::named("Int")));
        assert_eq!(TypeRef::from("Int!"), TypeRef::named("Int"));
        assert_eq!(
            TypeRef::from("[Int!]"),
            TypeRef::nullable(TypeRef::list(TypeRef::named("Int")))
        );
        assert_eq!(
            TypeRef::from("[Int]!"),
            TypeRef::list(TypeRef::nullable(TypeRef::named("Int")))
        );
        assert_eq!(
            TypeRef::from("[[String!]!]"),
            TypeRef::nullable(TypeRef::list(TypeRef::list(TypeRef::named("String"))))
        );
    }

    #[test]
    fn type_ref_display_round_trips() {
        for notation in ["Int", "Int!", "[Int!]", "[Int]!", "[[String!]!]", "[ID]"] {
            assert_eq!(TypeRef::from(notation).to_string(), notation);
        }
    }

    #[test]
    fn named_type_unwraps_to_the_innermost_name() {
        assert_eq!(TypeRef::from("[[Post!]]!").named_type().as_str(), "Post");
    }

    #[test]
    fn registry_registers_builtin_scalars() {
        let registry = Registry::new("Query");
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            assert!(matches!(registry.lookup_type(name), Some(MetaType::Scalar(_))));
        }
    }
}
