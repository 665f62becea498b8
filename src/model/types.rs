//! Projection types and their runtime witnesses
//!
//! Rust has no runtime subtyping, so each projection type declares its
//! supertypes explicitly through [`ModelProjection`]. [`ModelType::of`] turns
//! the compile-time type into a witness value that carries that hierarchy and
//! can be compared, ordered and stored in identities.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::entity::Component;

/// A type that entities can be projected as
pub trait ModelProjection: Any + Send + Sync {
    /// Direct supertypes of this projection type
    fn supertypes() -> Vec<ModelType>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// Runtime witness of a projection type
#[derive(Clone)]
pub struct ModelType {
    id: TypeId,
    name: &'static str,
    supertypes: Arc<[ModelType]>,
}

impl ModelType {
    /// Witness for `T`, including its declared supertypes
    pub fn of<T: ModelProjection>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            supertypes: T::supertypes().into(),
        }
    }

    /// Rust type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this witness describes `T`
    pub fn is<T: ModelProjection>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Direct supertypes
    pub fn supertypes(&self) -> &[ModelType] {
        &self.supertypes
    }

    /// Reflexive, transitive subtype check
    pub fn is_subtype_of(&self, other: &ModelType) -> bool {
        self == other || self.supertypes.iter().any(|s| s.is_subtype_of(other))
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModelType {}

impl PartialOrd for ModelType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModelType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for ModelType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelType({})", self.name)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A declared projection, optionally backed by a realized instance
#[derive(Clone)]
pub struct Projection {
    ty: ModelType,
    instance: Option<Arc<dyn Any + Send + Sync>>,
}

impl Projection {
    /// Projection backed by an instance of `T`
    pub fn of<T: ModelProjection>(instance: T) -> Self {
        Self {
            ty: ModelType::of::<T>(),
            instance: Some(Arc::new(instance)),
        }
    }

    /// Projection known by type only
    pub fn declared(ty: ModelType) -> Self {
        Self { ty, instance: None }
    }

    /// Projection type
    pub fn ty(&self) -> &ModelType {
        &self.ty
    }

    /// Whether an instance backs this projection
    pub fn is_realized(&self) -> bool {
        self.instance.is_some()
    }

    /// Instance as `T`, when it is one
    pub fn get<T: ModelProjection>(&self) -> Option<Arc<T>> {
        self.instance
            .clone()
            .and_then(|instance| instance.downcast::<T>().ok())
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("ty", &self.ty)
            .field("realized", &self.is_realized())
            .finish()
    }
}

/// Every projection declared on an entity, in declaration order
///
/// Only ever grows; declared types are never withdrawn.
#[derive(Debug, Clone, Default)]
pub struct Projections(Vec<Projection>);

impl Projections {
    /// Copy with one more projection
    pub fn with(mut self, projection: Projection) -> Self {
        self.0.push(projection);
        self
    }

    /// Iterate over the projections
    pub fn iter(&self) -> impl Iterator<Item = &Projection> {
        self.0.iter()
    }

    /// Declared types, in declaration order
    pub fn types(&self) -> impl Iterator<Item = &ModelType> {
        self.0.iter().map(Projection::ty)
    }

    /// First realized instance of `T`
    pub fn get<T: ModelProjection>(&self) -> Option<Arc<T>> {
        self.0.iter().find_map(Projection::get::<T>)
    }
}

impl Component for Projections {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base;
    impl ModelProjection for Base {}

    struct Middle;
    impl ModelProjection for Middle {
        fn supertypes() -> Vec<ModelType> {
            vec![ModelType::of::<Base>()]
        }
    }

    #[derive(Debug, PartialEq)]
    struct Leaf(&'static str);
    impl ModelProjection for Leaf {
        fn supertypes() -> Vec<ModelType> {
            vec![ModelType::of::<Middle>()]
        }
    }

    #[test]
    fn test_subtype_is_transitive_and_reflexive() {
        let leaf = ModelType::of::<Leaf>();
        assert!(leaf.is_subtype_of(&ModelType::of::<Leaf>()));
        assert!(leaf.is_subtype_of(&ModelType::of::<Middle>()));
        assert!(leaf.is_subtype_of(&ModelType::of::<Base>()));
        assert!(!ModelType::of::<Base>().is_subtype_of(&leaf));
    }

    #[test]
    fn test_projection_downcast() {
        let projections = Projections::default()
            .with(Projection::declared(ModelType::of::<Base>()))
            .with(Projection::of(Leaf("lib")));

        assert_eq!(projections.get::<Leaf>().as_deref(), Some(&Leaf("lib")));
        assert!(projections.get::<Base>().is_none());
        assert_eq!(projections.types().count(), 2);
    }
}
