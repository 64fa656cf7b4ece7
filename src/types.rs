//! Construction metadata for bean types
//!
//! Rust has no reflective class loading, so the container works against
//! explicitly registered construction metadata instead: a [`BeanType`] is the
//! "resolved class handle" for one concrete type, carrying its constructors,
//! settable property slots, lifecycle methods, and factory capabilities. The
//! [`TypeResolver`] trait is the pluggable strategy that turns a declared
//! type name into such a handle; [`TypeRegistry`] is the static-table
//! implementation.
//!
//! Property setters run after construction, so property-wired fields need
//! interior mutability (`OnceLock`, `Mutex`, ...) in the bean type itself.

use crate::error::BoxedCause;
use crate::{BeanError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A live, type-erased bean instance.
pub type BeanInstance = Arc<dyn Any + Send + Sync>;

type ConstructFn =
    Arc<dyn Fn(&[BeanInstance]) -> std::result::Result<BeanInstance, BoxedCause> + Send + Sync>;
type SetterFn = Arc<
    dyn Fn(&BeanInstance, BeanInstance) -> std::result::Result<(), BoxedCause> + Send + Sync,
>;
type LifecycleFn =
    Arc<dyn Fn(&BeanInstance) -> std::result::Result<(), BoxedCause> + Send + Sync>;
type ProduceFn =
    Arc<dyn Fn(&BeanInstance) -> std::result::Result<BeanInstance, BoxedCause> + Send + Sync>;

/// Erase a value into a [`BeanInstance`].
#[inline]
pub fn instance_of<T: Send + Sync + 'static>(value: T) -> BeanInstance {
    Arc::new(value)
}

/// Downcast an instance to a concrete type, cloning the `Arc`.
#[inline]
pub fn downcast_instance<T: Send + Sync + 'static>(instance: &BeanInstance) -> Option<Arc<T>> {
    Arc::clone(instance).downcast::<T>().ok()
}

fn take_arg<T: Send + Sync + 'static>(
    args: &[BeanInstance],
    index: usize,
) -> std::result::Result<Arc<T>, BoxedCause> {
    let arg = args
        .get(index)
        .ok_or_else(|| format!("missing constructor argument {index}"))?;
    downcast_instance::<T>(arg)
        .ok_or_else(|| format!("constructor argument {index} has unexpected type").into())
}

/// A bean whose purpose is to produce another object rather than be used
/// directly. Plain name lookups yield the product; `&name` lookups yield the
/// factory itself.
pub trait FactoryBean: Send + Sync + 'static {
    /// The type this factory produces.
    type Product: Send + Sync + 'static;

    /// Produce the product object.
    fn object(&self) -> std::result::Result<Self::Product, BoxedCause>;
}

/// One constructor parameter: a name hint plus the required value type.
#[derive(Clone)]
pub struct ParamSpec {
    pub name: String,
    pub type_id: TypeId,
    pub type_name: &'static str,
}

/// An invokable constructor with its ordered parameter slots.
#[derive(Clone)]
pub struct ConstructorSpec {
    params: Vec<ParamSpec>,
    construct: ConstructFn,
}

impl ConstructorSpec {
    #[inline]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Instantiate with pre-resolved argument values, in parameter order.
    pub fn invoke(&self, args: &[BeanInstance]) -> std::result::Result<BeanInstance, BoxedCause> {
        (self.construct)(args)
    }

    /// Whether the given explicit arguments match this constructor's
    /// parameter list exactly (arity and runtime types).
    pub fn matches_args(&self, args: &[BeanInstance]) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(param, arg)| (**arg).type_id() == param.type_id)
    }
}

/// A settable property slot, filled after construction.
#[derive(Clone)]
pub struct PropertySpec {
    name: String,
    value_type: TypeId,
    value_type_name: &'static str,
    required: bool,
    set: SetterFn,
}

impl PropertySpec {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    #[inline]
    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Whether an unresolvable slot is an error rather than left unset.
    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Apply the setter to a live instance.
    pub fn apply(
        &self,
        instance: &BeanInstance,
        value: BeanInstance,
    ) -> std::result::Result<(), BoxedCause> {
        (self.set)(instance, value)
    }
}

/// A named factory method returning a product instance.
///
/// The product type is declared statically so type queries never have to
/// invoke the method.
#[derive(Clone)]
pub struct FactoryMethodSpec {
    product_type: TypeId,
    product_type_name: &'static str,
    produce: ProduceFn,
}

impl FactoryMethodSpec {
    #[inline]
    pub fn product_type(&self) -> TypeId {
        self.product_type
    }

    #[inline]
    pub fn product_type_name(&self) -> &'static str {
        self.product_type_name
    }

    pub fn invoke(
        &self,
        factory: &BeanInstance,
    ) -> std::result::Result<BeanInstance, BoxedCause> {
        (self.produce)(factory)
    }
}

/// The [`FactoryBean`] capability recorded on a handle.
#[derive(Clone)]
pub struct FactoryCapability {
    product_type: TypeId,
    product_type_name: &'static str,
    produce: ProduceFn,
}

impl FactoryCapability {
    #[inline]
    pub fn product_type(&self) -> TypeId {
        self.product_type
    }

    #[inline]
    pub fn product_type_name(&self) -> &'static str {
        self.product_type_name
    }

    pub fn produce(
        &self,
        factory: &BeanInstance,
    ) -> std::result::Result<BeanInstance, BoxedCause> {
        (self.produce)(factory)
    }
}

/// Resolved construction metadata for one concrete type.
pub struct BeanType {
    name: String,
    type_id: TypeId,
    /// Type ids this type is assignable to: its own id plus declared
    /// trait-object ids
    assignable: Vec<TypeId>,
    constructors: Vec<ConstructorSpec>,
    properties: Vec<PropertySpec>,
    methods: HashMap<String, LifecycleFn>,
    factory_methods: HashMap<String, FactoryMethodSpec>,
    factory: Option<FactoryCapability>,
}

impl BeanType {
    /// Start building a handle for `T` under the given registered name.
    pub fn builder<T: Send + Sync + 'static>(name: impl Into<String>) -> BeanTypeBuilder {
        BeanTypeBuilder {
            inner: BeanType {
                name: name.into(),
                type_id: TypeId::of::<T>(),
                assignable: vec![TypeId::of::<T>()],
                constructors: Vec::new(),
                properties: Vec::new(),
                methods: HashMap::new(),
                factory_methods: HashMap::new(),
                factory: None,
            },
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Whether instances of this type satisfy a slot of the given type id.
    #[inline]
    pub fn is_assignable_to(&self, target: TypeId) -> bool {
        self.assignable.contains(&target)
    }

    #[inline]
    pub fn constructors(&self) -> &[ConstructorSpec] {
        &self.constructors
    }

    pub fn zero_arg_constructor(&self) -> Option<&ConstructorSpec> {
        self.constructors.iter().find(|c| c.arity() == 0)
    }

    #[inline]
    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Invoke a named lifecycle method on an instance of this type.
    pub fn invoke_method(
        &self,
        name: &str,
        instance: &BeanInstance,
    ) -> Option<std::result::Result<(), BoxedCause>> {
        self.methods.get(name).map(|m| m(instance))
    }

    pub fn factory_method(&self, name: &str) -> Option<&FactoryMethodSpec> {
        self.factory_methods.get(name)
    }

    #[inline]
    pub fn factory(&self) -> Option<&FactoryCapability> {
        self.factory.as_ref()
    }

    #[inline]
    pub fn is_factory_bean(&self) -> bool {
        self.factory.is_some()
    }
}

impl std::fmt::Debug for BeanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanType")
            .field("name", &self.name)
            .field("constructors", &self.constructors.len())
            .field("properties", &self.properties.len())
            .field("factory_bean", &self.is_factory_bean())
            .finish()
    }
}

/// Fluent builder for [`BeanType`] handles.
///
/// # Examples
///
/// ```rust
/// use bean_factory::BeanType;
/// use std::sync::{Arc, OnceLock};
///
/// struct Engine;
///
/// struct Car {
///     engine: OnceLock<Arc<Engine>>,
/// }
///
/// let handle = BeanType::builder::<Car>("Car")
///     .constructor0(|| Car { engine: OnceLock::new() })
///     .property("engine", |car: &Car, engine: Arc<Engine>| {
///         let _ = car.engine.set(engine);
///     })
///     .build();
///
/// assert!(handle.zero_arg_constructor().is_some());
/// ```
pub struct BeanTypeBuilder {
    inner: BeanType,
}

impl BeanTypeBuilder {
    /// Declare assignability to a trait-object (or any other) type id.
    ///
    /// Declared ids are visible through `BeanFactory::bean_names_of_type` and
    /// `BeanFactory::is_type_match`, which accept `?Sized` targets. By-type
    /// resolution still hands back the concrete type; downcast after a
    /// by-name lookup when working through a trait.
    pub fn implements<I: ?Sized + 'static>(mut self) -> Self {
        self.inner.assignable.push(TypeId::of::<I>());
        self
    }

    /// Register a zero-argument constructor.
    pub fn constructor0<T, F>(mut self, construct: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.inner.constructors.push(ConstructorSpec {
            params: Vec::new(),
            construct: Arc::new(move |_args| Ok(instance_of(construct()))),
        });
        self
    }

    /// Register a fallible zero-argument constructor.
    pub fn try_constructor0<T, F>(mut self, construct: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> std::result::Result<T, BoxedCause> + Send + Sync + 'static,
    {
        self.inner.constructors.push(ConstructorSpec {
            params: Vec::new(),
            construct: Arc::new(move |_args| construct().map(instance_of)),
        });
        self
    }

    /// Register a one-argument constructor.
    pub fn constructor1<T, A, F>(mut self, a: &str, construct: F) -> Self
    where
        T: Send + Sync + 'static,
        A: Send + Sync + 'static,
        F: Fn(Arc<A>) -> T + Send + Sync + 'static,
    {
        self.inner.constructors.push(ConstructorSpec {
            params: vec![param_spec::<A>(a)],
            construct: Arc::new(move |args| Ok(instance_of(construct(take_arg::<A>(args, 0)?)))),
        });
        self
    }

    /// Register a two-argument constructor.
    pub fn constructor2<T, A, B, F>(mut self, a: &str, b: &str, construct: F) -> Self
    where
        T: Send + Sync + 'static,
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
        F: Fn(Arc<A>, Arc<B>) -> T + Send + Sync + 'static,
    {
        self.inner.constructors.push(ConstructorSpec {
            params: vec![param_spec::<A>(a), param_spec::<B>(b)],
            construct: Arc::new(move |args| {
                Ok(instance_of(construct(
                    take_arg::<A>(args, 0)?,
                    take_arg::<B>(args, 1)?,
                )))
            }),
        });
        self
    }

    /// Register a three-argument constructor.
    pub fn constructor3<T, A, B, C, F>(mut self, a: &str, b: &str, c: &str, construct: F) -> Self
    where
        T: Send + Sync + 'static,
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
        C: Send + Sync + 'static,
        F: Fn(Arc<A>, Arc<B>, Arc<C>) -> T + Send + Sync + 'static,
    {
        self.inner.constructors.push(ConstructorSpec {
            params: vec![param_spec::<A>(a), param_spec::<B>(b), param_spec::<C>(c)],
            construct: Arc::new(move |args| {
                Ok(instance_of(construct(
                    take_arg::<A>(args, 0)?,
                    take_arg::<B>(args, 1)?,
                    take_arg::<C>(args, 2)?,
                )))
            }),
        });
        self
    }

    /// Register an optional property slot; unresolvable slots stay unset.
    pub fn property<S, V, F>(self, name: &str, setter: F) -> Self
    where
        S: Send + Sync + 'static,
        V: Send + Sync + 'static,
        F: Fn(&S, Arc<V>) + Send + Sync + 'static,
    {
        self.add_property(name, false, setter)
    }

    /// Register a mandatory property slot; an unresolvable slot is an error.
    pub fn required_property<S, V, F>(self, name: &str, setter: F) -> Self
    where
        S: Send + Sync + 'static,
        V: Send + Sync + 'static,
        F: Fn(&S, Arc<V>) + Send + Sync + 'static,
    {
        self.add_property(name, true, setter)
    }

    fn add_property<S, V, F>(mut self, name: &str, required: bool, setter: F) -> Self
    where
        S: Send + Sync + 'static,
        V: Send + Sync + 'static,
        F: Fn(&S, Arc<V>) + Send + Sync + 'static,
    {
        let slot = name.to_string();
        self.inner.properties.push(PropertySpec {
            name: name.to_string(),
            value_type: TypeId::of::<V>(),
            value_type_name: std::any::type_name::<V>(),
            required,
            set: Arc::new(move |instance, value| {
                let target = instance
                    .downcast_ref::<S>()
                    .ok_or_else(|| format!("property '{slot}' applied to wrong receiver type"))?;
                let value = downcast_instance::<V>(&value)
                    .ok_or_else(|| format!("property '{slot}' received wrong value type"))?;
                setter(target, value);
                Ok(())
            }),
        });
        self
    }

    /// Register a named lifecycle method (init/destroy target).
    pub fn method<S, F>(mut self, name: &str, body: F) -> Self
    where
        S: Send + Sync + 'static,
        F: Fn(&S) -> std::result::Result<(), BoxedCause> + Send + Sync + 'static,
    {
        let method = name.to_string();
        self.inner.methods.insert(
            name.to_string(),
            Arc::new(move |instance| {
                let target = instance
                    .downcast_ref::<S>()
                    .ok_or_else(|| format!("method '{method}' invoked on wrong receiver type"))?;
                body(target)
            }),
        );
        self
    }

    /// Register a named factory method producing instances of `P`.
    pub fn factory_method<S, P, F>(mut self, name: &str, body: F) -> Self
    where
        S: Send + Sync + 'static,
        P: Send + Sync + 'static,
        F: Fn(&S) -> std::result::Result<P, BoxedCause> + Send + Sync + 'static,
    {
        let method = name.to_string();
        self.inner.factory_methods.insert(
            name.to_string(),
            FactoryMethodSpec {
                product_type: TypeId::of::<P>(),
                product_type_name: std::any::type_name::<P>(),
                produce: Arc::new(move |factory| {
                    let target = factory.downcast_ref::<S>().ok_or_else(|| {
                        format!("factory method '{method}' invoked on wrong receiver type")
                    })?;
                    body(target).map(instance_of)
                }),
            },
        );
        self
    }

    /// Record the [`FactoryBean`] capability for `S`.
    pub fn factory_bean<S: FactoryBean>(mut self) -> Self {
        self.inner.factory = Some(FactoryCapability {
            product_type: TypeId::of::<S::Product>(),
            product_type_name: std::any::type_name::<S::Product>(),
            produce: Arc::new(|factory| {
                let target = factory
                    .downcast_ref::<S>()
                    .ok_or("factory capability invoked on wrong receiver type")?;
                target.object().map(instance_of)
            }),
        });
        self
    }

    pub fn build(self) -> BeanType {
        self.inner
    }
}

fn param_spec<T: 'static>(name: &str) -> ParamSpec {
    ParamSpec {
        name: name.to_string(),
        type_id: TypeId::of::<T>(),
        type_name: std::any::type_name::<T>(),
    }
}

/// Pluggable strategy for resolving a declared type name to a handle.
///
/// The default implementation is a static registration table; alternatives
/// (code generation, embedding another runtime) only need this trait.
pub trait TypeResolver: Send + Sync {
    /// Resolve construction metadata for a type name, failing with
    /// [`BeanError::TypeResolution`] if the name is unknown.
    fn resolve(&self, type_name: &str) -> Result<Arc<BeanType>>;
}

/// Static table of registered [`BeanType`] handles.
pub struct TypeRegistry {
    handles: DashMap<String, Arc<BeanType>, RandomState>,
}

impl TypeRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            handles: DashMap::with_capacity_and_hasher(16, RandomState::new()),
        }
    }

    /// Register a handle under its declared name, replacing any previous one.
    pub fn register(&self, handle: BeanType) {
        self.handles.insert(handle.name.clone(), Arc::new(handle));
    }

    #[inline]
    pub fn contains(&self, type_name: &str) -> bool {
        self.handles.contains_key(type_name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, type_name: &str) -> Result<Arc<BeanType>> {
        self.handles
            .get(type_name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BeanError::TypeResolution {
                type_name: type_name.to_string(),
            })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("type_count", &self.len())
            .finish()
    }
}
