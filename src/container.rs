//! Bean resolution engine
//!
//! [`BeanFactory`] is the core of the container: it owns the definition
//! registry and the singleton cache, and turns declarative definitions into
//! live, dependency-wired instances on demand. Resolution is synchronous and
//! re-entrant; concurrent callers are safe against the same factory.
//!
//! The hot path is a singleton cache hit. Everything else is the creation
//! path: merge with parent templates, honor `depends_on`, detect cycles,
//! pick a construction route (constructor or factory method), autowire
//! dependency slots, run the init method, and cache per scope.

use crate::autowire::{self, Candidate};
use crate::definition::{AutowireMode, BeanDefinition, BeanScope};
use crate::registry::DefinitionRegistry;
use crate::singleton::SingletonCache;
use crate::types::{
    downcast_instance, BeanInstance, BeanType, FactoryCapability, ParamSpec, TypeRegistry,
    TypeResolver,
};
use crate::{BeanError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Lookup-name marker requesting the factory object itself rather than its
/// product.
pub const FACTORY_BEAN_PREFIX: char = '&';

#[inline]
fn split_factory_prefix(name: &str) -> (bool, &str) {
    match name.strip_prefix(FACTORY_BEAN_PREFIX) {
        Some(bare) => (true, bare),
        None => (false, name),
    }
}

/// Per-top-level-call tracking of names currently being created.
///
/// Threaded through the recursive resolution calls rather than shared
/// globally, so unrelated concurrent resolutions can never produce
/// false-positive cycle errors.
#[derive(Default)]
struct ResolutionCtx {
    stack: Vec<String>,
}

impl ResolutionCtx {
    fn contains(&self, name: &str) -> bool {
        self.stack.iter().any(|n| n == name)
    }

    /// The cycle as seen from the first occurrence of `name`, closing back
    /// on itself.
    fn cycle_path(&self, name: &str) -> Vec<String> {
        let start = self.stack.iter().position(|n| n == name).unwrap_or(0);
        let mut path: Vec<String> = self.stack[start..].to_vec();
        path.push(name.to_string());
        path
    }
}

/// The IoC container: a definition registry paired with a resolution engine.
///
/// # Examples
///
/// ```rust
/// use bean_factory::{BeanDefinition, BeanFactory, BeanType, TypeRegistry};
/// use std::sync::Arc;
///
/// struct Greeter {
///     greeting: &'static str,
/// }
///
/// let types = Arc::new(TypeRegistry::new());
/// types.register(
///     BeanType::builder::<Greeter>("Greeter")
///         .constructor0(|| Greeter { greeting: "hello" })
///         .build(),
/// );
///
/// let factory = BeanFactory::with_types(types);
/// factory
///     .register_bean_definition("greeter", BeanDefinition::of("Greeter"))
///     .unwrap();
///
/// let greeter = factory.get_bean_as::<Greeter>("greeter").unwrap();
/// assert_eq!(greeter.greeting, "hello");
/// ```
pub struct BeanFactory {
    registry: DefinitionRegistry,
    singletons: SingletonCache,
    types: Arc<dyn TypeResolver>,
    /// Memoized parent-merged definitions; a definition is effectively
    /// frozen once its merged form is computed
    merged: DashMap<String, Arc<BeanDefinition>, RandomState>,
    /// Resolved type handle per bean name (resolved exactly once)
    resolved_types: DashMap<String, Arc<BeanType>, RandomState>,
    /// Cached factory-bean products for singleton-scoped factories
    factory_products: DashMap<String, BeanInstance, RandomState>,
}

impl BeanFactory {
    /// Create a factory with its own empty [`TypeRegistry`].
    pub fn new() -> Self {
        Self::with_types(Arc::new(TypeRegistry::new()))
    }

    /// Create a factory backed by a shared static type table.
    pub fn with_types(types: Arc<TypeRegistry>) -> Self {
        Self::with_resolver(types)
    }

    /// Create a factory with a custom construction strategy.
    pub fn with_resolver(types: Arc<dyn TypeResolver>) -> Self {
        #[cfg(feature = "logging")]
        debug!(target: "bean_factory", "Creating bean factory");

        Self {
            registry: DefinitionRegistry::new(),
            singletons: SingletonCache::new(),
            types,
            merged: DashMap::with_capacity_and_hasher(16, RandomState::new()),
            resolved_types: DashMap::with_capacity_and_hasher(16, RandomState::new()),
            factory_products: DashMap::with_capacity_and_hasher(4, RandomState::new()),
        }
    }

    // =========================================================================
    // Registry operations
    // =========================================================================

    /// Register a definition; fails with `DuplicateDefinition` on collision.
    pub fn register_bean_definition(
        &self,
        name: impl Into<String>,
        definition: BeanDefinition,
    ) -> Result<()> {
        self.registry.register(name, definition)
    }

    /// Remove a definition and any instance state created from it.
    pub fn remove_bean_definition(&self, name: &str) -> Result<()> {
        self.registry.remove(name)?;
        self.merged.remove(name);
        self.resolved_types.remove(name);
        self.factory_products.remove(name);
        self.singletons.remove(name);
        Ok(())
    }

    /// Look up the raw (unmerged) definition.
    pub fn get_bean_definition(&self, name: &str) -> Result<Arc<BeanDefinition>> {
        self.registry.get(name)
    }

    #[inline]
    pub fn contains_bean_definition(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Registered names in registration order (snapshot).
    pub fn bean_definition_names(&self) -> Vec<String> {
        self.registry.names()
    }

    #[inline]
    pub fn bean_definition_count(&self) -> usize {
        self.registry.len()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a bean by name.
    ///
    /// A leading [`FACTORY_BEAN_PREFIX`] requests the factory object itself
    /// rather than its product.
    pub fn get_bean(&self, name: &str) -> Result<BeanInstance> {
        let mut ctx = ResolutionCtx::default();
        self.resolve_bean(name, None, false, &mut ctx)
    }

    /// Resolve a bean by name and downcast to the required type.
    pub fn get_bean_as<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let instance = self.get_bean(name)?;
        downcast_instance::<T>(&instance).ok_or_else(|| {
            let (_, bare) = split_factory_prefix(name);
            BeanError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
                actual: self
                    .resolved_types
                    .get(bare)
                    .map(|h| h.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            }
        })
    }

    /// Resolve the unique bean assignable to `T`.
    ///
    /// Ambiguity is broken by a single `primary` candidate; otherwise
    /// `NoUniqueBeanOfType`. Zero candidates is `NoSuchDefinition`.
    pub fn get_bean_of_type<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let name = self.unique_bean_name_of(TypeId::of::<T>(), std::any::type_name::<T>())?;
        self.get_bean_as::<T>(&name)
    }

    /// Resolve a bean by name with explicit constructor arguments, bypassing
    /// autowired constructor selection.
    ///
    /// Arguments must match a registered constructor exactly (arity and
    /// runtime types). An already-created singleton is returned as-is; the
    /// arguments only apply on creation.
    pub fn get_bean_with_args(&self, name: &str, args: Vec<BeanInstance>) -> Result<BeanInstance> {
        let mut ctx = ResolutionCtx::default();
        self.resolve_bean(name, Some(&args), false, &mut ctx)
    }

    /// Whether a name resolves to something: a registered definition or an
    /// already-created singleton. No side effects.
    pub fn contains_bean(&self, name: &str) -> bool {
        let (_, bare) = split_factory_prefix(name);
        self.registry.contains(bare) || self.singletons.contains(bare)
    }

    /// Ordered names of all beans whose observable type is assignable to `T`.
    ///
    /// `T` may be a trait object such as `dyn DataSource` to query beans whose
    /// handle declared the trait via [`BeanTypeBuilder::implements`]. Resolving
    /// such beans goes through [`get_bean`](Self::get_bean) and a caller-side
    /// downcast, since [`get_bean_of_type`](Self::get_bean_of_type) needs a
    /// concrete type.
    pub fn bean_names_of_type<T: ?Sized + 'static>(&self) -> Vec<String> {
        self.candidates_for(TypeId::of::<T>(), false)
            .into_iter()
            .map(|c| c.name)
            .collect()
    }

    // =========================================================================
    // Metadata queries (never instantiate)
    // =========================================================================

    pub fn is_singleton(&self, name: &str) -> Result<bool> {
        let (_, bare) = split_factory_prefix(name);
        Ok(self.merged_definition(bare)?.is_singleton())
    }

    pub fn is_prototype(&self, name: &str) -> Result<bool> {
        let (_, bare) = split_factory_prefix(name);
        Ok(self.merged_definition(bare)?.is_prototype())
    }

    /// The observable type id for a name: the bean's own type, its factory
    /// product for factory beans (unless dereferenced with `&`), or the
    /// statically declared product for factory-method definitions.
    pub fn get_type(&self, name: &str) -> Result<TypeId> {
        let (deref, bare) = split_factory_prefix(name);
        let merged = self.merged_definition(bare)?;

        if merged.uses_factory_method() {
            if deref {
                return Err(BeanError::NotAFactory {
                    name: bare.to_string(),
                });
            }
            return Ok(self.factory_method_spec(bare, &merged)?.product_type());
        }

        let handle = self.handle_for(bare, &merged)?;
        match handle.factory() {
            Some(capability) if !deref => Ok(capability.product_type()),
            Some(_) => Ok(handle.type_id()),
            None if deref => Err(BeanError::NotAFactory {
                name: bare.to_string(),
            }),
            None => Ok(handle.type_id()),
        }
    }

    /// Whether the bean's observable type is assignable to `T`.
    ///
    /// Accepts trait objects (`is_type_match::<dyn DataSource>`) for types
    /// declared through [`BeanTypeBuilder::implements`].
    pub fn is_type_match<T: ?Sized + 'static>(&self, name: &str) -> Result<bool> {
        let (deref, bare) = split_factory_prefix(name);
        let merged = self.merged_definition(bare)?;
        let target = TypeId::of::<T>();

        if merged.uses_factory_method() {
            return if deref {
                Err(BeanError::NotAFactory {
                    name: bare.to_string(),
                })
            } else {
                Ok(self.factory_method_spec(bare, &merged)?.product_type() == target)
            };
        }

        let handle = self.handle_for(bare, &merged)?;
        match handle.factory() {
            Some(capability) if !deref => Ok(capability.product_type() == target),
            _ => Ok(handle.is_assignable_to(target)),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Eagerly create every non-lazy, non-abstract singleton, in registration
    /// order. Dependency ordering is handled by the normal resolution
    /// machinery; call this once registration is complete.
    pub fn pre_instantiate_singletons(&self) -> Result<()> {
        #[cfg(feature = "logging")]
        debug!(
            target: "bean_factory",
            definition_count = self.registry.len(),
            "Pre-instantiating eager singletons"
        );

        for name in self.registry.names() {
            let merged = self.merged_definition(&name)?;
            if merged.is_abstract() || !merged.is_singleton() || merged.is_lazy_init() {
                continue;
            }
            self.get_bean(&name)?;
        }
        Ok(())
    }

    /// Tear down all singletons: destroy methods run in reverse creation
    /// order, then all instance caches are cleared. Definitions survive.
    pub fn destroy_singletons(&self) {
        self.factory_products.clear();
        self.singletons.destroy_singletons();
    }

    /// Number of fully-created singleton instances.
    #[inline]
    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }

    // =========================================================================
    // Internal resolution machinery
    // =========================================================================

    fn resolve_bean(
        &self,
        name: &str,
        args: Option<&[BeanInstance]>,
        allow_early: bool,
        ctx: &mut ResolutionCtx,
    ) -> Result<BeanInstance> {
        let (deref, bare) = split_factory_prefix(name);

        // Hot path: fully-created singleton
        if let Some(existing) = self.singletons.get(bare) {
            #[cfg(feature = "logging")]
            trace!(target: "bean_factory", bean = %bare, "Singleton cache hit");
            return self.apply_factory_dereference(bare, existing, deref);
        }

        let merged = self.merged_definition(bare)?;
        if merged.is_abstract() {
            return Err(BeanError::AbstractDefinition {
                name: bare.to_string(),
            });
        }

        if ctx.contains(bare) {
            // A raw early reference may satisfy property-level consumers of
            // a singleton mid-creation; anything else is a genuine cycle.
            if allow_early && merged.is_singleton() {
                if let Some(early) = self.singletons.get_early(bare) {
                    #[cfg(feature = "logging")]
                    trace!(
                        target: "bean_factory",
                        bean = %bare,
                        "Breaking property cycle with early singleton reference"
                    );
                    return Ok(early);
                }
            }
            return Err(BeanError::CircularDependency {
                path: ctx.cycle_path(bare),
            });
        }

        ctx.stack.push(bare.to_string());
        let created = self.resolve_in_scope(bare, &merged, args, ctx);
        ctx.stack.pop();

        self.apply_factory_dereference(bare, created?, deref)
    }

    fn resolve_in_scope(
        &self,
        bare: &str,
        merged: &BeanDefinition,
        args: Option<&[BeanInstance]>,
        ctx: &mut ResolutionCtx,
    ) -> Result<BeanInstance> {
        // Beans named in depends_on must be fully created first; early
        // references are never good enough here.
        for dependency in merged.depends_on() {
            self.resolve_bean(dependency, None, false, ctx)?;
        }

        match merged.scope() {
            BeanScope::Singleton => {
                // Create-once guard: concurrent callers for the same name
                // block here and observe the single created instance.
                let lock = self.singletons.creation_lock(bare);
                let _guard = lock.lock().unwrap();

                if let Some(existing) = self.singletons.get(bare) {
                    return Ok(existing);
                }

                let created = self.create_and_cache_singleton(bare, merged, args, ctx);
                if created.is_err() {
                    // No stale phase entry may survive a failed creation
                    self.singletons.remove_early(bare);
                }
                created
            }
            BeanScope::Prototype => {
                let (instance, handle) = self.instantiate(bare, merged, args, ctx)?;
                self.initialize(bare, merged, &instance, handle.as_deref())?;
                Ok(instance)
            }
        }
    }

    fn create_and_cache_singleton(
        &self,
        bare: &str,
        merged: &BeanDefinition,
        args: Option<&[BeanInstance]>,
        ctx: &mut ResolutionCtx,
    ) -> Result<BeanInstance> {
        #[cfg(feature = "logging")]
        debug!(target: "bean_factory", bean = %bare, "Creating singleton");

        let (instance, handle) = self.instantiate(bare, merged, args, ctx)?;
        self.initialize(bare, merged, &instance, handle.as_deref())?;

        // Validate the destroy method before caching so a broken definition
        // fails creation rather than teardown
        let destroy = match merged.destroy_method_name() {
            Some(method) => match &handle {
                Some(h) if h.has_method(method) => {
                    Some((Arc::clone(h), method.to_string()))
                }
                _ if merged.enforce_destroy_method() => {
                    return Err(BeanError::initialization(
                        bare,
                        format!("destroy method '{method}' not found"),
                    ));
                }
                _ => None,
            },
            None => None,
        };

        self.singletons.put(bare, Arc::clone(&instance));
        if let Some((handle, method)) = destroy {
            self.singletons
                .register_destroyer(bare, Arc::clone(&instance), move |inst| {
                    handle.invoke_method(&method, inst).unwrap_or(Ok(()))
                });
        }
        Ok(instance)
    }

    /// Instantiate the raw object via the definition's construction route.
    ///
    /// Returns the instance plus its type handle when one exists (factory
    /// method products carry no handle of their own).
    fn instantiate(
        &self,
        bare: &str,
        merged: &BeanDefinition,
        args: Option<&[BeanInstance]>,
        ctx: &mut ResolutionCtx,
    ) -> Result<(BeanInstance, Option<Arc<BeanType>>)> {
        if merged.uses_factory_method() {
            return Ok((self.instantiate_via_factory_method(bare, merged, ctx)?, None));
        }

        let handle = self.handle_for(bare, merged)?;

        let (constructor, arg_values) = match args {
            Some(explicit) => {
                let constructor = handle
                    .constructors()
                    .iter()
                    .find(|c| c.matches_args(explicit))
                    .ok_or_else(|| {
                        BeanError::initialization(
                            bare,
                            "no constructor matches the supplied arguments",
                        )
                    })?;
                (constructor, explicit.to_vec())
            }
            None => match merged.autowire_mode() {
                AutowireMode::Constructor => {
                    let constructor =
                        autowire::select_constructor(handle.constructors(), |param| {
                            self.slot_is_resolvable(param)
                        })
                        .ok_or_else(|| {
                            BeanError::initialization(bare, "no resolvable constructor")
                        })?;
                    let mut values = Vec::with_capacity(constructor.arity());
                    for param in constructor.params() {
                        values.push(self.resolve_constructor_arg(param, ctx)?);
                    }
                    (constructor, values)
                }
                _ => {
                    let constructor = handle.zero_arg_constructor().ok_or_else(|| {
                        BeanError::initialization(bare, "no zero-argument constructor")
                    })?;
                    (constructor, Vec::new())
                }
            },
        };

        let raw = constructor.invoke(&arg_values).map_err(|cause| {
            BeanError::initialization_with(bare, "constructor invocation failed", cause)
        })?;

        // From here the object exists; expose it to property-level consumers
        // so legitimate setter cycles between singletons can close.
        if merged.is_singleton() {
            self.singletons.put_early(bare, Arc::clone(&raw));
        }

        self.populate_properties(bare, merged, &handle, &raw, ctx)?;
        Ok((raw, Some(handle)))
    }

    fn instantiate_via_factory_method(
        &self,
        bare: &str,
        merged: &BeanDefinition,
        ctx: &mut ResolutionCtx,
    ) -> Result<BeanInstance> {
        let method = merged
            .factory_method_name()
            .expect("checked by uses_factory_method");
        let factory_name = merged.factory_bean_name().ok_or_else(|| {
            BeanError::initialization(bare, "factory method requires a factory bean name")
        })?;

        #[cfg(feature = "logging")]
        debug!(
            target: "bean_factory",
            bean = %bare,
            factory = %factory_name,
            method = %method,
            "Creating bean via factory method"
        );

        // The factory bean itself must exist first; this recursion is where
        // factory cycles surface.
        let factory = self.resolve_bean(factory_name, None, false, ctx)?;
        let factory_merged = self.merged_definition(factory_name)?;
        let spec = self
            .handle_for(factory_name, &factory_merged)?
            .factory_method(method)
            .map(Clone::clone)
            .ok_or_else(|| {
                BeanError::initialization(
                    bare,
                    format!("factory bean '{factory_name}' has no method '{method}'"),
                )
            })?;

        let product = spec.invoke(&factory).map_err(|cause| {
            BeanError::initialization_with(
                bare,
                format!("factory method '{method}' failed"),
                cause,
            )
        })?;

        if merged.is_singleton() {
            self.singletons.put_early(bare, Arc::clone(&product));
        }
        Ok(product)
    }

    fn populate_properties(
        &self,
        bare: &str,
        merged: &BeanDefinition,
        handle: &BeanType,
        instance: &BeanInstance,
        ctx: &mut ResolutionCtx,
    ) -> Result<()> {
        match merged.autowire_mode() {
            AutowireMode::ByName => {
                for slot in handle.properties() {
                    if self.registry.contains(slot.name()) {
                        let value = self.resolve_bean(slot.name(), None, true, ctx)?;
                        slot.apply(instance, value).map_err(|cause| {
                            BeanError::initialization_with(
                                bare,
                                format!("failed to set property '{}'", slot.name()),
                                cause,
                            )
                        })?;
                    } else if slot.is_required() {
                        return Err(BeanError::no_such_definition(slot.name()));
                    }
                }
            }
            AutowireMode::ByType => {
                for slot in handle.properties() {
                    let candidates = self.candidates_for(slot.value_type(), true);
                    match autowire::select_unique(slot.value_type_name(), &candidates)? {
                        Some(selected) => {
                            let value = self.resolve_bean(&selected, None, true, ctx)?;
                            slot.apply(instance, value).map_err(|cause| {
                                BeanError::initialization_with(
                                    bare,
                                    format!("failed to set property '{}'", slot.name()),
                                    cause,
                                )
                            })?;
                        }
                        None if slot.is_required() => {
                            return Err(BeanError::no_such_definition(slot.name()));
                        }
                        None => {}
                    }
                }
            }
            AutowireMode::No | AutowireMode::Constructor => {}
        }
        Ok(())
    }

    fn initialize(
        &self,
        bare: &str,
        merged: &BeanDefinition,
        instance: &BeanInstance,
        handle: Option<&BeanType>,
    ) -> Result<()> {
        let Some(init) = merged.init_method_name() else {
            return Ok(());
        };

        match handle.and_then(|h| h.invoke_method(init, instance)) {
            Some(Ok(())) => {
                #[cfg(feature = "logging")]
                trace!(target: "bean_factory", bean = %bare, method = %init, "Init method completed");
                Ok(())
            }
            Some(Err(cause)) => Err(BeanError::initialization_with(
                bare,
                format!("init method '{init}' failed"),
                cause,
            )),
            None if merged.enforce_init_method() => Err(BeanError::initialization(
                bare,
                format!("init method '{init}' not found"),
            )),
            None => Ok(()),
        }
    }

    /// Yield the bean itself for `&name` lookups, the factory product for
    /// plain lookups on factory beans, and the instance unchanged otherwise.
    fn apply_factory_dereference(
        &self,
        bare: &str,
        instance: BeanInstance,
        deref: bool,
    ) -> Result<BeanInstance> {
        let capability = self
            .resolved_types
            .get(bare)
            .and_then(|h| h.factory().cloned());

        match (deref, capability) {
            (true, Some(_)) => Ok(instance),
            (true, None) => Err(BeanError::NotAFactory {
                name: bare.to_string(),
            }),
            (false, Some(capability)) => self.product_of(bare, &capability, &instance),
            (false, None) => Ok(instance),
        }
    }

    /// Produce (or fetch) a factory bean's product for a plain-name lookup.
    ///
    /// Singleton-scoped factories hand out one shared product; production is
    /// serialized on the same per-name lock as bean creation, so concurrent
    /// first lookups invoke the factory exactly once and all observe the
    /// identical product. Prototype-scoped factories produce fresh, unlocked.
    fn product_of(
        &self,
        bare: &str,
        capability: &FactoryCapability,
        factory: &BeanInstance,
    ) -> Result<BeanInstance> {
        if let Some(product) = self.factory_products.get(bare) {
            return Ok(Arc::clone(product.value()));
        }
        if !self.merged_definition(bare)?.is_singleton() {
            return capability.produce(factory).map_err(|cause| {
                BeanError::initialization_with(bare, "factory bean product failed", cause)
            });
        }

        let lock = self.singletons.creation_lock(bare);
        let _guard = lock.lock().unwrap();
        if let Some(product) = self.factory_products.get(bare) {
            return Ok(Arc::clone(product.value()));
        }
        let product = capability.produce(factory).map_err(|cause| {
            BeanError::initialization_with(bare, "factory bean product failed", cause)
        })?;
        self.factory_products
            .insert(bare.to_string(), Arc::clone(&product));
        Ok(product)
    }

    // =========================================================================
    // Definition merging and type resolution
    // =========================================================================

    /// Merge a definition with its parent chain, memoizing the result.
    ///
    /// The walk is bounded by the visited set: a missing parent or a cycle
    /// in the chain is `InvalidHierarchy`, never an endless loop.
    fn merged_definition(&self, bare: &str) -> Result<Arc<BeanDefinition>> {
        if let Some(hit) = self.merged.get(bare) {
            return Ok(Arc::clone(hit.value()));
        }

        let mut merged = (*self.registry.get(bare)?).clone();
        let mut visited = vec![bare.to_string()];
        let mut next_parent = merged.parent_name().map(str::to_string);

        while let Some(parent_name) = next_parent {
            if visited.contains(&parent_name) {
                return Err(BeanError::InvalidHierarchy {
                    name: bare.to_string(),
                    reason: format!("cyclic parent chain through '{parent_name}'"),
                });
            }
            let parent = self.registry.get(&parent_name).map_err(|_| {
                BeanError::InvalidHierarchy {
                    name: bare.to_string(),
                    reason: format!("missing parent definition '{parent_name}'"),
                }
            })?;
            merged = merged.merged_with(&parent);
            next_parent = parent.parent_name().map(str::to_string);
            visited.push(parent_name);
        }

        let merged = Arc::new(merged);
        self.merged.insert(bare.to_string(), Arc::clone(&merged));
        Ok(merged)
    }

    /// Resolve the type handle for a bean, memoized per bean name.
    fn handle_for(&self, bare: &str, merged: &BeanDefinition) -> Result<Arc<BeanType>> {
        if let Some(hit) = self.resolved_types.get(bare) {
            return Ok(Arc::clone(hit.value()));
        }
        let type_name = merged.type_name().ok_or_else(|| {
            BeanError::initialization(bare, "definition declares neither a type nor a factory")
        })?;
        let handle = self.types.resolve(type_name)?;
        self.resolved_types
            .insert(bare.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    fn factory_method_spec(
        &self,
        bare: &str,
        merged: &BeanDefinition,
    ) -> Result<crate::types::FactoryMethodSpec> {
        let method = merged
            .factory_method_name()
            .expect("checked by uses_factory_method");
        let factory_name = merged.factory_bean_name().ok_or_else(|| {
            BeanError::initialization(bare, "factory method requires a factory bean name")
        })?;
        let factory_merged = self.merged_definition(factory_name)?;
        self.handle_for(factory_name, &factory_merged)?
            .factory_method(method)
            .map(Clone::clone)
            .ok_or_else(|| {
                BeanError::initialization(
                    bare,
                    format!("factory bean '{factory_name}' has no method '{method}'"),
                )
            })
    }

    // =========================================================================
    // Autowire candidate gathering
    // =========================================================================

    /// All definitions whose observable type is assignable to `target`, in
    /// registration order. `require_candidate_flag` applies the
    /// `autowire_candidate` filter used for dependency slots (top-level
    /// by-type lookups see everything).
    fn candidates_for(&self, target: TypeId, require_candidate_flag: bool) -> Vec<Candidate> {
        let mut out = Vec::new();
        for name in self.registry.names() {
            let Ok(merged) = self.merged_definition(&name) else {
                continue;
            };
            if merged.is_abstract() {
                continue;
            }
            if require_candidate_flag && !merged.is_autowire_candidate() {
                continue;
            }
            if self.definition_matches_type(&name, &merged, target) {
                out.push(Candidate {
                    primary: merged.is_primary(),
                    name,
                });
            }
        }
        out
    }

    /// Whether a plain-name lookup of this definition yields an instance
    /// assignable to `target`. Unresolvable type names are skipped quietly;
    /// lazy beans defer their resolution errors to first use.
    fn definition_matches_type(
        &self,
        name: &str,
        merged: &BeanDefinition,
        target: TypeId,
    ) -> bool {
        if merged.uses_factory_method() {
            return self
                .factory_method_spec(name, merged)
                .map(|spec| spec.product_type() == target)
                .unwrap_or(false);
        }
        let Ok(handle) = self.handle_for(name, merged) else {
            return false;
        };
        match handle.factory() {
            Some(capability) => capability.product_type() == target,
            None => handle.is_assignable_to(target),
        }
    }

    fn unique_bean_name_of(&self, target: TypeId, type_name: &'static str) -> Result<String> {
        let candidates = self.candidates_for(target, false);
        autowire::select_unique(type_name, &candidates)?.ok_or_else(|| {
            BeanError::no_such_definition(type_name)
        })
    }

    fn slot_is_resolvable(&self, param: &ParamSpec) -> bool {
        let candidates = self.candidates_for(param.type_id, true);
        matches!(
            autowire::select_unique(param.type_name, &candidates),
            Ok(Some(_))
        )
    }

    fn resolve_constructor_arg(
        &self,
        param: &ParamSpec,
        ctx: &mut ResolutionCtx,
    ) -> Result<BeanInstance> {
        let candidates = self.candidates_for(param.type_id, true);
        let selected = autowire::select_unique(param.type_name, &candidates)?
            .ok_or_else(|| BeanError::no_such_definition(&param.name))?;
        // Constructor dependencies can never lean on early references;
        // genuine constructor cycles must fail
        self.resolve_bean(&selected, None, false, ctx)
    }
}

impl Default for BeanFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BeanFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanFactory")
            .field("definition_count", &self.registry.len())
            .field("singleton_count", &self.singletons.len())
            .finish()
    }
}
