//! Declarative bean metadata
//!
//! A [`BeanDefinition`] describes how one managed object is constructed and
//! managed: its type name, scope, wiring strategy, lifecycle methods, and
//! relationship to a parent template definition. Definitions carry no
//! resolution logic themselves; the container turns them into live instances.

/// Bean scope: how instances are shared between lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BeanScope {
    /// One instance per name, created once and reused for the container lifetime
    #[default]
    Singleton,
    /// A fresh instance on every lookup, never cached
    Prototype,
}

/// Strategy for filling a bean's unresolved dependency slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutowireMode {
    /// Only explicitly configured references are used
    #[default]
    No,
    /// Property slots are matched against registered bean names
    ByName,
    /// Property slots are matched against assignable candidate types
    ByType,
    /// Constructor parameters are matched by type; the widest fully
    /// resolvable constructor wins
    Constructor,
}

/// Declarative description of one managed bean.
///
/// Fields that participate in parent-template inheritance are `Option`s:
/// `None` means "not set here, inherit from the parent definition" (falling
/// back to the documented default when there is no parent). `abstract_bean`,
/// `synthetic`, and `depends_on` are never inherited implicitly.
///
/// A definition is treated as immutable once resolution has begun for its
/// name: the container memoizes the merged definition on first use, so later
/// mutation of the registered value has no effect on that name.
///
/// # Examples
///
/// ```rust
/// use bean_factory::{BeanDefinition, BeanScope, AutowireMode};
///
/// let def = BeanDefinition::of("app::Database")
///     .with_scope(BeanScope::Singleton)
///     .with_autowire_mode(AutowireMode::ByType)
///     .with_init_method("connect")
///     .with_depends_on(["migrations"]);
///
/// assert!(def.is_singleton());
/// assert_eq!(def.depends_on(), &["migrations".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BeanDefinition {
    type_name: Option<String>,
    parent_name: Option<String>,
    factory_bean_name: Option<String>,
    factory_method_name: Option<String>,
    scope: Option<BeanScope>,
    lazy_init: Option<bool>,
    abstract_bean: bool,
    autowire_mode: Option<AutowireMode>,
    depends_on: Vec<String>,
    autowire_candidate: Option<bool>,
    primary: Option<bool>,
    init_method_name: Option<String>,
    enforce_init_method: bool,
    destroy_method_name: Option<String>,
    enforce_destroy_method: bool,
    synthetic: bool,
    description: Option<String>,
    origin: Option<String>,
}

impl BeanDefinition {
    /// Create an empty definition with no type name.
    ///
    /// Useful for abstract parent templates that only carry shared settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a definition for the given registered type name.
    #[inline]
    pub fn of(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// Create a child definition inheriting from a parent template.
    #[inline]
    pub fn child_of(parent_name: impl Into<String>) -> Self {
        Self {
            parent_name: Some(parent_name.into()),
            ..Self::default()
        }
    }

    // =========================================================================
    // Chainable setters
    // =========================================================================

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_parent(mut self, parent_name: impl Into<String>) -> Self {
        self.parent_name = Some(parent_name.into());
        self
    }

    /// Delegate construction to a named method on another bean.
    pub fn with_factory(
        mut self,
        factory_bean_name: impl Into<String>,
        factory_method_name: impl Into<String>,
    ) -> Self {
        self.factory_bean_name = Some(factory_bean_name.into());
        self.factory_method_name = Some(factory_method_name.into());
        self
    }

    pub fn with_scope(mut self, scope: BeanScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_lazy_init(mut self, lazy_init: bool) -> Self {
        self.lazy_init = Some(lazy_init);
        self
    }

    /// Mark this definition as a pure parent template, never instantiable.
    pub fn as_abstract(mut self) -> Self {
        self.abstract_bean = true;
        self
    }

    pub fn with_autowire_mode(mut self, mode: AutowireMode) -> Self {
        self.autowire_mode = Some(mode);
        self
    }

    /// Beans that must be fully created before this one, in order.
    pub fn with_depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_autowire_candidate(mut self, candidate: bool) -> Self {
        self.autowire_candidate = Some(candidate);
        self
    }

    /// Mark this bean as the tie-breaker among multiple type matches.
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = Some(primary);
        self
    }

    /// Explicitly configured init method; missing methods are an error.
    pub fn with_init_method(mut self, name: impl Into<String>) -> Self {
        self.init_method_name = Some(name.into());
        self.enforce_init_method = true;
        self
    }

    /// Inferred init method; silently skipped when the type has no such method.
    pub fn with_inferred_init_method(mut self, name: impl Into<String>) -> Self {
        self.init_method_name = Some(name.into());
        self.enforce_init_method = false;
        self
    }

    /// Explicitly configured destroy method; missing methods are an error.
    pub fn with_destroy_method(mut self, name: impl Into<String>) -> Self {
        self.destroy_method_name = Some(name.into());
        self.enforce_destroy_method = true;
        self
    }

    /// Inferred destroy method; silently skipped when the type has no such method.
    pub fn with_inferred_destroy_method(mut self, name: impl Into<String>) -> Self {
        self.destroy_method_name = Some(name.into());
        self.enforce_destroy_method = false;
        self
    }

    /// Mark as infrastructure-created, hidden from user-facing introspection.
    pub fn as_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Record the originating resource (diagnostics only).
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    // =========================================================================
    // Accessors (with defaults applied)
    // =========================================================================

    #[inline]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    #[inline]
    pub fn parent_name(&self) -> Option<&str> {
        self.parent_name.as_deref()
    }

    #[inline]
    pub fn factory_bean_name(&self) -> Option<&str> {
        self.factory_bean_name.as_deref()
    }

    #[inline]
    pub fn factory_method_name(&self) -> Option<&str> {
        self.factory_method_name.as_deref()
    }

    /// Effective scope, defaulting to singleton when unset.
    #[inline]
    pub fn scope(&self) -> BeanScope {
        self.scope.unwrap_or_default()
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.scope() == BeanScope::Singleton
    }

    #[inline]
    pub fn is_prototype(&self) -> bool {
        self.scope() == BeanScope::Prototype
    }

    #[inline]
    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init.unwrap_or(false)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.abstract_bean
    }

    #[inline]
    pub fn autowire_mode(&self) -> AutowireMode {
        self.autowire_mode.unwrap_or_default()
    }

    #[inline]
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    #[inline]
    pub fn is_autowire_candidate(&self) -> bool {
        self.autowire_candidate.unwrap_or(true)
    }

    #[inline]
    pub fn is_primary(&self) -> bool {
        self.primary.unwrap_or(false)
    }

    #[inline]
    pub fn init_method_name(&self) -> Option<&str> {
        self.init_method_name.as_deref()
    }

    #[inline]
    pub fn enforce_init_method(&self) -> bool {
        self.enforce_init_method
    }

    #[inline]
    pub fn destroy_method_name(&self) -> Option<&str> {
        self.destroy_method_name.as_deref()
    }

    #[inline]
    pub fn enforce_destroy_method(&self) -> bool {
        self.enforce_destroy_method
    }

    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Whether construction is delegated to a factory bean method.
    #[inline]
    pub fn uses_factory_method(&self) -> bool {
        self.factory_method_name.is_some()
    }

    // =========================================================================
    // Parent-template merging
    // =========================================================================

    /// Merge this (child) definition over a parent template.
    ///
    /// Child-set fields win; unset child fields inherit the parent's values.
    /// `abstract_bean` and `synthetic` come from the child only, and the
    /// result never carries a `parent_name` (the chain is already flattened
    /// by the caller). Init/destroy methods inherit together with their
    /// enforce flags.
    pub fn merged_with(&self, parent: &BeanDefinition) -> BeanDefinition {
        let (init_method_name, enforce_init_method) = if self.init_method_name.is_some() {
            (self.init_method_name.clone(), self.enforce_init_method)
        } else {
            (parent.init_method_name.clone(), parent.enforce_init_method)
        };
        let (destroy_method_name, enforce_destroy_method) = if self.destroy_method_name.is_some() {
            (self.destroy_method_name.clone(), self.enforce_destroy_method)
        } else {
            (
                parent.destroy_method_name.clone(),
                parent.enforce_destroy_method,
            )
        };

        BeanDefinition {
            type_name: self.type_name.clone().or_else(|| parent.type_name.clone()),
            parent_name: None,
            factory_bean_name: self
                .factory_bean_name
                .clone()
                .or_else(|| parent.factory_bean_name.clone()),
            factory_method_name: self
                .factory_method_name
                .clone()
                .or_else(|| parent.factory_method_name.clone()),
            scope: self.scope.or(parent.scope),
            lazy_init: self.lazy_init.or(parent.lazy_init),
            abstract_bean: self.abstract_bean,
            autowire_mode: self.autowire_mode.or(parent.autowire_mode),
            depends_on: if self.depends_on.is_empty() {
                parent.depends_on.clone()
            } else {
                self.depends_on.clone()
            },
            autowire_candidate: self.autowire_candidate.or(parent.autowire_candidate),
            primary: self.primary.or(parent.primary),
            init_method_name,
            enforce_init_method,
            destroy_method_name,
            enforce_destroy_method,
            synthetic: self.synthetic,
            description: self
                .description
                .clone()
                .or_else(|| parent.description.clone()),
            origin: self.origin.clone().or_else(|| parent.origin.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let def = BeanDefinition::of("Foo");
        assert!(def.is_singleton());
        assert!(!def.is_prototype());
        assert!(!def.is_lazy_init());
        assert!(!def.is_abstract());
        assert!(def.is_autowire_candidate());
        assert!(!def.is_primary());
        assert_eq!(def.autowire_mode(), AutowireMode::No);
        assert!(def.depends_on().is_empty());
    }

    #[test]
    fn test_merge_child_overrides_parent() {
        let parent = BeanDefinition::of("Base")
            .with_scope(BeanScope::Prototype)
            .with_init_method("setup")
            .as_abstract();

        let child = BeanDefinition::child_of("base")
            .with_type_name("Derived")
            .with_scope(BeanScope::Singleton);

        let merged = child.merged_with(&parent);
        assert_eq!(merged.type_name(), Some("Derived"));
        assert!(merged.is_singleton());
        // Inherited from parent
        assert_eq!(merged.init_method_name(), Some("setup"));
        assert!(merged.enforce_init_method());
        // Never inherited
        assert!(!merged.is_abstract());
        assert!(merged.parent_name().is_none());
    }

    #[test]
    fn test_merge_unset_child_fields_inherit() {
        let parent = BeanDefinition::of("Base")
            .with_lazy_init(true)
            .with_autowire_mode(AutowireMode::ByName)
            .with_primary(true)
            .with_depends_on(["other"]);

        let merged = BeanDefinition::child_of("base").merged_with(&parent);
        assert!(merged.is_lazy_init());
        assert_eq!(merged.autowire_mode(), AutowireMode::ByName);
        assert!(merged.is_primary());
        assert_eq!(merged.depends_on(), &["other".to_string()]);
    }

    #[test]
    fn test_merge_child_depends_on_replaces_parent() {
        let parent = BeanDefinition::of("Base").with_depends_on(["a", "b"]);
        let child = BeanDefinition::child_of("base").with_depends_on(["c"]);
        let merged = child.merged_with(&parent);
        assert_eq!(merged.depends_on(), &["c".to_string()]);
    }

    #[test]
    fn test_inferred_lifecycle_methods_not_enforced() {
        let def = BeanDefinition::of("Foo")
            .with_inferred_init_method("init")
            .with_inferred_destroy_method("close");
        assert!(!def.enforce_init_method());
        assert!(!def.enforce_destroy_method());

        let def = BeanDefinition::of("Foo")
            .with_init_method("init")
            .with_destroy_method("close");
        assert!(def.enforce_init_method());
        assert!(def.enforce_destroy_method());
    }
}
