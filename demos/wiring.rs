//! Example demonstrating declarative bean wiring
//!
//! Run with:
//!   cargo run --example wiring

use bean_factory::{
    AutowireMode, BeanDefinition, BeanFactory, BeanScope, BeanType, TypeRegistry,
};
use std::sync::{Arc, OnceLock};

struct Database {
    url: String,
}

struct AuditLog {
    prefix: &'static str,
}

impl AuditLog {
    fn record(&self, event: &str) {
        println!("{} {}", self.prefix, event);
    }
}

struct UserService {
    db: OnceLock<Arc<Database>>,
    audit: OnceLock<Arc<AuditLog>>,
}

impl UserService {
    fn describe(&self) -> String {
        match self.db.get() {
            Some(db) => format!("UserService connected to {}", db.url),
            None => "UserService (not wired)".to_string(),
        }
    }
}

struct SessionToken {
    value: String,
}

fn main() {
    // Construction metadata: one handle per concrete type
    let types = Arc::new(TypeRegistry::new());
    types.register(
        BeanType::builder::<Database>("Database")
            .constructor0(|| Database {
                url: "postgres://localhost/app".to_string(),
            })
            .build(),
    );
    types.register(
        BeanType::builder::<AuditLog>("AuditLog")
            .constructor0(|| AuditLog { prefix: "[audit]" })
            .build(),
    );
    types.register(
        BeanType::builder::<UserService>("UserService")
            .constructor0(|| UserService {
                db: OnceLock::new(),
                audit: OnceLock::new(),
            })
            .property("db", |svc: &UserService, db: Arc<Database>| {
                let _ = svc.db.set(db);
            })
            .property("audit", |svc: &UserService, audit: Arc<AuditLog>| {
                let _ = svc.audit.set(audit);
            })
            .build(),
    );
    types.register(
        BeanType::builder::<SessionToken>("SessionToken")
            .constructor0(|| SessionToken {
                value: format!("session-{:x}", std::process::id()),
            })
            .build(),
    );

    // Declarative definitions: names, scopes, and wiring strategy
    let factory = BeanFactory::with_types(types);
    factory
        .register_bean_definition("db", BeanDefinition::of("Database"))
        .unwrap();
    factory
        .register_bean_definition("audit", BeanDefinition::of("AuditLog"))
        .unwrap();
    factory
        .register_bean_definition(
            "users",
            BeanDefinition::of("UserService")
                .with_autowire_mode(AutowireMode::ByType)
                .with_depends_on(["audit"]),
        )
        .unwrap();
    factory
        .register_bean_definition(
            "session",
            BeanDefinition::of("SessionToken").with_scope(BeanScope::Prototype),
        )
        .unwrap();

    // Eagerly create everything that is not lazy
    factory.pre_instantiate_singletons().unwrap();

    let users = factory.get_bean_as::<UserService>("users").unwrap();
    println!("{}", users.describe());
    if let Some(audit) = users.audit.get() {
        audit.record("user service resolved");
    }

    // Singletons are shared; prototypes are fresh every time
    let again = factory.get_bean_as::<UserService>("users").unwrap();
    println!("same instance: {}", Arc::ptr_eq(&users, &again));

    let s1 = factory.get_bean_as::<SessionToken>("session").unwrap();
    let s2 = factory.get_bean_as::<SessionToken>("session").unwrap();
    println!(
        "prototype tokens: {} / {} (shared: {})",
        s1.value,
        s2.value,
        Arc::ptr_eq(&s1, &s2)
    );

    // By-type lookup works when the type is unambiguous
    let db = factory.get_bean_of_type::<Database>().unwrap();
    println!("by-type lookup found {}", db.url);

    factory.destroy_singletons();
}
