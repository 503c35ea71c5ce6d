//! End-to-end authorization tests
//!
//! Config tree → RoleGraph → Authorizer → grant decisions, including
//! assertions and concurrent use.

use cretoai_rbac::{
    AccessContext, Assertion, AssertionError, AttributeEquals, Authorizer, AuthorizerConfig,
    DefaultDecision, RbacConfig, RbacError, Role, RoleGraph,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn blog_config() -> RbacConfig {
    RbacConfig::from_value(&json!({
        "authorization-rbac": {
            "roles": {
                "administrator": [],
                "editor": ["administrator"],
                "contributor": ["editor"],
            },
            "permissions": {
                "contributor": ["admin.dashboard", "admin.posts"],
                "editor": ["admin.publish"],
                "administrator": ["admin.settings"],
            },
        }
    }))
    .unwrap()
}

fn blog_authorizer() -> Authorizer {
    Authorizer::from_config(&blog_config()).unwrap()
}

// ============================================================================
// DECISION FLOW
// ============================================================================

#[test]
fn test_blog_hierarchy_decisions() {
    let authorizer = blog_authorizer();

    assert!(authorizer.is_granted("contributor", "admin.settings", None).unwrap());
    assert!(authorizer.is_granted("contributor", "admin.publish", None).unwrap());
    assert!(authorizer.is_granted("contributor", "admin.posts", None).unwrap());
    assert!(authorizer.is_granted("editor", "admin.settings", None).unwrap());

    // permissions never flow from child to parent
    assert!(!authorizer.is_granted("administrator", "admin.dashboard", None).unwrap());
    assert!(!authorizer.is_granted("administrator", "admin.publish", None).unwrap());
    assert!(!authorizer.is_granted("editor", "admin.posts", None).unwrap());
}

#[test]
fn test_unlisted_resource_denied() {
    let authorizer = blog_authorizer();
    assert!(!authorizer.is_granted("contributor", "admin.users", None).unwrap());
}

#[test]
fn test_empty_role_or_resource_denied_without_error() {
    let authorizer = blog_authorizer();

    assert!(!authorizer.is_granted("", "resource", None).unwrap());
    assert!(!authorizer.is_granted("role", "", None).unwrap());

    let stats = authorizer.stats();
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.errors, 0);
}

#[test]
fn test_allow_default_from_config() {
    let config = RbacConfig::from_value(&json!({
        "authorization-rbac": {
            "roles": {},
            "permissions": {},
            "default_decision": "allow",
        }
    }))
    .unwrap();
    let authorizer = Authorizer::from_config(&config).unwrap();

    assert_eq!(authorizer.config().default_decision, DefaultDecision::Allow);
    assert!(authorizer.is_granted("", "anything", None).unwrap());
}

#[test]
fn test_unknown_role_reported_as_check_failure() {
    let authorizer = blog_authorizer();
    let err = authorizer.is_granted("subscriber", "admin.posts", None).unwrap_err();

    match err {
        RbacError::AuthorizationCheck { source } => {
            assert!(source.to_string().contains("subscriber"));
        }
        other => panic!("Expected AuthorizationCheck, got {:?}", other),
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

#[test]
fn test_always_false_assertion_vetoes_grant() {
    let never = |_: &Role, _: &str, _: Option<&AccessContext>| false;
    let authorizer = blog_authorizer().with_assertion(Arc::new(never));

    assert!(!authorizer.is_granted("contributor", "admin.posts", None).unwrap());
    assert!(!authorizer.is_granted("administrator", "admin.settings", None).unwrap());
}

#[test]
fn test_context_reaches_assertion() {
    let authorizer = blog_authorizer().with_assertion(Arc::new(AttributeEquals::new(
        "owner",
        "alice",
    )));

    let alice = AccessContext::new().with_attribute("owner", "alice");
    let bob = AccessContext::new().with_attribute("owner", "bob");

    assert!(authorizer.is_granted("contributor", "admin.posts", Some(&alice)).unwrap());
    assert!(!authorizer.is_granted("contributor", "admin.posts", Some(&bob)).unwrap());
    assert!(!authorizer.is_granted("contributor", "admin.posts", None).unwrap());
}

/// Grants only to roles that inherit from `editor`, counting invocations
struct EditorLineage {
    calls: AtomicUsize,
}

impl Assertion for EditorLineage {
    fn assert(
        &self,
        graph: &RoleGraph,
        role: &Role,
        _resource: &str,
        _context: Option<&AccessContext>,
    ) -> Result<bool, AssertionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        graph
            .inherits_from(role.name(), "editor")
            .map_err(|e| AssertionError::new(e.to_string()))
    }
}

#[test]
fn test_assertion_sees_graph_and_role() {
    let assertion = Arc::new(EditorLineage {
        calls: AtomicUsize::new(0),
    });
    let authorizer = blog_authorizer().with_assertion(assertion.clone());

    assert!(authorizer.is_granted("contributor", "admin.settings", None).unwrap());
    assert!(!authorizer.is_granted("editor", "admin.settings", None).unwrap());

    // no permission, assertion not consulted
    assert!(!authorizer.is_granted("administrator", "admin.posts", None).unwrap());

    assert_eq!(assertion.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_assertion_failure_wrapped() {
    let failing = |_: &Role, _: &str, _: Option<&AccessContext>| -> bool {
        panic!("must not be called for a denied permission")
    };
    let authorizer = blog_authorizer().with_assertion(Arc::new(failing));
    assert!(!authorizer.is_granted("administrator", "admin.posts", None).unwrap());

    struct Broken;
    impl Assertion for Broken {
        fn assert(
            &self,
            _graph: &RoleGraph,
            _role: &Role,
            _resource: &str,
            _context: Option<&AccessContext>,
        ) -> Result<bool, AssertionError> {
            Err(AssertionError::new("policy backend offline"))
        }
    }

    let authorizer = blog_authorizer().with_assertion(Arc::new(Broken));
    let err = authorizer.is_granted("editor", "admin.publish", None).unwrap_err();

    assert!(matches!(err, RbacError::AuthorizationCheck { .. }));
    assert!(err.to_string().contains("Could not check authorization"));
    assert!(err.to_string().contains("policy backend offline"));
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn test_concurrent_checks_with_shared_assertion() {
    let authorizer = blog_authorizer()
        .with_config(AuthorizerConfig::default())
        .with_assertion(Arc::new(AttributeEquals::new("tenant", "acme")));

    thread::scope(|scope| {
        for i in 0..8 {
            let authorizer = authorizer.clone();
            scope.spawn(move || {
                let tenant = if i % 2 == 0 { "acme" } else { "globex" };
                let context = AccessContext::new().with_attribute("tenant", tenant);

                for _ in 0..200 {
                    let granted = authorizer
                        .is_granted("contributor", "admin.settings", Some(&context))
                        .unwrap();
                    assert_eq!(granted, tenant == "acme");
                }
            });
        }
    });

    let stats = authorizer.stats();
    assert_eq!(stats.total_checks, 1600);
    assert_eq!(stats.granted, 800);
    assert_eq!(stats.denied, 800);
}
