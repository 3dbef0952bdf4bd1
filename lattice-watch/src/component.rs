//! Component Instances
//!
//! The watch machinery only needs three things from a component: whether it
//! has mounted, whether it has been destroyed, and the scope that owns its
//! effects. Callers pass the owning instance explicitly when registering a
//! watch; there is no ambient "current instance".

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::reactive::EffectScope;

struct InstanceInner {
    uid: u64,
    name: String,
    mounted: AtomicBool,
    destroyed: AtomicBool,
    scope: EffectScope,
}

/// A component instance that owns watchers.
///
/// # Example
///
/// ```rust,ignore
/// let instance = ComponentInstance::new("Counter");
/// let handle = watch(count.clone(), on_change, WatchOptions::default(), Some(&instance));
///
/// instance.mount();
/// instance.unmount();  // stops every watcher the instance owns
/// ```
#[derive(Clone)]
pub struct ComponentInstance {
    inner: Arc<InstanceInner>,
}

impl ComponentInstance {
    /// Create an unmounted instance.
    pub fn new(name: impl Into<String>) -> Self {
        static UID: AtomicU64 = AtomicU64::new(0);
        Self {
            inner: Arc::new(InstanceInner {
                uid: UID.fetch_add(1, Ordering::Relaxed),
                name: name.into(),
                mounted: AtomicBool::new(false),
                destroyed: AtomicBool::new(false),
                scope: EffectScope::new(),
            }),
        }
    }

    /// Unique instance ID.
    pub fn uid(&self) -> u64 {
        self.inner.uid
    }

    /// The component name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Mark the instance as mounted.
    pub fn mount(&self) {
        self.inner.mounted.store(true, Ordering::SeqCst);
        tracing::debug!(component = %self.inner.name, uid = self.inner.uid, "mounted");
    }

    /// Stop every effect the instance owns and mark it destroyed.
    pub fn unmount(&self) {
        if self.inner.destroyed.load(Ordering::SeqCst) {
            return;
        }
        self.inner.scope.stop();
        self.inner.destroyed.store(true, Ordering::SeqCst);
        tracing::debug!(component = %self.inner.name, uid = self.inner.uid, "unmounted");
    }

    /// Whether the instance is mounted.
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// Whether the instance has been unmounted.
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// The scope owning this instance's effects.
    pub fn scope(&self) -> &EffectScope {
        &self.inner.scope
    }

    /// A weak handle that does not keep the instance alive.
    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("uid", &self.inner.uid)
            .field("name", &self.inner.name)
            .field("mounted", &self.is_mounted())
            .field("destroyed", &self.is_destroyed())
            .field("effects", &self.inner.scope.len())
            .finish()
    }
}

/// Weak counterpart of [`ComponentInstance`].
#[derive(Clone)]
pub struct WeakInstance {
    inner: Weak<InstanceInner>,
}

impl WeakInstance {
    pub fn upgrade(&self) -> Option<ComponentInstance> {
        self.inner.upgrade().map(|inner| ComponentInstance { inner })
    }
}

impl std::fmt::Debug for WeakInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakInstance")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
