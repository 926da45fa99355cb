//! The contract deferred registration work implements.
//!
//! Block, item and recipe builders live outside this workspace; all a
//! controller needs from them is what [`RegistrationEntry`] exposes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::phase::LifecyclePhase;

/// The three hooks of an entry, in the order they run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HookStage {
    Create,
    Register,
    RegisterClient,
}

impl HookStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Register => "register",
            Self::RegisterClient => "register_client",
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of deferred work bound to one lifecycle phase.
///
/// The controller calls `create`, then `register` if that succeeded, then
/// (client controllers only) `register_client` if `register` succeeded.
pub trait RegistrationEntry: Send + Sync {
    /// Phase in which this entry runs. Must not change over the entry's life.
    fn target_phase(&self) -> LifecyclePhase;

    /// Build whatever this entry registers. Do not register here.
    fn create(&self) -> anyhow::Result<()>;

    fn register(&self) -> anyhow::Result<()>;

    /// Client-only registration (renderers, models). Never called on a server.
    fn register_client(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Label used in logs and events when this entry fails.
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Shared handle to an entry. The controller only schedules through it.
pub type EntryHandle = Arc<dyn RegistrationEntry>;

type Hook = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// An entry assembled from closures.
///
/// # Example
///
/// ```
/// use lifecycle_core::{FnEntry, LifecyclePhase};
///
/// let entry = FnEntry::new("copper_ore", LifecyclePhase::PreInit)
///     .on_create(|| Ok(()))
///     .on_register(|| Ok(()));
/// ```
pub struct FnEntry {
    name: String,
    phase: LifecyclePhase,
    create: Option<Hook>,
    register: Option<Hook>,
    register_client: Option<Hook>,
}

impl FnEntry {
    pub fn new(name: impl Into<String>, phase: LifecyclePhase) -> Self {
        Self {
            name: name.into(),
            phase,
            create: None,
            register: None,
            register_client: None,
        }
    }

    pub fn on_create<F>(mut self, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.create = Some(Box::new(f));
        self
    }

    pub fn on_register<F>(mut self, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register = Some(Box::new(f));
        self
    }

    pub fn on_register_client<F>(mut self, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register_client = Some(Box::new(f));
        self
    }

    pub fn into_handle(self) -> EntryHandle {
        Arc::new(self)
    }

    fn run(hook: &Option<Hook>) -> anyhow::Result<()> {
        match hook {
            Some(f) => f(),
            None => Ok(()),
        }
    }
}

impl RegistrationEntry for FnEntry {
    fn target_phase(&self) -> LifecyclePhase {
        self.phase
    }

    fn create(&self) -> anyhow::Result<()> {
        Self::run(&self.create)
    }

    fn register(&self) -> anyhow::Result<()> {
        Self::run(&self.register)
    }

    fn register_client(&self) -> anyhow::Result<()> {
        Self::run(&self.register_client)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

impl fmt::Debug for FnEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEntry")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("create", &self.create.is_some())
            .field("register", &self.register.is_some())
            .field("register_client", &self.register_client.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ore;

    impl RegistrationEntry for Ore {
        fn target_phase(&self) -> LifecyclePhase {
            LifecyclePhase::Init
        }

        fn create(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn register(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_name_and_register_client() {
        let ore = Ore;
        assert!(ore.name().ends_with("Ore"));
        assert!(ore.register_client().is_ok());
    }

    #[test]
    fn test_fn_entry_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let entry = FnEntry::new("tin_ingot", LifecyclePhase::PreInit)
            .on_register(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on_register_client(|| anyhow::bail!("no renderer"));

        assert_eq!(entry.target_phase(), LifecyclePhase::PreInit);
        assert_eq!(entry.name(), "tin_ingot");
        assert!(entry.create().is_ok());
        assert!(entry.register().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            entry.register_client().unwrap_err().to_string(),
            "no renderer"
        );
    }

    #[test]
    fn test_fn_entry_debug() {
        let entry = FnEntry::new("lamp", LifecyclePhase::Init).on_create(|| Ok(()));
        let rendered = format!("{:?}", entry);
        assert!(rendered.contains("lamp"));
        assert!(rendered.contains("create: true"));
        assert!(rendered.contains("register: false"));
    }
}
