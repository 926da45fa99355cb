//! Per-entry hook dispatch.

use lifecycle_core::{HookStage, RegistrationEntry, Side};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// How a controller runs an entry's hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// `create`, then `register`.
    Common,
    /// `create`, then `register`, then `register_client`.
    Client,
}

/// The stage at which an entry stopped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub stage: HookStage,
    pub message: String,
}

impl DispatchStrategy {
    pub fn for_side(side: Side) -> Self {
        if side.is_client() {
            Self::Client
        } else {
            Self::Common
        }
    }

    pub fn stages(&self) -> &'static [HookStage] {
        match self {
            Self::Common => &[HookStage::Create, HookStage::Register],
            Self::Client => &[
                HookStage::Create,
                HookStage::Register,
                HookStage::RegisterClient,
            ],
        }
    }

    /// Run the entry's stages in order, stopping at the first failure.
    ///
    /// A panicking hook counts as a failure of its stage.
    pub fn dispatch(&self, entry: &dyn RegistrationEntry) -> Result<(), HookFailure> {
        for &stage in self.stages() {
            run_stage(entry, stage)?;
        }
        Ok(())
    }
}

fn run_stage(entry: &dyn RegistrationEntry, stage: HookStage) -> Result<(), HookFailure> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match stage {
        HookStage::Create => entry.create(),
        HookStage::Register => entry.register(),
        HookStage::RegisterClient => entry.register_client(),
    }));

    let message = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(err)) => format!("{err:#}"),
        Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
    };
    Err(HookFailure { stage, message })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
