//! Per-thread stack of controllers with an open phase window.
//!
//! Entries running inside a hook have no reference to the controller driving
//! them; [`peek_head`] gives them one. The stack is thread-local so
//! controllers driven on different threads never see each other.

use std::cell::RefCell;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::controller::ProxyController;
use crate::error::{OrchestratorError, Result};

thread_local! {
    static ACTIVE: RefCell<Vec<Arc<ProxyController>>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn push(controller: Arc<ProxyController>) {
    ACTIVE.with(|stack| stack.borrow_mut().push(controller));
}

/// Pop `controller`, which must be the top frame.
pub(crate) fn pop(controller: &ProxyController) -> Result<()> {
    ACTIVE.with(|stack| {
        let mut stack = stack.borrow_mut();
        let Some(position) = stack.iter().rposition(|frame| frame.id() == controller.id()) else {
            return Err(OrchestratorError::NotActive(controller.id()));
        };

        if position + 1 != stack.len() {
            let blocking = stack[position + 1..]
                .iter()
                .rev()
                .map(|frame| frame.id())
                .collect();
            return Err(OrchestratorError::StackDiscipline {
                controller: controller.id(),
                blocking,
            });
        }

        stack.pop();
        Ok(())
    })
}

/// Controller whose window is innermost on this thread.
pub fn peek_head() -> Option<Arc<ProxyController>> {
    ACTIVE.with(|stack| stack.borrow().last().cloned())
}

pub fn depth() -> usize {
    ACTIVE.with(|stack| stack.borrow().len())
}

/// Ids of the active controllers, top first.
pub fn frames() -> Vec<Uuid> {
    ACTIVE.with(|stack| stack.borrow().iter().rev().map(|frame| frame.id()).collect())
}

/// A pushed frame that must be left explicitly.
///
/// If it is dropped without [`StackFrame::leave`] (a panic escaped the
/// window) the frame is removed wherever it sits so the thread's stack does
/// not keep a dead controller.
pub(crate) struct StackFrame {
    controller: Arc<ProxyController>,
    left: bool,
}

impl StackFrame {
    pub(crate) fn enter(controller: Arc<ProxyController>) -> Self {
        push(Arc::clone(&controller));
        Self {
            controller,
            left: false,
        }
    }

    pub(crate) fn leave(mut self) -> Result<()> {
        self.left = true;
        pop(&self.controller)
    }
}

impl Drop for StackFrame {
    fn drop(&mut self) {
        if self.left {
            return;
        }
        warn!(
            controller = %self.controller.id(),
            "Phase window unwound without leaving; dropping its stack frame"
        );
        let id = self.controller.id();
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(position) = stack.iter().rposition(|frame| frame.id() == id) {
                stack.remove(position);
            }
        });
    }
}
