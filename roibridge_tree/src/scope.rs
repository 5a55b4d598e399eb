// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped "current session" tracking.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// A stack of active sessions with RAII scopes.
///
/// [`enter`](Self::enter) pushes a session and returns a guard that pops it
/// again when dropped, on every exit path including early returns and
/// unwinding. The innermost scope is [`current`](Self::current).
///
/// The stack is deliberately not `Sync`: it belongs to one thread of control
/// and is passed explicitly to code that needs the current session.
pub struct SessionStack<S> {
    stack: RefCell<Vec<Arc<S>>>,
}

impl<S> Default for SessionStack<S> {
    fn default() -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
        }
    }
}

impl<S> fmt::Debug for SessionStack<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStack")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl<S> SessionStack<S> {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `session` current until the returned scope is dropped.
    #[must_use = "the session is popped as soon as the scope is dropped"]
    pub fn enter(&self, session: Arc<S>) -> SessionScope<'_, S> {
        self.stack.borrow_mut().push(Arc::clone(&session));
        SessionScope {
            stack: self,
            session,
        }
    }

    /// The innermost active session.
    pub fn current(&self) -> Option<Arc<S>> {
        self.stack.borrow().last().cloned()
    }

    /// Number of active scopes.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }
}

/// Guard returned by [`SessionStack::enter`].
pub struct SessionScope<'a, S> {
    stack: &'a SessionStack<S>,
    session: Arc<S>,
}

impl<S> SessionScope<'_, S> {
    /// The session this scope made current.
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }
}

impl<S> fmt::Debug for SessionScope<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionScope")
            .field("depth", &self.stack.depth())
            .finish_non_exhaustive()
    }
}

impl<S> Drop for SessionScope<'_, S> {
    fn drop(&mut self) {
        self.stack.stack.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    #[test]
    fn nested_scopes_restore_outer_session() {
        let stack = SessionStack::new();
        let outer = stack.enter(Arc::new("outer"));
        {
            let _inner = stack.enter(Arc::new("inner"));
            assert_eq!(stack.current().as_deref(), Some(&"inner"));
            assert_eq!(stack.depth(), 2);
        }
        assert_eq!(stack.current().as_deref(), Some(&"outer"));
        assert_eq!(**outer.session(), "outer");
        drop(outer);
        assert!(stack.current().is_none());
    }

    #[test]
    fn scope_pops_on_early_return() {
        fn parse_in_scope(stack: &SessionStack<u32>, input: &str) -> Result<u32, String> {
            let _scope = stack.enter(Arc::new(7));
            let n = input.parse::<u32>().map_err(|e| e.to_string())?;
            Ok(n)
        }
        let stack = SessionStack::new();
        assert!(parse_in_scope(&stack, "x").is_err());
        assert_eq!(stack.depth(), 0);
        assert_eq!(parse_in_scope(&stack, "3"), Ok(3));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn scope_pops_on_panic() {
        let stack = SessionStack::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _scope = stack.enter(Arc::new(1_u8));
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(stack.depth(), 0);
    }
}
