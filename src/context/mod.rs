//! Request context
//!
//! A [`Context`] carries the three things every pipeline call needs to see:
//! a cancellation token, an optional deadline and the tracing span the
//! operation runs under. It is passed explicitly through every sender and
//! obsreport call instead of living in thread-local state.

mod error;

pub use error::ContextError;

use std::ops::Deref;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::Span;

#[derive(Debug, Clone)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    span: Span,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// Root context: never cancelled unless its token is, no deadline, no span.
    pub fn background() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
            span: Span::none(),
        }
    }

    /// Child context that is cancelled together with `self`, or earlier
    /// through the returned token.
    pub fn with_cancel(&self) -> (Context, CancellationToken) {
        let token = self.cancel.child_token();
        let ctx = Context {
            cancel: token.clone(),
            deadline: self.deadline,
            span: self.span.clone(),
        };
        (ctx, token)
    }

    /// Child context whose deadline is at most `timeout` from now.
    ///
    /// The child is released (its token cancelled and unregistered from the
    /// parent) when the returned guard is dropped.
    pub fn with_timeout(&self, timeout: Duration) -> ScopedContext {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context whose deadline is the earlier of `deadline` and the
    /// parent's deadline.
    pub fn with_deadline(&self, deadline: Instant) -> ScopedContext {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        let token = self.cancel.child_token();
        ScopedContext {
            ctx: Context {
                cancel: token.clone(),
                deadline: Some(deadline),
                span: self.span.clone(),
            },
            _guard: token.drop_guard(),
        }
    }

    /// Same cancellation and deadline, different span.
    pub fn with_span(&self, span: Span) -> Context {
        Context {
            cancel: self.cancel.clone(),
            deadline: self.deadline,
            span,
        }
    }

    /// Keeps the span but drops the cancellation and deadline of `self`.
    pub fn detached(&self) -> Context {
        Context {
            cancel: CancellationToken::new(),
            deadline: None,
            span: self.span.clone(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `Some` once the context is cancelled or past its deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;

                    () = self.cancel.cancelled() => ContextError::Cancelled,
                    () = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.cancel.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}

/// A derived [`Context`] that is released when dropped.
#[derive(Debug)]
pub struct ScopedContext {
    ctx: Context,
    _guard: DropGuard,
}

impl ScopedContext {
    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

impl Deref for ScopedContext {
    type Target = Context;

    fn deref(&self) -> &Context {
        &self.ctx
    }
}
