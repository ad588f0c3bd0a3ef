use crate::{BoxFuture, CallbackResult, DefaultError};
use std::{future::Future, sync::Arc};

/// A pointer to a function used by [item callbacks](ItemCallback).
pub(crate) type CallbackFn<C, I> = dyn Fn(C, I) -> BoxFuture<'static, CallbackResult> + Send + Sync;

/// A function executed when the item it is attached to receives an interaction.
///
/// The function must take as parameters the handler's context and a snapshot of the item
/// taken right after it was refreshed with the interaction data.
pub struct ItemCallback<C, I>(pub(crate) Arc<CallbackFn<C, I>>);

impl<C, I> ItemCallback<C, I> {
    pub fn new<F, Fut>(fun: F) -> Self
    where
        F: Fn(C, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        Self(Arc::new(move |context, item| -> BoxFuture<'static, CallbackResult> {
            Box::pin(fun(context, item))
        }))
    }

    pub(crate) fn call(&self, context: C, item: I) -> BoxFuture<'static, CallbackResult> {
        (self.0)(context, item)
    }
}

impl<C, I> Clone for ItemCallback<C, I> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// A pointer to a function used by the [check hook](CheckHook).
pub(crate) type CheckFn<C> = dyn Fn(C) -> BoxFuture<'static, bool> + Send + Sync;

/// A hook that can be used to determine if an interaction should reach the item callbacks.
///
/// Returning false drops the interaction without running any callback.
pub struct CheckHook<C>(pub(crate) Arc<CheckFn<C>>);

impl<C> CheckHook<C> {
    pub fn new<F, Fut>(fun: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self(Arc::new(move |context| -> BoxFuture<'static, bool> {
            Box::pin(fun(context))
        }))
    }

    pub(crate) fn call(&self, context: C) -> BoxFuture<'static, bool> {
        (self.0)(context)
    }
}

/// A pointer to a function used by the [timeout hook](TimeoutHook).
pub(crate) type TimeoutFn<H> = dyn Fn(H) -> BoxFuture<'static, CallbackResult> + Send + Sync;

/// A hook executed once when a handler times out, before waiters are released.
pub struct TimeoutHook<H>(pub(crate) Arc<TimeoutFn<H>>);

impl<H> TimeoutHook<H> {
    pub fn new<F, Fut>(fun: F) -> Self
    where
        F: Fn(H) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        Self(Arc::new(move |handler| -> BoxFuture<'static, CallbackResult> {
            Box::pin(fun(handler))
        }))
    }

    pub(crate) fn call(&self, handler: H) -> BoxFuture<'static, CallbackResult> {
        (self.0)(handler)
    }
}

/// A pointer to a function used by the [error handler hook](ErrorHandlerHook).
pub(crate) type ErrorHandlerFn<C> =
    dyn Fn(DefaultError, Option<C>) -> BoxFuture<'static, ()> + Send + Sync;

/// A hook that can be used to handle errors raised by item callbacks and timeout hooks.
///
/// The context is missing when the error comes from the timeout hook.
pub struct ErrorHandlerHook<C>(pub(crate) Arc<ErrorHandlerFn<C>>);

impl<C> ErrorHandlerHook<C> {
    pub fn new<F, Fut>(fun: F) -> Self
    where
        F: Fn(DefaultError, Option<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Arc::new(move |error, context| -> BoxFuture<'static, ()> {
            Box::pin(fun(error, context))
        }))
    }

    pub(crate) fn call(&self, error: DefaultError, context: Option<C>) -> BoxFuture<'static, ()> {
        (self.0)(error, context)
    }
}

/// A pointer to a function used by the [dispose hook](DisposeHook).
pub(crate) type DisposeFn = dyn Fn() -> BoxFuture<'static, CallbackResult> + Send + Sync;

/// A hook executed when a menu screen is popped or covered by another one.
pub struct DisposeHook(pub(crate) Arc<DisposeFn>);

impl DisposeHook {
    pub fn new<F, Fut>(fun: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        Self(Arc::new(move || -> BoxFuture<'static, CallbackResult> { Box::pin(fun()) }))
    }

    pub(crate) fn call(&self) -> BoxFuture<'static, CallbackResult> {
        (self.0)()
    }
}

impl Clone for DisposeHook {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C> Clone for CheckHook<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<H> Clone for TimeoutHook<H> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C> Clone for ErrorHandlerHook<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}
