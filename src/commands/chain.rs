//! Handler chain composition.
//!
//! A command is a base [`Handler`] wrapped, once at startup, by its own
//! filters and by the globally configured middleware. The result is a
//! single [`BoxedHandler`]; dispatch never walks a list of stages.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandError, InvocationContext};

/// A command body, or a stage wrapped around one.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: &InvocationContext, args: &[String]) -> Result<(), CommandError>;
}

/// Shared, already composed handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// A guard owned by a single command.
///
/// `wrap` consumes the filter, so any state it carries (a cooldown
/// timestamp, for instance) belongs to exactly one registered command.
pub trait Filter: Send + Sync {
    fn wrap(self: Box<Self>, next: BoxedHandler) -> BoxedHandler;
}

/// A wrapper applied around the filter chain of every command.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

/// Builds the chain `middleware[0] → .. → filters[0] → .. → base`.
pub fn compose(
    base: BoxedHandler,
    filters: Vec<Box<dyn Filter>>,
    middleware: &[Arc<dyn Middleware>],
) -> BoxedHandler {
    let mut handler = base;

    for filter in filters.into_iter().rev() {
        handler = filter.wrap(handler);
    }

    for layer in middleware.iter().rev() {
        handler = layer.wrap(handler);
    }

    handler
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{BoxedHandler, Filter, Handler, Middleware};
    use crate::chat::testing::RecordingChat;
    use crate::chat::Sender;
    use crate::commands::{CommandError, InvocationContext};

    pub type MarkerLog = Arc<Mutex<Vec<&'static str>>>;

    pub fn marker_log() -> MarkerLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn markers(log: &MarkerLog) -> Vec<&'static str> {
        log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn context_for(sender: Sender) -> InvocationContext {
        InvocationContext::new("!test", sender, "#channel", Arc::new(RecordingChat::default()))
    }

    /// Base handler that counts calls and optionally fails.
    #[derive(Default)]
    pub struct StubHandler {
        pub calls: AtomicUsize,
        pub log: Option<MarkerLog>,
        pub fail_with: Option<fn() -> CommandError>,
    }

    impl StubHandler {
        pub fn logging(log: &MarkerLog) -> Self {
            Self {
                log: Some(Arc::clone(log)),
                ..Self::default()
            }
        }

        pub fn failing(fail_with: fn() -> CommandError) -> Self {
            Self {
                fail_with: Some(fail_with),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Handler for StubHandler {
        async fn call(
            &self,
            _ctx: &InvocationContext,
            _args: &[String],
        ) -> Result<(), CommandError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(log) = &self.log
                && let Ok(mut log) = log.lock()
            {
                log.push("handler");
            }
            match self.fail_with {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }
    }

    /// Stage that records its label then forwards.
    pub struct Marker {
        pub label: &'static str,
        pub log: MarkerLog,
    }

    impl Marker {
        pub fn new(label: &'static str, log: &MarkerLog) -> Self {
            Self {
                label,
                log: Arc::clone(log),
            }
        }
    }

    struct MarkerStage {
        label: &'static str,
        log: MarkerLog,
        next: BoxedHandler,
    }

    #[async_trait]
    impl Handler for MarkerStage {
        async fn call(&self, ctx: &InvocationContext, args: &[String]) -> Result<(), CommandError> {
            if let Ok(mut log) = self.log.lock() {
                log.push(self.label);
            }
            self.next.call(ctx, args).await
        }
    }

    impl Filter for Marker {
        fn wrap(self: Box<Self>, next: BoxedHandler) -> BoxedHandler {
            Arc::new(MarkerStage {
                label: self.label,
                log: self.log,
                next,
            })
        }
    }

    impl Middleware for Marker {
        fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
            Arc::new(MarkerStage {
                label: self.label,
                log: Arc::clone(&self.log),
                next,
            })
        }
    }
}
