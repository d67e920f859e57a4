//! Parallel fan-out across namespaces with partial-failure tolerance.
//!
//! [`ScopedAggregator`] lists a resource kind in every namespace at once and
//! merges the results. One task is spawned per namespace; all tasks share a
//! single [`CancellationToken`] derived from the client's token.
//!
//! - A namespace answering [`ApiError::Unauthorised`] is skipped and recorded
//!   in [`Aggregation::denied`]; the others carry on.
//! - Any other failure cancels the remaining tasks and becomes the result of
//!   the whole aggregation. No partial list is returned.
//! - Results are merged in completion order. Callers must treat the merged
//!   list as unordered.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{map_transport_error, ApiError, NamespaceId, Transport, TransportError};

/// What to do when every namespace in an aggregation denies access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnauthorisedScopePolicy {
    /// Return an empty result. Callers see "nothing visible", not an error.
    #[default]
    Skip,
    /// Return [`ApiError::Unauthorised`].
    Fail,
}

/// Merged outcome of a successful aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation<R> {
    /// Union of the per-namespace lists, in no particular order.
    pub items: Vec<R>,
    /// Namespaces excluded because the caller was not authorised to list them.
    pub denied: Vec<NamespaceId>,
}

impl<R> Aggregation<R> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            denied: Vec::new(),
        }
    }
}

enum ScopeOutcome<R> {
    Listed(Vec<R>),
    Denied,
    Failed(ApiError),
    Cancelled,
}

/// Runs one list operation per namespace concurrently and joins the results.
pub struct ScopedAggregator<T: ?Sized> {
    transport: Arc<T>,
    policy: UnauthorisedScopePolicy,
    cancel: CancellationToken,
}

impl<T> ScopedAggregator<T>
where
    T: Transport + ?Sized + 'static,
{
    /// Creates an aggregator whose tasks are cancelled when `cancel` fires.
    pub fn new(
        transport: Arc<T>,
        policy: UnauthorisedScopePolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            policy,
            cancel,
        }
    }

    /// Lists every namespace, then runs `list` in each of them.
    ///
    /// Failing to list namespaces aborts immediately: without scopes there is
    /// nothing to aggregate.
    pub async fn collect_all<R, F, Fut>(&self, list: F) -> Result<Aggregation<R>, ApiError>
    where
        F: Fn(Arc<T>, NamespaceId) -> Fut,
        Fut: Future<Output = Result<Vec<R>, TransportError>> + Send + 'static,
        R: Send + 'static,
    {
        let namespaces = self
            .transport
            .list_namespaces()
            .await
            .map_err(map_transport_error)?;

        let scopes = namespaces.into_iter().map(|ns| ns.id).collect();
        self.collect(scopes, list).await
    }

    /// Runs `list` once per scope in parallel and merges the results.
    pub async fn collect<R, F, Fut>(
        &self,
        scopes: Vec<NamespaceId>,
        list: F,
    ) -> Result<Aggregation<R>, ApiError>
    where
        F: Fn(Arc<T>, NamespaceId) -> Fut,
        Fut: Future<Output = Result<Vec<R>, TransportError>> + Send + 'static,
        R: Send + 'static,
    {
        if scopes.is_empty() {
            return Ok(Aggregation::empty());
        }

        let total = scopes.len();
        let token = self.cancel.child_token();
        // Dropping this future (caller deadline) cancels every task still running.
        let _cancel_on_drop = token.clone().drop_guard();

        let mut tasks = JoinSet::new();
        for scope in scopes {
            let fut = list(Arc::clone(&self.transport), scope.clone());
            let token = token.clone();

            tasks.spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    _ = token.cancelled() => ScopeOutcome::Cancelled,
                    listed = fut => match listed.map_err(map_transport_error) {
                        Ok(items) => ScopeOutcome::Listed(items),
                        Err(ApiError::Unauthorised { .. }) => ScopeOutcome::Denied,
                        Err(err) => ScopeOutcome::Failed(err),
                    },
                };
                (scope, outcome)
            });
        }

        let mut merged = Aggregation::empty();

        while let Some(joined) = tasks.join_next().await {
            let (scope, outcome) = match joined {
                Ok(done) => done,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(_) => continue,
            };

            match outcome {
                ScopeOutcome::Listed(mut items) => {
                    debug!(namespace = %scope, count = items.len(), "namespace listed");
                    merged.items.append(&mut items);
                }
                ScopeOutcome::Denied => {
                    warn!(namespace = %scope, "skipping namespace: access denied");
                    merged.denied.push(scope);
                }
                ScopeOutcome::Failed(err) => {
                    warn!(namespace = %scope, error = %err, "aborting aggregation");
                    token.cancel();
                    tasks.abort_all();
                    return Err(err);
                }
                ScopeOutcome::Cancelled => {
                    tasks.abort_all();
                    return Err(ApiError::Cancelled {
                        operation: "list across namespaces",
                    });
                }
            }
        }

        if merged.denied.len() == total && self.policy == UnauthorisedScopePolicy::Fail {
            return Err(ApiError::Unauthorised {
                details: Some(format!("access denied to all {total} namespaces")),
            });
        }

        Ok(merged)
    }
}
