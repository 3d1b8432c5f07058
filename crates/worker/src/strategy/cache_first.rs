//! Cache-first strategy with background refresh for static requests.
//!
//! The cached response, when present, is returned before the refresh
//! write can complete; callers never observe a partially applied refresh.

use harbor_client::{Origin, OutboundRequest};
use harbor_core::{CacheDb, Error, InterceptedRequest, Response};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Serve a static request from the store, refreshing in the background;
/// fall back to the network, and finally to the cached offline document.
///
/// Returns the response together with the refresh task handle on a cache
/// hit. Production callers detach the handle; tests await it to observe
/// the cache write.
///
/// # Errors
///
/// Fails only when the network is down and the offline document is absent
/// from the store; that failure is terminal for the request.
pub async fn respond(
    db: &CacheDb,
    origin: &Arc<dyn Origin>,
    store: &str,
    fallback_url: &str,
    request: &InterceptedRequest,
) -> Result<(Response, Option<JoinHandle<()>>), Error> {
    if let Some(cached) = db.match_request(store, request).await? {
        tracing::debug!(url = %request.url, "cache hit, refreshing in background");
        let refresh = spawn_refresh(db.clone(), Arc::clone(origin), store.to_string(), request.clone());
        return Ok((cached.to_response(), Some(refresh)));
    }

    match origin.fetch(&OutboundRequest::from_intercepted(request)).await {
        Ok(response) => {
            if response.is_cacheable() {
                // The page gets the network response either way; a failed
                // write only costs the next request a cache miss.
                if let Err(err) = db.put_response(store, request, &response).await {
                    tracing::warn!(url = %request.url, error = %err, "failed to cache response");
                }
            }
            Ok((response, None))
        }
        Err(err) => {
            let offline = InterceptedRequest::get(fallback_url);
            match db.match_request(store, &offline).await? {
                Some(cached) => {
                    tracing::debug!(url = %request.url, "network down, serving offline document");
                    Ok((cached.to_response(), None))
                }
                None => Err(err),
            }
        }
    }
}

/// Refetch the request and overwrite its entry if the new response is
/// pristine. Failures of any kind are logged and swallowed; the caller
/// already has its response.
fn spawn_refresh(
    db: CacheDb,
    origin: Arc<dyn Origin>,
    store: String,
    request: InterceptedRequest,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match origin.fetch(&OutboundRequest::from_intercepted(&request)).await {
            Ok(response) if response.is_cacheable() => {
                if let Err(err) = db.put_response(&store, &request, &response).await {
                    tracing::warn!(url = %request.url, error = %err, "refresh write failed");
                }
            }
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status, "refresh response not cacheable");
            }
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "background refresh failed");
            }
        }
    })
}
