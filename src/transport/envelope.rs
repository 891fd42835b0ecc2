// ! The bidirectional message envelope
// !
// ! Module implements request/response correlation over a duplex,
// ! order-preserving byte channel. The same `Envelope` type is used by both
// ! the host and the driver: each side registers handlers for the methods it
// ! serves and calls `request` for the methods it consumes. That symmetry is
// ! what makes the reverse-direction sampling flow possible.
// !
// ! Wire format: newline-delimited JSON. A message with `method` and `id` is
// ! a request; `method` without `id` is a notification; `id` with `result`
// ! or `error` is a response. Correlation ids come from a monotonic counter
// ! and are unique among live pending calls.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};

use crate::core::error::{CapError, CapResult};
use crate::protocol::types::{
    ErrorObject, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
    error_codes,
};

/// Handler for an incoming request; its Ok value becomes the result payload,
/// its Err an error response
pub type MethodHandler = Arc<
    dyn Fn(Option<Value>) -> Pin<Box<dyn Future<Output = CapResult<Value>> + Send + 'static>>
        + Send
        + Sync,
>;

/// Handler for an incoming notification; no reply is produced
pub type NotificationHandler = Arc<
    dyn Fn(Option<Value>) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> + Send + Sync,
>;

/// Wrap an async fn into a [`MethodHandler`]
pub fn method_handler<F, Fut>(f: F) -> MethodHandler
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CapResult<Value>> + Send + 'static,
{
    Arc::new(move |params| Box::pin(f(params)))
}

/// Wrap an async fn into a [`NotificationHandler`]
pub fn notification_handler<F, Fut>(f: F) -> NotificationHandler
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |params| Box::pin(f(params)))
}

/// Configuration for an envelope
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// Bound on how long a pending call may wait for its response
    pub request_timeout: Duration,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(30_000),
        }
    }
}

type PendingMap = HashMap<RequestId, oneshot::Sender<Result<Value, ErrorObject>>>;

/// The symmetric message envelope.
///
/// Construct one per process, register handlers for the methods this side
/// serves, then [`attach`](Envelope::attach) it to the duplex channel.
pub struct Envelope {
    outgoing: mpsc::UnboundedSender<String>,
    outgoing_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    pending: Arc<Mutex<PendingMap>>,
    handlers: std::sync::RwLock<HashMap<String, MethodHandler>>,
    notification_handlers: std::sync::RwLock<HashMap<String, NotificationHandler>>,
    next_id: AtomicU64,
    config: EnvelopeConfig,
    shutdown: watch::Sender<bool>,
}

impl Envelope {
    /// Create a new, unattached envelope
    pub fn new(config: EnvelopeConfig) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            outgoing: tx,
            outgoing_rx: Mutex::new(Some(rx)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            handlers: std::sync::RwLock::new(HashMap::new()),
            notification_handlers: std::sync::RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
            shutdown,
        })
    }

    /// Release the channel: the writer task drops its half, so the peer sees
    /// EOF. Pending calls resolve through their timeouts.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Register a handler for an incoming request method.
    ///
    /// Registration is expected to complete before `attach`; a later
    /// registration is visible to subsequent dispatches but carries no
    /// ordering guarantee for messages already in flight.
    pub fn register_handler(&self, method: &str, handler: MethodHandler) {
        self.handlers
            .write()
            .expect("handler table poisoned")
            .insert(method.to_string(), handler);
    }

    /// Register a handler for an incoming notification method
    pub fn register_notification_handler(&self, method: &str, handler: NotificationHandler) {
        self.notification_handlers
            .write()
            .expect("handler table poisoned")
            .insert(method.to_string(), handler);
    }

    /// Number of calls currently awaiting a response
    pub async fn pending_calls(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Attach the envelope to a duplex channel, spawning the reader and
    /// writer tasks. The returned handle completes when the reader sees EOF.
    pub fn attach<R, W>(self: Arc<Self>, reader: R, writer: W) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut rx = self
            .outgoing_rx
            .try_lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .expect("envelope already attached");

        let mut shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut writer = BufWriter::new(writer);
            // close() may have raced ahead of attach
            while !*shutdown_rx.borrow() {
                let line = tokio::select! {
                    line = rx.recv() => match line {
                        Some(line) => line,
                        None => break,
                    },
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("envelope closed, stopping writer task");
                        break;
                    }
                };
                tracing::trace!("sending: {line}");
                if writer.write_all(line.as_bytes()).await.is_err()
                    || writer.write_all(b"\n").await.is_err()
                    || writer.flush().await.is_err()
                {
                    tracing::debug!("write side closed, stopping writer task");
                    break;
                }
            }
        });

        let envelope = self;
        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::debug!("reader reached EOF");
                        break;
                    }
                    Ok(_) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        tracing::trace!("received: {line}");
                        envelope.dispatch_line(line).await;
                    }
                    Err(e) => {
                        tracing::error!("error reading from channel: {e}");
                        break;
                    }
                }
            }
        })
    }

    // ========================================================================
    // Outgoing
    // ========================================================================

    /// Send a request and wait for the matching response.
    ///
    /// Suspends the logical caller until the pending call resolves; a call
    /// that outlives the configured bound resolves with `Timeout` and its
    /// pending entry is removed, so a late reply is discarded rather than
    /// mis-delivered.
    pub async fn request<P: Serialize>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> CapResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method.to_string(), params)?;
        let line = serde_json::to_string(&request).map_err(CapError::serialization)?;

        let (sender, receiver) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id, sender);
        }

        if self.outgoing.send(line).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(CapError::transport("Channel closed"));
        }

        match timeout(self.config.request_timeout, receiver).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(error))) => Err(error_from_object(error)),
            Ok(Err(_)) => Err(CapError::transport("Response channel closed")),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(CapError::timeout(format!(
                    "Request '{method}' (id {id}) exceeded {:?}",
                    self.config.request_timeout
                )))
            }
        }
    }

    /// Send a request and deserialize the result payload
    pub async fn request_typed<P, T>(&self, method: &str, params: Option<P>) -> CapResult<T>
    where
        P: Serialize,
        T: serde::de::DeserializeOwned,
    {
        let result = self.request(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Send a notification; no pending call is created and no reply arrives
    pub fn notify<P: Serialize>(&self, method: &str, params: Option<P>) -> CapResult<()> {
        let notification = JsonRpcNotification::new(method.to_string(), params)?;
        let line = serde_json::to_string(&notification).map_err(CapError::serialization)?;
        self.outgoing
            .send(line)
            .map_err(|_| CapError::transport("Channel closed"))
    }

    // ========================================================================
    // Incoming
    // ========================================================================

    async fn dispatch_line(&self, line: &str) {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("dropping malformed message: {e}");
                return;
            }
        };

        let has_method = value.get("method").is_some();
        let has_id = value.get("id").is_some();

        if has_method && has_id {
            match serde_json::from_value::<JsonRpcRequest>(value) {
                Ok(request) => self.handle_request(request),
                Err(e) => tracing::warn!("dropping malformed request: {e}"),
            }
        } else if has_method {
            match serde_json::from_value::<JsonRpcNotification>(value) {
                Ok(notification) => self.handle_notification(notification),
                Err(e) => tracing::warn!("dropping malformed notification: {e}"),
            }
        } else if has_id {
            self.handle_response(value).await;
        } else {
            tracing::warn!("dropping message that is neither request nor response");
        }
    }

    fn handle_request(&self, request: JsonRpcRequest) {
        let handler = self
            .handlers
            .read()
            .expect("handler table poisoned")
            .get(&request.method)
            .cloned();

        let outgoing = self.outgoing.clone();
        tokio::spawn(async move {
            let line = match handler {
                Some(handler) => match handler(request.params).await {
                    Ok(result) => serde_json::to_string(&JsonRpcResponse::success(
                        request.id, result,
                    )),
                    Err(error) => {
                        tracing::debug!(method = %request.method, error = %error, "handler failed");
                        serde_json::to_string(&JsonRpcError::new(
                            request.id,
                            error_code(&error),
                            error.to_string(),
                        ))
                    }
                },
                None => {
                    tracing::warn!(method = %request.method, "no handler for method");
                    serde_json::to_string(&JsonRpcError::new(
                        request.id,
                        error_codes::METHOD_NOT_FOUND,
                        format!("Method not found: {}", request.method),
                    ))
                }
            };

            match line {
                Ok(line) => {
                    let _ = outgoing.send(line);
                }
                Err(e) => tracing::error!("failed to serialize response: {e}"),
            }
        });
    }

    fn handle_notification(&self, notification: JsonRpcNotification) {
        let handler = self
            .notification_handlers
            .read()
            .expect("handler table poisoned")
            .get(&notification.method)
            .cloned();

        match handler {
            Some(handler) => {
                tokio::spawn(async move {
                    handler(notification.params).await;
                });
            }
            None => {
                tracing::debug!(method = %notification.method, "unhandled notification");
            }
        }
    }

    async fn handle_response(&self, value: Value) {
        if let Ok(error) = serde_json::from_value::<JsonRpcError>(value.clone()) {
            self.resolve_pending(error.id, Err(error.error)).await;
            return;
        }

        match serde_json::from_value::<JsonRpcResponse>(value) {
            Ok(response) => self.resolve_pending(response.id, Ok(response.result)).await,
            Err(e) => tracing::warn!("dropping malformed response: {e}"),
        }
    }

    async fn resolve_pending(&self, id: RequestId, outcome: Result<Value, ErrorObject>) {
        let sender = self.pending.lock().await.remove(&id);
        match sender {
            Some(sender) => {
                let _ = sender.send(outcome);
            }
            None => {
                tracing::warn!("discarding response for unknown request id {id}");
            }
        }
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("config", &self.config)
            .finish()
    }
}

/// Map a handler-side error to a JSON-RPC error code
fn error_code(error: &CapError) -> i32 {
    match error {
        CapError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
        CapError::Validation(_) => error_codes::INVALID_PARAMS,
        CapError::ToolNotFound(_) => error_codes::TOOL_NOT_FOUND,
        CapError::ResourceNotFound(_) => error_codes::RESOURCE_NOT_FOUND,
        CapError::UnresolvedTemplate(_) => error_codes::RESOURCE_NOT_FOUND,
        CapError::PromptNotFound(_) => error_codes::PROMPT_NOT_FOUND,
        CapError::GenerationFailed(_) => error_codes::GENERATION_FAILED,
        _ => error_codes::INTERNAL_ERROR,
    }
}

/// Map an error response from the peer back to a caplink error
fn error_from_object(error: ErrorObject) -> CapError {
    match error.code {
        error_codes::METHOD_NOT_FOUND => CapError::MethodNotFound(error.message),
        error_codes::GENERATION_FAILED => CapError::GenerationFailed(error.message),
        code => CapError::Rpc {
            code,
            message: error.message,
        },
    }
}
