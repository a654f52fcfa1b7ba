use crate::error::{ApiResponseError, DispatchError};
use crate::store::{MessageRole, Store};
use crate::transport::HttpTransport;
use tracing::debug;

/// What the receive handler decided for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Content resolved and written back; safe for local delivery.
    Ready,
    /// No worker serves the routing key. Not an error: the record is left
    /// untouched and the message retires immediately.
    Undeliverable,
}

/// Run one inbound message through the receive path.
///
/// Looks up the message and its worker, dereferences detached content over
/// HTTP, and writes the record back in a single commit. Pure with respect
/// to the bus: the caller decides which signal the outcome maps to.
pub async fn process_received(
    store: &Store,
    transport: &HttpTransport,
    id: &str,
) -> Result<ReceiveOutcome, DispatchError> {
    let mut txn = store.write()?;

    let Some(found) = txn.message(id) else {
        return Err(DispatchError::MissingMessage { id: id.to_string() });
    };
    let mut message = found.clone();

    let MessageRole::Inbound { routing_key } = message.role.clone() else {
        return Err(DispatchError::UnexpectedReply { id: id.to_string() });
    };

    let Some(worker) = txn.worker(&routing_key) else {
        debug!("no worker registered for {routing_key}");
        return Ok(ReceiveOutcome::Undeliverable);
    };

    if worker.detached_content {
        let url: String = serde_json::from_slice(&message.content).map_err(|error| {
            DispatchError::ContentEnvelope {
                id: id.to_string(),
                reason: error.to_string(),
            }
        })?;
        debug!("dereferencing content of message {id} from {url}");

        let response = transport.get(&url).await?;
        if response.status >= 400 {
            return Err(ApiResponseError {
                status_code: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }
            .into());
        }
        message.content = response.body;
    }

    txn.put_message(message);
    txn.commit()?;

    Ok(ReceiveOutcome::Ready)
}
