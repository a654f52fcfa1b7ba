use crate::config::DeliveryPolicy;
use crate::error::{ApiResponseError, DispatchError};
use crate::store::{MessageRole, Store};
use crate::transport::HttpTransport;
use reqwest::Method;
use std::collections::HashMap;
use tracing::debug;

/// What the return handler decided for one reply.
#[derive(Debug)]
pub enum ReturnOutcome {
    /// Delivery succeeded or was not required; retire the reply.
    Retired,
    /// Delivery failed but the policy retires the reply anyway. The error
    /// is carried out so the caller can log what was lost.
    RetiredWithError(DispatchError),
}

/// Run one reply through the return path.
///
/// Correlates the reply to its original and the original to its worker,
/// then delivers detached content to the reply's destination URL. Lookup
/// and correlation failures abort; what a delivery failure does is the
/// policy's call.
pub async fn process_returned(
    store: &Store,
    transport: &HttpTransport,
    policy: DeliveryPolicy,
    id: &str,
) -> Result<ReturnOutcome, DispatchError> {
    let txn = store.read()?;

    let Some(reply) = txn.message(id) else {
        return Err(DispatchError::MissingMessage { id: id.to_string() });
    };
    let MessageRole::Reply {
        destination_url,
        response_to,
    } = &reply.role
    else {
        return Err(DispatchError::UnexpectedInbound { id: id.to_string() });
    };

    let Some(original) = txn.message(response_to) else {
        return Err(DispatchError::MissingOriginal {
            id: id.to_string(),
            response_to: response_to.clone(),
        });
    };
    let MessageRole::Inbound { routing_key } = &original.role else {
        return Err(DispatchError::UnexpectedReply {
            id: original.id.clone(),
        });
    };

    let Some(worker) = txn.worker(routing_key) else {
        return Err(DispatchError::MissingWorker {
            handler: routing_key.clone(),
        });
    };

    if !worker.detached_content {
        return Ok(ReturnOutcome::Retired);
    }

    // Metadata rides along as headers, values trimmed of stray whitespace.
    let headers: HashMap<String, String> = reply
        .metadata
        .iter()
        .map(|(name, value)| (name.clone(), value.trim().to_string()))
        .collect();
    debug!("delivering reply {id} to {destination_url}");

    match deliver(transport, destination_url, &headers, reply.content.clone()).await {
        Ok(()) => Ok(ReturnOutcome::Retired),
        Err(error) => match policy {
            DeliveryPolicy::RetireAlways => Ok(ReturnOutcome::RetiredWithError(error)),
            DeliveryPolicy::AbandonOnFailure => Err(error),
        },
    }
}

async fn deliver(
    transport: &HttpTransport,
    url: &str,
    headers: &HashMap<String, String>,
    body: Vec<u8>,
) -> Result<(), DispatchError> {
    let response = transport.send(Method::POST, url, headers, body).await?;
    if response.status >= 400 {
        return Err(ApiResponseError {
            status_code: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }
        .into());
    }
    Ok(())
}
