use std::collections::HashMap;
use uuid::Uuid;

/// The role a message plays in the dispatch lifecycle.
///
/// The control plane carries both meanings in a single wire field: a
/// routing key on inbound data, a delivery destination on replies. The
/// overload is resolved at the boundary (see [`Message::from_wire`]) so
/// nothing downstream has to guess what the field means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRole {
    /// Inbound data addressed to the worker registered under `routing_key`.
    Inbound { routing_key: String },
    /// Worker-produced reply, correlated to the original message via
    /// `response_to`. Detached replies are delivered to `destination_url`.
    Reply {
        destination_url: String,
        response_to: String,
    },
}

/// One unit of routed data.
///
/// Records are created by ingress/egress collaborators, mutated at most
/// once by the dispatcher (content replacement on the receive path) and
/// never deleted by it; retirement is signaled on the bus instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Globally unique identifier, assigned before the record enters the
    /// store and never reassigned.
    pub id: String,
    pub role: MessageRole,
    /// Opaque payload bytes. For detached workers the inbound content is a
    /// JSON string literal naming the URL the real payload lives at.
    pub content: Vec<u8>,
    /// Carried as outgoing HTTP headers when a reply is delivered
    /// externally.
    pub metadata: HashMap<String, String>,
}

impl Message {
    /// New inbound message with a freshly minted identifier.
    pub fn inbound(routing_key: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Inbound {
                routing_key: routing_key.into(),
            },
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// New reply to `response_to` with a freshly minted identifier.
    pub fn reply(
        destination_url: impl Into<String>,
        response_to: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Reply {
                destination_url: destination_url.into(),
                response_to: response_to.into(),
            },
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Build a record from the wire fields of a data message.
    ///
    /// The single `directive` field is a destination URL when the message
    /// references an original and a routing key otherwise; presence of the
    /// correlation id is what tells the two apart.
    pub fn from_wire(
        id: impl Into<String>,
        directive: impl Into<String>,
        response_to: Option<String>,
        content: impl Into<Vec<u8>>,
        metadata: HashMap<String, String>,
    ) -> Self {
        let role = match response_to {
            Some(response_to) => MessageRole::Reply {
                destination_url: directive.into(),
                response_to,
            },
            None => MessageRole::Inbound {
                routing_key: directive.into(),
            },
        };
        Self {
            id: id.into(),
            role,
            content: content.into(),
            metadata,
        }
    }

    /// Replace the minted identifier, e.g. with one assigned upstream.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    /// Routing key, present only on inbound messages.
    pub fn routing_key(&self) -> Option<&str> {
        match &self.role {
            MessageRole::Inbound { routing_key } => Some(routing_key),
            MessageRole::Reply { .. } => None,
        }
    }

    /// Delivery destination and correlation id, present only on replies.
    pub fn reply_route(&self) -> Option<(&str, &str)> {
        match &self.role {
            MessageRole::Inbound { .. } => None,
            MessageRole::Reply {
                destination_url,
                response_to,
            } => Some((destination_url, response_to)),
        }
    }
}

/// One locally registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    /// The routing key this worker serves; unique per registration.
    pub handler: String,
    /// When true, message bodies are fetched from and delivered to external
    /// HTTP endpoints instead of being passed through verbatim.
    pub detached_content: bool,
}

impl Worker {
    pub fn new(handler: impl Into<String>, detached_content: bool) -> Self {
        Self {
            handler: handler.into(),
            detached_content,
        }
    }
}
