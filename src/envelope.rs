//! Message envelopes exchanged with the binder.
//!
//! Wraps a message body with its destination and tracking metadata. Inbound
//! envelopes become [`Payload`]s for dispatch; transform output is wrapped back
//! into an [`OutboundEnvelope`] correlated with the message that produced it.

use apache_avro::Schema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::avro::AvroRecord;
use crate::error::StreamError;
use crate::functions::Product;
use crate::runtime::{Outbound, Payload};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Unique message ID for tracking
    #[serde(default = "Uuid::new_v4")]
    pub message_id: Uuid,

    /// Inbound destination (topic) the message arrived on
    pub destination: String,

    pub body: EnvelopeBody,

    /// Timestamp when message was received
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,

    /// Source identifier
    #[serde(default)]
    pub source: Option<String>,
}

impl MessageEnvelope {
    /// Create a new message envelope
    pub fn new(destination: impl Into<String>, body: EnvelopeBody) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            destination: destination.into(),
            body,
            received_at: Utc::now(),
            source: None,
        }
    }
}

/// Message body, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EnvelopeBody {
    /// Avro schema (JSON form) plus the record value as a JSON object
    Record {
        schema: serde_json::Value,
        value: serde_json::Value,
    },
    Product(Product),
    Text {
        text: String,
    },
}

impl EnvelopeBody {
    /// Decode into a dispatchable payload.
    ///
    /// # Errors
    /// `UnexpectedFault` if a record schema does not parse or the value does not
    /// fit it.
    pub fn into_payload(self) -> Result<Payload, StreamError> {
        match self {
            EnvelopeBody::Record { schema, value } => {
                let schema = Schema::parse(&schema)?;
                let record = AvroRecord::from_json(&schema, &value)?;
                Ok(Payload::Record(Box::new(record)))
            }
            EnvelopeBody::Product(product) => Ok(Payload::Product(product)),
            EnvelopeBody::Text { text } => Ok(Payload::Text(text)),
        }
    }

    /// Encode a payload produced by a transform.
    pub fn from_payload(payload: Payload) -> Result<Self, StreamError> {
        match payload {
            Payload::Product(product) => Ok(EnvelopeBody::Product(product)),
            Payload::Text(text) => Ok(EnvelopeBody::Text { text }),
            Payload::Record(_) => Err(StreamError::fault(
                "record payloads cannot be re-emitted without a writer schema",
            )),
        }
    }
}

/// Transform output addressed to an outbound destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    pub message_id: Uuid,

    /// `message_id` of the inbound envelope that produced this message
    pub correlation_id: Uuid,

    pub destination: String,

    pub body: EnvelopeBody,

    pub emitted_at: DateTime<Utc>,
}

impl OutboundEnvelope {
    pub fn from_outbound(inbound_id: Uuid, outbound: Outbound) -> Result<Self, StreamError> {
        Ok(Self {
            message_id: Uuid::new_v4(),
            correlation_id: inbound_id,
            destination: outbound.destination,
            body: EnvelopeBody::from_payload(outbound.payload)?,
            emitted_at: Utc::now(),
        })
    }
}
