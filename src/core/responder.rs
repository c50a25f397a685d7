use std::sync::Arc;

use hyper::StatusCode;
use serde_json::Value;

use crate::config::MockSettings;
use crate::core::batch::decode_envelope;
use crate::core::counter::RequestCounter;
use crate::core::decider::{decide, Outcome};
use crate::error::MockError;
use crate::models::{codes, ErrorResponse, ItemResult, ResponseProfile, SuccessRatio};
use crate::utils::generate_trace_id;

/// Reply chosen for one logical request
#[derive(Debug, Clone, PartialEq)]
pub struct MockReply {
    /// Decision that selected the reply
    pub outcome: Outcome,

    /// Status code of the chosen profile
    pub status: StatusCode,

    /// Body of the chosen profile
    pub body: Value,
}

/// Answers single and batch mock requests from the configured profiles
#[derive(Debug)]
pub struct MockResponder {
    success: ResponseProfile,
    failure: ResponseProfile,
    ratio: SuccessRatio,
    counter: Arc<RequestCounter>,
}

impl MockResponder {
    pub fn new(settings: &MockSettings, counter: Arc<RequestCounter>) -> Self {
        Self {
            success: settings.success.clone(),
            failure: settings.failure.clone(),
            ratio: settings.success_ratio,
            counter,
        }
    }

    /// Counter shared with the rest of the service
    pub fn counter(&self) -> &Arc<RequestCounter> {
        &self.counter
    }

    /// Answer a single request that was assigned `sequence` by the counter.
    /// Does not touch the counter.
    pub fn respond(&self, sequence: u64) -> MockReply {
        self.reply_for(decide(self.ratio, sequence), sequence)
    }

    /// Answer every sub-request of a batch call, in submission order. Each
    /// sub-request takes its own counter value.
    pub fn respond_batch(&self, raw: &[u8]) -> Result<Vec<ItemResult>, MockError> {
        let envelope = decode_envelope(raw)?;
        let mut results = Vec::with_capacity(envelope.len());

        for item in &envelope {
            let sequence = self.counter.increment();
            tracing::info!(sequence, request = ?item, "Individual batch request");

            let reply = self.reply_for(decide(self.ratio, sequence), sequence);
            match serde_json::to_string(&reply.body) {
                Ok(body) => results.push(ItemResult {
                    code: reply.status.as_u16(),
                    body,
                }),
                Err(err) => {
                    tracing::warn!(sequence, "Skipping batch item, body serialization failed: {}", err);
                }
            }
        }

        Ok(results)
    }

    fn reply_for(&self, outcome: Outcome, sequence: u64) -> MockReply {
        let profile = match outcome {
            Outcome::Succeed => &self.success,
            Outcome::Fail => &self.failure,
        };

        let body = match (&profile.body, outcome) {
            (Some(body), _) => body.clone(),
            (None, Outcome::Fail) => {
                let trace_id = generate_trace_id();
                tracing::warn!(sequence, trace_id = %trace_id, "[{}] failed request", trace_id);
                ErrorResponse::new("failed request", codes::FAILED_REQUEST, trace_id).to_value()
            }
            (None, Outcome::Succeed) => Value::Null,
        };

        MockReply {
            outcome,
            status: profile.status,
            body,
        }
    }
}
