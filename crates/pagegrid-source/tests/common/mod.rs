#![allow(dead_code)]

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Mutex;

use pagegrid_source::{Slot, Transport, TransportError};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Order {
    pub id: u32,
    pub name: String,
}

/// What the fake server answers with, in order.
pub enum Scripted {
    Json(Value),
    Fail(TransportError),
    /// Answer once the test sends a body through the paired sender.
    Gated(oneshot::Receiver<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory transport replaying a script and recording every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, step: Scripted) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    async fn get_json(
        &self,
        segments: &[&str],
        query: Vec<(String, String)>,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(Call {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query,
        });
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Scripted::Json(body)) => Ok(body),
            Some(Scripted::Fail(e)) => Err(e),
            Some(Scripted::Gated(rx)) => rx
                .await
                .map_err(|_| TransportError::Join("gate dropped".to_string())),
            None => Err(TransportError::Status(404)),
        }
    }
}

pub fn orders(ids: Range<u32>) -> Vec<Value> {
    ids.map(|id| json!({ "id": id, "name": format!("Order {id}") }))
        .collect()
}

/// A flat response body in the server's PascalCase shape.
pub fn page(ids: Range<u32>, total: usize) -> Value {
    json!({ "Data": orders(ids), "Total": total, "AggregateResults": null, "Errors": null })
}

/// Ids of the loaded slots, `None` for unloaded ones.
pub fn slot_ids(slots: &[Slot<Order>]) -> Vec<Option<u32>> {
    slots.iter().map(|s| s.as_loaded().map(|o| o.id)).collect()
}
