//! Test helpers for composing input batches and stubbing the routing client.

use super::*;
use crate::config::RoutingOptions;
use camino::{Utf8Path, Utf8PathBuf};
use homerank_core::test_support::StubRoutingClient;
use homerank_core::{RoutedLeg, RoutingClient};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, contents).expect("write file");
}

/// Scratch directory with the conventional file names used by the tests.
pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn input(&self) -> Utf8PathBuf {
        self.root.join("batch.json")
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("cache/homerank.db")
    }

    pub(super) fn output(&self) -> Utf8PathBuf {
        self.root.join("reports/scores.json")
    }
}

/// Hands out one shared stub so tests can count routing calls.
pub(super) struct StubRoutingBuilder {
    pub(super) client: Arc<StubRoutingClient>,
}

impl StubRoutingBuilder {
    pub(super) fn unavailable() -> Self {
        Self {
            client: Arc::new(StubRoutingClient::unavailable()),
        }
    }

    pub(super) fn routed(distance_meters: f64, duration_seconds: f64) -> Self {
        Self {
            client: Arc::new(StubRoutingClient::always(RoutedLeg {
                distance_meters,
                duration_seconds,
                fare: None,
            })),
        }
    }
}

impl RoutingClientBuilder for StubRoutingBuilder {
    fn build(&self, _options: &RoutingOptions) -> Result<Arc<dyn RoutingClient>, CliError> {
        Ok(self.client.clone())
    }
}

pub(super) fn apartment(id: u64, owner: u64, price: f64, location: Option<(f64, f64)>) -> Value {
    let mut listing = json!({
        "id": id,
        "owner": owner,
        "name": format!("Unit {id}"),
        "price": price,
        "square_footage": 700,
    });
    if let (Some((x, y)), Some(fields)) = (location, listing.as_object_mut()) {
        fields.insert("location".to_owned(), json!({ "x": x, "y": y }));
    }
    listing
}

pub(super) fn place(id: u64, owner: u64, x: f64, y: f64) -> Value {
    json!({
        "id": id,
        "owner": owner,
        "label": format!("Place {id}"),
        "location": { "x": x, "y": y },
    })
}

pub(super) fn apartments_batch(
    user: Option<u64>,
    tier: &str,
    items: Vec<Value>,
    places: Vec<Value>,
) -> Value {
    json!({
        "kind": "apartments",
        "user": user,
        "tier": tier,
        "items": items,
        "places": places,
    })
}
