//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use queryset::definition::{Command, DefinitionRegistry, Mask, RegexDef, Set};
use queryset::engine::{ExecOptions, ExecutionContext, SetExecutor, SetResult};
use queryset::store::{DocumentStore, InMemoryStore, SessionPool};
use serde_json::{json, Value};

pub const STATION_NAMES: [(&str, &str); 8] = [
    ("42021", "C14 - Pasco County Buoy, FL"),
    ("42022", "C12 - West Florida Shelf Buoy"),
    ("42023", "C13 - West Florida South Shelf"),
    ("42036", "West Tampa - 106 NM WNW of Tampa, FL"),
    ("42039", "Pensacola - 115 NM SSE of Pensacola, FL"),
    ("42040", "Luke Offshore Test Platform"),
    ("42055", "Bay of Campeche - 214 NM NE of Veracruz, MX"),
    ("42099", "Offshore St. Petersburg, FL"),
];

pub fn stations() -> Vec<Value> {
    STATION_NAMES
        .iter()
        .enumerate()
        .map(|(i, (id, name))| {
            json!({
                "station_id": id,
                "name": name,
                "active": i % 3 != 2,
                "depth": 10 + (i as i64) * 25,
            })
        })
        .collect()
}

pub fn readings() -> Vec<Value> {
    vec![
        json!({"station_id": "42021", "taken": {"$date": "2020-01-01T00:00:00.000Z"}, "wave_height": 1.2}),
        json!({"station_id": "42021", "taken": {"$date": "2020-01-02T00:00:00.000Z"}, "wave_height": 1.6}),
        json!({"station_id": "42036", "taken": {"$date": "2020-01-01T00:00:00.000Z"}, "wave_height": 2.4}),
        json!({"station_id": "42099", "taken": {"$date": "2020-01-03T00:00:00.000Z"}, "wave_height": 0.8}),
    ]
}

pub fn operators() -> Vec<Value> {
    vec![
        json!({"station_id": "42021", "contact": "john.doe@example.com", "phone": "8135550142"}),
        json!({"station_id": "42036", "contact": "ops@noaa.gov", "phone": "7275550199"}),
    ]
}

pub fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_many("stations", stations()).unwrap();
    store.insert_many("readings", readings()).unwrap();
    store.insert_many("operators", operators()).unwrap();
    store
}

/// Registry with the regexes and masks every scenario shares
pub fn registry() -> Arc<DefinitionRegistry> {
    let registry = Arc::new(DefinitionRegistry::new());
    registry.upsert_regex(RegexDef::new("number", "^[0-9]+$")).unwrap();
    registry
        .upsert_regex(RegexDef::new("email", r"^[^@\s]+@[^@\s]+\.[a-z]+$"))
        .unwrap();
    registry.upsert_mask(Mask::new("operators", "contact", "email")).unwrap();
    registry.upsert_mask(Mask::new("operators", "phone", "right4")).unwrap();
    registry
}

pub fn executor_with(store: Arc<dyn DocumentStore>, max_sessions: usize) -> (SetExecutor, Arc<DefinitionRegistry>) {
    let registry = registry();
    let executor = SetExecutor::new(
        SessionPool::new(store, max_sessions),
        registry.clone(),
        registry.clone(),
        registry.clone(),
    );
    (executor, registry)
}

pub fn executor() -> (SetExecutor, Arc<DefinitionRegistry>) {
    executor_with(Arc::new(seeded_store()), 4)
}

pub fn cmds(value: Value) -> Vec<Command> {
    value
        .as_array()
        .expect("commands must be an array")
        .iter()
        .map(|c| c.as_object().cloned().expect("command must be an object"))
        .collect()
}

pub fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub async fn run(executor: &SetExecutor, set: &Set, vars: HashMap<String, String>) -> SetResult {
    executor
        .execute(set, vars, &ExecutionContext::new(), &ExecOptions::default())
        .await
}
