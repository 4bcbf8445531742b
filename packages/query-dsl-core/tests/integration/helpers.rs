//! Shared fixtures for integration tests.

use std::fs;
use std::path::Path;

use query_dsl_core::{MemoryStore, Record, Repository};

/// member1..member4, ages 10 to 40, teamA for the first two and teamB for the rest.
pub fn sample_members() -> Vec<Record> {
    vec![
        member("member1", 10, "teamA"),
        member("member2", 20, "teamA"),
        member("member3", 30, "teamB"),
        member("member4", 40, "teamB"),
    ]
}

/// member1..member7, all aged 10 and without a team.
pub fn seven_members() -> Vec<Record> {
    (1..=7)
        .map(|i| {
            Record::new()
                .with("username", format!("member{}", i))
                .with("age", 10)
        })
        .collect()
}

pub fn member(username: &str, age: i64, team: &str) -> Record {
    Record::new()
        .with("username", username)
        .with("age", age)
        .with("team", team)
}

pub fn repository(records: Vec<Record>) -> Repository<MemoryStore> {
    Repository::new(MemoryStore::from_records(records))
}

/// Writes records as a JSON array and loads them back, as the CLI does.
pub fn round_trip_through_file(dir: &Path, records: &[Record]) -> Vec<Record> {
    let path = dir.join("members.json");
    fs::write(&path, serde_json::to_vec_pretty(records).unwrap()).unwrap();
    let raw = fs::read(&path).unwrap();
    serde_json::from_slice(&raw).unwrap()
}

pub fn usernames(rows: &[Record]) -> Vec<Option<String>> {
    rows.iter()
        .map(|r| r.optional_text("username").unwrap().map(str::to_string))
        .collect()
}
