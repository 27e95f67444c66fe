use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    constants::{DEFAULT_HABIT_NAME, LIMITS, PRIMARY_COLOR, UNNAMED_HABIT_NAME},
    domain::{Habit, HabitCollection, HabitColor, HabitDay},
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait HabitStore {
    fn read_document(&mut self) -> Result<Option<String>, StorageError>;
    fn write_document(&mut self, contents: &str) -> Result<(), StorageError>;
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn at_default_path() -> Self {
        Self::new(habits_path())
    }
}

impl HabitStore for FileStore {
    fn read_document(&mut self) -> Result<Option<String>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    fn write_document(&mut self, contents: &str) -> Result<(), StorageError> {
        atomic_write(&self.path, contents)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    document: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HabitStore for MemoryStore {
    fn read_document(&mut self) -> Result<Option<String>, StorageError> {
        Ok(self.document.clone())
    }

    fn write_document(&mut self, contents: &str) -> Result<(), StorageError> {
        self.document = Some(contents.to_string());
        Ok(())
    }
}

pub fn get_data_dir() -> PathBuf {
    if Path::new("./habits.json").exists() {
        return PathBuf::from(".");
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "cairn", "cairn") {
        let data_dir = proj_dirs.data_dir().to_path_buf();
        fs::create_dir_all(&data_dir).ok();
        data_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn habits_path() -> PathBuf {
    get_data_dir().join("habits.json")
}

pub fn write_text_file(path: &Path, content: &str) -> Result<(), StorageError> {
    atomic_write(path, content)
}

pub fn atomic_write(path: &Path, content: &str) -> Result<(), StorageError> {
    let tmp_path = path.with_extension("tmp");
    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(content.as_bytes())?;
    tmp_file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[derive(Serialize)]
struct HabitsDocument<'a> {
    active_habit_id: u32,
    is_calendar_expanded: bool,
    extra_weeks: i32,
    calendar_offset_weeks: i32,
    habits: &'a [Habit],
}

pub fn document_json(collection: &HabitCollection) -> Result<String, StorageError> {
    let document = HabitsDocument {
        active_habit_id: collection.active_habit_id,
        is_calendar_expanded: collection.is_calendar_expanded,
        extra_weeks: collection.extra_weeks,
        calendar_offset_weeks: collection.calendar_offset_weeks,
        habits: &collection.habits,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn save_collection(
    store: &mut dyn HabitStore,
    collection: &HabitCollection,
) -> Result<(), StorageError> {
    let json = document_json(collection)?;
    store.write_document(&json)
}

pub fn load_collection(store: &mut dyn HabitStore) -> HabitCollection {
    let contents = match store.read_document() {
        Ok(Some(contents)) => contents,
        Ok(None) => return write_default_collection(store),
        Err(e) => {
            eprintln!("Warning: could not read habits file: {}", e);
            return write_default_collection(store);
        }
    };

    let root: Value = match serde_json::from_str(&contents) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Warning: habits file is not valid JSON, starting fresh: {}", e);
            return write_default_collection(store);
        }
    };

    let mut collection = collection_from_json(&root);
    if collection.habits.is_empty() {
        collection
            .habits
            .push(Habit::new(0, DEFAULT_HABIT_NAME, PRIMARY_COLOR));
        collection.active_habit_id = 0;
        collection.calendar_offset_weeks = 0;
    }
    if collection.active_habit().is_none() {
        collection.active_habit_id = 0;
    }
    collection
}

fn write_default_collection(store: &mut dyn HabitStore) -> HabitCollection {
    let collection = HabitCollection::with_default_habit();
    if let Err(e) = save_collection(store, &collection) {
        eprintln!("Warning: could not write default habits file: {}", e);
    }
    collection
}

fn collection_from_json(root: &Value) -> HabitCollection {
    let mut collection = HabitCollection::default();

    if let Some(active) = root.get("active_habit_id").and_then(Value::as_f64) {
        collection.active_habit_id = active as u32;
    }
    if let Some(expanded) = root.get("is_calendar_expanded").and_then(Value::as_bool) {
        collection.is_calendar_expanded = expanded;
    }
    if let Some(extra) = root.get("extra_weeks").and_then(Value::as_f64) {
        collection.extra_weeks = extra as i32;
    }
    if let Some(offset) = root.get("calendar_offset_weeks").and_then(Value::as_f64) {
        collection.calendar_offset_weeks = (offset as i32).max(0);
    }

    if let Some(habits) = root.get("habits").and_then(Value::as_array) {
        for habit in habits.iter().take(LIMITS.max_habits) {
            collection.habits.push(habit_from_json(habit));
        }
    }

    collection
}

fn habit_from_json(value: &Value) -> Habit {
    let id = value.get("id").and_then(Value::as_f64).unwrap_or(0.0) as u32;

    let name = match value.get("name").and_then(Value::as_str) {
        Some(name) => truncate_name(name),
        None => UNNAMED_HABIT_NAME.to_string(),
    };

    let color = value
        .get("color")
        .and_then(color_from_json)
        .unwrap_or(PRIMARY_COLOR);

    let mut days = Vec::new();
    if let Some(entries) = value.get("calendar_days").and_then(Value::as_array) {
        for entry in entries {
            if days.len() >= LIMITS.max_calendar_days {
                break;
            }
            let (Some(date), Some(completed)) = (entry.get("date"), entry.get("completed")) else {
                continue;
            };
            days.push(HabitDay {
                date: date.as_f64().unwrap_or(0.0) as i64,
                completed: completed.as_bool().unwrap_or(false),
            });
        }
    }

    Habit {
        id,
        name,
        color,
        days,
    }
}

fn color_from_json(value: &Value) -> Option<HabitColor> {
    Some(HabitColor {
        r: value.get("r")?.as_f64()? as f32,
        g: value.get("g")?.as_f64()? as f32,
        b: value.get("b")?.as_f64()? as f32,
        a: value.get("a")?.as_f64()? as f32,
    })
}

fn truncate_name(name: &str) -> String {
    if name.len() <= LIMITS.max_name_bytes {
        return name.to_string();
    }
    let mut end = LIMITS.max_name_bytes;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::SystemTime};

    use serde_json::json;

    use super::*;
    use crate::constants::COLORS;

    fn unique_path(prefix: &str, extension: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        PathBuf::from(format!("/tmp/{}_{}.{}", prefix, now, extension))
    }

    fn store_with(document: Value) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.write_document(&document.to_string()).unwrap();
        store
    }

    #[test]
    fn test_missing_file_yields_the_default_collection() {
        let path = unique_path("cairn_missing", "json");
        let mut store = FileStore::new(path.clone());

        let collection = load_collection(&mut store);

        assert_eq!(collection.habits.len(), 1);
        assert_eq!(collection.habits[0].name, DEFAULT_HABIT_NAME);
        assert_eq!(collection.habits[0].color, PRIMARY_COLOR);
        assert!(collection.habits[0].days.is_empty());
        assert_eq!(collection.active_habit_id, 0);
        assert!(path.exists());

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_invalid_json_falls_back_to_the_default_collection() {
        let path = unique_path("cairn_invalid", "json");
        fs::write(&path, "{not json").unwrap();
        let mut store = FileStore::new(path.clone());

        let collection = load_collection(&mut store);
        assert_eq!(collection.habits.len(), 1);
        assert_eq!(collection.habits[0].name, DEFAULT_HABIT_NAME);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<Value>(&rewritten).is_ok());

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_round_trip_preserves_persisted_fields() {
        let mut collection = HabitCollection::default();
        collection.add_habit();
        collection.add_habit();
        assert!(collection.set_habit_name(0, "Stretch"));
        assert!(collection.set_habit_color(1, COLORS[3]));
        collection.habits[0].days.push(HabitDay {
            date: 1_750_000_000,
            completed: true,
        });
        collection.habits[0].days.push(HabitDay {
            date: 1_750_100_000,
            completed: false,
        });
        collection.active_habit_id = 1;
        collection.is_calendar_expanded = true;
        collection.extra_weeks = 4;
        collection.calendar_offset_weeks = 1;

        let mut store = MemoryStore::new();
        save_collection(&mut store, &collection).unwrap();
        let loaded = load_collection(&mut store);

        assert_eq!(loaded.habits, collection.habits);
        assert_eq!(loaded.active_habit_id, 1);
        assert!(loaded.is_calendar_expanded);
        assert_eq!(loaded.extra_weeks, 4);
        assert_eq!(loaded.calendar_offset_weeks, 1);
        assert!(!loaded.is_editing_new_habit);
        assert!(loaded.name_draft.is_empty());
        assert!(!loaded.has_done_initial_scroll);
    }

    #[test]
    fn test_documents_without_the_offset_field_still_load() {
        let mut store = store_with(json!({
            "active_habit_id": 0,
            "is_calendar_expanded": true,
            "extra_weeks": 2,
            "habits": [{
                "id": 0,
                "name": "Water",
                "color": {"r": 0.0, "g": 176.0, "b": 80.0, "a": 255.0},
                "calendar_days": []
            }]
        }));

        let collection = load_collection(&mut store);
        assert_eq!(collection.calendar_offset_weeks, 0);
        assert!(collection.is_calendar_expanded);
        assert_eq!(collection.habits[0].name, "Water");
    }

    #[test]
    fn test_wrong_typed_fields_keep_their_defaults() {
        let mut store = store_with(json!({
            "active_habit_id": "zero",
            "is_calendar_expanded": 1,
            "extra_weeks": "lots",
            "calendar_offset_weeks": -3,
            "habits": [{
                "id": "first",
                "name": 42,
                "color": {"r": 1.0, "g": 2.0, "b": 3.0},
                "calendar_days": []
            }]
        }));

        let collection = load_collection(&mut store);
        assert_eq!(collection.active_habit_id, 0);
        assert!(!collection.is_calendar_expanded);
        assert_eq!(collection.extra_weeks, 0);
        assert_eq!(collection.calendar_offset_weeks, 0);

        let habit = &collection.habits[0];
        assert_eq!(habit.id, 0);
        assert_eq!(habit.name, UNNAMED_HABIT_NAME);
        assert_eq!(habit.color, PRIMARY_COLOR);
    }

    #[test]
    fn test_day_entries_missing_a_field_are_skipped() {
        let mut store = store_with(json!({
            "active_habit_id": 0,
            "habits": [{
                "id": 0,
                "name": "Water",
                "color": {"r": 0.0, "g": 176.0, "b": 80.0, "a": 255.0},
                "calendar_days": [
                    {"date": 1_750_000_000i64, "completed": true},
                    {"date": 1_750_100_000i64},
                    {"completed": true},
                    {"date": 1_750_200_000i64, "completed": false}
                ]
            }]
        }));

        let collection = load_collection(&mut store);
        let days = &collection.habits[0].days;
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, 1_750_000_000);
        assert!(days[0].completed);
        assert_eq!(days[1].date, 1_750_200_000);
        assert!(!days[1].completed);
    }

    #[test]
    fn test_oversized_names_are_truncated_on_load() {
        let mut store = store_with(json!({
            "habits": [{
                "id": 0,
                "name": "a".repeat(64),
                "color": {"r": 0.0, "g": 0.0, "b": 0.0, "a": 255.0},
                "calendar_days": []
            }]
        }));

        let collection = load_collection(&mut store);
        assert_eq!(collection.habits[0].name.len(), LIMITS.max_name_bytes);
    }

    #[test]
    fn test_habit_list_is_capped_on_load() {
        let habits: Vec<Value> = (0..15)
            .map(|i| {
                json!({
                    "id": i,
                    "name": format!("Habit {}", i + 1),
                    "color": {"r": 0.0, "g": 0.0, "b": 0.0, "a": 255.0},
                    "calendar_days": []
                })
            })
            .collect();
        let mut store = store_with(json!({"active_habit_id": 12, "habits": habits}));

        let collection = load_collection(&mut store);
        assert_eq!(collection.habits.len(), LIMITS.max_habits);
        assert_eq!(collection.active_habit_id, 0);
    }

    #[test]
    fn test_empty_habit_list_synthesizes_the_default_in_memory_only() {
        let document = json!({"active_habit_id": 0, "habits": []}).to_string();
        let mut store = MemoryStore::new();
        store.write_document(&document).unwrap();

        let collection = load_collection(&mut store);
        assert_eq!(collection.habits.len(), 1);
        assert_eq!(collection.habits[0].name, DEFAULT_HABIT_NAME);

        assert_eq!(store.read_document().unwrap().unwrap(), document);
    }

    #[test]
    fn test_atomic_write_replaces_the_file() {
        let path = unique_path("cairn_atomic", "json");
        atomic_write(&path, "first").unwrap();
        atomic_write(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_extension("tmp").exists());

        fs::remove_file(path).ok();
    }
}
