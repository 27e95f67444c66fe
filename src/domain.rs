use std::time::Duration;

use serde::Serialize;

use crate::{
    calendar::{self, CalendarWindow},
    constants::{DEFAULT_HABIT_NAME, LIMITS, PRIMARY_COLOR, TOGGLE_SETTINGS, WINDOW_SETTINGS},
    storage::{self, HabitStore},
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HabitColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl HabitColor {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 255.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HabitDay {
    pub date: i64,
    pub completed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Habit {
    pub id: u32,
    pub name: String,
    pub color: HabitColor,
    #[serde(rename = "calendar_days")]
    pub days: Vec<HabitDay>,
}

impl Habit {
    pub fn new(id: u32, name: impl Into<String>, color: HabitColor) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            days: Vec::new(),
        }
    }

    pub fn toggle_day(&mut self, date: i64) -> bool {
        if calendar::local_midnight(date).is_none() {
            return false;
        }
        for day in &mut self.days {
            if calendar::same_calendar_day(day.date, date) {
                day.completed = !day.completed;
                day.date = date;
                return true;
            }
        }
        if self.days.len() >= LIMITS.max_calendar_days {
            eprintln!(
                "Warning: habit '{}' is at its day-record limit, toggle dropped",
                self.name
            );
            return false;
        }
        self.days.push(HabitDay {
            date,
            completed: true,
        });
        true
    }

    pub fn is_completed(&self, date: i64) -> bool {
        self.days
            .iter()
            .any(|day| day.completed && calendar::same_calendar_day(day.date, date))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HabitCollection {
    pub habits: Vec<Habit>,
    pub active_habit_id: u32,
    pub is_editing_new_habit: bool,
    pub name_draft: String,
    pub is_calendar_expanded: bool,
    pub extra_weeks: i32,
    pub calendar_offset_weeks: i32,
    pub has_done_initial_scroll: bool,
}

impl HabitCollection {
    pub fn with_default_habit() -> Self {
        let mut collection = Self::default();
        collection
            .habits
            .push(Habit::new(0, DEFAULT_HABIT_NAME, PRIMARY_COLOR));
        collection
    }

    pub fn habit_by_id(&self, id: u32) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn habit_by_id_mut(&mut self, id: u32) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|habit| habit.id == id)
    }

    pub fn active_habit(&self) -> Option<&Habit> {
        self.habit_by_id(self.active_habit_id)
    }

    pub fn active_habit_mut(&mut self) -> Option<&mut Habit> {
        self.habit_by_id_mut(self.active_habit_id)
    }

    pub fn add_habit(&mut self) -> Option<u32> {
        if self.habits.len() >= LIMITS.max_habits {
            return None;
        }
        let id = self.habits.len() as u32;
        let name = format!("Habit {}", self.habits.len() + 1);
        self.habits.push(Habit::new(id, name, PRIMARY_COLOR));
        self.active_habit_id = id;
        Some(id)
    }

    pub fn delete_habit(&mut self, id: u32) {
        let Some(index) = self.habits.iter().position(|habit| habit.id == id) else {
            return;
        };
        self.habits.remove(index);
        for (position, habit) in self.habits.iter_mut().enumerate().skip(index) {
            habit.id = position as u32;
        }
        if self.active_habit_id == id {
            if !self.habits.is_empty() {
                self.active_habit_id = index.saturating_sub(1) as u32;
            }
        } else if self.active_habit_id > id {
            self.active_habit_id -= 1;
        }
    }

    pub fn set_habit_name(&mut self, id: u32, name: &str) -> bool {
        if name.is_empty() || name.len() > LIMITS.max_name_bytes {
            return false;
        }
        match self.habit_by_id_mut(id) {
            Some(habit) => {
                habit.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_habit_color(&mut self, id: u32, color: HabitColor) -> bool {
        match self.habit_by_id_mut(id) {
            Some(habit) => {
                habit.color = color;
                true
            }
            None => false,
        }
    }

    pub fn toggle_active_day(&mut self, date: i64) -> bool {
        match self.active_habit_mut() {
            Some(habit) => habit.toggle_day(date),
            None => false,
        }
    }

    pub fn expand_calendar(&mut self) {
        if !self.is_calendar_expanded {
            self.is_calendar_expanded = true;
            self.extra_weeks = WINDOW_SETTINGS.expand_step_weeks;
        } else {
            self.extra_weeks += WINDOW_SETTINGS.expand_step_weeks;
        }
    }

    pub fn collapse_calendar(&mut self) {
        self.is_calendar_expanded = false;
        self.extra_weeks = 0;
    }
}

pub struct HabitTracker {
    collection: HabitCollection,
    store: Box<dyn HabitStore>,
    last_toggle: Option<Duration>,
}

impl HabitTracker {
    pub fn new(store: Box<dyn HabitStore>) -> Self {
        let mut tracker = Self {
            collection: HabitCollection::default(),
            store,
            last_toggle: None,
        };
        tracker.collection = storage::load_collection(tracker.store.as_mut());
        tracker
    }

    pub fn collection(&self) -> &HabitCollection {
        &self.collection
    }

    pub fn reload(&mut self) {
        let loaded = storage::load_collection(self.store.as_mut());
        self.collection = HabitCollection {
            habits: loaded.habits,
            active_habit_id: self.collection.active_habit_id,
            is_editing_new_habit: self.collection.is_editing_new_habit,
            name_draft: self.collection.name_draft.clone(),
            is_calendar_expanded: loaded.is_calendar_expanded,
            extra_weeks: loaded.extra_weeks,
            calendar_offset_weeks: loaded.calendar_offset_weeks.max(0),
            has_done_initial_scroll: self.collection.has_done_initial_scroll,
        };
    }

    pub fn calendar_window(&self, now: i64) -> Option<CalendarWindow> {
        let habit = self.collection.active_habit()?;
        calendar::calendar_window(
            habit,
            self.collection.is_calendar_expanded,
            self.collection.extra_weeks,
            now,
        )
    }

    pub fn toggle_day(&mut self, date: i64, since_start: Duration) -> bool {
        if date == 0 {
            eprintln!("Warning: toggle requested for an invalid date, ignoring");
            return false;
        }
        let debounce = Duration::from_millis(TOGGLE_SETTINGS.debounce_ms);
        if let Some(last) = self.last_toggle {
            if since_start.saturating_sub(last) < debounce {
                return false;
            }
        }
        self.last_toggle = Some(since_start);
        if self.collection.toggle_active_day(date) {
            self.save();
            true
        } else {
            false
        }
    }

    pub fn add_habit(&mut self) -> Option<u32> {
        let id = self.collection.add_habit()?;
        self.save();
        Some(id)
    }

    pub fn delete_habit(&mut self, id: u32) {
        if self.collection.habit_by_id(id).is_none() {
            return;
        }
        self.collection.delete_habit(id);
        self.save();
    }

    pub fn rename_active(&mut self, name: &str) -> bool {
        let id = self.collection.active_habit_id;
        if self.collection.set_habit_name(id, name) {
            self.collection.is_editing_new_habit = false;
            self.save();
            true
        } else {
            false
        }
    }

    pub fn recolor_active(&mut self, color: HabitColor) -> bool {
        let id = self.collection.active_habit_id;
        if self.collection.set_habit_color(id, color) {
            self.save();
            true
        } else {
            false
        }
    }

    pub fn set_active_habit(&mut self, id: u32) -> bool {
        if self.collection.habit_by_id(id).is_none() {
            return false;
        }
        self.collection.is_editing_new_habit = false;
        self.collection.active_habit_id = id;
        self.save();
        true
    }

    pub fn set_editing(&mut self, editing: bool, draft: &str) {
        self.collection.is_editing_new_habit = editing;
        self.collection.name_draft = draft.to_string();
    }

    pub fn expand_calendar(&mut self) {
        self.collection.expand_calendar();
        self.save();
    }

    pub fn collapse_calendar(&mut self) {
        self.collection.collapse_calendar();
        self.save();
    }

    pub fn mark_initial_scroll(&mut self) {
        if self.collection.has_done_initial_scroll {
            return;
        }
        self.collection.has_done_initial_scroll = true;
        self.save();
    }

    fn save(&mut self) {
        if let Err(e) = storage::save_collection(self.store.as_mut(), &self.collection) {
            eprintln!("Warning: could not save habits: {}", e);
        }
    }
}
