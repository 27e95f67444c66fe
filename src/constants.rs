use crate::domain::HabitColor;

pub const COLORS: [HabitColor; 12] = [
    HabitColor::rgb(0.0, 176.0, 80.0),
    HabitColor::rgb(128.0, 255.0, 0.0),
    HabitColor::rgb(255.0, 255.0, 0.0),
    HabitColor::rgb(255.0, 204.0, 0.0),
    HabitColor::rgb(255.0, 153.0, 0.0),
    HabitColor::rgb(255.0, 51.0, 0.0),
    HabitColor::rgb(255.0, 0.0, 0.0),
    HabitColor::rgb(153.0, 0.0, 255.0),
    HabitColor::rgb(102.0, 51.0, 255.0),
    HabitColor::rgb(0.0, 0.0, 255.0),
    HabitColor::rgb(0.0, 153.0, 255.0),
    HabitColor::rgb(0.0, 255.0, 255.0),
];

pub const PRIMARY_COLOR: HabitColor = HabitColor::rgb(102.0, 51.0, 255.0);

pub const DEFAULT_HABIT_NAME: &str = "Meditation";
pub const UNNAMED_HABIT_NAME: &str = "Unnamed Habit";

pub const LIMITS: Limits = Limits {
    max_habits: 10,
    max_calendar_days: 1000,
    max_name_bytes: 31,
};

pub const WINDOW_SETTINGS: WindowSettings = WindowSettings {
    past_days: 14,
    future_days: 21,
    expand_step_weeks: 2,
};

pub const TOGGLE_SETTINGS: ToggleSettings = ToggleSettings { debounce_ms: 250 };

pub struct Limits {
    pub max_habits: usize,
    pub max_calendar_days: usize,
    pub max_name_bytes: usize,
}

pub struct WindowSettings {
    pub past_days: i64,
    pub future_days: i64,
    pub expand_step_weeks: i32,
}

pub struct ToggleSettings {
    pub debounce_ms: u64,
}
