use std::{io, path::PathBuf, time::Instant};

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use clap::{CommandFactory, Parser, ValueEnum};
use serde::Serialize;

use crate::{
    calendar::{self, CalendarWindow},
    constants::COLORS,
    domain::{Habit, HabitTracker},
    storage::{self, FileStore},
};

#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(about = "Daily habit tracking from the command line", long_about = None)]
pub enum Cli {
    #[command(about = "List habits")]
    List,

    #[command(about = "Add a new habit")]
    Add {
        #[arg(help = "Habit name")]
        name: Option<String>,
    },

    #[command(about = "Delete a habit")]
    Remove {
        #[arg(help = "Habit id")]
        id: u32,
    },

    #[command(about = "Rename the active habit")]
    Rename {
        #[arg(help = "New name")]
        name: String,
    },

    #[command(about = "Recolor the active habit")]
    Color {
        #[arg(help = "Palette index (0-11)")]
        index: usize,
    },

    #[command(about = "Switch the active habit")]
    Use {
        #[arg(help = "Habit id")]
        id: u32,
    },

    #[command(about = "Toggle a day on the active habit")]
    Toggle {
        #[arg(long, help = "Day to toggle (YYYY-MM-DD, default today)")]
        date: Option<String>,
    },

    #[command(about = "Show the calendar for the active habit")]
    Show {
        #[arg(long, help = "Treat this day as today (YYYY-MM-DD)")]
        date: Option<String>,
    },

    #[command(about = "Extend the calendar look-back by two weeks")]
    Expand,

    #[command(about = "Reset the calendar to the default look-back")]
    Collapse,

    #[command(about = "Export habits")]
    Export {
        #[arg(long, value_enum, help = "Export format")]
        format: ExportFormat,

        #[arg(long, short, help = "Output path")]
        out: Option<PathBuf>,
    },

    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(help = "Shell type (bash, zsh, fish)")]
        shell: String,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitDayExport {
    pub date: String,
    pub timestamp: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitExport {
    pub id: u32,
    pub name: String,
    pub color_index: Option<usize>,
    pub days: Vec<HabitDayExport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataExport {
    pub schema_version: u32,
    pub exported_at: DateTime<Utc>,
    pub active_habit_id: u32,
    pub habits: Vec<HabitExport>,
}

fn open_tracker() -> HabitTracker {
    HabitTracker::new(Box::new(FileStore::at_default_path()))
}

fn parse_day_timestamp(text: &str) -> Result<i64, String> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", text))?;
    calendar::day_start(date).ok_or_else(|| format!("Date '{}' is out of range", text))
}

fn day_label(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn list_habits() -> Result<(), String> {
    let tracker = open_tracker();
    let collection = tracker.collection();

    for habit in &collection.habits {
        let marker = if habit.id == collection.active_habit_id {
            "*"
        } else {
            " "
        };
        let completed = habit.days.iter().filter(|day| day.completed).count();
        println!("{} {:2}  {:31}  {} days done", marker, habit.id, habit.name, completed);
    }
    Ok(())
}

pub fn add_habit(name: Option<String>) -> Result<(), String> {
    let mut tracker = open_tracker();
    let id = tracker
        .add_habit()
        .ok_or_else(|| "Habit limit reached (10)".to_string())?;
    tracker.set_editing(true, "");

    if let Some(name) = name {
        if !tracker.rename_active(&name) {
            return Err(format!("Invalid habit name '{}' (1-31 bytes)", name));
        }
    }

    let habit_name = tracker
        .collection()
        .active_habit()
        .map(|habit| habit.name.clone())
        .unwrap_or_default();
    println!("Added habit {} '{}'", id, habit_name);
    Ok(())
}

pub fn remove_habit(id: u32) -> Result<(), String> {
    let mut tracker = open_tracker();
    let name = tracker
        .collection()
        .habit_by_id(id)
        .map(|habit| habit.name.clone())
        .ok_or_else(|| format!("Habit {} not found", id))?;

    tracker.delete_habit(id);
    println!("Removed habit '{}'", name);
    Ok(())
}

pub fn rename_habit(name: String) -> Result<(), String> {
    let mut tracker = open_tracker();
    if !tracker.rename_active(&name) {
        return Err(format!("Invalid habit name '{}' (1-31 bytes)", name));
    }
    println!("Renamed active habit to '{}'", name);
    Ok(())
}

pub fn recolor_habit(index: usize) -> Result<(), String> {
    if index >= COLORS.len() {
        return Err(format!(
            "Palette index {} out of range (0-{})",
            index,
            COLORS.len() - 1
        ));
    }

    let mut tracker = open_tracker();
    if !tracker.recolor_active(COLORS[index]) {
        return Err("No active habit".to_string());
    }
    println!("Recolored active habit to palette entry {}", index);
    Ok(())
}

pub fn use_habit(id: u32) -> Result<(), String> {
    let mut tracker = open_tracker();
    if !tracker.set_active_habit(id) {
        return Err(format!("Habit {} not found", id));
    }
    let name = tracker
        .collection()
        .active_habit()
        .map(|habit| habit.name.clone())
        .unwrap_or_default();
    println!("Now tracking '{}'", name);
    Ok(())
}

pub fn toggle_day(date: Option<String>, started: Instant) -> Result<(), String> {
    let mut tracker = open_tracker();
    let habit_name = tracker
        .collection()
        .active_habit()
        .map(|habit| habit.name.clone())
        .ok_or_else(|| "No active habit".to_string())?;

    let timestamp = match &date {
        Some(text) => parse_day_timestamp(text)?,
        None => Local::now().timestamp(),
    };

    if !tracker.toggle_day(timestamp, started.elapsed()) {
        return Err("Toggle was not applied".to_string());
    }

    let completed = tracker
        .collection()
        .active_habit()
        .map(|habit| habit.is_completed(timestamp))
        .unwrap_or(false);
    println!(
        "{} on {}: {}",
        habit_name,
        day_label(timestamp),
        if completed { "done" } else { "not done" }
    );
    Ok(())
}

pub fn show_calendar(date: Option<String>) -> Result<(), String> {
    let mut tracker = open_tracker();
    tracker.reload();

    let habit_name = tracker
        .collection()
        .active_habit()
        .map(|habit| habit.name.clone())
        .ok_or_else(|| "No active habit".to_string())?;

    let now = match &date {
        Some(text) => parse_day_timestamp(text)?,
        None => Local::now().timestamp(),
    };
    let window = tracker
        .calendar_window(now)
        .ok_or_else(|| "Could not build a calendar window".to_string())?;

    print_window(&habit_name, &window);
    tracker.mark_initial_scroll();
    Ok(())
}

fn print_window(name: &str, window: &CalendarWindow) {
    const DAY_LABELS: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

    println!(
        "{}  {} to {} ({} days, {} weeks)",
        name,
        day_label(window.start),
        day_label(window.end),
        window.total_days,
        window.total_weeks
    );

    let first_column = Local
        .timestamp_opt(window.start, 0)
        .single()
        .map(|dt| dt.weekday().num_days_from_sunday() as usize)
        .unwrap_or(0);
    let header: String = (0..7)
        .map(|column| format!("  {}  ", DAY_LABELS[(first_column + column) % 7]))
        .collect();
    println!("{:12}{}", "", header);

    for week in &window.weeks {
        let row_label = week.first().map(|day| day_label(day.date)).unwrap_or_default();
        let row: String = week
            .iter()
            .map(|day| {
                let mark = if day.is_completed {
                    'x'
                } else if day.is_past {
                    '.'
                } else {
                    ' '
                };
                if day.is_today {
                    format!("[{:>2}{}]", day.day_of_month, mark)
                } else {
                    format!(" {:>2}{} ", day.day_of_month, mark)
                }
            })
            .collect();
        println!("{}  {}", row_label, row);
    }
}

pub fn expand_calendar() -> Result<(), String> {
    let mut tracker = open_tracker();
    tracker.expand_calendar();
    let weeks = tracker.collection().extra_weeks;
    println!("Calendar look-back extended by {} extra weeks", weeks);
    Ok(())
}

pub fn collapse_calendar() -> Result<(), String> {
    let mut tracker = open_tracker();
    tracker.collapse_calendar();
    println!("Calendar reset to the default look-back");
    Ok(())
}

fn habit_export(habit: &Habit) -> HabitExport {
    HabitExport {
        id: habit.id,
        name: habit.name.clone(),
        color_index: COLORS.iter().position(|&color| color == habit.color),
        days: habit
            .days
            .iter()
            .map(|day| HabitDayExport {
                date: day_label(day.date),
                timestamp: day.date,
                completed: day.completed,
            })
            .collect(),
    }
}

pub fn export_data(format: ExportFormat, out_path: Option<PathBuf>) -> Result<(), String> {
    let tracker = open_tracker();
    let collection = tracker.collection();

    let text = match format {
        ExportFormat::Json => {
            let export = DataExport {
                schema_version: 1,
                exported_at: Utc::now(),
                active_habit_id: collection.active_habit_id,
                habits: collection.habits.iter().map(habit_export).collect(),
            };
            serde_json::to_string_pretty(&export).map_err(|e| e.to_string())?
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(vec![]);
            writer
                .write_record(["habit_id", "habit_name", "date", "completed"])
                .map_err(|e| e.to_string())?;
            for habit in &collection.habits {
                for day in &habit.days {
                    writer
                        .write_record([
                            habit.id.to_string(),
                            habit.name.clone(),
                            day_label(day.date),
                            day.completed.to_string(),
                        ])
                        .map_err(|e| e.to_string())?;
                }
            }
            let data = writer.into_inner().map_err(|e| e.to_string())?;
            String::from_utf8(data).map_err(|e| e.to_string())?
        }
    };

    match out_path {
        Some(path) => {
            storage::write_text_file(&path, &text).map_err(|e| e.to_string())?;
            println!("Exported to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

pub fn print_completions(shell: &str) -> Result<(), String> {
    use clap_complete::Shell;
    match shell {
        "bash" => {
            clap_complete::generate(Shell::Bash, &mut Cli::command(), "cairn", &mut io::stdout());
        }
        "zsh" => {
            clap_complete::generate(Shell::Zsh, &mut Cli::command(), "cairn", &mut io::stdout());
        }
        "fish" => {
            clap_complete::generate(Shell::Fish, &mut Cli::command(), "cairn", &mut io::stdout());
        }
        _ => {
            return Err(format!(
                "Unsupported shell: {}. Use bash, zsh, or fish.",
                shell
            ));
        }
    }
    Ok(())
}

pub fn run_cli() {
    let started = Instant::now();
    let cli = Cli::parse();

    let result = match cli {
        Cli::List => list_habits(),
        Cli::Add { name } => add_habit(name),
        Cli::Remove { id } => remove_habit(id),
        Cli::Rename { name } => rename_habit(name),
        Cli::Color { index } => recolor_habit(index),
        Cli::Use { id } => use_habit(id),
        Cli::Toggle { date } => toggle_day(date, started),
        Cli::Show { date } => show_calendar(date),
        Cli::Expand => expand_calendar(),
        Cli::Collapse => collapse_calendar(),
        Cli::Export { format, out } => export_data(format, out),
        Cli::Completions { shell } => print_completions(&shell),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
