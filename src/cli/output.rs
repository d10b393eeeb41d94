//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use std::fmt::Display;

use colored::Colorize;

use crate::domain::{ChangeDiff, Draft, ValueDiff};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

pub fn header(msg: &(impl Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}

/// One row of `draft list`; the active draft is starred.
pub fn draft_row(draft: &Draft, active: bool) {
    let marker = if active { "*".green().bold() } else { " ".normal() };
    println!(
        "{} {}  {:<24} {:>3} changes  {}",
        marker,
        draft.id.to_string().dimmed(),
        draft.name,
        draft.changes.len(),
        draft.created_at.format("%Y-%m-%d %H:%M")
    );
}

/// Pending-changes panel entry for one user.
pub fn pending_change(diff: &ChangeDiff) {
    println!("{} {}", diff.user_name.bold(), diff.user_id.to_string().dimmed());
    if diff.is_empty() {
        detail(&"(no effective change)".dimmed());
        return;
    }
    for (label, value) in [
        ("supervisor", &diff.supervisor),
        ("department", &diff.department),
        ("role", &diff.role),
    ] {
        if let Some(value) = value {
            field_change(label, value);
        }
    }
    if let Some(squads) = &diff.squads {
        detail(&"squads");
        for name in &squads.removed {
            println!("    {} {}", "-".red(), name);
        }
        for name in &squads.added {
            println!("    {} {}", "+".green(), name);
        }
        for name in &squads.unchanged {
            println!("    {} {}", "=".dimmed(), name.dimmed());
        }
    }
}

fn field_change(label: &str, value: &ValueDiff) {
    let old = value.old.as_deref().unwrap_or("None");
    let new = value.new.as_deref().unwrap_or("None");
    println!("  {:<11} {} → {}", label, old.red(), new.green());
}
