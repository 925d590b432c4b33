use console::{Style, style};
use tasklane_types::{Priority, PriorityLevel, Task, TaskStatus};

fn priority_style(priority: Priority) -> Style {
    match priority.level() {
        PriorityLevel::Critical => Style::new().red().bold(),
        PriorityLevel::High => Style::new().yellow(),
        PriorityLevel::Medium => Style::new().blue(),
        PriorityLevel::Low => Style::new().dim(),
    }
}

fn status_style(status: TaskStatus) -> Style {
    match status {
        TaskStatus::Waiting => Style::new().white(),
        TaskStatus::InProgress => Style::new().cyan(),
        TaskStatus::Completed => Style::new().green(),
    }
}

/// One line per task: id, priority, status, creation date, title.
pub fn task_line(task: &Task) -> String {
    format!(
        "{:>5}  {}  {}  {}  {}",
        style(format!("#{}", task.id)).dim(),
        priority_style(task.priority).apply_to(format!("P{:<2}", task.priority.get())),
        status_style(task.status).apply_to(format!("{:<11}", task.status)),
        style(task.created_at.format("%Y-%m-%d %H:%M")).dim(),
        style(&task.title).bold(),
    )
}

pub fn task_lines(tasks: &[Task]) -> Vec<String> {
    if tasks.is_empty() {
        return vec![style("No tasks").dim().to_string()];
    }

    let mut lines = Vec::with_capacity(tasks.len());
    for task in tasks {
        lines.push(task_line(task));
        if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(format!("{:>7}{}", "", style(description).dim()));
        }
    }
    lines
}
