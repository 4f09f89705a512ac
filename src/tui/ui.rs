use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use tasker::commands::relative_day;
use tasker::models::{Category, Field, Priority, Status};
use tasker::pipeline::effective_date;
use super::app::{AddStep, App, InputField, InputMode, ViewMode};

fn category_color(c: Category) -> Color {
    match c {
        Category::Event => Color::Blue,
        Category::Daily => Color::Magenta,
        Category::Project => Color::Yellow,
        Category::Personal => Color::Cyan,
    }
}

fn priority_style(p: Option<Priority>) -> Style {
    match p {
        Some(Priority::High) => Style::default().fg(Color::Red),
        Some(Priority::Low) => Style::default().fg(Color::Green),
        _ => Style::default().fg(Color::Yellow),
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::Tasks => {
            let today = app.now.date();

            let rows: Vec<Row> = app
                .tasks
                .iter()
                .map(|t| {
                    let when = effective_date(t, today)
                        .map(|d| relative_day(d, today))
                        .unwrap_or_else(|| "-".to_string());
                    let style = if t.status() == Status::Completed {
                        Style::default().fg(Color::DarkGray)
                    } else {
                        Style::default()
                    };
                    let mut title = t.title.clone();
                    if t.has_image() {
                        title.push_str(" [img]");
                    }

                    Row::new(vec![
                        Cell::from(t.id.short()),
                        Cell::from(title),
                        Cell::from(t.category.to_string())
                            .style(Style::default().fg(category_color(t.category))),
                        Cell::from(when),
                        Cell::from(t.time.clone().unwrap_or_default()),
                        Cell::from(t.location.clone().unwrap_or_default()),
                        Cell::from(t.priority.map(|p| p.to_string()).unwrap_or_default())
                            .style(priority_style(t.priority)),
                        Cell::from(t.status().label()),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(9),
                Constraint::Min(20),
                Constraint::Length(9),
                Constraint::Length(10),
                Constraint::Length(9),
                Constraint::Length(16),
                Constraint::Length(8),
                Constraint::Length(12),
            ];

            let filter = app.filter.map(|c| c.as_str()).unwrap_or("all");
            let title = format!(
                "tasker - Tasks [{}{}] - next rollover {}",
                filter,
                if app.show_completed { ", with done" } else { "" },
                app.rollover.deadline().format("%Y-%m-%d %H:%M"),
            );

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Title", "Category", "When", "Time", "Location", "Priority", "Status"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(title))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        ViewMode::Templates => {
            let rows: Vec<Row> = app
                .templates
                .iter()
                .map(|t| {
                    Row::new(vec![
                        Cell::from(t.title.clone()),
                        Cell::from(t.time.clone().unwrap_or_default()),
                        Cell::from(t.priority.unwrap_or_default().to_string())
                            .style(priority_style(t.priority)),
                        Cell::from(t.details.clone().unwrap_or_default()),
                    ])
                })
                .collect();

            let widths = [
                Constraint::Min(20),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Min(20),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["Title", "Time", "Priority", "Details"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title("tasker - Daily Templates"))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.template_state);
        }
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Tasks => "q: Quit | a: Add | n: Title | e: Details | t: Date | l: Loc | m: Image | p: Prio | s: Status | Space: Done | d: Del | f: Filter | c: Toggle Done | x: Export | i: Import | v: Templates",
            ViewMode::Templates => "q: Quit | a: Add Template | d: Del | v: View Tasks",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };

    let mut help_block = Block::default().borders(Borders::ALL);
    if let Some(msg) = &app.status_message {
        help_block = help_block.title(msg.as_str());
    }
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(help_block);

    f.render_widget(help, chunks[1]);

    // Render Input Box if needed
    if app.input_mode == InputMode::Normal {
        return;
    }
    let area = centered_rect(60, 3, f.area());
    f.render_widget(Clear, area);

    let title = match app.input_mode {
        InputMode::Adding => add_prompt(app),
        _ => edit_prompt(app),
    };
    let input = Paragraph::new(app.input_buffer.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(input, area);
}

fn field_hint(field: Field) -> &'static str {
    match field {
        Field::Date | Field::DueDate => " (YYYY-MM-DD, optional)",
        Field::Time => " (e.g. 9:00 AM, optional)",
        Field::Image => " (path to image file, optional)",
        _ => " (optional)",
    }
}

fn add_prompt(app: &App) -> String {
    let what = if app.add_state.template { "Add Template" } else { "Add Task" };
    match app.add_state.current() {
        Some(AddStep::Title) => format!("{}: Enter Title", what),
        Some(AddStep::Category) => format!("{}: Category (event/daily/project/personal)", what),
        Some(AddStep::Field(field)) => format!("{}: {}{}", what, field.label(), field_hint(field)),
        Some(AddStep::Priority) => format!("{}: Priority (high/medium/low, default medium)", what),
        None => what.to_string(),
    }
}

fn edit_prompt(app: &App) -> String {
    let label = match app.input_field {
        InputField::Title => "Edit Title".to_string(),
        InputField::Priority => "Edit Priority (high/medium/low)".to_string(),
        InputField::Task(Field::Image) => "Attach Image (path)".to_string(),
        InputField::Task(field) => format!("Edit {}{}", field.label(), field_hint(field)),
        InputField::ImportPath => return "Import Backup (path to JSON file)".to_string(),
        InputField::None => "Edit".to_string(),
    };
    match app.target() {
        Some(t) => format!("{} - {}", label, t.title),
        None => label,
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
