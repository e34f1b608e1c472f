use std::io::Stdout;

use chrono::{DateTime, Utc};
use log::error;
use tui::backend::CrosstermBackend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::App;
use crate::state::fetcher::FetchStatus;
use crate::state::network::LoadingState;
use crate::ui::layout::LayoutAreas;

const KEY_HINTS: &str = "q quit  r refetch  a auto-refresh  f full screen  \" logs";

pub fn draw(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &App, loading: LoadingState) {
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);
    let now = Utc::now();

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_header(f, layout.header, app, loading);
        }
        draw_deadline(f, layout.main, app, now);
        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }
    });

    if let Err(e) = result {
        error!("Failed to draw frame: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_header(f: &mut Frame, area: [Rect; 2], app: &App, loading: LoadingState) {
    let team = match app.team_id() {
        Some(id) => format!("Team {id}"),
        None => "No team selected".to_string(),
    };
    let title = Paragraph::new(Line::from(vec![
        Span::styled(" FPL Deadline ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {team} "), Style::default().fg(Color::DarkGray)),
    ]))
    .block(default_border(Color::DarkGray));
    f.render_widget(title, area[0]);

    let (status, color) = if loading.is_loading {
        ("Loading", Color::White)
    } else {
        match app.state.deadline.status {
            FetchStatus::Failed => ("Failed", Color::Red),
            FetchStatus::Ready if app.state.deadline.using_fallback => ("Fallback", Color::Yellow),
            other => (other.label(), Color::Green),
        }
    };
    let status = Paragraph::new(Span::styled(status, Style::default().fg(color)))
        .alignment(Alignment::Center)
        .block(default_border(Color::DarkGray));
    f.render_widget(status, area[1]);
}

fn draw_deadline(f: &mut Frame, area: Rect, app: &App, now: DateTime<Utc>) {
    let border = if app.state.deadline.using_fallback { Color::Yellow } else { Color::DarkGray };
    let block = default_border(border).title(" Gameweek Deadline ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let [_top_pad, body, footer] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Length(2),
    ])
    .areas(inner);

    f.render_widget(
        Paragraph::new(deadline_lines(app))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        body,
    );
    f.render_widget(
        Paragraph::new(status_lines(app, now))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        footer,
    );
}

fn deadline_lines(app: &App) -> Vec<Line<'static>> {
    let deadline = &app.state.deadline;
    let Some(resolved) = &deadline.resolved else {
        return match deadline.status {
            FetchStatus::Failed => vec![Line::styled(
                format!("Error: {}", app.state.last_error.as_deref().unwrap_or("unknown error")),
                Style::default().fg(Color::Red),
            )],
            _ => vec![Line::from("Loading deadline...")],
        };
    };

    let mut lines = Vec::new();
    if let Some(notice) = deadline.fallback_notice() {
        lines.push(Line::styled(format!("⚠ {notice}"), Style::default().fg(Color::Yellow)));
        lines.push(Line::default());
    }

    if app.state.countdown.is_passed() {
        lines.push(Line::styled(
            "Gameweek deadline has passed",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::from("Team data will refresh soon"));
        return lines;
    }

    let remaining = app.state.countdown.remaining();
    let bold = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    lines.push(Line::styled(resolved.title(), Style::default().add_modifier(Modifier::BOLD)));
    lines.push(Line::default());
    lines.push(Line::styled(
        [remaining.days, remaining.hours, remaining.minutes, remaining.seconds]
            .map(format_time_unit)
            .join(" : "),
        bold,
    ));
    lines.push(Line::from("Days  Hours  Mins  Secs"));
    lines.push(Line::default());
    lines.push(Line::from(format_utc(resolved.deadline)));
    lines
}

fn status_lines(app: &App, now: DateTime<Utc>) -> Vec<Line<'static>> {
    let scheduler = &app.state.auto_refresh;
    let refresh = match (scheduler.is_enabled(), scheduler.next_refresh()) {
        (false, _) => "auto-refresh off".to_string(),
        (true, Some(at)) if at > now => format!("auto-refresh at {}", at.format("%H:%M UTC")),
        (true, _) => "auto-refresh on".to_string(),
    };
    let updated = match app.state.deadline.last_updated {
        Some(at) => format!("updated {}", at.format("%H:%M:%S")),
        None => "not updated yet".to_string(),
    };
    vec![Line::from(format!("{refresh}  |  {updated}")), Line::from(KEY_HINTS)]
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .output_target(false)
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logs, area);
}

pub fn format_time_unit(unit: u64) -> String {
    format!("{unit:02}")
}

/// RFC 1123 style, e.g. "Fri, 17 Oct 2026 17:30:00 GMT".
pub fn format_utc(deadline: DateTime<Utc>) -> String {
    deadline.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
