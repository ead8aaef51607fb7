//! Ratatui rendering, grounded in `src/ui/view.rs`'s layout
//! style (`Layout`/`Constraint` split, bordered `Paragraph` panels) but
//! restructured to a header/conversation/input/footer/status-bar split
//! instead of that file's 4-panel tool-result grid.

use super::app::App;
use super::conversation::EntryRole;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

/// Renders one frame. `input_buffer` and `footer` are owned by the event
/// loop (not `App`) since they're pure presentation state.
pub fn render<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &App,
    input_buffer: &str,
    footer: Option<&str>,
) -> std::io::Result<()> {
    terminal.draw(|f| {
        let has_footer = footer.map(|s| !s.is_empty()).unwrap_or(false);
        let mut constraints = vec![Constraint::Length(1), Constraint::Min(0), Constraint::Length(3)];
        if has_footer {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1));

        let chunks = Layout::default().direction(Direction::Vertical).constraints(constraints).split(f.area());

        render_header(f, app, chunks[0]);
        render_conversation(f, app, chunks[1]);
        render_input(f, input_buffer, chunks[2]);

        let mut next = 3;
        if has_footer {
            render_footer(f, footer.unwrap_or_default(), chunks[next]);
            next += 1;
        }
        render_status_bar(f, app, chunks[next]);
    })?;
    Ok(())
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let text = format!(" codewright — {} ", app.mode().display_name());
    f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Cyan)), area);
}

fn render_conversation(f: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for entry in app.conversation.entries() {
        lines.push(render_entry_line(entry.role, &entry.content));
    }
    if let Some(streaming) = app.conversation.streaming() {
        lines.push(render_entry_line(streaming.role, &streaming.content));
    }

    let scroll = app.conversation.scroll_offset() as u16;
    let block = Block::default().borders(Borders::ALL).title(" Conversation ");
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false }).scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

fn render_entry_line(role: EntryRole, content: &str) -> Line<'static> {
    let (label, color) = match role {
        EntryRole::User => ("you", Color::Green),
        EntryRole::Assistant => ("assistant", Color::White),
        EntryRole::System => ("system", Color::Yellow),
    };
    Line::from(vec![
        Span::styled(format!("[{label}] "), Style::default().fg(color)),
        Span::raw(content.to_string()),
    ])
}

fn render_input(f: &mut Frame, input_buffer: &str, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Input ");
    f.render_widget(Paragraph::new(input_buffer.to_string()).block(block), area);
}

fn render_footer(f: &mut Frame, footer: &str, area: Rect) {
    f.render_widget(Paragraph::new(footer.to_string()).style(Style::default().fg(Color::Magenta)), area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut parts = vec![app.mode().display_name().to_string()];
    if app.is_awaiting_approval() {
        parts.push("AWAITING APPROVAL".to_string());
    }
    if !app.conversation.autoscroll_enabled() {
        parts.push("[SCROLLED UP \u{2191}]".to_string());
    }
    f.render_widget(
        Paragraph::new(parts.join(" | ")).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
