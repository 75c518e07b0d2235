use super::app::App;
use chrono::Utc;
use crudgrid::store::CollectionTransport;
use crudgrid::table::{NotificationLevel, RowState, TableStatus};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

const STATE_WIDTH: u16 = 3;

pub fn draw<T: CollectionTransport>(f: &mut Frame, app: &mut App<'_, T>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(3),    // Grid
                Constraint::Length(4), // Errors of the selected row
                Constraint::Length(5), // Notifications
                Constraint::Length(1), // Key help
            ]
            .as_ref(),
        )
        .split(f.area());

    match app.table.status().clone() {
        TableStatus::Ready => draw_grid(f, app, chunks[0]),
        TableStatus::LoadFailed(message) => draw_load_failure(f, app, &message, chunks[0]),
    }
    draw_row_errors(f, app, chunks[1]);
    draw_notifications(f, app, chunks[2]);

    let help = Paragraph::new(
        " ←↑↓→ move  Enter edit  a append  d delete  Ctrl+S save  r reload  q quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[3]);

    if let Some(editor) = &app.editor {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);
        f.render_widget(&editor.textarea, area);
    }

    if let Some(pending) = &app.pending_delete {
        let remaining = pending
            .deadline
            .saturating_duration_since(std::time::Instant::now())
            .as_secs()
            + 1;
        let area = centered_rect(50, 5, f.area());
        f.render_widget(Clear, area);
        let prompt = Paragraph::new(vec![
            Line::from(pending.prompt.message.as_str()),
            Line::from(Span::styled(
                format!("[y] delete   [n] keep   ({}s)", remaining),
                Style::default().fg(Color::Yellow),
            )),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Confirm ")
                .border_style(Style::default().fg(Color::Red)),
        );
        f.render_widget(prompt, area);
    }
}

fn draw_grid<T: CollectionTransport>(f: &mut Frame, app: &App<'_, T>, area: Rect) {
    let view = app.table.view();
    let fields = view.config.fields();

    let header = Row::new(
        std::iter::once(Cell::from(" "))
            .chain(fields.iter().map(|field| Cell::from(field.label.as_str()))),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = view.rows.iter().enumerate().map(|(index, row)| {
        let marker = match row.state {
            RowState::Unpersisted => Cell::from("+").style(Style::default().fg(Color::Green)),
            RowState::PersistedDirty => Cell::from("*").style(Style::default().fg(Color::Yellow)),
            RowState::PersistedClean => Cell::from(" "),
        };
        let cells = fields.iter().enumerate().map(|(col, field)| {
            let text = row.value(&field.name).map(|v| v.to_string()).unwrap_or_default();
            let mut style = Style::default();
            if row.visible_error(&field.name).is_some() {
                style = style.fg(Color::Red).add_modifier(Modifier::UNDERLINED);
            }
            if index == app.selected_row && col == app.selected_col {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Cell::from(text).style(style)
        });
        Row::new(std::iter::once(marker).chain(cells))
    });

    let widths = std::iter::once(Constraint::Length(STATE_WIDTH))
        .chain(fields.iter().map(|_| Constraint::Fill(1)))
        .collect::<Vec<_>>();

    let title = format!(
        " {} ({} rows, {} unsaved) ",
        view.config.name(),
        view.rows.len(),
        view.dirty_count()
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = TableState::default();
    if !view.rows.is_empty() {
        state.select(Some(app.selected_row));
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_load_failure<T: CollectionTransport>(
    f: &mut Frame,
    app: &App<'_, T>,
    message: &str,
    area: Rect,
) {
    let panel = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Could not load {}", app.table.config().name()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from("Press r to retry."),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(" Error "));
    f.render_widget(panel, area);
}

fn draw_row_errors<T: CollectionTransport>(f: &mut Frame, app: &App<'_, T>, area: Rect) {
    let view = app.table.view();
    let lines = view
        .rows
        .get(app.selected_row)
        .map(|row| {
            row.visible_errors()
                .into_iter()
                .map(|(field, message)| {
                    let label = view
                        .config
                        .field(field)
                        .map(|spec| spec.label.as_str())
                        .unwrap_or(field);
                    Line::from(Span::styled(
                        format!("{}: {}", label, message),
                        Style::default().fg(Color::Red),
                    ))
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Row "));
    f.render_widget(panel, area);
}

fn draw_notifications<T: CollectionTransport>(f: &mut Frame, app: &mut App<'_, T>, area: Rect) {
    let capacity = area.height.saturating_sub(2) as usize;
    let active = app.table.notifications().active(Utc::now());
    let skip = active.len().saturating_sub(capacity);

    let lines = active
        .iter()
        .skip(skip)
        .map(|note| {
            let color = match note.level {
                NotificationLevel::Info => Color::Cyan,
                NotificationLevel::Success => Color::Green,
                NotificationLevel::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    note.created_at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(note.message.clone(), Style::default().fg(color)),
            ])
        })
        .collect::<Vec<_>>();

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Messages "));
    f.render_widget(panel, area);
}

fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect::new(
        r.x + (r.width - width) / 2,
        r.y + (r.height - height) / 2,
        width,
        height,
    )
}
