use super::ui;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use crudgrid::store::CollectionTransport;
use crudgrid::table::{
    ActionOutcome, ConfirmDecision, ConfirmPrompt, DeleteOutcome, EditableTable, NotificationLevel,
    SaveOutcome, TableAction, TableStatus,
};
use crudgrid::GridError;
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::time::{Duration, Instant};
use std::{error::Error, io};
use tui_textarea::TextArea;

/// How often the loop wakes up without input, to expire prompts and toasts.
const TICK: Duration = Duration::from_millis(200);

/// Cell editor opened with Enter.
pub struct CellEditor<'a> {
    pub row: usize,
    pub field: String,
    pub textarea: TextArea<'a>,
}

/// Delete prompt waiting for y/n.
pub struct PendingDelete {
    pub prompt: ConfirmPrompt,
    pub deadline: Instant,
}

pub struct App<'a, T: CollectionTransport> {
    pub table: EditableTable<T>,
    pub selected_row: usize,
    pub selected_col: usize,
    pub editor: Option<CellEditor<'a>>,
    pub pending_delete: Option<PendingDelete>,
    pub confirm_timeout: Duration,
    pub exit: bool,
}

impl<'a, T: CollectionTransport> App<'a, T> {
    pub fn new(table: EditableTable<T>, confirm_timeout: Duration) -> Self {
        Self {
            table,
            selected_row: 0,
            selected_col: 0,
            editor: None,
            pending_delete: None,
            confirm_timeout,
            exit: false,
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn Error>> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        if let Err(err) = res {
            println!("{:?}", err);
        }

        Ok(())
    }

    async fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, self))?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key).await;
                    }
                }
            }

            self.expire_prompt().await;
            if self.exit {
                return Ok(());
            }
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if self.pending_delete.is_some() {
            let decision = match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => ConfirmDecision::Confirm,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => ConfirmDecision::Cancel,
                _ => return,
            };
            self.resolve_delete(decision).await;
            return;
        }

        if self.editor.is_some() {
            self.handle_editor_key(key).await;
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.exit = true,
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.apply(TableAction::Save).await;
            }
            KeyCode::Char('r') => {
                self.apply(TableAction::Reload).await;
            }
            KeyCode::Char('a') => {
                self.apply(TableAction::AppendRow).await;
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if !self.table.is_empty() {
                    self.apply(TableAction::RequestDelete {
                        row: self.selected_row,
                    })
                    .await;
                }
            }
            KeyCode::Enter => self.open_editor(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_row = self.selected_row.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_row + 1 < self.table.len() {
                    self.selected_row += 1;
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_col = self.selected_col.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                if self.selected_col + 1 < self.table.config().fields().len() {
                    self.selected_col += 1;
                }
            }
            _ => {}
        }
    }

    async fn handle_editor_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.editor = None,
            KeyCode::Enter => {
                if let Some(editor) = self.editor.take() {
                    let value = editor.textarea.lines().join("");
                    self.apply(TableAction::EditField {
                        row: editor.row,
                        field: editor.field,
                        value,
                    })
                    .await;
                }
            }
            _ => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.textarea.input(key);
                }
            }
        }
    }

    fn open_editor(&mut self) {
        if self.table.status() != &TableStatus::Ready || self.table.is_empty() {
            return;
        }
        let Some(field) = self.table.config().fields().get(self.selected_col) else {
            return;
        };
        let current = self
            .table
            .view()
            .rows
            .get(self.selected_row)
            .and_then(|row| row.value(&field.name))
            .map(|v| v.to_string())
            .unwrap_or_default();

        let mut textarea = TextArea::new(vec![current]);
        textarea.move_cursor(tui_textarea::CursorMove::End);
        textarea.set_block(
            ratatui::widgets::Block::default()
                .borders(ratatui::widgets::Borders::ALL)
                .title(format!(" {} (Enter to apply, Esc to cancel) ", field.label)),
        );
        self.editor = Some(CellEditor {
            row: self.selected_row,
            field: field.name.clone(),
            textarea,
        });
    }

    async fn expire_prompt(&mut self) {
        let expired = self
            .pending_delete
            .as_ref()
            .is_some_and(|pending| Instant::now() >= pending.deadline);
        if expired {
            self.resolve_delete(ConfirmDecision::Expired).await;
        }
    }

    async fn resolve_delete(&mut self, decision: ConfirmDecision) {
        if let Some(pending) = self.pending_delete.take() {
            self.apply(TableAction::ResolveDelete {
                prompt: pending.prompt,
                decision,
            })
            .await;
        }
    }

    async fn apply(&mut self, action: TableAction) {
        // Save and delete failures are reported by the table itself.
        let self_reported = matches!(
            action,
            TableAction::Save | TableAction::ResolveDelete { .. }
        );

        match self.table.dispatch(action).await {
            Ok(outcome) => self.on_outcome(outcome),
            Err(err) if self_reported => self.on_self_reported(&err),
            Err(err) => self
                .table
                .notifications()
                .push(NotificationLevel::Error, err.to_string()),
        }
        self.clamp_selection();
    }

    fn on_outcome(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Appended(index) => self.selected_row = index,
            ActionOutcome::DeletePending(prompt) => {
                self.pending_delete = Some(PendingDelete {
                    prompt,
                    deadline: Instant::now() + self.confirm_timeout,
                });
            }
            ActionOutcome::Deleted(DeleteOutcome::Removed { .. }) => {
                self.table
                    .notifications()
                    .push(NotificationLevel::Success, "Row deleted");
            }
            ActionOutcome::Deleted(DeleteOutcome::Expired) => {
                self.table
                    .notifications()
                    .push(NotificationLevel::Info, "Delete prompt expired");
            }
            ActionOutcome::Reloaded(count) => {
                self.table
                    .notifications()
                    .push(NotificationLevel::Info, format!("Loaded {} row(s)", count));
            }
            ActionOutcome::Saved(SaveOutcome::NothingToSave)
            | ActionOutcome::Saved(SaveOutcome::Saved { .. })
            | ActionOutcome::Deleted(DeleteOutcome::Cancelled)
            | ActionOutcome::Edited => {}
        }
    }

    fn on_self_reported(&mut self, err: &GridError) {
        match err {
            // Jump to the offending row so its revealed errors are on screen.
            GridError::Validation { row, .. } => self.selected_row = *row,
            // Failed writes already carry a "Save failed"/"Delete failed" notice.
            GridError::Transport(_) | GridError::Rejected { .. } | GridError::Decode(_) => {}
            other => self
                .table
                .notifications()
                .push(NotificationLevel::Error, other.to_string()),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.table.len();
        if len == 0 {
            self.selected_row = 0;
        } else if self.selected_row >= len {
            self.selected_row = len - 1;
        }
    }
}
