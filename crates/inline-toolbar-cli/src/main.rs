use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use inline_toolbar_config::Config;
use inline_toolbar_core::{
    Activation, Cmd, DocumentEngine, EmbedBinder, EmbedType, InsertOutcome, LineContent, LineId,
    MemoryDocument, RowLayout, Selection, ToolbarController, ToolbarState, TriggerCallback,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use serde_json::json;
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

const GUTTER_WIDTH: u16 = 4;
const WELCOME: &str = "Type on a line, or move to an empty line to get the [+] anchor.\n";

struct App {
    controller: ToolbarController<MemoryDocument, RowLayout>,
    binder: EmbedBinder,
    /// Caret to restore when the surface regains focus
    caret: usize,
    status: String,
    document_state: ListState,
}

/// Demo embed types. Keys with a trigger collect data before inserting.
fn embed_type(key: &str) -> EmbedType {
    match key {
        "image" => EmbedType::with_trigger(key, |done: TriggerCallback| {
            done.resolve(Some(json!({"url": "placeholder.png"})))
        }),
        "card" => EmbedType::with_trigger(key, |done: TriggerCallback| {
            done.resolve(Some(json!({"title": "Untitled card"})))
        }),
        _ => EmbedType::new(key),
    }
}

impl App {
    fn new(config: Config) -> Self {
        let mut document = MemoryDocument::from_text(WELCOME);
        for key in &config.embed_types {
            document.register_embed_type(embed_type(key));
        }

        let controller =
            ToolbarController::new(document, RowLayout::new(1.0)).with_policy(config.toolbar);
        let binder = EmbedBinder::for_controller(&controller);

        let mut app = Self {
            controller,
            binder,
            caret: 0,
            status: String::new(),
            document_state: ListState::default(),
        };
        app.controller
            .engine_mut()
            .set_selection(Some(Selection::caret(0)));
        app.sync();
        app
    }

    /// Feed resolved triggers and queued engine events to the toolbar
    fn sync(&mut self) {
        for result in self.binder.pump(&mut self.controller) {
            match result {
                Ok(outcome) => self.report(outcome),
                Err(e) => self.status = format!("Insert failed: {e}"),
            }
        }

        let ids: Vec<LineId> = self.controller.engine().line_ids().collect();
        self.controller.layout_mut().refresh(ids);

        while let Some(event) = self.controller.engine_mut().take_event() {
            self.controller.handle_event(&event);
        }

        if let Some(selection) = self.controller.engine().selection() {
            self.caret = selection.start();
        }
    }

    fn report(&mut self, outcome: InsertOutcome) {
        self.status = match outcome {
            InsertOutcome::Inserted {
                index,
                appended_line: true,
            } => format!("Inserted at {index}, added a line after it"),
            InsertOutcome::Inserted { index, .. } => format!("Inserted at {index}"),
            InsertOutcome::Skipped(reason) => format!("Nothing inserted: {reason:?}"),
        };
    }

    /// Give the document its caret back after the picker blurred it
    fn focus(&mut self) {
        let engine = self.controller.engine_mut();
        if engine.selection().is_none() {
            let caret = self.caret.min(engine.len().saturating_sub(1));
            engine.set_selection(Some(Selection::caret(caret)));
        }
    }

    fn edit(&mut self, cmd: Cmd) {
        self.focus();
        if let Err(e) = self.controller.engine_mut().apply(cmd) {
            self.status = format!("Edit failed: {e}");
        }
    }

    fn type_char(&mut self, ch: char) {
        self.edit(Cmd::InsertText {
            at: self.caret,
            text: ch.to_string(),
        });
    }

    fn move_caret(&mut self, caret: usize) {
        let engine = self.controller.engine_mut();
        let caret = caret.min(engine.len().saturating_sub(1));
        engine.set_selection(Some(Selection::caret(caret)));
    }

    fn caret_left(&mut self) {
        self.focus();
        self.move_caret(self.caret.saturating_sub(1));
    }

    fn caret_right(&mut self) {
        self.focus();
        self.move_caret(self.caret + 1);
    }

    fn caret_up(&mut self) {
        self.focus();
        let engine = self.controller.engine();
        if let Some(line) = engine.line_at(self.caret)
            && line.start > 0
            && let Some(previous) = engine.line_at(line.start - 1)
        {
            self.move_caret(previous.start);
        }
    }

    fn caret_down(&mut self) {
        self.focus();
        if let Some(line) = self.controller.engine().line_at(self.caret) {
            let next = line.start + line.length;
            if next < self.controller.engine().len() {
                self.move_caret(next);
            }
        }
    }

    fn expand(&mut self) {
        if self.controller.expand() {
            self.status = "Pick an embed with 1-9, Esc to cancel".to_string();
        }
    }

    fn activate(&mut self, slot: usize) {
        if !matches!(self.controller.state(), ToolbarState::ExpandedPicker { .. }) {
            return;
        }
        let Some(key) = self.binder.buttons().nth(slot).map(|b| b.key.clone()) else {
            return;
        };
        match self.binder.activate(&key, &mut self.controller) {
            Ok(Activation::Inserted(outcome)) => self.report(outcome),
            Ok(Activation::Pending) => self.status = format!("Collecting data for {key}..."),
            Err(e) => self.status = format!("Insert failed: {e}"),
        }
    }

    fn cancel(&mut self) {
        if matches!(self.controller.state(), ToolbarState::ExpandedPicker { .. }) {
            self.controller.close();
            self.focus();
            self.status.clear();
        }
    }

    /// Row and column of the caret within the document
    fn caret_position(&self) -> Option<(usize, usize)> {
        let engine = self.controller.engine();
        let selection = engine.selection()?;
        let line = engine.line_at(selection.start())?;
        let row = engine.lines().iter().position(|l| l.id == line.id)?;
        Some((row, selection.start() - line.start))
    }
}

fn main() -> Result<()> {
    if env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env().init();
    }

    // Config path from CLI args, or the default location
    let args: Vec<String> = env::args().collect();
    let config_path = match args.len() {
        1 => Config::config_path(),
        2 => PathBuf::from(&args[1]),
        _ => {
            eprintln!("Usage: {} [config-file]", args[0]);
            process::exit(1);
        }
    };

    let config = match Config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Usage: {} [config-file]", args[0]);
            process::exit(1);
        }
    };
    log::info!("Loaded toolbar config from {}", config_path.display());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if is_quit(&key) {
                return Ok(());
            }
            match key.code {
                KeyCode::Char(ch @ '1'..='9')
                    if matches!(app.controller.state(), ToolbarState::ExpandedPicker { .. }) =>
                {
                    app.activate(ch as usize - '1' as usize)
                }
                KeyCode::Char(ch) => app.type_char(ch),
                KeyCode::Enter => app.edit(Cmd::SplitLine { at: app.caret }),
                KeyCode::Backspace => app.edit(Cmd::DeleteBackward { at: app.caret }),
                KeyCode::Left => app.caret_left(),
                KeyCode::Right => app.caret_right(),
                KeyCode::Up => app.caret_up(),
                KeyCode::Down => app.caret_down(),
                KeyCode::Tab => app.expand(),
                KeyCode::Esc => app.cancel(),
                _ => {}
            }
            app.sync();
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
}

/// Document row for an anchor top, with one row per layout unit
fn anchor_row(top: f32) -> Option<usize> {
    let row = top.round();
    (row.is_finite() && row >= 0.0 && row <= u32::MAX as f32).then_some(row as usize)
}

/// Screen cell of a document row and column, `None` when the row is scrolled out of view
fn view_position(area: Rect, offset: usize, row: usize, col: usize) -> Option<(u16, u16)> {
    let row = u16::try_from(row.checked_sub(offset)?).ok()?;
    if row >= area.height {
        return None;
    }
    let col = u16::try_from(col).unwrap_or(u16::MAX);
    let x = area
        .x
        .saturating_add(GUTTER_WIDTH)
        .saturating_add(col)
        .min(area.right().saturating_sub(1));
    Some((x, area.y + row))
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let state = app.controller.state();
    let anchor = state.top().and_then(anchor_row);
    let caret = app.caret_position();

    let items: Vec<ListItem> = app
        .controller
        .engine()
        .lines()
        .iter()
        .enumerate()
        .map(|(row, line)| {
            let gutter = match (anchor == Some(row), state) {
                (true, ToolbarState::ExpandedPicker { .. }) => Span::styled(
                    "[-] ",
                    Style::default().fg(Color::Black).bg(Color::Yellow),
                ),
                (true, _) => Span::styled("[+] ", Style::default().fg(Color::Yellow)),
                (false, _) => Span::raw("    "),
            };
            let body = match &line.content {
                LineContent::Text(text) => Span::raw(text.clone()),
                LineContent::Embed { kind, data } => Span::styled(
                    format!("▣ {kind} {data}"),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            };
            ListItem::new(Line::from(vec![gutter, body]))
        })
        .collect();

    let document_block = Block::default().borders(Borders::ALL).title("Document");
    let inner = document_block.inner(chunks[0]);

    // Selecting the caret row (or the anchor while the picker has focus) scrolls it into view
    app.document_state.select(caret.map(|(row, _)| row).or(anchor));
    f.render_stateful_widget(
        List::new(items).block(document_block),
        chunks[0],
        &mut app.document_state,
    );
    let offset = app.document_state.offset();

    if let Some((row, col)) = caret
        && let Some(position) = view_position(inner, offset, row, col)
    {
        f.set_cursor_position(position);
    }

    if let ToolbarState::ExpandedPicker { .. } = state
        && let Some(row) = anchor
        && let Some((_, y)) = view_position(inner, offset, row, 0)
    {
        render_picker(f, app, inner, y);
    }

    let help = Line::from(vec![
        Span::raw("Ctrl-q: Quit | "),
        Span::raw("Tab: Open picker | "),
        Span::raw("1-9: Insert | "),
        Span::raw("Esc: Cancel"),
    ]);
    let status = Line::from(Span::styled(
        app.status.clone(),
        Style::default().fg(Color::Green),
    ));
    f.render_widget(Paragraph::new(vec![status, help]), chunks[1]);
}

/// Picker popup under the anchor row at screen line `anchor_y`
fn render_picker(f: &mut Frame, app: &App, area: Rect, anchor_y: u16) {
    let buttons: Vec<Span> = app
        .binder
        .buttons()
        .enumerate()
        .map(|(i, button)| Span::raw(format!(" {}:{} ", i + 1, button.label)))
        .collect();
    let width = buttons
        .iter()
        .map(|b| u16::try_from(b.width()).unwrap_or(u16::MAX))
        .fold(2u16, u16::saturating_add);

    let y = anchor_y
        .saturating_add(1)
        .min(area.bottom().saturating_sub(3));
    let popup = Rect {
        x: area.x + GUTTER_WIDTH,
        y,
        width: width.min(area.width.saturating_sub(GUTTER_WIDTH)),
        height: 3,
    }
    .intersection(area);

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(Line::from(buttons))
            .block(Block::default().borders(Borders::ALL).title("Embed")),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    fn app_with_lines(count: usize) -> App {
        let mut app = App::new(Config::default());
        app.controller
            .engine_mut()
            .apply(Cmd::InsertText {
                at: 0,
                text: "line\n".repeat(count),
            })
            .unwrap();
        app.sync();
        app
    }

    #[test]
    fn test_view_position_hides_rows_outside_view() {
        let area = Rect::new(2, 2, 30, 5);

        assert_eq!(view_position(area, 10, 9, 0), None);
        assert_eq!(view_position(area, 10, 15, 0), None);
        assert_eq!(view_position(area, 10, 12, 3), Some((9, 4)));
    }

    #[test]
    fn test_view_position_does_not_wrap_large_rows_or_columns() {
        let area = Rect::new(2, 2, 30, 5);

        assert_eq!(view_position(area, 0, 70_000, 0), None);
        assert_eq!(view_position(area, 69_998, 70_000, 0), Some((6, 4)));
        assert_eq!(view_position(area, 0, 0, 100_000), Some((31, 2)));
    }

    #[test]
    fn test_anchor_row() {
        assert_eq!(anchor_row(3.0), Some(3));
        assert_eq!(anchor_row(-1.0), None);
        assert_eq!(anchor_row(f32::NAN), None);
    }

    #[test]
    fn test_caret_past_first_screen_stays_visible() {
        let mut app = app_with_lines(200);
        assert_eq!(app.caret_position(), Some((200, 0)));

        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();

        // Margin and border put the document rows at y = 2..7
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!(cursor.x, 2 + GUTTER_WIDTH);
        assert!((2..7).contains(&cursor.y), "cursor at {cursor:?}");
        assert!(app.document_state.offset() > 0);
    }
}
