// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use facture_app::{
    CatalogEntry, CatalogStatus, InvoiceCommand, InvoiceSession, PriceSource, PrintState, RowField,
    RowId, SelectionOption, SelectionResolver, format_issue_date,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const PICKER_WINDOW: usize = 10;

/// Side effects the editor needs from its host.
pub trait InvoiceRuntime {
    /// Starts loading the catalog; the result arrives later as [`InternalEvent::Catalog`].
    fn spawn_catalog_load(&mut self, tx: Sender<InternalEvent>) -> Result<()>;
    /// Writes the printable invoice somewhere durable, if configured.
    fn export_print(&mut self, text: &str) -> Result<Option<PathBuf>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLoadEvent {
    Loaded(Vec<CatalogEntry>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Catalog(CatalogLoadEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableUiState {
    selected_row: usize,
    selected_field: RowField,
}

impl Default for TableUiState {
    fn default() -> Self {
        Self {
            selected_row: 0,
            selected_field: RowField::Description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CellEditorUiState {
    row: RowId,
    field: RowField,
    original: String,
    original_source: PriceSource,
    buffer: String,
}

impl CellEditorUiState {
    /// Puts the cell back the way it was when editing started.
    fn restore_command(self) -> Option<InvoiceCommand> {
        match self.field {
            RowField::UnitPrice => Some(InvoiceCommand::RestoreUnitPrice {
                row: self.row,
                text: self.original,
                source: self.original_source,
            }),
            field => edit_command(self.row, field, self.original),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct PickerUiState {
    visible: bool,
    row: Option<RowId>,
    query: String,
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct PrintPreviewUiState {
    visible: bool,
    text: String,
    exported_to: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    table: TableUiState,
    editor: Option<CellEditorUiState>,
    picker: PickerUiState,
    print_preview: PrintPreviewUiState,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: InvoiceRuntime>(session: &mut InvoiceSession, runtime: &mut R) -> Result<()> {
    let (internal_tx, internal_rx) = mpsc::channel();
    let mut view_data = ViewData::default();
    if let Err(error) = runtime.spawn_catalog_load(internal_tx.clone()) {
        tracing::warn!(%error, "catalog load could not start");
        session.on_catalog_failed(&error.to_string());
    }

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut result = Ok(());
    loop {
        process_internal_events(session, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, session, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(session, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    session: &mut InvoiceSession,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                session.clear_status();
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Catalog(CatalogLoadEvent::Loaded(entries)) => {
                session.on_catalog_loaded(entries);
                bump_status_token(view_data, tx);
            }
            InternalEvent::Catalog(CatalogLoadEvent::Failed(message)) => {
                // The failure message stays on screen; it is the only trace of the missing catalog.
                session.on_catalog_failed(&message);
                view_data.status_token = view_data.status_token.saturating_add(1);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn bump_status_token(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn emit_status(
    session: &mut InvoiceSession,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    session.set_status(&message.into());
    bump_status_token(view_data, internal_tx);
}

fn dispatch_or_report(
    session: &mut InvoiceSession,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: InvoiceCommand,
) {
    if let Err(error) = session.dispatch(command) {
        emit_status(session, view_data, internal_tx, format!("{error:#}"));
    }
}

fn handle_key_event<R: InvoiceRuntime>(
    session: &mut InvoiceSession,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.print_preview.visible {
        close_print_preview(session, view_data, internal_tx);
        return false;
    }

    if view_data.picker.visible {
        handle_picker_key(session, view_data, internal_tx, key);
        return false;
    }

    if view_data.editor.is_some() {
        handle_editor_key(session, view_data, internal_tx, key);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('j') | KeyCode::Down, _) => move_row(session, view_data, 1),
        (KeyCode::Char('k') | KeyCode::Up, _) => move_row(session, view_data, -1),
        (KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab, _) => move_field(view_data, 1),
        (KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab, _) => move_field(view_data, -1),
        (KeyCode::Char('g'), KeyModifiers::NONE) => view_data.table.selected_row = 0,
        (KeyCode::Char('G'), _) => {
            view_data.table.selected_row = session.rows.len().saturating_sub(1);
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => add_row_and_select(session, view_data),
        (KeyCode::Char('d'), KeyModifiers::NONE) => delete_selected_row(session, view_data, internal_tx),
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            if let Some(row) = selected_row_id(session, view_data) {
                dispatch_or_report(
                    session,
                    view_data,
                    internal_tx,
                    InvoiceCommand::ClearDescription(row),
                );
            }
        }
        (KeyCode::Char('e') | KeyCode::Enter, _) => open_field_editor(session, view_data),
        (KeyCode::Char('p'), KeyModifiers::NONE) => open_print_preview(session, runtime, view_data, internal_tx),
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        _ => {}
    }
    false
}

fn selected_row_id(session: &InvoiceSession, view_data: &ViewData) -> Option<RowId> {
    session
        .rows
        .rows()
        .get(view_data.table.selected_row)
        .map(|row| row.id)
}

fn clamp_selection(session: &InvoiceSession, view_data: &mut ViewData) {
    let last = session.rows.len().saturating_sub(1);
    view_data.table.selected_row = view_data.table.selected_row.min(last);
}

fn move_row(session: &InvoiceSession, view_data: &mut ViewData, delta: isize) {
    if session.rows.is_empty() {
        view_data.table.selected_row = 0;
        return;
    }
    let last = session.rows.len() - 1;
    let next = view_data.table.selected_row.saturating_add_signed(delta);
    view_data.table.selected_row = next.min(last);
}

fn move_field(view_data: &mut ViewData, delta: isize) {
    let fields = RowField::ALL;
    let current = fields
        .iter()
        .position(|field| *field == view_data.table.selected_field)
        .unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(fields.len() as isize) as usize;
    view_data.table.selected_field = fields[next];
}

fn add_row_and_select(session: &mut InvoiceSession, view_data: &mut ViewData) {
    session.add_row();
    view_data.table.selected_row = session.rows.len().saturating_sub(1);
    view_data.table.selected_field = RowField::Description;
}

fn delete_selected_row(
    session: &mut InvoiceSession,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(row) = selected_row_id(session, view_data) else {
        emit_status(session, view_data, internal_tx, "no row to delete -- press a to add one");
        return;
    };
    dispatch_or_report(session, view_data, internal_tx, InvoiceCommand::DeleteRow(row));
    clamp_selection(session, view_data);
}

fn open_field_editor(session: &InvoiceSession, view_data: &mut ViewData) {
    let Some(row) = session.rows.rows().get(view_data.table.selected_row) else {
        return;
    };

    match view_data.table.selected_field {
        RowField::Description => {
            view_data.picker = PickerUiState {
                visible: true,
                row: Some(row.id),
                query: String::new(),
                cursor: 0,
            };
        }
        field => {
            let text = row.field_text(field).to_owned();
            view_data.editor = Some(CellEditorUiState {
                row: row.id,
                field,
                original: text.clone(),
                original_source: row.price_source,
                buffer: text,
            });
        }
    }
}

fn edit_command(row: RowId, field: RowField, text: String) -> Option<InvoiceCommand> {
    match field {
        RowField::Quantity => Some(InvoiceCommand::SetQuantity { row, text }),
        RowField::UnitPrice => Some(InvoiceCommand::SetUnitPrice { row, text }),
        RowField::Description => None,
    }
}

/// Every keystroke is applied immediately so totals follow the typing.
fn handle_editor_key(
    session: &mut InvoiceSession,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(mut editor) = view_data.editor.take() else {
        return;
    };

    match key.code {
        KeyCode::Esc => {
            if let Some(command) = editor.restore_command() {
                dispatch_or_report(session, view_data, internal_tx, command);
            }
            return;
        }
        KeyCode::Enter => {
            add_row_and_select(session, view_data);
            return;
        }
        KeyCode::Tab => {
            move_field(view_data, 1);
            return;
        }
        KeyCode::Backspace => {
            editor.buffer.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            editor.buffer.push(ch);
        }
        _ => {
            view_data.editor = Some(editor);
            return;
        }
    }

    if let Some(command) = edit_command(editor.row, editor.field, editor.buffer.clone()) {
        dispatch_or_report(session, view_data, internal_tx, command);
    }
    view_data.editor = Some(editor);
}

fn picker_options(session: &InvoiceSession, picker: &PickerUiState) -> Vec<SelectionOption> {
    SelectionResolver::new(&session.catalog).options(&picker.query)
}

fn handle_picker_key(
    session: &mut InvoiceSession,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(row) = view_data.picker.row else {
        view_data.picker = PickerUiState::default();
        return;
    };

    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => view_data.picker = PickerUiState::default(),
        (KeyCode::Down, _) | (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
            let count = picker_options(session, &view_data.picker).len();
            if count > 0 {
                view_data.picker.cursor = (view_data.picker.cursor + 1).min(count - 1);
            }
        }
        (KeyCode::Up, _) | (KeyCode::Char('p'), KeyModifiers::CONTROL) => {
            view_data.picker.cursor = view_data.picker.cursor.saturating_sub(1);
        }
        (KeyCode::Char('x'), KeyModifiers::CONTROL) => {
            view_data.picker = PickerUiState::default();
            dispatch_or_report(
                session,
                view_data,
                internal_tx,
                InvoiceCommand::ClearDescription(row),
            );
        }
        (KeyCode::Enter, _) => {
            let options = picker_options(session, &view_data.picker);
            let Some(choice) = options.get(view_data.picker.cursor) else {
                emit_status(
                    session,
                    view_data,
                    internal_tx,
                    "type a product name to add it",
                );
                return;
            };
            let text = choice.description().to_owned();
            view_data.picker = PickerUiState::default();
            dispatch_or_report(
                session,
                view_data,
                internal_tx,
                InvoiceCommand::SelectDescription { row, text },
            );
            view_data.table.selected_field = RowField::Quantity;
        }
        (KeyCode::Backspace, _) => {
            view_data.picker.query.pop();
            view_data.picker.cursor = 0;
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.picker.query.push(ch);
            view_data.picker.cursor = 0;
        }
        _ => {}
    }
}

fn open_print_preview<R: InvoiceRuntime>(
    session: &mut InvoiceSession,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    session.prepare_for_print();
    let text = session.print_text();
    let exported_to = match runtime.export_print(&text) {
        Ok(path) => path,
        Err(error) => {
            tracing::warn!(%error, "print export failed");
            emit_status(
                session,
                view_data,
                internal_tx,
                format!("print export failed: {error:#}; check [print].output_dir"),
            );
            None
        }
    };
    view_data.print_preview = PrintPreviewUiState {
        visible: true,
        text,
        exported_to,
    };
}

fn close_print_preview(
    session: &mut InvoiceSession,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let exported_to = view_data.print_preview.exported_to.take();
    view_data.print_preview = PrintPreviewUiState::default();
    session.restore_after_print();
    if let Some(path) = exported_to {
        emit_status(
            session,
            view_data,
            internal_tx,
            format!("invoice written to {}", path.display()),
        );
    }
}

fn render(frame: &mut ratatui::Frame<'_>, session: &InvoiceSession, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(session))
        .block(Block::default().title("facture").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    render_table(frame, layout[1], session, view_data);

    let footer = Paragraph::new(footer_text(session, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, layout[2]);

    if view_data.picker.visible {
        let area = centered_rect(60, 55, frame.area());
        frame.render_widget(Clear, area);
        let picker = Paragraph::new(render_picker_overlay_text(session, &view_data.picker))
            .block(Block::default().title("product").borders(Borders::ALL));
        frame.render_widget(picker, area);
    }

    if view_data.print_preview.visible {
        let area = centered_rect(85, 80, frame.area());
        frame.render_widget(Clear, area);
        let preview = Paragraph::new(render_print_overlay_text(&view_data.print_preview)).block(
            Block::default()
                .title("print")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(preview, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn catalog_label(session: &InvoiceSession) -> String {
    match session.catalog.status() {
        CatalogStatus::Pending => "catalog: loading...".to_owned(),
        CatalogStatus::Ready => format!("catalog: {} products", session.catalog.len()),
        CatalogStatus::Failed(_) => "catalog: unavailable".to_owned(),
    }
}

fn header_text(session: &InvoiceSession) -> String {
    format!(
        "date {} | {} rows | {}",
        format_issue_date(session.issue_date),
        session.rows.len(),
        catalog_label(session)
    )
}

fn footer_text(session: &InvoiceSession, view_data: &ViewData) -> String {
    let total = format!("TOTAL {}", session.grand_total());
    let hint = if view_data.editor.is_some() {
        "editing: enter new row | tab next | esc undo"
    } else {
        "a add | d delete | e edit | p print | ? help | ctrl+q quit"
    };
    match &session.status_line {
        Some(status) => format!("{total}    {status}"),
        None => format!("{total}    {hint}"),
    }
}

fn cell_text(session: &InvoiceSession, view_data: &ViewData, row_index: usize, field: RowField) -> String {
    let Some(row) = session.rows.rows().get(row_index) else {
        return String::new();
    };
    if let Some(editor) = &view_data.editor
        && editor.row == row.id
        && editor.field == field
    {
        return format!("{}_", editor.buffer);
    }
    match field {
        RowField::Description => row
            .description
            .clone()
            .unwrap_or_else(|| "-- select --".to_owned()),
        _ => row.field_text(field).to_owned(),
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    session: &InvoiceSession,
    view_data: &ViewData,
) {
    let labels = [
        "#",
        RowField::Description.label(),
        RowField::Quantity.label(),
        RowField::UnitPrice.label(),
        "subtotal",
    ];
    let header = Row::new(labels.map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = session.rows.rows().iter().enumerate().map(|(index, row)| {
        let selected_row = index == view_data.table.selected_row;
        let ordinal = if row.is_visible() {
            row.ordinal.to_string()
        } else {
            "-".to_owned()
        };

        let mut cells = vec![Cell::from(ordinal)];
        for field in RowField::ALL {
            let mut style = Style::default();
            if !row.is_visible() {
                style = style.fg(Color::DarkGray);
            } else if field == RowField::Description && row.description.is_none() {
                style = style.fg(Color::Gray);
            }
            if selected_row {
                style = style.bg(Color::DarkGray);
            }
            if selected_row && field == view_data.table.selected_field {
                style = Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD);
            }
            cells.push(Cell::from(cell_text(session, view_data, index, field)).style(style));
        }
        cells.push(Cell::from(row.subtotal.to_string()));
        Row::new(cells)
    });

    let widths = [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(12),
    ];
    let title = if session.print_state == PrintState::Printing {
        "line items (print)"
    } else {
        "line items"
    };
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_picker_overlay_text(session: &InvoiceSession, picker: &PickerUiState) -> String {
    let mut lines = vec![format!("search: {}_", picker.query), String::new()];

    if let CatalogStatus::Failed(message) = session.catalog.status() {
        lines.push(format!("catalog unavailable ({message})"));
        lines.push(String::new());
    }

    let options = picker_options(session, picker);
    if options.is_empty() {
        lines.push("(type a product name)".to_owned());
    } else {
        let start = picker.cursor.saturating_sub(PICKER_WINDOW / 2);
        let end = (start + PICKER_WINDOW).min(options.len());
        for (index, option) in options.iter().enumerate().take(end).skip(start) {
            let prefix = if index == picker.cursor { "> " } else { "  " };
            let label = match option {
                SelectionOption::Existing { description, price } => {
                    format!("{description}  {}", price.round_to_cents())
                }
                SelectionOption::Create { description } => format!("+ add new: {description}"),
            };
            lines.push(format!("{prefix}{label}"));
        }
    }

    lines.push(String::new());
    lines.push("type search | up/down pick | enter choose | ctrl+x clear | esc cancel".to_owned());
    lines.join("\n")
}

fn render_print_overlay_text(preview: &PrintPreviewUiState) -> String {
    let mut text = preview.text.clone();
    text.push('\n');
    if let Some(path) = &preview.exported_to {
        text.push_str(&format!("saved to {}\n", path.display()));
    }
    text.push_str("press any key to close");
    text
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
rows: j/k up/down | h/l field | g/G first/last | a add | d delete\n\
edit: e or enter edit field | x clear product | p print preview\n\
qty/price: type to change | enter add row | tab next field | esc undo\n\
product: type search | up/down pick | enter choose or add new | ctrl+x clear | esc cancel\n\
print: any key close"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
