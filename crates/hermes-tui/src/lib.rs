// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use hermes_app::{
    Application, ApplicationId, ApplicationRepository, ApplicationView, ApplicationsPresenter,
    BadgeCategory, DISMISS_LABEL, EditMode, EditorAction, EditorMode, FieldSelector, GridCell,
    GridPage, GridSchema, Location, ModalNotifications, NotificationPresenter, PageRequest,
    ViewError, ViewEvent, ViewEffect, fetch_page, state_field,
};
use log::{debug, info};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::collections::BTreeSet;
use std::io;
use std::time::Duration;

// Header, status bar, table borders and the table's header row.
const CHROME_ROWS: u16 = 9;
const DEFAULT_VIEWPORT_ROWS: usize = 20;
const DETAILS_ROWS: u16 = 4;
const EXPANDED_MARK: &str = "▾";
const COLLAPSED_MARK: &str = "▸";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuiOptions {
    /// Upper bound on rows pulled in one fetch.
    pub page_size: usize,
    pub initial_location: Location,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            initial_location: Location::List,
        }
    }
}

#[derive(Debug, Clone)]
struct ViewData {
    schema: GridSchema,
    page: GridPage,
    page_size: usize,
    viewport_rows: usize,
    selected_row: usize,
    expanded: BTreeSet<ApplicationId>,
    selector: Option<FieldSelector>,
    prompt: Option<String>,
    not_found: Option<String>,
    help_visible: bool,
    status: Option<String>,
}

impl ViewData {
    fn new(schema: GridSchema, page_size: usize) -> Self {
        Self {
            schema,
            page: GridPage::default(),
            page_size: page_size.max(1),
            viewport_rows: DEFAULT_VIEWPORT_ROWS,
            selected_row: 0,
            expanded: BTreeSet::new(),
            selector: None,
            prompt: None,
            not_found: None,
            help_visible: false,
            status: None,
        }
    }

    fn rows_per_page(&self) -> usize {
        self.viewport_rows.min(self.page_size).max(1)
    }

    fn page_shows(&self, row: usize) -> bool {
        row >= self.page.offset && row < self.page.offset + self.page.rows.len()
    }

    fn selected_application(&self) -> Option<&Application> {
        self.page.row(self.selected_row)
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }
}

pub fn run_app<R: ApplicationRepository>(
    view: &mut ApplicationView,
    presenter: &mut ApplicationsPresenter<R>,
    notifications: &mut ModalNotifications,
    schema: GridSchema,
    options: &TuiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(schema, options.page_size);
    let result = terminal
        .size()
        .context("read terminal size")
        .and_then(|size| {
            view_data.viewport_rows = viewport_rows_for_height(size.height);
            open_initial_location(
                view,
                presenter,
                notifications,
                &mut view_data,
                &options.initial_location,
            )
        })
        .and_then(|()| {
            event_loop(
                &mut terminal,
                view,
                presenter,
                notifications,
                &mut view_data,
            )
        });

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<R: ApplicationRepository>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    view: &mut ApplicationView,
    presenter: &mut ApplicationsPresenter<R>,
    notifications: &mut ModalNotifications,
    view_data: &mut ViewData,
) -> Result<()> {
    loop {
        terminal
            .draw(|frame| render(frame, view, notifications, view_data))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(250)).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) => {
                if handle_key_event(view, presenter, notifications, view_data, key)? {
                    return Ok(());
                }
            }
            Event::Resize(_, height) => {
                let rows = viewport_rows_for_height(height);
                if rows != view_data.viewport_rows {
                    view_data.viewport_rows = rows;
                    refresh_page(presenter, view_data)?;
                }
            }
            _ => {}
        }
    }
}

fn viewport_rows_for_height(height: u16) -> usize {
    usize::from(height.saturating_sub(CHROME_ROWS).max(1))
}

fn open_initial_location<R: ApplicationRepository>(
    view: &mut ApplicationView,
    presenter: &mut ApplicationsPresenter<R>,
    notifications: &mut ModalNotifications,
    view_data: &mut ViewData,
    location: &Location,
) -> Result<()> {
    refresh_page(presenter, view_data)?;
    if *location != Location::List {
        info!("opening {location}");
        dispatch(
            view,
            presenter,
            notifications,
            view_data,
            ViewEvent::LocationChanged(location.clone()),
        )?;
    }
    Ok(())
}

/// Pulls the page holding the cursor. Every call asks the store again.
fn refresh_page<R: ApplicationRepository>(
    presenter: &mut ApplicationsPresenter<R>,
    view_data: &mut ViewData,
) -> Result<()> {
    let rows = view_data.rows_per_page();
    let mut page = fetch_page(
        presenter,
        PageRequest::containing(view_data.selected_row, rows)?,
    )?;
    if page.total == 0 {
        view_data.selected_row = 0;
    } else if view_data.selected_row >= page.total {
        view_data.selected_row = page.total - 1;
        page = fetch_page(
            presenter,
            PageRequest::containing(view_data.selected_row, rows)?,
        )?;
    }
    view_data.page = page;
    if let Some(failure) = presenter.take_last_failure() {
        view_data.set_status(failure);
    }
    Ok(())
}

fn move_selection<R: ApplicationRepository>(
    presenter: &mut ApplicationsPresenter<R>,
    view_data: &mut ViewData,
    target: usize,
) -> Result<()> {
    let total = view_data.page.total;
    if total == 0 {
        return Ok(());
    }
    view_data.selected_row = target.min(total - 1);
    if !view_data.page_shows(view_data.selected_row) {
        refresh_page(presenter, view_data)?;
    }
    Ok(())
}

fn dispatch<R: ApplicationRepository>(
    view: &mut ApplicationView,
    presenter: &mut ApplicationsPresenter<R>,
    notifications: &mut ModalNotifications,
    view_data: &mut ViewData,
    event: ViewEvent,
) -> Result<()> {
    let outcome = view.handle(presenter, event);
    let failure = presenter.take_last_failure();
    if let Some(reason) = &failure {
        view_data.set_status(reason.clone());
    }

    let effects = match outcome {
        Ok(effects) => effects,
        Err(ViewError::NotFound(id)) => {
            let path = Location::Application(id).path();
            debug!("nothing to show at {path}");
            view_data.not_found = Some(path);
            return Ok(());
        }
        Err(ViewError::Internal(error)) => {
            return Err(error.context("application view cannot continue"));
        }
    };

    for effect in effects {
        apply_effect(
            view,
            presenter,
            notifications,
            view_data,
            effect,
            failure.as_deref(),
        )?;
    }
    Ok(())
}

fn apply_effect<R: ApplicationRepository>(
    view: &ApplicationView,
    presenter: &mut ApplicationsPresenter<R>,
    notifications: &mut ModalNotifications,
    view_data: &mut ViewData,
    effect: ViewEffect,
    failure: Option<&str>,
) -> Result<()> {
    match effect {
        ViewEffect::Navigated(location) => {
            debug!("location is now {location}");
            if location == Location::List {
                view_data.not_found = None;
            }
        }
        ViewEffect::EditorOpened { id, mode } => {
            view_data.not_found = None;
            view_data.selector = view.editor().map(|editor| {
                let field = view_data
                    .schema
                    .fields()
                    .first()
                    .copied()
                    .unwrap_or_else(state_field);
                FieldSelector::bind(field, editor.draft())
            });
            if let Some(position) = view_data.page.rows.iter().position(|item| item.id == id) {
                view_data.selected_row = view_data.page.offset + position;
            }
            if mode == EditMode::NewItem {
                view_data.set_status("new application draft");
            }
        }
        ViewEffect::EditorClosed => {
            view_data.selector = None;
        }
        ViewEffect::FieldChanged(state) => {
            debug!("draft state set to {}", state.display_name());
        }
        ViewEffect::Saved(id) => {
            view_data.set_status(format!("saved application {id}"));
        }
        ViewEffect::SaveCancelled(id) => {
            let message = match failure {
                Some(reason) => format!("Application {id} was not saved: {reason}."),
                None => format!(
                    "Application {id} was not saved; the store rejected the change. Your edits are still open."
                ),
            };
            notifications.show(&message);
        }
        ViewEffect::RefreshGrid => refresh_page(presenter, view_data)?,
        ViewEffect::ActionRejected(action) => {
            view_data.set_status(format!("{} is not available here", action.label()));
        }
    }
    Ok(())
}

fn handle_key_event<R: ApplicationRepository>(
    view: &mut ApplicationView,
    presenter: &mut ApplicationsPresenter<R>,
    notifications: &mut ModalNotifications,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> Result<bool> {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    if notifications.is_blocking() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            notifications.dismiss();
        }
        return Ok(false);
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return Ok(false);
    }

    if view_data.prompt.is_some() {
        handle_prompt_key(view, presenter, notifications, view_data, key)?;
        return Ok(false);
    }

    if view_data.not_found.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                view_data.not_found = None;
                dispatch(
                    view,
                    presenter,
                    notifications,
                    view_data,
                    ViewEvent::LocationChanged(Location::List),
                )?;
            }
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char(':') => view_data.prompt = Some(String::new()),
            _ => {}
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Char(':') => {
            view_data.prompt = Some(String::new());
            return Ok(false);
        }
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            return Ok(false);
        }
        KeyCode::Char('d') => {
            dispatch(
                view,
                presenter,
                notifications,
                view_data,
                ViewEvent::DeleteRequested,
            )?;
            return Ok(false);
        }
        KeyCode::Char('n') => {
            dispatch(
                view,
                presenter,
                notifications,
                view_data,
                ViewEvent::NewRequested,
            )?;
            return Ok(false);
        }
        _ => {}
    }

    if view.mode().is_open() {
        handle_editor_key(view, presenter, notifications, view_data, key)?;
        return Ok(false);
    }

    handle_grid_key(view, presenter, notifications, view_data, key)
}

fn handle_editor_key<R: ApplicationRepository>(
    view: &mut ApplicationView,
    presenter: &mut ApplicationsPresenter<R>,
    notifications: &mut ModalNotifications,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> Result<()> {
    let event = match key.code {
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('k') | KeyCode::Up => {
            cycle_selector(view_data, -1)
        }
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Char('j') | KeyCode::Down => {
            cycle_selector(view_data, 1)
        }
        KeyCode::Enter | KeyCode::Char('s') => Some(ViewEvent::SaveRequested),
        KeyCode::Esc => Some(ViewEvent::CancelRequested),
        _ => None,
    };
    match event {
        Some(event) => dispatch(view, presenter, notifications, view_data, event),
        None => Ok(()),
    }
}

fn cycle_selector(view_data: &mut ViewData, delta: isize) -> Option<ViewEvent> {
    view_data
        .selector
        .as_mut()
        .map(|selector| ViewEvent::StateChosen(selector.cycle(delta)))
}

fn handle_grid_key<R: ApplicationRepository>(
    view: &mut ApplicationView,
    presenter: &mut ApplicationsPresenter<R>,
    notifications: &mut ModalNotifications,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> Result<bool> {
    let rows = view_data.rows_per_page();
    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Char('j') | KeyCode::Down => {
            move_selection(presenter, view_data, view_data.selected_row.saturating_add(1))?;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            move_selection(presenter, view_data, view_data.selected_row.saturating_sub(1))?;
        }
        KeyCode::PageDown => {
            move_selection(presenter, view_data, view_data.selected_row.saturating_add(rows))?;
        }
        KeyCode::PageUp => {
            move_selection(presenter, view_data, view_data.selected_row.saturating_sub(rows))?;
        }
        KeyCode::Char('g') | KeyCode::Home => move_selection(presenter, view_data, 0)?,
        KeyCode::Char('G') | KeyCode::End => move_selection(presenter, view_data, usize::MAX)?,
        KeyCode::Enter | KeyCode::Char('e') => {
            if let Some(item) = view_data.selected_application().cloned() {
                dispatch(
                    view,
                    presenter,
                    notifications,
                    view_data,
                    ViewEvent::RowSelected(item),
                )?;
            }
        }
        KeyCode::Char(' ') => {
            if let Some(id) = view_data.selected_application().map(|item| item.id.clone())
                && !view_data.expanded.remove(&id)
            {
                view_data.expanded.insert(id);
            }
        }
        KeyCode::Esc => {
            dispatch(
                view,
                presenter,
                notifications,
                view_data,
                ViewEvent::CancelRequested,
            )?;
        }
        _ => {}
    }
    Ok(false)
}

fn handle_prompt_key<R: ApplicationRepository>(
    view: &mut ApplicationView,
    presenter: &mut ApplicationsPresenter<R>,
    notifications: &mut ModalNotifications,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> Result<()> {
    let Some(input) = view_data.prompt.as_mut() else {
        return Ok(());
    };
    match key.code {
        KeyCode::Esc => view_data.prompt = None,
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char(ch) => input.push(ch),
        KeyCode::Enter => {
            let path = input.trim().to_owned();
            view_data.prompt = None;
            match Location::parse(&path) {
                Ok(location) => {
                    view_data.not_found = None;
                    dispatch(
                        view,
                        presenter,
                        notifications,
                        view_data,
                        ViewEvent::LocationChanged(location),
                    )?;
                }
                Err(error) => {
                    debug!("{error}");
                    view_data.not_found = Some(path);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn render(
    frame: &mut ratatui::Frame<'_>,
    view: &ApplicationView,
    notifications: &ModalNotifications,
    view_data: &ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(view, view_data))
        .block(Block::default().title("hermes").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let body = if view.mode().is_open() {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
            .split(layout[1]);
        let title = view.editor_title().unwrap_or_default();
        let aside = Paragraph::new(editor_panel_text(view, view_data))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(aside, split[1]);
        split[0]
    } else {
        layout[1]
    };
    render_grid(frame, body, view_data);

    let status = Paragraph::new(status_text(view, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let Some(path) = &view_data.not_found {
        let area = centered_rect(56, 30, frame.area());
        frame.render_widget(Clear, area);
        let panel = Paragraph::new(not_found_text(path))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("not found")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(panel, area);
    }

    if let Some(input) = &view_data.prompt {
        let area = centered_rect(60, 16, frame.area());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(format!(":{input}"))
            .block(Block::default().title("go to").borders(Borders::ALL));
        frame.render_widget(prompt, area);
    }

    if view_data.help_visible {
        let area = centered_rect(72, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }

    if let Some(notification) = notifications.current() {
        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);
        let dialog = Paragraph::new(format!(
            "{}\n\n[ {DISMISS_LABEL} ]",
            notification.message
        ))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("notice")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(dialog, area);
    }
}

fn render_grid(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let selected_details = view_data
        .selected_application()
        .filter(|item| view_data.expanded.contains(&item.id));
    let (table_area, details_area) = match selected_details {
        Some(_) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(DETAILS_ROWS)])
                .split(area);
            (split[0], Some(split[1]))
        }
        None => (area, None),
    };

    let headers = view_data.schema.headers();
    let widths = vec![Constraint::Min(8); headers.len().max(1)];
    let header = Row::new(headers.into_iter().map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = view_data.page.rows.iter().enumerate().map(|(index, item)| {
        let selected = view_data.page.offset + index == view_data.selected_row;
        let expanded = view_data.expanded.contains(&item.id);
        let cells = view_data
            .schema
            .row(item)
            .into_iter()
            .enumerate()
            .map(|(column, cell)| {
                let mut text = cell.text().to_owned();
                if column == 0 {
                    let mark = if expanded {
                        EXPANDED_MARK
                    } else {
                        COLLAPSED_MARK
                    };
                    text = format!("{mark} {text}");
                }
                let mut style = match &cell {
                    GridCell::Badge(badge) => badge_style(badge.category),
                    GridCell::Text(_) => Style::default(),
                };
                if selected {
                    style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                }
                Cell::from(text).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(grid_title(&view_data.page))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, table_area);

    if let (Some(item), Some(details_area)) = (selected_details, details_area) {
        let panel = view_data.schema.details(item);
        let details = Paragraph::new(panel.text)
            .wrap(Wrap { trim: true })
            .block(Block::default().title(panel.label).borders(Borders::ALL));
        frame.render_widget(details, details_area);
    }
}

fn badge_style(category: BadgeCategory) -> Style {
    let color = match category {
        BadgeCategory::Success => Color::Green,
        BadgeCategory::Error => Color::Red,
        BadgeCategory::Neutral => Color::Gray,
    };
    Style::default().fg(color)
}

fn grid_title(page: &GridPage) -> String {
    if page.rows.is_empty() {
        return format!("applications ({})", page.total);
    }
    format!(
        "applications {}-{} of {}",
        page.offset + 1,
        page.offset + page.rows.len(),
        page.total
    )
}

fn header_text(view: &ApplicationView, view_data: &ViewData) -> String {
    let location = view_data
        .not_found
        .clone()
        .unwrap_or_else(|| view.location().path());
    format!("{location}  |  {} applications", view_data.page.total)
}

fn editor_panel_text(view: &ApplicationView, view_data: &ViewData) -> String {
    let Some(editor) = view.editor() else {
        return String::new();
    };
    let draft = editor.draft();
    let schema = &view_data.schema;

    let mut lines = Vec::new();
    for (header, cell) in schema.headers().into_iter().zip(schema.row(draft)) {
        lines.push(format!("{header}: {}", cell.text()));
    }
    let details = schema.details(draft);
    lines.push(format!("{} {}", details.label, details.text));
    lines.push(String::new());

    if let Some(selector) = &view_data.selector {
        lines.push(format!("{}:", selector.label()));
        let selected = selector.selected().display_name();
        for label in selector.choice_labels() {
            let marker = if label == selected { ">" } else { " " };
            lines.push(format!(" {marker} {label}"));
        }
    }
    if editor.is_dirty() {
        lines.push(String::new());
        lines.push("unsaved changes".to_owned());
    }
    lines.join("\n")
}

fn not_found_text(path: &str) -> String {
    format!("Nothing found at {path}.\n\nesc: back to the list | : go to another location")
}

fn status_text(view: &ApplicationView, view_data: &ViewData) -> String {
    let mode = match view.mode() {
        EditorMode::Browsing => "BROWSE",
        EditorMode::EditingExisting(_) => "EDIT",
        EditorMode::EditingNew(_) => "NEW",
    };
    let mut hints = if view.mode().is_open() {
        "h/l state | enter/s save | esc cancel".to_owned()
    } else {
        "j/k pgup/pgdn g/G | enter open | space details".to_owned()
    };
    if view.is_enabled(EditorAction::New) {
        hints.push_str(" | n new");
    }
    hints.push_str(" | : go to | ? help | q quit");
    match &view_data.status {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | : go to location | ? help\n\
grid: j/k or up/down move | pgup/pgdn page | g/G first/last | enter/e open | space details | q quit\n\
editor: h/l or left/right change state | enter/s save | esc cancel\n\
location: /applications or /applications/<id> | enter go | esc close\n\
notice: enter/esc dismiss"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        ViewData, editor_panel_text, grid_title, handle_key_event, help_overlay_text,
        open_initial_location, refresh_page, status_text, viewport_rows_for_height,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use hermes_app::{
        ApplicationState, ApplicationView, ApplicationsPresenter, BadgeTable, EditorMode,
        GridSchema, Location, ModalNotifications, ViewConfig,
    };
    use hermes_testkit::{FakeRepository, sample_application, sample_id};

    struct Harness {
        view: ApplicationView,
        presenter: ApplicationsPresenter<FakeRepository>,
        notifications: ModalNotifications,
        view_data: ViewData,
    }

    impl Harness {
        fn new(repository: FakeRepository) -> Self {
            Self::with_config(repository, ViewConfig::default())
        }

        fn with_config(repository: FakeRepository, config: ViewConfig) -> Self {
            let schema = GridSchema::standard(BadgeTable::standard().expect("badges"))
                .expect("schema");
            let mut view_data = ViewData::new(schema, 100);
            view_data.viewport_rows = 5;
            let mut presenter = ApplicationsPresenter::new(repository);
            refresh_page(&mut presenter, &mut view_data).expect("initial page");
            Self {
                view: ApplicationView::new(config),
                presenter,
                notifications: ModalNotifications::new(),
                view_data,
            }
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            handle_key_event(
                &mut self.view,
                &mut self.presenter,
                &mut self.notifications,
                &mut self.view_data,
                KeyEvent::new(code, modifiers),
            )
            .expect("key handled")
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn go_to(&mut self, path: &str) {
            self.press(KeyCode::Char(':'));
            self.type_text(path);
            self.press(KeyCode::Enter);
        }
    }

    fn single_record() -> FakeRepository {
        FakeRepository::new(vec![sample_application(
            "APP-0001",
            ApplicationState::Submitted,
        )])
    }

    #[test]
    fn ctrl_q_quits_even_with_notice_open() {
        let mut harness = Harness::new(single_record());
        hermes_app::NotificationPresenter::show(&mut harness.notifications, "hello");
        assert!(harness.press_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
    }

    #[test]
    fn q_quits_from_grid_only() {
        let mut harness = Harness::new(single_record());
        harness.press(KeyCode::Enter);
        assert!(!harness.press(KeyCode::Char('q')));
        harness.press(KeyCode::Esc);
        assert!(harness.press(KeyCode::Char('q')));
    }

    #[test]
    fn enter_opens_selected_row_without_fetching_it() {
        let mut harness = Harness::new(FakeRepository::seeded(4, 8));
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Enter);

        let expected = harness.presenter.repository().records()[2].id.clone();
        assert_eq!(
            harness.view.location(),
            &Location::Application(expected.clone())
        );
        assert_eq!(
            harness.view.editor().map(|editor| editor.id().clone()),
            Some(expected)
        );
        assert!(harness.view_data.selector.is_some());
        assert_eq!(harness.presenter.repository().calls.find_by_id, 0);
    }

    #[test]
    fn cycling_state_and_saving_persists_and_refreshes_grid() {
        let mut harness = Harness::new(single_record());
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('l'));
        let counts_before = harness.presenter.repository().calls.count;
        harness.press(KeyCode::Char('s'));

        assert_eq!(harness.view.mode(), &EditorMode::Browsing);
        assert_eq!(harness.view.location(), &Location::List);
        assert!(harness.view_data.selector.is_none());
        assert_eq!(
            harness
                .presenter
                .repository()
                .record(&sample_id(1))
                .map(|item| item.state),
            Some(ApplicationState::Approved)
        );
        assert_eq!(
            harness.presenter.repository().calls.count,
            counts_before + 1
        );
        assert_eq!(
            harness.view_data.page.rows[0].state,
            ApplicationState::Approved
        );
    }

    #[test]
    fn rejected_save_shows_blocking_notice_and_keeps_edits() {
        let mut repository = single_record();
        repository.reject_updates = true;
        let mut harness = Harness::new(repository);
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('h'));
        harness.press(KeyCode::Enter);

        assert!(harness.notifications.is_blocking());
        let message = harness
            .notifications
            .current()
            .map(|notice| notice.message.clone())
            .unwrap_or_default();
        assert!(message.contains("APP-0001"), "{message}");
        assert_eq!(
            harness.view.editor().map(|editor| editor.draft().state),
            Some(ApplicationState::ResubmissionRequired)
        );

        // Keys other than dismiss are swallowed while the notice is up.
        harness.press(KeyCode::Esc);
        assert!(!harness.notifications.is_blocking());
        assert!(harness.view.mode().is_open());
        harness.press(KeyCode::Esc);
        assert_eq!(harness.view.mode(), &EditorMode::Browsing);
    }

    #[test]
    fn escape_cancels_editor_and_clears_location() {
        let mut harness = Harness::new(single_record());
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Esc);

        assert_eq!(harness.view.mode(), &EditorMode::Browsing);
        assert_eq!(harness.view.location(), &Location::List);
        assert_eq!(harness.presenter.repository().calls.update, 0);
    }

    #[test]
    fn delete_and_new_are_rejected_with_status() {
        let mut harness = Harness::new(single_record());
        harness.press(KeyCode::Char('d'));
        assert!(
            harness
                .view_data
                .status
                .as_deref()
                .is_some_and(|status| status.contains("delete"))
        );
        harness.press(KeyCode::Char('n'));
        assert!(
            harness
                .view_data
                .status
                .as_deref()
                .is_some_and(|status| status.contains("new"))
        );
        assert_eq!(harness.presenter.repository().records().len(), 1);
        assert!(!harness.view.mode().is_open());
    }

    #[test]
    fn new_key_opens_draft_when_enabled() {
        let mut harness = Harness::with_config(
            single_record(),
            ViewConfig {
                allow_new: true,
                actor: "clerk".to_owned(),
            },
        );
        harness.press(KeyCode::Char('n'));
        assert!(matches!(harness.view.mode(), EditorMode::EditingNew(_)));
        harness.press(KeyCode::Enter);
        assert_eq!(harness.presenter.repository().records().len(), 2);
        assert_eq!(harness.view_data.page.total, 2);
    }

    #[test]
    fn new_key_while_editing_keeps_dirty_draft() {
        let mut harness = Harness::with_config(
            single_record(),
            ViewConfig {
                allow_new: true,
                actor: "clerk".to_owned(),
            },
        );
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Char('n'));

        assert!(matches!(harness.view.mode(), EditorMode::EditingExisting(_)));
        assert_eq!(
            harness.view.editor().map(|editor| editor.draft().state),
            Some(ApplicationState::Approved)
        );
        assert!(
            harness
                .view_data
                .status
                .as_deref()
                .is_some_and(|status| status.contains("new"))
        );
        assert!(!status_text(&harness.view, &harness.view_data).contains("n new"));
    }

    #[test]
    fn location_prompt_opens_record_by_id() {
        let mut harness = Harness::new(FakeRepository::seeded(2, 6));
        harness.go_to("/applications/APP-0005");
        assert_eq!(
            harness.view.editor().map(|editor| editor.id().clone()),
            Some(sample_id(5))
        );
        assert_eq!(harness.presenter.repository().calls.find_by_id, 1);

        harness.go_to("/applications/APP-0005");
        assert_eq!(harness.presenter.repository().calls.find_by_id, 1);
    }

    #[test]
    fn unknown_record_and_unknown_path_show_not_found_panel() {
        let mut harness = Harness::new(single_record());
        harness.go_to("/applications/APP-0404");
        assert_eq!(
            harness.view_data.not_found.as_deref(),
            Some("/applications/APP-0404")
        );
        assert!(!harness.view.mode().is_open());

        harness.press(KeyCode::Esc);
        assert!(harness.view_data.not_found.is_none());
        assert_eq!(harness.view.location(), &Location::List);

        harness.go_to("/settings");
        assert_eq!(harness.view_data.not_found.as_deref(), Some("/settings"));
    }

    #[test]
    fn initial_location_binds_editor_before_first_frame() {
        let mut harness = Harness::new(FakeRepository::seeded(3, 4));
        open_initial_location(
            &mut harness.view,
            &mut harness.presenter,
            &mut harness.notifications,
            &mut harness.view_data,
            &Location::Application(sample_id(3)),
        )
        .expect("open");
        assert_eq!(harness.view.location(), &Location::Application(sample_id(3)));
        assert!(harness.view.mode().is_open());
    }

    #[test]
    fn corrupt_store_aborts_the_session() {
        let mut harness = Harness::new(single_record());
        harness.presenter.repository_mut().corrupt =
            Some("illegal application state \"archived\"".to_owned());
        harness.press(KeyCode::Char(':'));
        harness.type_text("/applications/APP-0001");
        let outcome = handle_key_event(
            &mut harness.view,
            &mut harness.presenter,
            &mut harness.notifications,
            &mut harness.view_data,
            KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE),
        );
        let error = outcome.expect_err("fatal");
        assert!(format!("{error:#}").contains("archived"));
    }

    #[test]
    fn scrolling_past_visible_rows_fetches_next_page() {
        let mut harness = Harness::new(FakeRepository::seeded(8, 12));
        assert_eq!(harness.view_data.page.rows.len(), 5);
        let fetches = harness.presenter.repository().calls.find_all;

        for _ in 0..4 {
            harness.press(KeyCode::Char('j'));
        }
        assert_eq!(harness.presenter.repository().calls.find_all, fetches);

        harness.press(KeyCode::Char('j'));
        assert_eq!(harness.presenter.repository().calls.find_all, fetches + 1);
        assert_eq!(harness.view_data.page.offset, 5);

        harness.press(KeyCode::Char('G'));
        assert_eq!(harness.view_data.selected_row, 11);
        assert_eq!(harness.view_data.page.offset, 10);
        assert_eq!(harness.view_data.page.rows.len(), 2);

        harness.press(KeyCode::Char('g'));
        assert_eq!(harness.view_data.selected_row, 0);
        assert_eq!(harness.view_data.page.offset, 0);
    }

    #[test]
    fn space_toggles_details_for_selected_row() {
        let mut harness = Harness::new(single_record());
        harness.press(KeyCode::Char(' '));
        assert!(harness.view_data.expanded.contains(&sample_id(1)));
        harness.press(KeyCode::Char(' '));
        assert!(harness.view_data.expanded.is_empty());
    }

    #[test]
    fn unavailable_store_reports_status_and_empty_grid() {
        let mut repository = single_record();
        repository.unavailable = true;
        let harness = Harness::new(repository);
        assert_eq!(harness.view_data.page.total, 0);
        assert!(
            harness
                .view_data
                .status
                .as_deref()
                .is_some_and(|status| status.contains("connection refused"))
        );
    }

    #[test]
    fn editor_panel_lists_fields_and_state_choices() {
        let mut harness = Harness::new(single_record());
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('l'));
        let text = editor_panel_text(&harness.view, &harness.view_data);
        assert!(text.contains("Id: APP-0001"));
        assert!(text.contains("Details: Passport renewal"));
        assert!(text.contains("> Approved"));
        assert!(text.contains("  Submitted"));
        assert!(text.contains("unsaved changes"));
        assert_eq!(
            harness.view.editor_title().as_deref(),
            Some("Edit Application")
        );
    }

    #[test]
    fn status_text_follows_editor_mode() {
        let mut harness = Harness::new(single_record());
        let browsing = status_text(&harness.view, &harness.view_data);
        assert!(browsing.starts_with("BROWSE"));
        assert!(!browsing.contains("n new"));
        assert!(!browsing.contains("delete"));

        harness.press(KeyCode::Enter);
        let editing = status_text(&harness.view, &harness.view_data);
        assert!(editing.starts_with("EDIT"));
        assert!(editing.contains("esc cancel"));
    }

    #[test]
    fn help_and_layout_helpers() {
        assert!(help_overlay_text().contains("ctrl+q quit"));
        assert_eq!(viewport_rows_for_height(4), 1);
        assert_eq!(viewport_rows_for_height(30), 21);
        let harness = Harness::new(FakeRepository::seeded(1, 7));
        assert_eq!(grid_title(&harness.view_data.page), "applications 1-5 of 7");
    }
}
