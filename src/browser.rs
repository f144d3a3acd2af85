use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table, TableState},
    DefaultTerminal, Frame,
};

use crate::api::BillingApi;
use crate::directory::{filter_clients, ClientDirectory, ClientFilter};
use crate::error::Result;
use crate::fmt::{money, payment_date};
use crate::ledger::{derive_matrix, submit_reconciliation, MonthEdit};
use crate::models::Client;
use crate::month::{parse_month_list, Month};
use crate::paginate::Paginator;
use crate::reports::client_year;
use crate::tui::{
    self, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE,
};

enum View {
    Roster,
    Ledger { client_id: String, selected: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EditField {
    Amount,
    Message,
}

enum Mode {
    Normal,
    Search,
    Months(String),
    ConfirmDelete(String),
    Edit { edit: MonthEdit, field: EditField },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StatusKind {
    Info,
    Error,
}

struct StatusLine {
    kind: StatusKind,
    text: String,
}

impl StatusLine {
    fn info(text: impl Into<String>) -> Option<Self> {
        Some(Self {
            kind: StatusKind::Info,
            text: text.into(),
        })
    }

    fn error(text: impl Into<String>) -> Option<Self> {
        Some(Self {
            kind: StatusKind::Error,
            text: text.into(),
        })
    }
}

#[derive(Debug, PartialEq)]
pub enum BrowseAction {
    Continue,
    Close,
    Submit,
    Delete(String),
    Reload,
}

pub struct ClientBrowser {
    directory: ClientDirectory,
    filter: ClientFilter,
    paginator: Paginator,
    symbol: String,
    selected: usize,
    view: View,
    mode: Mode,
    status: Option<StatusLine>,
    table_state: TableState,
}

impl ClientBrowser {
    pub fn new(directory: ClientDirectory, year: i32, items_per_page: usize, symbol: &str) -> Self {
        Self {
            directory,
            filter: ClientFilter::for_year(year),
            paginator: Paginator::new(items_per_page),
            symbol: symbol.to_string(),
            selected: 0,
            view: View::Roster,
            mode: Mode::Normal,
            status: None,
            table_state: TableState::default(),
        }
    }

    pub fn run<A: BillingApi + ?Sized>(&mut self, api: &A) -> Result<()> {
        tui::install_panic_hook();
        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal, api);
        ratatui::restore();
        result
    }

    fn event_loop<A: BillingApi + ?Sized>(&mut self, terminal: &mut DefaultTerminal, api: &A) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw_frame(frame))?;

            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            {
                if kind != KeyEventKind::Press {
                    continue;
                }
                if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                    break;
                }
                match self.handle_key_event(code) {
                    BrowseAction::Close => break,
                    BrowseAction::Continue => {}
                    action => self.perform(action, api),
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    fn visible(&self) -> Vec<&Client> {
        filter_clients(self.directory.clients(), &self.filter)
    }

    fn page(&self) -> Vec<&Client> {
        let visible = self.visible();
        self.paginator.slice(&visible).to_vec()
    }

    fn selected_client(&self) -> Option<&Client> {
        match &self.view {
            View::Roster => self.page().get(self.selected).copied(),
            View::Ledger { client_id, .. } => self.directory.get(client_id),
        }
    }

    /// Keep the page and row cursor inside the current filtered list.
    fn clamp_cursor(&mut self) {
        let len = self.visible().len();
        self.paginator.snap(len);
        let page_len = self.paginator.range(len).len();
        self.selected = self.selected.min(page_len.saturating_sub(1));
    }

    fn filter_changed(&mut self) {
        self.paginator.reset();
        self.selected = 0;
        self.clamp_cursor();
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    pub fn handle_key_event(&mut self, code: KeyCode) -> BrowseAction {
        self.status = None;
        match &mut self.mode {
            Mode::Normal => self.handle_normal_key(code),
            Mode::Search => {
                match code {
                    KeyCode::Enter => self.mode = Mode::Normal,
                    KeyCode::Esc => {
                        self.filter.search.clear();
                        self.mode = Mode::Normal;
                        self.filter_changed();
                    }
                    KeyCode::Backspace => {
                        self.filter.search.pop();
                        self.filter_changed();
                    }
                    KeyCode::Char(c) => {
                        self.filter.search.push(c);
                        self.filter_changed();
                    }
                    _ => {}
                }
                BrowseAction::Continue
            }
            Mode::Months(input) => {
                match code {
                    KeyCode::Esc => self.mode = Mode::Normal,
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    KeyCode::Char(c) => input.push(c),
                    KeyCode::Enter => {
                        let raw = std::mem::take(input);
                        self.mode = Mode::Normal;
                        match parse_month_list(&raw) {
                            Ok(months) => {
                                self.filter.months = months;
                                self.filter_changed();
                            }
                            Err(e) => self.status = StatusLine::error(e.to_string()),
                        }
                    }
                    _ => {}
                }
                BrowseAction::Continue
            }
            Mode::ConfirmDelete(client_id) => {
                let client_id = std::mem::take(client_id);
                self.mode = Mode::Normal;
                if code == KeyCode::Char('y') || code == KeyCode::Char('Y') {
                    BrowseAction::Delete(client_id)
                } else {
                    self.status = StatusLine::info("Delete cancelled");
                    BrowseAction::Continue
                }
            }
            Mode::Edit { edit, field } => {
                let target = match field {
                    EditField::Amount => edit.amount.get_or_insert_with(String::new),
                    EditField::Message => &mut edit.message,
                };
                match code {
                    KeyCode::Esc => self.mode = Mode::Normal,
                    KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                        *field = match field {
                            EditField::Amount => EditField::Message,
                            EditField::Message => EditField::Amount,
                        };
                    }
                    KeyCode::Backspace => {
                        target.pop();
                    }
                    KeyCode::Char(c) => target.push(c),
                    KeyCode::Enter => return BrowseAction::Submit,
                    _ => {}
                }
                BrowseAction::Continue
            }
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> BrowseAction {
        match code {
            KeyCode::Char('[') => {
                self.filter.year -= 1;
                self.filter_changed();
                return BrowseAction::Continue;
            }
            KeyCode::Char(']') => {
                self.filter.year += 1;
                self.filter_changed();
                return BrowseAction::Continue;
            }
            KeyCode::Char('r') => return BrowseAction::Reload,
            _ => {}
        }

        match &mut self.view {
            View::Ledger { client_id, selected } => match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.view = View::Roster;
                    self.clamp_cursor();
                }
                KeyCode::Up => *selected = selected.saturating_sub(1),
                KeyCode::Down => *selected = (*selected + 1).min(11),
                KeyCode::Enter | KeyCode::Char('e') => {
                    let month = Month::ALL[*selected];
                    let existing = self
                        .directory
                        .get(client_id)
                        .map(|c| derive_matrix(c, self.filter.year)[*selected].clone());
                    let (amount, message) = existing
                        .map(|e| {
                            let amount = if e.amount > 0.0 { e.amount.to_string() } else { String::new() };
                            (amount, e.message)
                        })
                        .unwrap_or_default();
                    self.mode = Mode::Edit {
                        edit: MonthEdit {
                            month: month.name().to_string(),
                            amount: Some(amount),
                            message,
                            ..Default::default()
                        },
                        field: EditField::Amount,
                    };
                }
                _ => {}
            },
            View::Roster => {
                let len = self.visible().len();
                let page_len = self.paginator.range(len).len();
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => return BrowseAction::Close,
                    KeyCode::Down => {
                        if self.selected + 1 < page_len {
                            self.selected += 1;
                        }
                    }
                    KeyCode::Up => self.selected = self.selected.saturating_sub(1),
                    KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                        self.paginator.next(len);
                        self.selected = 0;
                    }
                    KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                        self.paginator.prev(len);
                        self.selected = 0;
                    }
                    KeyCode::Char('/') => self.mode = Mode::Search,
                    KeyCode::Char('f') => {
                        self.filter.status = self.filter.status.next();
                        self.filter_changed();
                    }
                    KeyCode::Char('m') => self.mode = Mode::Months(String::new()),
                    KeyCode::Char('d') => {
                        if let Some(id) = self.selected_client().map(|c| c.id.clone()) {
                            self.mode = Mode::ConfirmDelete(id);
                        }
                    }
                    KeyCode::Enter => {
                        if let Some(id) = self.selected_client().map(|c| c.id.clone()) {
                            self.view = View::Ledger {
                                client_id: id,
                                selected: 0,
                            };
                        }
                    }
                    _ => {}
                }
            }
        }
        BrowseAction::Continue
    }

    // -----------------------------------------------------------------------
    // Remote actions
    // -----------------------------------------------------------------------

    /// Run an action that needs the API. Errors land in the status line.
    pub fn perform<A: BillingApi + ?Sized>(&mut self, action: BrowseAction, api: &A) {
        match action {
            BrowseAction::Submit => {
                let (View::Ledger { client_id, .. }, Mode::Edit { edit, .. }) = (&self.view, &self.mode)
                else {
                    return;
                };
                let year = self.filter.year;
                let outcome = submit_reconciliation(api, &mut self.directory, client_id, year, edit, Utc::now());
                let month = edit.month.clone();
                match outcome {
                    Ok(saved) => {
                        self.mode = Mode::Normal;
                        self.status = match saved.reload_error {
                            None => StatusLine::info(format!("Saved {month} {year}")),
                            Some(e) => StatusLine::error(format!("Saved {month} {year} (reload failed: {e})")),
                        };
                        self.clamp_cursor();
                    }
                    Err(e) => self.status = StatusLine::error(format!("Save failed: {e}")),
                }
            }
            BrowseAction::Delete(client_id) => match self.directory.delete(api, &client_id) {
                Ok(()) => {
                    self.status = StatusLine::info("Client deleted");
                    self.clamp_cursor();
                }
                Err(e) => self.status = StatusLine::error(format!("Delete failed: {e}")),
            },
            BrowseAction::Reload => match self.directory.refresh(api) {
                Ok(()) => {
                    self.status = StatusLine::info(format!("Loaded {} clients", self.directory.len()));
                    self.clamp_cursor();
                }
                Err(e) => self.status = StatusLine::error(format!("Reload failed: {e}")),
            },
            BrowseAction::Continue | BrowseAction::Close => {}
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    pub fn draw_frame(&mut self, frame: &mut Frame) {
        let edit_height = if matches!(self.mode, Mode::Edit { .. }) { 2 } else { 0 };
        let areas = Layout::vertical([
            Constraint::Length(1),           // title
            Constraint::Fill(1),             // table
            Constraint::Length(edit_height), // edit panel
            Constraint::Length(1),           // status
            Constraint::Length(1),           // keys
        ])
        .split(frame.area());

        match &self.view {
            View::Roster => self.draw_roster(frame, areas[0], areas[1]),
            View::Ledger { client_id, selected } => {
                let (client_id, selected) = (client_id.clone(), *selected);
                self.draw_ledger(frame, areas[0], areas[1], &client_id, selected);
            }
        }

        if let Mode::Edit { edit, field } = &self.mode {
            let cursor = |f: EditField| if *field == f { "\u{2588}" } else { "" };
            let lines = vec![
                Line::from(format!(
                    "  {} amount: {}{}",
                    edit.month,
                    edit.amount.as_deref().unwrap_or(""),
                    cursor(EditField::Amount)
                )),
                Line::from(format!("  Note: {}{}", edit.message, cursor(EditField::Message))),
            ];
            frame.render_widget(Paragraph::new(lines), areas[2]);
        }

        let status = match &self.status {
            Some(line) => Paragraph::new(line.text.as_str()).style(match line.kind {
                StatusKind::Info => FOOTER_STYLE,
                StatusKind::Error => ERROR_STYLE,
            }),
            None => Paragraph::new(self.page_status()).style(FOOTER_STYLE),
        };
        frame.render_widget(status, areas[3]);

        let keys = match (&self.mode, &self.view) {
            (Mode::Normal, View::Roster) => Paragraph::new(
                "\u{2191}/\u{2193}:select  Enter:ledger  n/p:page  /:search  f:status  m:months  [/]:year  d:delete  r:reload  q:quit",
            )
            .style(FOOTER_STYLE),
            (Mode::Normal, View::Ledger { .. }) => {
                Paragraph::new("\u{2191}/\u{2193}:month  Enter:edit  [/]:year  r:reload  Esc:back").style(FOOTER_STYLE)
            }
            (Mode::Search, _) => Paragraph::new(format!("Search: {}\u{2588}", self.filter.search)),
            (Mode::Months(input), _) => {
                Paragraph::new(format!("Months (e.g. jan,mar; empty for all): {input}\u{2588}"))
            }
            (Mode::ConfirmDelete(_), _) => {
                Paragraph::new("Delete this client and all its payments? (y/N)").style(ERROR_STYLE)
            }
            (Mode::Edit { .. }, _) => {
                Paragraph::new("Tab:switch field  Enter:save  Esc:cancel").style(FOOTER_STYLE)
            }
        };
        frame.render_widget(keys, areas[4]);
    }

    fn page_status(&self) -> String {
        let len = self.visible().len();
        format!(
            "Page {} of {} | {} of {} clients | {}",
            self.paginator.current_page(),
            self.paginator.total_pages(len).max(1),
            len,
            self.directory.len(),
            self.filter.describe(),
        )
    }

    fn draw_roster(&mut self, frame: &mut Frame, title_area: Rect, table_area: Rect) {
        frame.render_widget(
            Paragraph::new(format!("Clients {}", self.filter.year)).style(HEADER_STYLE),
            title_area,
        );

        let year = self.filter.year;
        let symbol = self.symbol.clone();
        let rows: Vec<Row> = self
            .page()
            .into_iter()
            .map(|client| {
                let matrix = derive_matrix(client, year);
                let totals = client_year(client, year);
                let mut cells = vec![
                    Cell::from(client.name.clone()),
                    Cell::from(client.phone.clone().unwrap_or_default()),
                    Cell::from(money(client.fixed_amount, &symbol)),
                ];
                cells.extend(matrix.iter().map(|e| Cell::from(tui::paid_span(e.is_paid))));
                cells.push(Cell::from(money(totals.collected, &symbol)));
                Row::new(cells)
            })
            .collect();

        let mut widths = vec![Constraint::Fill(1), Constraint::Length(14), Constraint::Length(12)];
        widths.extend(std::iter::repeat(Constraint::Length(3)).take(12));
        widths.push(Constraint::Length(12));

        let mut header: Vec<&str> = vec!["Name", "Phone", "Fixed"];
        header.extend(Month::ALL.iter().map(|m| m.short()));
        header.push("Collected");

        self.table_state.select(Some(self.selected));
        let table = Table::new(rows, widths)
            .header(Row::new(header).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);
    }

    fn draw_ledger(&self, frame: &mut Frame, title_area: Rect, table_area: Rect, client_id: &str, selected: usize) {
        let year = self.filter.year;
        let Some(client) = self.directory.get(client_id) else {
            frame.render_widget(
                Paragraph::new("Client no longer exists. Press Esc to go back.").style(ERROR_STYLE),
                title_area,
            );
            return;
        };

        frame.render_widget(
            Paragraph::new(format!(
                "{} - {} - fixed {}",
                client.name,
                year,
                money(client.fixed_amount, &self.symbol)
            ))
            .style(HEADER_STYLE),
            title_area,
        );

        let rows: Vec<Row> = derive_matrix(client, year)
            .iter()
            .map(|e| {
                Row::new(vec![
                    Cell::from(e.month.name()),
                    Cell::from(money(e.amount, &self.symbol)),
                    Cell::from(tui::paid_span(e.is_paid)),
                    Cell::from(tui::balance_span(e.balance, &self.symbol)),
                    Cell::from(e.date.as_deref().map(payment_date).unwrap_or_default()),
                    Cell::from(e.message.clone()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(4),
            Constraint::Length(14),
            Constraint::Length(22),
            Constraint::Fill(1),
        ];
        let mut state = TableState::default().with_selected(Some(selected));
        let table = Table::new(rows, widths)
            .header(
                Row::new(vec!["Month", "Amount", "Paid", "Balance", "Date", "Note"])
                    .style(HEADER_STYLE)
                    .bottom_margin(1),
            )
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut state);
    }
}
