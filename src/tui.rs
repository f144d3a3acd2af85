use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::fmt::{money, paid_mark};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const PAID_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const UNPAID_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);

/// ✔ in green or ✘ in red.
pub fn paid_span(is_paid: bool) -> Span<'static> {
    let style = if is_paid { PAID_STYLE } else { UNPAID_STYLE };
    Span::styled(paid_mark(is_paid), style)
}

/// Balances above zero are still owed and render red; settled or overpaid is green.
pub fn balance_span(balance: f64, symbol: &str) -> Span<'static> {
    let style = if balance > 0.0 { UNPAID_STYLE } else { PAID_STYLE };
    Span::styled(money(balance, symbol), style)
}

/// Install a panic hook that restores the terminal before printing the panic.
pub fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));
}
