use crate::browser::ClientBrowser;
use crate::cli::{connect, year_or_current};
use crate::directory::ClientDirectory;
use crate::error::Result;
use crate::settings::effective_settings;

pub fn run(year: Option<i32>) -> Result<()> {
    let settings = effective_settings();
    let api = connect()?;
    let dir = ClientDirectory::load(&api)?;
    let mut browser = ClientBrowser::new(
        dir,
        year_or_current(year),
        settings.items_per_page,
        &settings.currency_symbol,
    );
    browser.run(&api)
}
