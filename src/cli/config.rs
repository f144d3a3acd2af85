use crate::error::Result;
use crate::session::SessionStore;
use crate::settings::{effective_settings, load_settings, save_settings, API_URL_ENV};

pub fn show() -> Result<()> {
    let settings = effective_settings();
    let session = SessionStore::default_location();
    println!("api_base_url     {}", settings.api_base_url);
    if std::env::var(API_URL_ENV).is_ok_and(|v| !v.trim().is_empty()) {
        println!("                 (from {API_URL_ENV})");
    }
    println!("items_per_page   {}", settings.items_per_page);
    println!("currency_symbol  {}", settings.currency_symbol);
    println!(
        "session          {}",
        if session.load().is_authenticated() { "logged in" } else { "not logged in" }
    );
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let mut settings = load_settings();
    settings.set(key, value)?;
    save_settings(&settings)?;
    println!("Set {key} = {value}");
    Ok(())
}
