use anyhow::Result;
use printer_fleet::{NewPrinter, PrinterProfile, PrinterStore};

/// Look up a printer by display name.
pub fn profile_named(store: &PrinterStore, name: &str) -> Result<PrinterProfile> {
    store
        .get_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("no printer named {:?}", name))
}

pub fn list(store: &PrinterStore) -> Result<()> {
    let profiles = store.list();
    if profiles.is_empty() {
        println!("no printers configured");
        return Ok(());
    }

    for profile in profiles {
        println!(
            "{} {:<20} {:<10} {}{}",
            if profile.is_default() { '*' } else { ' ' },
            profile.name,
            profile.connection_type,
            profile.hostname,
            if profile.include_in_dashboard { "" } else { " (hidden)" },
        );
    }
    Ok(())
}

pub fn add(store: &PrinterStore, new: NewPrinter) -> Result<()> {
    let name = new.name.clone();
    let id = store.add(new)?;
    let is_default = store.get_by_id(id).map(|profile| profile.is_default()).unwrap_or(false);

    println!("added {}{}", name, if is_default { " (default)" } else { "" });
    Ok(())
}

pub fn set_default(store: &PrinterStore, name: &str) -> Result<()> {
    let profile = profile_named(store, name)?;
    store.set_default(profile.id())?;

    println!("{} is now the default printer", profile.name);
    Ok(())
}

pub fn remove(store: &PrinterStore, name: &str) -> Result<()> {
    let profile = profile_named(store, name)?;
    store.delete(profile.id())?;

    println!("removed {}", profile.name);
    if profile.is_default() {
        match store.get_default() {
            Some(default) => println!("{} is now the default printer", default.name),
            None => println!("no printers left"),
        }
    }
    Ok(())
}

pub fn include(store: &PrinterStore, name: &str, on: bool) -> Result<()> {
    let mut profile = profile_named(store, name)?;
    if profile.include_in_dashboard == on {
        return Ok(());
    }

    profile.include_in_dashboard = on;
    profile.needs_sync = true;
    profile.user_modified = chrono::Utc::now();
    store.update(&profile)?;
    Ok(())
}

pub fn reset_sync(store: &PrinterStore) -> Result<()> {
    store.reset_sync_state()?;

    println!("{} printers will be synced again", store.list().len());
    Ok(())
}
