use tokenvault::settings::*;

fn main() -> anyhow::Result<()> {
    // Load settings from the default location
    let project_settings = parse_settings(None)?;
    println!(
        "Loaded settings: store={} coordination={} grace_window={:?}",
        project_settings.backend.store,
        project_settings.backend.coordination,
        project_settings.rotation.grace_window(),
    );

    // Attempt to load from an invalid path (expected to fail)
    let is_err = parse_settings(Some("")).is_err();
    println!("Error on invalid path: {:?}", is_err);

    // Attempt to load from a custom path, with env overrides
    // $ TOKENVAULT__ROTATION__GRACE_WINDOW_MS=5000 cargo run --bin settings_demo -- --settings=settings/dev.toml
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    println!(
        "Loaded settings: access_ttl={:?} refresh_ttl={:?} grace_window={:?}",
        project_settings.token.access_ttl(),
        project_settings.token.refresh_ttl(),
        project_settings.rotation.grace_window(),
    );

    Ok(())
}
