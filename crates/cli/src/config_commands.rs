use {anyhow::Result, clap::Args, plinth_config::ConfigService};

use crate::SettingsArg;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    settings: SettingsArg,

    /// Print only this dotted key (e.g. `plugins.directories`).
    key: Option<String>,
}

pub fn handle_config(args: ConfigArgs) -> Result<()> {
    let settings = args.settings.load()?;
    let config = ConfigService::from_settings(&settings)?;

    let value = match args.key.as_deref() {
        None => config.to_value(),
        Some(key) => {
            let Some(value) = config.get(key) else {
                eprintln!("Key '{key}' is not set.");
                std::process::exit(1);
            };
            value.clone()
        },
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
