use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Password, Select};

use greg_config::{ConfigLoader, GregConfig, Paths, ProviderKind};
use greg_core::GregError;
use greg_llm::{Availability, OnDeviceProvider};

use crate::ui;

/// Providers offered by the wizard on this machine.
pub fn offered_providers(on_device_supported: bool) -> Vec<ProviderKind> {
    ProviderKind::ALL
        .into_iter()
        .filter(|kind| on_device_supported || *kind != ProviderKind::OnDevice)
        .collect()
}

/// Example key format shown in the key prompt.
pub fn key_hint(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OnDevice => "",
        ProviderKind::Anthropic => "sk-ant-api03-...",
        ProviderKind::OpenAi => "sk-proj-...",
        ProviderKind::Gemini => "AIza...",
    }
}

fn prompt_error(e: dialoguer::Error) -> GregError {
    GregError::Io(std::io::Error::other(e.to_string()))
}

/// Interactive setup wizard. Saves and returns the new configuration.
pub async fn cmd_setup(paths: &Paths) -> greg_core::Result<GregConfig> {
    let theme = ColorfulTheme::default();

    eprintln!();
    eprintln!("{}", style("Welcome to Greg! Let's get you set up.").bold());
    eprintln!();

    let providers = offered_providers(OnDeviceProvider::is_supported());
    let labels: Vec<&str> = providers.iter().map(|p| p.label()).collect();
    let idx = Select::with_theme(&theme)
        .with_prompt("Provider")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(prompt_error)?;
    let kind = providers
        .get(idx)
        .copied()
        .ok_or_else(|| GregError::Config("invalid provider choice".into()))?;

    let config = match kind {
        ProviderKind::OnDevice => {
            prepare_on_device(paths).await?;
            GregConfig::new(kind)
        }
        ProviderKind::Anthropic | ProviderKind::OpenAi | ProviderKind::Gemini => {
            let key: String = Password::with_theme(&theme)
                .with_prompt(format!("API key ({})", key_hint(kind)))
                .interact()
                .map_err(prompt_error)?;
            let default_model = kind.default_model().unwrap_or_default();
            let model: String = Input::with_theme(&theme)
                .with_prompt("Model")
                .default(default_model.to_string())
                .interact_text()
                .map_err(prompt_error)?;
            GregConfig::new(kind)
                .with_api_key(key.trim())
                .with_model(model.trim())
        }
    };

    ConfigLoader::save(paths, &config)?;
    eprintln!();
    eprintln!(
        "{}",
        style(format!("Saved to {}", paths.config_file().display())).green()
    );
    ui::dim("You can edit this file or run `greg --setup` anytime.");
    eprintln!();

    Ok(config)
}

/// Build the bridge and report availability. Only a failed build is fatal;
/// an unavailable model is saved anyway.
async fn prepare_on_device(paths: &Paths) -> greg_core::Result<()> {
    let provider = OnDeviceProvider::new(paths);

    let spinner = ui::spinner("Compiling AFM bridge...");
    let built = provider.ensure_binary().await;
    spinner.finish_and_clear();
    built?;

    let availability = provider.check_availability().await;
    match &availability {
        Availability::Available => eprintln!("{}", style(availability.describe()).green()),
        Availability::Unavailable(_) => {
            eprintln!("{}", style(availability.describe()).yellow());
            ui::dim("Saving config anyway. Greg will work once it is ready.");
        }
    }
    Ok(())
}
