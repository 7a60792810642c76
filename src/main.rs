use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use mistxi_launcher_lib::commands::{self, Credentials};
use mistxi_launcher_lib::core::progress::{ProgressEvent, ProgressSink};

const PASSWORD_ENV: &str = "MISTXI_PASSWORD";

/// MistXI launcher: keeps Ashita and XiLoader current and prepares launches.
#[derive(Parser, Debug)]
#[command(name = "mistxi", version, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Update Ashita and XiLoader, write the boot files and print the launch plan.
    Prepare {
        #[arg(long)]
        user: Option<String>,
        /// Falls back to the MISTXI_PASSWORD environment variable.
        #[arg(long)]
        password: Option<String>,
        /// Print the prepared launch as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List recent XiLoader release tags.
    LoaderTags {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Pin XiLoader to a release tag; omit to follow the latest release.
    LoaderPin { version: Option<String> },
    /// Set the Final Fantasy XI install directory.
    SetGameDir { path: PathBuf },
    /// Manage game profiles.
    Profiles {
        #[command(subcommand)]
        action: ProfilesAction,
    },
    /// Manage add-ons and plugins of the active profile.
    Addons {
        #[command(subcommand)]
        action: AddonsAction,
    },
    /// Show how many players are online.
    Status,
    /// Show the latest announcement from the MistXI site.
    News,
}

#[derive(Subcommand, Debug)]
enum ProfilesAction {
    List,
    Create,
    Rename { old: String, new: String },
    Delete { name: String },
    Activate { name: String },
    /// Print a profile's settings.
    Show {
        name: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Overwrite a profile from a JSON file (as printed by `show --json`).
    Import { file: PathBuf },
    /// 0 uncapped, 1 = 60fps, 2 = 30fps.
    Fps { name: String, tier: i32 },
}

#[derive(Subcommand, Debug)]
enum AddonsAction {
    List,
    Enable { name: String },
    Disable { name: String },
    EnablePlugin { name: String },
    DisablePlugin { name: String },
}

fn console_progress() -> ProgressSink {
    ProgressSink::new(|event| {
        if let ProgressEvent::Status(line) = event {
            eprintln!("{}", line);
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (app, _guard) = mistxi_launcher_lib::bootstrap().context("Failed to start launcher")?;

    match cli.command {
        Command::Prepare {
            user,
            password,
            json,
        } => {
            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let credentials = Credentials {
                username: user,
                password: password.or_else(|| std::env::var(PASSWORD_ENV).ok()),
            };
            let outcome =
                match commands::prepare_launch(&app, credentials, &console_progress(), &cancel)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_cancelled() => {
                        eprintln!("Cancelled.");
                        return Ok(());
                    }
                    Err(e) => anyhow::bail!(e.user_message()),
                };

            if outcome.has_warnings() {
                eprintln!("Prepared with {} warning(s):", outcome.warnings.len());
                for warning in &outcome.warnings {
                    eprintln!("  {}", warning);
                }
            }
            let prepared = outcome.value;
            if json {
                println!("{}", serde_json::to_string_pretty(&prepared)?);
            } else {
                println!("Ashita:   {}", prepared.runtime_marker);
                println!("XiLoader: {}", prepared.loader_tag);
                println!("Config:   {}", prepared.config_path.display());
                println!("Script:   {}", prepared.script_path.display());
                println!("Launch:   {}", prepared.plan.display_line());
                println!("          (run from {}, elevated)", prepared.plan.working_dir.display());
            }
        }
        Command::LoaderTags { count } => {
            let tags = commands::loader_tags(&app, count).await;
            if tags.is_empty() {
                eprintln!("Could not fetch XiLoader releases.");
            }
            for tag in tags {
                println!("{}", tag);
            }
        }
        Command::LoaderPin { version } => {
            let label = version.clone().unwrap_or_else(|| "latest".into());
            commands::set_loader_version(&app, version).await?;
            println!("XiLoader set to {}", label);
        }
        Command::SetGameDir { path } => {
            commands::set_ffxi_dir(&app, path).await?;
        }
        Command::Profiles { action } => run_profiles(&app, action).await?,
        Command::Addons { action } => run_addons(&app, action).await?,
        Command::Status => match commands::players_online(&app).await {
            Some(n) => println!("{} players online", n),
            None => println!("Server status unavailable"),
        },
        Command::News => match commands::latest_news(&app).await {
            Some(ann) => {
                println!("{}", ann.title);
                if let Some(date) = ann.date {
                    println!("{}", date.format("%Y-%m-%d"));
                }
                if let Some(summary) = ann.summary {
                    println!("{}", summary);
                }
                if let Some(url) = ann.url {
                    println!("{}", url);
                }
            }
            None => println!("No announcements found"),
        },
    }
    Ok(())
}

async fn run_profiles(app: &mistxi_launcher_lib::AppState, action: ProfilesAction) -> Result<()> {
    match action {
        ProfilesAction::List => {
            let summary = commands::list_profiles(app).await;
            for name in summary.profiles {
                let marker = if name == summary.active { "*" } else { " " };
                println!("{} {}", marker, name);
            }
        }
        ProfilesAction::Create => {
            let name = commands::create_profile(app).await?;
            println!("Created '{}'", name);
        }
        ProfilesAction::Rename { old, new } => commands::rename_profile(app, &old, &new).await?,
        ProfilesAction::Delete { name } => commands::delete_profile(app, &name).await?,
        ProfilesAction::Activate { name } => commands::activate_profile(app, &name).await?,
        ProfilesAction::Show { name, json } => {
            let name = match name {
                Some(name) => name,
                None => commands::list_profiles(app).await.active,
            };
            let profile = commands::get_profile(app, &name).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                let window = profile
                    .window_mode_kind()
                    .map(|m| format!("{:?}", m))
                    .unwrap_or_else(|| format!("custom ({})", profile.window_mode));
                println!("Profile:    {}", profile.name);
                println!(
                    "Resolution: {}x{}",
                    profile.resolution_width, profile.resolution_height
                );
                println!("Window:     {}", window);
                println!("FPS tier:   {}", profile.fps_cap);
                println!("Plugins:    {}", profile.enabled_plugins.join(", "));
                println!("Add-ons:    {}", profile.enabled_addons.join(", "));
            }
        }
        ProfilesAction::Import { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let profile: mistxi_launcher_lib::core::profile::GameProfile =
                serde_json::from_str(&raw).context("Not a valid profile")?;
            let name = profile.name.clone();
            commands::save_profile(app, profile).await?;
            println!("Saved '{}'", name);
        }
        ProfilesAction::Fps { name, tier } => commands::set_fps_cap(app, &name, tier).await?,
    }
    Ok(())
}

async fn run_addons(app: &mistxi_launcher_lib::AppState, action: AddonsAction) -> Result<()> {
    let active = commands::list_profiles(app).await.active;
    match action {
        AddonsAction::List => {
            let listing = commands::list_extensions(app).await;
            println!("Plugins:");
            for p in listing.plugins {
                println!("  [{}] {}", if p.enabled { "x" } else { " " }, p.name);
            }
            println!("Add-ons:");
            for a in listing.addons {
                let desc = a.description.unwrap_or_default();
                println!("  [{}] {:<16} {}", if a.enabled { "x" } else { " " }, a.name, desc);
            }
        }
        AddonsAction::Enable { name } => {
            commands::set_addon_enabled(app, &active, &name, true).await?
        }
        AddonsAction::Disable { name } => {
            commands::set_addon_enabled(app, &active, &name, false).await?
        }
        AddonsAction::EnablePlugin { name } => {
            commands::set_plugin_enabled(app, &active, &name, true).await?
        }
        AddonsAction::DisablePlugin { name } => {
            commands::set_plugin_enabled(app, &active, &name, false).await?
        }
    }
    Ok(())
}
