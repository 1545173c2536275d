use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::core::loaders::{component_friendly_name, ModLoader};
use crate::core::modpack::{slugify, NewModpack, OperationError};
use crate::core::registry::GameTarget;
use crate::core::state::{AppState, Settings};
use crate::core::store::{create_repository, InMemoryStore};

#[derive(Parser, Debug)]
#[command(name = "modbox", version, about = "Manage a packwiz modpack stored on GitHub")]
pub struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// GitHub repository URL of the pack, overriding settings
    #[arg(long, global = true)]
    pub repository: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a mod and its required dependencies in one commit
    Add { slug: String },
    /// Remove a mod from the index
    Remove { slug: String },
    /// List installed mods
    List,
    /// Show what adding a mod would install, without committing
    Resolve {
        slug: String,
        /// Loader id; read from pack.toml when omitted
        #[arg(long, requires = "game_version")]
        loader: Option<String>,
        /// Minecraft version; read from pack.toml when omitted
        #[arg(long, requires = "loader")]
        game_version: Option<String>,
    },
    /// Write an initial pack.toml and index.toml
    Init {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        creator: String,
        #[arg(long)]
        minecraft: String,
        #[arg(long)]
        loader: ModLoader,
        /// Defaults to the loader's recommended version
        #[arg(long)]
        loader_version: Option<String>,
        /// Create a new GitHub repository named after the pack first
        #[arg(long)]
        create_repo: bool,
    },
    /// List loader versions available for a Minecraft version
    LoaderVersions {
        loader: ModLoader,
        game_version: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(repo) = cli.repository {
        settings.repository = Some(repo);
    }
    let state = AppState::new(settings)?;

    match cli.command {
        Command::Add { slug } => {
            let service = state.modpack()?;
            let report = service.add_mod(&slug).await.map_err(report_failure)?;
            println!("{}", report.summary());
            if let Some(url) = &report.commit.url {
                println!("{url}");
            }
        }
        Command::Remove { slug } => {
            let service = state.modpack()?;
            let report = service.remove_mod(&slug).await.map_err(report_failure)?;
            println!("Removed {}", report.slug);
        }
        Command::List => {
            let mods = state.modpack()?.list_mods().await?;
            if mods.is_empty() {
                println!("No mods installed.");
            }
            for slug in mods {
                println!("{slug}");
            }
        }
        Command::Resolve {
            slug,
            loader,
            game_version,
        } => resolve(&state, &slug, loader.zip(game_version)).await?,
        Command::Init {
            name,
            creator,
            minecraft,
            loader,
            loader_version,
            create_repo,
        } => {
            let loader_version = match loader_version {
                Some(v) => v,
                None => {
                    let versions = loader.fetch_versions(&state.http_client, &minecraft).await?;
                    info!("Using recommended {} {}", loader.friendly_name(), versions.recommended);
                    versions.recommended
                }
            };

            let store = if create_repo {
                let description = format!(
                    "A {} modpack for Minecraft {} generated by ModBox",
                    loader.id(),
                    minecraft
                );
                let repo = create_repository(
                    &state.http_client,
                    &state.settings.github_api_url,
                    state.settings.require_token()?,
                    &slugify(&name),
                    &description,
                )
                .await?;
                println!("Created https://github.com/{}", repo.name_with_owner());
                state.store_for(repo)?
            } else {
                state.store()?
            };

            let components = version_lines(&[
                ("minecraft", minecraft.as_str()),
                (loader.id(), loader_version.as_str()),
            ]);
            let receipt = state
                .modpack_with(store)
                .initialize(NewModpack {
                    name,
                    creator,
                    minecraft_version: minecraft,
                    loader: loader.id().to_string(),
                    loader_version,
                })
                .await?;
            println!("Initialized modpack at {}", receipt.revision);
            for line in components {
                println!("  {line}");
            }
        }
        Command::LoaderVersions {
            loader,
            game_version,
        } => {
            let versions = loader.fetch_versions(&state.http_client, &game_version).await?;
            println!(
                "{} versions for {} {}:",
                component_friendly_name(loader.id()),
                component_friendly_name("minecraft"),
                game_version
            );
            for v in &versions.versions {
                if *v == versions.recommended {
                    println!("{v} (recommended)");
                } else {
                    println!("{v}");
                }
            }
        }
    }

    Ok(())
}

async fn resolve(
    state: &AppState,
    slug: &str,
    explicit: Option<(String, String)>,
) -> anyhow::Result<()> {
    let service;
    let (target, installed) = match explicit {
        Some((loader, game_version)) => {
            // No pack to read; nothing counts as installed.
            service = state.modpack_with(Arc::new(InMemoryStore::new()));
            (GameTarget::new(loader, game_version), HashSet::new())
        }
        None => {
            service = state.modpack()?;
            let snapshot = service.manifests().snapshot().await?;
            (snapshot.pack.game_target()?, snapshot.installed_slugs())
        }
    };

    let mods = service.resolve_and_render(slug, &target, &installed).await?;
    if mods.is_empty() {
        println!("{slug} is already installed.");
        return Ok(());
    }
    println!(
        "Would add {} mod(s) for {} {}:",
        mods.len(),
        target.loader_id,
        target.game_version
    );
    for m in &mods {
        println!("  {} ({}) {}", m.title, m.slug, m.version_id);
    }
    Ok(())
}

/// `Minecraft 1.20.1`, `Fabric loader 0.15.11`, ... for `[versions]` entries.
fn version_lines(components: &[(&str, &str)]) -> Vec<String> {
    components
        .iter()
        .map(|(component, version)| {
            format!("{} {}", component_friendly_name(component), version)
        })
        .collect()
}

fn report_failure(err: OperationError) -> anyhow::Error {
    tracing::error!("{err}");
    anyhow::anyhow!(err.user_message())
}
