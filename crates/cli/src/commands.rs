use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use roc_companion_core::{
    catalog, normalize_resource_key, parse_building_identifier, parse_techno_identifier, Era,
    FileStore, Priority, Settings,
};

/// Options surface for the Rise of Cultures wiki companion.
#[derive(Debug, Parser)]
#[command(name = "roc-companion", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the selected era, or select a new one by code.
    Era {
        #[arg(value_parser = parse_era)]
        code: Option<Era>,
    },
    /// Choose the good produced for an era's priority slot (empty clears it).
    Select {
        #[arg(value_parser = parse_era)]
        era: Era,
        priority: PriorityArg,
        good: String,
    },
    /// Print the good selection table.
    Selections,
    /// Resolve resource keys against the current selections.
    Resolve {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Decompose a compound identifier.
    Parse {
        #[command(subcommand)]
        kind: ParseKind,
    },
    /// Sum the costs of saved buildings (or technos) per good.
    Totals {
        #[arg(long)]
        technos: bool,
    },
    /// List every persisted key.
    Keys,
    /// Print setting changes made by any context until interrupted.
    Watch,
}

#[derive(Debug, Subcommand)]
pub enum ParseKind {
    /// `path|tableType|era|level`
    Building { id: String },
    /// `techno_<main>_<sub>_<third>_<era>_<index>`
    Techno { id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Primary,
    Secondary,
    Tertiary,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Primary => Priority::Primary,
            PriorityArg::Secondary => Priority::Secondary,
            PriorityArg::Tertiary => Priority::Tertiary,
        }
    }
}

fn parse_era(code: &str) -> Result<Era, String> {
    Era::from_code(&code.to_uppercase()).ok_or_else(|| format!("unknown era code '{code}'"))
}

pub struct Context {
    pub store: Arc<FileStore>,
    pub settings: Settings,
}

pub async fn run(command: Command, context: &Context) -> Result<()> {
    let settings = &context.settings;
    match command {
        Command::Era { code: None } => {
            let era = settings.era.read();
            println!("{} ({})", era.name(), era.code());
        }
        Command::Era { code: Some(era) } => {
            settings.era.write(era).await?;
            info!("era set to {}", era.code());
            println!("{} ({})", era.name(), era.code());
        }
        Command::Select {
            era,
            priority,
            good,
        } => {
            if era.goods_index().is_none() {
                bail!("{} produces no goods", era.name());
            }
            let good = good.trim().to_string();
            settings
                .selections
                .update(|selections| {
                    selections.set(era, priority.into(), good);
                })
                .await?;
            print_selections(settings);
        }
        Command::Selections => print_selections(settings),
        Command::Resolve { keys } => {
            let selections = settings.selections.read();
            for key in keys {
                println!("{key} -> {}", normalize_resource_key(&key, &selections));
            }
        }
        Command::Parse { kind } => {
            let json = match kind {
                ParseKind::Building { id } => {
                    let parsed = parse_building_identifier(&id)?;
                    println!("building name: {}", parsed.building_name());
                    serde_json::to_string_pretty(&parsed)?
                }
                ParseKind::Techno { id } => {
                    serde_json::to_string_pretty(&parse_techno_identifier(&id)?)?
                }
            };
            println!("{json}");
        }
        Command::Totals { technos } => {
            let entities = if technos {
                settings.saved_technos.read()
            } else {
                settings.saved_buildings.read()
            };
            let totals = catalog::resource_totals(&entities, &settings.selections.read());
            if totals.is_empty() {
                println!("nothing saved");
            }
            for (good, amount) in totals {
                println!("{good:>20} {amount}");
            }
        }
        Command::Keys => {
            for key in context.store.keys()? {
                println!("{key}");
            }
        }
        Command::Watch => watch(settings).await?,
    }
    Ok(())
}

fn print_selections(settings: &Settings) {
    let selections = settings.selections.read();
    for era in Era::ALL.into_iter().filter(|era| era.goods_index().is_some()) {
        let slots: Vec<&str> = [Priority::Primary, Priority::Secondary, Priority::Tertiary]
            .into_iter()
            .map(|priority| selections.get(era, priority).unwrap_or("-"))
            .collect();
        println!("{} {:<18} {}", era.code(), era.name(), slots.join(" / "));
    }
}

async fn watch(settings: &Settings) -> Result<()> {
    let _era = settings.era.subscribe(|era| {
        println!("[{}] era -> {}", Local::now().format("%H:%M:%S"), era.name());
    });
    let _selections = settings.selections.subscribe(|selections| {
        println!(
            "[{}] selections -> {} era row(s)",
            Local::now().format("%H:%M:%S"),
            selections.rows().len()
        );
    });
    let _buildings = settings.saved_buildings.subscribe(|saved| {
        let parsed = catalog::parse_buildings(saved.iter().map(|entity| entity.id.as_str()));
        println!(
            "[{}] saved buildings -> {} entries across {} era(s)",
            Local::now().format("%H:%M:%S"),
            saved.len(),
            catalog::group_by_era(parsed).len()
        );
    });
    let _technos = settings.saved_technos.subscribe(|saved| {
        let parsed = catalog::parse_technos(saved.iter().map(|entity| entity.id.as_str()));
        println!(
            "[{}] saved technos -> {} valid of {}",
            Local::now().format("%H:%M:%S"),
            parsed.len(),
            saved.len()
        );
    });

    println!("watching for changes, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    Ok(())
}
