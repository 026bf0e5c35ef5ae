use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crowdmap_palette::{PaletteId, PaletteStore, catalog};
use crowdmap_util::{InMemoryPreferenceStore, JsonPreferenceStore, PreferenceStore};
use serde_json::json;
use tracing::warn;

mod render;

/// Congestion palette tools for the crowdmap dashboard.
#[derive(Debug, Parser)]
#[command(name = "crowdmap", version)]
struct Cli {
    /// Preferences file (defaults to ~/.config/crowdmap/preferences.json).
    #[arg(long, global = true, value_name = "PATH")]
    preferences: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every palette with its level 1-10 swatch.
    Palettes {
        #[arg(long)]
        json: bool,
    },
    /// Show or change the active palette.
    Palette {
        #[command(subcommand)]
        action: PaletteAction,
    },
    /// Look up the cell colors for a congestion level.
    Color {
        /// Raw level value; anything outside 1-10 is treated as "no data".
        level: String,
        /// Use this palette instead of the active one.
        #[arg(long)]
        palette: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum PaletteAction {
    /// Print the active palette id.
    Get,
    /// Activate and persist a palette.
    Set { id: String },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let store = PaletteStore::from_environment(open_preferences(cli.preferences));

    match cli.command {
        Command::Palettes { json } => list_palettes(&store, json),
        Command::Palette { action: PaletteAction::Get } => {
            println!("{}", store.active_palette_id());
            Ok(())
        }
        Command::Palette {
            action: PaletteAction::Set { id },
        } => {
            let palette = store
                .set_active_palette(canonical_name(&id))
                .with_context(|| format!("valid palettes: {}", known_ids()))?;
            println!("{palette}");
            Ok(())
        }
        Command::Color { level, palette, json } => print_color(&store, &level, palette.as_deref(), json),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Opens the JSON preferences file, falling back to an in-memory store so a
/// broken config directory never blocks color lookups.
fn open_preferences(path: Option<PathBuf>) -> Arc<dyn PreferenceStore> {
    match JsonPreferenceStore::new(path) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            warn!(error = %error, "Preferences unavailable; selection will not persist");
            Arc::new(InMemoryPreferenceStore::new())
        }
    }
}

fn list_palettes(store: &PaletteStore, as_json: bool) -> Result<()> {
    let active = store.active_palette_id();
    if as_json {
        let payload = json!({
            "active": active,
            "palettes": store.list_palettes(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{}", render::palette_table(catalog::all(), active, use_color()));
    Ok(())
}

fn print_color(store: &PaletteStore, raw_level: &str, palette: Option<&str>, as_json: bool) -> Result<()> {
    let definition = match palette {
        Some(name) => catalog::resolve(name)
            .with_context(|| format!("unknown palette {name}; valid palettes: {}", known_ids()))?,
        None => store.active_palette(),
    };
    let background = definition.color(raw_level);
    let foreground = definition.text_color(raw_level);

    if as_json {
        let payload = json!({
            "palette": definition.id,
            "level": raw_level.trim(),
            "background": background,
            "foreground": foreground,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("background {background}\nforeground {foreground}");
    }
    Ok(())
}

/// Canonical id for a loosely typed palette name, or the input unchanged so
/// the store can reject it.
fn canonical_name(input: &str) -> &str {
    catalog::resolve(input).map_or(input, |definition| definition.id.as_str())
}

fn known_ids() -> String {
    PaletteId::ALL.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
}

fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}
