//! Command line and environment configuration

use crate::data::Dataset;
use crate::figure::{FigureStyle, StyleVariant};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "globe-explorer", version, about = "Explore the world's great cities on a globe")]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Tui)
    }
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Interactive terminal explorer
    Tui,
    /// HTTP API for a browser front end
    Serve,
    /// Write CSV without starting a UI
    Export {
        /// Export a single city by name instead of the whole dataset
        #[arg(long)]
        city: Option<String>,
        /// Output file; defaults to the standard filename in the export dir
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct Settings {
    #[arg(long, env = "PORT", default_value_t = 8050, global = true)]
    pub port: u16,

    #[arg(long, env = "HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    #[arg(long, env = "DEBUG", global = true)]
    pub debug: bool,

    /// classic or glow
    #[arg(long, env = "GLOBE_VARIANT", default_value = "classic", global = true)]
    pub variant: StyleVariant,

    /// City dataset JSON; the embedded dataset is used when unset
    #[arg(long, env = "CITIES_FILE", global = true)]
    pub cities: Option<PathBuf>,

    /// Directory holding Natural Earth GeoJSON files
    #[arg(long, env = "DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    #[arg(long, env = "EXPORT_DIR", default_value = ".", global = true)]
    pub export_dir: PathBuf,

    #[arg(long, env = "MARKER_MIN", global = true, value_parser = finite_size)]
    pub marker_min: Option<f64>,

    #[arg(long, env = "MARKER_MAX", global = true, value_parser = finite_size)]
    pub marker_max: Option<f64>,

    /// Population per unit of marker size
    #[arg(long, env = "MARKER_SCALE", global = true, value_parser = finite_size)]
    pub marker_scale: Option<f64>,
}

/// Marker size values, rejecting NaN and infinities
fn finite_size(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{s} is not a finite number"))
    }
}

impl Settings {
    /// Variant style with any marker overrides applied
    pub fn figure_style(&self) -> FigureStyle {
        let mut style = self.variant.style();
        if let Some(min) = self.marker_min {
            style.marker.min_size = min;
        }
        if let Some(max) = self.marker_max {
            style.marker.max_size = max;
        }
        if let Some(scale) = self.marker_scale.filter(|s| *s > 0.0) {
            style.marker.scale_factor = scale;
        }
        if style.marker.max_size < style.marker.min_size {
            style.marker.max_size = style.marker.min_size;
        }
        style
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn load_dataset(&self) -> Result<Dataset> {
        match &self.cities {
            Some(path) => Dataset::load(path).with_context(|| format!("loading {}", path.display())),
            None => Dataset::embedded().context("loading embedded city dataset"),
        }
    }
}
