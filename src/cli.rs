use std::time::Duration;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Hydrate a single page document with site content.
    Render(RenderArgs),
    /// Generate detail-page shells for every work and writing.
    Generate(GenerateArgs),
    /// Hydrate a whole site tree and add missing detail pages.
    Build(BuildArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Site config (YAML). Defaults to $TITIKFIKSI_CONFIG, then
    /// `titikfiksi.yaml` in the site root.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Timeout for each content request when the site is a URL.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

impl GlobalArgs {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Site root directory or deployed site URL (http/https).
    #[arg(long)]
    pub site: String,

    /// Page document to hydrate.
    #[arg(long)]
    pub page: String,

    /// Site-relative location of the page (e.g. `pages/works/sunset.html`).
    /// Defaults to the page path relative to a local site root.
    #[arg(long)]
    pub location: Option<String>,

    /// Output file. Prints to stdout when omitted.
    #[arg(long)]
    pub out: Option<String>,

    /// Overwrite the output file if it exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Site root directory or deployed site URL (http/https).
    #[arg(long)]
    pub site: String,

    /// Output directory for generated pages (`pages/works`, `pages/writings`).
    #[arg(long)]
    pub out: String,

    /// Overwrite generated files that already exist.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Site root directory.
    #[arg(long)]
    pub site: String,

    /// Output directory for the built site.
    #[arg(long)]
    pub out: String,

    /// Build into an existing output directory, overwriting files.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
