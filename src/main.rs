use clap::{Parser, Subcommand};
use flatfolio::config;
use flatfolio::graph::PageGraph;
use flatfolio::output;
use flatfolio::router::Request;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flatfolio")]
#[command(about = "Flat-file content engine: folders in, routed pages out")]
#[command(long_about = "\
Flat-file content engine: folders in, routed pages out

Your filesystem is the data source. Directories become pages, numeric
prefixes order them and make them visible in menus, and a key/value content
file gives each page its metadata.

Site structure:

  site/
  ├── config.toml                  # Site config (optional)
  └── content/
      ├── 01-home/                 # Page \"home\" (numbered = visible)
      │   └── home.md              # Content file; template \"home\"
      ├── 02-blog/
      │   ├── blog.md
      │   └── 01-first-post/       # Page \"blog/first-post\"
      │       ├── article.md
      │       ├── cover.jpg        # Attachment (images group)
      │       └── cover.jpg.md     # Attachment metadata
      ├── 03-archive/              # No content file = virtual page
      │   └── 01-2019/
      │       └── archive.md
      └── error/                   # No number prefix = hidden from menus
          └── error.md

Content files hold records separated by '-----':

  Title: Hello
  -----
  Date: 2024-05-01

Run 'flatfolio gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site root holding config.toml and the content directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log debug output to stderr (otherwise RUST_LOG, default warn)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical page tree
    Tree {
        /// Include hidden (unnumbered) pages
        #[arg(long)]
        all: bool,
    },
    /// List every page with its source and attachments
    Pages,
    /// Resolve a request URI to its active page
    Route {
        /// Request URI, e.g. /blog/first-post or /blog/page:2
        uri: String,
        /// Mount point of the site below the host root
        #[arg(long, default_value = "")]
        sub: String,
        /// Print a JSON summary instead of text
        #[arg(long)]
        json: bool,
    },
    /// Build the page graph and report counts
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Tree { all } => {
            let graph = load_graph(&cli.root, Request::default())?;
            output::print_tree(&graph.tree(!all));
        }
        Command::Pages => {
            let graph = load_graph(&cli.root, Request::default())?;
            output::print_pages(&graph);
        }
        Command::Route { uri, sub, json } => {
            let request = Request::from_uri(&uri).with_sub_path(sub);
            let graph = load_graph(&cli.root, request)?;
            if json {
                let summary = output::route_summary(&graph);
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::print_route(&graph);
            }
        }
        Command::Check => {
            let graph = load_graph(&cli.root, Request::default())?;
            output::print_check(&graph);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `config.toml` from the site root and build the graph for `request`.
fn load_graph(root: &Path, request: Request) -> Result<PageGraph, Box<dyn std::error::Error>> {
    let site_config = config::load_config(root)?;
    let content_dir = site_config.content_dir(root);
    Ok(PageGraph::load(&content_dir, &site_config, request)?)
}
