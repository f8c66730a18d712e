//! Recipe tree calculator
//!
//! Command-line front end for resolving production trees.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use recipe_tree::db::{self, SqliteCatalog};
use recipe_tree::{
    ExcessLedger, PlanBook, RecipeCatalog, Resolution, Resolver, Settings, TreeId, TreePlan,
    loader, report,
};

#[derive(Parser)]
#[command(name = "recipe-tree")]
#[command(about = "Production chain dependency-tree calculator")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "recipes.db")]
    database: PathBuf,

    /// Settings file holding default recipe preferences
    #[arg(short, long, default_value = "recipe-tree.toml")]
    settings: PathBuf,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import recipe datasets (*.json) from a directory
    Import {
        /// Directory to scan
        data_dir: PathBuf,

        /// Clear existing data before import
        #[arg(long)]
        clear: bool,
    },

    /// Resolve the production tree for an item
    Calc {
        /// Item to produce (e.g., "iron-plate")
        item: String,

        /// Target production rate per minute
        #[arg(short, long, default_value = "60.0")]
        rate: f64,

        /// Recipe to use for the requested item
        #[arg(long)]
        recipe: Option<String>,

        /// JSON file mapping node ids to excess quantities
        #[arg(long)]
        excess_file: Option<PathBuf>,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,

        /// Show the full tree, not just the summary
        #[arg(short, long)]
        tree: bool,
    },

    /// Edit and resolve a saved plan
    Plan {
        /// Plan file (JSON)
        file: PathBuf,

        #[command(subcommand)]
        command: PlanCommand,
    },

    /// List all items in the database
    ListItems,

    /// List recipes, optionally only those producing an item
    ListRecipes {
        item: Option<String>,
    },

    /// Show details for a specific recipe
    Recipe {
        /// Recipe ID
        id: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load sample data for testing (without dataset files)
    LoadSample,
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Add a tree to the plan
    New {
        tree: String,
        item: String,
        #[arg(short, long, default_value = "60.0")]
        rate: f64,
        #[arg(long)]
        recipe: Option<String>,
    },

    /// Resolve and print a tree
    Show {
        tree: String,
        #[arg(long)]
        json: bool,
    },

    /// Change a tree's requested rate or root recipe
    Set {
        tree: String,
        #[arg(short, long)]
        rate: Option<f64>,
        #[arg(long)]
        recipe: Option<String>,
    },

    /// Record excess for a node (0 clears it)
    Excess {
        tree: String,
        node: String,
        quantity: f64,
    },

    /// Set machine count and multiplier for a node
    Machines {
        tree: String,
        node: String,
        #[arg(long)]
        count: Option<u32>,
        #[arg(long)]
        multiplier: Option<f64>,
    },

    /// Move a node's subtree into a tree of its own
    Import {
        tree: String,
        node: String,
        new_tree: String,
    },

    /// Merge an imported tree back into its origin
    Unimport {
        tree: String,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;
    let settings = Settings::load_or_default(Some(cli.settings.as_path()))?;
    let catalog = SqliteCatalog::new(&conn);

    match cli.command {
        Commands::Import { data_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_data(&conn)?;
            }

            let stats = loader::import_directory(&conn, &data_dir)?;
            println!("{}", stats);
        }

        Commands::Calc {
            item,
            rate,
            recipe,
            excess_file,
            json,
            tree,
        } => {
            let excess = match excess_file {
                Some(path) => read_excess(&path)?,
                None => ExcessLedger::new(),
            };
            let tree_id = TreeId::new("calc")?;
            let resolution = Resolver::new(&catalog, &settings, &excess)
                .resolve(&tree_id, &item, rate, recipe.as_deref())
                .await?;
            print_resolution(&resolution, json, tree)?;
        }

        Commands::Plan { file, command } => {
            run_plan(&file, command, &catalog, &settings).await?;
        }

        Commands::ListItems => {
            let items = catalog.components().await?;
            if items.is_empty() {
                println!("No items in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<24} {}", "Id", "Name");
                println!("{}", "-".repeat(48));
                for i in items {
                    println!("{:<24} {}", i.id, i.name);
                }
            }
        }

        Commands::ListRecipes { item } => {
            let ids = match item {
                Some(item) => catalog
                    .recipes_for_item(&item)
                    .await?
                    .into_iter()
                    .map(|r| r.id)
                    .collect(),
                None => db::list_recipe_ids(&conn)?,
            };
            if ids.is_empty() {
                println!("No recipes found.");
            }
            for id in ids {
                println!("  {}", id);
            }
        }

        Commands::Recipe { id } => match catalog.recipe_by_id(&id).await? {
            Some(r) => {
                println!("Recipe: {}", r.name);
                println!("  ID: {}", r.id);
                println!("  Time: {}s", r.time);
                if !r.inputs.is_empty() {
                    println!("  Inputs:");
                    for (item, rate) in &r.inputs {
                        println!("    {} @ {}/min", item, rate);
                    }
                }
                println!("  Outputs:");
                for (item, rate) in &r.outputs {
                    println!("    {} @ {}/min", item, rate);
                }
            }
            None => println!("Recipe '{}' not found", id),
        },

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            db::clear_data(&conn)?;
            let mut stats = loader::ImportStats::default();
            loader::store_dataset(&conn, &loader::sample_dataset(), &mut stats)?;
            println!("Sample data loaded: {}", stats);
        }
    }

    Ok(())
}

async fn run_plan<C: RecipeCatalog>(
    file: &Path,
    command: PlanCommand,
    catalog: &C,
    settings: &Settings,
) -> Result<()> {
    let mut book = PlanBook::load_or_default(file)
        .with_context(|| format!("Failed to load plan {}", file.display()))?;

    match command {
        PlanCommand::New {
            tree,
            item,
            rate,
            recipe,
        } => {
            let mut plan = TreePlan::new(item, rate);
            plan.recipe_override = recipe;
            book.add_tree(TreeId::new(tree)?, plan)?;
        }

        PlanCommand::Show { tree, json } => {
            let resolution = book.resolve(&TreeId::new(tree)?, catalog, settings).await?;
            return print_resolution(&resolution, json, true);
        }

        PlanCommand::Set { tree, rate, recipe } => {
            let tree = TreeId::new(tree)?;
            if let Some(rate) = rate {
                book.set_amount(&tree, rate)?;
            }
            if recipe.is_some() {
                book.tree_mut(&tree)?.recipe_override = recipe;
            }
        }

        PlanCommand::Excess {
            tree,
            node,
            quantity,
        } => {
            book.record_excess(&TreeId::new(tree)?, &node, quantity)?;
        }

        PlanCommand::Machines {
            tree,
            node,
            count,
            multiplier,
        } => {
            let tree = TreeId::new(tree)?;
            if count.is_none() && multiplier.is_none() {
                bail!("nothing to set: pass --count and/or --multiplier");
            }
            if let Some(count) = count {
                book.set_machine_count(&tree, &node, count)?;
            }
            if let Some(multiplier) = multiplier {
                book.set_machine_multiplier(&tree, &node, multiplier)?;
            }
        }

        PlanCommand::Import {
            tree,
            node,
            new_tree,
        } => {
            let resolution = book.resolve(&TreeId::new(tree.clone())?, catalog, settings).await?;
            let Some(target) = resolution.tree.find(&node) else {
                bail!("node '{}' not found in tree '{}'", node, tree);
            };
            book.import_subtree(target, TreeId::new(new_tree)?)?;
        }

        PlanCommand::Unimport { tree } => {
            book.unimport(&TreeId::new(tree)?)?;
        }
    }

    book.save(file)
        .with_context(|| format!("Failed to save plan {}", file.display()))?;
    Ok(())
}

fn read_excess(path: &Path) -> Result<ExcessLedger> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_resolution(resolution: &Resolution, json: bool, tree: bool) -> Result<()> {
    for warning in &resolution.warnings {
        eprintln!("warning: {}", warning);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution.tree)?);
        return Ok(());
    }

    if tree {
        println!("Production tree:\n");
        println!("{}", report::format_tree(&resolution.tree, 0));
    }
    println!("{}", report::summarize_tree(&resolution.tree));
    Ok(())
}
