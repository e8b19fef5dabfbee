use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use canopy::config::Config;
use canopy::db::{Database, SpaceRepository, WorkItemRepository};
use canopy::models::*;
use canopy::render::render_tree;
use canopy::service::{AreaService, IterationService};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Area and iteration trees for a work-item tracker")]
struct Cli {
    /// Database file (overrides config and CANOPY_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage spaces
    #[command(subcommand)]
    Space(SpaceCommand),
    /// Manage the iteration tree of a space
    #[command(subcommand)]
    Iteration(IterationCommand),
    /// Manage the area tree of a space
    #[command(subcommand)]
    Area(AreaCommand),
    /// Manage work items
    #[command(subcommand)]
    Item(ItemCommand),
}

#[derive(Subcommand)]
enum SpaceCommand {
    /// Create a space with its root iteration and root area
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List all spaces
    List,
}

#[derive(Subcommand)]
enum IterationCommand {
    /// Create an iteration under a parent iteration
    Create {
        parent: Uuid,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        start_at: Option<DateTime<Utc>>,
        #[arg(long)]
        end_at: Option<DateTime<Utc>>,
        #[arg(long)]
        user_active: bool,
    },
    /// Show an iteration with its breadcrumb and counts
    Show { id: Uuid },
    /// List every iteration of a space
    List { space: Uuid },
    /// Render the iteration tree of a space
    Tree { space: Uuid },
    /// List all descendants of an iteration
    Children { id: Uuid },
    /// Update fields or the state of an iteration
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        /// new, start or close
        #[arg(long)]
        state: Option<IterationState>,
        #[arg(long)]
        start_at: Option<DateTime<Utc>>,
        /// Remove the start date
        #[arg(long, conflicts_with = "start_at")]
        clear_start_at: bool,
        #[arg(long)]
        end_at: Option<DateTime<Utc>>,
        /// Remove the end date
        #[arg(long, conflicts_with = "end_at")]
        clear_end_at: bool,
        #[arg(long)]
        user_active: Option<bool>,
        /// Fail if the iteration no longer has this version
        #[arg(long)]
        version: Option<i64>,
    },
    /// Delete an iteration and its subtree, moving work items to the root
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum AreaCommand {
    /// Create an area under a parent area
    Create { parent: Uuid, name: String },
    /// Show an area with its breadcrumb and counts
    Show { id: Uuid },
    /// List every area of a space
    List { space: Uuid },
    /// Render the area tree of a space
    Tree { space: Uuid },
    /// List all descendants of an area
    Children { id: Uuid },
}

#[derive(Subcommand)]
enum ItemCommand {
    /// Create a work item (defaults to the space's root iteration and area)
    Create {
        space: Uuid,
        title: String,
        #[arg(long)]
        iteration: Option<Uuid>,
        #[arg(long)]
        area: Option<Uuid>,
        /// new, open, in_progress, resolved or closed
        #[arg(long)]
        state: Option<WorkItemState>,
    },
    /// Change the title, state or containers of a work item
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        state: Option<WorkItemState>,
        #[arg(long)]
        iteration: Option<Uuid>,
        #[arg(long)]
        area: Option<Uuid>,
    },
}

/// Log to stderr so stdout carries only command output.
fn init_tracing(config: &Config) {
    let directive = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| config.log_filter.clone())
        .unwrap_or_else(|| "canopy=info".into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(directive))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Map a value flag and its `--clear-*` counterpart onto a nullable update.
fn nullable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config);

    let db = match cli.db.or_else(|| config.database_path.clone()) {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    let iterations = IterationService::new(db.clone(), config.ancestor_resolution);
    let areas = AreaService::new(db.clone(), config.ancestor_resolution);

    match cli.command {
        Commands::Space(cmd) => match cmd {
            SpaceCommand::Create { name, description } => {
                let space = db.transaction(|tx| {
                    SpaceRepository::new(tx).create(CreateSpaceInput { name, description })
                })?;
                print_json(&space)?;
            }
            SpaceCommand::List => {
                let spaces = db.transaction(|tx| SpaceRepository::new(tx).list())?;
                print_json(&spaces)?;
            }
        },
        Commands::Iteration(cmd) => match cmd {
            IterationCommand::Create {
                parent,
                name,
                description,
                start_at,
                end_at,
                user_active,
            } => {
                let iteration = iterations.create_child(
                    parent,
                    CreateIterationInput {
                        name,
                        description,
                        start_at,
                        end_at,
                        user_active: Some(user_active),
                    },
                )?;
                print_json(&iteration)?;
            }
            IterationCommand::Show { id } => print_json(&iterations.show(id)?)?,
            IterationCommand::List { space } => print_json(&iterations.list(space)?)?,
            IterationCommand::Tree { space } => print!("{}", render_tree(&iterations.tree(space)?)),
            IterationCommand::Children { id } => print_json(&iterations.children(id)?)?,
            IterationCommand::Update {
                id,
                name,
                description,
                clear_description,
                state,
                start_at,
                clear_start_at,
                end_at,
                clear_end_at,
                user_active,
                version,
            } => {
                let iteration = iterations.update(
                    id,
                    UpdateIterationInput {
                        name,
                        description: nullable(description, clear_description),
                        start_at: nullable(start_at, clear_start_at),
                        end_at: nullable(end_at, clear_end_at),
                        state,
                        user_active,
                        version,
                    },
                )?;
                print_json(&iteration)?;
            }
            IterationCommand::Delete { id } => print_json(&iterations.delete(id)?)?,
        },
        Commands::Area(cmd) => match cmd {
            AreaCommand::Create { parent, name } => {
                print_json(&areas.create_child(parent, CreateAreaInput { name })?)?
            }
            AreaCommand::Show { id } => print_json(&areas.show(id)?)?,
            AreaCommand::List { space } => print_json(&areas.list(space)?)?,
            AreaCommand::Tree { space } => print!("{}", render_tree(&areas.tree(space)?)),
            AreaCommand::Children { id } => print_json(&areas.children(id)?)?,
        },
        Commands::Item(cmd) => match cmd {
            ItemCommand::Create {
                space,
                title,
                iteration,
                area,
                state,
            } => {
                let item = db.transaction(|tx| {
                    WorkItemRepository::new(tx).create(
                        space,
                        CreateWorkItemInput {
                            title,
                            state,
                            iteration_id: iteration,
                            area_id: area,
                        },
                    )
                })?;
                print_json(&item)?;
            }
            ItemCommand::Update {
                id,
                title,
                state,
                iteration,
                area,
            } => {
                let item = db.transaction(|tx| {
                    WorkItemRepository::new(tx).update(
                        id,
                        UpdateWorkItemInput {
                            title,
                            state,
                            iteration_id: iteration,
                            area_id: area,
                        },
                    )
                })?;
                print_json(&item)?;
            }
        },
    }

    Ok(())
}
