//! `shelf` — developer CLI for the Open Shelf catalog service.
//!
//! Every adapter operation is reachable from here, which makes the
//! binary a convenient smoke test against a live service:
//!
//! ```text
//! shelf resources list --type book --search rust
//! shelf favorites add --user <uuid> --resource <uuid>
//! shelf progress set --user <uuid> --resource <uuid> --percent 100
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use uuid::Uuid;

use openshelf_client::{
    DifficultyLevel, Resource, ResourceFilters, ResourceType, ShelfClient,
};

#[derive(Parser)]
#[command(name = "shelf", about = "Developer CLI for the Open Shelf catalog service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List categories
    Categories,
    /// Browse and inspect resources
    Resources {
        #[command(subcommand)]
        command: ResourcesCmd,
    },
    /// Manage a user's favorites
    Favorites {
        #[command(subcommand)]
        command: FavoritesCmd,
    },
    /// Record and inspect learning progress
    Progress {
        #[command(subcommand)]
        command: ProgressCmd,
    },
    /// Account operations
    Auth {
        #[command(subcommand)]
        command: AuthCmd,
    },
}

#[derive(Subcommand)]
enum ResourcesCmd {
    /// List published resources, newest first
    List {
        /// Filter by owning category id
        #[arg(long)]
        category: Option<Uuid>,
        /// Filter by resource type (book, video, article, course, guide, reference)
        #[arg(long = "type")]
        resource_type: Option<ResourceType>,
        /// Filter by difficulty (beginner, intermediate, advanced)
        #[arg(long)]
        difficulty: Option<DifficultyLevel>,
        /// Substring search over title, description and author
        #[arg(long)]
        search: Option<String>,
        /// Only featured resources
        #[arg(long)]
        featured: bool,
    },
    /// Show one resource and bump its view counter
    Show { id: Uuid },
    /// Record a download of a resource
    Download { id: Uuid },
}

#[derive(Subcommand)]
enum FavoritesCmd {
    /// List a user's favorites, newest first
    List {
        #[arg(long)]
        user: Uuid,
    },
    /// Favorite a resource
    Add {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        resource: Uuid,
    },
    /// Unfavorite a resource (succeeds even if absent)
    Remove {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        resource: Uuid,
    },
    /// Check whether a resource is favorited
    Check {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        resource: Uuid,
    },
}

#[derive(Subcommand)]
enum ProgressCmd {
    /// Upsert progress for a (user, resource) pair
    Set {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        resource: Uuid,
        /// Percentage complete, 0-100
        #[arg(long)]
        percent: u8,
    },
    /// List a user's progress, most recently updated first
    List {
        #[arg(long)]
        user: Uuid,
    },
}

#[derive(Subcommand)]
enum AuthCmd {
    /// Register an account
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in and show the resulting session
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = ShelfClient::from_env().context("loading service configuration")?;

    match cli.command {
        Command::Categories => list_categories(&client).await,
        Command::Resources { command } => resources(&client, command).await,
        Command::Favorites { command } => favorites(&client, command).await,
        Command::Progress { command } => progress(&client, command).await,
        Command::Auth { command } => auth(&client, command).await,
    }
}

async fn list_categories(client: &ShelfClient) -> Result<()> {
    let categories = client.categories().get_all().await?;
    for category in &categories {
        println!(
            "{}  {}  {}",
            category.id.to_string().dimmed(),
            category.icon,
            category.name.bold()
        );
    }
    println!("{} categories", categories.len());
    Ok(())
}

async fn resources(client: &ShelfClient, command: ResourcesCmd) -> Result<()> {
    match command {
        ResourcesCmd::List {
            category,
            resource_type,
            difficulty,
            search,
            featured,
        } => {
            let filters = ResourceFilters {
                category_id: category,
                resource_type,
                difficulty_level: difficulty,
                search,
                featured: featured.then_some(true),
            };
            let resources = client.resources().get_all(&filters).await?;
            for resource in &resources {
                print_resource_line(resource);
            }
            println!("{} resources", resources.len());
        }
        ResourcesCmd::Show { id } => {
            let resource = client.resources().get_by_id(id).await?;
            client.resources().increment_views(id).await?;

            println!("{}", resource.title.bold());
            println!("by {}", resource.author);
            if let Some(category) = &resource.category {
                println!("category: {}", category.name);
            }
            println!(
                "{} / {} — {} views, {} downloads",
                resource.resource_type,
                resource.difficulty_level,
                resource.views_count,
                resource.downloads_count
            );
            if !resource.tags.is_empty() {
                println!("tags: {}", resource.tags.join(", "));
            }
            println!();
            println!("{}", resource.description);
        }
        ResourcesCmd::Download { id } => {
            let resource = client.resources().get_by_id(id).await?;
            client.resources().increment_downloads(id).await?;
            println!("{} {}", "recorded download of".green(), resource.title.bold());
        }
    }
    Ok(())
}

async fn favorites(client: &ShelfClient, command: FavoritesCmd) -> Result<()> {
    match command {
        FavoritesCmd::List { user } => {
            let favorites = client.favorites().for_user(user).await?;
            for favorite in &favorites {
                match &favorite.resource {
                    Some(resource) => print_resource_line(resource),
                    None => println!("{}", favorite.resource_id),
                }
            }
            println!("{} favorites", favorites.len());
        }
        FavoritesCmd::Add { user, resource } => {
            client.favorites().add(user, resource).await?;
            println!("{}", "favorited".green());
        }
        FavoritesCmd::Remove { user, resource } => {
            client.favorites().remove(user, resource).await?;
            println!("{}", "removed".green());
        }
        FavoritesCmd::Check { user, resource } => {
            let favorited = client.favorites().check(user, resource).await?;
            println!("{}", if favorited { "yes" } else { "no" });
        }
    }
    Ok(())
}

async fn progress(client: &ShelfClient, command: ProgressCmd) -> Result<()> {
    match command {
        ProgressCmd::Set {
            user,
            resource,
            percent,
        } => {
            let entry = client.progress().update(user, resource, percent).await?;
            match entry.completed_at {
                Some(at) => println!("{} at {}", "completed".green().bold(), at),
                None => println!("{}%", entry.progress_percentage),
            }
        }
        ProgressCmd::List { user } => {
            let entries = client.progress().for_user(user).await?;
            for entry in &entries {
                let title = entry
                    .resource
                    .as_ref()
                    .map(|r| r.title.as_str())
                    .unwrap_or("(unknown resource)");
                let status = if entry.completed_at.is_some() {
                    "done".green().to_string()
                } else {
                    format!("{}%", entry.progress_percentage)
                };
                println!("{status:>5}  {title}");
            }
        }
    }
    Ok(())
}

async fn auth(client: &ShelfClient, command: AuthCmd) -> Result<()> {
    match command {
        AuthCmd::SignUp { email, password } => {
            let data = client.auth().sign_up(&email, &password).await?;
            match data.session {
                Some(_) => println!("{}", "signed up and confirmed".green()),
                None => println!("{}", "signed up — confirmation pending".yellow()),
            }
        }
        AuthCmd::SignIn { email, password } => {
            let data = client.auth().sign_in(&email, &password).await?;
            let user = client.auth().get_user().await?;
            if let Some(user) = user {
                println!(
                    "{} {}",
                    "signed in as".green(),
                    user.email.as_deref().unwrap_or("(no email)").bold()
                );
                println!("user id: {}", user.id);
            }
            if let Some(session) = data.session {
                println!("access token: {}", session.access_token.dimmed());
            }
        }
    }
    Ok(())
}

fn print_resource_line(resource: &Resource) {
    let featured = if resource.is_featured { "★ " } else { "" };
    println!(
        "{}  {}{}  {} — {} [{}]",
        resource.id.to_string().dimmed(),
        featured.yellow(),
        resource.title.bold(),
        resource.author,
        resource.resource_type,
        resource.difficulty_level
    );
}
