use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use valuecent_portal::ai::{CareerAdvisor, SuggestionService};
use valuecent_portal::auth::{Authenticator, Credentials, LoginClient};
use valuecent_portal::browser::View;
use valuecent_portal::catalog::Catalog;
use valuecent_portal::config::{self, PortalConfig};
use valuecent_portal::profile::{ProfileStore, UserProfile};
use valuecent_portal::progress::ProgressStore;
use valuecent_portal::storage::{FileStorage, Storage};
use valuecent_portal::theme::{Theme, ThemeStore};
use valuecent_portal::ui::PageInspector;
use valuecent_portal::{Portal, Services};

#[derive(Parser)]
#[command(name = "valuecent", version, about = "Valuecent training portal")]
struct Cli {
    /// Directory holding the persisted portal state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Login endpoint
    #[arg(long, global = true)]
    auth_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every course with its completion
    Courses,
    /// Show progress for all courses, or the chapters of one
    Progress { course: Option<String> },
    /// Mark a chapter complete, or incomplete if it already is
    Toggle { course: String, chapter: String },
    /// Show or set the learner profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Show the theme, or set it to light, dark or system
    Theme { mode: Option<Theme> },
    /// Check credentials against the login endpoint
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "VALUECENT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Ask the career advisor for a learning path
    Suggest { goal: Vec<String> },
    /// Render a view, e.g. '{"page":"courseDetail","courseId":"auditing"}'
    Render {
        view: String,
        /// Print the visible text instead of HTML
        #[arg(long)]
        text: bool,
        #[arg(long)]
        dark: bool,
    },
    /// Open the portal window
    Run,
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Set { name: String, title: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = PortalConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(endpoint) = cli.auth_endpoint.as_deref() {
        config.auth_endpoint = config::parse_endpoint(endpoint)?;
    }

    let catalog = Arc::new(match &config.catalog_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => Catalog::builtin()?,
    });
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(config.storage_path())?);
    let (min_ms, max_ms) = config.suggestion_delay_ms;
    let login = LoginClient::new(config.auth_endpoint.clone()).with_timeout(config.login_timeout);
    log::debug!("Login endpoint: {}", login.endpoint());
    let services = Services {
        auth: Arc::new(login),
        advisor: Arc::new(CareerAdvisor::with_delay(min_ms, max_ms)),
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;

    match cli.command {
        Commands::Courses => {
            let progress = ProgressStore::new(storage);
            for course in catalog.courses() {
                let marker = if course.featured { " *" } else { "" };
                if course.has_chapters() {
                    println!(
                        "{:<36} {:>3}%  {}{}",
                        course.id,
                        progress.course_progress(course),
                        course.title,
                        marker
                    );
                } else {
                    println!("{:<36}    -  {}{}", course.id, course.title, marker);
                }
            }
        }
        Commands::Progress { course: None } => {
            let progress = ProgressStore::new(storage);
            for course in catalog.courses().iter().filter(|c| c.has_chapters()) {
                println!(
                    "{:<36} {:>2}/{:<2} {:>3}%",
                    course.id,
                    progress.completed_count(course),
                    course.chapters.len(),
                    progress.course_progress(course)
                );
            }
        }
        Commands::Progress {
            course: Some(course_id),
        } => {
            let Some(course) = catalog.find(&course_id) else {
                bail!("Unknown course '{}'", course_id);
            };
            let progress = ProgressStore::new(storage);
            println!("{} ({}%)", course.title, progress.course_progress(course));
            for chapter in &course.chapters {
                let mark = if progress.is_chapter_complete(&course.id, &chapter.title) {
                    "x"
                } else {
                    " "
                };
                println!("  [{}] {}", mark, chapter.title);
            }
        }
        Commands::Toggle { course, chapter } => {
            if catalog.find_chapter(&course, &chapter).is_none() {
                bail!("Course '{}' has no chapter '{}'", course, chapter);
            }
            let progress = ProgressStore::new(storage);
            progress.toggle_chapter_complete(&course, &chapter);
            let state = if progress.is_chapter_complete(&course, &chapter) {
                "complete"
            } else {
                "incomplete"
            };
            println!("{}: {} marked {}", course, chapter, state);
        }
        Commands::Profile {
            action: ProfileAction::Show,
        } => match ProfileStore::new(storage).profile() {
            Some(profile) => println!("{} ({})", profile.name, profile.title),
            None => println!("No profile set"),
        },
        Commands::Profile {
            action: ProfileAction::Set { name, title },
        } => {
            let profile = UserProfile::new(name, title);
            if !profile.is_complete() {
                bail!("Both name and title are required");
            }
            ProfileStore::new(storage).save_profile(profile);
            println!("Profile saved");
        }
        Commands::Theme { mode } => {
            let themes = ThemeStore::new(storage);
            if let Some(mode) = mode {
                themes.set_theme(mode);
            }
            println!("{}", themes.theme());
        }
        Commands::Login { username, password } => {
            let credentials = Credentials::new(username, password);
            if !credentials.is_complete() {
                bail!("Username and password are required");
            }
            runtime.block_on(services.auth.login(&credentials))?;
            println!("Signed in as {}", credentials.username);
        }
        Commands::Suggest { goal } => {
            let goal = goal.join(" ");
            if goal.trim().is_empty() {
                bail!("Describe a career goal");
            }
            println!("{}", runtime.block_on(services.advisor.suggest(&goal)));
        }
        Commands::Render { view, text, dark } => {
            let view: View = serde_json::from_str(&view).context("Invalid view")?;
            let mut portal = Portal::new(catalog, storage, services);
            portal.assume_authenticated();
            portal.navigate(view);

            let html = portal.render(dark);
            if text {
                println!("{}", PageInspector::new().extract_text(&html)?);
            } else {
                println!("{}", html);
            }
        }
        Commands::Run => {
            info!("Starting Valuecent portal, data in {}", config.data_dir.display());
            run_window(Portal::new(catalog, storage, services), runtime)?;
        }
    }

    Ok(())
}

#[cfg(feature = "webview")]
fn run_window(portal: Portal, runtime: tokio::runtime::Runtime) -> Result<()> {
    // Must run on main thread on macOS
    valuecent_portal::browser::Browser::new(portal, runtime).run()
}

#[cfg(not(feature = "webview"))]
fn run_window(_portal: Portal, _runtime: tokio::runtime::Runtime) -> Result<()> {
    bail!("This build has no window support; rebuild with --features webview")
}
