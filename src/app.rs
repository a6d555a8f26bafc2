//! The portal session: history, stores and the authentication gate.

use crate::ai::SuggestionService;
use crate::auth::{Authenticator, Credentials};
use crate::browser::{History, View};
use crate::catalog::Catalog;
use crate::error::AuthError;
use crate::profile::{ProfileStore, UserProfile, USER_PROFILE_STORAGE_KEY};
use crate::progress::{ProgressStore, PROGRESS_STORAGE_KEY};
use crate::storage::{Listener, Storage, Subscription};
use crate::theme::{Theme, ThemeStore};
use crate::ui::layout::{self, Chrome};
use crate::ui::{render_page, Page, RenderContext};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// User intent posted by the rendered pages as `{"op": ..., "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload", rename_all = "camelCase")]
pub enum Command {
    Back,
    Forward,
    Navigate(View),
    #[serde(rename_all = "camelCase")]
    ToggleChapter {
        course_id: String,
        chapter_title: String,
    },
    SetTheme {
        theme: Theme,
    },
    SaveProfile(UserProfile),
    Login(Credentials),
    Logout,
    ToggleSidebar,
    Suggest {
        goal: String,
    },
}

impl Command {
    pub fn parse(message: &str) -> serde_json::Result<Self> {
        serde_json::from_str(message)
    }
}

/// What the host has to do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Update {
    pub rerender: bool,
    pub scroll_to_top: bool,
}

impl Update {
    pub const NONE: Update = Update {
        rerender: false,
        scroll_to_top: false,
    };

    pub const RERENDER: Update = Update {
        rerender: true,
        scroll_to_top: false,
    };

    pub const NAVIGATED: Update = Update {
        rerender: true,
        scroll_to_top: true,
    };
}

/// Outcome of a background command, fed back through [`Portal::complete`].
#[derive(Debug)]
pub enum Completion {
    Login {
        username: String,
        result: Result<(), AuthError>,
    },
    Suggestion {
        goal: String,
        answer: String,
    },
}

/// Background work started by [`Portal::dispatch`]. Owns everything it needs.
pub type PendingTask = Pin<Box<dyn Future<Output = Completion> + Send + 'static>>;

pub enum Dispatch {
    Done(Update),
    /// `update` applies now; `task` resolves to a [`Completion`] later.
    Pending { update: Update, task: PendingTask },
}

/// What the window currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen<'a> {
    Login { error: Option<&'a str> },
    Welcome,
    Main(Page<'a>),
}

/// External capabilities handed to the portal.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn Authenticator>,
    pub advisor: Arc<dyn SuggestionService>,
}

pub struct Portal {
    catalog: Arc<Catalog>,
    storage: Arc<dyn Storage>,
    history: History,
    progress: ProgressStore,
    profile: ProfileStore,
    theme: ThemeStore,
    services: Services,
    authenticated: bool,
    sidebar_open: bool,
    last_username: String,
    login_error: Option<String>,
    career_goal: String,
    suggestion: Option<String>,
}

impl Portal {
    pub fn new(catalog: Arc<Catalog>, storage: Arc<dyn Storage>, services: Services) -> Self {
        Self {
            catalog,
            history: History::new(),
            progress: ProgressStore::new(storage.clone()),
            profile: ProfileStore::new(storage.clone()),
            theme: ThemeStore::new(storage.clone()),
            storage,
            services,
            authenticated: false,
            sidebar_open: true,
            last_username: String::new(),
            login_error: None,
            career_goal: String::new(),
            suggestion: None,
        }
    }

    /// Calls `listener` after progress or the profile change in storage,
    /// including writes by other windows. The stores have reloaded by then.
    pub fn subscribe_changes(&self, listener: Listener) -> Vec<Subscription> {
        [PROGRESS_STORAGE_KEY, USER_PROFILE_STORAGE_KEY]
            .into_iter()
            .map(|key| self.storage.subscribe(key, Arc::clone(&listener)))
            .collect()
    }

    /// Runs `command` to the end, awaiting any background work inline.
    pub async fn apply(&mut self, command: Command) -> Update {
        let dispatch = self.dispatch(command);
        self.finish(dispatch).await
    }

    /// Applies the synchronous part of `command`. Login and suggestion requests
    /// come back as a [`PendingTask`] for the host to run off its UI thread.
    pub fn dispatch(&mut self, command: Command) -> Dispatch {
        if !self.authenticated && !matches!(command, Command::Login(_) | Command::SetTheme { .. }) {
            log::debug!("ignoring {:?} before login", command);
            return Dispatch::Done(Update::NONE);
        }

        let update = match command {
            Command::Back => self.back(),
            Command::Forward => self.forward(),
            Command::Navigate(view) => self.navigate(view),
            Command::ToggleChapter {
                course_id,
                chapter_title,
            } => self.toggle_chapter(&course_id, &chapter_title),
            Command::SetTheme { theme } => self.set_theme(theme),
            Command::SaveProfile(profile) => self.save_profile(profile),
            Command::Login(credentials) => return self.begin_login(credentials),
            Command::Logout => self.logout(),
            Command::ToggleSidebar => self.toggle_sidebar(),
            Command::Suggest { goal } => return self.begin_suggest(goal),
        };
        Dispatch::Done(update)
    }

    /// Applies the result of a task returned by [`Portal::dispatch`]. Results
    /// are applied in arrival order, so the last one to finish wins.
    pub fn complete(&mut self, completion: Completion) -> Update {
        match completion {
            Completion::Login { username, result } => match result {
                Ok(()) => {
                    log::info!("{} signed in", username);
                    self.authenticated = true;
                    self.login_error = None;
                    Update::RERENDER
                }
                Err(_) if self.authenticated => Update::NONE,
                Err(e) => {
                    self.login_error = Some(e.to_string());
                    Update::RERENDER
                }
            },
            Completion::Suggestion { goal, answer } => {
                if !self.authenticated {
                    log::debug!("dropping suggestion that finished after logout");
                    return Update::NONE;
                }
                self.career_goal = goal;
                self.suggestion = Some(answer);
                Update::RERENDER
            }
        }
    }

    async fn finish(&mut self, dispatch: Dispatch) -> Update {
        match dispatch {
            Dispatch::Done(update) => update,
            Dispatch::Pending { task, .. } => {
                let completion = task.await;
                self.complete(completion)
            }
        }
    }

    pub fn navigate(&mut self, view: View) -> Update {
        if self.history.navigate(view) {
            Update::NAVIGATED
        } else {
            Update::NONE
        }
    }

    pub fn back(&mut self) -> Update {
        match self.history.go_back() {
            Some(_) => Update::RERENDER,
            None => Update::NONE,
        }
    }

    pub fn forward(&mut self) -> Update {
        match self.history.go_forward() {
            Some(_) => Update::RERENDER,
            None => Update::NONE,
        }
    }

    pub fn toggle_chapter(&mut self, course_id: &str, chapter_title: &str) -> Update {
        self.progress.toggle_chapter_complete(course_id, chapter_title);
        Update::RERENDER
    }

    pub fn set_theme(&mut self, theme: Theme) -> Update {
        if self.theme.theme() == theme {
            return Update::NONE;
        }
        self.theme.set_theme(theme);
        Update::RERENDER
    }

    /// Saves the welcome form. Incomplete profiles are ignored.
    pub fn save_profile(&mut self, profile: UserProfile) -> Update {
        if !profile.is_complete() {
            log::debug!("ignoring incomplete profile");
            return Update::NONE;
        }
        self.profile.save_profile(profile);
        Update::RERENDER
    }

    pub async fn login(&mut self, credentials: Credentials) -> Update {
        let dispatch = self.begin_login(credentials);
        self.finish(dispatch).await
    }

    fn begin_login(&mut self, credentials: Credentials) -> Dispatch {
        if !credentials.is_complete() {
            return Dispatch::Done(Update::NONE);
        }
        self.last_username = credentials.username.clone();
        self.login_error = None;

        let auth = Arc::clone(&self.services.auth);
        Dispatch::Pending {
            update: Update::NONE,
            task: Box::pin(async move {
                let result = auth.login(&credentials).await;
                Completion::Login {
                    username: credentials.username,
                    result,
                }
            }),
        }
    }

    /// Skips the login gate, for offline previews of stored state.
    pub fn assume_authenticated(&mut self) {
        self.authenticated = true;
        self.login_error = None;
    }

    pub fn logout(&mut self) -> Update {
        log::info!("signed out");
        self.authenticated = false;
        self.history.reset();
        self.login_error = None;
        self.career_goal.clear();
        self.suggestion = None;
        Update::RERENDER
    }

    pub fn toggle_sidebar(&mut self) -> Update {
        self.sidebar_open = !self.sidebar_open;
        Update::RERENDER
    }

    /// Asks the advisor about `goal`; the latest answer replaces any earlier one.
    pub async fn suggest(&mut self, goal: String) -> Update {
        let dispatch = self.begin_suggest(goal);
        self.finish(dispatch).await
    }

    fn begin_suggest(&mut self, goal: String) -> Dispatch {
        if goal.trim().is_empty() {
            return Dispatch::Done(Update::NONE);
        }
        self.career_goal = goal.clone();
        self.suggestion = None;

        let advisor = Arc::clone(&self.services.advisor);
        Dispatch::Pending {
            update: Update::RERENDER,
            task: Box::pin(async move {
                let answer = advisor.suggest(&goal).await;
                Completion::Suggestion { goal, answer }
            }),
        }
    }

    pub fn screen(&self) -> Screen<'_> {
        if !self.authenticated {
            Screen::Login {
                error: self.login_error.as_deref(),
            }
        } else if !self.profile.is_profile_set() {
            Screen::Welcome
        } else {
            Screen::Main(Page::resolve(self.history.current(), &self.catalog))
        }
    }

    /// Full HTML document for the current screen.
    pub fn render(&self, system_prefers_dark: bool) -> String {
        let theme = self.theme.effective(system_prefers_dark);
        match self.screen() {
            Screen::Login { error } => layout::document(
                &layout::page_title("Sign In"),
                theme,
                &layout::login_screen(&self.last_username, error),
            ),
            Screen::Welcome => layout::document(
                &layout::page_title("Welcome"),
                theme,
                &layout::welcome_screen(),
            ),
            Screen::Main(page) => {
                let ctx = RenderContext {
                    catalog: &self.catalog,
                    progress: &self.progress,
                    profile: self.profile.profile(),
                    theme: self.theme.theme(),
                    career_goal: &self.career_goal,
                    suggestion: self.suggestion.as_deref(),
                };
                let chrome = Chrome {
                    catalog: &self.catalog,
                    current: self.history.current(),
                    shown: page.kind(),
                    sidebar_open: self.sidebar_open,
                    can_go_back: self.history.can_go_back(),
                    can_go_forward: self.history.can_go_forward(),
                };
                let main = render_page(&page, &ctx);
                layout::document(
                    &layout::page_title(&page.title()),
                    theme,
                    &layout::app_shell(&chrome, &main),
                )
            }
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::storage::{MemoryStorage, StorageEvent};
    use crate::ui::PageInspector;
    use async_trait::async_trait;

    struct FakeAuth;

    #[async_trait]
    impl Authenticator for FakeAuth {
        async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
            if credentials.password == "secret" {
                Ok(())
            } else {
                Err(AuthError::Rejected {
                    status: 401,
                    message: "Invalid username or password".to_string(),
                })
            }
        }
    }

    struct FixedAdvisor(&'static str);

    #[async_trait]
    impl SuggestionService for FixedAdvisor {
        async fn suggest(&self, _goal: &str) -> String {
            self.0.to_string()
        }
    }

    fn services() -> Services {
        Services {
            auth: Arc::new(FakeAuth),
            advisor: Arc::new(FixedAdvisor("Take Auditing next.")),
        }
    }

    fn portal(storage: &MemoryStorage) -> Portal {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        Portal::new(catalog, Arc::new(storage.clone()), services())
    }

    async fn signed_in(storage: &MemoryStorage) -> Portal {
        let mut portal = portal(storage);
        portal.login(Credentials::new("asha", "secret")).await;
        portal.save_profile(UserProfile::new("Asha", "Tax Associate"));
        portal
    }

    #[tokio::test]
    async fn test_gate_goes_login_welcome_main() {
        let storage = MemoryStorage::new();
        let mut portal = portal(&storage);
        assert_eq!(portal.screen(), Screen::Login { error: None });

        portal.login(Credentials::new("asha", "wrong")).await;
        assert_eq!(
            portal.screen(),
            Screen::Login {
                error: Some("Invalid username or password")
            }
        );

        portal.login(Credentials::new("asha", "secret")).await;
        assert_eq!(portal.screen(), Screen::Welcome);

        assert_eq!(portal.save_profile(UserProfile::new("Asha", " ")), Update::NONE);
        assert_eq!(portal.screen(), Screen::Welcome);

        portal.save_profile(UserProfile::new("Asha", "Tax Associate"));
        assert_eq!(portal.screen(), Screen::Main(Page::Home));
    }

    #[tokio::test]
    async fn test_commands_ignored_before_login() {
        let storage = MemoryStorage::new();
        let mut portal = portal(&storage);
        let update = portal.apply(Command::Navigate(View::Courses)).await;
        assert_eq!(update, Update::NONE);
        assert_eq!(portal.history().len(), 1);
    }

    #[tokio::test]
    async fn test_navigation_updates() {
        let storage = MemoryStorage::new();
        let mut portal = signed_in(&storage).await;

        assert_eq!(portal.navigate(View::Courses), Update::NAVIGATED);
        assert_eq!(portal.navigate(View::Courses), Update::NONE);
        assert_eq!(portal.back(), Update::RERENDER);
        assert_eq!(portal.back(), Update::NONE);
        assert_eq!(portal.forward(), Update::RERENDER);
        assert_eq!(portal.history().current(), &View::Courses);
    }

    #[tokio::test]
    async fn test_logout_resets_history_but_keeps_profile() {
        let storage = MemoryStorage::new();
        let mut portal = signed_in(&storage).await;
        portal.navigate(View::Courses);
        portal.navigate(View::Settings);

        portal.apply(Command::Logout).await;

        assert!(!portal.is_authenticated());
        assert_eq!(portal.history().entries(), &[View::Home]);
        assert!(portal.profile().is_profile_set());
    }

    #[tokio::test]
    async fn test_json_commands_drive_the_portal() {
        let storage = MemoryStorage::new();
        let mut portal = signed_in(&storage).await;

        let messages = [
            r#"{"op":"navigate","payload":{"page":"courseDetail","courseId":"auditing"}}"#,
            r#"{"op":"toggleChapter","payload":{"courseId":"auditing","chapterTitle":"Chapter 2: The Audit Process"}}"#,
            r#"{"op":"setTheme","payload":{"theme":"dark"}}"#,
            r#"{"op":"toggleSidebar"}"#,
        ];
        for message in messages {
            let command = Command::parse(message).unwrap();
            assert!(portal.apply(command).await.rerender, "{message}");
        }

        assert!(portal
            .progress()
            .is_chapter_complete("auditing", "Chapter 2: The Audit Process"));
        assert_eq!(portal.theme().theme(), Theme::Dark);

        let html = portal.render(false);
        assert!(html.contains(r#"class="dark""#));
        assert!(html.contains("14% Complete"));
        assert!(html.contains("sidebar collapsed"));
    }

    #[tokio::test]
    async fn test_unknown_course_renders_course_list() {
        let storage = MemoryStorage::new();
        let mut portal = signed_in(&storage).await;
        portal.navigate(View::course_detail("astrophysics"));

        assert_eq!(portal.screen(), Screen::Main(Page::Courses));
        let title = PageInspector::new()
            .extract_title(&portal.render(false))
            .unwrap();
        assert_eq!(title.as_deref(), Some("VALUECENT · Courses"));
    }

    #[tokio::test]
    async fn test_course_link_without_id_shows_course_list() {
        let storage = MemoryStorage::new();
        let mut portal = signed_in(&storage).await;

        let command = Command::parse(r#"{"op":"navigate","payload":{"page":"courseDetail"}}"#).unwrap();
        assert_eq!(portal.apply(command).await, Update::NAVIGATED);
        assert_eq!(portal.screen(), Screen::Main(Page::Courses));
    }

    #[tokio::test]
    async fn test_suggestion_is_shown() {
        let storage = MemoryStorage::new();
        let mut portal = signed_in(&storage).await;

        assert_eq!(portal.suggest("   ".to_string()).await, Update::NONE);
        portal.suggest("become an audit manager".to_string()).await;

        assert_eq!(portal.suggestion(), Some("Take Auditing next."));
        let text = PageInspector::new().extract_text(&portal.render(false)).unwrap();
        assert!(text.contains("Take Auditing next."));
    }

    struct EchoAdvisor;

    #[async_trait]
    impl SuggestionService for EchoAdvisor {
        async fn suggest(&self, goal: &str) -> String {
            format!("Path for {goal}")
        }
    }

    fn echo_portal(storage: &MemoryStorage) -> Portal {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        let services = Services {
            auth: Arc::new(FakeAuth),
            advisor: Arc::new(EchoAdvisor),
        };
        let mut portal = Portal::new(catalog, Arc::new(storage.clone()), services);
        portal.assume_authenticated();
        portal.save_profile(UserProfile::new("Asha", "Tax Associate"));
        portal
    }

    fn pending(dispatch: Dispatch) -> (Update, PendingTask) {
        match dispatch {
            Dispatch::Pending { update, task } => (update, task),
            Dispatch::Done(update) => panic!("expected background work, got {update:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_runs_as_background_task() {
        let storage = MemoryStorage::new();
        let mut portal = portal(&storage);

        let blank = portal.dispatch(Command::Login(Credentials::new("", "")));
        assert!(matches!(blank, Dispatch::Done(update) if update == Update::NONE));

        let (update, task) = pending(portal.dispatch(Command::Login(Credentials::new("asha", "secret"))));
        assert_eq!(update, Update::NONE);
        assert!(!portal.is_authenticated());

        let completion = tokio::spawn(task).await.unwrap();
        assert_eq!(portal.complete(completion), Update::RERENDER);
        assert_eq!(portal.screen(), Screen::Welcome);
    }

    #[tokio::test]
    async fn test_last_finished_suggestion_wins() {
        let storage = MemoryStorage::new();
        let mut portal = echo_portal(&storage);

        let (_, first) = pending(portal.dispatch(Command::Suggest {
            goal: "audit manager".to_string(),
        }));
        let (update, second) = pending(portal.dispatch(Command::Suggest {
            goal: "tax advisor".to_string(),
        }));
        assert_eq!(update, Update::RERENDER);
        assert_eq!(portal.suggestion(), None);

        let second = tokio::spawn(second).await.unwrap();
        let first = tokio::spawn(first).await.unwrap();
        portal.complete(second);
        portal.complete(first);

        assert_eq!(portal.suggestion(), Some("Path for audit manager"));
    }

    #[tokio::test]
    async fn test_suggestion_finishing_after_logout_is_dropped() {
        let storage = MemoryStorage::new();
        let mut portal = echo_portal(&storage);

        let (_, task) = pending(portal.dispatch(Command::Suggest {
            goal: "audit manager".to_string(),
        }));
        portal.logout();

        assert_eq!(portal.complete(task.await), Update::NONE);
        assert_eq!(portal.suggestion(), None);
    }

    #[tokio::test]
    async fn test_two_windows_share_progress() {
        let storage = MemoryStorage::new();
        let mut first = signed_in(&storage).await;
        let second = signed_in(&storage).await;

        first.toggle_chapter("marketing", "Chapter 1: Introduction to Marketing");

        let course = second.catalog().find("marketing").unwrap().clone();
        assert_eq!(second.progress().course_progress(&course), 10);
    }

    #[tokio::test]
    async fn test_change_listener_hears_other_window() {
        let storage = MemoryStorage::new();
        let mut first = signed_in(&storage).await;
        let second = signed_in(&storage).await;

        let hits = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = hits.clone();
        let second_progress = second.progress().clone();
        let _subscriptions = second.subscribe_changes(Arc::new(move |event: &StorageEvent| {
            let seen = second_progress.is_chapter_complete("auditing", "Chapter 2: The Audit Process");
            sink.lock().push((event.key.clone(), seen));
        }));

        first.toggle_chapter("auditing", "Chapter 2: The Audit Process");

        assert_eq!(*hits.lock(), vec![(PROGRESS_STORAGE_KEY.to_string(), true)]);
    }

    #[tokio::test]
    async fn test_every_rendered_action_is_a_command() {
        let storage = MemoryStorage::new();
        let mut portal = signed_in(&storage).await;
        let inspector = PageInspector::new();

        let views = [
            View::Home,
            View::Courses,
            View::course_detail("what-valuecent-does"),
            View::chapter_video("what-valuecent-does", "Core Services Explained"),
            View::Community,
            View::Profile,
            View::Settings,
        ];
        for view in views {
            portal.navigate(view);
            let html = portal.render(true);
            for action in inspector.extract_actions(&html).unwrap() {
                let mut message = serde_json::json!({ "op": action.op });
                if let Some(payload) = action.payload {
                    message["payload"] = payload;
                }
                let parsed: Result<Command, _> = serde_json::from_value(message.clone());
                assert!(parsed.is_ok(), "{message} is not a command");
            }
        }
    }
}
