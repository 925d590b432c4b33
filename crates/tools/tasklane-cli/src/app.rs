//! Command execution on top of the session and sync layers.

use crate::cli::{Commands, TaskFields};
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::render;
use crate::terminal::{TerminalNavigator, TerminalNotifier};
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use std::path::Path;
use std::sync::Arc;
use tasklane_http::{ApiClient, FileTokenStore, TokenVault};
use tasklane_session::SessionStore;
use tasklane_sync::{CloseReason, EditFlow, TaskSync};
use tasklane_types::{Priority, Task, TaskDraft, TaskId, TaskQuery, TaskStatus};
use tracing::debug;

pub struct App {
    session: SessionStore,
    sync: TaskSync,
    flow: EditFlow,
    out: Term,
}

impl App {
    /// Wire the client stack for `config`, persisting the token at `token_path`.
    pub fn new(config: &Config, token_path: &Path) -> CliResult<Self> {
        let vault = Arc::new(TokenVault::new(FileTokenStore::new(token_path)));
        let api = ApiClient::new(
            config.client_config(),
            vault,
            Arc::new(TerminalNotifier::new()),
            Arc::new(TerminalNavigator::new()),
        )?;
        Ok(Self::with_client(api))
    }

    pub fn with_client(api: ApiClient) -> Self {
        Self {
            session: SessionStore::new(api.clone()),
            sync: TaskSync::new(api),
            flow: EditFlow::new(),
            out: Term::stdout(),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn print(&self, line: &str) {
        // Broken pipe on stdout: nothing useful left to do.
        let _ = self.out.write_line(line);
    }

    pub async fn run(&self, command: Commands) -> CliResult<()> {
        debug!(?command, "Running command");
        match command {
            Commands::Register { username } => self.register(username).await,
            Commands::Login { username } => self.login(username).await,
            Commands::Logout => {
                self.session.logout().await;
                self.print("Logged out");
                Ok(())
            }
            Commands::Whoami => {
                let user = self.require_session().await?;
                self.print(&format!("{} (id {})", style(&user.username).bold(), user.id));
                Ok(())
            }
            Commands::List { sort, search, top } => {
                self.require_session().await?;
                let query = TaskQuery::new()
                    .sort_by(sort)
                    .search(search.unwrap_or_default())
                    .top(top);
                self.list(query).await
            }
            Commands::Create { fields } => {
                self.require_session().await?;
                self.create(fields).await
            }
            Commands::Edit { id, fields } => {
                self.require_session().await?;
                self.edit(id, fields).await
            }
            Commands::Delete { id, yes } => {
                self.require_session().await?;
                self.delete(id, yes).await
            }
        }
    }

    async fn require_session(&self) -> CliResult<tasklane_types::User> {
        self.session
            .initialize()
            .await
            .user()
            .cloned()
            .ok_or(CliError::NotLoggedIn)
    }

    fn prompt_username(username: Option<String>) -> CliResult<String> {
        match username {
            Some(username) => Ok(username),
            None => Ok(Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Username")
                .interact_text()?),
        }
    }

    async fn register(&self, username: Option<String>) -> CliResult<()> {
        let username = Self::prompt_username(username)?;
        let password = Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?;

        let user = self.session.register(&username, &password).await?;
        self.print(&format!(
            "You can now sign in with: {}",
            style(format!("tasklane login -u {}", user.username)).cyan()
        ));
        Ok(())
    }

    async fn login(&self, username: Option<String>) -> CliResult<()> {
        let username = Self::prompt_username(username)?;
        let password = Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .interact()?;

        let user = self.session.login(&username, &password).await?;
        self.print(&format!("Signed in as {}", style(&user.username).bold()));
        Ok(())
    }

    async fn list(&self, query: TaskQuery) -> CliResult<()> {
        let tasks = self.sync.list(query).await?;
        for line in render::task_lines(&tasks) {
            self.print(&line);
        }
        Ok(())
    }

    async fn find_task(&self, id: TaskId) -> CliResult<Task> {
        let tasks = self.sync.list(TaskQuery::new()).await?;
        tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or(CliError::TaskNotFound(id))
    }

    async fn create(&self, fields: TaskFields) -> CliResult<()> {
        self.flow.open_create()?;
        let result = self.submit_form(fields).await;
        if result.is_err() {
            self.flow.cancel(CloseReason::CancelButton);
        }
        result
    }

    async fn edit(&self, id: TaskId, fields: TaskFields) -> CliResult<()> {
        let task = self.find_task(id).await?;
        self.flow.open_edit(task)?;
        let result = self.submit_form(fields).await;
        if result.is_err() {
            self.flow.cancel(CloseReason::CancelButton);
        }
        result
    }

    /// Fill the open form from flags, prompting for every field when none were given.
    async fn submit_form(&self, fields: TaskFields) -> CliResult<()> {
        let initial = self.flow.draft().unwrap_or_default();
        let draft = if fields.is_empty() {
            prompt_draft(initial)?
        } else {
            apply_fields(initial, fields)?
        };

        let task = self.flow.submit(draft, &self.sync).await?;
        self.print(&render::task_line(&task));
        Ok(())
    }

    async fn delete(&self, id: TaskId, yes: bool) -> CliResult<()> {
        self.flow.request_delete(id)?;

        let confirmed = yes
            || Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Delete task #{id}?"))
                .default(false)
                .interact()?;

        if !confirmed {
            self.flow.cancel(CloseReason::CancelButton);
            self.print("Nothing deleted");
            return Ok(());
        }

        let result = self.flow.confirm_delete(&self.sync).await;
        if result.is_err() {
            self.flow.cancel(CloseReason::CancelButton);
        }
        Ok(result?)
    }
}

/// Overlay command-line flags on the form's initial contents.
pub fn apply_fields(mut draft: TaskDraft, fields: TaskFields) -> CliResult<TaskDraft> {
    if let Some(title) = fields.title {
        draft.title = title;
    }
    if let Some(description) = fields.description {
        draft.description = (!description.is_empty()).then_some(description);
    }
    if let Some(status) = fields.status {
        draft.status = status;
    }
    if let Some(priority) = fields.priority {
        draft.priority = Priority::new(priority.into())?;
    }
    Ok(draft)
}

fn prompt_draft(initial: TaskDraft) -> CliResult<TaskDraft> {
    let theme = ColorfulTheme::default();

    let title: String = Input::with_theme(&theme)
        .with_prompt("Title")
        .with_initial_text(initial.title.clone())
        .interact_text()?;

    let description: String = Input::with_theme(&theme)
        .with_prompt("Description")
        .with_initial_text(initial.description.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let labels: Vec<&str> = TaskStatus::ALL.iter().map(|s| s.alias()).collect();
    let current = TaskStatus::ALL
        .iter()
        .position(|s| *s == initial.status)
        .unwrap_or(0);
    let status = Select::with_theme(&theme)
        .with_prompt("Status")
        .items(&labels)
        .default(current)
        .interact()?;

    let priority: u8 = Input::with_theme(&theme)
        .with_prompt("Priority (0-10)")
        .default(initial.priority.get())
        .validate_with(|value: &u8| -> Result<(), String> {
            Priority::new((*value).into())
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;

    apply_fields(
        initial,
        TaskFields {
            title: Some(title),
            description: Some(description),
            status: Some(TaskStatus::ALL[status]),
            priority: Some(priority),
        },
    )
}
