//! Command handlers.
//!
//! `App` wires the core services together once per run, the way a front end
//! would at startup, and renders each flow's state inline. Handlers return
//! `false` when the command failed in a way the user has already been told
//! about.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use chunker_core::auth::{can_add_password_char, can_add_username_char, open_store};
use chunker_core::{
    AuthGate, Config, Credentials, FlowError, Navigation, RequestClient, Route, SessionFlow,
    UploadFlow, UploadStatus, UploadableFile, ValidationError,
};

use crate::render;

/// Environment variables that pre-fill the login prompt
const USERNAME_ENV: &str = "CHUNKER_USERNAME";
const PASSWORD_ENV: &str = "CHUNKER_PASSWORD";

pub struct App {
    config: Config,
    client: Arc<RequestClient>,
    gate: AuthGate,
    session: SessionFlow,
    upload: UploadFlow,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let store = open_store(&config)?;
        let client = Arc::new(RequestClient::new(&config, store.clone())?);
        debug!("Core services ready");

        Ok(Self {
            gate: AuthGate::new(store),
            session: SessionFlow::new(client.clone()),
            upload: UploadFlow::new(client.clone()),
            client,
            config,
        })
    }

    pub fn backend_url(&self) -> &str {
        self.client.base_url().as_str()
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub async fn login(&self, username: Option<String>) -> Result<bool> {
        let username = match username
            .or_else(|| std::env::var(USERNAME_ENV).ok())
            .filter(|u| !u.trim().is_empty())
        {
            Some(u) => u,
            None => self.prompt_username()?,
        };
        let password = match std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => rpassword::prompt_password("Password: ")?,
        };
        if !is_acceptable_password(&password) {
            eprintln!("Error: Password is too long or contains control characters");
            return Ok(false);
        }

        println!("Authenticating...");
        match self
            .session
            .submit(Credentials::new(username.clone(), password))
            .await
        {
            Ok(route) => {
                if let Err(e) = Config::remember_username(&username) {
                    warn!(error = %e, "Failed to save config");
                }
                println!("Login successful");
                println!("{}", render::navigation(&self.gate.navigate(route.path())));
                Ok(true)
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                Ok(false)
            }
        }
    }

    fn prompt_username(&self) -> Result<String> {
        match self.config.last_username {
            Some(ref last) => print!("Username [{}]: ", last),
            None => print!("Username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = sanitize_username(input.trim());

        if input.is_empty() {
            Ok(self.config.last_username.clone().unwrap_or_default())
        } else {
            Ok(input)
        }
    }

    pub fn logout(&self) -> bool {
        match self.session.logout() {
            Ok(route) => {
                println!("Logged out");
                println!("{}", render::navigation(&self.gate.navigate(route.path())));
                true
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                false
            }
        }
    }

    pub fn status(&self) -> bool {
        if self.gate.is_authenticated() {
            println!("Logged in ({})", self.backend_url());
        } else {
            println!("Not logged in");
        }
        true
    }

    pub fn open(&self, path: &str) -> bool {
        println!("{}", render::navigation(&self.gate.navigate(path)));
        true
    }

    /// Gate for commands that belong to the dashboard.
    fn require_session(&self) -> bool {
        match self.gate.navigate(Route::DASHBOARD_PATH) {
            Navigation::Render(_) => true,
            Navigation::Redirect(_) => {
                eprintln!("Not logged in - run `chunker login` first");
                false
            }
        }
    }

    /// Tell the user when a protected call has just ended the session.
    fn report_session_loss(&self) {
        if !self.gate.is_authenticated() {
            eprintln!("Session ended - run `chunker login` again");
        }
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub async fn upload(&self, path: &Path) -> bool {
        if !self.require_session() {
            return false;
        }

        let file = match UploadableFile::from_path(path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                return false;
            }
        };

        if let Err(err) = self.upload.select_file(file) {
            eprintln!("Error: {}", err);
            return false;
        }
        if let Some(line) = render::upload_status(&self.upload.status()) {
            println!("{}", line);
        }

        let mut rx = self.upload.subscribe();
        // Only transitions caused by this submit are rendered below
        drop(rx.borrow_and_update());
        let watch = async {
            while rx.changed().await.is_ok() {
                let status = rx.borrow_and_update().clone();
                if let Some(line) = render::upload_status(&status) {
                    match status {
                        UploadStatus::Failed(_) => eprintln!("{}", line),
                        _ => println!("{}", line),
                    }
                }
                if matches!(status, UploadStatus::Succeeded(_) | UploadStatus::Failed(_)) {
                    break;
                }
            }
        };
        let (result, ()) = tokio::join!(self.upload.submit(), watch);

        match result {
            Ok(_) => true,
            Err(FlowError::Authentication(_)) => {
                self.report_session_loss();
                false
            }
            Err(_) => false,
        }
    }

    pub async fn files(&self) -> bool {
        if !self.require_session() {
            return false;
        }
        match self.client.list_files().await {
            Ok(files) => {
                println!("{}", render::files_table(&files));
                true
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                self.report_session_loss();
                false
            }
        }
    }

    pub async fn chunk(&self, path: &Path) -> bool {
        if !self.require_session() {
            return false;
        }

        let file = match UploadableFile::from_path(path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                return false;
            }
        };
        if !file.is_markdown() {
            let err = ValidationError::InvalidFileType {
                name: file.name.clone(),
                media_type: file.media_type.clone(),
            };
            eprintln!("Error: {}", err);
            return false;
        }
        let content = match String::from_utf8(file.bytes) {
            Ok(content) => content,
            Err(_) => {
                eprintln!("Error: {} is not valid UTF-8", file.name);
                return false;
            }
        };

        match self.client.process_chunks(&content, &file.name).await {
            Ok(chunks) => {
                println!("{}", render::chunks_table(&chunks));
                true
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                self.report_session_loss();
                false
            }
        }
    }
}

/// Drop characters the login form would not accept.
fn sanitize_username(raw: &str) -> String {
    let mut out = String::new();
    for c in raw.chars() {
        if can_add_username_char(out.chars().count(), c) {
            out.push(c);
        }
    }
    out
}

/// Same limits the login form applies while typing.
fn is_acceptable_password(password: &str) -> bool {
    password
        .chars()
        .enumerate()
        .all(|(len, c)| can_add_password_char(len, c))
}
