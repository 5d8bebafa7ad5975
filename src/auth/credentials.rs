//! Credential resolution for the directory and user-management APIs
//!
//! Each API gets a Basic-Auth token built from a username and password. The
//! two halves are looked up independently, first match wins:
//!
//! 1. command-line flag (or its environment variable)
//! 2. credentials file entry labelled `Bitbucket` / `Crowd`
//! 3. interactive prompt, password masked
//!
//! Tokens only live in memory for the duration of the run.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

/// The REST APIs this tool authenticates against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    /// Bitbucket Server, the user directory that is queried
    Bitbucket,
    /// Crowd, the user-management API that is written to
    Crowd,
}

impl Api {
    /// Label used in prompts and messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bitbucket => "Bitbucket",
            Self::Crowd => "Crowd",
        }
    }

    /// Parse a credentials file label, ignoring case
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case(auth::BITBUCKET_LABEL) {
            Some(Self::Bitbucket)
        } else if label.eq_ignore_ascii_case(auth::CROWD_LABEL) {
            Some(Self::Crowd)
        } else {
            None
        }
    }

    /// Environment variables backing the username and password flags
    pub fn env_vars(&self) -> (&'static str, &'static str) {
        match self {
            Self::Bitbucket => (
                env_constants::BITBUCKET_USERNAME,
                env_constants::BITBUCKET_PASSWORD,
            ),
            Self::Crowd => (env_constants::CROWD_USERNAME, env_constants::CROWD_PASSWORD),
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base64 encoded `user:password` pair
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuthToken(String);

impl BasicAuthToken {
    /// Encode a username and password, trimming surrounding whitespace
    pub fn encode(username: &str, password: &str) -> Self {
        let pair = format!("{}:{}", username.trim(), password.trim());
        Self(STANDARD.encode(pair))
    }

    /// Accept an already encoded token, with or without the `Basic ` scheme
    pub fn from_encoded(raw: &str) -> AuthResult<Self> {
        let trimmed = raw.trim();
        let token = trimmed
            .strip_prefix(auth::BASIC_PREFIX)
            .unwrap_or(trimmed)
            .trim();

        let decoded = STANDARD
            .decode(token)
            .map_err(|e| AuthError::InvalidToken {
                reason: e.to_string(),
            })?;
        if !decoded.contains(&b':') {
            return Err(AuthError::InvalidToken {
                reason: "decoded value is not a user:password pair".to_string(),
            });
        }

        Ok(Self(token.to_string()))
    }

    /// The encoded token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("{}{}", auth::BASIC_PREFIX, self.0)
    }
}

impl fmt::Debug for BasicAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BasicAuthToken(***)")
    }
}

/// Username and password given on the command line or in the environment
#[derive(Debug, Clone, Default)]
pub struct LoginFlags {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginFlags {
    /// Fill unset fields from the API's environment variables
    pub fn with_env_fallback(mut self, api: Api) -> Self {
        let (user_var, pass_var) = api.env_vars();
        if self.username.is_none() {
            self.username = std::env::var(user_var).ok();
        }
        if self.password.is_none() {
            self.password = std::env::var(pass_var).ok();
        }
        self
    }
}

/// Everything the credential provider needs to know
#[derive(Debug, Clone, Default)]
pub struct CredentialOptions {
    /// Directory API login
    pub bitbucket: LoginFlags,
    /// User-management API login
    pub crowd: LoginFlags,
    /// Pre-encoded user-management token, skips the Crowd lookup entirely
    pub crowd_token: Option<String>,
    /// Use the directory token for both APIs
    pub shared: bool,
    /// Optional `<Label> <user:password>` file
    pub credentials_file: Option<PathBuf>,
}

/// Resolved tokens for one run
#[derive(Debug, Clone)]
pub struct CredentialSet {
    directory: BasicAuthToken,
    management: Option<BasicAuthToken>,
}

impl CredentialSet {
    /// One token used for both APIs
    pub fn shared(token: BasicAuthToken) -> Self {
        Self {
            directory: token,
            management: None,
        }
    }

    /// Separate tokens per API
    pub fn separate(directory: BasicAuthToken, management: BasicAuthToken) -> Self {
        Self {
            directory,
            management: Some(management),
        }
    }

    /// Token for the directory API
    pub fn directory(&self) -> &BasicAuthToken {
        &self.directory
    }

    /// Token for the user-management API
    pub fn management(&self) -> &BasicAuthToken {
        self.management.as_ref().unwrap_or(&self.directory)
    }

    /// Number of distinct tokens in use (1 or 2)
    pub fn distinct_tokens(&self) -> usize {
        match &self.management {
            Some(token) if token != &self.directory => 2,
            _ => 1,
        }
    }
}

/// Entries read from a credentials file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialFile {
    entries: HashMap<Api, (String, String)>,
}

impl CredentialFile {
    /// Load a credentials file
    ///
    /// A missing or unreadable file yields no entries; the prompts take over.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Credentials file {} not usable: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse `<Label> <user:password>` lines, later lines win
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((label, value)) = line.split_once(char::is_whitespace) else {
                tracing::warn!("Ignoring credentials file line {}: no value", index + 1);
                continue;
            };
            let Some(api) = Api::from_label(label) else {
                continue;
            };
            let Some((user, password)) = value.trim().split_once(':') else {
                tracing::warn!(
                    "Ignoring {} entry on line {}: expected user:password",
                    api,
                    index + 1
                );
                continue;
            };

            entries.insert(api, (user.to_string(), password.to_string()));
        }

        Self { entries }
    }

    /// Username and password stored for an API
    pub fn get(&self, api: Api) -> Option<(&str, &str)> {
        self.entries
            .get(&api)
            .map(|(user, password)| (user.as_str(), password.as_str()))
    }
}

/// Source of interactively entered credentials
pub trait Prompter {
    /// Ask for a username
    fn username(&mut self, api: Api) -> io::Result<String>;

    /// Ask for a password without echoing it
    fn password(&mut self, api: Api) -> io::Result<String>;
}

/// Prompts on the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn username(&mut self, api: Api) -> io::Result<String> {
        print!("Enter {} username: ", api);
        io::stdout().flush()?;

        let mut username = String::new();
        io::stdin().lock().read_line(&mut username)?;
        Ok(username.trim().to_string())
    }

    fn password(&mut self, api: Api) -> io::Result<String> {
        rpassword::prompt_password(format!("Enter {} password: ", api))
    }
}

/// Resolve the tokens for both APIs
///
/// # Errors
///
/// Returns `AuthError` if a prompt cannot be read, a username ends up
/// empty, or a pre-encoded token is not valid Base64.
pub fn resolve_credentials<P: Prompter>(
    options: &CredentialOptions,
    prompter: &mut P,
) -> AuthResult<CredentialSet> {
    let file = options
        .credentials_file
        .as_deref()
        .map(CredentialFile::load)
        .unwrap_or_default();

    let directory = resolve_login(Api::Bitbucket, &options.bitbucket, &file, prompter)?;

    if options.shared {
        tracing::debug!("Using the Bitbucket credentials for Crowd as well");
        return Ok(CredentialSet::shared(directory));
    }

    let management = match options.crowd_token.as_deref() {
        Some(raw) => BasicAuthToken::from_encoded(raw)?,
        None => resolve_login(Api::Crowd, &options.crowd, &file, prompter)?,
    };

    Ok(CredentialSet::separate(directory, management))
}

fn resolve_login<P: Prompter>(
    api: Api,
    flags: &LoginFlags,
    file: &CredentialFile,
    prompter: &mut P,
) -> AuthResult<BasicAuthToken> {
    let stored = file.get(api);

    let username = match flags.username.clone().or_else(|| stored.map(|(u, _)| u.to_string())) {
        Some(username) => username,
        None => prompter
            .username(api)
            .map_err(|source| AuthError::UsernamePrompt {
                api: api.to_string(),
                source,
            })?,
    };
    if username.trim().is_empty() {
        return Err(AuthError::EmptyUsername {
            api: api.to_string(),
        });
    }

    let password = match flags.password.clone().or_else(|| stored.map(|(_, p)| p.to_string())) {
        Some(password) => password,
        None => prompter
            .password(api)
            .map_err(|source| AuthError::PasswordPrompt {
                api: api.to_string(),
                source,
            })?,
    };

    Ok(BasicAuthToken::encode(&username, &password))
}
