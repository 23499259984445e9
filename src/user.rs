//! Workspace users and the shared user directory.
//!
//! [`User`] mirrors an entry of `users.json`. [`UserDirectory`] is the
//! id-keyed lookup table built once per archive load. Two kinds of synthetic
//! users are inserted lazily: bots that only appear inside messages and
//! deleted members referenced by DM/MPIM membership lists. Both insertions are
//! memoized, so every synthetic id is created exactly once no matter how many
//! times it is looked up.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SlackviewError};
use crate::raw::RawMessage;

/// Identifier Slack uses for its built-in bot.
pub const SLACKBOT_ID: &str = "USLACKBOT";

/// Display name of the built-in bot.
pub const SLACKBOT_NAME: &str = "slackbot";

const DEFAULT_IMAGE_KEY: &str = "image_512";

/// Profile block of a user entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Remaining profile keys, including the `image_{size}` URLs.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A workspace member, bot, or synthesized placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,

    /// Link to the bot's page, for synthesized bot users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_url: Option<String>,

    #[serde(default)]
    pub is_bot: bool,

    #[serde(default)]
    pub is_app_user: bool,

    #[serde(default)]
    pub deleted: bool,
}

impl User {
    /// Creates a user with only an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Builder method to set the real name.
    #[must_use]
    pub fn with_real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = Some(real_name.into());
        self
    }

    /// Builder method to set the profile.
    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Returns the most appropriate name to show for this user.
    ///
    /// Looks at `display_name`, then `real_name` (each first on the user,
    /// then on the profile) and finally falls back to `name`. Empty strings
    /// are skipped.
    pub fn display_name(&self) -> Option<&str> {
        let profile = self.profile.as_ref();
        non_empty(self.display_name.as_deref())
            .or_else(|| non_empty(self.real_name.as_deref()))
            .or_else(|| non_empty(profile.and_then(|p| p.display_name.as_deref())))
            .or_else(|| non_empty(profile.and_then(|p| p.real_name.as_deref())))
            .or_else(|| non_empty(self.name.as_deref()))
    }

    /// Returns the e-mail address, or the bot URL for bot users.
    pub fn email(&self) -> Option<&str> {
        let email = match &self.profile {
            Some(profile) => profile.email.as_deref(),
            None => self.bot_url.as_deref(),
        };
        if email.is_none() {
            debug!(user = %self.id, "no email found");
        }
        email
    }

    /// Returns the icon URL for the requested pixel size.
    ///
    /// Falls back to the full-size image when the size is not available,
    /// and to `None` when the user has no profile at all.
    pub fn image_url(&self, pixel_size: Option<u32>) -> Option<&str> {
        let profile = self.profile.as_ref()?;
        let sized = pixel_size.and_then(|size| {
            profile
                .extra
                .get(&format!("image_{size}"))
                .and_then(Value::as_str)
        });
        sized.or_else(|| profile.extra.get(DEFAULT_IMAGE_KEY).and_then(Value::as_str))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Creates the placeholder for a member that no longer exists in `users.json`.
pub fn deleted_user(id: &str) -> User {
    User {
        id: id.to_string(),
        name: Some(format!("deleted-{id}")),
        deleted: true,
        ..User::default()
    }
}

fn slackbot() -> User {
    User {
        id: SLACKBOT_ID.to_string(),
        name: Some(SLACKBOT_NAME.to_string()),
        is_bot: true,
        ..User::default()
    }
}

/// Builds the user synthesized for a bot that is missing from `users.json`.
///
/// The name comes from the message's `bot_link` (`<URL|Name>`), otherwise
/// from its `username` field.
fn synthesize_bot(bot_id: &str, message: &RawMessage) -> User {
    let (bot_url, bot_name) = match message.bot_link.as_deref() {
        Some(link) => {
            let link = link.trim_start_matches('<').trim_end_matches('>');
            match link.split_once('|') {
                Some((url, name)) => (Some(url.to_string()), Some(name.to_string())),
                None => (Some(link.to_string()), None),
            }
        }
        None => (None, message.username.clone()),
    };

    User {
        id: bot_id.to_string(),
        real_name: bot_name,
        bot_url,
        is_bot: true,
        is_app_user: true,
        ..User::default()
    }
}

/// Id-keyed lookup table of every user in an archive.
///
/// Reads are shared; the two lazy insertions take the write lock and insert
/// through the map's entry API, so concurrent lookups of the same missing id
/// still produce a single placeholder.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<String, Arc<User>>>,
}

impl UserDirectory {
    /// Creates a directory from a list of users.
    ///
    /// The built-in bot is always present, whether or not the list has it.
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        let mut map: HashMap<String, Arc<User>> = users
            .into_iter()
            .map(|u| (u.id.clone(), Arc::new(u)))
            .collect();
        map.entry(SLACKBOT_ID.to_string())
            .or_insert_with(|| Arc::new(slackbot()));
        Self {
            users: RwLock::new(map),
        }
    }

    /// Loads the directory from an archive's `users.json`.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SlackviewError::missing_file("users.json", path));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            SlackviewError::Parse { what, source, .. } => {
                SlackviewError::parse(what, source, Some(path.to_path_buf()))
            }
            other => other,
        })
    }

    /// Parses the contents of a `users.json` file.
    pub fn from_json(content: &str) -> Result<Self> {
        let users: Vec<User> = serde_json::from_str(content)
            .map_err(|e| SlackviewError::parse("user list", e, None))?;
        Ok(Self::new(users))
    }

    /// Looks up a user by id.
    pub fn get(&self, id: &str) -> Option<Arc<User>> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Returns `true` if the id is known.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of users, synthetic ones included.
    pub fn len(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_or_insert_with(&self, id: &str, make: impl FnOnce() -> User) -> Arc<User> {
        if let Some(user) = self.get(id) {
            return user;
        }
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            users
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(make())),
        )
    }

    /// Resolves the author of a raw message.
    ///
    /// Bot messages (subtype `bot_*`) whose bot id is unknown get a synthetic
    /// user, memoized under the bot id. Returns `None` when the author cannot
    /// be found.
    pub fn find_author(&self, message: &RawMessage) -> Option<Arc<User>> {
        if message.is_bot_event() {
            if let Some(bot_id) = message.bot_id.as_deref() {
                let user = self.get_or_insert_with(bot_id, || {
                    debug!(bot_id, "adding synthesized bot user");
                    synthesize_bot(bot_id, message)
                });
                if message.user.is_none() {
                    return Some(user);
                }
            }
        }

        let user_id = message.user.as_deref().or(message.bot_id.as_deref())?;
        let user = self.get(user_id);
        if user.is_none() {
            debug!(user_id, ts = ?message.ts, "unable to find user");
        }
        user
    }

    /// Resolves a conversation member, synthesizing a deleted-user
    /// placeholder for ids missing from the directory.
    pub fn member(&self, id: &str) -> Arc<User> {
        self.get_or_insert_with(id, || {
            debug!(user_id = id, "member missing from users.json, marking deleted");
            deleted_user(id)
        })
    }
}
