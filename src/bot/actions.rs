//! Plugin actions and the table they are resolved from.
//!
//! An [`Action`] is either a command, invoked as `<prefix><name> <text>`, or
//! a pattern, run against every message that is not a command. The
//! [`ActionTable`] is built once at startup and shared read-only.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use regex::Regex;
use tama_proto::User;

use super::handle::BotHandle;
use super::proxy::ClientProxy;
use super::trie::CommandTrie;
use crate::error::ActionTableError;

/// What a handler returns: text to send to the channel, if any.
pub type ActionResult = anyhow::Result<Option<String>>;

type SyncFn = dyn Fn(ActionContext) -> ActionResult + Send + Sync;
type AsyncFn = dyn Fn(ActionContext) -> BoxFuture<'static, ActionResult> + Send + Sync;

/// Everything a handler gets to work with.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Text after the command token, empty if none. For pattern actions,
    /// the whole message.
    pub text: String,
    /// Pattern capture groups, group 0 first. Empty for commands.
    pub captures: Vec<Option<String>>,
    /// Who sent the message.
    pub sender: User,
    /// Where the message was seen: a channel, or the sender's nick.
    pub channel: String,
    /// Messaging for the connection the message arrived on.
    pub client: ClientProxy,
    /// The bot itself.
    pub bot: BotHandle,
}

/// A handler body.
#[derive(Clone)]
pub enum Handler {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Handler::Sync"),
            Self::Async(_) => f.write_str("Handler::Async"),
        }
    }
}

/// How an action is triggered.
#[derive(Debug, Clone)]
pub enum Trigger {
    Command(String),
    Pattern(String),
}

/// A registered plugin action.
#[derive(Debug, Clone)]
pub struct Action {
    trigger: Trigger,
    handler: Handler,
    permissions: Vec<String>,
    doc: Option<String>,
    origin: &'static Location<'static>,
}

impl Action {
    /// A command with a synchronous handler.
    #[track_caller]
    pub fn command<F>(name: &str, f: F) -> Self
    where
        F: Fn(ActionContext) -> ActionResult + Send + Sync + 'static,
    {
        Self::new(Trigger::Command(name.to_owned()), Handler::Sync(Arc::new(f)))
    }

    /// A command with an asynchronous handler.
    #[track_caller]
    pub fn command_async<F, Fut>(name: &str, f: F) -> Self
    where
        F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        Self::new(
            Trigger::Command(name.to_owned()),
            Handler::Async(Arc::new(move |ctx| f(ctx).boxed())),
        )
    }

    /// A pattern action with a synchronous handler. The pattern must match
    /// at the start of the message.
    #[track_caller]
    pub fn pattern<F>(pattern: &str, f: F) -> Self
    where
        F: Fn(ActionContext) -> ActionResult + Send + Sync + 'static,
    {
        Self::new(Trigger::Pattern(pattern.to_owned()), Handler::Sync(Arc::new(f)))
    }

    /// A pattern action with an asynchronous handler.
    #[track_caller]
    pub fn pattern_async<F, Fut>(pattern: &str, f: F) -> Self
    where
        F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        Self::new(
            Trigger::Pattern(pattern.to_owned()),
            Handler::Async(Arc::new(move |ctx| f(ctx).boxed())),
        )
    }

    #[track_caller]
    fn new(trigger: Trigger, handler: Handler) -> Self {
        Self {
            trigger,
            handler,
            permissions: Vec::new(),
            doc: None,
            origin: Location::caller(),
        }
    }

    /// Require every one of these permission tags.
    pub fn permissions(mut self, tags: &[&str]) -> Self {
        self.permissions = tags.iter().map(|t| (*t).to_owned()).collect();
        self
    }

    /// One-line usage text shown by `help`.
    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_owned());
        self
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn required_permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn documentation(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Where the action was defined, for logs.
    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }

    /// Command name or pattern source.
    pub fn name(&self) -> &str {
        match &self.trigger {
            Trigger::Command(name) | Trigger::Pattern(name) => name,
        }
    }

    /// Invoke the handler.
    pub async fn invoke(&self, ctx: ActionContext) -> ActionResult {
        match &self.handler {
            Handler::Sync(f) => f(ctx),
            Handler::Async(f) => f(ctx).await,
        }
    }
}

/// Outcome of resolving a command token.
#[derive(Debug)]
pub enum Resolution<'a> {
    Found(&'a Arc<Action>),
    /// Several commands share the prefix; candidates in trie order.
    Ambiguous(Vec<String>),
    NotFound,
}

/// Commands by name, a trie over those names, and patterns in
/// registration order.
#[derive(Debug, Default)]
pub struct ActionTable {
    commands: HashMap<String, Arc<Action>>,
    order: Vec<String>,
    trie: CommandTrie,
    patterns: Vec<(Regex, Arc<Action>)>,
}

impl ActionTable {
    /// Assemble the table. Duplicate command names, names that are not a
    /// single word and invalid patterns are rejected.
    pub fn build(actions: impl IntoIterator<Item = Action>) -> Result<Self, ActionTableError> {
        let mut table = Self::default();

        for action in actions {
            let action = Arc::new(action);
            match action.trigger.clone() {
                Trigger::Command(name) => {
                    if name.is_empty() || name.chars().any(char::is_whitespace) {
                        return Err(ActionTableError::InvalidName(name));
                    }
                    let key = name.to_lowercase();
                    if let Some(first) = table.commands.get(&key) {
                        return Err(ActionTableError::DuplicateCommand {
                            name: key,
                            first: first.origin.to_string(),
                            second: action.origin.to_string(),
                        });
                    }
                    table.trie.insert(&key);
                    table.order.push(key.clone());
                    table.commands.insert(key, action);
                }
                Trigger::Pattern(pattern) => {
                    let regex = Regex::new(&pattern)
                        .map_err(|source| ActionTableError::InvalidPattern { pattern, source })?;
                    table.patterns.push((regex, action));
                }
            }
        }
        Ok(table)
    }

    /// Exact lookup by lowercase name.
    pub fn command(&self, name: &str) -> Option<&Arc<Action>> {
        self.commands.get(name)
    }

    /// Command names in registration order.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Resolve a lowercase command token: exact name first, then a unique
    /// prefix.
    pub fn resolve(&self, token: &str) -> Resolution<'_> {
        if let Some(action) = self.commands.get(token) {
            return Resolution::Found(action);
        }

        let mut candidates = match self.trie.search(token) {
            Ok(candidates) => candidates,
            Err(_) => return Resolution::NotFound,
        };
        match candidates.len() {
            0 => Resolution::NotFound,
            1 => {
                let name = candidates.remove(0);
                match self.commands.get(&name) {
                    Some(action) => Resolution::Found(action),
                    None => Resolution::NotFound,
                }
            }
            _ => Resolution::Ambiguous(candidates),
        }
    }

    /// Pattern actions matching at the start of `text`, in registration
    /// order, with their capture groups.
    pub fn matching_patterns<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = (&'a Arc<Action>, Vec<Option<String>>)> + 'a {
        self.patterns.iter().filter_map(move |(regex, action)| {
            let captures = regex.captures(text)?;
            if captures.get(0)?.start() != 0 {
                return None;
            }
            let groups = captures
                .iter()
                .map(|group| group.map(|m| m.as_str().to_owned()))
                .collect();
            Some((action, groups))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.patterns.is_empty()
    }
}
