//! Built-in plugins.
//!
//! A plugin is a named bundle of [`Action`]s registered into the bot's
//! action table at startup.

mod control;
mod fortune;
mod help;

pub use control::Control;
pub use fortune::{Fortune, FortuneDb, FortuneError};
pub use help::Help;

use crate::bot::Action;
use crate::config::Config;

/// A static set of actions.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// The actions this plugin registers. Called once per bot build.
    fn actions(&self) -> Vec<Action>;
}

/// The plugins enabled by `config`.
///
/// `help` and bot control are always present; `fortune` needs a
/// `[fortune]` block and fails if its databases cannot be read.
pub fn builtin(config: &Config) -> Result<Vec<Box<dyn Plugin>>, FortuneError> {
    let mut plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Help), Box::new(Control)];
    if let Some(ref fortune) = config.fortune {
        let db = FortuneDb::load(fortune.paths.as_slice())?;
        plugins.push(Box::new(Fortune::new(db)));
    }
    Ok(plugins)
}
