//! The `help` command: lists commands or shows one command's usage.

use super::Plugin;
use crate::bot::{Action, ActionContext, ActionResult};

/// `help [command]`.
pub struct Help;

impl Plugin for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    fn actions(&self) -> Vec<Action> {
        vec![Action::command("help", help).doc("<command> - shows help for <command>")]
    }
}

fn help(ctx: ActionContext) -> ActionResult {
    let nick = &ctx.sender.nick;
    let mut words = ctx.text.split_whitespace();
    let requested = words.next();
    if words.next().is_some() {
        ctx.client.notice(nick, "Invalid command name");
        return Ok(None);
    }

    let prefix = ctx.bot.command_prefix();
    let actions = ctx.bot.actions();

    let Some(requested) = requested else {
        let names: Vec<_> = actions.command_names().collect();
        ctx.client
            .notice(nick, &format!("Available commands: {}", names.join(", ")));
        return Ok(None);
    };

    let name = requested.strip_prefix(prefix).unwrap_or(requested).to_lowercase();
    match actions.command(&name) {
        Some(action) => {
            let doc = action.documentation().unwrap_or("- No help available");
            ctx.client
                .message(&ctx.channel, &format!("{}{} {}", prefix, name, doc));
        }
        None => ctx.client.notice(nick, "No such command"),
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::Harness;

    struct Extra;

    impl Plugin for Extra {
        fn name(&self) -> &'static str {
            "extra"
        }

        fn actions(&self) -> Vec<Action> {
            vec![Action::command("undocumented", |_| Ok(None))]
        }
    }

    #[tokio::test]
    async fn lists_commands_by_notice() {
        let mut h = Harness::new(&[&Help, &Extra]);
        h.run("help", "").await.unwrap();
        assert_eq!(
            h.sent(),
            vec!["NOTICE alice :Available commands: help, undocumented"]
        );
    }

    #[tokio::test]
    async fn shows_doc_in_channel() {
        let mut h = Harness::new(&[&Help, &Extra]);
        h.run("help", "help").await.unwrap();
        h.run("help", "!UNDOCUMENTED").await.unwrap();
        assert_eq!(
            h.sent(),
            vec![
                "PRIVMSG #chan :!help <command> - shows help for <command>",
                "PRIVMSG #chan :!undocumented - No help available",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_and_invalid_requests_are_noticed() {
        let mut h = Harness::new(&[&Help]);
        h.run("help", "nope").await.unwrap();
        h.run("help", "two words").await.unwrap();
        assert_eq!(
            h.sent(),
            vec![
                "NOTICE alice :No such command",
                "NOTICE alice :Invalid command name"
            ]
        );
    }
}
