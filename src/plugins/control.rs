//! Operator commands, restricted to the `bot_control` permission tag.

use super::Plugin;
use crate::bot::{Action, ActionContext, ActionResult};

const TAG: &[&str] = &["bot_control"];

pub struct Control;

impl Plugin for Control {
    fn name(&self) -> &'static str {
        "control"
    }

    fn actions(&self) -> Vec<Action> {
        vec![
            Action::command("nick", nick)
                .permissions(TAG)
                .doc("<nick> - changes the bot's nickname"),
            Action::command("say", say)
                .permissions(TAG)
                .doc("[#channel] <text> - says <text> here or in #channel"),
            Action::command("message", message)
                .permissions(TAG)
                .doc("<target> <text> - sends <text> to <target>"),
            Action::command("notice", notice)
                .permissions(TAG)
                .doc("<target> <text> - sends <text> to <target> as a notice"),
            Action::command("quit", quit)
                .permissions(TAG)
                .doc("[reason] - disconnects and stops the bot"),
            Action::command("reload", reload)
                .permissions(TAG)
                .doc("[reason] - disconnects and restarts with fresh configuration"),
            Action::command("reconnect", reconnect)
                .permissions(TAG)
                .doc("[reason] - drops every connection and reconnects"),
        ]
    }
}

/// Split `text` into its first word and the rest, both trimmed.
fn split_target(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(' ') {
        Some((first, rest)) => (first, rest.trim()),
        None => (text, ""),
    }
}

fn nick(ctx: ActionContext) -> ActionResult {
    let (new_nick, rest) = split_target(&ctx.text);
    if new_nick.is_empty() || !rest.is_empty() {
        ctx.client.notice(&ctx.sender.nick, "Invalid nickname");
        return Ok(None);
    }
    ctx.client.nick(new_nick);
    Ok(None)
}

fn say(ctx: ActionContext) -> ActionResult {
    let payload = ctx.text.trim();
    let (channel, text) = if payload.starts_with('#') {
        split_target(payload)
    } else {
        (ctx.channel.as_str(), payload)
    };

    if text.is_empty() {
        ctx.client.notice(&ctx.sender.nick, "Empty message");
    } else {
        ctx.client.message(channel, text);
    }
    Ok(None)
}

fn message(ctx: ActionContext) -> ActionResult {
    let (target, text) = split_target(&ctx.text);
    if target.is_empty() || text.is_empty() {
        ctx.client.notice(&ctx.sender.nick, "Empty message");
    } else {
        ctx.client.message(target, text);
    }
    Ok(None)
}

fn notice(ctx: ActionContext) -> ActionResult {
    let (target, text) = split_target(&ctx.text);
    if target.is_empty() || text.is_empty() {
        ctx.client.notice(&ctx.sender.nick, "Empty message");
    } else {
        ctx.client.notice(target, text);
    }
    Ok(None)
}

fn quit(ctx: ActionContext) -> ActionResult {
    ctx.bot.shutdown(ctx.text.trim());
    Ok(None)
}

fn reload(ctx: ActionContext) -> ActionResult {
    ctx.bot.reload(ctx.text.trim());
    Ok(None)
}

fn reconnect(ctx: ActionContext) -> ActionResult {
    ctx.bot.reconnect(ctx.text.trim());
    Ok(None)
}
