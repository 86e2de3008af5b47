//! Turns connection events into action invocations.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{Instrument, debug, error, info, warn};

use super::actions::{Action, ActionContext, Resolution};
use super::handle::BotHandle;
use super::proxy::ClientProxy;
use crate::error::BusError;
use crate::event::{Event, EventBus, EventKind, Subscriber};
use crate::telemetry::{CHAT_TARGET, spans};

const FAILURE_NOTICE: &str = "Sorry, something went wrong running that command.";
const DENIED_NOTICE: &str = "You are not allowed to use that command.";

/// Subscribe the bot to a connection's bus.
pub fn attach(bot: &BotHandle, bus: &mut EventBus) -> Result<(), BusError> {
    bus.subscribe(
        EventKind::Invited,
        Subscriber::sync(|event| {
            if let Event::Invited { client, sender, channel } = event {
                info!(server = %client.name(), channel = %channel, by = %sender.nick, "invited");
                client.join(channel);
            }
            Ok(())
        }),
    )?;

    let bot = bot.clone();
    bus.subscribe(
        EventKind::Messaged,
        Subscriber::spawned(move |event| {
            let bot = bot.clone();
            async move {
                on_message(&bot, event).await;
                Ok(())
            }
        }),
    )?;
    Ok(())
}

/// Run whatever a PRIVMSG asks for: one command, or every matching pattern.
pub async fn on_message(bot: &BotHandle, event: Event) {
    let Event::Messaged {
        client,
        sender,
        location,
        text,
    } = event
    else {
        return;
    };

    info!(target: CHAT_TARGET, server = %client.name(), channel = %location, "<{}> {}", sender.nick, text);
    let proxy = ClientProxy::new(client);

    if let Some(rest) = text.strip_prefix(bot.command_prefix()) {
        let (token, args) = rest.split_once(' ').unwrap_or((rest, ""));
        let token = token.to_lowercase();

        let action = match bot.actions().resolve(&token) {
            Resolution::Found(action) => Arc::clone(action),
            Resolution::Ambiguous(candidates) => {
                debug!(token = %token, candidates = ?candidates, "ambiguous command");
                proxy.notice(&sender.nick, &did_you_mean(&candidates));
                return;
            }
            Resolution::NotFound => {
                debug!(token = %token, "no such command");
                return;
            }
        };

        let ctx = ActionContext {
            text: args.to_owned(),
            captures: Vec::new(),
            sender,
            channel: location,
            client: proxy,
            bot: bot.clone(),
        };
        run_action(bot, &action, ctx).await;
        return;
    }

    let matches: Vec<_> = bot
        .actions()
        .matching_patterns(&text)
        .map(|(action, captures)| (Arc::clone(action), captures))
        .collect();
    for (action, captures) in matches {
        let ctx = ActionContext {
            text: text.clone(),
            captures,
            sender: sender.clone(),
            channel: location.clone(),
            client: proxy.clone(),
            bot: bot.clone(),
        };
        run_action(bot, &action, ctx).await;
    }
}

/// Check permissions, invoke, and deliver the reply or a failure notice.
async fn run_action(bot: &BotHandle, action: &Action, ctx: ActionContext) {
    let sender = ctx.sender.clone();
    let channel = ctx.channel.clone();
    let proxy = ctx.client.clone();

    if !bot.permissions().allows(&sender, action.required_permissions()) {
        warn!(
            action = %action.name(),
            sender = %sender.address(),
            required = ?action.required_permissions(),
            "permission denied"
        );
        proxy.notice(&sender.nick, DENIED_NOTICE);
        return;
    }

    let span = spans::action(action.name(), &sender.nick, &channel);
    let outcome = AssertUnwindSafe(action.invoke(ctx))
        .catch_unwind()
        .instrument(span)
        .await;

    match outcome {
        Ok(Ok(Some(reply))) if !reply.is_empty() => {
            proxy.message(&channel, &format!("{}: {}", sender.nick, reply));
        }
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            error!(
                action = %action.name(),
                origin = %action.origin(),
                error = %format!("{e:#}"),
                "action failed"
            );
            proxy.notice(&sender.nick, FAILURE_NOTICE);
        }
        Err(panic) => {
            error!(
                action = %action.name(),
                origin = %action.origin(),
                panic = %panic_message(&*panic),
                "action panicked"
            );
            proxy.notice(&sender.nick, FAILURE_NOTICE);
        }
    }
}

/// `Did you mean: a, b or c?`
pub fn did_you_mean(candidates: &[String]) -> String {
    match candidates {
        [] => "Did you mean nothing?".to_owned(),
        [only] => format!("Did you mean: {}?", only),
        [init @ .., last] => format!("Did you mean: {} or {}?", init.join(", "), last),
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}
