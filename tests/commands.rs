//! Command dispatch end to end: a real bot, a scripted server.

mod common;

use std::time::Duration;

use common::{TestConnection, TestServer};
use tama::bot::{Action, Bot, BotHandle, ExitStatus};
use tama::plugins::{self, Plugin};
use tokio::task::JoinHandle;
use tokio::time::timeout;

struct Greeter;

impl Plugin for Greeter {
    fn name(&self) -> &'static str {
        "greeter"
    }

    fn actions(&self) -> Vec<Action> {
        vec![
            Action::command("hello", |ctx| Ok(Some(format!("hello, {}", ctx.sender.nick)))),
            Action::command("fail", |_| anyhow::bail!("this command always fails")),
            Action::pattern(r"(\w+)\+\+", |ctx| {
                let thing = ctx.captures.get(1).cloned().flatten().unwrap_or_default();
                Ok(Some(format!("{thing} gets a point")))
            }),
        ]
    }
}

async fn start() -> anyhow::Result<(TestConnection, BotHandle, JoinHandle<ExitStatus>)> {
    let server = TestServer::bind().await?;
    let config = common::config(server.port(), "channels = [\"#tama\"]", "");
    let mut all = plugins::builtin(&config)?;
    all.push(Box::new(Greeter));
    let bot = Bot::new(&config, &all)?;
    let handle = bot.handle().clone();
    let run = tokio::spawn(bot.run());

    let mut conn = server.accept().await?;
    conn.register("tama").await?;
    conn.expect("JOIN #tama").await?;
    conn.send(":tama!tama@bot JOIN #tama").await?;
    Ok((conn, handle, run))
}

async fn stop(
    mut conn: TestConnection,
    handle: BotHandle,
    run: JoinHandle<ExitStatus>,
) -> anyhow::Result<()> {
    handle.shutdown("test over");
    conn.recv_until(|line| line.starts_with("QUIT")).await?;
    drop(conn);
    timeout(Duration::from_secs(10), run).await??;
    Ok(())
}

#[tokio::test]
async fn private_message_reply_goes_to_sender() -> anyhow::Result<()> {
    let (mut conn, handle, run) = start().await?;

    conn.send(":alice!a@host PRIVMSG tama :!hello").await?;
    conn.expect("PRIVMSG alice :alice: hello, alice").await?;

    conn.send(":alice!a@host PRIVMSG #tama :!HELLO").await?;
    conn.expect("PRIVMSG #tama :alice: hello, alice").await?;

    stop(conn, handle, run).await
}

#[tokio::test]
async fn shared_prefix_asks_for_clarification() -> anyhow::Result<()> {
    let (mut conn, handle, run) = start().await?;

    conn.send(":alice!a@host PRIVMSG #tama :!he").await?;
    conn.expect("NOTICE alice :Did you mean: help or hello?").await?;

    conn.send(":alice!a@host PRIVMSG #tama :!hel").await?;
    conn.expect("NOTICE alice :Did you mean: help or hello?").await?;

    conn.send(":alice!a@host PRIVMSG #tama :!hell").await?;
    conn.expect("PRIVMSG #tama :alice: hello, alice").await?;

    stop(conn, handle, run).await
}

#[tokio::test]
async fn help_lists_and_describes_commands() -> anyhow::Result<()> {
    let (mut conn, handle, run) = start().await?;

    conn.send(":alice!a@host PRIVMSG #tama :!help").await?;
    let listing = conn.recv().await?.unwrap_or_default();
    assert!(listing.starts_with("NOTICE alice :Available commands: help, nick, say"));
    assert!(listing.contains("hello"));

    conn.send(":alice!a@host PRIVMSG #tama :!help quit").await?;
    conn.expect("PRIVMSG #tama :!quit [reason] - disconnects and stops the bot")
        .await?;

    stop(conn, handle, run).await
}

#[tokio::test]
async fn failures_and_denials_are_reported_privately() -> anyhow::Result<()> {
    let (mut conn, handle, run) = start().await?;

    conn.send(":alice!a@host PRIVMSG #tama :!fail").await?;
    conn.expect("NOTICE alice :Sorry, something went wrong running that command.")
        .await?;

    conn.send(":alice!a@host PRIVMSG #tama :!say hi").await?;
    conn.expect("NOTICE alice :You are not allowed to use that command.")
        .await?;

    conn.send(":admin!root@localhost PRIVMSG #tama :!say hi").await?;
    conn.expect("PRIVMSG #tama :hi").await?;

    stop(conn, handle, run).await
}

#[tokio::test]
async fn patterns_answer_plain_messages() -> anyhow::Result<()> {
    let (mut conn, handle, run) = start().await?;

    conn.send(":alice!a@host PRIVMSG #tama :rust++").await?;
    conn.expect("PRIVMSG #tama :alice: rust gets a point").await?;

    stop(conn, handle, run).await
}

#[tokio::test]
async fn invite_is_accepted_and_ctcp_answered() -> anyhow::Result<()> {
    let (mut conn, handle, run) = start().await?;

    conn.send(":bob!b@host INVITE tama :#elsewhere").await?;
    conn.expect("JOIN #elsewhere").await?;

    conn.send(":bob!b@host PRIVMSG tama :\x01PING 12345\x01").await?;
    conn.expect("NOTICE bob :\x01PING 12345\x01").await?;

    stop(conn, handle, run).await
}
