//! Registration, autojoin and supervision against a scripted server.

mod common;

use std::time::Duration;

use common::TestServer;
use tama::bot::{Bot, ExitStatus};
use tama::plugins;
use tokio::time::timeout;

const RUN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn registration_retries_nick_then_flushes_auth_and_joins() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let config = common::config(
        server.port(),
        "channels = [\"#tama\", \"#rust\"]\n[server.test.service_auth]\npassword = \"hunter2\"",
        "",
    );
    let bot = Bot::new(&config, &plugins::builtin(&config)?)?;
    let handle = bot.handle().clone();
    let run = tokio::spawn(bot.run());

    let mut conn = server.accept().await?;
    conn.expect("NICK tama").await?;
    conn.expect("USER tama 0 * :Tama bot").await?;
    conn.send(":irc.test 433 * tama :Nickname is already in use").await?;
    conn.expect("NICK tama_").await?;
    conn.send(":irc.test 433 * tama_ :Nickname is already in use").await?;
    conn.expect("NICK tama__").await?;

    conn.send(":irc.test 001 tama__ :Welcome").await?;
    conn.expect("PRIVMSG NickServ :IDENTIFY hunter2").await?;
    conn.expect("JOIN #tama").await?;
    conn.expect("JOIN #rust").await?;

    conn.send("PING :irc.test").await?;
    conn.expect("PONG :irc.test").await?;

    handle.shutdown("done");
    conn.expect("QUIT :done").await?;
    drop(conn);

    let status = timeout(RUN_TIMEOUT, run).await??;
    assert_eq!(status, ExitStatus::Quit);
    Ok(())
}

#[tokio::test]
async fn dead_connection_is_reconnected_with_same_config() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let config = common::config(server.port(), "channels = [\"#tama\"]", "");
    let bot = Bot::new(&config, &plugins::builtin(&config)?)?
        .with_reconnect_delay(Duration::from_millis(50));
    let handle = bot.handle().clone();
    let run = tokio::spawn(bot.run());

    let mut first = server.accept().await?;
    first.register("tama").await?;
    first.expect("JOIN #tama").await?;
    drop(first);

    let mut second = server.accept().await?;
    second.register("tama").await?;
    second.expect("JOIN #tama").await?;

    handle.shutdown("bye");
    second.expect("QUIT :bye").await?;
    second.send("ERROR :Closing Link: tama (Quit: bye)").await?;
    drop(second);

    let status = timeout(RUN_TIMEOUT, run).await??;
    assert_eq!(status, ExitStatus::Quit);
    Ok(())
}

#[tokio::test]
async fn reload_command_ends_run_with_reload() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let config = common::config(server.port(), "", "");
    let bot = Bot::new(&config, &plugins::builtin(&config)?)?;
    let run = tokio::spawn(bot.run());

    let mut conn = server.accept().await?;
    conn.register("tama").await?;
    conn.send(":admin!root@localhost PRIVMSG #tama :!reload new config")
        .await?;
    conn.expect("QUIT :new config").await?;
    drop(conn);

    let status = timeout(RUN_TIMEOUT, run).await??;
    assert_eq!(status, ExitStatus::Reload);
    Ok(())
}

#[tokio::test]
async fn reconnect_command_drops_and_reconnects() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let config = common::config(server.port(), "", "");
    let bot = Bot::new(&config, &plugins::builtin(&config)?)?
        .with_reconnect_delay(Duration::from_millis(50));
    let handle = bot.handle().clone();
    let run = tokio::spawn(bot.run());

    let mut conn = server.accept().await?;
    conn.register("tama").await?;
    conn.send(":admin!root@localhost PRIVMSG #tama :!reconnect").await?;
    conn.expect("QUIT").await?;
    drop(conn);

    let mut again = server.accept().await?;
    again.register("tama").await?;
    assert_eq!(handle.exit_status(), None);

    handle.shutdown("");
    again.expect("QUIT").await?;
    drop(again);

    let status = timeout(RUN_TIMEOUT, run).await??;
    assert_eq!(status, ExitStatus::Quit);
    Ok(())
}

#[tokio::test]
async fn shutdown_abandons_a_pending_reconnect() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let config = common::config(server.port(), "", "");
    let bot = Bot::new(&config, &plugins::builtin(&config)?)?
        .with_reconnect_delay(Duration::from_millis(300));
    let handle = bot.handle().clone();
    let run = tokio::spawn(bot.run());

    let mut conn = server.accept().await?;
    conn.register("tama").await?;
    drop(conn);

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.shutdown("going away");
    server.expect_no_connection(Duration::from_millis(600)).await?;

    let status = timeout(RUN_TIMEOUT, run).await??;
    assert_eq!(status, ExitStatus::Quit);
    Ok(())
}

#[tokio::test]
async fn failed_connect_is_retried() -> anyhow::Result<()> {
    let port = TestServer::bind().await?.port();
    let config = common::config(port, "", "");
    let bot = Bot::new(&config, &plugins::builtin(&config)?)?
        .with_reconnect_delay(Duration::from_millis(200));
    let handle = bot.handle().clone();
    let run = tokio::spawn(bot.run());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let server = TestServer::bind_port(port).await?;
    let mut conn = server.accept().await?;
    conn.register("tama").await?;

    handle.shutdown("done");
    conn.expect("QUIT :done").await?;
    drop(conn);

    let status = timeout(RUN_TIMEOUT, run).await??;
    assert_eq!(status, ExitStatus::Quit);
    Ok(())
}
