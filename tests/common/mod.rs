//! Integration test common infrastructure.
//!
//! Provides a scripted IRC server the bot connects to, plus helpers for
//! building bot configurations that point at it.

pub mod server;

#[allow(unused_imports)]
pub use server::{TestConnection, TestServer};

use tama::Config;

/// Configuration for one server named `test` on `port`.
#[allow(dead_code)]
pub fn config(port: u16, extra_server: &str, extra_root: &str) -> Config {
    format!(
        r#"
[tama]
prefix = "!"

[tama.permissions]
bot_control = ["admin!*@*"]

{extra_root}

[server.test]
host = "127.0.0.1"
port = {port}
nick = "tama"
user = "tama"
realname = "Tama bot"
{extra_server}
"#
    )
    .parse()
    .expect("test config parses")
}
