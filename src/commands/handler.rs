//! Command Handler Module
//!
//! This module implements the FlashLink command set on top of the link
//! registry. It takes parsed command arguments, validates them and maps
//! registry outcomes to RESP replies.
//!
//! ## Supported Commands
//!
//! ### Link Commands
//! - `SHORTEN target [ALIAS alias] [TTL seconds]` - Create a short link
//! - `RESOLVE alias` - Follow a short link (counts as an access)
//! - `ANALYTICS alias` - Access count and recent access times
//! - `UPDATE alias [ALIAS new_alias] [TTL seconds]` - Rename and/or renew
//! - `DELETE alias` - Delete a short link (`DEL` is accepted too)
//! - `LIST` - Every active link
//!
//! ### Server Commands
//! - `PING [message]`, `ECHO message`
//! - `DBSIZE`, `INFO`, `COMMAND`, `QUIT`
//!
//! ## Error Replies
//!
//! | Outcome           | Reply                                           |
//! |-------------------|-------------------------------------------------|
//! | bad arguments     | `-ERR ...`                                      |
//! | unknown alias     | null for `RESOLVE`/`ANALYTICS`, `-NOTFOUND ...` |
//! | alias taken       | `-CONFLICT alias already exists: <alias>`       |

use crate::config::MAX_TTL_SECS;
use crate::protocol::RespValue;
use crate::storage::record::{unix_millis, LinkSnapshot};
use crate::storage::{Registry, RegistryError};
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Commands reported by `COMMAND`
const COMMANDS: &[&str] = &[
    "SHORTEN", "RESOLVE", "ANALYTICS", "UPDATE", "DELETE", "LIST", "PING", "ECHO", "DBSIZE",
    "INFO", "COMMAND", "QUIT",
];

/// Optional `ALIAS`/`TTL` arguments shared by `SHORTEN` and `UPDATE`.
#[derive(Debug, Default, PartialEq, Eq)]
struct LinkOptions {
    alias: Option<String>,
    ttl_secs: Option<u64>,
}

/// Handles FlashLink commands by dispatching them to the registry.
#[derive(Clone)]
pub struct CommandHandler {
    /// The link registry
    registry: Arc<Registry>,
    /// Prefix of the short links handed out by SHORTEN
    base_url: Arc<str>,
    /// Server start time for INFO command
    start_time: Instant,
}

impl CommandHandler {
    /// Creates a new command handler.
    ///
    /// # Arguments
    ///
    /// * `registry` - The shared link registry
    /// * `base_url` - Prefix for short links, e.g. `http://localhost:6380`
    pub fn new(registry: Arc<Registry>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            registry,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            start_time: Instant::now(),
        }
    }

    /// Executes a command and returns the reply.
    ///
    /// The first argument is the command name, matched case-insensitively.
    pub fn execute(&self, args: &[Bytes]) -> RespValue {
        let Some((name, rest)) = args.split_first() else {
            return RespValue::error("ERR empty command");
        };

        let cmd_name = match std::str::from_utf8(name) {
            Ok(s) => s.to_uppercase(),
            Err(_) => return RespValue::error("ERR invalid command name"),
        };

        self.dispatch(&cmd_name, rest)
    }

    /// Dispatches a command to its handler.
    fn dispatch(&self, cmd: &str, args: &[Bytes]) -> RespValue {
        match cmd {
            // Link commands
            "SHORTEN" => self.cmd_shorten(args),
            "RESOLVE" => self.cmd_resolve(args),
            "ANALYTICS" => self.cmd_analytics(args),
            "UPDATE" => self.cmd_update(args),
            "DELETE" | "DEL" => self.cmd_delete(args),
            "LIST" => self.cmd_list(args),

            // Server commands
            "PING" => self.cmd_ping(args),
            "ECHO" => self.cmd_echo(args),
            "DBSIZE" => RespValue::integer(self.registry.len() as i64),
            "INFO" => self.cmd_info(),
            "COMMAND" => RespValue::array(COMMANDS.iter().map(|c| RespValue::bulk_str(c)).collect()),
            "QUIT" => RespValue::ok(),

            // Unknown command
            _ => RespValue::error(format!("ERR unknown command '{}'", cmd)),
        }
    }

    // ========================================================================
    // Helper functions
    // ========================================================================

    /// Short link handed back to the client.
    pub fn short_url(&self, alias: &str) -> String {
        format!("{}/{}", self.base_url, alias)
    }

    fn wrong_args(cmd: &str) -> RespValue {
        RespValue::error(format!(
            "ERR wrong number of arguments for '{}' command",
            cmd
        ))
    }

    fn registry_error(err: RegistryError) -> RespValue {
        match err {
            RegistryError::NotFound => RespValue::error(format!("NOTFOUND {}", err)),
            RegistryError::AliasConflict(_) => RespValue::error(format!("CONFLICT {}", err)),
            RegistryError::AliasSpaceExhausted(_) => RespValue::error(format!("ERR {}", err)),
        }
    }

    /// Parses `[ALIAS alias] [TTL seconds]` in any order.
    fn parse_options(args: &[Bytes]) -> Result<LinkOptions, RespValue> {
        let mut options = LinkOptions::default();
        let mut iter = args.iter();

        while let Some(opt) = iter.next() {
            let value = iter.next().ok_or_else(|| RespValue::error("ERR syntax error"))?;

            if opt.eq_ignore_ascii_case(b"ALIAS") {
                let alias = utf8(value).ok_or_else(|| RespValue::error("ERR invalid alias"))?;
                if alias.is_empty() || alias.contains(char::is_whitespace) {
                    return Err(RespValue::error("ERR invalid alias"));
                }
                options.alias = Some(alias.to_string());
            } else if opt.eq_ignore_ascii_case(b"TTL") {
                let secs = utf8(value)
                    .and_then(|s| s.parse::<i64>().ok())
                    .filter(|&n| n > 0)
                    .ok_or_else(|| RespValue::error("ERR ttl must be a positive integer"))?;
                if secs as u64 > MAX_TTL_SECS {
                    return Err(RespValue::error(format!(
                        "ERR ttl must not exceed {} seconds",
                        MAX_TTL_SECS
                    )));
                }
                options.ttl_secs = Some(secs as u64);
            } else {
                return Err(RespValue::error("ERR syntax error"));
            }
        }

        Ok(options)
    }

    fn snapshot_reply(snapshot: LinkSnapshot) -> RespValue {
        RespValue::map([
            ("alias", RespValue::bulk_str(&snapshot.alias)),
            ("long_url", RespValue::bulk_str(&snapshot.target)),
            ("access_count", RespValue::integer(snapshot.access_count as i64)),
            ("access_times", timestamps(&snapshot.recent_accesses)),
            ("ttl", RespValue::integer(snapshot.ttl.as_secs() as i64)),
            ("created_at", RespValue::integer(unix_millis(snapshot.created_at))),
            ("expires_at", RespValue::integer(unix_millis(snapshot.expires_at))),
            (
                "time_remaining",
                RespValue::integer(snapshot.time_remaining.as_secs() as i64),
            ),
        ])
    }

    // ========================================================================
    // Link Commands
    // ========================================================================

    /// SHORTEN target [ALIAS alias] [TTL seconds]
    fn cmd_shorten(&self, args: &[Bytes]) -> RespValue {
        let Some((target, rest)) = args.split_first() else {
            return Self::wrong_args("SHORTEN");
        };

        let target = match utf8(target) {
            Some(t) if !t.is_empty() => t,
            Some(_) => return RespValue::error("ERR target is required"),
            None => return RespValue::error("ERR invalid target"),
        };

        let options = match Self::parse_options(rest) {
            Ok(o) => o,
            Err(reply) => return reply,
        };

        match self
            .registry
            .create(target, options.alias.as_deref(), options.ttl_secs)
        {
            Ok(alias) => RespValue::bulk_string(self.short_url(&alias)),
            Err(e) => Self::registry_error(e),
        }
    }

    /// RESOLVE alias
    fn cmd_resolve(&self, args: &[Bytes]) -> RespValue {
        let [alias] = args else {
            return Self::wrong_args("RESOLVE");
        };
        let Some(alias) = utf8(alias) else {
            return RespValue::null();
        };

        match self.registry.resolve(alias) {
            Ok(target) => RespValue::bulk_string(target),
            Err(_) => RespValue::null(),
        }
    }

    /// ANALYTICS alias
    fn cmd_analytics(&self, args: &[Bytes]) -> RespValue {
        let [alias] = args else {
            return Self::wrong_args("ANALYTICS");
        };
        let Some(alias) = utf8(alias) else {
            return RespValue::null();
        };

        match self.registry.stats(alias) {
            Ok(stats) => RespValue::map([
                ("alias", RespValue::bulk_str(&stats.alias)),
                ("long_url", RespValue::bulk_str(&stats.target)),
                ("access_count", RespValue::integer(stats.access_count as i64)),
                ("access_times", timestamps(&stats.recent_accesses)),
            ]),
            Err(_) => RespValue::null(),
        }
    }

    /// UPDATE alias [ALIAS new_alias] [TTL seconds]
    fn cmd_update(&self, args: &[Bytes]) -> RespValue {
        let Some((alias, rest)) = args.split_first() else {
            return Self::wrong_args("UPDATE");
        };
        let Some(alias) = utf8(alias) else {
            return Self::registry_error(RegistryError::NotFound);
        };

        let options = match Self::parse_options(rest) {
            Ok(o) => o,
            Err(reply) => return reply,
        };

        match self
            .registry
            .update(alias, options.alias.as_deref(), options.ttl_secs)
        {
            Ok(()) => RespValue::ok(),
            Err(e) => Self::registry_error(e),
        }
    }

    /// DELETE alias [alias ...]
    fn cmd_delete(&self, args: &[Bytes]) -> RespValue {
        if args.is_empty() {
            return Self::wrong_args("DELETE");
        }

        let deleted = args
            .iter()
            .filter_map(|a| utf8(a))
            .filter(|alias| self.registry.delete(alias))
            .count();
        RespValue::integer(deleted as i64)
    }

    /// LIST
    fn cmd_list(&self, args: &[Bytes]) -> RespValue {
        if !args.is_empty() {
            return Self::wrong_args("LIST");
        }

        let urls: Vec<RespValue> = self
            .registry
            .list_active()
            .into_iter()
            .map(Self::snapshot_reply)
            .collect();

        RespValue::map([
            ("total", RespValue::integer(urls.len() as i64)),
            (
                "ttl_queue_size",
                RespValue::integer(self.registry.expiry_queue_len() as i64),
            ),
            ("urls", RespValue::array(urls)),
        ])
    }

    // ========================================================================
    // Server Commands
    // ========================================================================

    /// PING [message]
    fn cmd_ping(&self, args: &[Bytes]) -> RespValue {
        match args {
            [] => RespValue::pong(),
            [msg] => RespValue::bulk_string(msg.clone()),
            _ => Self::wrong_args("PING"),
        }
    }

    /// ECHO message
    fn cmd_echo(&self, args: &[Bytes]) -> RespValue {
        match args {
            [msg] => RespValue::bulk_string(msg.clone()),
            _ => Self::wrong_args("ECHO"),
        }
    }

    /// INFO
    fn cmd_info(&self) -> RespValue {
        let stats = self.registry.stats_snapshot();
        let config = self.registry.config();
        let uptime = self.start_time.elapsed().as_secs();

        let info = format!(
            "# Server\r\n\
             flashlink_version:{}\r\n\
             os:{}\r\n\
             uptime_in_seconds:{}\r\n\
             \r\n\
             # Config\r\n\
             default_ttl:{}\r\n\
             alias_length:{}\r\n\
             sweep_interval_ms:{}\r\n\
             history_size:{}\r\n\
             \r\n\
             # Links\r\n\
             links:{}\r\n\
             targets:{}\r\n\
             ttl_queue_size:{}\r\n\
             \r\n\
             # Operations\r\n\
             created:{}\r\n\
             resolved:{}\r\n\
             misses:{}\r\n\
             deleted:{}\r\n\
             expired:{}\r\n",
            crate::VERSION,
            std::env::consts::OS,
            uptime,
            config.default_ttl_secs(),
            config.alias_length,
            config.sweep_interval.as_millis(),
            config.history_size,
            stats.links,
            stats.targets,
            stats.queued,
            stats.created,
            stats.resolved,
            stats.misses,
            stats.deleted,
            stats.expired,
        );

        RespValue::bulk_string(info)
    }
}

fn utf8(arg: &Bytes) -> Option<&str> {
    std::str::from_utf8(arg).ok()
}

fn timestamps(times: &[SystemTime]) -> RespValue {
    RespValue::array(
        times
            .iter()
            .map(|&t| RespValue::integer(unix_millis(t)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;

    fn create_handler() -> CommandHandler {
        let registry = Arc::new(Registry::new(RegistryConfig::default()));
        CommandHandler::new(registry, "http://localhost:6380/")
    }

    fn make_command(args: &[&str]) -> Vec<Bytes> {
        args.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    fn alias_of(short_url: &RespValue) -> String {
        short_url
            .as_str()
            .and_then(|s| s.rsplit('/').next())
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_ping() {
        let handler = create_handler();

        let response = handler.execute(&make_command(&["PING"]));
        assert_eq!(response, RespValue::simple_string("PONG"));

        let response = handler.execute(&make_command(&["ping", "hello"]));
        assert_eq!(response, RespValue::bulk_string(Bytes::from("hello")));
    }

    #[test]
    fn test_shorten_and_resolve() {
        let handler = create_handler();

        let response = handler.execute(&make_command(&["SHORTEN", "https://example.com"]));
        let short_url = response.as_str().unwrap();
        assert!(short_url.starts_with("http://localhost:6380/"));

        let alias = alias_of(&response);
        assert_eq!(alias.len(), 6);

        let response = handler.execute(&make_command(&["RESOLVE", &alias]));
        assert_eq!(response, RespValue::bulk_str("https://example.com"));
    }

    #[test]
    fn test_shorten_with_options() {
        let handler = create_handler();

        let response = handler.execute(&make_command(&[
            "SHORTEN",
            "https://example.com",
            "ttl",
            "300",
            "alias",
            "docs",
        ]));
        assert_eq!(response, RespValue::bulk_str("http://localhost:6380/docs"));

        let list = handler.execute(&make_command(&["LIST"]));
        let urls = list.field("urls").and_then(|u| u.as_array()).unwrap();
        assert_eq!(urls[0].field("ttl"), Some(&RespValue::integer(300)));
    }

    #[test]
    fn test_shorten_conflict() {
        let handler = create_handler();

        handler.execute(&make_command(&["SHORTEN", "T", "ALIAS", "abc"]));
        let response = handler.execute(&make_command(&["SHORTEN", "T", "ALIAS", "abc"]));

        assert_eq!(
            response,
            RespValue::error("CONFLICT alias already exists: abc")
        );
        assert_eq!(
            handler.execute(&make_command(&["DBSIZE"])),
            RespValue::integer(1)
        );
    }

    #[test]
    fn test_shorten_validation() {
        let handler = create_handler();

        assert!(handler.execute(&make_command(&["SHORTEN"])).is_error());
        assert!(handler.execute(&make_command(&["SHORTEN", ""])).is_error());
        assert_eq!(
            handler.execute(&make_command(&["SHORTEN", "t", "TTL", "0"])),
            RespValue::error("ERR ttl must be a positive integer")
        );
        assert_eq!(
            handler.execute(&make_command(&["SHORTEN", "t", "TTL", "-5"])),
            RespValue::error("ERR ttl must be a positive integer")
        );
        assert_eq!(
            handler.execute(&make_command(&["SHORTEN", "t", "TTL"])),
            RespValue::error("ERR syntax error")
        );
        assert_eq!(
            handler.execute(&make_command(&["SHORTEN", "t", "EX", "5"])),
            RespValue::error("ERR syntax error")
        );
        assert_eq!(
            handler.execute(&make_command(&["DBSIZE"])),
            RespValue::integer(0)
        );
    }

    #[test]
    fn test_resolve_missing() {
        let handler = create_handler();

        let response = handler.execute(&make_command(&["RESOLVE", "nope"]));
        assert!(response.is_null());
    }

    #[test]
    fn test_analytics() {
        let handler = create_handler();

        handler.execute(&make_command(&["SHORTEN", "https://example.com", "ALIAS", "ex"]));
        handler.execute(&make_command(&["RESOLVE", "ex"]));
        handler.execute(&make_command(&["RESOLVE", "ex"]));

        let response = handler.execute(&make_command(&["ANALYTICS", "ex"]));
        assert_eq!(response.field("alias"), Some(&RespValue::bulk_str("ex")));
        assert_eq!(
            response.field("long_url"),
            Some(&RespValue::bulk_str("https://example.com"))
        );
        assert_eq!(response.field("access_count"), Some(&RespValue::integer(2)));
        assert_eq!(
            response
                .field("access_times")
                .and_then(|t| t.as_array())
                .map(|t| t.len()),
            Some(2)
        );

        assert!(handler
            .execute(&make_command(&["ANALYTICS", "missing"]))
            .is_null());
    }

    #[test]
    fn test_update_rename() {
        let handler = create_handler();

        let short = handler.execute(&make_command(&["SHORTEN", "T1"]));
        let x = alias_of(&short);

        let response = handler.execute(&make_command(&["UPDATE", &x, "ALIAS", "Y"]));
        assert_eq!(response, RespValue::ok());

        assert_eq!(
            handler.execute(&make_command(&["RESOLVE", &x])),
            RespValue::null()
        );
        assert_eq!(
            handler.execute(&make_command(&["RESOLVE", "Y"])),
            RespValue::bulk_str("T1")
        );
    }

    #[test]
    fn test_update_errors() {
        let handler = create_handler();

        assert_eq!(
            handler.execute(&make_command(&["UPDATE", "missing", "TTL", "10"])),
            RespValue::error("NOTFOUND alias does not exist or has expired")
        );

        handler.execute(&make_command(&["SHORTEN", "a", "ALIAS", "one"]));
        handler.execute(&make_command(&["SHORTEN", "b", "ALIAS", "two"]));
        assert_eq!(
            handler.execute(&make_command(&["UPDATE", "one", "ALIAS", "two"])),
            RespValue::error("CONFLICT alias already exists: two")
        );
        assert!(handler
            .execute(&make_command(&["UPDATE", "one", "TTL", "abc"]))
            .is_error());
        assert!(handler.execute(&make_command(&["UPDATE"])).is_error());
    }

    #[test]
    fn test_delete() {
        let handler = create_handler();

        handler.execute(&make_command(&["SHORTEN", "t", "ALIAS", "gone"]));

        assert_eq!(
            handler.execute(&make_command(&["DELETE", "gone"])),
            RespValue::integer(1)
        );
        assert_eq!(
            handler.execute(&make_command(&["DEL", "gone"])),
            RespValue::integer(0)
        );
        assert!(handler.execute(&make_command(&["DELETE"])).is_error());
    }

    #[test]
    fn test_list() {
        let handler = create_handler();

        let empty = handler.execute(&make_command(&["LIST"]));
        assert_eq!(empty.field("total"), Some(&RespValue::integer(0)));
        assert_eq!(empty.field("ttl_queue_size"), Some(&RespValue::integer(0)));

        handler.execute(&make_command(&["SHORTEN", "https://a.example", "TTL", "60"]));
        handler.execute(&make_command(&["SHORTEN", "https://b.example", "TTL", "30"]));

        let list = handler.execute(&make_command(&["LIST"]));
        assert_eq!(list.field("total"), Some(&RespValue::integer(2)));
        assert_eq!(list.field("ttl_queue_size"), Some(&RespValue::integer(2)));

        let urls = list.field("urls").and_then(|u| u.as_array()).unwrap();
        // Soonest deadline first
        assert_eq!(
            urls[0].field("long_url"),
            Some(&RespValue::bulk_str("https://b.example"))
        );
        let remaining = urls[0]
            .field("time_remaining")
            .and_then(|r| r.as_integer())
            .unwrap();
        assert!((0..=30).contains(&remaining));
    }

    #[test]
    fn test_info() {
        let handler = create_handler();
        handler.execute(&make_command(&["SHORTEN", "t"]));

        let response = handler.execute(&make_command(&["INFO"]));
        let info = response.as_str().unwrap();
        assert!(info.contains("# Links"));
        assert!(info.contains("links:1"));
        assert!(info.contains("created:1"));
    }

    #[test]
    fn test_unknown_and_empty_command() {
        let handler = create_handler();

        assert_eq!(
            handler.execute(&make_command(&["FLUSHALL"])),
            RespValue::error("ERR unknown command 'FLUSHALL'")
        );
        assert_eq!(
            handler.execute(&[]),
            RespValue::error("ERR empty command")
        );
    }

    #[test]
    fn test_oversized_ttl_is_rejected() {
        let handler = create_handler();

        let response = handler.execute(&make_command(&[
            "SHORTEN",
            "t",
            "TTL",
            "9223372036854775807",
        ]));
        assert_eq!(
            response,
            RespValue::error(format!("ERR ttl must not exceed {} seconds", MAX_TTL_SECS))
        );

        let max = MAX_TTL_SECS.to_string();
        let response =
            handler.execute(&make_command(&["SHORTEN", "t", "TTL", &max, "ALIAS", "far"]));
        assert_eq!(response, RespValue::bulk_str("http://localhost:6380/far"));

        assert!(handler
            .execute(&make_command(&["UPDATE", "far", "TTL", "9223372036854775807"]))
            .is_error());
        assert_eq!(
            handler.execute(&make_command(&["RESOLVE", "far"])),
            RespValue::bulk_str("t")
        );
    }

    #[test]
    fn test_shorten_when_alias_space_is_full() {
        let registry = Arc::new(Registry::new(
            RegistryConfig::default().with_alias_length(1),
        ));
        let handler = CommandHandler::new(registry, "http://localhost:6380");

        for _ in 0..62 {
            assert!(!handler.execute(&make_command(&["SHORTEN", "t"])).is_error());
        }

        assert_eq!(
            handler.execute(&make_command(&["SHORTEN", "t"])),
            RespValue::error("ERR no free alias of length 1")
        );
        assert_eq!(
            handler.execute(&make_command(&["DBSIZE"])),
            RespValue::integer(62)
        );
    }
}
