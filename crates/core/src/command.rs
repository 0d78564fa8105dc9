//! Argument lists for the database dump/restore tools.
//!
//! Arguments are built as a structured list and handed to the OS one by one,
//! so no shell ever parses user-supplied values. A shell-escaped rendering is
//! available for display.

use std::process::Stdio;

use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Flag(String),
    Value(String, String),
    Positional(String),
}

/// Ordered command-line arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    args: Vec<Arg>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// `--name`
    pub fn flag(mut self, name: &str) -> Self {
        self.args.push(Arg::Flag(name.to_string()));
        self
    }

    /// `--name=value`
    pub fn value(mut self, name: &str, value: impl Into<String>) -> Self {
        self.args.push(Arg::Value(name.to_string(), value.into()));
        self
    }

    /// `--name=v` once per value.
    pub fn values<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self = self.value(name, value);
        }
        self
    }

    pub fn positional(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg::Positional(value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// One OS argument per entry.
    pub fn to_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| match arg {
                Arg::Flag(name) => format!("--{name}"),
                Arg::Value(name, value) => format!("--{name}={value}"),
                Arg::Positional(value) => value.clone(),
            })
            .collect()
    }

    /// Copy-pasteable form with every value escaped.
    pub fn to_shell_string(&self, program: &str) -> String {
        let mut line = shell_escape(program);
        for arg in &self.args {
            line.push(' ');
            match arg {
                Arg::Flag(name) => line.push_str(&format!("--{name}")),
                Arg::Value(name, value) => line.push_str(&format!("--{name}={}", shell_escape(value))),
                Arg::Positional(value) => line.push_str(&shell_escape(value)),
            }
        }
        line
    }
}

/// Single-quote a value for a POSIX shell.
pub fn shell_escape(value: &str) -> String {
    let mut escaped = String::from("'");
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

/// A database host split into its connection fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbHost {
    pub host: String,
    pub port: Option<u16>,
    pub protocol: Option<String>,
    pub socket: Option<String>,
}

/// Split `host`, `host:port` or `host:/path/to/socket`.
///
/// An all-digit suffix is a TCP port; any other non-empty suffix is a socket.
/// Input with more than one `:` is kept whole as the host.
///
/// # Errors
///
/// `Error::Validation` when an all-digit suffix does not fit a port number.
pub fn parse_db_host(raw: &str) -> Result<DbHost, Error> {
    let mut host = DbHost { host: raw.to_string(), port: None, protocol: None, socket: None };

    let parts: Vec<&str> = raw.split(':').collect();
    if let [name, extra] = parts.as_slice() {
        host.host = name.to_string();
        let extra = extra.trim();
        if !extra.is_empty() && extra.chars().all(|c| c.is_ascii_digit()) {
            let port = extra
                .parse()
                .map_err(|_| Error::Validation(format!("database port out of range: {extra}")))?;
            host.port = Some(port);
            host.protocol = Some("tcp".into());
        } else if !extra.is_empty() {
            host.socket = Some(extra.to_string());
        }
    }
    Ok(host)
}

impl DbHost {
    pub fn append_to(&self, args: CommandArgs) -> CommandArgs {
        let mut args = args.value("host", &self.host);
        if let Some(port) = self.port {
            args = args.value("port", port.to_string());
        }
        if let Some(protocol) = &self.protocol {
            args = args.value("protocol", protocol);
        }
        if let Some(socket) = &self.socket {
            args = args.value("socket", socket);
        }
        args
    }
}

/// Credentials for the dump/restore tools.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConnection {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl std::fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnection")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl DbConnection {
    /// Connection arguments ending with the database name as the positional
    /// argument. The password is not among them; see [`DbConnection::env`].
    pub fn command_args(&self) -> Result<CommandArgs, Error> {
        Ok(parse_db_host(&self.host)?
            .append_to(CommandArgs::new())
            .value("user", &self.user)
            .positional(&self.database))
    }

    /// Environment for the child process, carrying the password.
    pub fn env(&self) -> Vec<(&'static str, String)> {
        vec![("MYSQL_PWD", self.password.clone())]
    }
}

/// Run `program` with `args` and inherited stdio, waiting for it to exit.
///
/// # Errors
///
/// `Error::Spawn` if the program cannot start, `Error::Command` on a
/// non-zero exit.
pub async fn run(program: &str, args: &CommandArgs, env: &[(&str, String)]) -> Result<(), Error> {
    tracing::debug!(command = %args.to_shell_string(program), "running");

    let status = tokio::process::Command::new(program)
        .args(args.to_args())
        .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|source| Error::Spawn { program: program.to_string(), source })?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Command { program: program.to_string(), code: status.code() })
    }
}
