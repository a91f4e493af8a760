//! Command tokens understood by the `makcu-cpp` backend executable.
//!
//! Every device action is delivered to the backend as a single command-line
//! argument following `--command`:
//!
//! ```text
//! <name>                      e.g. "disconnect"
//! <name>:<arg>[,<arg>...]     e.g. "move:10,-5", "lock_x:1"
//! ```
//!
//! The name and the argument list are separated by the first `:`; arguments
//! are separated by `,`.  [`DeviceCommand`] renders itself through
//! [`std::fmt::Display`] and parses back through [`std::str::FromStr`], and
//! the two are round-trip stable for every token this crate produces.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing a command token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The token was empty or contained only whitespace.
    #[error("empty command token")]
    Empty,

    /// The command name is not part of the backend grammar.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command received the wrong number of arguments.
    #[error("command `{command}` expects {expected} argument(s), got {got}")]
    ArgumentCount {
        command: &'static str,
        expected: &'static str,
        got: usize,
    },

    /// An argument could not be parsed into the expected type.
    #[error("invalid argument `{value}` for `{command}`: {reason}")]
    InvalidArgument {
        command: &'static str,
        value: String,
        reason: &'static str,
    },
}

// ── Mouse buttons ─────────────────────────────────────────────────────────────

/// Mouse buttons addressable by the backend.
///
/// The discriminants are the integer codes used on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MouseButton {
    Left = 0,
    Right = 1,
    Middle = 2,
    Side1 = 3,
    Side2 = 4,
}

impl MouseButton {
    /// All buttons in code order.
    pub const ALL: [MouseButton; 5] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::Side1,
        MouseButton::Side2,
    ];

    /// Returns the integer code sent to the backend.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MouseButton::Left),
            1 => Ok(MouseButton::Right),
            2 => Ok(MouseButton::Middle),
            3 => Ok(MouseButton::Side1),
            4 => Ok(MouseButton::Side2),
            _ => Err(()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// One logical command for the backend.
///
/// Values are built per call and discarded once the process has been spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Opens the serial link.  `None` asks the backend to auto-detect the port.
    Connect { port: Option<String> },
    Disconnect,
    /// Relative pointer movement.
    Move { dx: i32, dy: i32 },
    /// Relative movement interpolated by the backend over `segments` steps.
    MoveSmooth { dx: i32, dy: i32, segments: u32 },
    Click(MouseButton),
    Press(MouseButton),
    Release(MouseButton),
    /// Wheel movement; positive scrolls up.
    Scroll(i32),
    LockX(bool),
    LockY(bool),
    EnableHighPerformance(bool),
    /// Asks the backend whether the device link is up.
    Status,
    /// Asks the backend for the firmware version string.
    Version,
}

impl DeviceCommand {
    /// Returns the command name, i.e. the part of the token before `:`.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::Connect { .. } => "connect",
            DeviceCommand::Disconnect => "disconnect",
            DeviceCommand::Move { .. } => "move",
            DeviceCommand::MoveSmooth { .. } => "move_smooth",
            DeviceCommand::Click(_) => "click",
            DeviceCommand::Press(_) => "press",
            DeviceCommand::Release(_) => "release",
            DeviceCommand::Scroll(_) => "scroll",
            DeviceCommand::LockX(_) => "lock_x",
            DeviceCommand::LockY(_) => "lock_y",
            DeviceCommand::EnableHighPerformance(_) => "enable_high_performance",
            DeviceCommand::Status => "status",
            DeviceCommand::Version => "version",
        }
    }

    /// Returns the ordered argument list, already rendered for the wire.
    pub fn args(&self) -> Vec<String> {
        match self {
            DeviceCommand::Connect { port: Some(port) } => vec![port.clone()],
            DeviceCommand::Connect { port: None }
            | DeviceCommand::Disconnect
            | DeviceCommand::Status
            | DeviceCommand::Version => Vec::new(),
            DeviceCommand::Move { dx, dy } => vec![dx.to_string(), dy.to_string()],
            DeviceCommand::MoveSmooth { dx, dy, segments } => {
                vec![dx.to_string(), dy.to_string(), segments.to_string()]
            }
            DeviceCommand::Click(b) | DeviceCommand::Press(b) | DeviceCommand::Release(b) => {
                vec![b.code().to_string()]
            }
            DeviceCommand::Scroll(delta) => vec![delta.to_string()],
            DeviceCommand::LockX(on) | DeviceCommand::LockY(on) => {
                vec![if *on { "1" } else { "0" }.to_string()]
            }
            DeviceCommand::EnableHighPerformance(on) => vec![on.to_string()],
        }
    }

    /// Returns `true` for commands whose caller needs the backend's reply.
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            DeviceCommand::Connect { .. } | DeviceCommand::Status | DeviceCommand::Version
        )
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        let args = self.args();
        if !args.is_empty() {
            write!(f, ":{}", args.join(","))?;
        }
        Ok(())
    }
}

impl FromStr for DeviceCommand {
    type Err = CommandError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CommandError::Empty);
        }

        let (name, rest) = match token.split_once(':') {
            Some((name, rest)) => (name, Some(rest)),
            None => (token, None),
        };
        let args: Vec<&str> = match rest {
            Some(rest) if !rest.is_empty() => rest.split(',').collect(),
            _ => Vec::new(),
        };

        match name {
            "connect" => match args.as_slice() {
                [] => Ok(DeviceCommand::Connect { port: None }),
                [port] => Ok(DeviceCommand::Connect {
                    port: Some((*port).to_string()),
                }),
                _ => Err(arg_count("connect", "0 or 1", args.len())),
            },
            "disconnect" => no_args("disconnect", &args).map(|_| DeviceCommand::Disconnect),
            "status" => no_args("status", &args).map(|_| DeviceCommand::Status),
            "version" => no_args("version", &args).map(|_| DeviceCommand::Version),
            "move" => match args.as_slice() {
                [dx, dy] => Ok(DeviceCommand::Move {
                    dx: parse_int("move", dx)?,
                    dy: parse_int("move", dy)?,
                }),
                _ => Err(arg_count("move", "2", args.len())),
            },
            "move_smooth" => match args.as_slice() {
                [dx, dy, segments] => Ok(DeviceCommand::MoveSmooth {
                    dx: parse_int("move_smooth", dx)?,
                    dy: parse_int("move_smooth", dy)?,
                    segments: segments.parse().map_err(|_| CommandError::InvalidArgument {
                        command: "move_smooth",
                        value: (*segments).to_string(),
                        reason: "expected a non-negative segment count",
                    })?,
                }),
                _ => Err(arg_count("move_smooth", "3", args.len())),
            },
            "click" => one_button("click", &args).map(DeviceCommand::Click),
            "press" => one_button("press", &args).map(DeviceCommand::Press),
            "release" => one_button("release", &args).map(DeviceCommand::Release),
            "scroll" => match args.as_slice() {
                [delta] => Ok(DeviceCommand::Scroll(parse_int("scroll", delta)?)),
                _ => Err(arg_count("scroll", "1", args.len())),
            },
            "lock_x" => one_flag("lock_x", &args).map(DeviceCommand::LockX),
            "lock_y" => one_flag("lock_y", &args).map(DeviceCommand::LockY),
            "enable_high_performance" => match args.as_slice() {
                ["true"] => Ok(DeviceCommand::EnableHighPerformance(true)),
                ["false"] => Ok(DeviceCommand::EnableHighPerformance(false)),
                [other] => Err(CommandError::InvalidArgument {
                    command: "enable_high_performance",
                    value: (*other).to_string(),
                    reason: "expected `true` or `false`",
                }),
                _ => Err(arg_count("enable_high_performance", "1", args.len())),
            },
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn arg_count(command: &'static str, expected: &'static str, got: usize) -> CommandError {
    CommandError::ArgumentCount {
        command,
        expected,
        got,
    }
}

fn no_args(command: &'static str, args: &[&str]) -> Result<(), CommandError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(arg_count(command, "0", args.len()))
    }
}

fn parse_int(command: &'static str, value: &str) -> Result<i32, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidArgument {
        command,
        value: value.to_string(),
        reason: "expected a signed integer",
    })
}

fn one_button(command: &'static str, args: &[&str]) -> Result<MouseButton, CommandError> {
    let [code] = args else {
        return Err(arg_count(command, "1", args.len()));
    };
    code.parse::<u8>()
        .ok()
        .and_then(|c| MouseButton::try_from(c).ok())
        .ok_or_else(|| CommandError::InvalidArgument {
            command,
            value: (*code).to_string(),
            reason: "expected a button code between 0 and 4",
        })
}

fn one_flag(command: &'static str, args: &[&str]) -> Result<bool, CommandError> {
    match args {
        ["1"] => Ok(true),
        ["0"] => Ok(false),
        [other] => Err(CommandError::InvalidArgument {
            command,
            value: (*other).to_string(),
            reason: "expected `0` or `1`",
        }),
        _ => Err(arg_count(command, "1", args.len())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
