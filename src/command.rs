//! User command parsing

use crate::consts;

/// How a command recognizes its trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The whole text must equal the trigger, ignoring case.
    Exact(&'static str),
    /// The text must start with the trigger, ignoring case. The rest is passed on as arguments.
    Prefix(&'static str),
}

impl Trigger {
    /// Checks if `input` matches the trigger, and if so, returns a string slice that makes up the
    /// arguments, if any.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bwmxmd::command::Trigger;
    /// let echo = Trigger::Prefix("!echo ");
    /// assert_eq!(echo.parse("!ECHO Hello"), Some("Hello"));
    /// assert_eq!(echo.parse("!echo "), Some(""));
    /// assert_eq!(echo.parse("!echo"), None);
    ///
    /// let ping = Trigger::Exact("!ping");
    /// assert_eq!(ping.parse("!Ping"), Some(""));
    /// assert_eq!(ping.parse("!ping pong"), None);
    /// ```
    #[must_use]
    pub fn parse<'a>(&self, input: &'a str) -> Option<&'a str> {
        match *self {
            Trigger::Exact(word) => (input.to_lowercase() == word).then_some(""),
            Trigger::Prefix(prefix) => {
                // The triggers are ASCII, so comparing the head byte-wise is enough.
                let head = input.get(..prefix.len())?;

                head.eq_ignore_ascii_case(prefix)
                    .then(|| &input[prefix.len()..])
            }
        }
    }
}

/// What a command replies with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Reply with a fixed text.
    Reply(&'static str),
    /// Reply with a fixed label followed by the command arguments.
    Labelled(&'static str),
}

impl Action {
    fn render(self, args: &str) -> String {
        match self {
            Action::Reply(text) => text.to_string(),
            Action::Labelled(label) => format!("{label}{args}"),
        }
    }
}

/// A single entry in the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// The name used when logging the command.
    pub name: &'static str,
    /// The trigger to match against.
    pub trigger: Trigger,
    /// The reply to produce.
    pub action: Action,
}

/// The commands the bot answers to, in order of precedence.
pub static COMMANDS: [Command; 3] = [
    Command {
        name: "hello",
        trigger: Trigger::Exact("!hello"),
        action: Action::Reply(consts::GREETING),
    },
    Command {
        name: "ping",
        trigger: Trigger::Exact("!ping"),
        action: Action::Reply(consts::PONG),
    },
    Command {
        name: "echo",
        trigger: Trigger::Prefix("!echo "),
        action: Action::Labelled(consts::ECHO_LABEL),
    },
];

/// A matched command and the reply it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The name of the command that matched.
    pub command: &'static str,
    /// The text to send back.
    pub text: String,
}

/// Matches `text` against the command table and returns the reply of the first command that
/// matches, if any.
#[must_use]
pub fn dispatch(text: &str) -> Option<Reply> {
    COMMANDS.iter().find_map(|command| {
        command.trigger.parse(text).map(|args| Reply {
            command: command.name,
            text: command.action.render(args),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &str) -> Option<String> {
        dispatch(text).map(|reply| reply.text)
    }

    #[test]
    fn hello_ignores_case() {
        assert_eq!(
            reply("!HELLO").as_deref(),
            Some("👋 Hello from Bwmxmd Quantum Edition!")
        );
        assert_eq!(reply("!hello").as_deref(), Some(consts::GREETING));
    }

    #[test]
    fn ping_replies_with_pong() {
        assert_eq!(reply("!ping").as_deref(), Some("🏓 Pong!"));
        assert_eq!(reply("!PiNg").as_deref(), Some("🏓 Pong!"));
    }

    #[test]
    fn exact_commands_reject_arguments() {
        assert_eq!(reply("!hello there"), None);
        assert_eq!(reply("!pingg"), None);
    }

    #[test]
    fn echo_keeps_original_case() {
        assert_eq!(reply("!echo foo bar").as_deref(), Some("Echoing: foo bar"));
        assert_eq!(reply("!EcHo Foo BAR").as_deref(), Some("Echoing: Foo BAR"));
    }

    #[test]
    fn echo_preserves_whitespace() {
        assert_eq!(reply("!echo   spaced").as_deref(), Some("Echoing:   spaced"));
    }

    #[test]
    fn echo_with_empty_remainder() {
        assert_eq!(reply("!echo ").as_deref(), Some("Echoing: "));
    }

    #[test]
    fn echo_requires_separator() {
        assert_eq!(reply("!echo"), None);
        assert_eq!(reply("!echoing"), None);
    }

    #[test]
    fn unmatched_text_has_no_reply() {
        assert_eq!(reply("hi there"), None);
        assert_eq!(reply(""), None);
        assert_eq!(reply("é"), None);
    }

    #[test]
    fn dispatch_names_the_command() {
        assert_eq!(dispatch("!echo x").map(|r| r.command), Some("echo"));
    }
}
