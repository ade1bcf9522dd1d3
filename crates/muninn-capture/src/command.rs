//! Tagged command dispatch for controller front-ends.
//!
//! Commands are matched on the leading keyword with an explicit argument rule,
//! not by order-dependent substring scanning. Unknown input parses to `None`
//! so the caller can fall through to the generation primitive.

/// A recognized controller command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartRecording,
    StopRecording,
    /// Show what is known about the current identity.
    Summary,
    Search { query: String },
    Stats,
    Note { text: String },
    /// Erase the current identity's memory record.
    Reset,
    Exit,
}

/// How a command's parameter is extracted from the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgRule {
    /// The keyword stands alone; trailing text is rejected as a different input.
    None,
    /// Everything after the keyword, trimmed; required to be non-empty.
    Rest,
}

struct CommandSpec {
    keyword: &'static str,
    rule: ArgRule,
    build: fn(Option<String>) -> Option<Command>,
}

/// Keyword → command mapping with explicit parameter rules.
pub struct CommandTable {
    specs: Vec<CommandSpec>,
}

impl CommandTable {
    /// The standard controller vocabulary.
    pub fn standard() -> Self {
        Self {
            specs: vec![
                CommandSpec {
                    keyword: "start",
                    rule: ArgRule::None,
                    build: |_| Some(Command::StartRecording),
                },
                CommandSpec {
                    keyword: "stop",
                    rule: ArgRule::None,
                    build: |_| Some(Command::StopRecording),
                },
                CommandSpec {
                    keyword: "summary",
                    rule: ArgRule::None,
                    build: |_| Some(Command::Summary),
                },
                CommandSpec {
                    keyword: "search",
                    rule: ArgRule::Rest,
                    build: |arg| arg.map(|query| Command::Search { query }),
                },
                CommandSpec {
                    keyword: "stats",
                    rule: ArgRule::None,
                    build: |_| Some(Command::Stats),
                },
                CommandSpec {
                    keyword: "note",
                    rule: ArgRule::Rest,
                    build: |arg| arg.map(|text| Command::Note { text }),
                },
                CommandSpec {
                    keyword: "reset",
                    rule: ArgRule::None,
                    build: |_| Some(Command::Reset),
                },
                CommandSpec {
                    keyword: "exit",
                    rule: ArgRule::None,
                    build: |_| Some(Command::Exit),
                },
            ],
        }
    }

    /// Parse one input line. `None` means "not a command".
    pub fn parse(&self, input: &str) -> Option<Command> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let (head, rest) = match input.split_once(char::is_whitespace) {
            Some((h, r)) => (h, r.trim()),
            None => (input, ""),
        };
        let spec = self
            .specs
            .iter()
            .find(|s| s.keyword.eq_ignore_ascii_case(head))?;
        let arg = match spec.rule {
            ArgRule::None => {
                if !rest.is_empty() {
                    return None;
                }
                None
            }
            ArgRule::Rest => {
                if rest.is_empty() {
                    None
                } else {
                    Some(rest.to_string())
                }
            }
        };
        (spec.build)(arg)
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::standard()
    }
}
