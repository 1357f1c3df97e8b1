//! Operator commands read from stdin, one per line.
//!
//! Scene commands act on the render loop directly. Account commands are
//! forwarded to the account task, which talks to the backend without
//! stalling frames.

use carbonscape_types::YearLabel;

/// Help text printed for `help` and unknown input.
pub const HELP: &str = "commands: p | <year> | health | login <email> | signup <name> <email> \
                        | logout | items | add <item> <count> | predict | suggest | apply <n> | q";

/// A parsed operator line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Toggle autoplay and orbit motion.
    TogglePause,
    /// Jump to a year.
    SelectYear(YearLabel),
    /// Log the animal health panel.
    Health,
    /// Backend-facing command.
    Account(AccountCommand),
    /// Print the command list.
    Help,
    /// Stop the viewer.
    Quit,
}

/// Commands handled by the account task.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountCommand {
    /// Log in by email.
    Login {
        /// Account email.
        email: String,
    },
    /// Create an account.
    Signup {
        /// Display name.
        name: String,
        /// Account email.
        email: String,
    },
    /// Forget identity and cache, fall back to the sample.
    Logout,
    /// Reload item counts.
    Items,
    /// Add to an item count.
    AddItem {
        /// Item name.
        item: String,
        /// Amount to add.
        count: f64,
    },
    /// Recompute the projection from current items.
    Predict,
    /// Fetch suggestions for the year on screen.
    Suggest {
        /// Year shown when the command was entered.
        year: Option<YearLabel>,
    },
    /// Apply a suggestion from the last `suggest` listing (1-based).
    Apply {
        /// Year shown when the command was entered.
        year: Option<YearLabel>,
        /// Position in the last listing.
        index: usize,
    },
}

/// Why a line was not understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Blank line.
    #[error("empty command")]
    Empty,
    /// A known command with bad arguments.
    #[error("usage: {usage}")]
    Usage {
        /// Expected form.
        usage: &'static str,
    },
    /// Not a command.
    #[error("unknown command: {input}")]
    Unknown {
        /// The offending word.
        input: String,
    },
}

impl Command {
    /// Parse one line. `current_year` fills in year-scoped account commands.
    pub fn parse(line: &str, current_year: Option<&YearLabel>) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ParseError::Empty);
        };
        let rest: Vec<&str> = words.collect();

        let command = match (head, rest.as_slice()) {
            ("p" | "pause", []) => Self::TogglePause,
            ("health", []) => Self::Health,
            ("help" | "?", _) => Self::Help,
            ("q" | "quit", []) => Self::Quit,
            ("login", [email]) => Self::Account(AccountCommand::Login {
                email: (*email).to_owned(),
            }),
            ("login", _) => return Err(ParseError::Usage { usage: "login <email>" }),
            ("signup", [name, email]) => Self::Account(AccountCommand::Signup {
                name: (*name).to_owned(),
                email: (*email).to_owned(),
            }),
            ("signup", _) => {
                return Err(ParseError::Usage {
                    usage: "signup <name> <email>",
                });
            }
            ("logout", []) => Self::Account(AccountCommand::Logout),
            ("items", []) => Self::Account(AccountCommand::Items),
            ("add", [item, count]) => {
                let count = count
                    .parse::<f64>()
                    .ok()
                    .filter(|c| c.is_finite())
                    .ok_or(ParseError::Usage {
                        usage: "add <item> <count>",
                    })?;
                Self::Account(AccountCommand::AddItem {
                    item: (*item).to_owned(),
                    count,
                })
            }
            ("add", _) => {
                return Err(ParseError::Usage {
                    usage: "add <item> <count>",
                });
            }
            ("predict", []) => Self::Account(AccountCommand::Predict),
            ("suggest", []) => Self::Account(AccountCommand::Suggest {
                year: current_year.cloned(),
            }),
            ("apply", [n]) => {
                let index = n
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ParseError::Usage { usage: "apply <n>" })?;
                Self::Account(AccountCommand::Apply {
                    year: current_year.cloned(),
                    index,
                })
            }
            (year, []) if year.chars().all(|c| c.is_ascii_digit()) => {
                Self::SelectYear(YearLabel::from(year))
            }
            (other, _) => {
                return Err(ParseError::Unknown {
                    input: other.to_owned(),
                });
            }
        };
        Ok(command)
    }
}
