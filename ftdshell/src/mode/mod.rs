//! CLI operating modes of the appliance and the machine that moves
//! between them.

mod machine;
mod transition;

pub use machine::ModeMachine;
pub use transition::{Procedure, Step, StepInput, TransitionTable};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the five operating contexts of the appliance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The standard operational shell, entered on login.
    #[default]
    Regular,
    /// The diagnostic CLI (`system support diagnostic-cli`).
    DiagnosticCli,
    /// The data plane console reached through `sfconsole`.
    Lina,
    /// The root expert shell.
    Expert,
    /// The configuration shell.
    Clish,
}

impl Mode {
    /// All modes, in table order.
    pub const ALL: [Mode; 5] = [
        Mode::Regular,
        Mode::DiagnosticCli,
        Mode::Lina,
        Mode::Expert,
        Mode::Clish,
    ];

    /// Number of `exit` commands that lead from this mode back to
    /// [`Mode::Regular`].
    pub fn exit_depth(self) -> usize {
        match self {
            Mode::Regular => 0,
            Mode::DiagnosticCli => 2,
            Mode::Expert => 2,
            Mode::Clish => 3,
            Mode::Lina => 4,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Mode::Regular => "regular",
            Mode::DiagnosticCli => "diagnostic_cli",
            Mode::Lina => "lina",
            Mode::Expert => "expert",
            Mode::Clish => "clish",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "regular" => Ok(Mode::Regular),
            "diagnostic_cli" | "diag" => Ok(Mode::DiagnosticCli),
            "lina" => Ok(Mode::Lina),
            "expert" => Ok(Mode::Expert),
            "clish" => Ok(Mode::Clish),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_through_from_str() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("Diagnostic-CLI".parse::<Mode>().unwrap(), Mode::DiagnosticCli);
        assert_eq!("diag".parse::<Mode>().unwrap(), Mode::DiagnosticCli);
        assert_eq!(
            "enable".parse::<Mode>().unwrap_err(),
            UnknownMode("enable".into())
        );
    }

    #[test]
    fn test_exit_depths() {
        assert_eq!(Mode::Regular.exit_depth(), 0);
        assert_eq!(Mode::DiagnosticCli.exit_depth(), 2);
        assert_eq!(Mode::Expert.exit_depth(), 2);
        assert_eq!(Mode::Clish.exit_depth(), 3);
        assert_eq!(Mode::Lina.exit_depth(), 4);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Mode::DiagnosticCli).unwrap(),
            "\"diagnostic_cli\""
        );
        let mode: Mode = serde_json::from_str("\"lina\"").unwrap();
        assert_eq!(mode, Mode::Lina);
        assert_eq!(Mode::default(), Mode::Regular);
    }
}
