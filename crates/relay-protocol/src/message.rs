//! Well-known command literals.

use relay_core::{Command, CommandError};

/// Synchronization pulse, relayed to every other client.
pub const PULSE_ALPHA: &str = "pulse_alpha";

/// Synchronization pulse, relayed to every other client.
pub const PULSE_BETA: &str = "pulse_beta";

/// Client request to close its own connection.
pub const QUIT: &str = "quit";

/// Server-synthesized notification that a player joined.
pub const PLAYER_CONNECT: &str = "player_connect";

/// Server-synthesized notification that a player left.
pub const PLAYER_DISCONNECT: &str = "player_disconnect";

/// Prefix of the player-count reply sent to a newly connected client.
const NUM_PLAYERS_PREFIX: &str = "num_players ";

/// The complete set of commands that trigger a broadcast.
pub const PULSE_COMMANDS: [&str; 2] = [PULSE_ALPHA, PULSE_BETA];

/// Returns true if `command` is exactly one of [`PULSE_COMMANDS`].
pub fn is_pulse(command: &Command) -> bool {
    PULSE_COMMANDS.iter().any(|literal| command.is(literal))
}

/// Builds the `num_players <count>` reply.
///
/// # Errors
///
/// Never fails in practice (the formatted text has no delimiter); the
/// `Result` comes from [`Command`] construction.
pub fn num_players(count: usize) -> Result<Command, CommandError> {
    Command::new(format!("{NUM_PLAYERS_PREFIX}{count}"))
}

/// Parses a `num_players <count>` reply. Returns `None` for anything else.
pub fn parse_num_players(command: &Command) -> Option<usize> {
    std::str::from_utf8(command.as_bytes())
        .ok()?
        .strip_prefix(NUM_PLAYERS_PREFIX)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_set_is_exact() {
        assert!(is_pulse(&Command::try_from("pulse_alpha").unwrap()));
        assert!(is_pulse(&Command::try_from("pulse_beta").unwrap()));

        for other in ["foo", "pulse_gamma", "pulse_alpha ", "PULSE_ALPHA", "", "quit"] {
            assert!(
                !is_pulse(&Command::try_from(other).unwrap()),
                "{other:?} must not trigger a broadcast"
            );
        }
    }

    #[test]
    fn test_lifecycle_literals_are_not_pulses() {
        assert!(!is_pulse(&Command::try_from(PLAYER_CONNECT).unwrap()));
        assert!(!is_pulse(&Command::try_from(PLAYER_DISCONNECT).unwrap()));
    }

    #[test]
    fn test_num_players() {
        let cmd = num_players(3).unwrap();
        assert_eq!(cmd.as_bytes(), b"num_players 3");
        assert_eq!(parse_num_players(&cmd), Some(3));
    }

    #[test]
    fn test_parse_num_players_rejects_garbage() {
        assert_eq!(parse_num_players(&Command::try_from("num_players").unwrap()), None);
        assert_eq!(parse_num_players(&Command::try_from("num_players x").unwrap()), None);
        assert_eq!(parse_num_players(&Command::try_from("pulse_alpha").unwrap()), None);
    }
}
