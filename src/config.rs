use crate::engine::fen::STARTING_FEN;

/// Rule thresholds and the starting position, parsed from environment
/// variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// FEN a new game starts from.
    pub start_fen: String,
    /// Halfmove clock value at which the fifty-move draw applies.
    pub fifty_move_plies: u16,
    /// Occurrences of one signature that make a repetition draw.
    pub repetition_count: usize,
}

impl GameConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup; unset or unparsable
    /// values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = GameConfig::default();
        GameConfig {
            start_fen: lookup("CHESS_START_FEN")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.start_fen),
            fifty_move_plies: lookup("CHESS_FIFTY_MOVE_PLIES")
                .and_then(|v| v.trim().parse().ok())
                .filter(|&v| v > 0)
                .unwrap_or(defaults.fifty_move_plies),
            repetition_count: lookup("CHESS_REPETITION_COUNT")
                .and_then(|v| v.trim().parse().ok())
                .filter(|&v| v > 0)
                .unwrap_or(defaults.repetition_count),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            start_fen: STARTING_FEN.to_string(),
            fifty_move_plies: 100,
            repetition_count: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = GameConfig::default();
        assert_eq!(config.start_fen, STARTING_FEN);
        assert_eq!(config.fifty_move_plies, 100);
        assert_eq!(config.repetition_count, 3);
    }

    #[test]
    fn lookup_overrides() {
        let config = GameConfig::from_lookup(lookup_from(&[
            ("CHESS_START_FEN", "4k3/8/8/8/8/8/8/4K3 w - - 0 1"),
            ("CHESS_FIFTY_MOVE_PLIES", "150"),
            ("CHESS_REPETITION_COUNT", "5"),
        ]));
        assert_eq!(config.start_fen, "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(config.fifty_move_plies, 150);
        assert_eq!(config.repetition_count, 5);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = GameConfig::from_lookup(lookup_from(&[
            ("CHESS_START_FEN", "   "),
            ("CHESS_FIFTY_MOVE_PLIES", "lots"),
            ("CHESS_REPETITION_COUNT", "0"),
        ]));
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn from_env_defaults() {
        // Without setting env vars, should fall back to defaults
        let config = GameConfig::from_env();
        assert_eq!(config.fifty_move_plies, 100);
        assert_eq!(config.repetition_count, 3);
    }
}
