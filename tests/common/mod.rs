use std::sync::Once;

use chess_rules::{Position, Square, find_move};

/// Install a test subscriber once; `RUST_LOG=chess_rules=trace` shows engine events.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "chess_rules=warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

#[allow(dead_code)]
pub fn sq(name: &str) -> Square {
    Square::from_algebraic(name).unwrap()
}

/// Apply a from/to move that must be legal.
#[allow(dead_code)]
pub fn play(pos: &Position, from: &str, to: &str) -> Position {
    let mv = find_move(pos, sq(from), sq(to)).unwrap();
    pos.apply(mv)
}
