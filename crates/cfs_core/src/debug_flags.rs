use std::sync::OnceLock;

/// True when `name` is set to 1/true/yes/on, case-insensitive.
fn env_flag_enabled(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };
    let raw = raw.trim();
    ["1", "true", "yes", "on"].iter().any(|on| raw.eq_ignore_ascii_case(on))
}

/// Per-slot trace output while building feature vectors (`CFS_DEBUG_ENCODING`).
pub fn encoding_debug_enabled() -> bool {
    if !cfg!(debug_assertions) {
        return false;
    }
    static FLAG: OnceLock<bool> = OnceLock::new();
    *FLAG.get_or_init(|| env_flag_enabled("CFS_DEBUG_ENCODING"))
}
