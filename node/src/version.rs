use chrono::{DateTime, Utc};

/// Development phase: "prod", "alpha" or "beta"
pub const PHASE: &str = "alpha";

/// Commit hash baked in at build time, if the build set one
pub const GIT_COMMIT: Option<&str> = option_env!("O2UL_GIT_COMMIT");

/// `vYYYY.MM.DD.HHMM-<phase>`, with ` [<8-char commit>]` appended when the
/// commit is long enough to abbreviate
pub fn format_version(timestamp: DateTime<Utc>, phase: &str, commit: Option<&str>) -> String {
    let version = format!("v{}-{}", timestamp.format("%Y.%m.%d.%H%M"), phase);
    match commit.and_then(|c| c.get(..8)) {
        Some(short) => format!("{} [{}]", version, short),
        None => version,
    }
}

/// Version string of this binary at `now`
pub fn current_version(now: DateTime<Utc>) -> String {
    format_version(now, PHASE, GIT_COMMIT)
}
