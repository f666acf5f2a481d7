use tracing::debug;

use crate::ruleset::RulesetConfig;

/// Settings the host applies when it creates a record of some type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordDefaults {
    /// Link the record's prototype token to its sheet.
    pub link_token: bool,
}

impl RecordDefaults {
    /// Looks `record_type` up in the ruleset's token-sync map.
    ///
    /// Leading decoration such as an icon is ignored (`"🕛 clock"` reads as `"clock"`).
    pub fn for_record(record_type: &str, ruleset: &RulesetConfig) -> Self {
        let key = record_type
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim()
            .to_lowercase();
        let link_token = ruleset.token_sync.get(&key).copied().unwrap_or(false);
        debug!(record_type = %key, link_token, "record defaults");
        Self { link_token }
    }
}
