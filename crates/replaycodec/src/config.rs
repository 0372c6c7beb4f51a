//! Replay configuration.

use replaycodec_events::EventStreamConfig;
use serde::{Deserialize, Serialize};

/// Where each replay member lives and which schema type decodes it.
///
/// The defaults match the schema bindings and member names shipped with
/// the game. Deserializing fills any missing field from the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Type of the versioned header in the user-data block.
    pub header_type: String,

    /// Type of the versioned details member.
    pub details_type: String,

    /// Type of the bit-packed init data member.
    pub init_data_type: String,

    pub details_member: String,

    pub init_data_member: String,

    pub tracker_events_member: String,

    pub game_events_member: String,

    pub message_events_member: String,

    /// How the tracker stream is read.
    pub tracker_events: EventStreamConfig,

    /// How the game event stream is read.
    pub game_events: EventStreamConfig,

    /// How the message event stream is read.
    pub message_events: EventStreamConfig,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            header_type: "replay_header_typeid".into(),
            details_type: "game_details_typeid".into(),
            init_data_type: "replay_initdata_typeid".into(),
            details_member: "replay.details".into(),
            init_data_member: "replay.initData".into(),
            tracker_events_member: "replay.tracker.events".into(),
            game_events_member: "replay.game.events".into(),
            message_events_member: "replay.message.events".into(),
            tracker_events: EventStreamConfig::tracker(),
            game_events: EventStreamConfig::game(),
            message_events: EventStreamConfig::message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReplayConfig::default();
        assert_eq!(config.header_type, "replay_header_typeid");
        assert_eq!(config.init_data_member, "replay.initData");
        assert_eq!(config.tracker_events, EventStreamConfig::tracker());
        assert_eq!(config.game_events, EventStreamConfig::game());
        assert_eq!(config.message_events, EventStreamConfig::message());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ReplayConfig =
            serde_json::from_str(r#"{"details_member": "details.bin"}"#).unwrap();
        assert_eq!(config.details_member, "details.bin");
        assert_eq!(config.details_type, "game_details_typeid");
    }

    #[test]
    fn test_nested_stream_config_fills_from_default() {
        let config: ReplayConfig =
            serde_json::from_str(r#"{"game_events": {"delta_type": "7"}}"#).unwrap();
        assert_eq!(config.game_events.delta_type, "7");
        // Missing nested fields come from `EventStreamConfig::default()`,
        // the tracker preset.
        assert_eq!(config.game_events.catalog, "tracker_event_types");
        assert_eq!(config.message_events, EventStreamConfig::message());
    }
}
