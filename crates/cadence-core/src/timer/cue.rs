use std::fmt;

use serde::{Deserialize, Serialize};

/// A discrete signal emitted by a timer transition.
///
/// Hosts map these onto sounds, vibration or visual highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueEvent {
    /// A rest-type stage is about to hand over to work.
    Prepare,
    /// A work stage ended and another cycle follows.
    Stop,
    /// The last work stage ended.
    Finish,
}

impl CueEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CueEvent::Prepare => "prepare",
            CueEvent::Stop => "stop",
            CueEvent::Finish => "finish",
        }
    }
}

impl fmt::Display for CueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&[CueEvent::Prepare, CueEvent::Stop, CueEvent::Finish])
            .unwrap();
        assert_eq!(json, r#"["prepare","stop","finish"]"#);
    }
}
