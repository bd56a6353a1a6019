//! Summary of a completed level.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::types::LevelId;

/// Result of a completed level, reported once on entering `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct CompletionReport {
    /// The finished level.
    level: LevelId,
    /// Seconds on the clock when the last group resolved.
    elapsed_secs: u64,
    /// Wrong groups submitted.
    mistakes: u32,
    /// Hints used.
    hints_used: u8,
    /// The level that will start automatically, if any.
    next: Option<LevelId>,
}

impl CompletionReport {
    /// Whether this was the last level of the campaign.
    pub fn is_campaign_finished(&self) -> bool {
        self.next.is_none()
    }

    /// Text the player can share.
    pub fn share_text(&self) -> String {
        format!(
            "أنهيت المستوى {} في لعبة رَبْط خلال {}! جربها الآن.",
            self.level.index(),
            format_clock(self.elapsed_secs)
        )
    }
}

/// Formats seconds as `m:ss`.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tier;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(600), "10:00");
    }

    #[test]
    fn test_share_text_mentions_index_and_time() {
        let level = LevelId::new(Tier::Beginner, 2).expect("valid");
        let report = CompletionReport::new(level, 75, 1, 0, None);
        let text = report.share_text();
        assert!(text.contains('2'));
        assert!(text.contains("1:15"));
        assert!(report.is_campaign_finished());
    }
}
