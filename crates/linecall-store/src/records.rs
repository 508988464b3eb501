//! Read models served back out of the store.

use serde::Serialize;

/// One row of the leaderboard, ordered by score descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_entry_json_shape() {
        let entry = LeaderboardEntry {
            username: "ada".into(),
            score: 128,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"username": "ada", "score": 128}));
    }
}
