//! Per-(user, post) vote state machine and aggregate tally.
//!
//! A user holds at most one vote per post. Voting in the direction already
//! held retracts it; voting the other way flips it. Aggregates are always
//! recomputed from the stored vote values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "up" => Some(VoteDirection::Up),
            "down" => Some(VoteDirection::Down),
            _ => None,
        }
    }

    pub fn value(self) -> i16 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// Row operation needed to move from the current vote to the next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    Insert(i16),
    Update(i16),
    Delete,
}

impl VoteChange {
    /// The caller's vote value after the change is applied.
    pub fn resulting_value(self) -> Option<i16> {
        match self {
            VoteChange::Insert(v) | VoteChange::Update(v) => Some(v),
            VoteChange::Delete => None,
        }
    }
}

pub fn transition(current: Option<i16>, direction: VoteDirection) -> VoteChange {
    let wanted = direction.value();
    match current {
        None => VoteChange::Insert(wanted),
        Some(v) if v == wanted => VoteChange::Delete,
        Some(_) => VoteChange::Update(wanted),
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteTally {
    pub votes: i64,
    pub upvotes: i64,
    pub downvotes: i64,
}

impl VoteTally {
    pub fn new(upvotes: i64, downvotes: i64) -> Self {
        Self {
            votes: upvotes - downvotes,
            upvotes,
            downvotes,
        }
    }

    pub fn from_values<I: IntoIterator<Item = i16>>(values: I) -> Self {
        let (up, down) = values.into_iter().fold((0, 0), |(up, down), v| match v {
            1 => (up + 1, down),
            -1 => (up, down + 1),
            _ => (up, down),
        });
        Self::new(up, down)
    }
}

/// Result of a vote: the recomputed tally and the caller's new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub tally: VoteTally,
    pub user_vote: Option<i16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoteDirection::{Down, Up};

    #[test]
    fn state_machine_covers_every_transition() {
        assert_eq!(transition(None, Up), VoteChange::Insert(1));
        assert_eq!(transition(None, Down), VoteChange::Insert(-1));
        assert_eq!(transition(Some(1), Up), VoteChange::Delete);
        assert_eq!(transition(Some(1), Down), VoteChange::Update(-1));
        assert_eq!(transition(Some(-1), Down), VoteChange::Delete);
        assert_eq!(transition(Some(-1), Up), VoteChange::Update(1));
    }

    #[test]
    fn parse_accepts_only_up_and_down() {
        assert_eq!(VoteDirection::parse("up"), Some(Up));
        assert_eq!(VoteDirection::parse("down"), Some(Down));
        assert_eq!(VoteDirection::parse("upvote"), None);
        assert_eq!(VoteDirection::parse(""), None);
    }

    #[test]
    fn tally_is_recomputed_from_values() {
        let tally = VoteTally::from_values([1, 1, -1, 1, -1, -1, -1]);
        assert_eq!(tally, VoteTally { votes: -1, upvotes: 3, downvotes: 4 });
        assert_eq!(VoteTally::from_values(std::iter::empty()), VoteTally::default());
    }

    #[test]
    fn any_action_sequence_keeps_a_single_consistent_vote() {
        let actions = [Up, Up, Down, Down, Up, Down, Up, Up, Down];
        let mut current: Option<i16> = None;
        for action in actions {
            current = transition(current, action).resulting_value();
            let tally = VoteTally::from_values(current);
            assert!(tally.upvotes + tally.downvotes <= 1);
            assert_eq!(tally.upvotes - tally.downvotes, tally.votes);
        }
    }

    #[test]
    fn voting_twice_in_the_same_direction_is_a_no_op_overall() {
        for dir in [Up, Down] {
            let first = transition(None, dir).resulting_value();
            let second = transition(first, dir).resulting_value();
            assert_eq!(second, None);
        }
    }
}
