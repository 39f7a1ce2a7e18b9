use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    /// Path segment used by the vote endpoints (`upvote` / `downvote`).
    pub fn endpoint(self) -> &'static str {
        match self {
            Vote::Up => "upvote",
            Vote::Down => "downvote",
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vote::Up => write!(f, "up"),
            Vote::Down => write!(f, "down"),
        }
    }
}

impl std::str::FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "upvote" => Ok(Vote::Up),
            "down" | "downvote" => Ok(Vote::Down),
            other => Err(format!("Invalid vote: {other}")),
        }
    }
}

/// Vote counters of an item together with the viewer's own ballot.
///
/// Counters are signed so that arithmetic on a desynchronised tally is
/// carried out as written rather than panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
    pub user_vote: Option<Vote>,
}

impl VoteTally {
    pub fn new(upvotes: i64, downvotes: i64, user_vote: Option<Vote>) -> Self {
        Self {
            upvotes,
            downvotes,
            user_vote,
        }
    }

    fn counter_mut(&mut self, vote: Vote) -> &mut i64 {
        match vote {
            Vote::Up => &mut self.upvotes,
            Vote::Down => &mut self.downvotes,
        }
    }
}

/// Computes the tally that results from the viewer casting `requested`.
///
/// Casting the same vote again withdraws it, casting the opposite vote moves
/// the ballot from one counter to the other, and a first vote adds one to the
/// requested counter.
pub fn compute_vote_delta(current: VoteTally, requested: Vote) -> VoteTally {
    let mut next = current;
    match current.user_vote {
        Some(previous) if previous == requested => {
            *next.counter_mut(requested) -= 1;
            next.user_vote = None;
        }
        Some(previous) => {
            *next.counter_mut(requested) += 1;
            *next.counter_mut(previous) -= 1;
            next.user_vote = Some(requested);
        }
        None => {
            *next.counter_mut(requested) += 1;
            next.user_vote = Some(requested);
        }
    }
    next
}

/// Items that carry vote counters: posts and comments.
pub trait Votable {
    fn tally(&self) -> VoteTally;

    fn set_tally(&mut self, tally: VoteTally);

    fn cast_vote(&mut self, vote: Vote) {
        let next = compute_vote_delta(self.tally(), vote);
        self.set_tally(next);
    }
}
