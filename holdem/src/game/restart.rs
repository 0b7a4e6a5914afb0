//! Unanimous-consent restart votes.
//!
//! Once a hand is complete any seated player can propose dealing the next
//! one. The players seated at that moment form the electorate; a single
//! rejection declines the proposal, and acceptance from every one of them
//! approves it.

use std::collections::{BTreeMap, BTreeSet};

use super::{
    entities::{PlayerId, VoteView},
    state_machine::{GameError, IllegalAction, InvalidTransition},
};

/// What a request or ballot led to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoteProgress {
    Pending,
    Approved,
    Declined,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum VoteState {
    #[default]
    Idle,
    Voting {
        requester: PlayerId,
        electorate: BTreeSet<PlayerId>,
        ballots: BTreeMap<PlayerId, bool>,
    },
    Resolved(VoteProgress),
}

#[derive(Clone, Debug, Default)]
pub struct RestartVote {
    state: VoteState,
}

impl RestartVote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &VoteState {
        &self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, VoteState::Voting { .. })
    }

    /// Forget any vote, open or resolved.
    pub fn clear(&mut self) {
        self.state = VoteState::Idle;
    }

    /// Open a vote. The requester's own ballot is an acceptance.
    pub fn request(
        &mut self,
        requester: &PlayerId,
        seated: impl IntoIterator<Item = PlayerId>,
    ) -> Result<VoteProgress, GameError> {
        if self.is_open() {
            return Err(InvalidTransition::VoteInProgress.into());
        }
        let electorate: BTreeSet<PlayerId> = seated.into_iter().collect();
        if !electorate.contains(requester) {
            return Err(GameError::UnknownPlayer);
        }
        let ballots = BTreeMap::from([(requester.clone(), true)]);
        self.state = VoteState::Voting {
            requester: requester.clone(),
            electorate,
            ballots,
        };
        Ok(self.tally())
    }

    /// Record one ballot.
    pub fn cast(&mut self, voter: &PlayerId, accept: bool) -> Result<VoteProgress, GameError> {
        let VoteState::Voting {
            electorate,
            ballots,
            ..
        } = &mut self.state
        else {
            return Err(InvalidTransition::NoVoteOpen.into());
        };
        if !electorate.contains(voter) {
            return Err(IllegalAction::NotEligibleToVote.into());
        }
        if ballots.contains_key(voter) {
            return Err(IllegalAction::AlreadyVoted.into());
        }
        ballots.insert(voter.clone(), accept);
        Ok(self.tally())
    }

    fn tally(&mut self) -> VoteProgress {
        let VoteState::Voting {
            electorate,
            ballots,
            ..
        } = &self.state
        else {
            return VoteProgress::Pending;
        };
        let progress = if ballots.values().any(|accept| !accept) {
            VoteProgress::Declined
        } else if electorate.iter().all(|voter| ballots.contains_key(voter)) {
            VoteProgress::Approved
        } else {
            VoteProgress::Pending
        };
        if progress != VoteProgress::Pending {
            self.state = VoteState::Resolved(progress);
        }
        progress
    }

    #[must_use]
    pub fn view(&self) -> Option<VoteView> {
        let VoteState::Voting {
            requester,
            electorate,
            ballots,
        } = &self.state
        else {
            return None;
        };
        Some(VoteView {
            requester: requester.clone(),
            accepted: ballots
                .iter()
                .filter(|(_, accept)| **accept)
                .map(|(id, _)| id.clone())
                .collect(),
            pending: electorate
                .iter()
                .filter(|id| !ballots.contains_key(*id))
                .cloned()
                .collect(),
        })
    }
}
