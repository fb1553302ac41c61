//! Composition root of the voting process.
//!
//! Every public operation follows the same sequence: resolve the caller,
//! check its role, check the phase, delegate to a registry or the tally,
//! then publish exactly one event. All checks run before any mutation, so a
//! rejected call leaves the state untouched.

use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::governance::error::{Role, VotingError, VotingResult};
use crate::governance::events::VotingEvent;
use crate::governance::participants::{Participant, ParticipantRegistry};
use crate::governance::proposals::{Proposal, ProposalRegistry};
use crate::governance::tally::{tally, TallyReport};
use crate::governance::workflow::{Phase, Workflow};
use crate::identity::{Identity, IdentityContext};

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
/// Upper bound of the event broadcast channel; larger requests are clamped.
pub const MAX_EVENT_CAPACITY: usize = 65_536;

/// 投票プロセス全体の状態
pub struct VotingService {
    administrator: Identity,
    workflow: Workflow,
    participants: ParticipantRegistry,
    proposals: ProposalRegistry,
    winning_proposal_index: usize,
    history: Vec<VotingEvent>,
    event_tx: broadcast::Sender<VotingEvent>,
}

impl VotingService {
    pub fn new(administrator: Identity) -> Self {
        Self::with_event_capacity(administrator, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(administrator: Identity, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.clamp(1, MAX_EVENT_CAPACITY));
        info!("Voting process initialized, administrator: {}", administrator);
        Self {
            administrator,
            workflow: Workflow::new(),
            participants: ParticipantRegistry::new(),
            proposals: ProposalRegistry::new(),
            winning_proposal_index: 0,
            history: Vec::new(),
            event_tx,
        }
    }

    pub fn administrator(&self) -> &Identity {
        &self.administrator
    }

    pub fn current_phase(&self) -> Phase {
        self.workflow.current_phase()
    }

    /// Every event published so far, oldest first.
    pub fn events(&self) -> &[VotingEvent] {
        &self.history
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<VotingEvent> {
        self.event_tx.subscribe()
    }

    // ---- administrator operations ----

    /// 参加者の登録
    pub fn register_participant(
        &mut self,
        ctx: &impl IdentityContext,
        identity: Identity,
    ) -> VotingResult<()> {
        self.require_administrator(ctx)?;
        self.workflow.require(Phase::RegisteringParticipants)?;
        self.participants.register(identity.clone())?;

        info!("Participant {} registered", identity);
        self.emit(VotingEvent::ParticipantRegistered { identity });
        Ok(())
    }

    /// フェーズの変更（順序の制約なし）
    pub fn set_phase(&mut self, ctx: &impl IdentityContext, next: Phase) -> VotingResult<()> {
        self.require_administrator(ctx)?;
        let (previous, next) = self.workflow.set_phase(next);

        info!("Phase changed: {} -> {}", previous, next);
        self.emit(VotingEvent::PhaseChanged { previous, next });
        Ok(())
    }

    /// Moves to the phase that naturally follows the current one.
    pub fn advance_phase(&mut self, ctx: &impl IdentityContext) -> VotingResult<Phase> {
        self.require_administrator(ctx)?;
        let current = self.workflow.current_phase();
        let next = current.next().ok_or(VotingError::NoNextPhase(current))?;
        self.set_phase(ctx, next)?;
        Ok(next)
    }

    /// 投票の集計
    ///
    /// Stores the winning index; the phase is left as is.
    pub fn run_tally(&mut self, ctx: &impl IdentityContext) -> VotingResult<usize> {
        self.require_administrator(ctx)?;
        self.workflow.require(Phase::VotingClosed)?;

        if self.proposals.is_empty() || self.participants.is_empty() {
            warn!(
                "Tallying an empty ballot: {} proposal(s), {} participant(s)",
                self.proposals.len(),
                self.participants.len()
            );
        }
        self.winning_proposal_index = tally(self.proposals.list());
        info!(
            "Votes tallied: winning proposal {} ({} vote(s) from {} of {} participant(s))",
            self.winning_proposal_index,
            self.proposals.total_votes(),
            self.participants.voted_count(),
            self.participants.len()
        );
        self.emit(VotingEvent::VotesTallied {
            winning_proposal_index: self.winning_proposal_index,
        });
        Ok(self.winning_proposal_index)
    }

    /// Registered identities, sorted.
    pub fn participants(&self, ctx: &impl IdentityContext) -> VotingResult<Vec<Identity>> {
        self.require_administrator(ctx)?;
        Ok(self.participants.registered())
    }

    // ---- participant operations ----

    /// 提案の登録
    pub fn register_proposal(
        &mut self,
        ctx: &impl IdentityContext,
        description: impl Into<String>,
    ) -> VotingResult<usize> {
        self.require_participant(ctx)?;
        self.workflow.require(Phase::ProposalsOpen)?;
        let index = self.proposals.register(description.into())?;

        info!("Proposal {} registered by {}", index, ctx.caller());
        self.emit(VotingEvent::ProposalRegistered { index });
        Ok(index)
    }

    /// 投票
    ///
    /// The participant record and the proposal counter change together or
    /// not at all: both are validated before either is written.
    pub fn cast_vote(
        &mut self,
        ctx: &impl IdentityContext,
        proposal_index: usize,
    ) -> VotingResult<()> {
        self.require_participant(ctx)?;
        self.workflow.require(Phase::VotingOpen)?;

        let voter = ctx.caller();
        self.participants.ensure_can_vote(voter)?;
        self.proposals.ensure_votable(proposal_index)?;

        self.proposals.increment_vote(proposal_index)?;
        self.participants.record_vote(voter, proposal_index)?;

        info!("{} voted for proposal {}", voter, proposal_index);
        self.emit(VotingEvent::VoteCast {
            identity: voter.clone(),
            proposal_index,
        });
        Ok(())
    }

    /// Snapshot of every proposal in index order.
    pub fn list_proposals(&self, ctx: &impl IdentityContext) -> VotingResult<Vec<Proposal>> {
        self.require_participant(ctx)?;
        Ok(self.proposals.list().to_vec())
    }

    pub fn proposal(&self, ctx: &impl IdentityContext, index: usize) -> VotingResult<Proposal> {
        self.require_participant(ctx)?;
        self.proposals.get(index).cloned()
    }

    /// The caller's own voting record.
    pub fn participant_status(&self, ctx: &impl IdentityContext) -> VotingResult<Participant> {
        self.require_participant(ctx)?;
        Ok(self.participants.get(ctx.caller()))
    }

    /// Proposal `identity` voted for, readable once the ballot is tallied.
    /// `None` if that identity never voted.
    pub fn vote_of(
        &self,
        ctx: &impl IdentityContext,
        identity: &Identity,
    ) -> VotingResult<Option<usize>> {
        self.require_participant(ctx)?;
        self.workflow.require(Phase::Tallied)?;
        Ok(self.participants.get(identity).voted_proposal_index)
    }

    /// 勝者の取得
    pub fn winner(&self, ctx: &impl IdentityContext) -> VotingResult<usize> {
        self.require_participant(ctx)?;
        self.workflow.require(Phase::Tallied)?;
        Ok(self.winning_proposal_index)
    }

    pub fn results(&self, ctx: &impl IdentityContext) -> VotingResult<TallyReport> {
        self.require_participant(ctx)?;
        self.workflow.require(Phase::Tallied)?;
        Ok(TallyReport::new(
            self.proposals.list(),
            self.winning_proposal_index,
            &self.participants,
        ))
    }

    // ---- gates ----

    fn require_administrator(&self, ctx: &impl IdentityContext) -> VotingResult<()> {
        if !ctx.is_administrator(&self.administrator) {
            return Err(VotingError::Unauthorized {
                caller: ctx.caller().clone(),
                required: Role::Administrator,
            });
        }
        Ok(())
    }

    fn require_participant(&self, ctx: &impl IdentityContext) -> VotingResult<()> {
        if !self.participants.is_registered(ctx.caller()) {
            return Err(VotingError::Unauthorized {
                caller: ctx.caller().clone(),
                required: Role::Participant,
            });
        }
        debug!("{} is a registered participant", ctx.caller());
        Ok(())
    }

    fn emit(&mut self, event: VotingEvent) {
        self.history.push(event.clone());
        // 購読者がいなくてもエラーにはしない
        let _ = self.event_tx.send(event);
    }
}
