//! BattleEngine: the ledger-facing call surface
//!
//! One engine instance owns the matchmaker, the account map and the live
//! battle records; wrestlers and items cross the object-store boundary as
//! JSON. Calls validate every precondition before touching state, so a
//! rejected call leaves nothing behind.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::clock::LedgerClock;
use crate::core::context::CallContext;
use crate::core::params::EngineParams;
use crate::events::{EngineEvent, EventLog};
use crate::external::{
    EventSink, LedgerError, ObjectStore, StoreError, TokenLedger, WitnessSet,
};
use crate::matchmaking::{bot_choose_slot, find_match, BotProfile, Candidate, Matchmaker};
use crate::models::account::{Account, AccountError};
use crate::models::battle::{
    Battle, BattleError, BattleMode, BattleState, SideIndex, Stance,
};
use crate::models::battle::MAX_TEAM_SIZE;
use crate::models::item::Item;
use crate::models::wrestler::{Location, Wrestler, WrestlerError};
use crate::preparation::{prepare_match, Contender, PreparedMatch};
use crate::resolution::moves::{slot_move, MoveKind};
use crate::resolution::{resolve_turn, TurnContext};
use crate::rng::TurnRng;
use crate::settlement::{
    self, apply_progression, apply_record, decisive_payout, draw_payout, grant_trophies,
    xp_award, FightResult, Payout, TrophyInput,
};

/// Object-store symbol for wrestler records
const WRESTLER_SYMBOL: &str = "wrestler";
/// Object-store symbol for item records
const ITEM_SYMBOL: &str = "item";
/// Bot wrestler ids live far above any real id
const BOT_WRESTLER_ID_BASE: u64 = 1 << 48;

/// Everything that can reject an engine call
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Caller {0} is not a witness of this transaction")]
    InvalidWitness(String),

    #[error("Unknown battle {0}")]
    UnknownBattle(u64),

    #[error("Caller {caller} is not a participant of battle {battle_id}")]
    NotParticipant { battle_id: u64, caller: String },

    #[error("A team fields between 1 and {max} wrestlers, got {got}")]
    BadTeamSize { got: usize, max: usize },

    #[error("Duplicate wrestler id {0} in team")]
    DuplicateWrestler(u64),

    #[error("Bet must be non-negative, got {0}")]
    NegativeBet(i64),

    #[error("Ranked mode requires the fixed fee of {expected}, got {got}")]
    WrongRankedFee { expected: i64, got: i64 },

    #[error("Ranked mode requires every wrestler at max level")]
    RankedLevelRequired,

    #[error("Versus mode requires a target other than the caller")]
    BadVersusTarget,

    #[error("Practice mode carries no bet")]
    PracticeBetRejected,

    #[error("UpdateQueue is rate-limited; retry in {remaining} seconds")]
    UpdateCooldown { remaining: u64 },

    #[error("Account {0} is not queued")]
    NotQueued(String),

    #[error("Only the side ahead in submitted turns may cancel")]
    CancelNotAhead,

    #[error("CancelMatch allowed only after {remaining} more idle seconds")]
    CancelTooEarly { remaining: u64 },

    #[error("The other side already delegated to auto; refusing a bot-vs-bot match")]
    AutoAlreadyDelegated,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error(transparent)]
    Wrestler(#[from] WrestlerError),
}

/// The battle engine
///
/// Generic over its four external collaborators so tests run purely in
/// memory while a deployment plugs the hosting ledger in.
pub struct BattleEngine<L, S, W, E>
where
    L: TokenLedger,
    S: ObjectStore,
    W: WitnessSet,
    E: EventSink,
{
    params: EngineParams,
    clock: LedgerClock,
    ledger: L,
    store: S,
    witnesses: W,
    sink: E,
    log: EventLog,
    accounts: BTreeMap<String, Account>,
    matchmaker: Matchmaker,
    battles: BTreeMap<u64, Battle>,
    next_battle_id: u64,
    next_bot_wrestler_id: u64,
}

impl<L, S, W, E> BattleEngine<L, S, W, E>
where
    L: TokenLedger,
    S: ObjectStore,
    W: WitnessSet,
    E: EventSink,
{
    pub fn new(params: EngineParams, ledger: L, store: S, witnesses: W, sink: E) -> Self {
        Self {
            params,
            clock: LedgerClock::new(),
            ledger,
            store,
            witnesses,
            sink,
            log: EventLog::new(),
            accounts: BTreeMap::new(),
            matchmaker: Matchmaker::new(),
            battles: BTreeMap::new(),
            next_battle_id: 1,
            next_bot_wrestler_id: BOT_WRESTLER_ID_BASE,
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn account(&self, address: &str) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Seed a wrestler record into the store (fixture setup)
    pub fn put_wrestler(&mut self, wrestler: &Wrestler) {
        self.save_wrestler(wrestler);
    }

    /// Seed an item record into the store (fixture setup)
    pub fn put_item(&mut self, item: &Item) {
        let bytes = serde_json::to_vec(item).expect("item serializes");
        self.store.set(ITEM_SYMBOL, item.id(), bytes);
    }

    // -----------------------------------------------------------------------
    // Queue operations
    // -----------------------------------------------------------------------

    /// JoinQueue: validate, escrow the stake, enter the queue, and attempt
    /// an immediate match. Returns the battle id when one formed.
    pub fn join_queue(
        &mut self,
        ctx: &CallContext,
        wrestler_ids: &[u64],
        bet: i64,
        mode: BattleMode,
        versus_target: Option<&str>,
    ) -> Result<Option<u64>, EngineError> {
        self.begin(ctx)?;
        let caller = ctx.caller.clone();
        let now = self.clock.now();

        // Validate everything before any mutation
        if wrestler_ids.is_empty() || wrestler_ids.len() > MAX_TEAM_SIZE {
            return Err(EngineError::BadTeamSize {
                got: wrestler_ids.len(),
                max: MAX_TEAM_SIZE,
            });
        }
        for (i, id) in wrestler_ids.iter().enumerate() {
            if wrestler_ids[..i].contains(id) {
                return Err(EngineError::DuplicateWrestler(*id));
            }
        }
        if bet < 0 {
            return Err(EngineError::NegativeBet(bet));
        }
        let account = self.account_entry(&caller);
        if account.queue().is_some() {
            return Err(AccountError::AlreadyQueued(caller).into());
        }
        if account.battle_id().is_some() {
            return Err(AccountError::AlreadyInBattle(caller).into());
        }

        let mut wrestlers = Vec::with_capacity(wrestler_ids.len());
        for id in wrestler_ids {
            let w = self.load_wrestler(*id)?;
            w.ensure_available()?;
            wrestlers.push(w);
        }

        match mode {
            BattleMode::Ranked => {
                if bet != self.params.ranked_fee {
                    return Err(EngineError::WrongRankedFee {
                        expected: self.params.ranked_fee,
                        got: bet,
                    });
                }
                if !wrestlers.iter().all(|w| w.is_max_level()) {
                    return Err(EngineError::RankedLevelRequired);
                }
            }
            BattleMode::Versus => match versus_target {
                Some(target) if target != caller => {}
                _ => return Err(EngineError::BadVersusTarget),
            },
            BattleMode::Practice => {
                if bet != 0 {
                    return Err(EngineError::PracticeBetRejected);
                }
            }
            BattleMode::Unranked => {}
        }

        // Each wrestler spends one mojo point; fails before any other mutation
        for w in wrestlers.iter_mut() {
            w.spend_mojo(now, &self.params)?;
        }

        // Escrow the stake
        if bet > 0 {
            let escrow = self.params.escrow_address.clone();
            let symbol = self.params.bet_token.clone();
            self.ledger.transfer(&symbol, &caller, &escrow, bet)?;
        }

        for w in &wrestlers {
            self.save_wrestler(w);
        }

        let ticket = crate::models::account::QueueTicket {
            mode,
            bet,
            wrestler_ids: wrestler_ids.to_vec(),
            join_time: now,
            update_time: now,
            versus_target: versus_target.map(|t| t.to_string()),
        };
        self.account_entry(&caller).enter_queue(ticket)?;

        self.emit(EngineEvent::QueueJoined {
            time: now,
            account: caller.clone(),
            mode: mode.as_str().to_string(),
            bet,
        });

        match mode {
            BattleMode::Practice => {
                let level = wrestlers.iter().map(|w| w.level()).max().unwrap_or(1);
                let battle_id = self.prepare_bot_match(&caller, level)?;
                Ok(Some(battle_id))
            }
            BattleMode::Versus => {
                let target = versus_target.expect("validated above").to_string();
                let reciprocal = self.matchmaker.has_challenge(
                    &caller,
                    &target,
                    now,
                    self.params.challenge_ttl_secs,
                ) && self.versus_ticket_targets(&target, &caller);
                if reciprocal {
                    let battle_id = self.prepare_pair(&caller, &target)?;
                    Ok(Some(battle_id))
                } else {
                    self.matchmaker.record_challenge(&target, &caller, now);
                    self.emit(EngineEvent::ChallengeIssued {
                        time: now,
                        challenger: caller,
                        target,
                        bet,
                    });
                    Ok(None)
                }
            }
            BattleMode::Ranked | BattleMode::Unranked => {
                self.matchmaker.insert(&caller);
                self.try_find_match()
            }
        }
    }

    /// UpdateQueue: rate-limited re-attempt, with the unranked bot fallback
    pub fn update_queue(&mut self, ctx: &CallContext) -> Result<Option<u64>, EngineError> {
        self.begin(ctx)?;
        let caller = ctx.caller.clone();
        let now = self.clock.now();

        let account = self
            .accounts
            .get_mut(&caller)
            .filter(|a| a.queue().is_some())
            .ok_or_else(|| EngineError::NotQueued(caller.clone()))?;
        let ticket = account.queue_mut().expect("filtered above");
        let since_update = now.saturating_sub(ticket.update_time);
        if since_update < self.params.update_cooldown_secs {
            return Err(EngineError::UpdateCooldown {
                remaining: self.params.update_cooldown_secs - since_update,
            });
        }
        ticket.update_time = now;
        let mode = ticket.mode;
        let waited = now.saturating_sub(ticket.join_time);
        let ticket_ids = ticket.wrestler_ids.clone();

        if let Some(battle_id) = self.try_find_match()? {
            // The caller may or may not be part of the formed pair
            return Ok(Some(battle_id));
        }

        if mode == BattleMode::Unranked
            && self
                .accounts
                .get(&caller)
                .is_some_and(|a| a.queue().is_some())
            && waited >= self.params.unranked_bot_fallback_secs
        {
            let mut level = 1;
            for id in &ticket_ids {
                level = level.max(self.load_wrestler(*id)?.level());
            }
            let battle_id = self.prepare_bot_match(&caller, level)?;
            return Ok(Some(battle_id));
        }
        Ok(None)
    }

    /// CancelQueue: leave the queue and take the escrowed stake back
    pub fn cancel_queue(&mut self, ctx: &CallContext) -> Result<(), EngineError> {
        self.begin(ctx)?;
        let caller = ctx.caller.clone();
        let account = self
            .accounts
            .get_mut(&caller)
            .ok_or_else(|| EngineError::NotQueued(caller.clone()))?;
        let ticket = account.leave_queue().map_err(EngineError::Account)?;
        self.remove_from_queue(&caller, ticket.bet, "cancelled")?;
        Ok(())
    }

    /// Live challengers against `address`, pruned of expired and stale ones
    pub fn get_versus_challengers(&mut self, address: &str, now: u64) -> Vec<String> {
        self.clock.observe(now);
        let now = self.clock.now();
        let challenges =
            self.matchmaker
                .challengers(address, now, self.params.challenge_ttl_secs);
        challenges
            .into_iter()
            .filter(|c| self.versus_ticket_targets(&c.challenger, address))
            .map(|c| c.challenger)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Battle operations
    // -----------------------------------------------------------------------

    /// PlayTurn: commit one move; resolves the turn when it completes the
    /// rendezvous. Returns the battle state after the call.
    pub fn play_turn(
        &mut self,
        ctx: &CallContext,
        battle_id: u64,
        turn: u32,
        move_slot: u8,
    ) -> Result<BattleState, EngineError> {
        self.begin(ctx)?;
        let now = self.clock.now();
        if self.recover_if_broken(battle_id)? {
            return Ok(BattleState::Cancelled);
        }

        let battle = self
            .battles
            .get_mut(&battle_id)
            .ok_or(EngineError::UnknownBattle(battle_id))?;
        if battle.state.is_terminal() {
            return Err(BattleError::NotActive(battle_id).into());
        }
        let ix = battle
            .side_of(&ctx.caller)
            .ok_or_else(|| EngineError::NotParticipant {
                battle_id,
                caller: ctx.caller.clone(),
            })?;

        let stance = battle.side(ix).active_fighter().stance;
        let mv = slot_move(stance, move_slot).ok_or(BattleError::InvalidSlot(move_slot))?;
        battle.commit_move(ix, turn, mv)?;
        self.emit(EngineEvent::MoveCommitted {
            time: now,
            battle_id,
            turn,
            account: ctx.caller.clone(),
        });

        self.fill_opponent_move(battle_id, ix, ctx)?;
        self.resolve_if_ready(battle_id, ctx)?;
        Ok(self
            .battles
            .get(&battle_id)
            .map(|b| b.state)
            .unwrap_or(BattleState::Cancelled))
    }

    /// AutoTurn: delegate this side's remaining moves to the bot heuristic
    pub fn auto_turn(&mut self, ctx: &CallContext, battle_id: u64) -> Result<(), EngineError> {
        self.begin(ctx)?;
        let battle = self
            .battles
            .get_mut(&battle_id)
            .ok_or(EngineError::UnknownBattle(battle_id))?;
        if battle.state.is_terminal() {
            return Err(BattleError::NotActive(battle_id).into());
        }
        let ix = battle
            .side_of(&ctx.caller)
            .ok_or_else(|| EngineError::NotParticipant {
                battle_id,
                caller: ctx.caller.clone(),
            })?;
        // A fully automated match could never resolve a dispute; refuse it
        if battle.side(ix.opponent()).auto {
            return Err(EngineError::AutoAlreadyDelegated);
        }
        battle.side_mut(ix).auto = true;
        Ok(())
    }

    /// CancelMatch: the side ahead in submitted turns ends a stalled battle
    /// in its favor after the grace period
    pub fn cancel_match(
        &mut self,
        ctx: &CallContext,
        battle_id: u64,
    ) -> Result<(), EngineError> {
        self.begin(ctx)?;
        let now = self.clock.now();
        if self.recover_if_broken(battle_id)? {
            return Ok(());
        }

        let battle = self
            .battles
            .get_mut(&battle_id)
            .ok_or(EngineError::UnknownBattle(battle_id))?;
        if battle.state.is_terminal() {
            return Err(BattleError::NotActive(battle_id).into());
        }
        let ix = battle
            .side_of(&ctx.caller)
            .ok_or_else(|| EngineError::NotParticipant {
                battle_id,
                caller: ctx.caller.clone(),
            })?;

        let my_progress = commit_progress(battle, ix);
        let their_progress = commit_progress(battle, ix.opponent());
        if my_progress <= their_progress {
            return Err(EngineError::CancelNotAhead);
        }
        let idle = now.saturating_sub(battle.time);
        if idle < self.params.turn_grace_secs {
            return Err(EngineError::CancelTooEarly {
                remaining: self.params.turn_grace_secs - idle,
            });
        }

        battle.state = BattleState::Cancelled;
        self.settle(battle_id, Some(ix), false)?;
        Ok(())
    }

    /// GetWrestler: read one wrestler record back out of the store
    pub fn get_wrestler(&self, id: u64) -> Result<Wrestler, EngineError> {
        self.load_wrestler(id)
    }

    /// GetBattle: read one battle, running the broken-battle recovery first
    pub fn get_battle(&mut self, battle_id: u64, now: u64) -> Result<Battle, EngineError> {
        self.clock.observe(now);
        self.recover_if_broken(battle_id)?;
        self.battles
            .get(&battle_id)
            .cloned()
            .ok_or(EngineError::UnknownBattle(battle_id))
    }

    // -----------------------------------------------------------------------
    // Matchmaking internals
    // -----------------------------------------------------------------------

    /// Scan the queue: evict stale entries, then pair the best score
    fn try_find_match(&mut self) -> Result<Option<u64>, EngineError> {
        let now = self.clock.now();
        let members: Vec<String> = self.matchmaker.members().map(str::to_string).collect();

        let mut candidates = Vec::new();
        for address in members {
            let snapshot = self.accounts.get(&address).and_then(|a| {
                a.queue()
                    .map(|t| (t.clone(), a.elo, a.last_opponent.clone()))
            });
            let Some((ticket, elo, last_opponent)) = snapshot else {
                // No longer queued: drop the dangling membership
                self.matchmaker.remove(&address);
                continue;
            };
            if now.saturating_sub(ticket.update_time) > self.params.queue_idle_ttl_secs {
                if let Some(account) = self.accounts.get_mut(&address) {
                    let ticket = account.leave_queue()?;
                    self.remove_from_queue(&address, ticket.bet, "idle")?;
                }
                continue;
            }
            let mut level = 1;
            for id in &ticket.wrestler_ids {
                level = level.max(self.load_wrestler(*id)?.level());
            }
            candidates.push(Candidate {
                address: address.clone(),
                mode: ticket.mode,
                level,
                elo,
                join_time: ticket.join_time,
                last_opponent,
            });
        }

        let Some((i, j)) = find_match(&candidates, now, &self.params) else {
            return Ok(None);
        };
        let (a, b) = (candidates[i].address.clone(), candidates[j].address.clone());
        Ok(Some(self.prepare_pair(&a, &b)?))
    }

    /// Form a battle between two queued accounts
    fn prepare_pair(&mut self, addr_a: &str, addr_b: &str) -> Result<u64, EngineError> {
        let now = self.clock.now();
        // Check both before taking either ticket so a failure mutates nothing
        for addr in [addr_a, addr_b] {
            if self.accounts.get(addr).and_then(|a| a.queue()).is_none() {
                return Err(EngineError::NotQueued(addr.to_string()));
            }
        }
        let ticket_a = self
            .accounts
            .get_mut(addr_a)
            .ok_or_else(|| EngineError::NotQueued(addr_a.to_string()))?
            .leave_queue()?;
        let ticket_b = self
            .accounts
            .get_mut(addr_b)
            .ok_or_else(|| EngineError::NotQueued(addr_b.to_string()))?
            .leave_queue()?;
        assert_eq!(ticket_a.mode, ticket_b.mode, "matched modes must agree");

        self.matchmaker.remove(addr_a);
        self.matchmaker.remove(addr_b);
        self.matchmaker.clear_challenges(addr_a);
        self.matchmaker.clear_challenges(addr_b);

        let contender_a = self.load_contender(addr_a, &ticket_a)?;
        let contender_b = self.load_contender(addr_b, &ticket_b)?;

        let battle_id = self.next_battle_id;
        self.next_battle_id += 1;
        let prepared = prepare_match(battle_id, ticket_a.mode, contender_a, contender_b, now);
        self.commit_prepared(prepared)?;
        Ok(battle_id)
    }

    /// Form a battle between one queued account and a synthetic bot
    fn prepare_bot_match(&mut self, address: &str, level: u32) -> Result<u64, EngineError> {
        let now = self.clock.now();
        let ticket = self
            .accounts
            .get_mut(address)
            .ok_or_else(|| EngineError::NotQueued(address.to_string()))?
            .leave_queue()?;
        self.matchmaker.remove(address);
        self.matchmaker.clear_challenges(address);

        let battle_id = self.next_battle_id;
        self.next_battle_id += 1;

        let profile = BotProfile::for_level(level, battle_id);
        let bot_wrestler_id = self.next_bot_wrestler_id;
        self.next_bot_wrestler_id += 1;
        let mut bot_wrestler = Wrestler::new(bot_wrestler_id, profile.genes, "Bot");
        bot_wrestler.add_experience(profile.experience());
        self.save_wrestler(&bot_wrestler);
        self.accounts
            .entry(profile.address.clone())
            .or_insert_with(|| Account::new_bot(&profile.address, profile.elo));

        let contender = self.load_contender(address, &ticket)?;
        // Bots stake nothing; equalization refunds the player's escrow
        let bot_contender = Contender {
            address: profile.address.clone(),
            bet: 0,
            wrestlers: vec![bot_wrestler],
            items: vec![None],
        };
        let mut prepared = prepare_match(battle_id, ticket.mode, contender, bot_contender, now);
        // The bot never calls in; its side runs on the move heuristic
        prepared.battle.side_mut(SideIndex::B).auto = true;
        self.commit_prepared(prepared)?;
        Ok(battle_id)
    }

    fn load_contender(
        &self,
        address: &str,
        ticket: &crate::models::account::QueueTicket,
    ) -> Result<Contender, EngineError> {
        let mut wrestlers = Vec::new();
        let mut items = Vec::new();
        for id in &ticket.wrestler_ids {
            let w = self.load_wrestler(*id)?;
            let item = match w.item() {
                Some(item_id) => Some(self.load_item(item_id)?),
                None => None,
            };
            wrestlers.push(w);
            items.push(item);
        }
        Ok(Contender {
            address: address.to_string(),
            bet: ticket.bet,
            wrestlers,
            items,
        })
    }

    /// Persist a prepared match: refunds, relocated wrestlers, accounts,
    /// the battle record, and the event
    fn commit_prepared(&mut self, prepared: PreparedMatch) -> Result<(), EngineError> {
        let now = self.clock.now();
        let battle_id = prepared.battle.id();
        let mode = prepared.battle.mode;
        let bet = prepared.battle.bet;
        let escrow = self.params.escrow_address.clone();
        let symbol = self.params.bet_token.clone();

        for side in &prepared.sides {
            if side.refund > 0 {
                self.ledger
                    .transfer(&symbol, &escrow, &side.address, side.refund)?;
            }
            for w in &side.wrestlers {
                self.save_wrestler(w);
            }
            self.accounts
                .entry(side.address.clone())
                .or_insert_with(|| Account::new(&side.address))
                .enter_battle(battle_id);
        }

        self.emit(EngineEvent::MatchPrepared {
            time: now,
            battle_id,
            side_a: prepared.sides[0].address.clone(),
            side_b: prepared.sides[1].address.clone(),
            mode: mode.as_str().to_string(),
            bet,
        });
        self.battles.insert(battle_id, prepared.battle);
        Ok(())
    }

    /// Evict/cancel plumbing shared by CancelQueue and lazy eviction.
    /// The caller has already taken the ticket off the account.
    fn remove_from_queue(
        &mut self,
        address: &str,
        bet: i64,
        reason: &str,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.matchmaker.remove(address);
        self.matchmaker.clear_challenges(address);
        if bet > 0 {
            let escrow = self.params.escrow_address.clone();
            let symbol = self.params.bet_token.clone();
            self.ledger.transfer(&symbol, &escrow, address, bet)?;
        }
        self.emit(EngineEvent::QueueLeft {
            time: now,
            account: address.to_string(),
            refunded: bet,
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Whether `challenger` is currently queued in Versus mode against `target`
    fn versus_ticket_targets(&self, challenger: &str, target: &str) -> bool {
        self.accounts
            .get(challenger)
            .and_then(|a| a.queue())
            .is_some_and(|t| {
                t.mode == BattleMode::Versus && t.versus_target.as_deref() == Some(target)
            })
    }

    // -----------------------------------------------------------------------
    // Resolution internals
    // -----------------------------------------------------------------------

    /// Produce the opponent's move when they are auto-delegated or idle
    /// past the turn timeout
    fn fill_opponent_move(
        &mut self,
        battle_id: u64,
        committer: SideIndex,
        ctx: &CallContext,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        let opp = committer.opponent();
        let (committed, auto, fighter, turn, idle) = {
            let battle = self.battles.get(&battle_id).expect("checked by caller");
            (
                battle.side(opp).move_choice.is_some(),
                battle.side(opp).auto,
                battle.side(opp).active_fighter().clone(),
                battle.turn,
                now.saturating_sub(battle.time),
            )
        };
        if committed {
            return Ok(());
        }

        let forced = if auto {
            let skill = self.load_wrestler(fighter.wrestler_id)?.level();
            // Bot draws come from a stream salted away from the turn seed
            let mut rng = TurnRng::for_turn(&ctx.tx_hash, battle_id ^ 0xB07, turn);
            let slot = bot_choose_slot(&fighter, skill, &mut rng);
            Some(slot_move(fighter.stance, slot).expect("bot slots are valid"))
        } else if idle >= self.params.turn_idle_secs {
            // Idle opponent past the timeout: force an Idle move
            Some(MoveKind::Idle)
        } else {
            None
        };

        if let Some(mv) = forced {
            let battle = self.battles.get_mut(&battle_id).expect("still present");
            battle.commit_move(opp, turn, mv)?;
            let account = battle.side(opp).address.clone();
            self.emit(EngineEvent::MoveCommitted {
                time: now,
                battle_id,
                turn,
                account,
            });
        }
        Ok(())
    }

    /// Run the pipeline if the rendezvous is complete
    fn resolve_if_ready(&mut self, battle_id: u64, ctx: &CallContext) -> Result<(), EngineError> {
        let now = self.clock.now();
        let battle = self.battles.get_mut(&battle_id).expect("checked by caller");
        if !battle.both_committed() {
            return Ok(());
        }
        battle.check_turn_sync();

        let turn = battle.turn;
        let sides = battle.take_sides();
        let counters = battle.counters;
        let rng = TurnRng::for_turn(&ctx.tx_hash, battle_id, turn);
        let turn_ctx = TurnContext::new(battle_id, turn, sides, counters, rng);
        let outcome = resolve_turn(turn_ctx);

        let battle = self.battles.get_mut(&battle_id).expect("still present");
        battle.put_sides(outcome.sides);
        battle.counters = outcome.counters;
        battle.advance_turn(now, ctx.tx_hash);
        self.emit(EngineEvent::TurnResolved {
            time: now,
            battle_id,
            turn,
            events: outcome.events,
        });

        if outcome.state.is_terminal() {
            let battle = self.battles.get_mut(&battle_id).expect("still present");
            battle.state = outcome.state;
            let winner = outcome.state.winner();
            let first_turn = turn == 1;
            self.settle(battle_id, winner, first_turn)?;
        }
        Ok(())
    }

    /// Force-cancel a battle whose last update lags the clock beyond the
    /// broken threshold. Returns true when recovery ran.
    fn recover_if_broken(&mut self, battle_id: u64) -> Result<bool, EngineError> {
        let now = self.clock.now();
        let Some(battle) = self.battles.get_mut(&battle_id) else {
            return Ok(false);
        };
        if battle.state.is_terminal() {
            return Ok(false);
        }
        let idle = now.saturating_sub(battle.time);
        if idle <= self.params.battle_broken_secs {
            return Ok(false);
        }
        battle.state = BattleState::Cancelled;
        self.emit(EngineEvent::BattleBroken {
            time: now,
            battle_id,
            idle_secs: idle,
        });
        // Nobody is at fault: full refund, no winner
        self.settle(battle_id, None, false)?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------------

    /// Apply every terminal-state consequence of a finished battle
    ///
    /// `winner` is `None` for draws and no-fault cancellations; for a
    /// `Cancelled` state with a winner it carries forfeit semantics.
    fn settle(
        &mut self,
        battle_id: u64,
        winner: Option<SideIndex>,
        first_turn_finish: bool,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        let battle = self.battles.get(&battle_id).expect("settling known battle");
        assert!(battle.state.is_terminal(), "settle on non-terminal battle");
        let mode = battle.mode;
        let bet = battle.bet;
        let state = battle.state;
        let addr_a = battle.side(SideIndex::A).address.clone();
        let addr_b = battle.side(SideIndex::B).address.clone();

        // 1. Payout
        let payout = match winner {
            Some(_) => decisive_payout(mode, bet, &self.params),
            None => draw_payout(bet),
        };
        self.pay_out(&payout, winner, &addr_a, &addr_b)?;
        if bet > 0 {
            self.emit(EngineEvent::PayoutSettled {
                time: now,
                battle_id,
                winner_amount: payout.winner_amount,
                loser_amount: payout.loser_amount,
                pot_amount: payout.pot_amount,
            });
        }

        // 2. Per-side progression
        let bot_a = self.accounts.get(&addr_a).is_some_and(|a| a.is_bot);
        let bot_b = self.accounts.get(&addr_b).is_some_and(|a| a.is_bot);
        for ix in [SideIndex::A, SideIndex::B] {
            let result = match winner {
                Some(w) if w == ix => FightResult::Win,
                Some(_) => FightResult::Loss,
                None => FightResult::Draw,
            };
            let vs_bot = if ix == SideIndex::A { bot_b } else { bot_a };
            self.settle_side(battle_id, ix, result, vs_bot)?;
        }

        // 3. Rating (skipped when either side is synthetic)
        if settlement::rating_eligible(mode) && !bot_a && !bot_b {
            self.settle_rating(&addr_a, &addr_b, winner, now);
        }

        // 4. Records, opponents, trophies, release
        let battle = self.battles.get(&battle_id).expect("still present");
        let winner_stance = winner.map(|w| battle.side(w).active_fighter().stance);
        let bot_level_beaten = {
            let opp_bot = |ix: SideIndex| if ix == SideIndex::A { bot_b } else { bot_a };
            winner.filter(|w| opp_bot(*w)).map(|w| {
                let opp_fighter = battle.side(w.opponent()).active_fighter().wrestler_id;
                self.load_wrestler(opp_fighter).map(|x| x.level()).unwrap_or(1)
            })
        };
        for (ix, addr) in [(SideIndex::A, addr_a.clone()), (SideIndex::B, addr_b.clone())] {
            let result = match winner {
                Some(w) if w == ix => FightResult::Win,
                Some(_) => FightResult::Loss,
                None => FightResult::Draw,
            };
            let opponent = if ix == SideIndex::A { &addr_b } else { &addr_a };
            let account = self
                .accounts
                .get_mut(&addr)
                .expect("participant account exists");
            apply_record(account.record_mut(mode), result);
            account.last_opponent = Some(opponent.clone());
            account.leave_battle();

            if result == FightResult::Win && !account.is_bot {
                let input = TrophyInput {
                    won: true,
                    final_stance: winner_stance.unwrap_or(Stance::Main),
                    first_turn_finish,
                    bot_level: bot_level_beaten,
                };
                let granted = grant_trophies(account, &input);
                for trophy in granted {
                    self.emit(EngineEvent::TrophyGranted {
                        time: now,
                        account: addr.clone(),
                        trophy: format!("{:?}", trophy),
                    });
                }
            }
        }

        self.emit(EngineEvent::BattleEnded {
            time: now,
            battle_id,
            state,
        });
        Ok(())
    }

    fn pay_out(
        &mut self,
        payout: &Payout,
        winner: Option<SideIndex>,
        addr_a: &str,
        addr_b: &str,
    ) -> Result<(), EngineError> {
        let escrow = self.params.escrow_address.clone();
        let symbol = self.params.bet_token.clone();
        let (winner_addr, loser_addr) = match winner {
            Some(SideIndex::A) | None => (addr_a, addr_b),
            Some(SideIndex::B) => (addr_b, addr_a),
        };
        if payout.winner_amount > 0 {
            self.ledger
                .transfer(&symbol, &escrow, winner_addr, payout.winner_amount)?;
        }
        if payout.loser_amount > 0 {
            self.ledger
                .transfer(&symbol, &escrow, loser_addr, payout.loser_amount)?;
        }
        if payout.pot_amount > 0 {
            let pot = self.params.pot_address.clone();
            self.ledger
                .transfer(&symbol, &escrow, &pot, payout.pot_amount)?;
        }
        Ok(())
    }

    /// XP, training and location release for every wrestler of one side
    fn settle_side(
        &mut self,
        battle_id: u64,
        ix: SideIndex,
        result: FightResult,
        vs_bot: bool,
    ) -> Result<(), EngineError> {
        let battle = self.battles.get(&battle_id).expect("still present");
        let mode = battle.mode;
        let fighters: Vec<_> = battle.side(ix).fighters.clone();
        let opp_lead_id = battle.side(ix.opponent()).fighters[0].wrestler_id;
        let opp_horoscope = self.load_wrestler(opp_lead_id)?.horoscope();

        for fighter in fighters {
            let mut wrestler = self.load_wrestler(fighter.wrestler_id)?;
            let double_xp = fighter
                .item
                .map(|s| s.effect == crate::models::item::ItemEffect::DoubleXp)
                .unwrap_or(false);
            let xp = xp_award(result, mode, vs_bot, double_xp, &self.params);
            apply_progression(&mut wrestler, xp, opp_horoscope, battle_id);
            if double_xp {
                // The consumable is spent
                wrestler.set_item(None);
            }
            wrestler.set_location(Location::None);
            self.save_wrestler(&wrestler);
        }
        Ok(())
    }

    fn settle_rating(
        &mut self,
        addr_a: &str,
        addr_b: &str,
        winner: Option<SideIndex>,
        now: u64,
    ) {
        let elo_a = self.accounts[addr_a].elo;
        let elo_b = self.accounts[addr_b].elo;
        let k = self.params.elo_k;
        let (delta_a, delta_b) = match winner {
            Some(SideIndex::A) => {
                let d = settlement::win_delta(elo_a, elo_b, k);
                (d, -d)
            }
            Some(SideIndex::B) => {
                let d = settlement::win_delta(elo_b, elo_a, k);
                (-d, d)
            }
            None => {
                let d = settlement::draw_delta(elo_a, elo_b, k);
                // The lower-rated side gains on a draw
                if elo_a <= elo_b {
                    (d, -d)
                } else {
                    (-d, d)
                }
            }
        };
        for (addr, old, delta) in [(addr_a, elo_a, delta_a), (addr_b, elo_b, delta_b)] {
            if delta == 0 {
                continue;
            }
            let account = self.accounts.get_mut(addr).expect("participant exists");
            account.elo = old + delta;
            self.emit(EngineEvent::RatingChanged {
                time: now,
                account: addr.to_string(),
                old_rating: old,
                new_rating: old + delta,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// Common call prologue: witness check plus clock advance
    fn begin(&mut self, ctx: &CallContext) -> Result<(), EngineError> {
        if !self.witnesses.is_witness(&ctx.caller) {
            return Err(EngineError::InvalidWitness(ctx.caller.clone()));
        }
        self.clock.observe(ctx.timestamp);
        Ok(())
    }

    fn account_entry(&mut self, address: &str) -> &mut Account {
        self.accounts
            .entry(address.to_string())
            .or_insert_with(|| Account::new(address))
    }

    fn emit(&mut self, event: EngineEvent) {
        self.sink.emit(&event);
        self.log.push(event);
    }

    fn load_wrestler(&self, id: u64) -> Result<Wrestler, EngineError> {
        let bytes = self.store.get(WRESTLER_SYMBOL, id)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            EngineError::Store(StoreError::Corrupt {
                symbol: WRESTLER_SYMBOL.to_string(),
                id,
                reason: e.to_string(),
            })
        })
    }

    fn save_wrestler(&mut self, wrestler: &Wrestler) {
        let bytes = serde_json::to_vec(wrestler).expect("wrestler serializes");
        self.store.set(WRESTLER_SYMBOL, wrestler.id(), bytes);
    }

    fn load_item(&self, id: u64) -> Result<Item, EngineError> {
        let bytes = self.store.get(ITEM_SYMBOL, id)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            EngineError::Store(StoreError::Corrupt {
                symbol: ITEM_SYMBOL.to_string(),
                id,
                reason: e.to_string(),
            })
        })
    }
}

/// Turns a side has fully committed (its cursor, plus one if a move is
/// pending for the current turn)
fn commit_progress(battle: &Battle, ix: SideIndex) -> u64 {
    let side = battle.side(ix);
    let mut progress = u64::from(side.turn);
    if side.move_choice.is_some() && side.turn == battle.turn {
        progress += 1;
    }
    progress
}
