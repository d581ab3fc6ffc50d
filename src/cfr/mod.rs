//! Client Feedback Requests.
//!
//! A CFR is a synchronous question the server pushes to one client in the middle of a
//! phase. The server blocks until it receives the reply, so every request that is
//! addressed to this client must be answered exactly once.
//!
//! # Request Lifecycle
//!
//! ```text
//! transport ──► CfrPacket ──decode──► CfrRequest ──► CfrDispatcher
//!                                                       │
//!                            prompt or default ◄────────┤
//!                                                       ▼
//!                                   CfrOutcome::Answered { response, follow_up }
//!                                                       │
//!                         CommandSink::send_cfr_response(response)   (exactly once)
//!                                                       │
//!                              follow_up (point-blank shot phase), if any
//! ```
//!
//! # Default Replies
//!
//! | Kind | Dismissed / failed lookup |
//! |------|---------------------------|
//! | `DominoEffect` | no action |
//! | `AmsAssign`, `ApdsAssign` | `None` |
//! | `HiddenPointBlankShot` | `None` |
//! | `TeleguidedTarget`, `TagTarget` | index `0` |
//!
//! "No target" is not a valid answer for the missile kinds; they default to the
//! first target.

pub mod dispatcher;
pub mod prompt;

use std::fmt;

use crate::error::CfrDecodeError;
use crate::EntityId;

/// The six request kinds this client understands.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CfrKind {
    /// A unit is pushed by a falling unit and may step aside.
    DominoEffect,
    /// Assign an anti-missile system to one incoming attack.
    AmsAssign,
    /// Assign an anti-personnel defense system to one incoming attack.
    ApdsAssign,
    /// A hidden unit may shoot a unit that moved adjacent.
    HiddenPointBlankShot,
    /// Pick the target of a teleoperated missile.
    TeleguidedTarget,
    /// Pick the target designated by TAG.
    TagTarget,
}

impl CfrKind {
    /// All kinds, in wire code order.
    pub const ALL: [CfrKind; 6] = [
        CfrKind::DominoEffect,
        CfrKind::AmsAssign,
        CfrKind::ApdsAssign,
        CfrKind::HiddenPointBlankShot,
        CfrKind::TeleguidedTarget,
        CfrKind::TagTarget,
    ];

    /// The kind code used in [`CfrPacket::kind`].
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            CfrKind::DominoEffect => 1,
            CfrKind::AmsAssign => 2,
            CfrKind::ApdsAssign => 3,
            CfrKind::HiddenPointBlankShot => 4,
            CfrKind::TeleguidedTarget => 5,
            CfrKind::TagTarget => 6,
        }
    }

    /// Looks up a kind by its code.
    #[must_use]
    pub const fn from_code(code: u16) -> Option<CfrKind> {
        match code {
            1 => Some(CfrKind::DominoEffect),
            2 => Some(CfrKind::AmsAssign),
            3 => Some(CfrKind::ApdsAssign),
            4 => Some(CfrKind::HiddenPointBlankShot),
            5 => Some(CfrKind::TeleguidedTarget),
            6 => Some(CfrKind::TagTarget),
            _ => None,
        }
    }

    /// Returns a string representation suitable for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CfrKind::DominoEffect => "domino_effect",
            CfrKind::AmsAssign => "ams_assign",
            CfrKind::ApdsAssign => "apds_assign",
            CfrKind::HiddenPointBlankShot => "hidden_point_blank_shot",
            CfrKind::TeleguidedTarget => "teleguided_target",
            CfrKind::TagTarget => "tag_target",
        }
    }

    /// The reply sent when the player dismisses the prompt or a lookup fails.
    #[must_use]
    pub const fn default_response(self) -> CfrResponse {
        match self {
            CfrKind::DominoEffect => CfrResponse::DominoEffect(None),
            CfrKind::AmsAssign => CfrResponse::AmsAssign(None),
            CfrKind::ApdsAssign => CfrResponse::ApdsAssign(None),
            CfrKind::HiddenPointBlankShot => CfrResponse::HiddenPointBlankShot(None),
            CfrKind::TeleguidedTarget => CfrResponse::TeleguidedTarget(0),
            CfrKind::TagTarget => CfrResponse::TagTarget(0),
        }
    }
}

impl fmt::Display for CfrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step a unit may take to avoid a domino effect.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum StepDirection {
    /// One hex forward.
    Forward,
    /// One hex backward.
    Backward,
}

/// An incoming attack an AMS or APDS could engage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AttackCandidate {
    /// The attacking unit.
    pub attacker: EntityId,
    /// The weapon id on the attacking unit.
    pub weapon: i32,
}

/// What kind of object a TAG target is.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum TargetKind {
    /// A unit; the id is an [`EntityId`].
    Entity,
    /// A hex; the id encodes its coordinates.
    Hex,
    /// A building; the id encodes the coordinates of one of its hexes.
    Building,
}

impl TargetKind {
    /// Looks up a target kind by its wire code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<TargetKind> {
        match code {
            0 => Some(TargetKind::Entity),
            1 => Some(TargetKind::Hex),
            2 => Some(TargetKind::Building),
            _ => None,
        }
    }

    /// The wire code of this target kind.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            TargetKind::Entity => 0,
            TargetKind::Hex => 1,
            TargetKind::Building => 2,
        }
    }
}

/// A typed reference to something that can be targeted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TargetRef {
    /// What the id refers to.
    pub kind: TargetKind,
    /// Raw id.
    pub id: i32,
}

/// The non-null reply to an accepted point-blank shot.
///
/// The server only needs to know the shot will happen; the actual attack is declared
/// afterwards in the point-blank shot phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PointBlankAck {
    /// The hidden unit that will fire.
    pub attacker: EntityId,
}

/// A decoded feedback request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CfrRequest {
    /// `entity` is displaced by a domino effect.
    DominoEffect {
        /// The pushed unit.
        entity: EntityId,
    },
    /// Choose which attack `entity`'s AMS engages.
    AmsAssign {
        /// The defending unit.
        entity: EntityId,
        /// Attacks the AMS could engage.
        attacks: Vec<AttackCandidate>,
    },
    /// Choose which attack `entity`'s APDS engages.
    ApdsAssign {
        /// The defending unit.
        entity: EntityId,
        /// Attacks the APDS could engage.
        attacks: Vec<AttackCandidate>,
        /// Distance from the APDS to each attack's target, parallel to `attacks`.
        distances: Vec<i32>,
    },
    /// `attacker` is hidden and may fire at `target`, which just moved adjacent.
    HiddenPointBlankShot {
        /// The hidden unit.
        attacker: EntityId,
        /// The unit that moved adjacent.
        target: EntityId,
    },
    /// Pick the target of a teleoperated missile.
    TeleguidedTarget {
        /// Possible targets.
        candidates: Vec<EntityId>,
        /// To-hit number for each candidate, parallel to `candidates`.
        to_hit: Vec<i32>,
    },
    /// Pick the target designated by TAG.
    TagTarget {
        /// Possible targets with their kinds.
        targets: Vec<TargetRef>,
    },
}

impl CfrRequest {
    /// The kind of this request.
    #[must_use]
    pub const fn kind(&self) -> CfrKind {
        match self {
            CfrRequest::DominoEffect { .. } => CfrKind::DominoEffect,
            CfrRequest::AmsAssign { .. } => CfrKind::AmsAssign,
            CfrRequest::ApdsAssign { .. } => CfrKind::ApdsAssign,
            CfrRequest::HiddenPointBlankShot { .. } => CfrKind::HiddenPointBlankShot,
            CfrRequest::TeleguidedTarget { .. } => CfrKind::TeleguidedTarget,
            CfrRequest::TagTarget { .. } => CfrKind::TagTarget,
        }
    }

    /// The reply sent when nothing better can be determined.
    #[must_use]
    pub const fn default_response(&self) -> CfrResponse {
        self.kind().default_response()
    }

    /// Decodes the structure-only packet handed over by the transport.
    ///
    /// # Payload Layout
    ///
    /// | Kind | `ints` | `aux` |
    /// |------|--------|-------|
    /// | 1 DominoEffect | `[entity]` | – |
    /// | 2 AmsAssign | `[entity, (attacker, weapon)*]` | – |
    /// | 3 ApdsAssign | `[entity, (attacker, weapon)*]` | distances |
    /// | 4 HiddenPointBlankShot | `[attacker, target]` | – |
    /// | 5 TeleguidedTarget | candidate ids | to-hit values |
    /// | 6 TagTarget | target ids | target kind codes |
    ///
    /// # Examples
    ///
    /// ```
    /// use wargame_session::{CfrPacket, CfrRequest, EntityId};
    ///
    /// let packet = CfrPacket::new(4, vec![3, 9], vec![]);
    /// let request = CfrRequest::decode(&packet).unwrap();
    /// assert_eq!(
    ///     request,
    ///     CfrRequest::HiddenPointBlankShot { attacker: EntityId::new(3), target: EntityId::new(9) }
    /// );
    /// ```
    pub fn decode(packet: &CfrPacket) -> Result<CfrRequest, CfrDecodeError> {
        let code = packet.kind;
        let kind = CfrKind::from_code(code).ok_or(CfrDecodeError::UnknownKind { code })?;
        let malformed = |detail: &str| CfrDecodeError::MalformedPayload {
            code,
            detail: detail.to_owned(),
        };

        match kind {
            CfrKind::DominoEffect => match packet.ints.as_slice() {
                [entity] => Ok(CfrRequest::DominoEffect {
                    entity: EntityId::new(*entity),
                }),
                _ => Err(malformed("expected exactly one entity id")),
            },
            CfrKind::AmsAssign | CfrKind::ApdsAssign => {
                let (entity, rest) = packet
                    .ints
                    .split_first()
                    .ok_or_else(|| malformed("missing defending entity"))?;
                if rest.len() % 2 != 0 {
                    return Err(malformed("attack list must be (attacker, weapon) pairs"));
                }
                let attacks: Vec<AttackCandidate> = rest
                    .chunks_exact(2)
                    .map(|pair| AttackCandidate {
                        attacker: EntityId::new(pair[0]),
                        weapon: pair[1],
                    })
                    .collect();
                let entity = EntityId::new(*entity);
                if kind == CfrKind::AmsAssign {
                    Ok(CfrRequest::AmsAssign { entity, attacks })
                } else {
                    if packet.aux.len() != attacks.len() {
                        return Err(malformed("one distance per attack expected"));
                    }
                    Ok(CfrRequest::ApdsAssign {
                        entity,
                        attacks,
                        distances: packet.aux.clone(),
                    })
                }
            },
            CfrKind::HiddenPointBlankShot => match packet.ints.as_slice() {
                [attacker, target] => Ok(CfrRequest::HiddenPointBlankShot {
                    attacker: EntityId::new(*attacker),
                    target: EntityId::new(*target),
                }),
                _ => Err(malformed("expected attacker and target ids")),
            },
            CfrKind::TeleguidedTarget => {
                if packet.ints.len() != packet.aux.len() {
                    return Err(malformed("one to-hit value per candidate expected"));
                }
                Ok(CfrRequest::TeleguidedTarget {
                    candidates: packet.ints.iter().copied().map(EntityId::new).collect(),
                    to_hit: packet.aux.clone(),
                })
            },
            CfrKind::TagTarget => {
                if packet.ints.len() != packet.aux.len() {
                    return Err(malformed("one target kind per target expected"));
                }
                let targets = packet
                    .ints
                    .iter()
                    .zip(&packet.aux)
                    .map(|(id, kind)| {
                        TargetKind::from_code(*kind)
                            .map(|kind| TargetRef { kind, id: *id })
                            .ok_or_else(|| malformed("unknown target kind"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CfrRequest::TagTarget { targets })
            },
        }
    }
}

/// The reply to a [`CfrRequest`], mirroring its kind.
///
/// `None` and "no action" values are real replies; they are not the absence of one.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CfrResponse {
    /// The chosen step, or `None` for no action.
    DominoEffect(Option<StepDirection>),
    /// Index into the request's attack list, or `None` to engage nothing.
    AmsAssign(Option<usize>),
    /// Index into the request's attack list, or `None` to engage nothing.
    ApdsAssign(Option<usize>),
    /// `Some` if the shot will be taken.
    HiddenPointBlankShot(Option<PointBlankAck>),
    /// Index into the request's candidate list.
    TeleguidedTarget(usize),
    /// Index into the request's target list.
    TagTarget(usize),
}

impl CfrResponse {
    /// The kind of request this reply answers.
    #[must_use]
    pub const fn kind(&self) -> CfrKind {
        match self {
            CfrResponse::DominoEffect(_) => CfrKind::DominoEffect,
            CfrResponse::AmsAssign(_) => CfrKind::AmsAssign,
            CfrResponse::ApdsAssign(_) => CfrKind::ApdsAssign,
            CfrResponse::HiddenPointBlankShot(_) => CfrKind::HiddenPointBlankShot,
            CfrResponse::TeleguidedTarget(_) => CfrKind::TeleguidedTarget,
            CfrResponse::TagTarget(_) => CfrKind::TagTarget,
        }
    }
}

/// A feedback request as handed over by the transport, before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct CfrPacket {
    /// Kind code, see [`CfrKind::code`].
    pub kind: u16,
    /// Primary integer payload.
    pub ints: Vec<i32>,
    /// Secondary integer payload, parallel to part of `ints`.
    pub aux: Vec<i32>,
}

impl CfrPacket {
    /// Creates a packet.
    #[must_use]
    pub fn new(kind: u16, ints: Vec<i32>, aux: Vec<i32>) -> Self {
        Self { kind, ints, aux }
    }
}

impl From<&CfrRequest> for CfrPacket {
    fn from(request: &CfrRequest) -> Self {
        let kind = request.kind().code();
        match request {
            CfrRequest::DominoEffect { entity } => CfrPacket::new(kind, vec![entity.as_i32()], vec![]),
            CfrRequest::AmsAssign { entity, attacks } => {
                CfrPacket::new(kind, attack_ints(*entity, attacks), vec![])
            },
            CfrRequest::ApdsAssign {
                entity,
                attacks,
                distances,
            } => CfrPacket::new(kind, attack_ints(*entity, attacks), distances.clone()),
            CfrRequest::HiddenPointBlankShot { attacker, target } => {
                CfrPacket::new(kind, vec![attacker.as_i32(), target.as_i32()], vec![])
            },
            CfrRequest::TeleguidedTarget { candidates, to_hit } => CfrPacket::new(
                kind,
                candidates.iter().map(|c| c.as_i32()).collect(),
                to_hit.clone(),
            ),
            CfrRequest::TagTarget { targets } => CfrPacket::new(
                kind,
                targets.iter().map(|t| t.id).collect(),
                targets.iter().map(|t| t.kind.code()).collect(),
            ),
        }
    }
}

fn attack_ints(entity: EntityId, attacks: &[AttackCandidate]) -> Vec<i32> {
    let mut ints = Vec::with_capacity(1 + attacks.len() * 2);
    ints.push(entity.as_i32());
    for attack in attacks {
        ints.push(attack.attacker.as_i32());
        ints.push(attack.weapon);
    }
    ints
}

/// Work the controller must do after sending a reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Switch to the point-blank shot phase and seed its handler.
    EnterPointBlankShot {
        /// The hidden unit that fires.
        attacker: EntityId,
        /// The unit it fires at.
        target: EntityId,
    },
}

/// Why a request was left unanswered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExemptReason {
    /// Automated players answer domino effects through their own decision logic.
    AutomatedClient,
    /// The request names units this client does not know; it is addressed to someone else.
    NotAddressed,
    /// The kind code is not understood, so no reply of the right shape can be built.
    UnknownKind {
        /// The raw kind code.
        code: u16,
    },
}

/// Result of handling one feedback request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an answered request must be sent to the CommandSink"]
pub enum CfrOutcome {
    /// Send `response`, then perform `follow_up`.
    Answered {
        /// The reply to send.
        response: CfrResponse,
        /// Work to do after the reply has been sent.
        follow_up: Option<FollowUp>,
    },
    /// No reply is sent.
    Exempt {
        /// Why.
        reason: ExemptReason,
    },
}

impl CfrOutcome {
    /// An answer without follow-up work.
    pub const fn answered(response: CfrResponse) -> Self {
        CfrOutcome::Answered {
            response,
            follow_up: None,
        }
    }

    /// Returns the reply, if one is to be sent.
    #[must_use]
    pub const fn response(&self) -> Option<&CfrResponse> {
        match self {
            CfrOutcome::Answered { response, .. } => Some(response),
            CfrOutcome::Exempt { .. } => None,
        }
    }
}
