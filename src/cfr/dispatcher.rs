//! Resolves feedback requests into replies.
//!
//! The dispatcher never sends anything itself; it returns a [`CfrOutcome`] and the
//! controller emits the reply.

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, error, info};

use crate::cfr::prompt::{Choice, ChoicePrompt, ConfirmPrompt, Confirmation, DecisionPrompter};
use crate::cfr::{
    AttackCandidate, CfrKind, CfrOutcome, CfrPacket, CfrRequest, CfrResponse, ExemptReason,
    FollowUp, PointBlankAck, StepDirection, TargetRef,
};
use crate::error::CfrDecodeError;
use crate::report_violation_to;
use crate::roster::EntityRoster;
use crate::telemetry::{ViolationKind, ViolationObserver, ViolationSeverity};
use crate::{EntityId, RulesOracle};

const NONE_OPTION: &str = "None";
const NO_ACTION_OPTION: &str = "No action";

/// Everything the dispatcher reads or prompts while resolving one request.
pub struct DispatchContext<'a, R: RulesOracle + ?Sized, P: DecisionPrompter + ?Sized> {
    /// Units known to this client.
    pub roster: &'a EntityRoster,
    /// Legality checks.
    pub rules: &'a R,
    /// Where decisions are presented.
    pub prompter: &'a mut P,
    /// Current round, attached to reported violations.
    pub round: u32,
}

/// Turns requests into [`CfrOutcome`]s.
#[derive(Clone, Default)]
pub struct CfrDispatcher {
    observer: Option<Arc<dyn ViolationObserver>>,
}

impl std::fmt::Debug for CfrDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CfrDispatcher")
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl CfrDispatcher {
    /// Creates a dispatcher reporting violations to `observer`, or to tracing when
    /// `None`.
    #[must_use]
    pub fn new(observer: Option<Arc<dyn ViolationObserver>>) -> Self {
        Self { observer }
    }

    /// Decodes `packet` and resolves it.
    ///
    /// A known kind with a malformed payload is answered with that kind's default. An
    /// unknown kind cannot be answered because no reply of the right shape exists; it
    /// is logged at error level and reported.
    pub fn handle_packet<R, P>(
        &self,
        packet: &CfrPacket,
        automated: bool,
        ctx: &mut DispatchContext<'_, R, P>,
    ) -> CfrOutcome
    where
        R: RulesOracle + ?Sized,
        P: DecisionPrompter + ?Sized,
    {
        match CfrRequest::decode(packet) {
            Ok(request) => self.handle(&request, automated, ctx),
            Err(CfrDecodeError::UnknownKind { code }) => {
                error!(code, "feedback request of unknown kind left unanswered");
                report_violation_to!(
                    self.observer,
                    ViolationSeverity::Error,
                    ViolationKind::CfrProtocol,
                    @round ctx.round,
                    "unknown feedback request kind {}",
                    code
                );
                CfrOutcome::Exempt {
                    reason: ExemptReason::UnknownKind { code },
                }
            },
            Err(CfrDecodeError::MalformedPayload { code, detail }) => {
                report_violation_to!(
                    self.observer,
                    ViolationSeverity::Error,
                    ViolationKind::CfrProtocol,
                    @round ctx.round,
                    @context { "code" => code },
                    "malformed payload for kind {}: {}",
                    code,
                    detail
                );
                match CfrKind::from_code(code) {
                    Some(kind) => CfrOutcome::answered(kind.default_response()),
                    None => CfrOutcome::Exempt {
                        reason: ExemptReason::UnknownKind { code },
                    },
                }
            },
        }
    }

    /// Resolves a decoded request.
    ///
    /// Every path returns `Answered` except an automated client's domino effect and a
    /// point-blank shot naming units this client does not know.
    pub fn handle<R, P>(
        &self,
        request: &CfrRequest,
        automated: bool,
        ctx: &mut DispatchContext<'_, R, P>,
    ) -> CfrOutcome
    where
        R: RulesOracle + ?Sized,
        P: DecisionPrompter + ?Sized,
    {
        let outcome = match request {
            CfrRequest::DominoEffect { entity } => {
                if automated {
                    CfrOutcome::Exempt {
                        reason: ExemptReason::AutomatedClient,
                    }
                } else {
                    self.domino_effect(*entity, ctx)
                }
            },
            CfrRequest::AmsAssign { entity, attacks } => CfrOutcome::answered(
                CfrResponse::AmsAssign(self.assign_defense(
                    CfrKind::AmsAssign,
                    *entity,
                    attacks,
                    None,
                    ctx,
                )),
            ),
            CfrRequest::ApdsAssign {
                entity,
                attacks,
                distances,
            } => CfrOutcome::answered(CfrResponse::ApdsAssign(self.assign_defense(
                CfrKind::ApdsAssign,
                *entity,
                attacks,
                Some(distances),
                ctx,
            ))),
            CfrRequest::HiddenPointBlankShot { attacker, target } => {
                self.point_blank_shot(*attacker, *target, ctx)
            },
            CfrRequest::TeleguidedTarget { candidates, to_hit } => CfrOutcome::answered(
                CfrResponse::TeleguidedTarget(self.teleguided_target(candidates, to_hit, ctx)),
            ),
            CfrRequest::TagTarget { targets } => {
                CfrOutcome::answered(CfrResponse::TagTarget(self.tag_target(targets, ctx)))
            },
        };

        match &outcome {
            CfrOutcome::Answered { response, .. } => {
                info!(kind = %request.kind(), ?response, "feedback request resolved");
            },
            CfrOutcome::Exempt { reason } => {
                debug!(kind = %request.kind(), ?reason, "feedback request exempt from reply");
            },
        }
        outcome
    }

    fn domino_effect<R, P>(
        &self,
        entity: EntityId,
        ctx: &mut DispatchContext<'_, R, P>,
    ) -> CfrOutcome
    where
        R: RulesOracle + ?Sized,
        P: DecisionPrompter + ?Sized,
    {
        let no_action = CfrOutcome::answered(CfrKind::DominoEffect.default_response());
        let Some(unit) = ctx.roster.get(entity) else {
            report_violation_to!(
                self.observer,
                ViolationSeverity::Error,
                ViolationKind::CfrProtocol,
                @round ctx.round,
                @context { "entity" => entity },
                "domino effect for unknown entity {}",
                entity
            );
            return no_action;
        };

        let forward = ctx.rules.is_legal_step(unit, StepDirection::Forward);
        let backward = ctx.rules.is_legal_step(unit, StepDirection::Backward);
        let mut steps: SmallVec<[StepDirection; 2]> = SmallVec::new();
        if forward {
            steps.push(StepDirection::Forward);
        }
        if backward {
            steps.push(StepDirection::Backward);
        }
        if steps.is_empty() {
            // server insists the unit is displaced; let the player take the hit or step back anyway
            steps.push(StepDirection::Backward);
        }

        let mut options: SmallVec<[String; 4]> = steps
            .iter()
            .map(|step| match step {
                StepDirection::Forward => "Step forward".to_owned(),
                StepDirection::Backward => "Step backward".to_owned(),
            })
            .collect();
        options.push(NO_ACTION_OPTION.to_owned());

        let prompt = ChoicePrompt::new(
            CfrKind::DominoEffect,
            "Domino effect",
            format!("{} is about to be hit by a falling unit. Move?", unit.name),
            options,
        );
        let choice = ctx.prompter.choose(&prompt);
        let step = prompt
            .selected_index(choice)
            .and_then(|index| steps.get(index).copied());
        CfrOutcome::answered(CfrResponse::DominoEffect(step))
    }

    fn assign_defense<R, P>(
        &self,
        kind: CfrKind,
        entity: EntityId,
        attacks: &[AttackCandidate],
        distances: Option<&[i32]>,
        ctx: &mut DispatchContext<'_, R, P>,
    ) -> Option<usize>
    where
        R: RulesOracle + ?Sized,
        P: DecisionPrompter + ?Sized,
    {
        let system = if kind == CfrKind::AmsAssign { "AMS" } else { "APDS" };
        let defender = match ctx.roster.require(entity) {
            Ok(unit) => unit.name.clone(),
            Err(err) => {
                self.lookup_failed(kind, &err, ctx.round);
                return None;
            },
        };

        let mut options: SmallVec<[String; 4]> = SmallVec::with_capacity(attacks.len() + 1);
        options.push(NONE_OPTION.to_owned());
        for (index, attack) in attacks.iter().enumerate() {
            let mut description = match ctx.roster.describe_attack(attack) {
                Ok(description) => description,
                Err(err) => {
                    self.lookup_failed(kind, &err, ctx.round);
                    return None;
                },
            };
            if let Some(distances) = distances {
                match distances.get(index) {
                    Some(distance) => description.push_str(&format!(" (distance {distance})")),
                    None => description.push_str(" (distance ?)"),
                }
            }
            options.push(description);
        }

        let prompt = ChoicePrompt::new(
            kind,
            format!("{system} assignment"),
            format!("Which attack should the {system} of {defender} engage?"),
            options,
        );
        let choice = ctx.prompter.choose(&prompt);
        // position 0 is the synthetic "None" entry
        match prompt.selected_index(choice) {
            Some(0) | None => None,
            Some(index) => Some(index - 1),
        }
    }

    fn point_blank_shot<R, P>(
        &self,
        attacker: EntityId,
        target: EntityId,
        ctx: &mut DispatchContext<'_, R, P>,
    ) -> CfrOutcome
    where
        R: RulesOracle + ?Sized,
        P: DecisionPrompter + ?Sized,
    {
        let (Some(shooter), Some(victim)) = (ctx.roster.get(attacker), ctx.roster.get(target))
        else {
            debug!(%attacker, %target, "point blank shot names unknown units");
            return CfrOutcome::Exempt {
                reason: ExemptReason::NotAddressed,
            };
        };

        if !ctx.rules.is_legal_point_blank_pair(shooter, victim) {
            report_violation_to!(
                self.observer,
                ViolationSeverity::Error,
                ViolationKind::Desync,
                @round ctx.round,
                @context { "attacker" => attacker, "target" => target },
                "server offered an illegal point blank shot from {} at {}",
                attacker,
                target
            );
            return CfrOutcome::answered(CfrResponse::HiddenPointBlankShot(None));
        }

        let prompt = ConfirmPrompt {
            kind: CfrKind::HiddenPointBlankShot,
            title: "Point blank shot".to_owned(),
            question: format!(
                "{} has moved adjacent to your hidden {}. Take a point blank shot?",
                victim.name, shooter.name
            ),
        };
        match ctx.prompter.confirm(&prompt) {
            Confirmation::Accepted => CfrOutcome::Answered {
                response: CfrResponse::HiddenPointBlankShot(Some(PointBlankAck { attacker })),
                follow_up: Some(FollowUp::EnterPointBlankShot { attacker, target }),
            },
            Confirmation::Declined | Confirmation::Dismissed => {
                CfrOutcome::answered(CfrResponse::HiddenPointBlankShot(None))
            },
        }
    }

    fn teleguided_target<R, P>(
        &self,
        candidates: &[EntityId],
        to_hit: &[i32],
        ctx: &mut DispatchContext<'_, R, P>,
    ) -> usize
    where
        R: RulesOracle + ?Sized,
        P: DecisionPrompter + ?Sized,
    {
        if candidates.is_empty() {
            self.no_candidates(CfrKind::TeleguidedTarget, ctx.round);
            return 0;
        }
        if to_hit.len() != candidates.len() {
            report_violation_to!(
                self.observer,
                ViolationSeverity::Warning,
                ViolationKind::CfrProtocol,
                @round ctx.round,
                "{} candidates but {} to-hit values",
                candidates.len(),
                to_hit.len()
            );
        }

        let mut options: SmallVec<[String; 4]> = SmallVec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let name = match ctx.roster.require(*candidate) {
                Ok(unit) => &unit.name,
                Err(err) => {
                    self.lookup_failed(CfrKind::TeleguidedTarget, &err, ctx.round);
                    return 0;
                },
            };
            options.push(match to_hit.get(index) {
                Some(value) => format!("{name} (to-hit {value})"),
                None => format!("{name} (to-hit ?)"),
            });
        }

        let prompt = ChoicePrompt::new(
            CfrKind::TeleguidedTarget,
            "Teleguided missile",
            "Select the target of the teleoperated missile",
            options,
        );
        Self::index_or_first(&prompt, ctx.prompter.choose(&prompt))
    }

    fn tag_target<R, P>(&self, targets: &[TargetRef], ctx: &mut DispatchContext<'_, R, P>) -> usize
    where
        R: RulesOracle + ?Sized,
        P: DecisionPrompter + ?Sized,
    {
        if targets.is_empty() {
            self.no_candidates(CfrKind::TagTarget, ctx.round);
            return 0;
        }

        let mut options: SmallVec<[String; 4]> = SmallVec::with_capacity(targets.len());
        for target in targets {
            match ctx.roster.target_name(target) {
                Ok(name) => options.push(name),
                Err(err) => {
                    self.lookup_failed(CfrKind::TagTarget, &err, ctx.round);
                    return 0;
                },
            }
        }

        let prompt = ChoicePrompt::new(
            CfrKind::TagTarget,
            "TAG target",
            "Select the target designated by TAG",
            options,
        );
        Self::index_or_first(&prompt, ctx.prompter.choose(&prompt))
    }

    /// Dismissal falls back to the first target.
    fn index_or_first(prompt: &ChoicePrompt, choice: Choice) -> usize {
        prompt.selected_index(choice).unwrap_or(0)
    }

    fn lookup_failed(&self, kind: CfrKind, err: &crate::roster::LookupError, round: u32) {
        report_violation_to!(
            self.observer,
            ViolationSeverity::Warning,
            ViolationKind::CfrProtocol,
            @round round,
            "{} request could not be resolved: {}",
            kind,
            err
        );
    }

    fn no_candidates(&self, kind: CfrKind, round: u32) {
        report_violation_to!(
            self.observer,
            ViolationSeverity::Warning,
            ViolationKind::CfrProtocol,
            @round round,
            "{} request has no candidates",
            kind
        );
    }
}
