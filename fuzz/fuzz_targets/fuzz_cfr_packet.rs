//! Fuzz target for feedback request packets.
//!
//! Feeds arbitrary packets through the dispatcher with an arbitrary roster and
//! arbitrary prompt answers.
//!
//! # Safety Properties Tested
//! - No panics on arbitrary payloads (odd pair lists, length mismatches, bad codes)
//! - A known kind is always answered, with a reply of the same kind
//! - Index replies always point into the request's option list

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use wargame_session::{
    CfrDispatcher, CfrKind, CfrPacket, CfrRequest, CfrResponse, Choice, ChoicePrompt,
    ConfirmPrompt, Confirmation, DecisionPrompter, DispatchContext, EntityId, EntityRoster,
    EntitySummary, PlayerId, RulesOracle, StepDirection,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    kind: u16,
    ints: Vec<i32>,
    aux: Vec<i32>,
    /// Ids (and one weapon each) known to the client
    roster: Vec<(i8, i8)>,
    choice: Option<u8>,
    confirmation: u8,
    legal: (bool, bool, bool),
    automated: bool,
}

struct FixedRules(bool, bool, bool);

impl RulesOracle for FixedRules {
    fn is_legal_step(&self, _: &EntitySummary, direction: StepDirection) -> bool {
        match direction {
            StepDirection::Forward => self.0,
            StepDirection::Backward => self.1,
        }
    }

    fn is_legal_point_blank_pair(&self, _: &EntitySummary, _: &EntitySummary) -> bool {
        self.2
    }
}

struct FixedAnswers {
    choice: Option<u8>,
    confirmation: u8,
}

impl DecisionPrompter for FixedAnswers {
    fn choose(&mut self, _: &ChoicePrompt) -> Choice {
        self.choice
            .map_or(Choice::Dismissed, |index| Choice::Selected(index as usize))
    }

    fn confirm(&mut self, _: &ConfirmPrompt) -> Confirmation {
        match self.confirmation % 3 {
            0 => Confirmation::Accepted,
            1 => Confirmation::Declined,
            _ => Confirmation::Dismissed,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let mut roster = EntityRoster::new();
    for (id, weapon) in &input.roster {
        roster.upsert(
            EntitySummary::new(EntityId::new(i32::from(*id)), "unit", PlayerId::new(0))
                .with_weapon(i32::from(*weapon), "weapon"),
        );
    }
    let packet = CfrPacket::new(input.kind, input.ints, input.aux);
    let rules = FixedRules(input.legal.0, input.legal.1, input.legal.2);
    let mut prompter = FixedAnswers {
        choice: input.choice,
        confirmation: input.confirmation,
    };
    let mut ctx = DispatchContext {
        roster: &roster,
        rules: &rules,
        prompter: &mut prompter,
        round: 1,
    };

    let outcome = CfrDispatcher::default().handle_packet(&packet, input.automated, &mut ctx);

    let Some(kind) = CfrKind::from_code(packet.kind) else {
        assert!(outcome.response().is_none());
        return;
    };
    let Some(response) = outcome.response() else {
        // only exemptions: bot domino effects and point blank shots for strangers
        assert!(matches!(
            kind,
            CfrKind::DominoEffect | CfrKind::HiddenPointBlankShot
        ));
        return;
    };
    assert_eq!(response.kind(), kind);

    if let Ok(request) = CfrRequest::decode(&packet) {
        match (&request, response) {
            (CfrRequest::AmsAssign { attacks, .. }, CfrResponse::AmsAssign(Some(index)))
            | (CfrRequest::ApdsAssign { attacks, .. }, CfrResponse::ApdsAssign(Some(index))) => {
                assert!(*index < attacks.len());
            },
            (CfrRequest::TeleguidedTarget { candidates, .. }, CfrResponse::TeleguidedTarget(index)) => {
                assert!(*index < candidates.len().max(1));
            },
            (CfrRequest::TagTarget { targets }, CfrResponse::TagTarget(index)) => {
                assert!(*index < targets.len().max(1));
            },
            _ => {},
        }
    }
});
