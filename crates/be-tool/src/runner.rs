use std::collections::BTreeMap;
use std::path::Path;

use be_api::create_core_from_json;
use be_core::CharacterId;
use serde::Serialize;

use crate::source::{read_setup, read_test_case};
use crate::{BeToolError, CaseStep, ExpectedPage, TestCase};

const MAX_FRAMES: u64 = 100_000;

/// State observed after the last step, keyed the way the case asked for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedState {
    pub party: Vec<CharacterId>,
    pub monsters: Vec<CharacterId>,
    pub switches: BTreeMap<String, Option<bool>>,
    pub variables: BTreeMap<String, Option<f64>>,
    pub pages: Vec<ExpectedPage>,
    pub busy: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub observed: ObservedState,
    pub steps: usize,
    pub frames: u64,
}

pub fn run_case(case_dir: &Path, case: &TestCase) -> Result<RunReport, BeToolError> {
    let setup = read_setup(&case_dir.join(&case.setup))?;
    let mut harness = create_core_from_json(&setup)?;
    let mut busy = None;

    for step in &case.steps {
        match step {
            CaseStep::SetPhase { phase, active } => {
                harness.turn.set_phase(*phase);
                harness.turn.set_active(*active);
            }
            CaseStep::Trigger { trigger } => harness.core.start(*trigger),
            CaseStep::Frames { count } => {
                if harness.core.frame() + u64::from(*count) > MAX_FRAMES {
                    return Err(BeToolError::GuardExceeded {
                        max_frames: MAX_FRAMES,
                    });
                }
                harness.frames(*count);
            }
            CaseStep::MemberChange { change } => {
                harness.core.enqueue_member_change(change.clone());
            }
            CaseStep::SetNextAction {
                target,
                command,
                timing,
            } => {
                harness
                    .core
                    .set_next_action(*target, command.clone(), *timing);
            }
            CaseStep::SetSwitch { name, value } => harness.store.put_switch(name, *value),
            CaseStep::Busy { status_tick } => busy = Some(harness.core.is_busy(*status_tick)),
            CaseStep::Settle { max_frames } => {
                harness.settle(*max_frames)?;
                busy = Some(false);
            }
        }
    }

    let expected = &case.expected;
    let observed = ObservedState {
        party: harness.core.party().iter().map(|member| member.id).collect(),
        monsters: harness
            .core
            .monsters()
            .iter()
            .map(|monster| monster.id)
            .collect(),
        switches: expected
            .switches
            .keys()
            .map(|name| (name.clone(), harness.store.switch_named(name)))
            .collect(),
        variables: expected
            .variables
            .keys()
            .map(|name| (name.clone(), harness.store.variable_named(name)))
            .collect(),
        pages: harness
            .core
            .actors()
            .iter()
            .map(|actor| ExpectedPage {
                actor: actor.def.id,
                page: actor.current_page,
            })
            .collect(),
        busy,
    };

    Ok(RunReport {
        observed,
        steps: case.steps.len(),
        frames: harness.core.frame(),
    })
}

pub fn assert_case(case_path: &Path) -> Result<RunReport, BeToolError> {
    let case = read_test_case(case_path)?;
    let case_dir = case_path.parent().unwrap_or_else(|| Path::new("."));
    let report = run_case(case_dir, &case)?;
    let observed = &report.observed;
    let expected = &case.expected;

    if let Some(party) = &expected.party {
        if *party != observed.party {
            return Err(mismatch("party", party, &observed.party));
        }
    }
    if let Some(monsters) = &expected.monsters {
        if *monsters != observed.monsters {
            return Err(mismatch("monsters", monsters, &observed.monsters));
        }
    }
    for (name, value) in &expected.switches {
        let actual = observed.switches.get(name).copied().flatten();
        if actual != Some(*value) {
            return Err(mismatch(format!("switches.{}", name), value, &actual));
        }
    }
    for (name, value) in &expected.variables {
        let actual = observed.variables.get(name).copied().flatten();
        if !actual.is_some_and(|actual| (actual - value).abs() < 1e-9) {
            return Err(mismatch(format!("variables.{}", name), value, &actual));
        }
    }
    for page in &expected.pages {
        let actual = observed
            .pages
            .iter()
            .find(|candidate| candidate.actor == page.actor)
            .map(|candidate| candidate.page);
        if actual != Some(page.page) {
            return Err(mismatch(format!("pages.{}", page.actor), &page.page, &actual));
        }
    }
    if let Some(busy) = expected.busy {
        if observed.busy != Some(busy) {
            return Err(mismatch("busy", &busy, &observed.busy));
        }
    }

    Ok(report)
}

fn mismatch(
    field: impl Into<String>,
    expected: &impl Serialize,
    actual: &impl Serialize,
) -> BeToolError {
    let expected = match serde_json::to_string(expected) {
        Ok(text) => text,
        Err(error) => return BeToolError::StateSerialize(error),
    };
    let actual = match serde_json::to_string(actual) {
        Ok(text) => text,
        Err(error) => return BeToolError::StateSerialize(error),
    };
    BeToolError::StateMismatch {
        field: field.into(),
        expected,
        actual,
    }
}
