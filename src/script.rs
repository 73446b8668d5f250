//! View-aware command scripts.
//!
//! A [`DiffResult`] lists configuration commands relative to system view. The
//! transport layer, however, starts in user view and has to know which view
//! each command runs in, which prompts to answer, and how to compensate for
//! executed steps when a later one fails. [`CommandScript`] carries that
//! information.

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{
    COMMAND_CONFIRM_PROMPTS, RETURN_COMMAND, SAVE_COMMAND, SAVE_CONFIRM_ANSWER,
    SAVE_CONFIRM_PROMPTS, SYSTEM_VIEW_COMMAND,
};
use crate::diff::{DiffAction, DiffResult, context_transition};
use crate::error::ReconcileError;
use crate::render::UndoRules;

/// CLI view a step is issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// `<device>` prompt.
    User,
    /// `[device]` prompt.
    System,
    /// `[device-<context>]` prompt below system view.
    Context,
}

/// Answer to send when the device asks for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PromptAnswer {
    /// Regex matching the prompt text.
    pub pattern: String,
    pub answer: String,
}

/// One command of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScriptStep {
    /// View the command is issued from.
    pub view: View,
    /// Context path active when the command is issued.
    pub context: Vec<String>,
    pub command: String,
    /// Prompts the command may raise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<PromptAnswer>,
    /// Compensating commands for a configuration step, issued in `context`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rollback: Vec<String>,
}

/// Planned rollback command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRollback {
    /// Context path the command must be issued in.
    pub context: Vec<String>,
    pub command: String,
}

/// Ordered steps for the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommandScript {
    pub steps: Vec<ScriptStep>,
    /// Copied from the diff; a dry-run script must not be executed.
    pub dry_run: bool,
}

fn view_of(context: &[String]) -> View {
    if context.is_empty() {
        View::System
    } else {
        View::Context
    }
}

static COMMAND_PROMPTS: Lazy<Vec<(Regex, PromptAnswer)>> = Lazy::new(|| {
    COMMAND_CONFIRM_PROMPTS
        .iter()
        .map(|(command, prompt, answer)| match Regex::new(command) {
            Ok(re) => (
                re,
                PromptAnswer {
                    pattern: (*prompt).to_string(),
                    answer: (*answer).to_string(),
                },
            ),
            Err(err) => panic!("invalid command prompt pattern {command}: {err}"),
        })
        .collect()
});

/// Prompts a configuration command is known to raise.
fn prompts_for(command: &str) -> Vec<PromptAnswer> {
    COMMAND_PROMPTS
        .iter()
        .filter(|(re, _)| re.is_match(command))
        .map(|(_, answer)| answer.clone())
        .collect()
}

fn save_prompts() -> Vec<PromptAnswer> {
    SAVE_CONFIRM_PROMPTS
        .iter()
        .map(|pattern| PromptAnswer {
            pattern: (*pattern).to_string(),
            answer: SAVE_CONFIRM_ANSWER.to_string(),
        })
        .collect()
}

impl CommandScript {
    /// Wraps a diff into a script: enter system view, walk the contexts of
    /// each change, return to user view, then save if the diff asks for it.
    pub fn from_diff(diff: &DiffResult, undo_rules: &UndoRules) -> Result<Self, ReconcileError> {
        if diff.preview.is_empty() && !diff.saved {
            return Err(ReconcileError::InvalidScript(
                "diff has nothing to execute".to_string(),
            ));
        }

        let mut steps = Vec::new();
        if !diff.preview.is_empty() {
            steps.push(ScriptStep {
                view: View::User,
                context: Vec::new(),
                command: SYSTEM_VIEW_COMMAND.to_string(),
                prompts: Vec::new(),
                rollback: Vec::new(),
            });

            let mut path: &[String] = &[];
            for entry in &diff.preview {
                let mut walked = path.to_vec();
                for command in context_transition(path, &entry.context) {
                    let view = view_of(&walked);
                    let from = walked.clone();
                    if entry.context.starts_with(&walked) && walked.len() < entry.context.len() {
                        walked.push(command.clone());
                    } else {
                        walked.pop();
                    }
                    steps.push(ScriptStep {
                        view,
                        context: from,
                        command,
                        prompts: Vec::new(),
                        rollback: Vec::new(),
                    });
                }

                // An addition that overwrote a value restores that value.
                let rollback = match entry.action {
                    DiffAction::Add if entry.retracted.is_empty() => {
                        undo_rules.undo_for(&entry.line).into_iter().collect()
                    }
                    DiffAction::Add | DiffAction::Remove => entry.retracted.clone(),
                };
                steps.push(ScriptStep {
                    view: view_of(&entry.context),
                    context: entry.context.clone(),
                    command: entry.line.clone(),
                    prompts: prompts_for(&entry.line),
                    rollback,
                });
                path = entry.context.as_slice();
            }

            steps.push(ScriptStep {
                view: view_of(path),
                context: path.to_vec(),
                command: RETURN_COMMAND.to_string(),
                prompts: Vec::new(),
                rollback: Vec::new(),
            });
        }

        if diff.saved {
            steps.push(ScriptStep {
                view: View::User,
                context: Vec::new(),
                command: SAVE_COMMAND.to_string(),
                prompts: save_prompts(),
                rollback: Vec::new(),
            });
        }

        let script = Self {
            steps,
            dry_run: diff.dry_run,
        };
        script.validate()?;
        Ok(script)
    }

    /// Checks that the script has steps and none of them is blank.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.steps.is_empty() {
            return Err(ReconcileError::InvalidScript(
                "script has no steps".to_string(),
            ));
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.command.trim().is_empty() {
                return Err(ReconcileError::InvalidScript(format!(
                    "step[{i}] command is empty"
                )));
            }
            if step.rollback.iter().any(|c| c.trim().is_empty()) {
                return Err(ReconcileError::InvalidScript(format!(
                    "step[{i}] has an empty rollback command"
                )));
            }
        }
        Ok(())
    }

    /// Commands in execution order.
    pub fn commands(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.command.as_str()).collect()
    }

    /// Rollback commands for the executed steps, latest step first.
    ///
    /// Steps without compensation (view changes, save) are skipped.
    pub fn plan_rollback(
        &self,
        executed_step_indices: &[usize],
    ) -> Result<Vec<PlannedRollback>, ReconcileError> {
        let mut planned = Vec::new();
        for idx in executed_step_indices.iter().rev() {
            let step = self.steps.get(*idx).ok_or_else(|| {
                ReconcileError::InvalidScript(format!("executed step index out of range: {idx}"))
            })?;
            for command in &step.rollback {
                planned.push(PlannedRollback {
                    context: step.context.clone(),
                    command: command.clone(),
                });
            }
        }
        Ok(planned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileOptions;
    use crate::intent::{
        ClockTimezoneParams, DesiredState, DnsServerParams, IntentParams, LocalUserParams,
        StpEdgedPortParams, UserAttribute, VlanParams,
    };
    use crate::reconciler::reconcile;
    use crate::render::UNDO_RULES;

    fn script_for(current: &[&str], options: &ReconcileOptions) -> CommandScript {
        let intents = vec![
            VlanParams {
                id: 20,
                name: Some("Eng".to_string()),
                state: DesiredState::Present,
            }
            .into_intent()
            .expect("intent"),
            StpEdgedPortParams {
                interface: "GigabitEthernet0/0/3".to_string(),
                enabled: true,
            }
            .into_intent()
            .expect("intent"),
            DnsServerParams {
                address: "10.0.0.9".to_string(),
                ipv6: false,
                state: DesiredState::Absent,
            }
            .into_intent()
            .expect("intent"),
        ];
        let diff = reconcile(&intents, current, options).expect("reconcile");
        CommandScript::from_diff(&diff, &UNDO_RULES).expect("script")
    }

    #[test]
    fn script_wraps_changes_in_system_view_and_save() {
        let script = script_for(&["dns server 10.0.0.9"], &ReconcileOptions::default());
        assert_eq!(
            script.commands(),
            vec![
                "system-view",
                "undo dns server 10.0.0.9",
                "vlan 20",
                "name Eng",
                "quit",
                "interface GigabitEthernet0/0/3",
                "stp edged-port enable",
                "return",
                "save",
            ]
        );
        assert_eq!(script.steps[0].view, View::User);
        assert_eq!(script.steps[3].view, View::Context);
        assert_eq!(script.steps[4].view, View::Context);
        assert_eq!(script.steps[5].view, View::System);
        assert_eq!(script.steps[7].view, View::Context);
        let save = script.steps.last().expect("save step");
        assert_eq!(save.view, View::User);
        assert!(save.prompts.iter().all(|p| p.answer == "y"));
        assert!(!save.prompts.is_empty());
    }

    #[test]
    fn rollback_runs_in_reverse_and_restores_removed_lines() {
        let script = script_for(&["dns server 10.0.0.9"], &ReconcileOptions::default());
        let plan = script
            .plan_rollback(&[0, 1, 2, 3, 4, 5, 6])
            .expect("plan rollback");
        let commands: Vec<&str> = plan.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(
            commands,
            vec!["undo stp edged-port enable", "undo name", "dns server 10.0.0.9"]
        );
        assert_eq!(plan[0].context, vec!["interface GigabitEthernet0/0/3"]);
        assert!(plan[2].context.is_empty());
    }

    #[test]
    fn rollback_restores_values_overwritten_in_place() {
        let intents = vec![
            VlanParams {
                id: 20,
                name: Some("Eng".to_string()),
                state: DesiredState::Present,
            }
            .into_intent()
            .expect("intent"),
            ClockTimezoneParams {
                name: "CEST".to_string(),
                offset_hours: 2,
                offset_minutes: 0,
                state: DesiredState::Present,
            }
            .into_intent()
            .expect("intent"),
        ];
        let current = ["clock timezone CET add 01:00:00", "vlan 20", " name Old"];
        let diff = reconcile(&intents, &current, &ReconcileOptions::default()).expect("reconcile");
        let script = CommandScript::from_diff(&diff, &UNDO_RULES).expect("script");
        assert_eq!(
            script.commands(),
            vec![
                "system-view",
                "vlan 20",
                "name Eng",
                "quit",
                "clock timezone CEST add 02:00:00",
                "return",
                "save",
            ]
        );

        let plan = script
            .plan_rollback(&[0, 1, 2, 3, 4])
            .expect("plan rollback");
        let restored: Vec<(Vec<String>, &str)> = plan
            .iter()
            .map(|r| (r.context.clone(), r.command.as_str()))
            .collect();
        assert_eq!(
            restored,
            vec![
                (Vec::new(), "clock timezone CET add 01:00:00"),
                (vec!["vlan 20".to_string()], "name Old"),
            ]
        );
    }

    #[test]
    fn privilege_level_step_answers_confirmation() {
        let intent = LocalUserParams {
            name: "ops".to_string(),
            attribute: Some(UserAttribute::PrivilegeLevel(3)),
            state: DesiredState::Present,
        }
        .into_intent()
        .expect("intent");
        let empty: [&str; 0] = [];
        let diff = reconcile(&[intent], &empty, &ReconcileOptions::default()).expect("reconcile");
        let script = CommandScript::from_diff(&diff, &UNDO_RULES).expect("script");

        let step = script
            .steps
            .iter()
            .find(|s| s.command == "local-user ops privilege level 3")
            .expect("privilege step");
        assert_eq!(
            step.prompts,
            vec![PromptAnswer {
                pattern: "[Yy]/[Nn]".to_string(),
                answer: "y".to_string(),
            }]
        );
        let aaa = script
            .steps
            .iter()
            .find(|s| s.command == "aaa")
            .expect("aaa step");
        assert!(aaa.prompts.is_empty());
    }

    #[test]
    fn rollback_rejects_unknown_step() {
        let script = script_for(&[], &ReconcileOptions::default());
        let err = script.plan_rollback(&[99]).expect_err("out of range");
        assert!(matches!(err, ReconcileError::InvalidScript(_)));
    }

    #[test]
    fn empty_diff_has_no_script() {
        let err = CommandScript::from_diff(&DiffResult::default(), &UNDO_RULES)
            .expect_err("nothing to run");
        assert!(matches!(err, ReconcileError::InvalidScript(_)));
    }

    #[test]
    fn save_only_diff_skips_system_view() {
        let diff = DiffResult {
            commands: vec!["save".to_string()],
            saved: true,
            ..DiffResult::default()
        };
        let script = CommandScript::from_diff(&diff, &UNDO_RULES).expect("script");
        assert_eq!(script.commands(), vec!["save"]);
    }

    #[test]
    fn validate_rejects_blank_commands() {
        let script = CommandScript {
            steps: vec![ScriptStep {
                view: View::System,
                context: Vec::new(),
                command: "  ".to_string(),
                prompts: Vec::new(),
                rollback: Vec::new(),
            }],
            dry_run: false,
        };
        assert!(matches!(
            script.validate(),
            Err(ReconcileError::InvalidScript(_))
        ));
    }

    #[test]
    fn dry_run_is_carried_over() {
        let script = script_for(&[], &ReconcileOptions::check_mode());
        assert!(script.dry_run);
    }
}
