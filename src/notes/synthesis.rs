//! Derives the reviewables a note should have from its fields and config

use std::iter;

use serde::{Deserialize, Serialize};

use super::models::{Field, FieldRole, NoteConfig, ReviewableSpec, Side};

/// How a separable note is split when both sides hold several fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparablePolicy {
    /// One reviewable per answer field, each with the whole prompt side
    #[default]
    PromptSet,
    /// One reviewable per (prompt field, answer field) pair
    CrossProduct,
}

/// Compute the desired reviewables for a note.
///
/// `fields_by_side` holds the live fields of each side ordered by position.
/// The front → back direction is always produced; back → front is added for
/// reversible notes. Within a reviewable the prompt is presented on
/// [`Side::Front`] and the answer on [`Side::Back`], whatever side the
/// underlying field is stored on.
pub fn synthesize_reviewables(
    fields_by_side: &[Vec<Field>; 2],
    config: NoteConfig,
    policy: SeparablePolicy,
) -> Vec<ReviewableSpec> {
    let prompt_sides: &[Side] = if config.reversible {
        &Side::ALL
    } else {
        &[Side::Front]
    };

    prompt_sides
        .iter()
        .flat_map(|&prompt_side| {
            let prompt = &fields_by_side[prompt_side.index()];
            let answer = &fields_by_side[prompt_side.opposite().index()];
            direction_specs(prompt, answer, config.separable, policy)
        })
        .collect()
}

fn role(field: &Field, side: Side) -> FieldRole {
    FieldRole {
        field: field.id,
        side,
    }
}

fn direction_specs(
    prompt: &[Field],
    answer: &[Field],
    separable: bool,
    policy: SeparablePolicy,
) -> Vec<ReviewableSpec> {
    let prompt_roles = || prompt.iter().map(|f| role(f, Side::Front));

    if !separable || answer.len() <= 1 {
        return vec![ReviewableSpec::new(
            prompt_roles().chain(answer.iter().map(|f| role(f, Side::Back))),
        )];
    }

    match policy {
        SeparablePolicy::CrossProduct if prompt.len() > 1 => prompt
            .iter()
            .flat_map(|p| {
                answer.iter().map(move |a| {
                    ReviewableSpec::new([role(p, Side::Front), role(a, Side::Back)])
                })
            })
            .collect(),
        _ => answer
            .iter()
            .map(|a| ReviewableSpec::new(prompt_roles().chain(iter::once(role(a, Side::Back)))))
            .collect(),
    }
}
