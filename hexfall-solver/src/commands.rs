//! Command alphabet and power phrases
//!
//! Level 4 - Utilities
//!
//! Every action has six interchangeable characters. Solutions are written with one
//! canonical character per action, and power phrases are then spliced in wherever their
//! characters spell the same actions.

use hexfall_core::Action;
use thiserror::Error;

/// Characters decoding to each action, canonical character first, in `Action::ALL` order
const GROUPS: [&str; 6] = [
    "bcefy2", // E
    "p'!.03", // W
    "lmno 5", // SE
    "aghij4", // SW
    "dqrvz1", // CW
    "kstuwx", // CCW
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command character {ch:?} at position {position}")]
    UnknownChar { ch: char, position: usize },
}

/// Action spelled by `ch`, case-insensitive
pub fn action_for(ch: char) -> Option<Action> {
    let lower = ch.to_ascii_lowercase();
    GROUPS
        .iter()
        .position(|group| group.contains(lower))
        .map(|i| Action::ALL[i])
}

/// Canonical character for `action`
pub fn command_char(action: Action) -> char {
    GROUPS[action.index()].as_bytes()[0] as char
}

pub fn encode(actions: &[Action]) -> String {
    actions.iter().map(|&a| command_char(a)).collect()
}

pub fn decode(commands: &str) -> Result<Vec<Action>, CommandError> {
    commands
        .chars()
        .enumerate()
        .map(|(position, ch)| action_for(ch).ok_or(CommandError::UnknownChar { ch, position }))
        .collect()
}

/// Splice one phrase into `commands` wherever it spells the same actions
pub fn substitute(commands: &str, phrase: &str) -> String {
    apply_phrases(commands, std::slice::from_ref(&phrase))
}

/// Splice phrases in order, never overwriting characters placed by an earlier phrase
pub fn apply_phrases<S: AsRef<str>>(commands: &str, phrases: &[S]) -> String {
    let mut chars: Vec<char> = commands.chars().collect();
    let Ok(actions) = decode(commands) else {
        return commands.to_string();
    };
    let mut placed = vec![false; chars.len()];

    for phrase in phrases {
        let phrase: Vec<char> = phrase.as_ref().to_lowercase().chars().collect();
        let spelled: Option<Vec<Action>> = phrase.iter().map(|&c| action_for(c)).collect();
        let Some(spelled) = spelled.filter(|s| !s.is_empty()) else {
            tracing::warn!(phrase = %phrase.iter().collect::<String>(), "phrase skipped");
            continue;
        };
        let len = spelled.len();
        let mut i = 0;
        let mut uses = 0usize;
        while i + len <= actions.len() {
            let window = i..i + len;
            if actions[window.clone()] == spelled[..] && !placed[window.clone()].iter().any(|&p| p) {
                chars[window.clone()].copy_from_slice(&phrase);
                placed[window].iter_mut().for_each(|p| *p = true);
                uses += 1;
                i += len;
            } else {
                i += 1;
            }
        }
        tracing::trace!(uses, "phrase applied");
    }
    chars.into_iter().collect()
}
