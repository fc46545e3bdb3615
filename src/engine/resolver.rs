use crate::definition::Transition;
use crate::error::{Error, Result};

/// Pick the next step id for `signal`.
///
/// Two passes: the first transition whose `on_signal` equals the signal wins;
/// failing that, the first default transition. A default listed before a
/// specific match therefore never shadows it.
pub fn resolve_transition<'a>(
    step_id: &str,
    transitions: &'a [Transition],
    signal: Option<&str>,
) -> Result<&'a str> {
    if let Some(value) = signal {
        if let Some(exact) = transitions
            .iter()
            .find(|t| t.on_signal.as_deref() == Some(value))
        {
            return Ok(&exact.next_step);
        }
    }

    transitions
        .iter()
        .find(|t| t.is_default())
        .map(|t| t.next_step.as_str())
        .ok_or_else(|| Error::NoMatchingTransition {
            step_id: step_id.to_string(),
            signal: signal.map(str::to_string),
        })
}
