//! User confirmation for destructive commands

/// Asks the user before files are removed
///
/// Returning `false` cancels the command without sending anything; it is
/// not an error.
pub trait Confirm {
    /// Whether to proceed with the action described by `prompt`
    fn confirm(&self, prompt: &str) -> bool;
}

/// Accepts every prompt (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

/// Declines every prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

impl Confirm for NeverConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
