/// Asks the caller to approve an irreversible action described by `description`.
pub trait ConfirmAction {
    fn confirm(&self, description: &str) -> bool;
}

/// Approves every action. Used by `--yes` and scripted runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl ConfirmAction for AlwaysConfirm {
    fn confirm(&self, _description: &str) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NeverConfirm;

impl ConfirmAction for NeverConfirm {
    fn confirm(&self, _description: &str) -> bool {
        false
    }
}

impl<F> ConfirmAction for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, description: &str) -> bool {
        self(description)
    }
}
