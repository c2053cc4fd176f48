use dialoguer::{theme::ColorfulTheme, Confirm};

use flatmoney_core::ConfirmAction;

use crate::cli::output;

/// Confirmation source for destructive commands.
///
/// `--yes` approves without asking; otherwise the user is prompted when
/// stdin is a terminal and the action is declined when it is not.
#[derive(Debug, Clone, Copy)]
pub struct CliConfirm {
    assume_yes: bool,
    interactive: bool,
}

impl CliConfirm {
    pub fn new(assume_yes: bool, interactive: bool) -> Self {
        Self {
            assume_yes,
            interactive,
        }
    }
}

impl ConfirmAction for CliConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if !self.interactive {
            output::warning(format!("{prompt} (re-run with --yes to confirm)"));
            return false;
        }
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assume_yes_skips_the_prompt() {
        assert!(CliConfirm::new(true, false).confirm("Excluir?"));
    }

    #[test]
    fn non_interactive_declines() {
        assert!(!CliConfirm::new(false, false).confirm("Excluir?"));
    }
}
