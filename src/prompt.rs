use anyhow::{Context, Result};
use dialoguer::{Input, Select, theme::ColorfulTheme};

/// Interactive decisions the login flow may need from the operator
pub trait Prompter {
    /// Pick one profile out of `names`
    fn choose_profile(&self, names: &[&str]) -> Result<String>;

    /// Ask for the current one-time code of an MFA device
    fn prompt_mfa_code(&self, device_arn: &str) -> Result<String>;
}

/// Prompter backed by the terminal
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for TerminalPrompter {
    fn choose_profile(&self, names: &[&str]) -> Result<String> {
        let index = Select::with_theme(&self.theme)
            .with_prompt("Choose a profile")
            .items(names)
            .default(0)
            .interact()
            .context("Failed to read profile selection")?;

        Ok(names[index].to_string())
    }

    fn prompt_mfa_code(&self, device_arn: &str) -> Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(format!("Enter MFA code for '{device_arn}'"))
            .validate_with(|input: &String| {
                if is_valid_mfa_code(input) {
                    Ok(())
                } else {
                    Err("MFA code must be 6 digits")
                }
            })
            .interact_text()
            .map(|code| code.trim().to_string())
            .context("Failed to read MFA code")
    }
}

fn is_valid_mfa_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}
