//! Shell completions module for Stackform
//!
//! Provides shell completion scripts for bash, zsh, fish, powershell, and elvish.

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};

use crate::cli::commands::CommandContext;
use crate::cli::Cli;

/// Arguments for the completions command
#[derive(Parser, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Print installation instructions instead of the script
    #[arg(long)]
    pub instructions: bool,
}

impl CompletionsArgs {
    /// Execute the completions command
    pub async fn execute(&self, ctx: &mut CommandContext) -> anyhow::Result<i32> {
        if self.instructions {
            print_installation_instructions(self.shell);
        } else {
            print!("{}", get_completions(self.shell));
            ctx.output.flush();
        }
        Ok(0)
    }
}

/// Get completions as a string
pub fn get_completions(shell: Shell) -> String {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    generate(shell, &mut cmd, "stackform", &mut buf);
    String::from_utf8(buf).unwrap_or_default()
}

/// Print installation instructions for completions
pub fn print_installation_instructions(shell: Shell) {
    match shell {
        Shell::Bash => {
            println!("# Bash completion installation:");
            println!("# Add the following to your ~/.bashrc:");
            println!();
            println!("eval \"$(stackform completions bash)\"");
            println!();
            println!("# Or save to file:");
            println!(
                "stackform completions bash > ~/.local/share/bash-completion/completions/stackform"
            );
        }
        Shell::Zsh => {
            println!("# Zsh completion installation:");
            println!("mkdir -p ~/.zsh/completions");
            println!("echo 'fpath=(~/.zsh/completions $fpath)' >> ~/.zshrc");
            println!("echo 'autoload -Uz compinit && compinit' >> ~/.zshrc");
            println!("stackform completions zsh > ~/.zsh/completions/_stackform");
        }
        Shell::Fish => {
            println!("# Fish completion installation:");
            println!("stackform completions fish > ~/.config/fish/completions/stackform.fish");
        }
        Shell::PowerShell => {
            println!("# PowerShell completion installation:");
            println!("# Add the following to your PowerShell profile:");
            println!();
            println!("Invoke-Expression (& stackform completions powershell | Out-String)");
        }
        Shell::Elvish => {
            println!("# Elvish completion installation:");
            println!("# Add the following to ~/.elvish/rc.elv:");
            println!();
            println!("eval (stackform completions elvish | slurp)");
        }
        _ => {
            println!("# Unknown shell. Please refer to your shell's documentation for completion installation.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_completions() {
        let completions = get_completions(Shell::Bash);
        assert!(completions.contains("stackform"));
        assert!(completions.contains("complete"));
    }

    #[test]
    fn test_zsh_completions() {
        let completions = get_completions(Shell::Zsh);
        assert!(completions.contains("compdef") || completions.contains("_stackform"));
    }

    #[test]
    fn test_completions_list_subcommands() {
        let completions = get_completions(Shell::Fish);
        assert!(completions.contains("synth"));
        assert!(completions.contains("validate"));
    }
}
