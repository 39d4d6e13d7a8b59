//! Initialize loam in a project directory.

use clap::Args;
use std::fs;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Root directory (defaults to current directory)
    #[arg(short, long)]
    pub root: Option<std::path::PathBuf>,
}

/// Run init command.
pub fn run(args: InitArgs) -> i32 {
    let root = super::resolve_root(args.root);
    cmd_init(&root)
}

fn cmd_init(root: &Path) -> i32 {
    let mut changes = Vec::new();

    // 1. Create .loam directory if needed
    let loam_dir = root.join(".loam");
    if !loam_dir.exists() {
        if let Err(e) = fs::create_dir_all(&loam_dir) {
            eprintln!("Failed to create .loam directory: {}", e);
            return 1;
        }
        changes.push("Created .loam/".to_string());
    }

    // 2. Create default config.toml if needed
    let config_path = loam_dir.join("config.toml");
    if !config_path.exists() {
        let default_config = r#"# Loam configuration
# See: https://github.com/rhizome-lab/loam

# [modes.discovery]
# enabled = true
# priority = 90

# [modes.discovery.settings]
# questions = ["what is the scope?"]
"#;
        if let Err(e) = fs::write(&config_path, default_config) {
            eprintln!("Failed to create config.toml: {}", e);
            return 1;
        }
        changes.push("Created .loam/config.toml".to_string());
    }

    // 3. Update .gitignore if needed
    let gitignore_path = root.join(".gitignore");
    changes.extend(update_gitignore(&gitignore_path));

    // 4. Report changes
    if changes.is_empty() {
        println!("Already initialized.");
    } else {
        println!("Initialized loam:");
        for change in &changes {
            println!("  {}", change);
        }
    }

    0
}

/// Entries we want in .gitignore
const GITIGNORE_ENTRIES: &[&str] = &[".loam", "!.loam/config.toml"];

/// Update .gitignore with loam entries. Returns list of changes made.
fn update_gitignore(path: &Path) -> Vec<String> {
    let existing = fs::read_to_string(path).unwrap_or_default();
    let lines: Vec<&str> = existing.lines().collect();

    let missing: Vec<&str> = GITIGNORE_ENTRIES
        .iter()
        .filter(|entry| !lines.contains(entry))
        .copied()
        .collect();
    if missing.is_empty() {
        return Vec::new();
    }

    let mut content = existing.clone();
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for entry in &missing {
        content.push_str(entry);
        content.push('\n');
    }

    match fs::write(path, content) {
        Ok(()) => missing
            .iter()
            .map(|e| format!("Added {} to .gitignore", e))
            .collect(),
        Err(e) => {
            eprintln!("Failed to update .gitignore: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_config_and_gitignore() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(cmd_init(tmp.path()), 0);
        assert!(tmp.path().join(".loam").join("config.toml").exists());

        let gitignore = fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
        assert!(gitignore.contains(".loam"));
        assert!(gitignore.contains("!.loam/config.toml"));
    }

    #[test]
    fn init_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        cmd_init(tmp.path());
        let before = fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
        cmd_init(tmp.path());
        let after = fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
        assert_eq!(before, after);
    }
}
