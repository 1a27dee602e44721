//! Advisory "skill file" loading
//!
//! The advisory prompt includes an operator-maintained context blob. The
//! first existing, non-empty candidate file wins; absence is tolerated.

use std::fs;
use std::path::Path;
use tracing::debug;

/// Candidate skill file locations, checked in order
const SKILL_FILE_CANDIDATES: [&str; 3] = [
    "./.colosseum/AGENT_SKILL_FILE.md",
    "./AGENT_SKILL_FILE.md",
    "./docs/AGENT_SKILL_FILE.md",
];

/// Load the skill file text, or None if no candidate exists
pub fn load_skill_text() -> Option<String> {
    load_from(&SKILL_FILE_CANDIDATES)
}

/// First existing non-empty file among `paths`
pub fn load_from<P: AsRef<Path>>(paths: &[P]) -> Option<String> {
    for path in paths {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Loaded skill file from {}", path.display());
                return Some(text);
            }
            _ => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_first_non_empty_candidate_wins() {
        let dir = std::env::temp_dir().join("colosseum-bot-skill-test");
        fs::create_dir_all(&dir).unwrap();
        let empty = dir.join("empty.md");
        let real = dir.join("real.md");
        fs::write(&empty, "   \n").unwrap();
        fs::write(&real, "# Skill context\nkeep links current").unwrap();

        let missing = dir.join("missing.md");
        let loaded = load_from(&[missing.clone(), empty.clone(), real.clone()]);
        assert_eq!(
            loaded.as_deref(),
            Some("# Skill context\nkeep links current")
        );

        // absence is not an error
        assert!(load_from(&[missing, empty]).is_none());
    }
}
