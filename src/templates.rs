//! Default README markers written into team-owned partitions.

use crate::layout::{Category, Partition};

/// README for `prompts/project`.
pub const PROMPTS_PROJECT_README_MD: &str = r#"# Project Prompts

Prompts specific to this project live here.

This directory is owned by your team. `update-shared-prompts` never modifies
files in it.

- Put prompts that encode project conventions, architecture, or workflows here.
- Shared prompts are installed in `../shared/` and are overwritten on every sync.
- To change a shared prompt for this project only, copy it here and edit the copy.
"#;

/// README for `prompts/experimental`.
pub const PROMPTS_EXPERIMENTAL_README_MD: &str = r#"# Experimental Prompts

A place to try out new prompts before promoting them.

This directory is owned by your team. `update-shared-prompts` never modifies
files in it.

When a prompt proves useful:
1. Move it to `../project/` if it only applies to this project.
2. Propose it to the shared collection if other projects would benefit.
"#;

/// README for `rules/project`.
pub const RULES_PROJECT_README_MD: &str = r#"# Project Rules

Rules specific to this project live here.

This directory is owned by your team. `update-shared-prompts` never modifies
files in it.

- Put rules for project conventions, tooling, and code style here.
- Shared rules are installed in `../shared/` and are overwritten on every sync.
- To change a shared rule for this project only, copy it here and edit the copy.
"#;

/// README for `rules/experimental`.
pub const RULES_EXPERIMENTAL_README_MD: &str = r#"# Experimental Rules

A place to try out new rules before promoting them.

This directory is owned by your team. `update-shared-prompts` never modifies
files in it.

When a rule proves useful:
1. Move it to `../project/` if it only applies to this project.
2. Propose it to the shared collection if other projects would benefit.
"#;

/// File name of the marker written into team-owned partitions.
pub const README_FILE_NAME: &str = "README.md";

/// Marker content for a partition, or `None` for partitions that get no marker.
pub fn readme_for(category: Category, partition: Partition) -> Option<&'static str> {
    if !partition.has_readme_marker() {
        return None;
    }
    Some(match (category, partition) {
        (Category::Prompts, Partition::Experimental) => PROMPTS_EXPERIMENTAL_README_MD,
        (Category::Rules, Partition::Experimental) => RULES_EXPERIMENTAL_README_MD,
        (Category::Prompts, _) => PROMPTS_PROJECT_README_MD,
        (Category::Rules, _) => RULES_PROJECT_README_MD,
    })
}
