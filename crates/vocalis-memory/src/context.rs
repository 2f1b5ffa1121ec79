// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt formatting for retrieved memories.

use vocalis_core::ScoredFragment;

/// Renders fragments as a `## Relevant Memories` block, or `None` when empty.
pub fn format_memory_context(fragments: &[ScoredFragment]) -> Option<String> {
    if fragments.is_empty() {
        return None;
    }
    let mut out = String::from("## Relevant Memories\n");
    for scored in fragments {
        out.push_str("- ");
        out.push_str(scored.fragment.text.trim());
        out.push('\n');
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocalis_core::{MemoryFragment, TenantScope};

    #[test]
    fn empty_renders_nothing() {
        assert!(format_memory_context(&[]).is_none());
    }

    #[test]
    fn fragments_render_as_bullets() {
        let fragment = MemoryFragment {
            id: "f1".into(),
            text: " My dog Max passed away last spring ".into(),
            embedding: vec![],
            scope: TenantScope::new("grandma", "alice"),
            extraction_score: 1.0,
            extracted_from: "t1".into(),
            created_at: chrono::Utc::now(),
        };
        let rendered = format_memory_context(&[ScoredFragment {
            fragment,
            score: 0.9,
        }])
        .unwrap();
        assert_eq!(
            rendered,
            "## Relevant Memories\n- My dog Max passed away last spring\n"
        );
    }
}
