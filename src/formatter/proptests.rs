//! Property-based tests for the answer formatter

use super::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Line {
    Blank(String),
    Paragraph(String),
    Numbered(u32, String),
    Bullet(char, String),
}

impl Line {
    fn render(&self) -> String {
        match self {
            Line::Blank(ws) => ws.clone(),
            Line::Paragraph(text) => text.clone(),
            Line::Numbered(n, text) => format!("{n}. {text}"),
            Line::Bullet(glyph, text) => format!("{glyph} {text}"),
        }
    }

    fn list_kind(&self) -> Option<ListKind> {
        match self {
            Line::Numbered(..) => Some(ListKind::Ordered),
            Line::Bullet(..) => Some(ListKind::Unordered),
            _ => None,
        }
    }
}

fn arb_words() -> impl Strategy<Value = String> {
    "[a-z]{1,8}( [a-z]{1,8}){0,3}"
}

fn arb_line() -> impl Strategy<Value = Line> {
    prop_oneof![
        "[ \t]{0,3}".prop_map(Line::Blank),
        arb_words().prop_map(Line::Paragraph),
        (0u32..200, arb_words()).prop_map(|(n, text)| Line::Numbered(n, text)),
        (prop::sample::select(vec!['-', '*', '•']), arb_words())
            .prop_map(|(glyph, text)| Line::Bullet(glyph, text)),
    ]
}

/// Maximal runs of same-kind list lines or single paragraph lines
fn expected_block_count(lines: &[Line]) -> usize {
    let mut count = 0;
    let mut open: Option<ListKind> = None;
    for line in lines {
        match (line, line.list_kind()) {
            (Line::Blank(_), _) => open = None,
            (_, Some(kind)) => {
                if open != Some(kind) {
                    count += 1;
                    open = Some(kind);
                }
            }
            (_, None) => {
                count += 1;
                open = None;
            }
        }
    }
    count
}

fn contributions(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph { .. } => 1,
            Block::OrderedList { items } | Block::UnorderedList { items } => items.len(),
        })
        .sum()
}

proptest! {
    #[test]
    fn prop_plain_lines_become_paragraphs_in_order(
        lines in proptest::collection::vec(arb_words(), 0..10),
        blank_every in 1usize..4,
    ) {
        let mut text = String::new();
        for (i, line) in lines.iter().enumerate() {
            text.push_str(line);
            text.push('\n');
            if i % blank_every == 0 {
                text.push('\n');
            }
        }

        let expected: Vec<Block> = lines
            .iter()
            .map(|l| Block::Paragraph { text: l.clone() })
            .collect();
        prop_assert_eq!(parse_blocks(&text), expected);
    }

    #[test]
    fn prop_block_count_matches_runs(lines in proptest::collection::vec(arb_line(), 0..20)) {
        let text = lines.iter().map(Line::render).collect::<Vec<_>>().join("\n");
        let blocks = parse_blocks(&text);
        prop_assert_eq!(blocks.len(), expected_block_count(&lines));
    }

    #[test]
    fn prop_every_non_blank_line_lands_in_one_block(
        lines in proptest::collection::vec(arb_line(), 0..20)
    ) {
        let text = lines.iter().map(Line::render).collect::<Vec<_>>().join("\n");
        let non_blank = lines.iter().filter(|l| !matches!(l, Line::Blank(_))).count();
        prop_assert_eq!(contributions(&parse_blocks(&text)), non_blank);
    }

    #[test]
    fn prop_no_adjacent_lists_of_same_kind(lines in proptest::collection::vec(arb_line(), 0..20)) {
        let text = lines.iter().map(Line::render).collect::<Vec<_>>().join("\n");
        let blocks = parse_blocks(&text);
        let has_blank = lines.iter().any(|l| matches!(l, Line::Blank(_)));
        if !has_blank {
            for pair in blocks.windows(2) {
                let same = matches!(
                    (&pair[0], &pair[1]),
                    (Block::OrderedList { .. }, Block::OrderedList { .. })
                        | (Block::UnorderedList { .. }, Block::UnorderedList { .. })
                );
                prop_assert!(!same, "adjacent lists of the same kind: {:?}", blocks);
            }
        }
    }

    #[test]
    fn prop_format_is_total(text in ".{0,200}") {
        let first = format(text.as_str());
        prop_assert_eq!(first, format(text.as_str()));
        let _ = format_escaped(text.as_str());
    }

    #[test]
    fn prop_escaped_output_has_no_raw_angle_brackets_from_input(text in "[a-z<>& \n-]{0,80}") {
        let markup = format_escaped(text.as_str());
        let stripped = markup
            .replace("<p>", "")
            .replace("</p>", "")
            .replace("<ul>", "")
            .replace("</ul>", "")
            .replace("<li>", "")
            .replace("</li>", "");
        prop_assert!(!stripped.contains('<'));
        prop_assert!(!stripped.contains('>'));
    }
}
