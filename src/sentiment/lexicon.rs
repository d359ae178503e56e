//! Static sentiment keyword lists.
//!
//! `改善` is listed as both a positive and a negative marker, so a comment
//! mentioning it nets zero for that word.

/// Terms that mark a comment as positive
pub const POSITIVE: &[&str] = &[
    "ありがとう", "良かった", "よかった", "素晴らしい", "すばらしい", "最高",
    "楽しい", "たのしい", "嬉しい", "うれしい", "感動", "感謝",
    "わかりやすい", "分かりやすい", "理解できた", "勉強になった", "参考になった",
    "できた", "出来た", "できるようになった", "成長", "上達",
    "丁寧", "ていねい", "親切", "優しい", "やさしい",
    "面白い", "おもしろい", "興味深い", "新しい発見", "気づき",
    "効果", "実感", "変化", "改善", "スッキリ", "すっきり",
];

/// Terms that mark a comment as negative (improvement requests)
pub const NEGATIVE: &[&str] = &[
    "難しい", "むずかしい", "わからない", "分からない", "理解できない",
    "苦手", "困った", "大変", "できない", "出来ない",
    "遅い", "速い", "早い", "ついていけない",
    "不安", "心配", "残念", "期待はずれ",
    "改善", "要望", "もっと", "してほしい", "してほしかった",
    "動かない", "動けない", "思うように", "うまくいかない", "うまくできない",
    "上手くいかない", "上手くできない", "違う", "合わない", "足りない",
    "痛い", "いたい", "つらい", "辛い", "きつい", "しんどい",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement_is_in_both_lists() {
        assert!(POSITIVE.contains(&"改善"));
        assert!(NEGATIVE.contains(&"改善"));
    }

    #[test]
    fn test_lists_have_no_blank_terms() {
        assert!(POSITIVE.iter().chain(NEGATIVE).all(|t| !t.trim().is_empty()));
    }
}
