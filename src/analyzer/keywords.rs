//! Keyword extraction
//!
//! Candidate terms are katakana runs of three or more characters and
//! kanji-led runs of two to twelve kanji/hiragana characters. Particles,
//! generic verbs, greetings, and inflected forms are filtered out before
//! counting.

use crate::sentiment::SentimentScorer;
use crate::{rank_by, CountBucket, FeedbackRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Built-in stop words
pub const STOP_WORDS: &[&str] = &[
    // particles
    "の", "に", "は", "を", "が", "と", "で", "て", "た", "し", "も", "な", "い", "へ", "や", "か",
    "ね", "よ", "わ",
    // auxiliaries and endings
    "です", "ます", "ました", "でした", "ません", "ない", "なかった", "たい", "たかった", "だった",
    "である",
    // common verbs
    "する", "した", "して", "します", "される", "させる", "できる", "できた", "できない", "なる",
    "なった", "なって", "ある", "あった", "あり", "あります", "いる", "いた", "いて", "います",
    "おる", "くる", "きた", "きて", "いく", "いった", "やる", "やった", "やって", "もらう",
    "もらった", "くれる", "くれた", "あげる", "あげた", "みる", "みた", "みて", "おく", "おいた",
    "しまう", "しまった",
    // thinking and feeling verbs
    "思う", "思った", "思います", "思いました", "思って", "感じる", "感じた", "感じました",
    "考える", "考えた",
    // common adjectives
    "いい", "よい", "よかった", "ほしい", "ほしかった",
    // adverbs and conjunctions
    "こと", "もの", "ところ", "とき", "ため", "よう", "ほう", "かた", "など", "くらい", "ぐらい",
    "まだ", "もう", "まず", "また", "さらに", "そして", "しかし", "でも", "ただ", "けど", "けれど",
    "とても", "すごく", "かなり", "ちょっと", "少し", "もっと", "やはり", "やっぱり", "たぶん",
    "きっと",
    // demonstratives
    "この", "その", "あの", "どの", "これ", "それ", "あれ", "どれ", "ここ", "そこ", "あそこ",
    "どこ", "こう", "そう", "ああ", "どう", "こんな", "そんな", "あんな", "どんな",
    // people and general nouns
    "自分", "私", "わたし", "僕", "ぼく", "方", "人", "ひと", "皆", "みんな", "先生", "せんせい",
    "今日", "きょう", "今回", "毎回", "毎日", "最初", "最後", "次", "つぎ", "前", "まえ", "後",
    "あと",
    // overly generic words
    "本当", "ほんとう", "大変", "たいへん", "普通", "ふつう", "結構", "けっこう", "大丈夫",
    "だいじょうぶ", "一番", "いちばん", "特に", "とくに", "全然", "ぜんぜん", "全部", "ぜんぶ",
    "色々", "いろいろ",
    // honorifics
    "ございます", "いただき", "いただきました", "くださり", "くださいました", "おります",
    // other generic words
    "気持ち", "きもち", "部分", "ぶぶん", "感じ", "かんじ", "意味", "いみ", "理由", "りゆう",
    "内容", "ないよう", "説明", "せつめい", "質問", "しつもん", "回答", "かいとう", "レッスン",
    "れっすん", "動画", "どうが", "コース", "こーす",
    // greetings and set phrases
    "今年も", "今年もよろしく", "よろしくお願い", "お願いしま", "お願いします", "お願いいたしま",
    "明けまして", "おめでとう", "ありがとうございま", "ありがとうござい", "引き続き", "今後とも",
    "今後も", "継続して", "続けて", "配信ありがとう", "配信あり", "アップありがとう",
];

/// Inflected endings. A word ending in one of these, with at least one
/// character before the ending, is not a keyword.
pub const INFLECTED_ENDINGS: &[&str] = &[
    "ました", "ません", "ています", "ていた", "ている", "てない", "ていない",
    "られる", "られた", "られて", "させる", "させた", "させて",
    "しまう", "しまった", "しまって", "ておく", "ておいた",
    "できる", "できた", "できて", "できない", "できなかった",
    "なければ", "なきゃ", "ないと", "なくて", "なかった",
    "かった", "くない", "くなる", "くなった",
];

fn katakana_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\x{30A0}-\x{30FF}]{3,}").unwrap())
}

fn kanji_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[\x{4E00}-\x{9FAF}][\x{4E00}-\x{9FAF}\x{3040}-\x{309F}]{1,11}").unwrap()
    })
}

fn builtin_stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// All raw matches: katakana runs first, then kanji-led runs
fn raw_terms(text: &str) -> impl Iterator<Item = &str> {
    katakana_pattern()
        .find_iter(text)
        .chain(kanji_pattern().find_iter(text))
        .map(|m| m.as_str())
}

fn has_inflected_ending(word: &str) -> bool {
    let len = word.chars().count();
    INFLECTED_ENDINGS
        .iter()
        .any(|ending| word.ends_with(ending) && len > ending.chars().count())
}

fn is_two_hiragana(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(a), Some(b), None) if is_hiragana(a) && is_hiragana(b)
    )
}

fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Extract keyword candidates from one comment, in match order, with
/// duplicates kept (each occurrence counts).
pub fn candidate_terms(text: &str) -> Vec<String> {
    Vocabulary::default().terms(text)
}

/// Keyword extractor with optional extra stop words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    extra_stop_words: HashSet<String>,
    min_occurrences: usize,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            extra_stop_words: HashSet::new(),
            min_occurrences: crate::config::DEFAULT_MIN_KEYWORD_OCCURRENCES,
        }
    }
}

impl Vocabulary {
    pub fn new<S: AsRef<str>>(extra_stop_words: &[S], min_occurrences: usize) -> Self {
        Self {
            extra_stop_words: extra_stop_words
                .iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            min_occurrences: min_occurrences.max(1),
        }
    }

    pub fn min_occurrences(&self) -> usize {
        self.min_occurrences
    }

    fn is_stop_word(&self, word: &str) -> bool {
        builtin_stop_words().contains(word) || self.extra_stop_words.contains(word)
    }

    fn keeps(&self, word: &str) -> bool {
        !self.is_stop_word(word) && !has_inflected_ending(word) && !is_two_hiragana(word)
    }

    /// Keyword candidates of one comment
    pub fn terms(&self, text: &str) -> Vec<String> {
        raw_terms(text)
            .filter(|word| self.keeps(word))
            .map(str::to_string)
            .collect()
    }

    /// Occurrence counts over a record set, first-seen order
    pub fn count(&self, records: &[&FeedbackRecord]) -> Vec<CountBucket> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<CountBucket> = Vec::new();
        for record in records {
            for term in raw_terms(record.text()).filter(|w| self.keeps(w)) {
                match index.get(term) {
                    Some(&i) => counts[i].count += 1,
                    None => {
                        index.insert(term.to_string(), counts.len());
                        counts.push(CountBucket {
                            key: term.to_string(),
                            count: 1,
                        });
                    }
                }
            }
        }
        counts
    }

    /// Terms seen at least `min_occurrences` times, most frequent first
    pub fn frequent(&self, records: &[&FeedbackRecord]) -> Vec<CountBucket> {
        let mut counts: Vec<CountBucket> = self
            .count(records)
            .into_iter()
            .filter(|b| b.count >= self.min_occurrences)
            .collect();
        rank_by(&mut counts, |b| b.count);
        counts
    }
}

/// Number of records containing each negative term. Zero counts are
/// omitted; ties keep lexicon order.
pub fn negative_tally(records: &[&FeedbackRecord], scorer: &SentimentScorer) -> Vec<CountBucket> {
    let mut tally: Vec<CountBucket> = scorer
        .negative_terms()
        .iter()
        .map(|term| CountBucket {
            key: term.clone(),
            count: records
                .iter()
                .filter(|r| r.text().contains(term.as_str()))
                .count(),
        })
        .filter(|b| b.count > 0)
        .collect();
    rank_by(&mut tally, |b| b.count);
    tally
}

/// Display weight of a keyword relative to the most frequent one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordSize {
    Large,
    Medium,
    Small,
}

impl KeywordSize {
    pub fn for_ratio(count: usize, max: usize) -> Self {
        let ratio = count as f64 / max.max(1) as f64;
        if ratio > 0.7 {
            KeywordSize::Large
        } else if ratio > 0.4 {
            KeywordSize::Medium
        } else {
            KeywordSize::Small
        }
    }
}
