use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn option_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([a-zа-яё0-9])\)\s*(.+)$").unwrap())
}

fn term_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.").unwrap())
}

fn definition_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-ZА-ЯЁ]\.").unwrap())
}

fn pair_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\s*[-–—]+\s*([A-Za-zА-Яа-яЁё])").unwrap())
}

/// Drop markup tags and unescape the few entities the rich-text editor
/// emits, leaving plain text for exports and presentation payloads.
pub fn strip_html(input: &str) -> String {
    let mut result = String::new();
    let mut inside_tag = false;

    for c in input.chars() {
        if c == '<' {
            inside_tag = true;
        } else if c == '>' {
            inside_tag = false;
        } else if !inside_tag {
            result.push(c);
        }
    }

    result
        .trim()
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .to_string()
}

/// Split a closed/multiclosed question body into the stem and its
/// lettered options (`a) ... b) ...`, one per line). Lines before the
/// first option belong to the stem.
pub fn parse_question_options(text: &str) -> (String, Vec<String>) {
    let mut stem = String::new();
    let mut options = Vec::new();
    let mut found_option = false;

    for line in text.lines() {
        if let Some(caps) = option_line_re().captures(line.trim()) {
            found_option = true;
            options.push(caps[2].trim().to_string());
        } else if !found_option {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                if !stem.is_empty() {
                    stem.push(' ');
                }
                stem.push_str(trimmed);
            }
        }
    }

    (stem, options)
}

/// Split a pairs question body into numbered terms (`1. ...`) and
/// lettered definitions (`A. ...`).
pub fn parse_matching_terms_defs(text: &str) -> (Vec<String>, Vec<String>) {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let terms = lines
        .iter()
        .filter(|l| term_line_re().is_match(l))
        .map(|l| l.to_string())
        .collect();
    let definitions = lines
        .iter()
        .filter(|l| definition_line_re().is_match(l))
        .map(|l| l.to_string())
        .collect();

    (terms, definitions)
}

/// Parse `N – L` pair lines (stored answers and typed-in submissions),
/// tolerating hyphen/en-dash/em-dash and surrounding whitespace.
pub fn parse_pair_lines(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            pair_line_re()
                .captures(line.trim())
                .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        })
        .collect()
}

/// Fold Cyrillic letters onto their Latin look-alikes so that a student
/// answering `1 – А` (Cyrillic) matches a stored `1 – A` (Latin).
pub fn normalize_letter(letter: &str) -> String {
    let upper: String = letter.to_uppercase();
    upper
        .chars()
        .map(|c| match c {
            'А' => 'A',
            'В' => 'B',
            'Е' => 'E',
            'К' => 'K',
            'М' => 'M',
            'Н' => 'H',
            'О' => 'O',
            'Р' => 'P',
            'С' => 'C',
            'Т' => 'T',
            'У' => 'Y',
            'Х' => 'X',
            other => other,
        })
        .collect()
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Token-count cosine similarity between two free-text answers, in
/// [0, 1]. Empty or non-overlapping token sets score 0.
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);

    let mut counts_a: HashMap<&str, f64> = HashMap::new();
    for t in &tokens_a {
        *counts_a.entry(t.as_str()).or_default() += 1.0;
    }
    let mut counts_b: HashMap<&str, f64> = HashMap::new();
    for t in &tokens_b {
        *counts_b.entry(t.as_str()).or_default() += 1.0;
    }

    let dot: f64 = counts_a
        .iter()
        .filter_map(|(token, va)| counts_b.get(token).map(|vb| va * vb))
        .sum();
    let norm_a: f64 = counts_a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b: f64 = counts_b.values().map(|v| v * v).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(
            strip_html("<p>What is <b>Rust</b>?&nbsp;&amp; why</p>"),
            "What is Rust? & why"
        );
    }

    #[test]
    fn splits_stem_and_options() {
        let text = "Which planet is closest to the sun?\na) Venus\nb) Mercury\nc) Mars";
        let (stem, options) = parse_question_options(text);
        assert_eq!(stem, "Which planet is closest to the sun?");
        assert_eq!(options, vec!["Venus", "Mercury", "Mars"]);
    }

    #[test]
    fn no_options_means_empty_list() {
        let (stem, options) = parse_question_options("Explain ownership in Rust.");
        assert_eq!(stem, "Explain ownership in Rust.");
        assert!(options.is_empty());
    }

    #[test]
    fn splits_terms_and_definitions() {
        let text = "1. TCP\n2. UDP\nA. Connection-oriented\nB. Connectionless";
        let (terms, defs) = parse_matching_terms_defs(text);
        assert_eq!(terms, vec!["1. TCP", "2. UDP"]);
        assert_eq!(defs, vec!["A. Connection-oriented", "B. Connectionless"]);
    }

    #[test]
    fn parses_pair_lines_with_dash_variants() {
        let pairs = parse_pair_lines("1 - A\n2 – B\n3 — C\nnot a pair");
        assert_eq!(
            pairs,
            vec![
                ("1".to_string(), "A".to_string()),
                ("2".to_string(), "B".to_string()),
                ("3".to_string(), "C".to_string()),
            ]
        );
    }

    #[test]
    fn cyrillic_letters_fold_to_latin() {
        assert_eq!(normalize_letter("А"), "A");
        assert_eq!(normalize_letter("с"), "C");
        assert_eq!(normalize_letter("B"), "B");
    }

    #[test]
    fn identical_texts_have_unit_similarity() {
        let sim = cosine_similarity("the quick brown fox", "the quick brown fox");
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_texts_have_zero_similarity() {
        assert_eq!(cosine_similarity("alpha beta", "gamma delta"), 0.0);
        assert_eq!(cosine_similarity("", "anything"), 0.0);
    }

    #[test]
    fn similarity_is_case_and_punctuation_blind() {
        let sim = cosine_similarity("Hello, World!", "hello world");
        assert!((sim - 1.0).abs() < 1e-9);
    }
}
