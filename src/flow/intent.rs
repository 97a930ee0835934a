//! Appointment-intent scoring over user and assistant text.
//!
//! Keyword matching runs on case-folded, diacritic-stripped text so that
//! ASCII-typed input ("randevu alir miyim", "hayir") matches the Turkish
//! forms. Scoring follows a simple additive scheme: the flow is entered only
//! on a strong signal, while weaker signals still count as intent for
//! logging.

/// Utterance phrases that ask for an appointment (folded forms).
const APPOINTMENT_PHRASES: &[&str] = &[
    "randevu istiyorum",
    "randevu almak",
    "randevu alabilir",
    "randevu alir",
    "randevu ayarla",
    "randevu olustur",
    "muayene olmak",
];

/// Markers in the assistant's answer that carry a department recommendation,
/// most specific first. The department name follows the marker.
const DEPARTMENT_MARKERS: &[&str] = &["basvuru birimi:", "birimi:", "bolum:", "bolumu:"];

/// Whole-word urgency signals. Matched against words, not substrings, so the
/// answer template's "Aciliyet" line does not read as urgent.
const URGENCY_WORDS: &[&str] = &["acil", "acilen", "derhal"];

const AFFIRMATIVE_WORDS: &[&str] = &[
    "evet",
    "tamam",
    "olur",
    "onayla",
    "onayliyorum",
    "kabul",
    "uygun",
];

const NEGATIVE_WORDS: &[&str] = &["hayir", "iptal", "vazgec", "istemiyorum", "istemem"];

const CHANGE_WORDS: &[&str] = &["farkli", "degistir", "baska"];

/// Characters that end a department name inside an answer line.
const DEPARTMENT_TERMINATORS: &[char] = &['\n', '(', '[', '.', ',', '!', '?', ';'];

/// Lowercases and strips Turkish diacritics: "Başvuru BİRİMİ" folds to
/// "basvuru birimi". The combining dot above left behind by lowercasing
/// 'İ' is dropped as well.
pub fn turkish_fold(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        match ch {
            'ç' => folded.push('c'),
            'ğ' => folded.push('g'),
            'ı' => folded.push('i'),
            'ö' => folded.push('o'),
            'ş' => folded.push('s'),
            'ü' => folded.push('u'),
            '\u{0307}' => {}
            other => folded.push(other),
        }
    }
    folded
}

fn has_appointment_phrase(folded: &str) -> bool {
    APPOINTMENT_PHRASES.iter().any(|p| folded.contains(p))
}

fn has_department_marker(folded: &str) -> bool {
    DEPARTMENT_MARKERS.iter().any(|m| folded.contains(m))
}

fn has_urgency_word(folded: &str) -> bool {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| URGENCY_WORDS.contains(&word) || word.starts_with("ambulans"))
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let folded = turkish_fold(text);
    keywords.iter().any(|k| folded.contains(k))
}

/// Does the utterance accept the current proposal ("evet", "tamam", ...)?
pub fn is_affirmative(utterance: &str) -> bool {
    contains_any(utterance, AFFIRMATIVE_WORDS)
}

/// Does the utterance decline or cancel ("hayır", "iptal", ...)?
pub fn is_negative(utterance: &str) -> bool {
    contains_any(utterance, NEGATIVE_WORDS)
}

/// Does the utterance ask for a different option ("farklı", "başka", ...)?
pub fn wants_change(utterance: &str) -> bool {
    contains_any(utterance, CHANGE_WORDS)
}

/// Additive intent score for one conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentScore {
    pub score: i32,
    pub urgent: bool,
}

impl IntentScore {
    /// Weak signal, enough to log interest.
    pub fn has_intent(&self) -> bool {
        self.score >= 2
    }

    /// Strong signal, enough to enter the appointment flow.
    pub fn should_start(&self) -> bool {
        self.score >= 3 || self.urgent
    }
}

/// Decides whether a turn carries appointment intent and pulls the suggested
/// department out of the assistant's answer.
pub trait IntentClassifier {
    fn classify(&self, utterance: &str, answer: &str) -> IntentScore;

    /// Extracted department name, folded lowercase ("kardiyoloji").
    fn extract_department(&self, answer: &str) -> Option<String>;
}

/// Keyword-based classifier, the default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntent;

impl IntentClassifier for KeywordIntent {
    fn classify(&self, utterance: &str, answer: &str) -> IntentScore {
        let utterance = turkish_fold(utterance);
        let answer = turkish_fold(answer);

        let mut score = 0;
        if has_appointment_phrase(&utterance) {
            score += 3;
        }
        if has_department_marker(&answer) {
            score += 2;
        }
        let urgent = has_urgency_word(&utterance) || has_urgency_word(&answer);
        if urgent {
            score += 2;
        }
        IntentScore { score, urgent }
    }

    fn extract_department(&self, answer: &str) -> Option<String> {
        let folded = turkish_fold(answer);
        for marker in DEPARTMENT_MARKERS {
            let Some(pos) = folded.find(marker) else {
                continue;
            };
            let tail = &folded[pos + marker.len()..];
            let cut = tail
                .find(DEPARTMENT_TERMINATORS)
                .map_or(tail, |end| &tail[..end]);
            let name = cut.trim_matches(|c: char| c.is_whitespace() || "*-:".contains(c));
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
        None
    }
}
