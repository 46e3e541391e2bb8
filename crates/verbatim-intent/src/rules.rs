//! Deterministic intent rules.
//!
//! The rules run in a fixed priority order over the normalized transcript.
//! Earlier rules win; the probabilistic fallback only sees utterances no
//! rule claimed. All name capture for enrollment goes through the single
//! "my name is ..." extractor; "I am ..." and "This is ..." are reserved
//! for session switching.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::normalize;
use crate::presets::{clamp_rate, clamp_volume, rate_preset, volume_preset, RATE_STEP, VOLUME_STEP};

/// A resolved system command. Preference values arrive already clamped and
/// preset-resolved; the dispatcher only applies them.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Greeting or acknowledgement; answer briefly, touch nothing.
    Smalltalk,
    /// Clear the active session's context.
    Reset,
    /// Out-of-domain "find/get/search me a ..." request.
    OutOfScope,
    /// Name supplied while enrollment is pending; `None` means the
    /// utterance did not contain "my name is ...".
    ProvideName(Option<String>),
    /// Clear context and drop back to the default session.
    Logout,
    ListVoices,
    TestVoice,
    SetVoice(String),
    /// `label` is present when the rate came from a named preset.
    SetRate { rate: u32, label: Option<String> },
    /// Signed delta in words per minute.
    AdjustRate(i32),
    /// `label` is present when the volume came from a named preset.
    SetVolume { volume: f32, label: Option<String> },
    /// Signed delta in volume units.
    AdjustVolume(f32),
    /// "register me as <name>".
    RegisterAs(String),
    /// Bare "register"; arms pending enrollment (or re-enrolls a recently
    /// recognized speaker).
    Register,
    /// Start over with a fresh quote.
    NewQuote,
}

static SMALLTALK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:hi|hello|hey|yo|thanks|thank you|ok|okay)!?$").expect("valid regex")
});
static RESET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:reset|clear\s*(?:context|it|this)?|start\s*over|new\s*session)$")
        .expect("valid regex")
});
static SCOPE_GUARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:find|get|search)\s+me\s+(?:a|the)\s+(?P<rest>.+)$").expect("valid regex")
});
/// Words that mark an utterance as quote-domain even when it looks like a
/// generic "find me a ..." request.
static QUOTEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:quote|finish|complete|who\s+said|who\s+wrote|about\s+whom|source|citation|disputed|misattributed|when)\b")
        .expect("valid regex")
});
static LOGOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:logout|log\s*out|sign\s*out|bye|good\s*bye|goodnight|see\s*you)\b")
        .expect("valid regex")
});
static LIST_VOICES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:list|show)\s+voices$").expect("valid regex"));
static TEST_VOICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:test(?:\s+my\s+voice)?|what(?:'s|\s+is)\s+my\s+voice)$").expect("valid regex")
});
static SET_VOICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^set\s+my\s+(?:voice|audio|speaker)\s+to\s+(?P<voice>.+)$").expect("valid regex")
});
static SET_RATE_NUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^set\s+my\s+(?:speaking\s+)?(?:rate|speed|pace|tempo)\s+to\s+(?P<num>\d{2,3})$")
        .expect("valid regex")
});
static SET_RATE_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:set|make)\s+my\s+(?:speaking\s+)?(?:rate|speed|pace|tempo)\s+to\s+(?P<word>very\s+slow|slow|medium|fast|very\s+fast|low|high)$",
    )
    .expect("valid regex")
});
static ADJUST_RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:make|speak)\s+(?P<dir>faster|slower)$").expect("valid regex")
});
static SET_VOLUME_NUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^set\s+my\s+volume\s+to\s+(?P<num>0(?:\.\d+)?|1(?:\.0+)?)$").expect("valid regex")
});
static SET_VOLUME_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:set|make)\s+my\s+volume\s+to\s+(?P<word>mute|low|medium|normal|high|max|maximum)$")
        .expect("valid regex")
});
static ADJUST_VOLUME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:make|turn)\s+(?:it\s+)?(?P<dir>louder|quieter|softer)$").expect("valid regex")
});
static REGISTER_AS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:register|enroll)\s+me\s+as\s+(?P<name>[\w .'-]{2,})$").expect("valid regex")
});
static REGISTER_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:register|enroll)(?:\s+me)?(?:\s+please)?$").expect("valid regex")
});
static NEW_QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:new|another|different)\s+quote\b|\bfind\s+me\s+(?:a|another)\s+quote\b")
        .expect("valid regex")
});

static MY_NAME_IS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmy\s+name\s+is\s+(?P<tail>.+)").expect("valid regex"));
static NAME_TAIL_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[,:;.!?]|\s(?:and|but|please|register|enroll|set)\b").expect("valid regex")
});
static NAME_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z'\-]*").expect("valid regex"));

/// Extract an enrollment name. Accepts ONLY "my name is <Name>" (anywhere
/// in the utterance); "I am ..." and "This is ..." are too ambiguous in
/// ordinary questions. At most four name tokens, 2 to 40 characters.
pub fn extract_name(raw: &str) -> Option<String> {
    let tail = MY_NAME_IS_RE.captures(raw)?["tail"].to_string();
    let head = match NAME_TAIL_SPLIT_RE.find(&tail) {
        Some(m) => &tail[..m.start()],
        None => tail.as_str(),
    };
    let name = NAME_TOKEN_RE
        .find_iter(head)
        .take(4)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    (2..=40).contains(&name.len()).then_some(name)
}

/// One deterministic rule: a name (for tests and logs) and a matcher over
/// the normalized transcript.
pub struct IntentRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<Command>,
}

fn rule_smalltalk(t: &str) -> Option<Command> {
    SMALLTALK_RE.is_match(t).then_some(Command::Smalltalk)
}

fn rule_reset(t: &str) -> Option<Command> {
    RESET_RE.is_match(t).then_some(Command::Reset)
}

fn rule_scope_guard(t: &str) -> Option<Command> {
    let c = SCOPE_GUARD_RE.captures(t)?;
    if QUOTEY_RE.is_match(t) || c["rest"].starts_with("quote") {
        return None;
    }
    Some(Command::OutOfScope)
}

fn rule_logout(t: &str) -> Option<Command> {
    LOGOUT_RE.is_match(t).then_some(Command::Logout)
}

fn rule_list_voices(t: &str) -> Option<Command> {
    LIST_VOICES_RE.is_match(t).then_some(Command::ListVoices)
}

fn rule_test_voice(t: &str) -> Option<Command> {
    TEST_VOICE_RE.is_match(t).then_some(Command::TestVoice)
}

fn rule_set_voice(t: &str) -> Option<Command> {
    let c = SET_VOICE_RE.captures(t)?;
    Some(Command::SetVoice(c["voice"].trim().to_string()))
}

fn rule_set_rate_num(t: &str) -> Option<Command> {
    let c = SET_RATE_NUM_RE.captures(t)?;
    let num: i64 = c["num"].parse().ok()?;
    Some(Command::SetRate {
        rate: clamp_rate(num),
        label: None,
    })
}

fn rule_set_rate_word(t: &str) -> Option<Command> {
    let c = SET_RATE_WORD_RE.captures(t)?;
    let (rate, label) = rate_preset(&c["word"])?;
    Some(Command::SetRate {
        rate,
        label: Some(label.to_string()),
    })
}

fn rule_adjust_rate(t: &str) -> Option<Command> {
    let c = ADJUST_RATE_RE.captures(t)?;
    let delta = if &c["dir"] == "faster" { RATE_STEP } else { -RATE_STEP };
    Some(Command::AdjustRate(delta))
}

fn rule_set_volume_num(t: &str) -> Option<Command> {
    let c = SET_VOLUME_NUM_RE.captures(t)?;
    let num: f32 = c["num"].parse().ok()?;
    Some(Command::SetVolume {
        volume: clamp_volume(num),
        label: None,
    })
}

fn rule_set_volume_word(t: &str) -> Option<Command> {
    let c = SET_VOLUME_WORD_RE.captures(t)?;
    let word = c["word"].to_string();
    Some(Command::SetVolume {
        volume: volume_preset(&word)?,
        label: Some(word),
    })
}

fn rule_adjust_volume(t: &str) -> Option<Command> {
    let c = ADJUST_VOLUME_RE.captures(t)?;
    let delta = if &c["dir"] == "louder" { VOLUME_STEP } else { -VOLUME_STEP };
    Some(Command::AdjustVolume(delta))
}

fn rule_register_as(t: &str) -> Option<Command> {
    let c = REGISTER_AS_RE.captures(t)?;
    Some(Command::RegisterAs(c["name"].trim().to_string()))
}

fn rule_register(t: &str) -> Option<Command> {
    (REGISTER_ONLY_RE.is_match(t) || (t.contains("register") && t.len() <= 30))
        .then_some(Command::Register)
}

fn rule_new_quote(t: &str) -> Option<Command> {
    NEW_QUOTE_RE.is_match(t).then_some(Command::NewQuote)
}

/// Rules that outrank even pending name capture.
pub static PRIORITY_RULES: &[IntentRule] = &[
    IntentRule { name: "smalltalk", apply: rule_smalltalk },
    IntentRule { name: "reset", apply: rule_reset },
    IntentRule { name: "scope_guard", apply: rule_scope_guard },
];

/// Ordered rule table; earlier entries win.
pub static COMMAND_RULES: &[IntentRule] = &[
    IntentRule { name: "logout", apply: rule_logout },
    IntentRule { name: "list_voices", apply: rule_list_voices },
    IntentRule { name: "test_voice", apply: rule_test_voice },
    IntentRule { name: "set_voice", apply: rule_set_voice },
    IntentRule { name: "set_rate_num", apply: rule_set_rate_num },
    IntentRule { name: "set_rate_word", apply: rule_set_rate_word },
    IntentRule { name: "adjust_rate", apply: rule_adjust_rate },
    IntentRule { name: "set_volume_num", apply: rule_set_volume_num },
    IntentRule { name: "set_volume_word", apply: rule_set_volume_word },
    IntentRule { name: "adjust_volume", apply: rule_adjust_volume },
    IntentRule { name: "register_as", apply: rule_register_as },
    IntentRule { name: "register", apply: rule_register },
    IntentRule { name: "new_quote", apply: rule_new_quote },
];

/// Match the transcript against the deterministic rules, in priority order.
///
/// `pending_enroll` routes everything that is not smalltalk, reset, or the
/// scope guard into name capture until a name arrives.
pub fn classify(raw: &str, pending_enroll: bool) -> Option<Command> {
    let t = normalize(raw);
    if t.is_empty() {
        return None;
    }

    if let Some(cmd) = PRIORITY_RULES.iter().find_map(|r| (r.apply)(&t)) {
        return Some(cmd);
    }
    if pending_enroll {
        return Some(Command::ProvideName(extract_name(raw)));
    }
    COMMAND_RULES.iter().find_map(|r| (r.apply)(&t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_plain(raw: &str) -> Option<Command> {
        classify(raw, false)
    }

    #[test]
    fn test_smalltalk_and_reset() {
        assert_eq!(classify_plain("Hello!"), Some(Command::Smalltalk));
        assert_eq!(classify_plain("thanks"), Some(Command::Smalltalk));
        assert_eq!(classify_plain("Reset."), Some(Command::Reset));
        assert_eq!(classify_plain("start over"), Some(Command::Reset));
        assert_eq!(classify_plain("clear context"), Some(Command::Reset));
    }

    #[test]
    fn test_scope_guard_blocks_non_quote_requests() {
        assert_eq!(classify_plain("find me a pizza place"), Some(Command::OutOfScope));
        assert_eq!(classify_plain("get me the weather"), Some(Command::OutOfScope));
        // Quote-domain requests pass through to retrieval.
        assert_eq!(classify_plain("find me a quote about time"), Some(Command::NewQuote));
        assert_eq!(classify_plain("find me the quote two things are infinite"), None);
    }

    #[test]
    fn test_voice_commands() {
        assert_eq!(classify_plain("list voices"), Some(Command::ListVoices));
        assert_eq!(classify_plain("show voices"), Some(Command::ListVoices));
        assert_eq!(classify_plain("test my voice"), Some(Command::TestVoice));
        assert_eq!(classify_plain("what's my voice?"), Some(Command::TestVoice));
        assert_eq!(
            classify_plain("set my voice to Zira"),
            Some(Command::SetVoice("zira".to_string()))
        );
    }

    #[test]
    fn test_rate_commands() {
        assert_eq!(
            classify_plain("set my rate to 210"),
            Some(Command::SetRate { rate: 210, label: None })
        );
        // Numeric rates clamp into the supported band.
        assert_eq!(
            classify_plain("set my speed to 999"),
            Some(Command::SetRate { rate: 260, label: None })
        );
        assert_eq!(
            classify_plain("set my pace to very fast"),
            Some(Command::SetRate { rate: 240, label: Some("very fast".to_string()) })
        );
        assert_eq!(
            classify_plain("make my tempo to high"),
            Some(Command::SetRate { rate: 210, label: Some("fast".to_string()) })
        );
        assert_eq!(classify_plain("speak faster"), Some(Command::AdjustRate(15)));
        assert_eq!(classify_plain("make slower"), Some(Command::AdjustRate(-15)));
    }

    #[test]
    fn test_volume_commands() {
        assert_eq!(
            classify_plain("set my volume to 0.6"),
            Some(Command::SetVolume { volume: 0.6, label: None })
        );
        assert_eq!(
            classify_plain("set my volume to mute"),
            Some(Command::SetVolume { volume: 0.0, label: Some("mute".to_string()) })
        );
        assert_eq!(
            classify_plain("make it louder"),
            Some(Command::AdjustVolume(0.10))
        );
        assert_eq!(
            classify_plain("turn it quieter"),
            Some(Command::AdjustVolume(-0.10))
        );
    }

    #[test]
    fn test_registration_commands() {
        assert_eq!(
            classify_plain("register me as John Smith"),
            Some(Command::RegisterAs("john smith".to_string()))
        );
        assert_eq!(classify_plain("register"), Some(Command::Register));
        assert_eq!(classify_plain("enroll me please"), Some(Command::Register));
        assert_eq!(classify_plain("please register me"), Some(Command::Register));
    }

    #[test]
    fn test_logout_and_new_quote() {
        assert_eq!(classify_plain("bye"), Some(Command::Logout));
        assert_eq!(classify_plain("log out"), Some(Command::Logout));
        assert_eq!(classify_plain("another quote"), Some(Command::NewQuote));
        assert_eq!(classify_plain("find me another quote"), Some(Command::NewQuote));
    }

    #[test]
    fn test_queries_fall_through() {
        assert_eq!(classify_plain("who said two things are infinite"), None);
        assert_eq!(classify_plain("finish the quote imagination is more"), None);
    }

    #[test]
    fn test_pending_enroll_captures_name() {
        assert_eq!(
            classify("My name is Jane Doe", true),
            Some(Command::ProvideName(Some("Jane Doe".to_string())))
        );
        // Anything else while pending re-prompts for the name.
        assert_eq!(
            classify("who said this quote", true),
            Some(Command::ProvideName(None))
        );
        // Smalltalk and reset still take priority over name capture.
        assert_eq!(classify("thanks", true), Some(Command::Smalltalk));
        assert_eq!(classify("reset", true), Some(Command::Reset));
    }

    #[test]
    fn test_rules_are_individually_addressable() {
        let rule = COMMAND_RULES
            .iter()
            .find(|r| r.name == "set_rate_num")
            .unwrap();
        assert_eq!(
            (rule.apply)("set my rate to 150"),
            Some(Command::SetRate { rate: 150, label: None })
        );
        assert_eq!((rule.apply)("set my rate to fast"), None);
    }

    #[test]
    fn test_extract_name_rules() {
        assert_eq!(extract_name("my name is Ada Lovelace"), Some("Ada Lovelace".to_string()));
        assert_eq!(
            extract_name("Hi, my name is John and I want a quote"),
            Some("John".to_string())
        );
        assert_eq!(
            extract_name("my name is Mary Jane Watson Parker Smith"),
            Some("Mary Jane Watson Parker".to_string())
        );
        // "I am"/"This is" never register a name.
        assert_eq!(extract_name("I am John"), None);
        assert_eq!(extract_name("This is John"), None);
        assert_eq!(extract_name("my name is"), None);
    }
}
