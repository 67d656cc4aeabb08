//! Terminal host: turns typed lines into wizard intents and renders prompts.

use crate::error::CliError;
use crate::wizard::inputs::parse_date;
use crate::wizard::{Affordance, Intent, Message, Speaker};

const BACK_WORDS: [&str; 3] = ["back", "b", "뒤로"];
const CONFIRM_WORDS: [&str; 4] = ["ok", "done", "확인", "완료"];

fn is_back(input: &str) -> bool {
    BACK_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

fn is_confirm(input: &str) -> bool {
    CONFIRM_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// Interpret one typed line against the control currently on screen.
///
/// Options may be picked by 1-based number or by their exact text.
pub fn parse_input(line: &str, affordance: &Affordance) -> Result<Vec<Intent>, CliError> {
    let input = line.trim();
    if input.is_empty() {
        return Ok(Vec::new());
    }
    if is_back(input) {
        return Ok(vec![Intent::Retreat]);
    }

    match affordance {
        Affordance::Hidden => Err(CliError::NoInput),
        Affordance::DateRange { .. } => parse_range(input),
        Affordance::DatePicker => Ok(vec![Intent::PickDate {
            date: input.to_string(),
        }]),
        Affordance::Choices { options, .. } => {
            let option = resolve_option(input, options)?;
            Ok(vec![Intent::Choose { option }])
        }
        Affordance::MultiChoices { options, .. } => {
            if is_confirm(input) {
                return Ok(vec![Intent::ConfirmSelection]);
            }
            input
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| resolve_option(s, options).map(|option| Intent::Toggle { option }))
                .collect()
        }
        Affordance::Slider { .. } => {
            if is_confirm(input) {
                return Ok(vec![Intent::ConfirmRatio]);
            }
            let value = input
                .trim_end_matches('%')
                .parse::<i64>()
                .map_err(|_| CliError::Unrecognized(input.to_string()))?;
            Ok(vec![Intent::SetRatio { value }])
        }
    }
}

/// `ok`, `start DATE`, `end DATE`, or `DATE DATE` (start, end, then confirm).
fn parse_range(input: &str) -> Result<Vec<Intent>, CliError> {
    if is_confirm(input) {
        return Ok(vec![Intent::ConfirmDuration]);
    }
    let unrecognized = || CliError::Unrecognized(input.to_string());
    let words: Vec<&str> = input.split_whitespace().collect();
    match words.as_slice() {
        ["start", date] => Ok(vec![Intent::SetRangeStart {
            date: parse_date(date).map_err(|_| unrecognized())?,
        }]),
        ["end", date] => Ok(vec![Intent::SetRangeEnd {
            date: parse_date(date).map_err(|_| unrecognized())?,
        }]),
        [start, end] => Ok(vec![
            Intent::SetRangeStart {
                date: parse_date(start).map_err(|_| unrecognized())?,
            },
            Intent::SetRangeEnd {
                date: parse_date(end).map_err(|_| unrecognized())?,
            },
            Intent::ConfirmDuration,
        ]),
        _ => Err(unrecognized()),
    }
}

fn resolve_option(input: &str, options: &[String]) -> Result<String, CliError> {
    if let Ok(index) = input.parse::<usize>() {
        return options
            .get(index.wrapping_sub(1))
            .cloned()
            .ok_or(CliError::ChoiceOutOfRange {
                index,
                max: options.len(),
            });
    }
    options
        .iter()
        .find(|o| o.as_str() == input)
        .cloned()
        .ok_or_else(|| CliError::Unrecognized(input.to_string()))
}

pub fn render_message(message: &Message) -> String {
    match message.speaker {
        Speaker::Assistant => format!("Tpin › {}", message.text),
        Speaker::User => format!("    나 › {}", message.text),
    }
}

/// Help text for the control currently on screen.
pub fn render_affordance(affordance: &Affordance, can_go_back: bool) -> String {
    let mut lines = Vec::new();
    match affordance {
        Affordance::Hidden => return String::new(),
        Affordance::DateRange {
            start,
            end,
            nights,
            can_confirm,
            hint,
        } => {
            let show = |d: &Option<chrono::NaiveDate>| {
                d.map(|d| d.to_string()).unwrap_or_else(|| "----------".to_string())
            };
            lines.push(format!("  [{} ~ {}] {}", show(start), show(end), hint));
            if let Some(nights) = nights {
                lines.push(format!("  {nights}박 선택됨{}", if *can_confirm { "" } else { " (불가)" }));
            }
            lines.push("  `YYYY-MM-DD YYYY-MM-DD`, `start DATE`, `end DATE`, or `ok`".to_string());
        }
        Affordance::DatePicker => lines.push("  날짜 입력 (YYYY-MM-DD)".to_string()),
        Affordance::Choices { options, selected } => {
            for (i, option) in options.iter().enumerate() {
                let mark = if selected.as_deref() == Some(option.as_str()) { "*" } else { " " };
                lines.push(format!("  {mark}{}. {option}", i + 1));
            }
        }
        Affordance::MultiChoices { options, selected } => {
            for (i, option) in options.iter().enumerate() {
                let mark = if selected.contains(option) { "x" } else { " " };
                lines.push(format!("  [{mark}] {}. {option}", i + 1));
            }
            lines.push("  번호로 선택/해제, `ok`로 선택 완료".to_string());
        }
        Affordance::Slider { value, label } => {
            lines.push(format!("  현지인 {label} 관광객  (현재 {value})"));
            lines.push("  0-100 (10 단위) 입력, `ok`로 확인".to_string());
        }
    }
    if can_go_back {
        lines.push("  `back`: 뒤로가기".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn choices() -> Affordance {
        Affordance::Choices {
            options: vec!["FLEX".into(), "BASIC".into(), "가성비".into()],
            selected: None,
        }
    }

    fn multi() -> Affordance {
        Affordance::MultiChoices {
            options: vec!["힐링".into(), "먹방".into(), "호캉스".into()],
            selected: vec![],
        }
    }

    fn range() -> Affordance {
        Affordance::DateRange {
            start: None,
            end: None,
            nights: None,
            can_confirm: false,
            hint: "최대 연박 : 4박 5일".into(),
        }
    }

    #[test]
    fn back_works_everywhere_but_hidden_rejects_answers() {
        assert_eq!(parse_input("back", &choices()), Ok(vec![Intent::Retreat]));
        assert_eq!(parse_input("뒤로", &Affordance::Hidden), Ok(vec![Intent::Retreat]));
        assert_eq!(parse_input("1", &Affordance::Hidden), Err(CliError::NoInput));
        assert_eq!(parse_input("   ", &choices()), Ok(vec![]));
    }

    #[test]
    fn choice_by_number_or_text() {
        assert_eq!(
            parse_input("2", &choices()),
            Ok(vec![Intent::Choose { option: "BASIC".into() }])
        );
        assert_eq!(
            parse_input("가성비", &choices()),
            Ok(vec![Intent::Choose { option: "가성비".into() }])
        );
        assert_eq!(
            parse_input("0", &choices()),
            Err(CliError::ChoiceOutOfRange { index: 0, max: 3 })
        );
        assert_eq!(
            parse_input("4", &choices()),
            Err(CliError::ChoiceOutOfRange { index: 4, max: 3 })
        );
        assert!(matches!(parse_input("LUXURY", &choices()), Err(CliError::Unrecognized(_))));
    }

    #[test]
    fn multi_toggles_and_confirms() {
        assert_eq!(
            parse_input("1, 2", &multi()),
            Ok(vec![
                Intent::Toggle { option: "힐링".into() },
                Intent::Toggle { option: "먹방".into() },
            ])
        );
        assert_eq!(parse_input("OK", &multi()), Ok(vec![Intent::ConfirmSelection]));
    }

    #[test]
    fn range_forms() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(
            parse_input("2025-06-01 2025-06-03", &range()),
            Ok(vec![
                Intent::SetRangeStart { date: d("2025-06-01") },
                Intent::SetRangeEnd { date: d("2025-06-03") },
                Intent::ConfirmDuration,
            ])
        );
        assert_eq!(
            parse_input("end 2025-06-03", &range()),
            Ok(vec![Intent::SetRangeEnd { date: d("2025-06-03") }])
        );
        assert_eq!(parse_input("확인", &range()), Ok(vec![Intent::ConfirmDuration]));
        assert!(parse_input("next week", &range()).is_err());
    }

    #[test]
    fn slider_and_date() {
        let slider = Affordance::Slider {
            value: 50,
            label: "50% : 50%".into(),
        };
        assert_eq!(parse_input("30%", &slider), Ok(vec![Intent::SetRatio { value: 30 }]));
        assert_eq!(parse_input("ok", &slider), Ok(vec![Intent::ConfirmRatio]));
        assert_eq!(
            parse_input("2025-07-01", &Affordance::DatePicker),
            Ok(vec![Intent::PickDate {
                date: "2025-07-01".into()
            }])
        );
    }

    #[test]
    fn rendering() {
        assert_eq!(render_message(&Message::assistant("안녕")), "Tpin › 안녕");
        let text = render_affordance(&choices(), true);
        assert!(text.contains(" 2. BASIC"));
        assert!(text.contains("back"));
        assert!(!render_affordance(&choices(), false).contains("back"));
        assert_eq!(render_affordance(&Affordance::Hidden, true), "");
    }
}
