//! Plain-text result report, shared by stdout and the webhook payload.

use crate::domain::condition::{Recipe, ScreenCriteria};
use crate::domain::instrument::Match;
use chrono::NaiveDateTime;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const NO_MATCHES: &str = "❌ 조건에 맞는 종목이 없습니다.";

/// Rounds to an integer and groups digits by thousands: `1234567.4` -> `1,234,567`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Static description of the filters behind a run.
pub fn filter_description(recipe: Recipe, criteria: &ScreenCriteria) -> String {
    let threshold = format_thousands(criteria.volume_threshold);
    let recipe_line = match recipe {
        Recipe::StrictBelowCloud => "현재 주가가 일목균형표 음구름(파랑) 아래".to_string(),
        Recipe::RsiOversold => format!(
            "RSI({}) {} 이하",
            criteria.rsi_period, criteria.rsi_threshold
        ),
        Recipe::CloudPenetration => format!(
            "현재 주가가 구름대 안 또는 하단의 {:.0}% 이상, 전환선 > 기준선",
            criteria.cloud_tolerance * 100.0
        ),
    };

    format!(
        "📊 [필터링 조건: {}]\n\
         - {}일 평균 거래량 < {}, {}일 내 {} 이상 1회\n\
         - 최근 {}일 내 {}일선이 {}일선 돌파\n\
         - {}\n",
        recipe,
        criteria.volume_lookback,
        threshold,
        criteria.volume_lookback,
        threshold,
        criteria.cross_window,
        criteria.ma_short,
        criteria.ma_long,
        recipe_line,
    )
}

pub fn render_report(
    matches: &[Match],
    recipe: Recipe,
    criteria: &ScreenCriteria,
    timestamp: NaiveDateTime,
    tz_label: &str,
) -> String {
    let mut message = filter_description(recipe, criteria);
    message.push('\n');

    if matches.is_empty() {
        message.push_str(NO_MATCHES);
    } else {
        let mut sorted: Vec<&Match> = matches.iter().collect();
        sorted.sort_by(|a, b| {
            a.instrument
                .name
                .cmp(&b.instrument.name)
                .then_with(|| a.instrument.code.cmp(&b.instrument.code))
        });

        message.push_str(&format!("✅ **조건 만족 종목 ({}개)**\n\n", matches.len()));
        let lines: Vec<String> = sorted
            .iter()
            .map(|m| {
                format!(
                    "• {} ({}) - {}원",
                    m.instrument.name,
                    m.instrument.code,
                    format_thousands(m.close)
                )
            })
            .collect();
        message.push_str(&lines.join("\n"));
    }

    message.push_str(&format!(
        "\n\n⏰ **실행 시간**: {} ({})",
        timestamp.format(TIMESTAMP_FORMAT),
        tz_label
    ));
    message
}
