//! Plain-text rendering of the board for the terminal.

use chrono::Datelike;
use visitboard_chat::{format_time, ChatMessage, ChatTopic};
use visitboard_core::WeekView;
use visitboard_schedule::{
    Advertisement, AppNotice, CareEvent, Cell, EventStatus, NoticeType, DAY_NAMES,
};

const COL: usize = 16;

/// Pad or cut `text` to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

pub fn week(view: &WeekView) -> String {
    let grid = view.grid();
    let mut out = format!("{}  ({})\n", view.week.label(), view.settings.coordinator_name);

    out.push_str(&fit("", COL));
    for date in view.week.dates() {
        let day = DAY_NAMES[date.weekday().num_days_from_sunday() as usize];
        out.push_str(&fit(&format!("{} {}.{}", day, date.day(), date.month()), COL));
    }
    out.push('\n');

    for row in &grid.rows {
        let slot = row.slot;
        out.push_str(&fit(
            &format!("{} {}-{}", slot.label, slot.start_time, slot.end_time),
            COL,
        ));
        for (_, cell) in &row.cells {
            let text = match cell {
                Cell::Open => "פנוי".to_string(),
                Cell::Occupied(event) => {
                    let mark = match event.status {
                        EventStatus::Confirmed => "✓ ",
                        EventStatus::Pending => "",
                    };
                    format!("{}{}", mark, view.summary(event).name)
                }
                Cell::SaturdayNotice { .. } => view.settings.saturday_message.clone(),
                Cell::FridayNotice { .. } => view.settings.friday_message.clone(),
                Cell::Covered => "·".to_string(),
            };
            out.push_str(&fit(&text, COL));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "\nפנויות: {}  |  {} {}\n",
        grid.open_count(),
        view.settings.coordinator_name,
        view.settings.coordinator_phone
    ));
    out
}

pub fn notices(notices: &[AppNotice]) -> String {
    notices
        .iter()
        .map(|n| {
            let tag = match n.notice_type {
                NoticeType::Safety => "!",
                NoticeType::Escort => "E",
                NoticeType::Visitor => "V",
                NoticeType::General => "-",
            };
            format!("[{}] {}", tag, n.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One block per ad; empty when there are none.
pub fn ads(ads: &[Advertisement]) -> String {
    let mut lines = Vec::new();
    for ad in ads {
        lines.push(format!("== {} ==", ad.title));
        lines.push(ad.description.clone());
        if let Some(link) = ad.visible_link() {
            lines.push(link.to_string());
        }
        if let Some(image) = &ad.image_url {
            lines.push(format!("[image] {}", image));
        }
    }
    lines.iter().map(|line| format!("{line}\n")).collect()
}

pub fn events(events: &[CareEvent]) -> String {
    events
        .iter()
        .map(|e| {
            let status = match e.status {
                EventStatus::Confirmed => "confirmed",
                EventStatus::Pending => "pending",
            };
            let details: Vec<String> = e
                .registration_data
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!("{} {} {} [{}] {}", e.id, e.date, e.slot_id, status, details.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn topics(topics: &[ChatTopic]) -> String {
    topics
        .iter()
        .map(|t| {
            format!(
                "{}  {} ({}, {} messages, {})",
                t.id,
                t.title,
                t.author,
                t.messages.len(),
                format_time(t.last_activity())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn topic(topic: &ChatTopic) -> String {
    format!("# {} ({})\n{}", topic.title, topic.author, messages(&topic.messages))
}

pub fn messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|msg| format!("[{}] {}: {}\n", format_time(msg.timestamp), msg.author, msg.text))
        .collect()
}
