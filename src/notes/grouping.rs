//! Day grouping for the note list
//!
//! Groups are ordered newest day first and labelled "today", "yesterday",
//! or the lowercased weekday and date ("monday, aug 4").

use chrono::{Local, NaiveDate, TimeZone};

use super::model::Note;

/// Notes captured on one local calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub label: String,
    pub notes: Vec<Note>,
}

/// Label for `date` as seen from `today`
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "today".to_string()
    } else if today.pred_opt() == Some(date) {
        "yesterday".to_string()
    } else {
        date.format("%A, %b %-d").to_string().to_lowercase()
    }
}

/// Group notes by the local day they were captured on.
pub fn group_by_day(notes: &[Note], today: NaiveDate) -> Vec<DayGroup> {
    group_by_day_in(notes, today, &Local)
}

/// Same as [`group_by_day`] with an explicit time zone (tests pin this to UTC).
pub fn group_by_day_in<Tz: TimeZone>(notes: &[Note], today: NaiveDate, tz: &Tz) -> Vec<DayGroup> {
    let mut sorted: Vec<&Note> = notes.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut groups: Vec<DayGroup> = Vec::new();
    for note in sorted {
        let date = note.timestamp.with_timezone(tz).date_naive();
        match groups.last_mut() {
            Some(group) if group.date == date => group.notes.push(note.clone()),
            _ => groups.push(DayGroup {
                date,
                label: day_label(date, today),
                notes: vec![note.clone()],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::Category;
    use chrono::{TimeZone, Utc};

    fn note_at(text: &str, y: i32, m: u32, d: u32, h: u32) -> Note {
        let ts = Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap();
        Note::with_timestamp(text, Category::random(), ts)
    }

    #[test]
    fn labels_today_yesterday_and_weekday() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        assert_eq!(day_label(today, today), "today");
        assert_eq!(
            day_label(NaiveDate::from_ymd_opt(2025, 8, 5).unwrap(), today),
            "yesterday"
        );
        assert_eq!(
            day_label(NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(), today),
            "monday, aug 4"
        );
    }

    #[test]
    fn groups_are_newest_first_and_contiguous() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        let notes = vec![
            note_at("old", 2025, 8, 1, 9),
            note_at("morning", 2025, 8, 6, 8),
            note_at("late", 2025, 8, 6, 22),
            note_at("yday", 2025, 8, 5, 12),
        ];

        let groups = group_by_day_in(&notes, today, &Utc);
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["today", "yesterday", "friday, aug 1"]);

        let today_texts: Vec<_> = groups[0].notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(today_texts, vec!["late", "morning"]);
    }

    #[test]
    fn empty_input_has_no_groups() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        assert!(group_by_day_in(&[], today, &Utc).is_empty());
    }
}
