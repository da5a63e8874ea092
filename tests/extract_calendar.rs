// tests/extract_calendar.rs
use coupon_feed::extract::{parse_calendar_text, CampaignEvent};

const CALENDAR: &str = include_str!("fixtures/calendar.txt");

#[test]
fn fixture_yields_titled_sections_in_order() {
    let events = parse_calendar_text(CALENDAR);
    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["圣诞特惠", "麦辣鸡腿堡买一送一", "新年礼盒"]);
}

#[test]
fn fixture_fields_are_normalized() {
    let events = parse_calendar_text(CALENDAR);

    let first = &events[0];
    assert_eq!(first.date, "12月8日");
    assert_eq!(first.status.as_deref(), Some("往期回顾"));
    assert_eq!(first.description, "全场八折\n指定套餐再减5元");
    assert_eq!(
        first.image.as_deref(),
        Some("https://img.mcd.example/cal/1208.png")
    );

    let second = &events[1];
    assert_eq!(second.status.as_deref(), Some("今日"));
    assert_eq!(second.description, "仅限**早餐**时段");
    assert_eq!(
        second.image.as_deref(),
        Some("https://img.mcd.example/cal/1209.png?w=400&h=300")
    );
}

#[test]
fn undated_heading_is_kept_as_date_without_status() {
    let events = parse_calendar_text(CALENDAR);
    let last = events.last().expect("at least one event");
    assert_eq!(last.date, "即将上线");
    assert_eq!(last.status, None);
    assert_eq!(last.image, None);
    assert_eq!(last.month_day(), None);
}

#[test]
fn n_titled_sections_give_n_events() {
    let text: String = (1..=6)
        .map(|d| format!("#### 3月{d}日\n**活动标题**：活动{d}\\n\n"))
        .collect();
    let events = parse_calendar_text(&text);
    assert_eq!(events.len(), 6);
    for (i, e) in events.iter().enumerate() {
        assert_eq!(e.title, format!("活动{}", i + 1));
        assert_eq!(e.month_day(), Some((3, i as u32 + 1)));
    }
}

#[test]
fn untitled_middle_section_is_dropped() {
    let text = "#### 1月1日\n**活动标题**：A\\n\n\
                #### 1月2日\n**活动内容介绍**：只有介绍\\n\n\
                #### 1月3日\n**活动标题**：B\\n\n";
    let titles: Vec<String> = parse_calendar_text(text)
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(titles, vec!["A", "B"]);
}

#[test]
fn christmas_sale_with_heading_status() {
    let text = "#### 12月8日 往期回顾\n**活动标题**：圣诞特惠\\n**活动内容介绍**：全场八折\\n";
    assert_eq!(
        parse_calendar_text(text),
        vec![CampaignEvent {
            date: "12月8日".into(),
            status: Some("往期回顾".into()),
            title: "圣诞特惠".into(),
            description: "全场八折".into(),
            image: None,
        }]
    );
}

#[test]
fn garbage_and_empty_input_give_no_events() {
    assert!(parse_calendar_text("").is_empty());
    assert!(parse_calendar_text("####\n####   \n").is_empty());
    assert!(parse_calendar_text("plain text with no structure").is_empty());
}

#[test]
fn extraction_is_idempotent() {
    assert_eq!(parse_calendar_text(CALENDAR), parse_calendar_text(CALENDAR));
}
