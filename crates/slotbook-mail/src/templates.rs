//! Message templates for confirmations and reminders.
//!
//! Messages are plain text in Japanese. Dates render as `2025年8月8日（金）`
//! and times as `09:00`. The session details block (meeting link, what to
//! prepare) and the signature come from configuration.

use chrono::{Datelike as _, NaiveDate, NaiveTime, Weekday};
use slotbook_core::{participant::Participant, reservation::ReservationDetail, slot::Slot};

/// A rendered message, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
  pub subject: String,
  pub body:    String,
}

fn weekday_ja(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "月",
    Weekday::Tue => "火",
    Weekday::Wed => "水",
    Weekday::Thu => "木",
    Weekday::Fri => "金",
    Weekday::Sat => "土",
    Weekday::Sun => "日",
  }
}

/// `2025-08-08` → `2025年8月8日（金）`
pub fn format_date(date: NaiveDate) -> String {
  format!(
    "{}年{}月{}日（{}）",
    date.year(),
    date.month(),
    date.day(),
    weekday_ja(date.weekday())
  )
}

/// `09:00:00` → `09:00`
pub fn format_time(time: NaiveTime) -> String { time.format("%H:%M").to_string() }

#[derive(Debug, Clone, Default)]
pub struct Templates {
  pub session_details: String,
  pub signature:       String,
}

impl Templates {
  pub fn new(session_details: impl Into<String>, signature: impl Into<String>) -> Self {
    Self {
      session_details: session_details.into(),
      signature:       signature.into(),
    }
  }

  pub fn confirmation(&self, participant: &Participant, slot: &Slot) -> Rendered {
    let when = when(slot.date, slot.start_time);
    let intro = "研究にご参加いただき、ありがとうございます。\n\
                 以下の内容で予約を確認いたしました。";
    let outro = "ご参加をお待ちしております。";

    Rendered {
      subject: format!("【研究参加】予約確認 - {when}"),
      body:    self.body(&participant.name, intro, &when, outro),
    }
  }

  pub fn reminder(&self, reservation: &ReservationDetail) -> Rendered {
    let when = when(reservation.date, reservation.start_time);
    let intro = "いよいよ明日は研究参加の日です。\n\
                 改めて詳細をご案内いたします。";
    let outro = "お忙しい中お時間をいただき、ありがとうございます。\n\
                 明日お会いできることを楽しみにしております。";

    Rendered {
      subject: format!("【研究参加】明日の研究参加のご案内 - {when}"),
      body:    self.body(&reservation.name, intro, &when, outro),
    }
  }

  fn body(&self, name: &str, intro: &str, when: &str, outro: &str) -> String {
    let mut blocks = vec![
      format!("{name} 様"),
      intro.to_owned(),
      format!("【予約詳細】\n実験日時: {when}〜"),
    ];
    if !self.session_details.trim().is_empty() {
      blocks.push(self.session_details.trim().to_owned());
    }
    blocks.push(outro.to_owned());
    if !self.signature.trim().is_empty() {
      blocks.push(self.signature.trim().to_owned());
    }

    let mut body = blocks.join("\n\n");
    body.push('\n');
    body
  }
}

fn when(date: NaiveDate, time: NaiveTime) -> String {
  format!("{} {}", format_date(date), format_time(time))
}
