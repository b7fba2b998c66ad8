use chrono::{DateTime, NaiveDateTime};

use crate::state::Probabilities;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Draw,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub outcome: Outcome,
    pub confidence: Confidence,
    pub max_prob: f64,
}

pub fn classify(probs: &Probabilities) -> Classification {
    let max_prob = max_prob(probs);
    // Exact ties resolve home first, then away, then draw.
    let outcome = if probs.home == max_prob {
        Outcome::Home
    } else if probs.away == max_prob {
        Outcome::Away
    } else {
        Outcome::Draw
    };
    let confidence = if max_prob > 0.5 {
        Confidence::High
    } else if max_prob > 0.4 {
        Confidence::Medium
    } else {
        Confidence::Low
    };
    Classification {
        outcome,
        confidence,
        max_prob,
    }
}

pub fn max_prob(probs: &Probabilities) -> f64 {
    probs.home.max(probs.draw).max(probs.away)
}

/// True for every side that equals the maximum, so tied sides are all highlighted.
pub fn is_favourite(probs: &Probabilities, side: Side) -> bool {
    let max = max_prob(probs);
    match side {
        Side::Home => probs.home == max,
        Side::Draw => probs.draw == max,
        Side::Away => probs.away == max,
    }
}

pub fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Home => "HOME",
        Outcome::Draw => "DRAW",
        Outcome::Away => "AWAY",
    }
}

pub fn confidence_label(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::High => "High",
        Confidence::Medium => "Medium",
        Confidence::Low => "Low",
    }
}

pub fn format_percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Kickoff as "Oct 18, 03:00 PM" (UTC). Unparseable dates are shown as sent.
pub fn format_kickoff(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.naive_utc().format("%b %-d, %I:%M %p").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return dt.format("%b %-d, %I:%M %p").to_string();
    }
    trimmed.to_string()
}
