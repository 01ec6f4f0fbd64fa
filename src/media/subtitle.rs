//! Subtitle cues and subtitle lists

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of subtitle data carried by a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtitleFormat {
    /// Plain text
    Text,
    /// Text with style tags (ASS/SSA)
    Ass,
    /// Bitmap subtitles
    Image,
}

/// One palettized bitmap of an image subtitle
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleImage {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// RGBA palette entries
    pub palette: Vec<u32>,
    /// Palette indices, `line_size` bytes per row
    pub data: Arc<[u8]>,
    pub line_size: usize,
}

/// Payload of a subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub enum SubtitlePayload {
    Text(String),
    Images(Vec<SubtitleImage>),
}

/// A subtitle shown during `[start_time, end_time)`
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub payload: SubtitlePayload,
    /// Microseconds
    pub start_time: i64,
    /// Microseconds
    pub end_time: i64,
}

impl SubtitleCue {
    pub fn text<S: Into<String>>(text: S, start_time: i64, end_time: i64) -> Self {
        Self {
            payload: SubtitlePayload::Text(text.into()),
            start_time,
            end_time,
        }
    }

    pub fn is_active_at(&self, time: i64) -> bool {
        self.start_time <= time && time < self.end_time
    }
}

/// Time ordered cues of one subtitle stream
///
/// The list keeps a cursor to answer monotonic "active at" queries in
/// amortized constant time; a query that moves backwards restarts the scan.
#[derive(Debug, Clone)]
pub struct SubtitleList {
    format: SubtitleFormat,
    language: String,
    cues: Vec<SubtitleCue>,
    /// `reach[i]` is the latest end time among `cues[..=i]`
    reach: Vec<i64>,
    cursor: usize,
}

impl SubtitleList {
    pub fn new<S: Into<String>>(format: SubtitleFormat, language: S) -> Self {
        Self {
            format,
            language: language.into(),
            cues: Vec::new(),
            reach: Vec::new(),
            cursor: 0,
        }
    }

    pub fn format(&self) -> SubtitleFormat {
        self.format
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Insert a cue, keeping the list ordered by start time
    pub fn push(&mut self, cue: SubtitleCue) {
        let index = self.cues.partition_point(|c| c.start_time <= cue.start_time);
        self.cues.insert(index, cue);
        self.reach.truncate(index);
        let mut latest = index.checked_sub(1).map_or(i64::MIN, |i| self.reach[i]);
        for cue in &self.cues[index..] {
            latest = latest.max(cue.end_time);
            self.reach.push(latest);
        }
        self.cursor = 0;
    }

    /// The last cue whose start is at or before `time` and whose end is
    /// after it, if any
    pub fn active_at(&mut self, time: i64) -> Option<&SubtitleCue> {
        if self.cues.is_empty() {
            return None;
        }
        if self.cursor >= self.cues.len() || self.cues[self.cursor].start_time > time {
            self.cursor = 0;
        }
        if self.cues[self.cursor].start_time > time {
            return None;
        }
        while self.cursor + 1 < self.cues.len() && self.cues[self.cursor + 1].start_time <= time {
            self.cursor += 1;
        }
        // overlapping cues: walk back while an earlier cue may still be running
        let mut index = self.cursor;
        loop {
            if self.cues[index].is_active_at(time) {
                return Some(&self.cues[index]);
            }
            if index == 0 || self.reach[index - 1] <= time {
                return None;
            }
            index -= 1;
        }
    }

    /// Forget the cursor position, e.g. after a seek
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}
