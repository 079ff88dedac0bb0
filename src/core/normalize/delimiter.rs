use serde::{Deserialize, Serialize};
use std::fmt;

/// Cell separator of a raw extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Semicolon,
    Comma,
    Tab,
    Pipe,
}

impl Delimiter {
    /// Candidates in tie-break order
    pub const CANDIDATES: [Delimiter; 4] = [
        Delimiter::Semicolon,
        Delimiter::Comma,
        Delimiter::Tab,
        Delimiter::Pipe,
    ];

    #[inline]
    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Semicolon => b';',
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Semicolon => "semicolon",
            Delimiter::Comma => "comma",
            Delimiter::Tab => "tab",
            Delimiter::Pipe => "pipe",
        }
    }

    /// Pick the candidate occurring most often outside quotes in the header line.
    ///
    /// Ties go to the earlier candidate; a header with none of them is read as CSV.
    pub fn sniff(text: &str) -> Delimiter {
        let mut counts = [0usize; 4];
        let mut in_quotes = false;
        for byte in text.bytes() {
            match byte {
                b'"' => in_quotes = !in_quotes,
                b'\n' | b'\r' if !in_quotes => break,
                _ if in_quotes => {}
                other => {
                    if let Some(idx) = Self::CANDIDATES.iter().position(|d| d.byte() == other) {
                        counts[idx] += 1;
                    }
                }
            }
        }

        let mut best = Delimiter::Comma;
        let mut best_count = 0;
        for (delimiter, count) in Self::CANDIDATES.iter().zip(counts) {
            if count > best_count {
                best = *delimiter;
                best_count = count;
            }
        }
        best
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
