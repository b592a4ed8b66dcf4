use std::fmt;

/// One of the four course books.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Book {
    #[default]
    One,
    Two,
    Three,
    Four,
}

impl Book {
    pub const ALL: [Book; 4] = [Book::One, Book::Two, Book::Three, Book::Four];

    pub fn number(self) -> u8 {
        match self {
            Book::One => 1,
            Book::Two => 2,
            Book::Three => 3,
            Book::Four => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Book::One),
            2 => Some(Book::Two),
            3 => Some(Book::Three),
            4 => Some(Book::Four),
            _ => None,
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NCE{}", self.number())
    }
}

/// A playable lesson.
///
/// `id` is derived from book and filename, so reloading the catalog yields the
/// same ids and the lyric binding does not refetch for an unchanged track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub book: Book,
    pub title: String,
    pub lesson_label: String,
    pub filename: String,
    pub audio_url: String,
    pub lyric_url: String,
}

impl Track {
    /// Text shown in the player bar and sent to the media-key surface.
    pub fn display(&self) -> String {
        format!("{} · {}", self.lesson_label, self.title)
    }

    /// Case-insensitive substring search over label, title and filename.
    /// `query_lower` must already be lowercase.
    pub fn matches(&self, query_lower: &str) -> bool {
        if query_lower.is_empty() {
            return true;
        }
        let hay = format!("{} {} {}", self.lesson_label, self.title, self.filename).to_lowercase();
        hay.contains(query_lower)
    }
}
