//! Application model: the book being browsed, its lesson list, the list
//! cursor and search filter, and the lyric binding for the current track.

use crate::catalog::{Book, CatalogResponse, Track};
use crate::lyrics::LyricSync;

/// Which list the left pane shows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Lessons,
    Queue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogStatus {
    Loading,
    Loaded,
    /// Shown in place of the lesson list; retry with `r` or another book.
    Failed(String),
}

/// Ask the catalog worker for the lessons of `book`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CatalogRequest {
    pub generation: u64,
    pub book: Book,
}

/// The main application model.
pub struct App {
    pub book: Book,
    pub tab: Tab,
    pub lessons: Vec<Track>,
    pub catalog_status: CatalogStatus,
    catalog_generation: u64,

    /// Index into `lessons`.
    pub selected: usize,
    /// Index into the session queue, used by the queue tab.
    pub queue_cursor: usize,

    pub filter_mode: bool,
    pub filter_query: String,

    pub lyrics: LyricSync,
}

impl App {
    /// Create an `App` showing `book`, together with the catalog request that
    /// fills it.
    pub fn new(book: Book) -> (Self, CatalogRequest) {
        let mut app = Self {
            book,
            tab: Tab::Lessons,
            lessons: Vec::new(),
            catalog_status: CatalogStatus::Loading,
            catalog_generation: 0,
            selected: 0,
            queue_cursor: 0,
            filter_mode: false,
            filter_query: String::new(),
            lyrics: LyricSync::new(),
        };
        let req = app.set_book(book);
        (app, req)
    }

    /// Switch to `book`, dropping the current lesson list. Responses for any
    /// earlier request are ignored from now on.
    pub fn set_book(&mut self, book: Book) -> CatalogRequest {
        self.book = book;
        self.tab = Tab::Lessons;
        self.filter_mode = false;
        self.filter_query.clear();
        self.reload()
    }

    /// Refetch the current book.
    pub fn reload(&mut self) -> CatalogRequest {
        self.catalog_generation += 1;
        self.lessons.clear();
        self.selected = 0;
        self.catalog_status = CatalogStatus::Loading;
        CatalogRequest {
            generation: self.catalog_generation,
            book: self.book,
        }
    }

    /// Apply a worker response. Returns `false` when it answers a superseded
    /// request.
    pub fn apply_catalog(&mut self, resp: CatalogResponse) -> bool {
        if resp.generation != self.catalog_generation || resp.book != self.book {
            return false;
        }
        match resp.result {
            Ok(lessons) => {
                self.lessons = lessons;
                self.catalog_status = CatalogStatus::Loaded;
            }
            Err(e) => {
                self.lessons.clear();
                self.catalog_status = CatalogStatus::Failed(e.to_string());
            }
        }
        self.selected = 0;
        self.ensure_selected_visible();
        true
    }

    pub fn has_lessons(&self) -> bool {
        !self.lessons.is_empty()
    }

    /// Indices into `lessons` that pass the search filter, in book order.
    pub fn visible_lessons(&self) -> Vec<usize> {
        let query = self.filter_query.trim().to_lowercase();
        self.lessons
            .iter()
            .enumerate()
            .filter(|(_, t)| t.matches(&query))
            .map(|(i, _)| i)
            .collect()
    }

    /// The queue to start when the user picks the selected lesson: the
    /// lessons currently shown, positioned on the selection.
    pub fn queue_from_selection(&self) -> Option<(Vec<Track>, usize)> {
        let display = self.visible_lessons();
        let index = display.iter().position(|&i| i == self.selected)?;
        let queue = display.iter().map(|&i| self.lessons[i].clone()).collect();
        Some((queue, index))
    }

    pub fn toggle_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Lessons => Tab::Queue,
            Tab::Queue => Tab::Lessons,
        };
    }

    /// Move the cursor of the active list one step down. The lesson list
    /// wraps; the queue list stops at its ends.
    pub fn next(&mut self, queue_len: usize) {
        match self.tab {
            Tab::Lessons => {
                if let Some(next) = self.step_in_view(1) {
                    self.selected = next;
                }
            }
            Tab::Queue => {
                if self.queue_cursor + 1 < queue_len {
                    self.queue_cursor += 1;
                }
            }
        }
    }

    /// Move the cursor of the active list one step up.
    pub fn prev(&mut self, queue_len: usize) {
        match self.tab {
            Tab::Lessons => {
                if let Some(prev) = self.step_in_view(-1) {
                    self.selected = prev;
                }
            }
            Tab::Queue => {
                self.queue_cursor = self.queue_cursor.saturating_sub(1).min(queue_len.saturating_sub(1));
            }
        }
    }

    /// Put the queue cursor on the track that is playing.
    pub fn follow_queue(&mut self, current_index: Option<usize>) {
        if let Some(i) = current_index {
            self.queue_cursor = i;
        }
    }

    fn step_in_view(&self, delta: isize) -> Option<usize> {
        let display = self.visible_lessons();
        if display.is_empty() {
            return None;
        }
        let len = display.len() as isize;
        let next = match display.iter().position(|&i| i == self.selected) {
            Some(p) => (p as isize + delta).rem_euclid(len),
            None => 0,
        };
        Some(display[next as usize])
    }

    /// Enter filter mode on the lesson list.
    pub fn enter_filter_mode(&mut self) {
        self.tab = Tab::Lessons;
        self.filter_mode = true;
        self.ensure_selected_visible();
    }

    /// Stop editing the query but keep it applied.
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Ensure that `selected` passes the filter, otherwise move it to the
    /// first visible lesson.
    fn ensure_selected_visible(&mut self) {
        let display = self.visible_lessons();
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }
}
