use std::collections::BTreeMap;

/// One chapter of prose. Paragraph order is the display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub title: String,
    pub subtitle: String,
    pub paragraphs: Vec<String>,
}

/// A catalog entry.
///
/// `total_chapters` is the advertised length of the book and may exceed the
/// number of chapters that actually carry text. Navigation ranges over the
/// advertised count; chapters without text render as unavailable.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover: String,
    pub description: String,
    pub rating: f64,
    pub total_chapters: u32,
    chapters: BTreeMap<u32, Chapter>,
}

impl Book {
    /// Chapter text for a 1-based chapter number, if that chapter is populated.
    pub fn chapter(&self, number: u32) -> Option<&Chapter> {
        self.chapters.get(&number)
    }

    pub fn populated_chapters(&self) -> usize {
        self.chapters.len()
    }
}

/// The read-only book collection, loaded once at startup.
#[derive(Debug)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    pub fn builtin() -> Catalog {
        Catalog {
            books: builtin_books(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Case-insensitive substring match over title and author.
    /// An empty query returns the whole catalog.
    pub fn filter(&self, query: &str) -> Vec<&Book> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.books.iter().collect();
        }
        self.books
            .iter()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

fn chapter(title: &str, subtitle: &str, paragraphs: &[&str]) -> Chapter {
    Chapter {
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
    }
}

struct BookSpec<'a> {
    id: &'a str,
    title: &'a str,
    author: &'a str,
    cover: &'a str,
    description: &'a str,
    rating: f64,
    total_chapters: u32,
    chapters: Vec<(u32, Chapter)>,
}

fn book(spec: BookSpec) -> Book {
    Book {
        id: spec.id.to_string(),
        title: spec.title.to_string(),
        author: spec.author.to_string(),
        cover: spec.cover.to_string(),
        description: spec.description.to_string(),
        rating: spec.rating,
        total_chapters: spec.total_chapters,
        chapters: spec.chapters.into_iter().collect(),
    }
}

fn builtin_books() -> Vec<Book> {
    vec![
        book(BookSpec {
            id: "starlit-guide",
            title: "The Starlit Guide",
            author: "A. Sharma",
            cover: "imgs/starlit-guide.png",
            description: "A mysterious novel about lighthouses, lost books and ancient symbols.",
            rating: 4.8,
            total_chapters: 3,
            chapters: vec![
                (
                    1,
                    chapter("Chapter 1: The Beginning", "The journey starts", &[
                        "In the beginning, there was only darkness and the whisper of ancient winds across forgotten lands...",
                        "Sarah had always been drawn to mysteries, but nothing could have prepared her for what she would discover in the old lighthouse.",
                        "The keeper's warnings echoed in her mind as she climbed the spiral staircase.",
                        "At the top of the lighthouse, she found something that would change everything.",
                    ]),
                ),
                (
                    2,
                    chapter("Chapter 2: Ancient Whispers", "Echoes of the past", &[
                        "The book found in the lighthouse attic was bound in midnight blue leather...",
                        "Symbols shimmered in the candlelight.",
                        "Whispers of forgotten languages filled the air.",
                        "The keeper warned her about the attic.",
                    ]),
                ),
                (
                    3,
                    chapter("Chapter 3: The Revelation", "A secret revealed", &[
                        "The symbols formed a map.",
                        "The lighthouse was a guardian of ancient knowledge.",
                        "Sarah opened the final page of the mysterious book.",
                        "Her destiny awaited.",
                    ]),
                ),
            ],
        }),
        book(BookSpec {
            id: "business-tactics",
            title: "Business Tactics",
            author: "R. Mehta",
            cover: "imgs/business-tactics.png",
            description: "Practical business strategies for modern teams.",
            rating: 4.6,
            total_chapters: 4,
            chapters: vec![
                (
                    1,
                    chapter("Chapter 1: Market Strategies", "Understanding the market", &[
                        "In today's competitive business environment, understanding market dynamics is crucial...",
                        "Successful companies don't just follow trends - they create them.",
                    ]),
                ),
                (
                    2,
                    chapter("Chapter 2: Leadership Principles", "Effective leadership strategies", &[
                        "Great leaders inspire their teams to achieve extraordinary results...",
                        "Leadership is not about authority, but about influence and vision.",
                    ]),
                ),
                (
                    3,
                    chapter("Chapter 3: Financial Management", "Managing business finances", &[
                        "Financial health is the lifeblood of any successful business...",
                        "Cash flow management can make or break a company.",
                    ]),
                ),
                (
                    4,
                    chapter("Chapter 4: Growth Strategies", "Scaling your business", &[
                        "Sustainable growth requires careful planning and execution...",
                        "Understanding your core competencies is key to successful scaling.",
                    ]),
                ),
            ],
        }),
        book(BookSpec {
            id: "self-mastery",
            title: "Self Mastery",
            author: "L. Kaur",
            cover: "imgs/self-mastery.png",
            description: "A guide to personal growth and habit formation.",
            rating: 4.7,
            total_chapters: 3,
            chapters: vec![
                (
                    1,
                    chapter("Chapter 1: Self-Awareness", "Understanding yourself", &[
                        "The journey to self-mastery begins with self-awareness...",
                    ]),
                ),
                (
                    2,
                    chapter("Chapter 2: Emotional Regulation", "Managing your emotions", &[
                        "Emotional intelligence is the cornerstone of self-mastery...",
                    ]),
                ),
                (
                    3,
                    chapter("Chapter 3: Habit Formation", "Building positive habits", &[
                        "Lasting change comes from consistent small actions...",
                    ]),
                ),
            ],
        }),
        book(BookSpec {
            id: "atomic-habits",
            title: "Atomic Habits",
            author: "James Clear",
            cover: "imgs/atomic-habits.png",
            description: "Tiny changes, remarkable results.",
            rating: 4.9,
            total_chapters: 5,
            chapters: vec![(
                1,
                chapter(
                    "Chapter 1: The Surprising Power of Atomic Habits",
                    "Small habits make a big difference",
                    &["Habits are the compound interest of self-improvement..."],
                ),
            )],
        }),
        book(BookSpec {
            id: "psychology-money",
            title: "The Psychology of Money",
            author: "Morgan Housel",
            cover: "imgs/psycology-of-money.png",
            description: "Insights into human behavior and money.",
            rating: 4.8,
            total_chapters: 4,
            chapters: vec![(
                1,
                chapter("Intro", "", &[
                    "Your personal experiences with money make up...",
                ]),
            )],
        }),
        book(BookSpec {
            id: "harry-potter",
            title: "Harry Potter",
            author: "J.K. Rowling",
            cover: "imgs/harry-porter.png",
            description: "The classic magical adventure.",
            rating: 4.9,
            total_chapters: 3,
            chapters: vec![(
                1,
                chapter("Chapter 1: The Boy Who Lived", "The beginning of the story", &[
                    "Mr. and Mrs. Dursley, of number four...",
                ]),
            )],
        }),
    ]
}
